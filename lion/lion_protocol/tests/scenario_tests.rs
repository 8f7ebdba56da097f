use std::sync::Arc;

use lion_protocol::{
    intersect, Candidate, CapabilityRegistry, ConformanceEngine, Declarations, Instance,
    IntersectionBuilder, MismatchReason, Protocol, TypeDef,
};

#[test]
fn test_walker_runner_athlete() {
    let walker = Protocol::builder("Walker").method("walk").build().unwrap();
    let runner = Protocol::builder("Runner").method("run").build().unwrap();
    let athlete = intersect(&[walker, runner]).unwrap();
    let engine = ConformanceEngine::new();

    let sprinter = Instance::new(TypeDef::builder("Sprinter").method("walk").method("run").build().unwrap());
    assert!(engine.is_instance(&sprinter, &athlete).unwrap());

    let stroller = Instance::new(TypeDef::builder("Stroller").method("walk").build().unwrap());
    assert!(!engine.is_instance(&stroller, &athlete).unwrap());

    let mismatch = engine.find_mismatch(Candidate::Instance(&stroller), &athlete).unwrap();
    assert_eq!(mismatch.member(), "run");
    assert_eq!(mismatch.reason, MismatchReason::Missing);
}

#[test]
fn test_nominal_base_restricts_intersection() {
    let walker = Protocol::builder("Walker").method("walk").build().unwrap();
    let runner = Protocol::builder("Runner").method("run").build().unwrap();
    let animal = TypeDef::builder("Animal").build().unwrap();
    let athletic_animal = IntersectionBuilder::new()
        .name("AthleticAnimal")
        .components([walker, runner])
        .nominal_base(animal.clone())
        .build()
        .unwrap();
    let engine = ConformanceEngine::new();

    let dog = TypeDef::builder("Dog").base(animal).method("walk").method("run").build().unwrap();
    let robot = TypeDef::builder("Robot").method("walk").method("run").build().unwrap();

    assert!(engine.is_subtype(&dog, &athletic_animal).unwrap());
    assert!(!engine.is_subtype(&robot, &athletic_animal).unwrap());
}

#[test]
fn test_registered_plugin_factory() {
    let registry = CapabilityRegistry::new(Arc::new(ConformanceEngine::new()));

    let plugin = TypeDef::builder("CsvExporter")
        .class_method("create")
        .method("render")
        .build()
        .unwrap();
    let broken = TypeDef::builder("HalfPlugin").method("create").build().unwrap();

    assert!(registry.is_factory_type(&plugin));
    assert!(registry.is_renderable(&Instance::new(plugin)));
    assert!(!registry.is_factory_type(&broken));

    let mismatch = registry
        .engine()
        .find_mismatch(Candidate::Type(&broken), registry.protocol("Factory").unwrap())
        .unwrap();
    assert_eq!(mismatch.to_string(), "`create` is a method but must be a class method");
}

#[test]
fn test_declaration_file_scenario() {
    let decls = Declarations::from_toml_str(include_str!("../../../demos/athletes.toml")).unwrap();
    let engine = decls.engine();
    let athlete = decls.protocol("Athlete").unwrap();

    assert!(engine.is_instance(decls.instance("bolt").unwrap(), athlete).unwrap());
    assert!(!engine.is_instance(decls.instance("walker").unwrap(), athlete).unwrap());
    assert!(engine.is_subtype(decls.type_def("Robot").unwrap(), decls.protocol("Walker").unwrap()).unwrap());
}
