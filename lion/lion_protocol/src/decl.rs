//! Declaration files.
//!
//! Protocols, intersections, types, instances and registrations can be
//! declared in a TOML file:
//!
//! ```toml
//! [engine]
//! cache_capacity = 256
//!
//! [[protocol]]
//! name = "Walker"
//! members = [{ name = "walk", kind = "instance_method" }]
//!
//! [[intersection]]
//! name = "Athlete"
//! components = ["Walker", "Runner"]
//!
//! [[type]]
//! name = "Dog"
//! bases = ["Animal"]
//! members = [{ name = "walk", kind = "method" }]
//!
//! [[instance]]
//! name = "rex"
//! type = "Dog"
//! attrs = [{ name = "run", callable = true }]
//!
//! [[register]]
//! type = "Robot"
//! protocol = "Walker"
//! ```
//!
//! Declarations may refer to each other in any order. The published
//! protocols (`Configurable`, `Cancellable`, `Factory`, `Renderable`) are
//! always in scope.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use lion_core::error::{DeclarationError, Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::check::ConformanceEngine;
use crate::compose::IntersectionBuilder;
use crate::config::EngineConfig;
use crate::model::{AttrValue, Instance, MemberDef, MemberRequirement, Protocol, TypeDef};
use crate::registry::published_protocols;

/// The raw contents of a declaration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeclarationFile {
    pub engine: EngineConfig,
    pub protocol: Vec<ProtocolDecl>,
    pub intersection: Vec<IntersectionDecl>,
    #[serde(rename = "type")]
    pub types: Vec<TypeDecl>,
    pub instance: Vec<InstanceDecl>,
    pub register: Vec<RegisterDecl>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolDecl {
    pub name: String,
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default)]
    pub members: Vec<MemberRequirement>,
    #[serde(default = "default_true")]
    pub runtime_checkable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntersectionDecl {
    pub name: String,
    pub components: Vec<String>,
    #[serde(default)]
    pub nominal_base: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    #[serde(default)]
    pub bases: Vec<String>,
    #[serde(default)]
    pub implements: Vec<String>,
    #[serde(default)]
    pub members: Vec<MemberDecl>,
}

/// How a type member is defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberDeclKind {
    Method,
    ClassMethod,
    StaticMethod,
    Field,
    CallableField,
    Property,
    Null,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberDecl {
    pub name: String,
    pub kind: MemberDeclKind,

    /// Value produced by a property getter.
    #[serde(default)]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub attrs: Vec<AttrDecl>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttrDecl {
    pub name: String,
    #[serde(default)]
    pub callable: bool,
    #[serde(default)]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterDecl {
    #[serde(rename = "type")]
    pub type_name: String,
    pub protocol: String,
}

fn default_true() -> bool {
    true
}

/// Resolved declarations.
pub struct Declarations {
    engine_config: EngineConfig,
    protocols: BTreeMap<String, Arc<Protocol>>,
    types: BTreeMap<String, Arc<TypeDef>>,
    instances: BTreeMap<String, Arc<Instance>>,
    registrations: Vec<(Arc<TypeDef>, Arc<Protocol>)>,
}

impl Declarations {
    /// Parse and resolve declarations from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: DeclarationFile = toml::from_str(content)
            .map_err(|e| Error::Serialization(format!("Failed to parse declarations: {}", e)))?;
        Self::resolve(file)
    }

    /// Load and resolve a declaration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let declarations = Self::from_toml_str(&content)?;
        info!(
            path = %path.display(),
            protocols = declarations.protocols.len(),
            types = declarations.types.len(),
            "loaded declarations"
        );
        Ok(declarations)
    }

    /// Resolve parsed declarations.
    ///
    /// # Errors
    ///
    /// * [`DeclarationError::Duplicate`] - If a name is declared twice.
    /// * [`DeclarationError::CallableWithValue`] - If an instance attribute
    ///   is marked callable and also given a value.
    /// * [`DeclarationError::UnknownName`] - If a declaration refers to a
    ///   name that is never declared.
    /// * [`DeclarationError::Cycle`] - If declarations depend on each other
    ///   in a cycle.
    /// * Any error from building the individual declarations.
    pub fn resolve(file: DeclarationFile) -> Result<Self> {
        let mut protocols: BTreeMap<String, Arc<Protocol>> = published_protocols()
            .into_iter()
            .map(|p| (p.name().to_string(), p))
            .collect();
        let mut types: BTreeMap<String, Arc<TypeDef>> = BTreeMap::new();

        let pending = Pending::collect(&file, &protocols)?;
        Pending::resolve_all(pending, &mut protocols, &mut types)?;

        let mut instances = BTreeMap::new();
        for decl in &file.instance {
            let type_def = find(&types, &decl.type_name)?;
            let instance = Instance::new(type_def.clone());
            for attr in &decl.attrs {
                let value = match (attr.callable, &attr.value) {
                    (true, None) => AttrValue::Callable,
                    (true, Some(_)) => {
                        return Err(DeclarationError::CallableWithValue {
                            instance: decl.name.clone(),
                            attr: attr.name.clone(),
                        }
                        .into());
                    }
                    (false, value) => AttrValue::Data(value.clone().unwrap_or(Value::Null)),
                };
                instance.set_attr(attr.name.clone(), value);
            }
            if instances.insert(decl.name.clone(), Arc::new(instance)).is_some() {
                return Err(DeclarationError::Duplicate(decl.name.clone()).into());
            }
        }

        let mut registrations = Vec::new();
        for decl in &file.register {
            registrations.push((
                find(&types, &decl.type_name)?.clone(),
                find(&protocols, &decl.protocol)?.clone(),
            ));
        }

        Ok(Self {
            engine_config: file.engine,
            protocols,
            types,
            instances,
            registrations,
        })
    }

    /// Settings from the `[engine]` table, defaults if absent.
    pub fn engine_config(&self) -> &EngineConfig {
        &self.engine_config
    }

    /// Look up a declared or published protocol by name.
    pub fn protocol(&self, name: &str) -> Option<&Arc<Protocol>> {
        self.protocols.get(name)
    }

    /// Look up a declared type by name.
    pub fn type_def(&self, name: &str) -> Option<&Arc<TypeDef>> {
        self.types.get(name)
    }

    /// Look up a declared instance by name.
    pub fn instance(&self, name: &str) -> Option<&Arc<Instance>> {
        self.instances.get(name)
    }

    /// All protocols in scope, published ones included, sorted by name.
    pub fn protocols(&self) -> impl Iterator<Item = &Arc<Protocol>> {
        self.protocols.values()
    }

    pub fn types(&self) -> impl Iterator<Item = &Arc<TypeDef>> {
        self.types.values()
    }

    pub fn instances(&self) -> impl Iterator<Item = (&str, &Arc<Instance>)> {
        self.instances.iter().map(|(name, instance)| (name.as_str(), instance))
    }

    /// Build an engine from the `[engine]` table with every registration
    /// applied.
    pub fn engine(&self) -> ConformanceEngine {
        let engine = ConformanceEngine::with_config(self.engine_config.clone());
        for (type_def, protocol) in &self.registrations {
            engine.register(type_def, protocol.clone());
        }
        engine
    }
}

fn find<'a, T>(map: &'a BTreeMap<String, T>, name: &str) -> Result<&'a T> {
    map.get(name)
        .ok_or_else(|| DeclarationError::UnknownName(name.to_string()).into())
}

/// A declaration waiting for the names it refers to.
enum Pending<'a> {
    Protocol(&'a ProtocolDecl),
    Intersection(&'a IntersectionDecl),
    Type(&'a TypeDecl),
}

impl<'a> Pending<'a> {
    /// Gather every protocol-like and type declaration, rejecting duplicate
    /// and unknown names up front so that the only failure left for
    /// resolution is a cycle.
    fn collect(file: &'a DeclarationFile, published: &BTreeMap<String, Arc<Protocol>>) -> Result<Vec<Self>> {
        let mut protocol_names: BTreeSet<&str> = published.keys().map(String::as_str).collect();
        let mut type_names: BTreeSet<&str> = BTreeSet::new();

        let declared = file.protocol.iter().map(|d| d.name.as_str());
        let composed = file.intersection.iter().map(|d| d.name.as_str());
        for name in declared.chain(composed) {
            if !protocol_names.insert(name) {
                return Err(DeclarationError::Duplicate(name.to_string()).into());
            }
        }
        for decl in &file.types {
            if !type_names.insert(&decl.name) {
                return Err(DeclarationError::Duplicate(decl.name.clone()).into());
            }
        }

        let mut pending = Vec::new();
        pending.extend(file.protocol.iter().map(Pending::Protocol));
        pending.extend(file.intersection.iter().map(Pending::Intersection));
        pending.extend(file.types.iter().map(Pending::Type));

        for item in &pending {
            let (protocol_refs, type_refs) = item.references();
            if let Some(name) = protocol_refs.iter().find(|n| !protocol_names.contains(*n)) {
                return Err(DeclarationError::UnknownName(name.to_string()).into());
            }
            if let Some(name) = type_refs.iter().find(|n| !type_names.contains(*n)) {
                return Err(DeclarationError::UnknownName(name.to_string()).into());
            }
        }

        Ok(pending)
    }

    fn resolve_all(
        mut pending: Vec<Self>,
        protocols: &mut BTreeMap<String, Arc<Protocol>>,
        types: &mut BTreeMap<String, Arc<TypeDef>>,
    ) -> Result<()> {
        while !pending.is_empty() {
            let before = pending.len();
            let mut waiting = Vec::new();

            for item in pending {
                let (protocol_refs, type_refs) = item.references();
                let ready = protocol_refs.iter().all(|n| protocols.contains_key(*n))
                    && type_refs.iter().all(|n| types.contains_key(*n));
                if ready {
                    item.build(protocols, types)?;
                } else {
                    waiting.push(item);
                }
            }

            if waiting.len() == before {
                let names: Vec<&str> = waiting.iter().map(|item| item.name()).collect();
                return Err(DeclarationError::Cycle(names.join(", ")).into());
            }
            pending = waiting;
        }
        Ok(())
    }

    fn name(&self) -> &'a str {
        match self {
            Self::Protocol(d) => &d.name,
            Self::Intersection(d) => &d.name,
            Self::Type(d) => &d.name,
        }
    }

    /// Protocol names and type names this declaration refers to.
    fn references(&self) -> (Vec<&'a str>, Vec<&'a str>) {
        match self {
            Self::Protocol(d) => (d.parents.iter().map(String::as_str).collect(), Vec::new()),
            Self::Intersection(d) => (
                d.components.iter().map(String::as_str).collect(),
                d.nominal_base.iter().map(String::as_str).collect(),
            ),
            Self::Type(d) => (
                d.implements.iter().map(String::as_str).collect(),
                d.bases.iter().map(String::as_str).collect(),
            ),
        }
    }

    fn build(
        &self,
        protocols: &mut BTreeMap<String, Arc<Protocol>>,
        types: &mut BTreeMap<String, Arc<TypeDef>>,
    ) -> Result<()> {
        match self {
            Self::Protocol(d) => {
                let mut builder = Protocol::builder(&d.name);
                for parent in &d.parents {
                    builder = builder.parent(find(protocols, parent)?.clone());
                }
                for member in &d.members {
                    builder = builder.member(member.clone());
                }
                if !d.runtime_checkable {
                    builder = builder.not_runtime_checkable();
                }
                protocols.insert(d.name.clone(), builder.build()?);
            }
            Self::Intersection(d) => {
                let mut builder = IntersectionBuilder::new().name(&d.name);
                for component in &d.components {
                    builder = builder.component(find(protocols, component)?.clone());
                }
                if let Some(base) = &d.nominal_base {
                    builder = builder.nominal_base(find(types, base)?.clone());
                }
                protocols.insert(d.name.clone(), builder.build()?);
            }
            Self::Type(d) => {
                let mut builder = TypeDef::builder(&d.name);
                for base in &d.bases {
                    builder = builder.base(find(types, base)?.clone());
                }
                for protocol in &d.implements {
                    builder = builder.implements(find(protocols, protocol)?.clone());
                }
                for member in &d.members {
                    builder = builder.member(member.name.clone(), member_def(member));
                }
                types.insert(d.name.clone(), builder.build()?);
            }
        }
        debug!(name = self.name(), "resolved declaration");
        Ok(())
    }
}

fn member_def(decl: &MemberDecl) -> MemberDef {
    match decl.kind {
        MemberDeclKind::Method => MemberDef::Method,
        MemberDeclKind::ClassMethod => MemberDef::ClassMethod,
        MemberDeclKind::StaticMethod => MemberDef::StaticMethod,
        MemberDeclKind::Field => MemberDef::Field { callable: false },
        MemberDeclKind::CallableField => MemberDef::Field { callable: true },
        MemberDeclKind::Null => MemberDef::Null,
        MemberDeclKind::Property => {
            let value = decl.value.clone().unwrap_or(Value::Null);
            MemberDef::Property(Arc::new(move |_: &Instance| AttrValue::Data(value.clone())))
        }
    }
}
