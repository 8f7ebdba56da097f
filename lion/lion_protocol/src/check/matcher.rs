//! Attribute matching.
//!
//! Decides whether a candidate exposes a member of the kind a requirement
//! asks for. Presence and kind come from static lookups on the type and the
//! instance; no member is ever evaluated.

use std::fmt;

use crate::model::{Instance, InstanceResolved, MemberDef, MemberKind, MemberRequirement, Protocol, TypeDef};

/// The value being checked: a live instance or a type.
#[derive(Debug, Clone, Copy)]
pub enum Candidate<'a> {
    Instance(&'a Instance),
    Type(&'a TypeDef),
}

impl<'a> Candidate<'a> {
    /// The type of the candidate (the candidate itself for types).
    pub fn type_def(&self) -> &'a TypeDef {
        match self {
            Self::Instance(obj) => obj.type_def().as_ref(),
            Self::Type(ty) => ty,
        }
    }
}

/// What a name was found to be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Found {
    Method,
    ClassMethod,
    StaticMethod,
    Field,
    CallableField,
    Property,
    Null,
    /// A callable attribute stored on the instance.
    CallableAttribute,
    /// A data attribute stored on the instance.
    DataAttribute,
}

impl Found {
    fn from_def(def: &MemberDef) -> Self {
        match def {
            MemberDef::Method => Self::Method,
            MemberDef::ClassMethod => Self::ClassMethod,
            MemberDef::StaticMethod => Self::StaticMethod,
            MemberDef::Field { callable: true } => Self::CallableField,
            MemberDef::Field { callable: false } => Self::Field,
            MemberDef::Property(_) => Self::Property,
            MemberDef::Null => Self::Null,
        }
    }

    /// Properties count as data: whether their value is callable cannot be
    /// known without running the getter.
    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            Self::Method
                | Self::ClassMethod
                | Self::StaticMethod
                | Self::CallableField
                | Self::CallableAttribute
        )
    }
}

impl fmt::Display for Found {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Method => "method",
            Self::ClassMethod => "class method",
            Self::StaticMethod => "static method",
            Self::Field => "field",
            Self::CallableField => "callable field",
            Self::Property => "property",
            Self::Null => "null member",
            Self::CallableAttribute => "callable instance attribute",
            Self::DataAttribute => "instance attribute",
        };
        f.write_str(text)
    }
}

/// Why a requirement was not met.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MismatchReason {
    /// Nothing resolves to the name.
    Missing,

    /// The name is explicitly set to nothing.
    Disabled,

    /// The name resolves to a member of an incompatible kind.
    WrongKind(Found),
}

/// The first requirement a candidate fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub requirement: MemberRequirement,
    pub reason: MismatchReason,
}

impl Mismatch {
    pub fn member(&self) -> &str {
        &self.requirement.name
    }

    pub fn expected(&self) -> MemberKind {
        self.requirement.kind
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = &self.requirement.name;
        let kind = self.requirement.kind;
        match self.reason {
            MismatchReason::Missing => write!(f, "missing `{}` ({})", name, kind),
            MismatchReason::Disabled => {
                write!(f, "`{}` is disabled but must be a {}", name, kind)
            }
            MismatchReason::WrongKind(found) => {
                write!(f, "`{}` is a {} but must be a {}", name, found, kind)
            }
        }
    }
}

fn resolve(candidate: Candidate<'_>, name: &str) -> Option<Found> {
    match candidate {
        Candidate::Type(ty) => ty.lookup(name).map(|r| Found::from_def(r.def)),
        Candidate::Instance(obj) => obj.lookup(name).map(|resolved| match resolved {
            InstanceResolved::Type(r) => Found::from_def(r.def),
            InstanceResolved::Attribute { callable: true } => Found::CallableAttribute,
            InstanceResolved::Attribute { callable: false } => Found::DataAttribute,
        }),
    }
}

/// Check one requirement against a candidate.
pub fn check(candidate: Candidate<'_>, requirement: &MemberRequirement) -> Result<(), MismatchReason> {
    // Class-level requirements only look at the type; instance attributes
    // shadowing the name do not count.
    let found = if requirement.kind.is_type_level() {
        resolve(Candidate::Type(candidate.type_def()), &requirement.name)
    } else {
        resolve(candidate, &requirement.name)
    };

    let found = match found {
        Some(Found::Null) if requirement.kind.is_callable() && !requirement.required => return Ok(()),
        Some(found) => found,
        None if requirement.required => return Err(MismatchReason::Missing),
        None => return Ok(()),
    };

    let compatible = match requirement.kind {
        MemberKind::Data => true,
        MemberKind::InstanceMethod => found.is_callable(),
        MemberKind::ClassMethod => found == Found::ClassMethod,
        MemberKind::StaticMethod => found == Found::StaticMethod,
    };

    if compatible {
        Ok(())
    } else if found == Found::Null {
        Err(MismatchReason::Disabled)
    } else {
        Err(MismatchReason::WrongKind(found))
    }
}

/// Whether `candidate` satisfies `requirement`.
pub fn matches(candidate: Candidate<'_>, requirement: &MemberRequirement) -> bool {
    check(candidate, requirement).is_ok()
}

/// The first requirement of `protocol`, in inventory order, that `candidate`
/// fails.
pub fn find_mismatch(candidate: Candidate<'_>, protocol: &Protocol) -> Option<Mismatch> {
    protocol.members().iter().find_map(|requirement| {
        check(candidate, requirement).err().map(|reason| Mismatch {
            requirement: requirement.clone(),
            reason,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AttrValue;
    use serde_json::json;

    #[test]
    fn test_data_requirement_accepts_plain_field() {
        let ty = TypeDef::builder("Named").field("name").build().unwrap();
        assert!(matches(Candidate::Type(&ty), &MemberRequirement::data("name")));
    }

    #[test]
    fn test_method_requirement_rejects_plain_field() {
        let ty = TypeDef::builder("Named").field("run").build().unwrap();
        assert_eq!(
            check(Candidate::Type(&ty), &MemberRequirement::method("run")),
            Err(MismatchReason::WrongKind(Found::Field))
        );
    }

    #[test]
    fn test_data_requirement_accepts_callables() {
        let ty = TypeDef::builder("Runner").method("run").build().unwrap();
        assert!(matches(Candidate::Type(&ty), &MemberRequirement::data("run")));
    }

    #[test]
    fn test_class_method_must_be_on_type() {
        let ty = TypeDef::builder("Plain").build().unwrap();
        let obj = Instance::new(ty).with_attr("create", AttrValue::Callable);

        assert_eq!(
            check(Candidate::Instance(&obj), &MemberRequirement::class_method("create")),
            Err(MismatchReason::Missing)
        );

        let ty = TypeDef::builder("Factory").method("create").build().unwrap();
        assert_eq!(
            check(Candidate::Type(&ty), &MemberRequirement::class_method("create")),
            Err(MismatchReason::WrongKind(Found::Method))
        );
    }

    #[test]
    fn test_class_method_ignores_shadowing_attribute() {
        let ty = TypeDef::builder("Factory").class_method("create").build().unwrap();
        let obj = Instance::new(ty).with_attr("create", AttrValue::Data(json!(null)));

        assert!(matches(Candidate::Instance(&obj), &MemberRequirement::class_method("create")));
        // The same shadowing does break an instance method requirement.
        assert!(!matches(Candidate::Instance(&obj), &MemberRequirement::method("create")));
    }

    #[test]
    fn test_null_member_disables_callable_requirement() {
        let base = TypeDef::builder("Base").method("close").build().unwrap();
        let derived = TypeDef::builder("Derived").base(base).null("close").build().unwrap();

        assert_eq!(
            check(Candidate::Type(&derived), &MemberRequirement::method("close")),
            Err(MismatchReason::Disabled)
        );
        assert!(matches(Candidate::Type(&derived), &MemberRequirement::data("close")));
        assert!(matches(
            Candidate::Type(&derived),
            &MemberRequirement::method("close").optional()
        ));
    }

    #[test]
    fn test_property_is_not_callable() {
        let ty = TypeDef::builder("Lazy")
            .property("run", |_| AttrValue::Callable)
            .build()
            .unwrap();
        assert!(!matches(Candidate::Type(&ty), &MemberRequirement::method("run")));
        assert!(matches(Candidate::Type(&ty), &MemberRequirement::data("run")));
    }

    #[test]
    fn test_optional_absent_member_is_fine() {
        let ty = TypeDef::builder("Empty").build().unwrap();
        assert!(matches(Candidate::Type(&ty), &MemberRequirement::method("flush").optional()));

        let ty = TypeDef::builder("Odd").field("flush").build().unwrap();
        assert!(!matches(Candidate::Type(&ty), &MemberRequirement::method("flush").optional()));
    }

    #[test]
    fn test_find_mismatch_reports_first_failure() {
        let protocol = Protocol::builder("Stream")
            .method("open")
            .method("read")
            .method("close")
            .build()
            .unwrap();
        let ty = TypeDef::builder("HalfStream").method("open").build().unwrap();

        let mismatch = find_mismatch(Candidate::Type(&ty), &protocol).unwrap();
        assert_eq!(mismatch.member(), "read");
        assert_eq!(mismatch.reason, MismatchReason::Missing);
        assert_eq!(mismatch.to_string(), "missing `read` (instance method)");
    }
}
