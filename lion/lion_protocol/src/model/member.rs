//! Member requirements.
//!
//! A protocol is made of member requirements: a name plus the kind of member
//! a conforming value must expose under that name.

use std::fmt;
use serde::{Serialize, Deserialize};

/// The kind of member a protocol requires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    /// A method called on an instance.
    InstanceMethod,

    /// A method bound to the type.
    ClassMethod,

    /// A plain function stored on the type.
    StaticMethod,

    /// A plain attribute or field.
    Data,
}

impl MemberKind {
    /// Whether members of this kind must be callable.
    pub fn is_callable(&self) -> bool {
        !matches!(self, Self::Data)
    }

    /// Whether members of this kind can only be satisfied on the type itself.
    pub fn is_type_level(&self) -> bool {
        matches!(self, Self::ClassMethod | Self::StaticMethod)
    }

    /// Combine two kinds declared for the same name.
    ///
    /// An instance method requirement is implied by a class-level callable,
    /// so the stricter kind wins. Any other disagreement is a conflict and
    /// yields `None`.
    pub fn unify(self, other: Self) -> Option<Self> {
        match (self, other) {
            (a, b) if a == b => Some(a),
            (Self::InstanceMethod, k) | (k, Self::InstanceMethod) if k.is_type_level() => Some(k),
            _ => None,
        }
    }
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InstanceMethod => write!(f, "instance method"),
            Self::ClassMethod => write!(f, "class method"),
            Self::StaticMethod => write!(f, "static method"),
            Self::Data => write!(f, "data attribute"),
        }
    }
}

/// A single named member a protocol demands.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberRequirement {
    /// The member name.
    pub name: String,

    /// The expected kind.
    pub kind: MemberKind,

    /// Whether the member must be present.
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

impl MemberRequirement {
    /// Create a required member of the given kind.
    pub fn new(name: impl Into<String>, kind: MemberKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
        }
    }

    /// A required instance method.
    pub fn method(name: impl Into<String>) -> Self {
        Self::new(name, MemberKind::InstanceMethod)
    }

    /// A required class method.
    pub fn class_method(name: impl Into<String>) -> Self {
        Self::new(name, MemberKind::ClassMethod)
    }

    /// A required static method.
    pub fn static_method(name: impl Into<String>) -> Self {
        Self::new(name, MemberKind::StaticMethod)
    }

    /// A required data attribute.
    pub fn data(name: impl Into<String>) -> Self {
        Self::new(name, MemberKind::Data)
    }

    /// Mark this requirement as optional.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

impl fmt::Display for MemberRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.required {
            write!(f, "`{}` ({})", self.name, self.kind)
        } else {
            write!(f, "`{}` (optional {})", self.name, self.kind)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unify_kinds() {
        use MemberKind::*;

        assert_eq!(InstanceMethod.unify(InstanceMethod), Some(InstanceMethod));
        assert_eq!(InstanceMethod.unify(ClassMethod), Some(ClassMethod));
        assert_eq!(StaticMethod.unify(InstanceMethod), Some(StaticMethod));
        assert_eq!(ClassMethod.unify(StaticMethod), None);
        assert_eq!(Data.unify(InstanceMethod), None);
        assert_eq!(Data.unify(Data), Some(Data));
    }

    #[test]
    fn test_requirement_display() {
        assert_eq!(MemberRequirement::method("run").to_string(), "`run` (instance method)");
        assert_eq!(
            MemberRequirement::data("name").optional().to_string(),
            "`name` (optional data attribute)"
        );
    }

    #[test]
    fn test_requirement_deserialize_defaults_to_required() {
        let req: MemberRequirement =
            toml::from_str("name = \"create\"\nkind = \"class_method\"").unwrap();
        assert_eq!(req, MemberRequirement::class_method("create"));
    }
}
