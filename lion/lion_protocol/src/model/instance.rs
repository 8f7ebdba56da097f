//! Instances.
//!
//! An [`Instance`] is a value of some [`TypeDef`] that may carry attributes of
//! its own on top of what its type declares. Attributes can be added and
//! removed at any time, which is why instance checks never trust a cached
//! answer once an instance has attributes of its own.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Serialize, Deserialize};
use serde_json::Value;

use super::types::{MemberDef, Resolved, TypeDef};

/// The value of an attribute read from an instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttrValue {
    /// A function bound to the instance.
    Callable,

    /// Plain data.
    Data(Value),
}

impl AttrValue {
    pub fn is_callable(&self) -> bool {
        matches!(self, Self::Callable)
    }
}

/// What a name resolves to on an instance.
#[derive(Debug, Clone, Copy)]
pub enum InstanceResolved<'a> {
    /// A member found on the instance's type.
    Type(Resolved<'a>),

    /// An attribute stored on the instance itself.
    Attribute { callable: bool },
}

/// A value of a [`TypeDef`].
pub struct Instance {
    type_def: Arc<TypeDef>,
    attrs: RwLock<HashMap<String, AttrValue>>,
}

impl Instance {
    /// Create an instance with no attributes of its own.
    pub fn new(type_def: Arc<TypeDef>) -> Self {
        Self {
            type_def,
            attrs: RwLock::new(HashMap::new()),
        }
    }

    /// Builder-style variant of [`Instance::set_attr`].
    pub fn with_attr(self, name: impl Into<String>, value: AttrValue) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn type_def(&self) -> &Arc<TypeDef> {
        &self.type_def
    }

    /// Set an attribute on this instance, shadowing any non-property member
    /// of the same name on the type.
    pub fn set_attr(&self, name: impl Into<String>, value: AttrValue) {
        self.attrs.write().insert(name.into(), value);
    }

    /// Remove an attribute from this instance.
    pub fn remove_attr(&self, name: &str) -> Option<AttrValue> {
        self.attrs.write().remove(name)
    }

    /// Whether this instance carries any attributes beyond its type.
    pub fn has_overrides(&self) -> bool {
        !self.attrs.read().is_empty()
    }

    /// Names of the attributes stored on this instance, sorted.
    pub fn attr_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.attrs.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Resolve `name` without evaluating anything.
    ///
    /// Properties on the type take precedence over instance attributes;
    /// instance attributes shadow every other kind of type member.
    pub fn lookup(&self, name: &str) -> Option<InstanceResolved<'_>> {
        let on_type = self.type_def.lookup(name);
        if let Some(resolved) = on_type {
            if matches!(resolved.def, MemberDef::Property(_)) {
                return Some(InstanceResolved::Type(resolved));
            }
        }

        if let Some(value) = self.attrs.read().get(name) {
            return Some(InstanceResolved::Attribute {
                callable: value.is_callable(),
            });
        }

        on_type.map(InstanceResolved::Type)
    }

    /// Read an attribute the way a caller would, running property getters.
    ///
    /// The conformance engine never calls this.
    pub fn get_attr(&self, name: &str) -> Option<AttrValue> {
        match self.lookup(name)? {
            InstanceResolved::Attribute { .. } => self.attrs.read().get(name).cloned(),
            InstanceResolved::Type(resolved) => match resolved.def {
                MemberDef::Property(getter) => Some(getter(self)),
                MemberDef::Field { callable: false } => Some(AttrValue::Data(Value::Null)),
                MemberDef::Null => Some(AttrValue::Data(Value::Null)),
                MemberDef::Method
                | MemberDef::ClassMethod
                | MemberDef::StaticMethod
                | MemberDef::Field { callable: true } => Some(AttrValue::Callable),
            },
        }
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type", &self.type_def.name())
            .field("attrs", &self.attr_names())
            .finish()
    }
}
