//! Type definitions.
//!
//! A [`TypeDef`] is the class-like descriptor the conformance engine inspects.
//! It lists its bases, the members declared in its own scope and the
//! protocols it nominally implements. Member lookup walks the resolution
//! order and reports which member a name resolves to without evaluating it.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::sync::Arc;

use lion_core::error::DeclarationError;
use lion_core::id::TypeDefId;

use super::instance::{AttrValue, Instance};
use super::protocol::Protocol;

/// Getter of a computed member. Only [`Instance::get_attr`] ever runs it.
pub type PropertyGetter = Arc<dyn Fn(&Instance) -> AttrValue + Send + Sync>;

/// A member declared in the scope of a type.
#[derive(Clone)]
pub enum MemberDef {
    /// A method called on instances.
    Method,

    /// A method bound to the type.
    ClassMethod,

    /// A plain function stored on the type.
    StaticMethod,

    /// A stored attribute. `callable` is true when the stored value is itself
    /// a function.
    Field { callable: bool },

    /// A computed attribute.
    Property(PropertyGetter),

    /// The name is declared but explicitly set to nothing. Callable
    /// requirements treat it as absent.
    Null,
}

impl MemberDef {
    /// Short description used in diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Method => "method",
            Self::ClassMethod => "class method",
            Self::StaticMethod => "static method",
            Self::Field { callable: true } => "callable field",
            Self::Field { callable: false } => "field",
            Self::Property(_) => "property",
            Self::Null => "null member",
        }
    }
}

impl fmt::Debug for MemberDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}

/// The outcome of a static member lookup on a type.
#[derive(Debug, Clone, Copy)]
pub struct Resolved<'a> {
    /// The member the name resolves to.
    pub def: &'a MemberDef,

    /// The type in the resolution order that declares it.
    pub owner: &'a TypeDef,
}

/// A class-like type descriptor.
pub struct TypeDef {
    id: TypeDefId,
    name: String,
    bases: Vec<Arc<TypeDef>>,
    /// Ancestors in resolution order, excluding the type itself.
    ancestors: Vec<Arc<TypeDef>>,
    members: BTreeMap<String, MemberDef>,
    implements: Vec<Arc<Protocol>>,
}

impl TypeDef {
    /// Start declaring a new type.
    pub fn builder(name: impl Into<String>) -> TypeDefBuilder {
        TypeDefBuilder::new(name)
    }

    /// Get the type's unique identifier.
    pub fn id(&self) -> TypeDefId {
        self.id
    }

    /// Get the type's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Direct bases in declaration order.
    pub fn bases(&self) -> &[Arc<TypeDef>] {
        &self.bases
    }

    /// Protocols this type declares it implements.
    pub fn implements(&self) -> &[Arc<Protocol>] {
        &self.implements
    }

    /// Members declared in this type's own scope, sorted by name.
    pub fn own_members(&self) -> impl Iterator<Item = (&str, &MemberDef)> {
        self.members.iter().map(|(name, def)| (name.as_str(), def))
    }

    /// The type followed by its ancestors, in resolution order.
    pub fn resolution_order(&self) -> impl Iterator<Item = &TypeDef> {
        std::iter::once(self).chain(self.ancestors.iter().map(|t| t.as_ref()))
    }

    /// Resolve `name` to the member it denotes, walking the resolution order.
    ///
    /// This never runs property getters; it only reports what the name is
    /// bound to and where.
    pub fn lookup(&self, name: &str) -> Option<Resolved<'_>> {
        self.resolution_order().find_map(|owner| {
            owner
                .members
                .get(name)
                .map(|def| Resolved { def, owner })
        })
    }

    /// Whether `other` appears anywhere in this type's resolution order.
    pub fn inherits_from(&self, other: &TypeDef) -> bool {
        self.resolution_order().any(|t| t.id == other.id)
    }

    /// Whether this type or an ancestor declares it implements `protocol`
    /// (directly or through a refinement).
    pub fn declares(&self, protocol: &Protocol) -> bool {
        self.resolution_order()
            .flat_map(|t| t.implements.iter())
            .any(|p| p.refines(protocol))
    }
}

impl PartialEq for TypeDef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeDef {}

impl fmt::Debug for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDef")
            .field("name", &self.name)
            .field("bases", &self.bases.iter().map(|b| b.name()).collect::<Vec<_>>())
            .field("members", &self.members)
            .finish()
    }
}

/// Builder for [`TypeDef`].
pub struct TypeDefBuilder {
    name: String,
    bases: Vec<Arc<TypeDef>>,
    members: BTreeMap<String, MemberDef>,
    implements: Vec<Arc<Protocol>>,
}

impl TypeDefBuilder {
    /// Create a builder for a type with no bases and no members.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bases: Vec::new(),
            members: BTreeMap::new(),
            implements: Vec::new(),
        }
    }

    /// Add a direct base.
    pub fn base(mut self, base: Arc<TypeDef>) -> Self {
        self.bases.push(base);
        self
    }

    /// Declare that this type nominally implements `protocol`.
    pub fn implements(mut self, protocol: Arc<Protocol>) -> Self {
        self.implements.push(protocol);
        self
    }

    /// Declare a member. A later declaration of the same name replaces the
    /// earlier one.
    pub fn member(mut self, name: impl Into<String>, def: MemberDef) -> Self {
        self.members.insert(name.into(), def);
        self
    }

    /// Declare an instance method.
    pub fn method(self, name: impl Into<String>) -> Self {
        self.member(name, MemberDef::Method)
    }

    /// Declare a method bound to the type.
    pub fn class_method(self, name: impl Into<String>) -> Self {
        self.member(name, MemberDef::ClassMethod)
    }

    /// Declare a method bound to neither the type nor the instance.
    pub fn static_method(self, name: impl Into<String>) -> Self {
        self.member(name, MemberDef::StaticMethod)
    }

    /// Declare a plain data field.
    pub fn field(self, name: impl Into<String>) -> Self {
        self.member(name, MemberDef::Field { callable: false })
    }

    /// Declare a field whose value is callable.
    pub fn callable_field(self, name: impl Into<String>) -> Self {
        self.member(name, MemberDef::Field { callable: true })
    }

    /// Declare a computed member.
    ///
    /// # Arguments
    ///
    /// * `name` - The member name.
    /// * `getter` - Computes the value when the member is read with
    ///   [`Instance::get_attr`]. Conformance checks never call it.
    pub fn property<F>(self, name: impl Into<String>, getter: F) -> Self
    where
        F: Fn(&Instance) -> AttrValue + Send + Sync + 'static,
    {
        self.member(name, MemberDef::Property(Arc::new(getter)))
    }

    /// Explicitly bind `name` to nothing, disabling an inherited member.
    pub fn null(self, name: impl Into<String>) -> Self {
        self.member(name, MemberDef::Null)
    }

    /// Build the type, computing its resolution order.
    ///
    /// # Errors
    ///
    /// Returns [`DeclarationError::InconsistentHierarchy`] when the bases
    /// admit no consistent linearization (including repeated bases).
    pub fn build(self) -> Result<Arc<TypeDef>, DeclarationError> {
        let ancestors = linearize(&self.name, &self.bases)?;

        Ok(Arc::new(TypeDef {
            id: TypeDefId::new(),
            name: self.name,
            bases: self.bases,
            ancestors,
            members: self.members,
            implements: self.implements,
        }))
    }
}

/// C3 linearization of `bases`.
fn linearize(name: &str, bases: &[Arc<TypeDef>]) -> Result<Vec<Arc<TypeDef>>, DeclarationError> {
    let mut sequences: Vec<VecDeque<Arc<TypeDef>>> = bases
        .iter()
        .map(|base| {
            std::iter::once(base.clone())
                .chain(base.ancestors.iter().cloned())
                .collect()
        })
        .collect();
    sequences.push(bases.iter().cloned().collect());

    let mut order = Vec::new();
    loop {
        sequences.retain(|seq| !seq.is_empty());
        if sequences.is_empty() {
            return Ok(order);
        }

        // A head is eligible when it appears in no sequence's tail.
        let head = sequences
            .iter()
            .map(|seq| &seq[0])
            .find(|candidate| {
                !sequences
                    .iter()
                    .any(|seq| seq.iter().skip(1).any(|t| t.id == candidate.id))
            })
            .cloned()
            .ok_or_else(|| DeclarationError::InconsistentHierarchy(name.to_string()))?;

        for seq in sequences.iter_mut() {
            if seq[0].id == head.id {
                seq.pop_front();
            }
        }
        order.push(head);
    }
}
