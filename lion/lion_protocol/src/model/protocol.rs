//! Protocols.
//!
//! A protocol (capability set) is a named collection of member requirements
//! plus the protocols it refines. Protocols are immutable once built; their
//! effective member list is merged at build time so that broken declarations
//! fail where they are declared.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use lazy_static::lazy_static;
use lion_core::error::DeclarationError;
use lion_core::id::ProtocolId;

use crate::check::ConformanceEngine;
use crate::inventory::MemberInventory;

use super::member::MemberRequirement;
use super::types::TypeDef;

/// Hook overriding structural subtype checks for a protocol.
///
/// Returning `Some(answer)` decides the check; `None` falls through to the
/// regular algorithm. The engine is passed in so hooks can run nested checks.
pub type SubtypeHook = Arc<dyn Fn(&ConformanceEngine, &TypeDef) -> Option<bool> + Send + Sync>;

/// How a protocol was produced.
#[derive(Clone)]
pub(crate) enum ProtocolKind {
    /// The universal marker every value satisfies.
    Root,

    /// A protocol declared through [`ProtocolBuilder`].
    Declared,

    /// The conjunction of its parents.
    Intersection { nominal_base: Option<Arc<TypeDef>> },
}

lazy_static! {
    static ref ROOT: Arc<Protocol> = Arc::new(Protocol {
        id: ProtocolId::derived(b"lion_protocol::root"),
        name: "Root".to_string(),
        own: Vec::new(),
        parents: Vec::new(),
        kind: ProtocolKind::Root,
        runtime_checkable: true,
        subtype_hook: None,
        inventory: MemberInventory::default(),
    });
}

/// A named capability set.
pub struct Protocol {
    pub(crate) id: ProtocolId,
    pub(crate) name: String,
    pub(crate) own: Vec<MemberRequirement>,
    pub(crate) parents: Vec<Arc<Protocol>>,
    pub(crate) kind: ProtocolKind,
    pub(crate) runtime_checkable: bool,
    pub(crate) subtype_hook: Option<SubtypeHook>,
    pub(crate) inventory: MemberInventory,
}

impl Protocol {
    /// Start declaring a new protocol.
    pub fn builder(name: impl Into<String>) -> ProtocolBuilder {
        ProtocolBuilder::new(name)
    }

    /// The universal root protocol.
    pub fn root() -> Arc<Protocol> {
        ROOT.clone()
    }

    /// Get the protocol's unique identifier.
    ///
    /// Intersections get an id derived from their components, so equal
    /// component sets share it.
    pub fn id(&self) -> ProtocolId {
        self.id
    }

    /// Get the protocol's display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Requirements declared directly on this protocol.
    pub fn own_members(&self) -> &[MemberRequirement] {
        &self.own
    }

    /// Protocols this one refines. For intersections these are the
    /// components.
    pub fn parents(&self) -> &[Arc<Protocol>] {
        &self.parents
    }

    /// The merged, de-duplicated requirement list.
    pub fn members(&self) -> &MemberInventory {
        &self.inventory
    }

    /// Whether this is the universal root protocol.
    pub fn is_root(&self) -> bool {
        matches!(self.kind, ProtocolKind::Root)
    }

    /// Whether this protocol was built by intersecting others.
    pub fn is_intersection(&self) -> bool {
        matches!(self.kind, ProtocolKind::Intersection { .. })
    }

    /// Components of an intersection, `None` for other protocols.
    pub fn components(&self) -> Option<&[Arc<Protocol>]> {
        match self.kind {
            ProtocolKind::Intersection { .. } => Some(&self.parents),
            _ => None,
        }
    }

    /// The concrete base every conforming type must inherit from, if any.
    pub fn nominal_base(&self) -> Option<&Arc<TypeDef>> {
        match &self.kind {
            ProtocolKind::Intersection { nominal_base } => nominal_base.as_ref(),
            _ => None,
        }
    }

    /// Whether the engine may check values against this protocol.
    ///
    /// # Returns
    ///
    /// `false` if the protocol was declared with
    /// [`ProtocolBuilder::not_runtime_checkable`], or is an intersection with
    /// such a component. Checks against it fail with
    /// `ProtocolError::NotRuntimeCheckable`.
    pub fn is_runtime_checkable(&self) -> bool {
        self.runtime_checkable
    }

    /// The hook overriding subtype checks, if one was installed.
    pub fn subtype_hook(&self) -> Option<&SubtypeHook> {
        self.subtype_hook.as_ref()
    }

    /// Whether this protocol is `other` or (transitively) refines it.
    pub fn refines(&self, other: &Protocol) -> bool {
        if self.id == other.id || other.is_root() {
            return true;
        }
        self.parents.iter().any(|parent| parent.refines(other))
    }
}

impl PartialEq for Protocol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Protocol {}

impl Hash for Protocol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Protocol")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("parents", &self.parents.iter().map(|p| p.name()).collect::<Vec<_>>())
            .field("members", &self.inventory.names().collect::<Vec<_>>())
            .finish()
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Builder for declared protocols.
pub struct ProtocolBuilder {
    name: String,
    own: Vec<MemberRequirement>,
    parents: Vec<Arc<Protocol>>,
    runtime_checkable: bool,
    subtype_hook: Option<SubtypeHook>,
}

impl ProtocolBuilder {
    /// Create a builder for a runtime checkable protocol with no members.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            own: Vec::new(),
            parents: Vec::new(),
            runtime_checkable: true,
            subtype_hook: None,
        }
    }

    /// The name the protocol will be built with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a requirement.
    pub fn member(mut self, requirement: MemberRequirement) -> Self {
        self.own.push(requirement);
        self
    }

    pub fn method(self, name: impl Into<String>) -> Self {
        self.member(MemberRequirement::method(name))
    }

    pub fn class_method(self, name: impl Into<String>) -> Self {
        self.member(MemberRequirement::class_method(name))
    }

    pub fn static_method(self, name: impl Into<String>) -> Self {
        self.member(MemberRequirement::static_method(name))
    }

    pub fn data(self, name: impl Into<String>) -> Self {
        self.member(MemberRequirement::data(name))
    }

    /// Refine `parent`, inheriting all of its requirements.
    pub fn parent(mut self, parent: Arc<Protocol>) -> Self {
        self.parents.push(parent);
        self
    }

    /// Forbid structural checks against this protocol.
    pub fn not_runtime_checkable(mut self) -> Self {
        self.runtime_checkable = false;
        self
    }

    /// Install a hook deciding subtype checks.
    pub fn subtype_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ConformanceEngine, &TypeDef) -> Option<bool> + Send + Sync + 'static,
    {
        self.subtype_hook = Some(Arc::new(hook));
        self
    }

    /// Build the protocol, merging its requirements with those of its parents.
    ///
    /// # Errors
    ///
    /// Returns a [`DeclarationError::KindConflict`] if two declarations of the
    /// same member disagree on its kind.
    pub fn build(self) -> Result<Arc<Protocol>, DeclarationError> {
        let inventory = MemberInventory::merge(&self.name, &self.own, &self.parents)?;

        Ok(Arc::new(Protocol {
            id: ProtocolId::new(),
            name: self.name,
            own: self.own,
            parents: self.parents,
            kind: ProtocolKind::Declared,
            runtime_checkable: self.runtime_checkable,
            subtype_hook: self.subtype_hook,
            inventory,
        }))
    }
}
