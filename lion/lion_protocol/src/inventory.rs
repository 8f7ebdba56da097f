//! Member inventory.
//!
//! Merges a protocol's own requirements with those of every protocol it
//! refines into one flattened, de-duplicated list. The list keeps declaration
//! order: parents in the order they were declared, then the protocol's own
//! members, with the first occurrence of a name fixing its position.

use std::collections::HashMap;
use std::sync::Arc;

use lion_core::error::DeclarationError;
use tracing::trace;

use crate::model::{MemberKind, MemberRequirement, Protocol};

/// Members every value inherits from the universal root. Never requirements.
pub const ROOT_MEMBERS: &[&str] = &[
    "__new__",
    "__init__",
    "__doc__",
    "__module__",
    "__annotations__",
    "__dict__",
    "__slots__",
    "__weakref__",
];

/// Names the engine uses for its own bookkeeping. Never requirements.
pub const BOOKKEEPING_MEMBERS: &[&str] = &[
    "__protocol_members__",
    "__non_method_members__",
    "__is_protocol__",
    "__runtime_checkable__",
    "__subtype_hook__",
    "__nominal_base__",
    "__components__",
];

/// Whether `name` is excluded from every requirement list.
pub fn is_excluded(name: &str) -> bool {
    ROOT_MEMBERS.contains(&name) || BOOKKEEPING_MEMBERS.contains(&name)
}

/// The effective requirement list of a protocol.
#[derive(Clone, Debug)]
pub struct MemberInventory {
    members: Arc<[MemberRequirement]>,
}

impl Default for MemberInventory {
    fn default() -> Self {
        Self {
            members: Arc::from(Vec::new()),
        }
    }
}

impl MemberInventory {
    /// Merge `own` requirements with the inventories of `parents`.
    ///
    /// # Arguments
    ///
    /// * `protocol` - Name of the protocol being declared, for diagnostics.
    /// * `own` - Requirements declared directly on the protocol.
    /// * `parents` - Protocols being refined. Their inventories are already
    ///   merged, so each protocol is merged exactly once.
    ///
    /// # Returns
    ///
    /// * `Ok(MemberInventory)` - The merged list.
    /// * `Err(DeclarationError::KindConflict)` - If two declarations of the
    ///   same name cannot be reconciled.
    pub fn merge(
        protocol: &str,
        own: &[MemberRequirement],
        parents: &[Arc<Protocol>],
    ) -> Result<Self, DeclarationError> {
        let mut merged: Vec<MemberRequirement> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        let inherited = parents.iter().flat_map(|parent| parent.members().iter());
        for requirement in inherited.chain(own.iter()) {
            if is_excluded(&requirement.name) {
                trace!(protocol, member = %requirement.name, "skipping excluded member");
                continue;
            }

            match index.get(&requirement.name) {
                Some(&position) => {
                    let existing = &mut merged[position];
                    let current = existing.kind;
                    existing.kind = current.unify(requirement.kind).ok_or_else(|| {
                        DeclarationError::KindConflict {
                            protocol: protocol.to_string(),
                            member: requirement.name.clone(),
                            existing: current.to_string(),
                            conflicting: requirement.kind.to_string(),
                        }
                    })?;
                    existing.required |= requirement.required;
                }
                None => {
                    index.insert(requirement.name.clone(), merged.len());
                    merged.push(requirement.clone());
                }
            }
        }

        Ok(Self {
            members: merged.into(),
        })
    }

    /// Iterate over the requirements in inventory order.
    pub fn iter(&self) -> std::slice::Iter<'_, MemberRequirement> {
        self.members.iter()
    }

    /// Names of the requirements in inventory order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|m| m.name.as_str())
    }

    /// Get the merged requirement for a name.
    ///
    /// # Arguments
    ///
    /// * `name` - The member name to look up.
    ///
    /// # Returns
    ///
    /// * `Some(&MemberRequirement)` - The requirement after merging every
    ///   declaration of `name`.
    /// * `None` - If no protocol in the hierarchy requires `name`, or the name
    ///   is excluded.
    pub fn get(&self, name: &str) -> Option<&MemberRequirement> {
        self.members.iter().find(|m| m.name == name)
    }

    /// Number of distinct requirements.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether nothing is required, as for the root protocol.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Requirements that must be callable.
    pub fn callable(&self) -> impl Iterator<Item = &MemberRequirement> {
        self.members.iter().filter(|m| m.kind.is_callable())
    }

    /// Plain data requirements.
    pub fn data(&self) -> impl Iterator<Item = &MemberRequirement> {
        self.members.iter().filter(|m| m.kind == MemberKind::Data)
    }

    /// Whether any requirement is plain data. Such protocols cannot be
    /// checked against a type without a subtype hook.
    pub fn has_data(&self) -> bool {
        self.data().next().is_some()
    }
}

impl<'a> IntoIterator for &'a MemberInventory {
    type Item = &'a MemberRequirement;
    type IntoIter = std::slice::Iter<'a, MemberRequirement>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
