//! Intersections.

use std::collections::HashSet;
use std::sync::Arc;

use lion_core::error::DeclarationError;
use lion_core::id::ProtocolId;
use tracing::trace;
use uuid::Uuid;

use crate::inventory::MemberInventory;
use crate::model::protocol::ProtocolKind;
use crate::model::{Protocol, TypeDef};

/// Intersect `components` under a generated name.
///
/// Equivalent to `IntersectionBuilder::new().components(components).build()`.
pub fn intersect(components: &[Arc<Protocol>]) -> Result<Arc<Protocol>, DeclarationError> {
    IntersectionBuilder::new().components(components.iter().cloned()).build()
}

/// Builder for intersection protocols.
///
/// The identity of an intersection depends only on the set of its
/// components and its nominal base, so intersecting the same protocols in
/// any order yields equal protocols while intersections of different
/// protocols stay distinct even when their merged members coincide.
#[derive(Default)]
pub struct IntersectionBuilder {
    name: Option<String>,
    components: Vec<Arc<Protocol>>,
    nominal_base: Option<Arc<TypeDef>>,
}

impl IntersectionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name the intersection. Defaults to the component names joined by `&`.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn component(mut self, protocol: Arc<Protocol>) -> Self {
        self.components.push(protocol);
        self
    }

    pub fn components(mut self, protocols: impl IntoIterator<Item = Arc<Protocol>>) -> Self {
        self.components.extend(protocols);
        self
    }

    /// Require conforming types to inherit from `base`.
    pub fn nominal_base(mut self, base: Arc<TypeDef>) -> Self {
        self.nominal_base = Some(base);
        self
    }

    /// Build the intersection.
    ///
    /// Nested intersections without a nominal base are flattened into their
    /// components, the root protocol is dropped, and repeated components are
    /// kept once in first-seen order.
    ///
    /// # Errors
    ///
    /// * [`DeclarationError::TooFewComponents`] - If fewer than two distinct
    ///   components remain.
    /// * [`DeclarationError::KindConflict`] - If two components declare the
    ///   same member with irreconcilable kinds.
    pub fn build(self) -> Result<Arc<Protocol>, DeclarationError> {
        let mut flat: Vec<Arc<Protocol>> = Vec::new();
        let mut seen: HashSet<ProtocolId> = HashSet::new();
        for component in self.components {
            flatten_into(component, &mut flat, &mut seen);
        }

        if flat.len() < 2 {
            return Err(DeclarationError::TooFewComponents { given: flat.len() });
        }

        let id = intersection_id(&flat, self.nominal_base.as_deref());
        let name = self.name.unwrap_or_else(|| {
            flat.iter().map(|p| p.name()).collect::<Vec<_>>().join(" & ")
        });
        let inventory = MemberInventory::merge(&name, &[], &flat)?;
        let runtime_checkable = flat.iter().all(|p| p.is_runtime_checkable());

        trace!(intersection = %name, components = flat.len(), "built intersection");

        Ok(Arc::new(Protocol {
            id,
            name,
            own: Vec::new(),
            parents: flat,
            kind: ProtocolKind::Intersection {
                nominal_base: self.nominal_base,
            },
            runtime_checkable,
            subtype_hook: None,
            inventory,
        }))
    }
}

fn flatten_into(protocol: Arc<Protocol>, out: &mut Vec<Arc<Protocol>>, seen: &mut HashSet<ProtocolId>) {
    if protocol.is_root() {
        return;
    }
    if protocol.nominal_base().is_none() {
        if let Some(components) = protocol.components() {
            for component in components {
                flatten_into(component.clone(), out, seen);
            }
            return;
        }
    }
    if seen.insert(protocol.id()) {
        out.push(protocol);
    }
}

fn intersection_id(components: &[Arc<Protocol>], base: Option<&TypeDef>) -> ProtocolId {
    let mut ids: Vec<Uuid> = components.iter().map(|p| p.id().uuid()).collect();
    ids.sort();

    let mut bytes = Vec::with_capacity(ids.len() * 16 + 21);
    bytes.extend_from_slice(b"intersection:");
    for id in &ids {
        bytes.extend_from_slice(id.as_bytes());
    }
    if let Some(base) = base {
        bytes.extend_from_slice(b"base:");
        bytes.extend_from_slice(base.id().uuid().as_bytes());
    }
    ProtocolId::derived(&bytes)
}
