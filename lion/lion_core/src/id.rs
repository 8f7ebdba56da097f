//! Strongly-typed identifiers for the Lion protocol system.
//!
//! This module provides a set of identifier types that are used throughout
//! the system, ensuring type safety and clear semantics.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::str::FromStr;
use serde::{Serialize, Deserialize};
use uuid::Uuid;

/// Namespace used for identifiers derived from other identifiers.
const DERIVED_NAMESPACE: Uuid = Uuid::from_u128(0x6c69_6f6e_5f70_726f_746f_636f_6c5f_6964);

/// A type-safe identifier based on UUID.
#[derive(Serialize, Deserialize)]
pub struct Id<T> {
    uuid: Uuid,
    #[serde(skip)]
    _marker: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    /// Create a new random identifier.
    pub fn new() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    /// Create an identifier from a specific UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self {
            uuid,
            _marker: PhantomData,
        }
    }

    /// Create a deterministic identifier from a sequence of bytes.
    ///
    /// The same bytes always produce the same identifier, which makes this
    /// suitable for identities that are a function of other identities.
    pub fn derived(bytes: &[u8]) -> Self {
        Self::from_uuid(Uuid::new_v5(&DERIVED_NAMESPACE, bytes))
    }

    /// Get the underlying UUID.
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Create a nil (all zeros) identifier.
    pub fn nil() -> Self {
        Self::from_uuid(Uuid::nil())
    }
}

impl<T> Default for Id<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.uuid == other.uuid
    }
}

impl<T> Eq for Id<T> {}

impl<T> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.uuid.cmp(&other.uuid)
    }
}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uuid.hash(state);
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.uuid)
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.uuid)
    }
}

impl<T> FromStr for Id<T> {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_uuid(Uuid::parse_str(s)?))
    }
}

/// Marker type for protocols.
pub struct ProtocolMarker;
/// Identifier for a protocol (capability set).
pub type ProtocolId = Id<ProtocolMarker>;

/// Marker type for type definitions.
pub struct TypeDefMarker;
/// Identifier for a type definition.
pub type TypeDefId = Id<TypeDefMarker>;

/// Marker type for conformance engines.
pub struct EngineMarker;
/// Identifier for a conformance engine instance.
pub type EngineId = Id<EngineMarker>;
