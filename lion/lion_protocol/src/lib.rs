//! # Lion Protocol
//!
//! `lion_protocol` checks at runtime whether values structurally conform to
//! protocols (capability sets) without requiring them to declare so.
//!
//! Key concepts:
//!
//! 1. **Protocol**: A named set of member requirements, possibly refining
//!    other protocols.
//!
//! 2. **Member Inventory**: The flattened, de-duplicated requirement list of
//!    a protocol, merged once when the protocol is built.
//!
//! 3. **Conformance**: An instance or type conforms when it nominally
//!    implements the protocol, when a subtype hook says so, or when it
//!    exposes every required member with a compatible kind.
//!
//! 4. **Intersection**: A protocol satisfied only by values satisfying all
//!    of its components, identified by its components rather than its
//!    merged members.

pub mod check;
pub mod compose;
pub mod config;
pub mod decl;
pub mod inventory;
pub mod model;
pub mod registry;
pub mod store;

// Re-export key types for convenience
pub use check::{AuditEntry, AuditLog, Candidate, CheckMode, ConformanceEngine, Mismatch, MismatchReason, Nominal};
pub use compose::{intersect, IntersectionBuilder};
pub use config::EngineConfig;
pub use decl::Declarations;
pub use inventory::MemberInventory;
pub use model::{
    AttrValue, Instance, MemberDef, MemberKind, MemberRequirement, Protocol, ProtocolBuilder, TypeDef,
    TypeDefBuilder,
};
pub use registry::CapabilityRegistry;
pub use store::CacheStats;
