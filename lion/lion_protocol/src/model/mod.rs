//! Protocol and type models.
//!
//! This module defines protocols (capability sets), their member
//! requirements, and the type and instance descriptors checked against them.

pub mod instance;
pub mod member;
pub mod protocol;
pub mod types;

pub use instance::{AttrValue, Instance, InstanceResolved};
pub use member::{MemberKind, MemberRequirement};
pub use protocol::{Protocol, ProtocolBuilder, SubtypeHook};
pub use types::{MemberDef, PropertyGetter, Resolved, TypeDef, TypeDefBuilder};
