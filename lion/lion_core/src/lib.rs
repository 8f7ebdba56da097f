//! # Lion Core
//!
//! Core identifiers and error types shared by the Lion protocol crates.
//!
//! - Strongly-typed identifiers for protocols, type definitions and engines
//! - The error hierarchy used by declarations and conformance checks
//! - Small utilities such as log levels
//!
//! The `lion_core` crate is deliberately minimal; the conformance engine
//! itself lives in `lion_protocol`.

pub mod error;
pub mod id;
pub mod utils;

// Re-export key items for convenience
pub use error::{DeclarationError, Error, ProtocolError, Result};
pub use id::{EngineId, Id, ProtocolId, TypeDefId};
pub use utils::LogLevel;

