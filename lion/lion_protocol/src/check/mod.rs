//! Conformance checking.
//!
//! This module answers whether an instance or a type satisfies a protocol.

mod audit;
mod engine;
mod guard;
pub mod matcher;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use audit::{AuditEntry, AuditLog};
pub use engine::{ConformanceEngine, Nominal};
pub use matcher::{Candidate, Found, Mismatch, MismatchReason};

/// Whether a check is about a live instance or about a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckMode {
    Instance,
    Subtype,
}

impl fmt::Display for CheckMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instance => write!(f, "instance"),
            Self::Subtype => write!(f, "subtype"),
        }
    }
}
