//! Error types for the Lion protocol system.
//!
//! Declaration errors are fatal to the declaration that produced them and
//! surface as soon as the declaration is built. A value failing to conform
//! to a protocol is never an error; the engine reports that as `false`.

use thiserror::Error;

/// A type alias for Result with our error types
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Root error type for the Lion protocol system.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Declaration error: {0}")]
    Declaration(#[from] DeclarationError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Errors raised while building or merging a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeclarationError {
    #[error("member `{member}` of `{protocol}` is declared as both {existing} and {conflicting}")]
    KindConflict {
        protocol: String,
        member: String,
        existing: String,
        conflicting: String,
    },

    #[error("`{protocol}` has non-method members ({}); subtype checks are not supported", .members.join(", "))]
    NonMethodSubtypeCheck {
        protocol: String,
        members: Vec<String>,
    },

    #[error("an intersection needs at least two distinct protocols, got {given}")]
    TooFewComponents { given: usize },

    #[error("cannot create a consistent resolution order for `{0}`")]
    InconsistentHierarchy(String),

    #[error("unknown name: {0}")]
    UnknownName(String),

    #[error("declaration cycle through: {0}")]
    Cycle(String),

    #[error("duplicate declaration: {0}")]
    Duplicate(String),

    #[error("attribute `{attr}` of `{instance}` is callable and cannot also have a value")]
    CallableWithValue { instance: String, attr: String },
}

/// Errors raised when a protocol is used in a way it does not support.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("`{0}` is not runtime checkable")]
    NotRuntimeCheckable(String),
}
