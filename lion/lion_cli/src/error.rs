//! Error types for the Lion protocol CLI.

use thiserror::Error;

/// Errors that can occur in the CLI
#[derive(Error, Debug)]
pub enum CliError {
    #[error("no protocol named `{0}` in the declaration file")]
    UnknownProtocol(String),

    #[error("no type named `{0}` in the declaration file")]
    UnknownType(String),

    #[error("no instance named `{0}` in the declaration file")]
    UnknownInstance(String),

    #[error("either --type or --instance is required")]
    MissingTarget,
}
