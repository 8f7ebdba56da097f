//! Command implementations for the Lion protocol CLI.

pub mod check;
pub mod explain;
pub mod list;
pub mod report;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use lion_protocol::{Candidate, ConformanceEngine, Declarations, Protocol};

use crate::cli::Target;
use crate::error::CliError;

/// Load and resolve a declaration file.
pub fn load(file: &Path) -> anyhow::Result<Declarations> {
    Declarations::load(file).with_context(|| format!("failed to load {}", file.display()))
}

/// The protocol and candidate named by `target`.
pub fn resolve<'a>(decls: &'a Declarations, target: &Target) -> Result<(Arc<Protocol>, Candidate<'a>), CliError> {
    let protocol = decls
        .protocol(&target.protocol)
        .cloned()
        .ok_or_else(|| CliError::UnknownProtocol(target.protocol.clone()))?;

    let candidate = match (&target.type_name, &target.instance) {
        (Some(name), _) => Candidate::Type(
            decls
                .type_def(name)
                .ok_or_else(|| CliError::UnknownType(name.clone()))?,
        ),
        (None, Some(name)) => Candidate::Instance(
            decls
                .instance(name)
                .ok_or_else(|| CliError::UnknownInstance(name.clone()))?,
        ),
        (None, None) => return Err(CliError::MissingTarget),
    };

    Ok((protocol, candidate))
}

/// Run the engine check matching the candidate.
pub fn conforms(engine: &ConformanceEngine, candidate: Candidate<'_>, protocol: &Protocol) -> lion_core::Result<bool> {
    match candidate {
        Candidate::Instance(instance) => engine.is_instance(instance, protocol),
        Candidate::Type(type_def) => engine.is_subtype(type_def, protocol),
    }
}

/// Display name of a candidate, e.g. `instance rex of Dog` or `type Dog`.
pub fn describe(candidate: Candidate<'_>, target: &Target) -> String {
    match (candidate, &target.instance) {
        (Candidate::Instance(instance), Some(name)) => {
            format!("instance {} of {}", name, instance.type_def().name())
        }
        _ => format!("type {}", candidate.type_def().name()),
    }
}
