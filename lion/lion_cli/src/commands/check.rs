//! Command to check one candidate against a protocol.

use std::path::Path;
use std::process::ExitCode;

use colored::Colorize;
use serde::Serialize;
use tracing::info;

use crate::cli::Target;

#[derive(Serialize)]
struct CheckOutput<'a> {
    protocol: &'a str,
    candidate: String,
    conforms: bool,
    mismatch: Option<String>,
}

/// Execute the check command
pub fn execute(file: &Path, target: &Target, json: bool) -> anyhow::Result<ExitCode> {
    let decls = super::load(file)?;
    let engine = decls.engine();
    let (protocol, candidate) = super::resolve(&decls, target)?;

    let conforms = super::conforms(&engine, candidate, &protocol)?;
    let mismatch = if conforms {
        None
    } else {
        engine.find_mismatch(candidate, &protocol)
    };
    info!(protocol = protocol.name(), conforms, "check finished");

    let label = super::describe(candidate, target);
    if json {
        let output = CheckOutput {
            protocol: protocol.name(),
            candidate: label,
            conforms,
            mismatch: mismatch.map(|m| m.to_string()),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if conforms {
        println!("{} {} conforms to {}", "✓".green(), label, protocol.name().cyan());
    } else {
        println!("{} {} does not conform to {}", "✗".red(), label, protocol.name().cyan());
        if let Some(mismatch) = mismatch {
            println!("  {}", mismatch);
        }
    }

    Ok(if conforms { ExitCode::SUCCESS } else { ExitCode::from(1) })
}
