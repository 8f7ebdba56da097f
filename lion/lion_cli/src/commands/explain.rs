//! Command to explain a check requirement by requirement.

use std::path::Path;
use std::process::ExitCode;

use colored::Colorize;
use lion_protocol::check::matcher;
use lion_protocol::Mismatch;

use crate::cli::Target;

/// Execute the explain command
pub fn execute(file: &Path, target: &Target) -> anyhow::Result<ExitCode> {
    let decls = super::load(file)?;
    let engine = decls.engine();
    let (protocol, candidate) = super::resolve(&decls, target)?;

    println!("{} against {}", super::describe(candidate, target), protocol.name().cyan());

    if let Some(base) = protocol.nominal_base() {
        let ok = candidate.type_def().inherits_from(base);
        let mark = if ok { "✓".green() } else { "✗".red() };
        println!("  {} inherits from {}", mark, base.name());
    }

    let nominal = engine.nominal(candidate.type_def(), &protocol);
    if let Some(reason) = &nominal {
        println!("  {} {}", "✓".green(), reason);
        println!("  {}", "structural requirements (not needed):".yellow());
    }

    if protocol.members().is_empty() {
        println!("  {}", "(no requirements)".yellow());
    }
    for requirement in protocol.members() {
        match matcher::check(candidate, requirement) {
            Ok(()) => println!("  {} {}", "✓".green(), requirement),
            Err(reason) => {
                let mismatch = Mismatch {
                    requirement: requirement.clone(),
                    reason,
                };
                println!("  {} {}", "✗".red(), mismatch);
            }
        }
    }

    let conforms = super::conforms(&engine, candidate, &protocol)?;
    let verdict = if conforms { "conforms".green() } else { "does not conform".red() };
    println!("result: {}", verdict);

    Ok(if conforms { ExitCode::SUCCESS } else { ExitCode::from(1) })
}
