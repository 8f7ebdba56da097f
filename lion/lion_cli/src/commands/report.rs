//! Command to check every candidate against every protocol.

use std::path::Path;
use std::process::ExitCode;

use colored::Colorize;
use lion_protocol::Candidate;
use serde::Serialize;

#[derive(Serialize)]
struct ReportRow {
    protocol: String,
    candidate: String,
    kind: &'static str,
    conforms: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Execute the report command
pub fn execute(file: &Path, json: bool) -> anyhow::Result<ExitCode> {
    let decls = super::load(file)?;
    let engine = decls.engine();

    let mut candidates: Vec<(String, &'static str, Candidate<'_>)> = Vec::new();
    for type_def in decls.types() {
        candidates.push((type_def.name().to_string(), "type", Candidate::Type(type_def)));
    }
    for (name, instance) in decls.instances() {
        candidates.push((name.to_string(), "instance", Candidate::Instance(instance)));
    }

    let mut rows = Vec::new();
    for protocol in decls.protocols() {
        for (name, kind, candidate) in &candidates {
            let (conforms, error) = match super::conforms(&engine, *candidate, protocol) {
                Ok(conforms) => (Some(conforms), None),
                Err(e) => (None, Some(e.to_string())),
            };
            rows.push(ReportRow {
                protocol: protocol.name().to_string(),
                candidate: name.clone(),
                kind,
                conforms,
                error,
            });
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(ExitCode::SUCCESS);
    }

    let mut current = None;
    for row in &rows {
        if current != Some(&row.protocol) {
            println!("{}", row.protocol.cyan().bold());
            current = Some(&row.protocol);
        }
        let mark = match row.conforms {
            Some(true) => "✓".green(),
            Some(false) => "✗".red(),
            None => "-".yellow(),
        };
        print!("  {} {} {}", mark, row.kind, row.candidate);
        match &row.error {
            Some(error) => println!(" ({})", error),
            None => println!(),
        }
    }

    Ok(ExitCode::SUCCESS)
}
