//! Command to list the declarations in a file.

use std::path::Path;
use std::process::ExitCode;

use colored::Colorize;

/// Execute the list command
pub fn execute(file: &Path) -> anyhow::Result<ExitCode> {
    let decls = super::load(file)?;

    println!("{}", "Protocols:".bold());
    for protocol in decls.protocols() {
        match protocol.components() {
            Some(components) => {
                let names: Vec<&str> = components.iter().map(|c| c.name()).collect();
                println!("  {} = {}", protocol.name().cyan(), names.join(" & "));
            }
            None => println!("  {}", protocol.name().cyan()),
        }
        for requirement in protocol.members() {
            println!("    {}", requirement);
        }
    }

    println!("{}", "Types:".bold());
    for type_def in decls.types() {
        let bases: Vec<&str> = type_def.bases().iter().map(|b| b.name()).collect();
        if bases.is_empty() {
            println!("  {}", type_def.name().cyan());
        } else {
            println!("  {} ({})", type_def.name().cyan(), bases.join(", "));
        }
        for (name, def) in type_def.own_members() {
            println!("    {}: {}", name, def.describe());
        }
    }

    println!("{}", "Instances:".bold());
    for (name, instance) in decls.instances() {
        println!("  {}: {}", name.cyan(), instance.type_def().name());
        for attr in instance.attr_names() {
            println!("    {}", attr);
        }
    }

    Ok(ExitCode::SUCCESS)
}
