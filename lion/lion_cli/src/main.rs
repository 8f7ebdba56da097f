//! Lion protocol CLI - checks declared types and instances against protocols.

mod cli;
mod commands;
mod error;
mod logging;

use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.log_level);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.command {
        Commands::Check { file, target, json } => commands::check::execute(&file, &target, json),
        Commands::Explain { file, target } => commands::explain::execute(&file, &target),
        Commands::Report { file, json } => commands::report::execute(&file, json),
        Commands::List { file } => commands::list::execute(&file),
    }
}
