use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use lion_core::utils::LogLevel;

#[derive(Debug, Parser)]
#[command(name = "lion-protocol")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Check types and instances against declared protocols", long_about = None)]
pub struct Cli {
    /// Log verbosity (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check one type or instance against a protocol
    ///
    /// Exits with 0 when it conforms, 1 when it does not and 2 on error.
    Check {
        /// Declaration file
        #[arg(long, value_name = "FILE")]
        file: PathBuf,

        #[command(flatten)]
        target: Target,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show every requirement of a protocol and whether it is met
    Explain {
        /// Declaration file
        #[arg(long, value_name = "FILE")]
        file: PathBuf,

        #[command(flatten)]
        target: Target,
    },

    /// Check every declared type and instance against every declared protocol
    Report {
        /// Declaration file
        #[arg(long, value_name = "FILE")]
        file: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the declarations in a file
    List {
        /// Declaration file
        #[arg(long, value_name = "FILE")]
        file: PathBuf,
    },
}

/// What to check and against which protocol.
#[derive(Debug, Args)]
pub struct Target {
    /// Protocol name
    #[arg(long)]
    pub protocol: String,

    /// Type to check
    #[arg(long = "type", value_name = "TYPE", conflicts_with = "instance", required_unless_present = "instance")]
    pub type_name: Option<String>,

    /// Instance to check
    #[arg(long, value_name = "INSTANCE")]
    pub instance: Option<String>,
}
