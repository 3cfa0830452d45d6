//! CLI argument definitions using clap
//!
//! Commands:
//! - metacat serve [--config <path>]
//! - metacat check [--config <path>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// metacat - metadata catalog with cross-reference integrity
#[derive(Parser, Debug)]
#[command(name = "metacat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve JSON requests from stdin, one per line
    Serve {
        /// Path to configuration file; defaults apply when omitted
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate a configuration file and print the effective settings
    Check {
        /// Path to configuration file; defaults apply when omitted
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
