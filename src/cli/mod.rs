//! CLI module for metacat
//!
//! Provides command-line interface for:
//! - serve: answer JSON requests from stdin with a background indexer
//! - check: validate a configuration file

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{check, load_config, run_command, serve, serve_lines};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_requests, write_json};

/// Parse the command line and run the selected command
pub fn run() -> CliResult<()> {
    run_command(Cli::parse_args().command)
}
