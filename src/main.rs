//! metacat CLI entry point
//!
//! All logic is delegated to the CLI module; main only reports
//! errors and sets the exit code.

use metacat::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
