//! # Host Deploy CLI
//!
//! This is the binary entry point for the `hostdeploy` command-line tool.
//!
//! Its primary responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Executing the appropriate command based on the parsed arguments.
//! - Turning a failed run into an error message on stderr and the matching
//!   process exit code.
//!
//! The deployment logic lives in the `hostdeploy` library crate.

mod cli;
mod commands;

use clap::Parser;
use hostdeploy::exit_codes;

fn main() {
    let cli = cli::Cli::parse();
    if let Err(err) = cli.execute() {
        log::error!("{:#}", err);
        eprintln!("Error: {:#}", err);
        std::process::exit(exit_code(&err));
    }
}

/// Process exit code for a failed run.
fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<hostdeploy::error::Error>()
        .map(|e| e.exit_code())
        .unwrap_or(exit_codes::ERROR)
}
