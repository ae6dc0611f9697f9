//! gitlock: cooperative git-lfs file locking.
//!
//! This is the main entry point for the `gitlock` CLI. It parses arguments,
//! dispatches to the appropriate command handler, and handles errors with
//! proper exit codes.

mod backend;
mod cli;
mod commands;
mod config;
mod context;
mod coordinator;
mod error;
mod events;
mod exit_codes;
mod fs;
mod git;
mod logging;
mod policy;
mod prefs;
mod prompt;
mod runner;
mod target;

#[cfg(test)]
mod test_support;

use cli::Cli;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    logging::init();

    match commands::dispatch(cli.command) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            // Print user-actionable error message to stderr
            eprintln!("Error: {}", err);

            // Return appropriate exit code
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
