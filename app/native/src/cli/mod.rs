//! CLI module for huewall.
//!
//! Parses arguments, sets up logging on stderr and dispatches to the
//! selected command.

mod commands;
pub mod output;

use clap::Parser;
pub use commands::{Cli, Commands, Context, DirArgs, RemoteArgs};
use tracing_subscriber::EnvFilter;

use crate::error::HuewallError;

/// Default log level for a `-v` count.
const fn level_for(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Installs the stderr log subscriber. `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_for(verbose)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Runs the CLI.
///
/// Parses command-line arguments and executes the appropriate command.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn run() -> Result<(), HuewallError> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    cli.execute()
}
