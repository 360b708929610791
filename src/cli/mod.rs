//! cli
//!
//! Command-line interface layer for gitpipe.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Install the log subscriber
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to
//! [`commands`], which talk to git only through [`crate::git::Git`].

pub mod args;
pub mod commands;

pub use args::Cli;

use std::path::PathBuf;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use crate::ui::output::Verbosity;

/// Execution context shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    /// Directory to operate in
    pub cwd: PathBuf,
    /// Output verbosity
    pub verbosity: Verbosity,
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    let verbosity = Verbosity::from_flags(cli.quiet, cli.debug);
    init_logging(verbosity);

    let cwd = match cli.cwd {
        Some(ref dir) => dir.clone(),
        None => std::env::current_dir()?,
    };
    let ctx = Context { cwd, verbosity };

    commands::dispatch(cli.command, &ctx)
}

/// Send `tracing` output to stderr.
///
/// `RUST_LOG` wins when set; otherwise the filter follows the verbosity flags.
fn init_logging(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.log_filter()));

    // A subscriber may already be installed when embedded; keep that one.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
