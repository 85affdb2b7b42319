//! # daosign CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use daosign_cli::commands::{run, Command};
use daosign_protocol::ProtocolConfig;

/// DAOsign proof-of-agreement toolchain.
///
/// Computes typed-data digests for schemas, attestations and revocations,
/// signs and verifies them with Ed25519 keys, and runs a scripted
/// agreement flow against the in-memory protocol service. The signing
/// domain comes from the DAOSIGN_* environment variables.
#[derive(Parser, Debug)]
#[command(name = "daosign", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match run(cli.command, ProtocolConfig::from_env) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
