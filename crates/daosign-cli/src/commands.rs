//! # Subcommand Dispatch
//!
//! Routes a parsed subcommand to its handler. The signing domain is
//! resolved only for subcommands that hash or sign, so a malformed
//! `DAOSIGN_*` variable never gets in the way of `keygen`.

use anyhow::Result;
use clap::Subcommand;

use daosign_core::SigningDomain;
use daosign_protocol::{ConfigError, ProtocolConfig};

use crate::demo::{run_demo, DemoArgs};
use crate::keys::{run_keygen, KeygenArgs};
use crate::message::{run_digest, DigestArgs};
use crate::signing::{run_sign, run_verify, SignArgs, VerifyArgs};

/// Exit code for an unusable signing-domain configuration.
pub const CONFIG_EXIT_CODE: u8 = 2;

/// `daosign` subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate an Ed25519 keypair.
    Keygen(KeygenArgs),

    /// Print the digest a signer signs for a schema, attestation or revocation.
    Digest(DigestArgs),

    /// Sign a message document with a private key.
    Sign(SignArgs),

    /// Verify a signature over a message document.
    Verify(VerifyArgs),

    /// Run a 2-of-3 agreement and revocation end to end.
    Demo(DemoArgs),
}

/// Run `command`, loading the signing domain through `config` when the
/// command needs one.
pub fn run(
    command: Command,
    config: impl FnOnce() -> Result<ProtocolConfig, ConfigError>,
) -> Result<u8> {
    match command {
        Command::Keygen(args) => run_keygen(&args),
        Command::Digest(args) => with_domain(config, |domain| run_digest(&args, &domain)),
        Command::Sign(args) => with_domain(config, |domain| run_sign(&args, &domain)),
        Command::Verify(args) => with_domain(config, |domain| run_verify(&args, &domain)),
        Command::Demo(args) => with_domain(config, |domain| run_demo(&args, domain)),
    }
}

fn with_domain(
    config: impl FnOnce() -> Result<ProtocolConfig, ConfigError>,
    f: impl FnOnce(SigningDomain) -> Result<u8>,
) -> Result<u8> {
    let config = match config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e}");
            return Ok(CONFIG_EXIT_CODE);
        }
    };
    tracing::debug!(
        domain = %config.domain_name,
        version = %config.domain_version,
        chain_id = config.chain_id,
        "resolved signing domain"
    );
    f(config.domain())
}
