//! # Keygen Subcommand
//!
//! Writes an Ed25519 seed to `<prefix>.key` and the matching identity to
//! `<prefix>.pub`, both hex-encoded.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;

use daosign_core::Identity;
use daosign_crypto::Ed25519KeyPair;

/// Arguments for `daosign keygen`.
#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Output directory for the keypair files.
    #[arg(long, short, default_value = ".")]
    pub output: PathBuf,
    /// Prefix for the key filenames.
    #[arg(long, default_value = "daosign")]
    pub prefix: String,
}

/// Execute `daosign keygen`.
pub fn run_keygen(args: &KeygenArgs) -> Result<u8> {
    let key = Ed25519KeyPair::generate();
    let (key_path, pub_path) = write_keypair(&key, &args.output, &args.prefix)?;

    println!("OK: generated Ed25519 keypair");
    println!("  Private key: {}", key_path.display());
    println!("  Public key:  {}", pub_path.display());
    println!("  Identity:    {}", key.identity());
    Ok(0)
}

/// Write `key` as `<prefix>.key` and `<prefix>.pub` under `dir`.
pub fn write_keypair(
    key: &Ed25519KeyPair,
    dir: &Path,
    prefix: &str,
) -> Result<(PathBuf, PathBuf)> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory: {}", dir.display()))?;

    let key_path = dir.join(format!("{prefix}.key"));
    let pub_path = dir.join(format!("{prefix}.pub"));
    std::fs::write(&key_path, key.seed_hex())
        .with_context(|| format!("failed to write private key: {}", key_path.display()))?;
    std::fs::write(&pub_path, key.identity().to_hex())
        .with_context(|| format!("failed to write public key: {}", pub_path.display()))?;
    Ok((key_path, pub_path))
}

/// Read a hex seed written by `keygen`.
pub fn read_private_key(path: &Path) -> Result<Ed25519KeyPair> {
    if !path.exists() {
        bail!("private key file not found: {}", path.display());
    }
    let hex = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read private key: {}", path.display()))?;
    Ed25519KeyPair::from_seed_hex(hex.trim())
        .with_context(|| format!("invalid private key: {}", path.display()))
}

/// Read a hex identity written by `keygen`.
pub fn read_identity(path: &Path) -> Result<Identity> {
    if !path.exists() {
        bail!("public key file not found: {}", path.display());
    }
    let hex = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read public key: {}", path.display()))?;
    Identity::from_hex(hex.trim())
        .with_context(|| format!("invalid public key: {}", path.display()))
}
