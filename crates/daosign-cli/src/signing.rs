//! # Sign and Verify Subcommands
//!
//! Ed25519 signatures over the typed-data digest of a schema, attestation
//! or revocation document. What is signed is always the digest derived
//! under the configured domain, never the raw document bytes.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use daosign_core::SigningDomain;
use daosign_crypto::Ed25519Signature;

use crate::keys::{read_identity, read_private_key};
use crate::message::{message_digest, MessageKind};

/// Arguments for `daosign sign`.
#[derive(Args, Debug)]
pub struct SignArgs {
    /// Path to the private key file (hex-encoded 32-byte seed).
    #[arg(long)]
    pub key: PathBuf,
    /// Message type of the document.
    #[arg(value_enum)]
    pub kind: MessageKind,
    /// Path to the YAML or JSON document.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

/// Arguments for `daosign verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Path to the public key file (hex-encoded identity).
    #[arg(long)]
    pub pubkey: PathBuf,
    /// The signature to verify (hex-encoded 64 bytes).
    #[arg(long)]
    pub signature: String,
    /// Message type of the document.
    #[arg(value_enum)]
    pub kind: MessageKind,
    /// Path to the YAML or JSON document.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

/// Execute `daosign sign`; prints the signature as hex.
pub fn run_sign(args: &SignArgs, domain: &SigningDomain) -> Result<u8> {
    let signature = sign_document(args, domain)?;
    println!("{}", signature.to_hex());
    Ok(0)
}

/// Sign the digest of the document named by `args`.
pub fn sign_document(args: &SignArgs, domain: &SigningDomain) -> Result<Ed25519Signature> {
    let key = read_private_key(&args.key)?;
    let digest = message_digest(args.kind, &args.file, domain)?;
    tracing::info!(signer = %key.identity(), digest = %digest, "signed");
    Ok(key.sign(&digest))
}

/// Execute `daosign verify`. Exit code 0 when valid, 1 when not.
pub fn run_verify(args: &VerifyArgs, domain: &SigningDomain) -> Result<u8> {
    let signer = read_identity(&args.pubkey)?;
    let signature =
        Ed25519Signature::from_hex(args.signature.trim()).context("invalid signature")?;
    let digest = message_digest(args.kind, &args.file, domain)?;

    if daosign_crypto::verify(&signer, &digest, signature.as_bytes()) {
        println!("OK: signature is valid");
        Ok(0)
    } else {
        println!("FAIL: signature does not verify for {signer} over {digest}");
        Ok(1)
    }
}
