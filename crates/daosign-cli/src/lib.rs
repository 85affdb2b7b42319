//! # daosign-cli: Command-Line Tool for DAOsign
//!
//! Provides the `daosign` binary.
//!
//! ## Subcommands
//!
//! - `daosign keygen`: Ed25519 keypair as hex files.
//! - `daosign digest`: typed-data digest of a schema, creation request,
//!   attestation or revocation.
//! - `daosign sign` / `daosign verify`: Ed25519 over those digests.
//! - `daosign demo`: scripted agreement against the in-memory service.
//!
//! Documents are read as YAML when the file ends in `.yaml`/`.yml` and as
//! JSON otherwise:
//!
//! ```bash
//! daosign keygen --prefix alice
//! daosign digest attestation attestation.json
//! daosign sign --key alice.key attestation attestation.json
//! daosign verify --pubkey alice.pub --signature <hex> attestation attestation.json
//! ```
//!
//! Handlers return `anyhow::Result<u8>`; the `u8` is the process exit code.
//! Subcommands that hash or sign exit with code 2 when the `DAOSIGN_*`
//! signing-domain variables are malformed.

pub mod commands;
pub mod demo;
pub mod keys;
pub mod message;
pub mod signing;
