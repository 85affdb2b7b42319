//! # daosign-crypto: Signature Primitives
//!
//! Provides the signing building blocks for DAOsign:
//!
//! - **Ed25519** key pairs that sign [`daosign_core::TypedDataHash`] digests
//!   (the only valid signing input).
//! - **[`SignatureVerifier`]**, the trait the protocol verifies through, with
//!   [`Ed25519Verifier`] as the default implementation.
//!
//! A party's [`daosign_core::Identity`] is its 32-byte Ed25519 public key.
//!
//! ## Crate Policy
//!
//! - Depends only on `daosign-core` internally.
//! - No mocking of cryptographic operations in tests. All tests use real
//!   Ed25519 keys.
//! - No `unsafe` code.

pub mod ed25519;
pub mod error;
pub mod verifier;

pub use ed25519::{verify, Ed25519KeyPair, Ed25519Signature, SIGNATURE_LEN};
pub use error::CryptoError;
pub use verifier::{Ed25519Verifier, SignatureVerifier};
