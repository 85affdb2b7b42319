//! # Digest Subcommand
//!
//! Loads a schema, creation request or attestation document and derives
//! the typed-data digest a signer signs under the configured domain. A
//! revocation digest is derived from the attestation document it revokes.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use serde::de::DeserializeOwned;

use daosign_core::{SigningDomain, TypedDataHash, TypedStruct};
use daosign_proof::{Attestation, AttestationRequest, RevokeMessage};
use daosign_schema::Schema;

/// Which typed message a document stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MessageKind {
    /// A schema document, hashed as `Schema`.
    Schema,
    /// A creation request, hashed as `CreateAttestation`.
    Create,
    /// An attestation document, hashed as `Attestation`.
    Attestation,
    /// An attestation document, hashed as its `Revoke` message.
    Revoke,
}

/// Arguments for `daosign digest`.
#[derive(Args, Debug)]
pub struct DigestArgs {
    /// Message type of the document.
    #[arg(value_enum)]
    pub kind: MessageKind,
    /// Path to the YAML or JSON document.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

/// Execute `daosign digest`.
pub fn run_digest(args: &DigestArgs, domain: &SigningDomain) -> Result<u8> {
    let digest = message_digest(args.kind, &args.file, domain)?;
    println!("{digest}");
    Ok(0)
}

/// Read a document, as YAML for `.yaml`/`.yml` files and JSON otherwise.
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        bail!("document file not found: {}", path.display());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read document: {}", path.display()))?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml" | "yml") => serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse YAML: {}", path.display())),
        _ => serde_json::from_str(&content)
            .with_context(|| format!("failed to parse JSON: {}", path.display())),
    }
}

/// Digest of the `kind` message stored at `path`.
///
/// Schemas are validated first so that a digest is never printed for a
/// schema the registry would refuse.
pub fn message_digest(
    kind: MessageKind,
    path: &Path,
    domain: &SigningDomain,
) -> Result<TypedDataHash> {
    let digest = match kind {
        MessageKind::Schema => {
            let schema: Schema = read_document(path)?;
            schema
                .validate()
                .with_context(|| format!("invalid schema: {}", path.display()))?;
            schema.signing_hash(domain)
        }
        MessageKind::Create => {
            let request: AttestationRequest = read_document(path)?;
            request.signing_hash(domain)
        }
        MessageKind::Attestation => {
            let attestation: Attestation = read_document(path)?;
            attestation.signing_hash(domain)
        }
        MessageKind::Revoke => {
            let attestation: Attestation = read_document(path)?;
            RevokeMessage::for_attestation(&attestation).signing_hash(domain)
        }
    };
    let digest = digest.with_context(|| format!("failed to encode {}", path.display()))?;
    tracing::debug!(?kind, digest = %digest, file = %path.display(), "derived digest");
    Ok(digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::{demo_attestation, demo_request, demo_schema};
    use daosign_core::Identity;
    use daosign_crypto::Ed25519KeyPair;

    fn domain() -> SigningDomain {
        SigningDomain::new("daosign", "0.1.0", 1, Identity::ZERO)
    }

    #[test]
    fn json_and_yaml_documents_hash_alike() {
        let dir = tempfile::tempdir().unwrap();
        let signer = Ed25519KeyPair::from_seed(&[3; 32]);
        let attestation = demo_attestation(signer.identity());

        let json = dir.path().join("a.json");
        let yaml = dir.path().join("a.yaml");
        std::fs::write(&json, serde_json::to_string_pretty(&attestation).unwrap()).unwrap();
        std::fs::write(&yaml, serde_yaml::to_string(&attestation).unwrap()).unwrap();

        let expected = attestation.signing_hash(&domain()).unwrap();
        for path in [&json, &yaml] {
            assert_eq!(
                message_digest(MessageKind::Attestation, path, &domain()).unwrap(),
                expected
            );
        }
        assert_ne!(
            message_digest(MessageKind::Revoke, &json, &domain()).unwrap(),
            expected
        );
    }

    #[test]
    fn creation_request_digest() {
        let dir = tempfile::tempdir().unwrap();
        let creator = Ed25519KeyPair::from_seed(&[5; 32]).identity();
        let request = demo_request(creator);
        let path = dir.path().join("request.json");
        std::fs::write(&path, serde_json::to_string(&request).unwrap()).unwrap();

        let digest = message_digest(MessageKind::Create, &path, &domain()).unwrap();
        assert_eq!(digest, request.signing_hash(&domain()).unwrap());
        assert_ne!(
            digest,
            request
                .into_attestation(daosign_core::AttestationId(1))
                .signing_hash(&domain())
                .unwrap()
        );
    }

    #[test]
    fn schema_digest_requires_a_valid_schema() {
        let dir = tempfile::tempdir().unwrap();
        let creator = Ed25519KeyPair::from_seed(&[1; 32]).identity();
        let signers = [Ed25519KeyPair::from_seed(&[2; 32]).identity()];

        let path = dir.path().join("schema.yaml");
        let schema = demo_schema(creator, &signers, 1);
        std::fs::write(&path, serde_yaml::to_string(&schema).unwrap()).unwrap();
        assert_eq!(
            message_digest(MessageKind::Schema, &path, &domain()).unwrap(),
            schema.signing_hash(&domain()).unwrap()
        );

        let broken = demo_schema(creator, &signers, 5);
        std::fs::write(&path, serde_yaml::to_string(&broken).unwrap()).unwrap();
        assert!(message_digest(MessageKind::Schema, &path, &domain()).is_err());
    }

    #[test]
    fn unreadable_documents() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(message_digest(MessageKind::Attestation, &missing, &domain()).is_err());

        let garbage = dir.path().join("garbage.json");
        std::fs::write(&garbage, "{ not json").unwrap();
        let err = message_digest(MessageKind::Attestation, &garbage, &domain()).unwrap_err();
        assert!(err.to_string().contains("failed to parse JSON"));
    }
}
