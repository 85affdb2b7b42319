//! # Proof of Signature
//!
//! One signer's endorsement of one attestation snapshot: the digest they
//! signed and the raw signature bytes. A proof is never trusted on its own.
//! [`ProofOfSignature::verify_against`] takes the digest freshly derived
//! from the stored attestation and checks both that the proof names the
//! same digest and that the signature verifies for the claimed signer.

use serde::{Deserialize, Serialize};

use daosign_core::{AttestationId, Identity, SigningDomain, TypedDataHash, TypedStruct};
use daosign_crypto::{Ed25519KeyPair, SignatureVerifier};

use crate::error::ProofError;
use crate::message::Attestation;

/// A signer's proof over an attestation digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofOfSignature {
    /// The attestation signed.
    pub attestation_id: AttestationId,
    /// Claimed signer.
    pub signer: Identity,
    /// Digest the signer signed.
    pub typed_data_hash: TypedDataHash,
    /// Raw signature bytes.
    #[serde(with = "daosign_core::serde_hex")]
    pub signature: Vec<u8>,
}

impl ProofOfSignature {
    /// Sign `attestation` under `domain` with `key`.
    pub fn sign(
        attestation: &Attestation,
        domain: &SigningDomain,
        key: &Ed25519KeyPair,
    ) -> Result<Self, ProofError> {
        let digest = attestation.signing_hash(domain)?;
        Ok(Self {
            attestation_id: attestation.attestation_id,
            signer: key.identity(),
            typed_data_hash: digest,
            signature: key.sign(&digest).as_bytes().to_vec(),
        })
    }

    /// Check this proof against the digest of the attestation as stored.
    ///
    /// Fails with [`ProofError::DigestMismatch`] when the proof was made
    /// over anything else, and with [`ProofError::SignatureInvalid`] when the
    /// signature does not verify for `self.signer`.
    pub fn verify_against(
        &self,
        expected: &TypedDataHash,
        verifier: &dyn SignatureVerifier,
    ) -> Result<(), ProofError> {
        if &self.typed_data_hash != expected {
            return Err(ProofError::DigestMismatch {
                attestation_id: self.attestation_id,
                expected: *expected,
                actual: self.typed_data_hash,
            });
        }
        if !verifier.verify(&self.signer, expected, &self.signature) {
            return Err(ProofError::SignatureInvalid {
                attestation_id: self.attestation_id,
                signer: self.signer,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::AttestationResult;
    use daosign_core::{SchemaId, Timestamp};
    use daosign_crypto::Ed25519Verifier;

    fn attestation() -> Attestation {
        Attestation {
            attestation_id: AttestationId(4),
            schema_id: SchemaId(1),
            results: vec![AttestationResult::string("terms", "x")],
            creator: Identity([1; 32]),
            recipient: Identity::ZERO,
            created_at: Timestamp::from_epoch_secs(100).unwrap(),
        }
    }

    fn domain() -> SigningDomain {
        SigningDomain::new("daosign", "0.1.0", 1, Identity::ZERO)
    }

    #[test]
    fn signed_proof_verifies_against_rederived_digest() {
        let key = Ed25519KeyPair::from_seed(&[3; 32]);
        let a = attestation();
        let proof = ProofOfSignature::sign(&a, &domain(), &key).unwrap();
        let rederived = a.signing_hash(&domain()).unwrap();
        assert!(proof.verify_against(&rederived, &Ed25519Verifier).is_ok());
        assert_eq!(proof.signer, key.identity());
    }

    #[test]
    fn stale_digest_is_a_mismatch() {
        let key = Ed25519KeyPair::from_seed(&[3; 32]);
        let proof = ProofOfSignature::sign(&attestation(), &domain(), &key).unwrap();

        let mut mutated = attestation();
        mutated.results[0].value = b"y".to_vec();
        let now = mutated.signing_hash(&domain()).unwrap();
        assert!(matches!(
            proof.verify_against(&now, &Ed25519Verifier),
            Err(ProofError::DigestMismatch { .. })
        ));
    }

    #[test]
    fn other_domain_is_a_mismatch() {
        let key = Ed25519KeyPair::from_seed(&[3; 32]);
        let a = attestation();
        let proof = ProofOfSignature::sign(&a, &domain(), &key).unwrap();
        let other = SigningDomain::new("daosign", "0.1.0", 2, Identity::ZERO);
        assert!(matches!(
            proof.verify_against(&a.signing_hash(&other).unwrap(), &Ed25519Verifier),
            Err(ProofError::DigestMismatch { .. })
        ));
    }

    #[test]
    fn claimed_signer_must_match_key() {
        let key = Ed25519KeyPair::from_seed(&[3; 32]);
        let a = attestation();
        let mut proof = ProofOfSignature::sign(&a, &domain(), &key).unwrap();
        proof.signer = Ed25519KeyPair::from_seed(&[4; 32]).identity();
        let digest = proof.typed_data_hash;
        assert!(matches!(
            proof.verify_against(&digest, &Ed25519Verifier),
            Err(ProofError::SignatureInvalid { .. })
        ));
    }

    #[test]
    fn malformed_signature_is_invalid_not_a_panic() {
        let key = Ed25519KeyPair::from_seed(&[3; 32]);
        let a = attestation();
        let mut proof = ProofOfSignature::sign(&a, &domain(), &key).unwrap();
        proof.signature.truncate(10);
        let digest = proof.typed_data_hash;
        assert!(matches!(
            proof.verify_against(&digest, &Ed25519Verifier),
            Err(ProofError::SignatureInvalid { .. })
        ));
    }

    #[test]
    fn serde_roundtrip() {
        let key = Ed25519KeyPair::from_seed(&[3; 32]);
        let proof = ProofOfSignature::sign(&attestation(), &domain(), &key).unwrap();
        let json = serde_json::to_string(&proof).unwrap();
        let back: ProofOfSignature = serde_json::from_str(&json).unwrap();
        assert_eq!(back, proof);
    }
}
