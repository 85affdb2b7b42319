//! # Signature Verifier Seam
//!
//! The protocol checks signatures through [`SignatureVerifier`] so the
//! signature scheme can be swapped without touching proof or lifecycle
//! logic. [`Ed25519Verifier`] is the default.

use daosign_core::{Identity, TypedDataHash};

/// Decides whether `signature` was produced by `signer` over `digest`.
///
/// Implementations must be total: any malformed input is `false`.
pub trait SignatureVerifier: Send + Sync {
    /// Verify one signature.
    fn verify(&self, signer: &Identity, digest: &TypedDataHash, signature: &[u8]) -> bool;

    /// Short scheme name recorded in logs.
    fn scheme(&self) -> &'static str;
}

/// Ed25519 over the raw 32-byte typed-data digest.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Verifier;

impl SignatureVerifier for Ed25519Verifier {
    fn verify(&self, signer: &Identity, digest: &TypedDataHash, signature: &[u8]) -> bool {
        crate::ed25519::verify(signer, digest, signature)
    }

    fn scheme(&self) -> &'static str {
        "ed25519"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Ed25519KeyPair;

    #[test]
    fn ed25519_verifier_delegates() {
        let kp = Ed25519KeyPair::from_seed(&[1; 32]);
        let digest = TypedDataHash::from_hex(&"11".repeat(32)).unwrap();
        let sig = kp.sign(&digest);
        let verifier: &dyn SignatureVerifier = &Ed25519Verifier;
        assert!(verifier.verify(&kp.identity(), &digest, sig.as_bytes()));
        assert!(!verifier.verify(&Identity::ZERO, &digest, sig.as_bytes()));
        assert_eq!(verifier.scheme(), "ed25519");
    }
}
