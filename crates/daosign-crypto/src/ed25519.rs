//! # Ed25519 Signing and Verification
//!
//! Key generation, signing, and verification over typed-data digests.
//!
//! ## Security Invariant
//!
//! - Signing input MUST be `&TypedDataHash`. You cannot sign raw bytes, so
//!   every signature in the protocol is over a domain-separated digest.
//! - Private keys are never serialized or logged. `Ed25519KeyPair` does not
//!   implement `Serialize` and its `Debug` output is redacted. The seed is
//!   only reachable through [`Ed25519KeyPair::seed_hex`], which exists for
//!   writing key files.
//! - Verification never panics. Malformed keys or signatures verify `false`.
//!
//! ## Serde
//!
//! Signatures serialize/deserialize as hex-encoded strings. Public keys are
//! [`Identity`] values, which do the same.

use daosign_core::{Identity, TypedDataHash};
use ed25519_dalek::{Signer, Verifier};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{decode_fixed, CryptoError};

/// Length of an Ed25519 signature in bytes.
pub const SIGNATURE_LEN: usize = 64;

/// An Ed25519 signature (64 bytes).
///
/// Serializes as a hex-encoded string.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ed25519Signature(pub [u8; SIGNATURE_LEN]);

/// An Ed25519 key pair for signing operations.
///
/// Does not implement `Serialize`; private keys must not be accidentally
/// serialized into logs or artifacts.
pub struct Ed25519KeyPair {
    signing_key: ed25519_dalek::SigningKey,
}

// ---------------------------------------------------------------------------
// Ed25519Signature impls
// ---------------------------------------------------------------------------

impl Ed25519Signature {
    /// Create a signature from raw 64 bytes.
    pub fn from_bytes(bytes: [u8; SIGNATURE_LEN]) -> Self {
        Self(bytes)
    }

    /// Build from a slice that must be exactly 64 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        <[u8; SIGNATURE_LEN]>::try_from(bytes)
            .map(Self)
            .map_err(|_| CryptoError::InvalidLength {
                what: "signature",
                expected: SIGNATURE_LEN,
                actual: bytes.len(),
            })
    }

    /// Return the raw 64-byte signature.
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LEN] {
        &self.0
    }

    /// Render the signature as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a signature from a 128-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        decode_fixed::<SIGNATURE_LEN>(s, "signature").map(Self)
    }
}

impl Serialize for Ed25519Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Ed25519Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Debug for Ed25519Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ed25519Signature({}...)", &self.to_hex()[..8])
    }
}

impl std::fmt::Display for Ed25519Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// Ed25519KeyPair impls
// ---------------------------------------------------------------------------

impl Ed25519KeyPair {
    /// Generate a new random Ed25519 key pair.
    pub fn generate() -> Self {
        let mut csprng = rand::rngs::OsRng;
        let signing_key = ed25519_dalek::SigningKey::generate(&mut csprng);
        Self { signing_key }
    }

    /// Create a key pair from a raw 32-byte private key seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = ed25519_dalek::SigningKey::from_bytes(seed);
        Self { signing_key }
    }

    /// Create a key pair from a hex-encoded 32-byte seed.
    pub fn from_seed_hex(s: &str) -> Result<Self, CryptoError> {
        decode_fixed::<32>(s, "private key seed").map(|seed| Self::from_seed(&seed))
    }

    /// Hex-encoded seed, for writing key files.
    pub fn seed_hex(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }

    /// The signer's public identity.
    pub fn identity(&self) -> Identity {
        Identity(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign a typed-data digest.
    pub fn sign(&self, digest: &TypedDataHash) -> Ed25519Signature {
        let sig = self.signing_key.sign(digest.as_bytes());
        Ed25519Signature(sig.to_bytes())
    }
}

impl std::fmt::Debug for Ed25519KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ed25519KeyPair(<private>)")
    }
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Verify a signature produced by `signer` over `digest`.
///
/// Returns `false` for a wrong signer, a different digest, a signature of
/// the wrong length, or a public key that is not a valid curve point.
pub fn verify(signer: &Identity, digest: &TypedDataHash, signature: &[u8]) -> bool {
    let Ok(sig) = Ed25519Signature::from_slice(signature) else {
        return false;
    };
    let Ok(vk) = ed25519_dalek::VerifyingKey::from_bytes(signer.as_bytes()) else {
        return false;
    };
    let sig = ed25519_dalek::Signature::from_bytes(&sig.0);
    vk.verify(digest.as_bytes(), &sig).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest(byte: u8) -> TypedDataHash {
        TypedDataHash::from_hex(&hex::encode([byte; 32])).unwrap()
    }

    #[test]
    fn test_sign_and_verify() {
        let kp = Ed25519KeyPair::generate();
        let d = digest(1);
        let sig = kp.sign(&d);
        assert!(verify(&kp.identity(), &d, sig.as_bytes()));
    }

    #[test]
    fn test_verify_wrong_key_fails() {
        let kp1 = Ed25519KeyPair::generate();
        let kp2 = Ed25519KeyPair::generate();
        let d = digest(2);
        let sig = kp1.sign(&d);
        assert!(!verify(&kp2.identity(), &d, sig.as_bytes()));
    }

    #[test]
    fn test_verify_wrong_digest_fails() {
        let kp = Ed25519KeyPair::generate();
        let sig = kp.sign(&digest(3));
        assert!(!verify(&kp.identity(), &digest(4), sig.as_bytes()));
    }

    #[test]
    fn test_verify_malformed_inputs_is_false() {
        let kp = Ed25519KeyPair::from_seed(&[7; 32]);
        let d = digest(5);
        let sig = kp.sign(&d);
        assert!(!verify(&kp.identity(), &d, &sig.as_bytes()[..63]));
        assert!(!verify(&kp.identity(), &d, &[]));
        let mut long = sig.as_bytes().to_vec();
        long.push(0);
        assert!(!verify(&kp.identity(), &d, &long));
    }

    #[test]
    fn test_deterministic_from_seed() {
        let kp1 = Ed25519KeyPair::from_seed(&[42u8; 32]);
        let kp2 = Ed25519KeyPair::from_seed(&[42u8; 32]);
        assert_eq!(kp1.identity(), kp2.identity());
        assert_eq!(kp1.sign(&digest(6)), kp2.sign(&digest(6)));
    }

    #[test]
    fn test_seed_hex_roundtrip() {
        let kp = Ed25519KeyPair::generate();
        let restored = Ed25519KeyPair::from_seed_hex(&kp.seed_hex()).unwrap();
        assert_eq!(kp.identity(), restored.identity());
    }

    #[test]
    fn test_signature_hex_and_serde() {
        let kp = Ed25519KeyPair::generate();
        let sig = kp.sign(&digest(8));
        assert_eq!(sig.to_hex().len(), 128);
        assert_eq!(Ed25519Signature::from_hex(&sig.to_hex()).unwrap(), sig);

        let json = serde_json::to_string(&sig).unwrap();
        assert_eq!(json.len(), 128 + 2);
        let back: Ed25519Signature = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sig);
    }

    #[test]
    fn test_signature_invalid_hex() {
        assert!(Ed25519Signature::from_hex("not-hex").is_err());
        assert!(matches!(
            Ed25519Signature::from_hex("aabb"),
            Err(CryptoError::InvalidLength { actual: 2, .. })
        ));
    }

    #[test]
    fn test_debug_does_not_leak_private_key() {
        let kp = Ed25519KeyPair::generate();
        let debug = format!("{kp:?}");
        assert_eq!(debug, "Ed25519KeyPair(<private>)");
        assert!(!debug.contains(&kp.seed_hex()));
    }
}
