//! # Typed-Data Digests
//!
//! Defines `TypedDataHash`, the 32-byte Keccak-256 digest that signers sign,
//! and the `keccak256` primitive the codec is built on.
//!
//! ## Security Invariant
//!
//! `TypedDataHash` has a private constructor reachable only from
//! [`crate::typed_data::encode_message`]. Any API that accepts a signable
//! digest takes `&TypedDataHash`, so a struct hash or an arbitrary byte
//! string cannot be confused with a domain-separated message digest.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};

use crate::error::ValidationError;

/// Compute Keccak-256 over raw bytes.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let hash = Keccak256::digest(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&hash);
    out
}

/// A domain-separated typed-data digest (`keccak256(0x1901 ‖ domain ‖ struct)`).
///
/// Serializes as a lowercase hex string.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypedDataHash([u8; 32]);

impl TypedDataHash {
    pub(crate) fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The raw 32-byte digest.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a digest that was previously rendered with [`Self::to_hex`].
    ///
    /// Used when a signer ships the digest they signed alongside the
    /// signature. The protocol never trusts such a digest; it is only
    /// compared against a freshly re-derived one.
    pub fn from_hex(s: &str) -> Result<Self, ValidationError> {
        let bytes = hex::decode(s.trim().trim_start_matches("0x")).map_err(|e| {
            ValidationError::InvalidHex {
                what: "typed-data hash",
                reason: e.to_string(),
            }
        })?;
        let arr: [u8; 32] =
            bytes
                .as_slice()
                .try_into()
                .map_err(|_| ValidationError::InvalidLength {
                    what: "typed-data hash",
                    expected: 32,
                    actual: bytes.len(),
                })?;
        Ok(Self(arr))
    }
}

impl std::fmt::Debug for TypedDataHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TypedDataHash({})", self.to_hex())
    }
}

impl std::fmt::Display for TypedDataHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl Serialize for TypedDataHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for TypedDataHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keccak_empty_vector() {
        // Keccak-256 of the empty string (pre-NIST padding, not SHA3-256).
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn keccak_domain_typehash_vector() {
        // The well-known EIP-712 domain typehash.
        let h = keccak256(
            b"EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)",
        );
        assert_eq!(
            hex::encode(h),
            "8b73c3c69bb8fe3d512ecc4cf759cc79239f7b179b0ffacaa9a75d522b39400f"
        );
    }

    #[test]
    fn hex_roundtrip_and_prefix() {
        let h = TypedDataHash::new([7u8; 32]);
        let parsed = TypedDataHash::from_hex(&h.to_string()).unwrap();
        assert_eq!(parsed, h);
        assert!(h.to_string().starts_with("0x"));
    }

    #[test]
    fn from_hex_rejects_short_input() {
        let err = TypedDataHash::from_hex("abcd").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidLength { actual: 2, .. }));
    }

    #[test]
    fn serde_is_hex_string() {
        let h = TypedDataHash::new([0xab; 32]);
        let json = serde_json::to_string(&h).unwrap();
        assert_eq!(json.len(), 64 + 2);
        let back: TypedDataHash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, h);
    }
}
