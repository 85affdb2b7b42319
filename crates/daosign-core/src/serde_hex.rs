//! `#[serde(with = "daosign_core::serde_hex")]` for `Vec<u8>` fields.
//!
//! Raw signatures and attestation result values travel as lowercase hex
//! strings; a `0x` prefix is accepted on input.

use serde::{Deserialize, Deserializer, Serializer};

/// Serialize bytes as a lowercase hex string.
pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode(bytes))
}

/// Deserialize bytes from a hex string, with or without `0x`.
pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    let s = String::deserialize(deserializer)?;
    hex::decode(s.trim().trim_start_matches("0x")).map_err(serde::de::Error::custom)
}
