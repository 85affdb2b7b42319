//! Errors for key and signature parsing.

use thiserror::Error;

/// Key material or a signature encoding could not be parsed.
///
/// Signature *verification* never returns this error: an invalid signature
/// is a `false` verdict, not a failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Hex input could not be decoded.
    #[error("invalid hex for {what}: {reason}")]
    InvalidHex {
        /// What was being parsed.
        what: &'static str,
        /// Decoder message.
        reason: String,
    },

    /// Decoded bytes had the wrong length.
    #[error("{what} must be {expected} bytes, got {actual}")]
    InvalidLength {
        /// What was being parsed.
        what: &'static str,
        /// Required length.
        expected: usize,
        /// Supplied length.
        actual: usize,
    },
}

pub(crate) fn decode_fixed<const N: usize>(
    hex_str: &str,
    what: &'static str,
) -> Result<[u8; N], CryptoError> {
    let bytes = hex::decode(hex_str.trim().trim_start_matches("0x")).map_err(|e| {
        CryptoError::InvalidHex {
            what,
            reason: e.to_string(),
        }
    })?;
    <[u8; N]>::try_from(bytes.as_slice()).map_err(|_| CryptoError::InvalidLength {
        what,
        expected: N,
        actual: bytes.len(),
    })
}
