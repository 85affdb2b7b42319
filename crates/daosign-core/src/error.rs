//! # Error Hierarchy
//!
//! Structured error types for the foundational layer, built with `thiserror`.
//! No `Box<dyn Error>`, no `.unwrap()` outside tests.
//!
//! Errors carry the field path or the offending input so a caller can tell a
//! malformed value from a malformed type description without guesswork.

use thiserror::Error;

/// A typed value could not be encoded against its type description.
///
/// Raised by the typed-data codec. Terminal for the operation: retrying the
/// same input cannot succeed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// The runtime value does not match the declared type tag.
    #[error("type mismatch at {path}: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Dotted field path from the root struct.
        path: String,
        /// The declared type tag.
        expected: String,
        /// The kind of value supplied.
        actual: String,
    },

    /// A struct value has a different number of members than its descriptor.
    #[error("struct {type_name} at {path} expects {expected} fields, got {actual}")]
    FieldCount {
        /// Dotted field path from the root struct.
        path: String,
        /// The struct type name.
        type_name: String,
        /// Number of declared fields.
        expected: usize,
        /// Number of supplied values.
        actual: usize,
    },

    /// A string field carried bytes that are not valid UTF-8.
    #[error("field {path} is declared string but is not valid UTF-8")]
    InvalidUtf8 {
        /// Dotted field path from the root struct.
        path: String,
    },

    /// A raw integer is wider than 256 bits.
    #[error("field {path} does not fit in uint256 ({len} bytes)")]
    IntegerOverflow {
        /// Dotted field path from the root struct.
        path: String,
        /// Length of the supplied big-endian encoding.
        len: usize,
    },

    /// A raw identity did not have exactly 32 bytes.
    #[error("field {path} is declared address but has {len} bytes (expected 32)")]
    InvalidAddress {
        /// Dotted field path from the root struct.
        path: String,
        /// Length of the supplied encoding.
        len: usize,
    },

    /// A raw bool was not a single 0x00 or 0x01 byte.
    #[error("field {path} is declared bool but is not a single 0/1 byte")]
    InvalidBool {
        /// Dotted field path from the root struct.
        path: String,
    },

    /// An array exceeded [`crate::MAX_ARRAY_LEN`].
    #[error("array at {path} has {len} elements (maximum {max})")]
    ArrayTooLong {
        /// Dotted field path from the root struct.
        path: String,
        /// Supplied length.
        len: usize,
        /// Documented maximum.
        max: usize,
    },

    /// A nested struct type is referenced but not defined.
    #[error("undefined struct type {0}")]
    UndefinedType(String),

    /// A struct type refers back to itself, directly or transitively.
    #[error("recursive struct type {0}")]
    RecursiveType(String),

    /// Struct nesting exceeded [`crate::MAX_DEPTH`].
    #[error("struct nesting deeper than {0} levels")]
    TooDeep(usize),

    /// A type tag string is not one of the recognized tags.
    #[error("unrecognized type tag {0:?}")]
    UnknownTypeTag(String),

    /// A timestamp before the unix epoch cannot be encoded as `uint256`.
    #[error("timestamp {0} precedes the unix epoch")]
    PreEpochTimestamp(i64),
}

/// Validation errors for identifier and primitive newtypes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Hex input could not be decoded.
    #[error("invalid hex for {what}: {reason}")]
    InvalidHex {
        /// Which value was being parsed.
        what: &'static str,
        /// Decoder message.
        reason: String,
    },

    /// Decoded input had the wrong byte length.
    #[error("invalid length for {what}: expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// Which value was being parsed.
        what: &'static str,
        /// Required length.
        expected: usize,
        /// Supplied length.
        actual: usize,
    },

    /// Unix timestamp out of the representable range.
    #[error("invalid unix timestamp: {0}")]
    InvalidTimestamp(i64),
}
