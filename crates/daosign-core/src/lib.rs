//! # daosign-core: Foundational Types for DAOsign
//!
//! This crate is the leaf of the DAOsign workspace. It defines the typed-data
//! codec that every signature in the protocol is computed over, together with
//! the identifier newtypes and error hierarchy shared by all other crates.
//!
//! ## Key Design Principles
//!
//! 1. **Closed type-tag enumeration.** [`FieldType`] has one variant per
//!    primitive (`string`, `bytes`, `uint256`, `address`, `bool`) plus nested
//!    struct references and arrays. Every encoding rule is an exhaustive
//!    `match`; there is no open-ended type registry.
//!
//! 2. **`TypedDataHash` newtype.** Every 32-byte digest that a party signs is a
//!    `TypedDataHash`, produced only by [`encode_message`]. A raw `[u8; 32]`
//!    cannot be passed where a signable digest is expected.
//!
//! 3. **Explicit signing domain.** [`SigningDomain`] (name, version, chain id,
//!    verifying contract) is threaded through every call. There is no ambient
//!    "current contract" state.
//!
//! 4. **UTC-only timestamps.** [`Timestamp`] is second-precision UTC and is
//!    hashed as unix seconds.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `daosign-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod digest;
pub mod domain;
pub mod error;
pub mod identity;
pub mod serde_hex;
pub mod temporal;
pub mod typed_data;

// Re-export primary types for ergonomic imports.
pub use digest::{keccak256, TypedDataHash};
pub use domain::SigningDomain;
pub use error::{EncodingError, ValidationError};
pub use identity::{AttestationId, Identity, SchemaId};
pub use temporal::Timestamp;
pub use typed_data::{
    encode_message, hash_struct, type_hash, type_string, FieldType, TypeDescriptor, TypeMember,
    TypeSet, TypedStruct, TypedValue, Uint256, MAX_ARRAY_LEN, MAX_DEPTH, MESSAGE_PREFIX,
};
