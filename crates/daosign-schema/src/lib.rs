//! # daosign-schema: Schemas, Signatory Policies & Registry
//!
//! ## Schema Model (`schema`)
//!
//! A [`Schema`] is metadata, a [`SignatoryPolicy`] and an ordered list of
//! primitive [`FieldDefinition`]s. Its typed-data digest is what a
//! registrant signs and what the registry stores as the schema hash.
//!
//! ## Authority Evaluation (`policy`)
//!
//! [`SignatoryPolicy::is_satisfied`] decides whether a set of signer
//! identities satisfies a policy in `All`, `Threshold` or `Ordered` mode.
//! Prerequisites restrict which signers are accepted at all.
//!
//! ## Registry (`registry`)
//!
//! [`SchemaRegistry`] validates schemas, computes their hashes and assigns
//! monotonically increasing ids.
//!
//! ## Crate Policy
//!
//! - Depends only on `daosign-core` internally.
//! - Registration is a trust boundary: invalid schemas are rejected with
//!   every violation listed, each with its path.

pub mod error;
pub mod policy;
pub mod registry;
pub mod schema;

pub use error::{SchemaError, Violation, Violations};
pub use policy::{
    is_satisfied, PolicyMode, Prerequisite, PrerequisiteOperator, Signatory, SignatoryPolicy,
};
pub use registry::{RegisteredSchema, SchemaRegistry};
pub use schema::{FieldDefinition, NftCollection, Schema, SchemaMetadata};
