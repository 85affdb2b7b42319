//! Errors raised while building or checking proofs.

use daosign_core::{AttestationId, EncodingError, Identity, TypedDataHash};
use thiserror::Error;

/// A proof or attestation message failed a structural or cryptographic check.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProofError {
    /// A typed message or result value could not be encoded.
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    /// The attestation carries a different number of results than the
    /// schema declares fields.
    #[error("schema declares {expected} fields but {actual} results were supplied")]
    ResultCount {
        /// Declared field count.
        expected: usize,
        /// Supplied result count.
        actual: usize,
    },

    /// A result does not line up with the field declared at its position.
    #[error("result {index}: expected {expected}, got {actual}")]
    ResultMismatch {
        /// Position in the result list.
        index: usize,
        /// `type name` of the declared field.
        expected: String,
        /// `type name` of the supplied result.
        actual: String,
    },

    /// The digest carried by a proof is not the digest of the attestation
    /// message as it stands.
    #[error("{attestation_id}: proof digest {actual} does not match message digest {expected}")]
    DigestMismatch {
        /// The attestation.
        attestation_id: AttestationId,
        /// Freshly derived digest.
        expected: TypedDataHash,
        /// Digest carried by the proof.
        actual: TypedDataHash,
    },

    /// The signature does not verify for the claimed signer.
    #[error("{attestation_id}: signature does not verify for signer {signer}")]
    SignatureInvalid {
        /// The attestation.
        attestation_id: AttestationId,
        /// Claimed signer.
        signer: Identity,
    },
}
