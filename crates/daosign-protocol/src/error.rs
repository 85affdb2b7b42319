//! # Protocol Errors
//!
//! Every rejection names its kind and the schema or attestation involved,
//! so a caller can tell "not your turn to sign" from "signature invalid"
//! without parsing messages. All errors are terminal for the operation that
//! raised it; nothing is retried internally and nothing is left half
//! applied.

use daosign_core::{AttestationId, EncodingError, Identity, SchemaId, Timestamp, TypedDataHash};
use daosign_proof::ProofError;
use daosign_schema::SchemaError;
use daosign_state::StateError;
use thiserror::Error;

/// Error raised by any protocol operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// A typed message or value could not be encoded.
    #[error("encoding failed for {subject}: {source}")]
    Encoding {
        /// `schema:N`, `attestation:N` or the schema name.
        subject: String,
        /// Codec error with its field path.
        #[source]
        source: EncodingError,
    },

    /// Attestation results do not line up with the schema's fields.
    #[error("results do not match {schema_id} fields: {reason}")]
    ResultMismatch {
        /// The schema.
        schema_id: SchemaId,
        /// What differs.
        reason: String,
    },

    /// The schema or its signatory policy is malformed.
    #[error(transparent)]
    InvalidSchema(SchemaError),

    /// No schema under this id.
    #[error("{0} not found")]
    SchemaNotFound(SchemaId),

    /// No attestation under this id (queries).
    #[error("{0} not found")]
    AttestationNotFound(AttestationId),

    /// No attestation under this id (signature or revocation submission).
    #[error("unknown {0}")]
    UnknownAttestation(AttestationId),

    /// The proof was not made over the current attestation message.
    #[error("{attestation_id}: proof digest {actual} does not match message digest {expected}")]
    SchemaMismatch {
        /// The attestation.
        attestation_id: AttestationId,
        /// Digest derived from the stored attestation.
        expected: TypedDataHash,
        /// Digest carried by the proof.
        actual: TypedDataHash,
    },

    /// The signature does not verify for the claimed signer.
    #[error("{attestation_id}: invalid signature from {signer}")]
    SignatureInvalid {
        /// The attestation.
        attestation_id: AttestationId,
        /// Claimed signer.
        signer: Identity,
    },

    /// The signer may not sign this attestation.
    #[error("{attestation_id}: {signer} is not an authorized signer: {reason}")]
    NotAuthorizedSigner {
        /// The attestation.
        attestation_id: AttestationId,
        /// Rejected signer.
        signer: Identity,
        /// Not listed, or a prerequisite is unmet.
        reason: String,
    },

    /// The caller is not the identity the operation requires.
    #[error("{subject}: {identity} is not authorized: {reason}")]
    NotAuthorized {
        /// `schema:N`, `attestation:N` or the schema name.
        subject: String,
        /// The identity that was required or presented.
        identity: Identity,
        /// What was required.
        reason: String,
    },

    /// The attestation is already agreed and the signer is not part of it.
    #[error("{attestation_id} is already finalized; signature from {signer} rejected")]
    AlreadyFinalized {
        /// The attestation.
        attestation_id: AttestationId,
        /// Late signer.
        signer: Identity,
    },

    /// The attestation's state does not permit the operation.
    #[error("{attestation_id}: {source}")]
    WrongState {
        /// The attestation.
        attestation_id: AttestationId,
        /// Lifecycle error.
        #[source]
        source: StateError,
    },

    /// The schema expired.
    #[error("{schema_id} expired at {expired_at}")]
    SchemaExpired {
        /// The schema.
        schema_id: SchemaId,
        /// Expiry instant.
        expired_at: Timestamp,
    },
}

/// Coarse error kind, stable across message changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed typed value or results.
    Encoding,
    /// Malformed schema or policy.
    InvalidSchema,
    /// Unknown schema or attestation in a query.
    NotFound,
    /// Unknown attestation in a submission.
    UnknownAttestation,
    /// Stale or wrong digest.
    SchemaMismatch,
    /// Cryptographically invalid signature.
    SignatureInvalid,
    /// Signer not permitted.
    NotAuthorizedSigner,
    /// Caller not permitted.
    NotAuthorized,
    /// Agreement already reached.
    AlreadyFinalized,
    /// Illegal state transition.
    WrongState,
    /// Schema past its lifetime.
    SchemaExpired,
}

impl ErrorKind {
    /// Machine-readable code (`"WRONG_STATE"`).
    pub fn code(&self) -> &'static str {
        match self {
            Self::Encoding => "ENCODING_ERROR",
            Self::InvalidSchema => "INVALID_SCHEMA",
            Self::NotFound => "NOT_FOUND",
            Self::UnknownAttestation => "UNKNOWN_ATTESTATION",
            Self::SchemaMismatch => "SCHEMA_MISMATCH",
            Self::SignatureInvalid => "SIGNATURE_INVALID",
            Self::NotAuthorizedSigner => "NOT_AUTHORIZED_SIGNER",
            Self::NotAuthorized => "NOT_AUTHORIZED",
            Self::AlreadyFinalized => "ALREADY_FINALIZED",
            Self::WrongState => "WRONG_STATE",
            Self::SchemaExpired => "SCHEMA_EXPIRED",
        }
    }
}

impl ProtocolError {
    /// The kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Encoding { .. } | Self::ResultMismatch { .. } => ErrorKind::Encoding,
            Self::InvalidSchema(_) => ErrorKind::InvalidSchema,
            Self::SchemaNotFound(_) | Self::AttestationNotFound(_) => ErrorKind::NotFound,
            Self::UnknownAttestation(_) => ErrorKind::UnknownAttestation,
            Self::SchemaMismatch { .. } => ErrorKind::SchemaMismatch,
            Self::SignatureInvalid { .. } => ErrorKind::SignatureInvalid,
            Self::NotAuthorizedSigner { .. } => ErrorKind::NotAuthorizedSigner,
            Self::NotAuthorized { .. } => ErrorKind::NotAuthorized,
            Self::AlreadyFinalized { .. } => ErrorKind::AlreadyFinalized,
            Self::WrongState { .. } => ErrorKind::WrongState,
            Self::SchemaExpired { .. } => ErrorKind::SchemaExpired,
        }
    }

    pub(crate) fn encoding(subject: impl std::fmt::Display, source: EncodingError) -> Self {
        Self::Encoding {
            subject: subject.to_string(),
            source,
        }
    }

    pub(crate) fn from_proof(schema_id: SchemaId, err: ProofError) -> Self {
        match err {
            ProofError::Encoding(source) => Self::encoding(schema_id, source),
            ProofError::ResultCount { .. } | ProofError::ResultMismatch { .. } => {
                Self::ResultMismatch {
                    schema_id,
                    reason: err.to_string(),
                }
            }
            ProofError::DigestMismatch {
                attestation_id,
                expected,
                actual,
            } => Self::SchemaMismatch {
                attestation_id,
                expected,
                actual,
            },
            ProofError::SignatureInvalid {
                attestation_id,
                signer,
            } => Self::SignatureInvalid {
                attestation_id,
                signer,
            },
        }
    }
}

impl From<SchemaError> for ProtocolError {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::NotFound(id) => Self::SchemaNotFound(id),
            SchemaError::Encoding(source) => Self::Encoding {
                subject: "schema".to_string(),
                source,
            },
            invalid @ SchemaError::Invalid { .. } => Self::InvalidSchema(invalid),
        }
    }
}
