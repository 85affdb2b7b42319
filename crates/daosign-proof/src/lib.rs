//! # daosign-proof: Signature and Agreement Proofs
//!
//! The data a party signs and the proofs that come out of signing:
//!
//! - **Messages** (`message`): the `Attestation` and `Revoke` typed
//!   messages with their fixed type strings, plus result validation
//!   against schema field definitions.
//! - **Proof of Signature** (`signature`): one signer's signature over one
//!   attestation digest, checked against a freshly derived digest.
//! - **Proof of Agreement** (`agreement`): the frozen set of signatures that
//!   satisfied the signatory policy. Only obtainable from
//!   [`ProofOfAgreement::finalize`].
//! - **Attestation Record** (`record`): per-attestation proof table,
//!   lifecycle and agreement, as held by persistence.
//!
//! ## Security Invariant
//!
//! A proof's digest is compared against the digest re-derived from the
//! stored attestation every time it is checked. A cached digest is never
//! accepted as evidence of what was signed.

pub mod agreement;
pub mod error;
pub mod message;
pub mod record;
pub mod signature;

pub use agreement::ProofOfAgreement;
pub use error::ProofError;
pub use message::{
    check_results, Attestation, AttestationRequest, AttestationResult, RevokeMessage,
    REVOKE_ACTION,
};
pub use record::AttestationRecord;
pub use signature::ProofOfSignature;
