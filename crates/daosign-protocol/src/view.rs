//! Read-only projection of an attestation returned by every operation.

use serde::Serialize;

use daosign_core::{AttestationId, Identity, SchemaId, Timestamp, TypedDataHash};
use daosign_proof::{Attestation, AttestationRecord, ProofOfAgreement, ProofOfSignature};
use daosign_state::{AttestationState, TransitionRecord};

/// Snapshot of one attestation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttestationView {
    /// The signed message.
    pub attestation: Attestation,
    /// Digest every signer signs, derived at snapshot time.
    pub digest: TypedDataHash,
    /// Current lifecycle state.
    pub state: AttestationState,
    /// Stored proofs in arrival order.
    pub signatures: Vec<ProofOfSignature>,
    /// The proof of agreement, once agreed.
    pub agreement: Option<ProofOfAgreement>,
    /// When the policy was satisfied.
    pub agreed_at: Option<Timestamp>,
    /// When the attestation was revoked.
    pub revoked_at: Option<Timestamp>,
    /// Whether the schema had expired at snapshot time.
    pub expired: bool,
    /// Transition log.
    pub transitions: Vec<TransitionRecord>,
}

impl AttestationView {
    pub(crate) fn new(record: &AttestationRecord, digest: TypedDataHash, expired: bool) -> Self {
        let lifecycle = record.lifecycle();
        Self {
            attestation: record.attestation().clone(),
            digest,
            state: lifecycle.state,
            signatures: record.proofs_by_arrival(),
            agreement: record.agreement().cloned(),
            agreed_at: lifecycle.agreed_at,
            revoked_at: lifecycle.revoked_at,
            expired,
            transitions: lifecycle.transitions.clone(),
        }
    }

    /// Attestation id.
    pub fn id(&self) -> AttestationId {
        self.attestation.attestation_id
    }

    /// Schema id.
    pub fn schema_id(&self) -> SchemaId {
        self.attestation.schema_id
    }

    /// Identities with a stored proof, in arrival order.
    pub fn signers(&self) -> Vec<Identity> {
        self.signatures.iter().map(|p| p.signer).collect()
    }
}
