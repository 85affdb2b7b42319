//! # Attestation Record
//!
//! Everything the protocol stores about one attestation: the signed
//! message, its lifecycle, the per-signer proof table and, once reached,
//! the proof of agreement and the creator's revocation proof.
//!
//! The proof table is keyed by signer identity; a separate arrival list
//! remembers the order signers were first stored in. The record itself
//! enforces no policy. Callers validate a whole operation first and then
//! apply it through the mutators here.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use daosign_core::{AttestationId, Identity, Timestamp};
use daosign_schema::SignatoryPolicy;
use daosign_state::{AttestationLifecycle, AttestationState, RevocationRules, StateError};

use crate::agreement::ProofOfAgreement;
use crate::message::Attestation;
use crate::signature::ProofOfSignature;

/// Stored state of one attestation.
#[derive(Debug, Clone, Serialize)]
pub struct AttestationRecord {
    attestation: Attestation,
    lifecycle: AttestationLifecycle,
    proofs: BTreeMap<Identity, ProofOfSignature>,
    arrival: Vec<Identity>,
    agreement: Option<ProofOfAgreement>,
    revocation: Option<ProofOfSignature>,
}

impl AttestationRecord {
    /// A fresh `Pending` record.
    pub fn new(attestation: Attestation) -> Self {
        let lifecycle = AttestationLifecycle::new(attestation.created_at);
        Self {
            attestation,
            lifecycle,
            proofs: BTreeMap::new(),
            arrival: Vec::new(),
            agreement: None,
            revocation: None,
        }
    }

    /// The signed message. Immutable for the life of the record.
    pub fn attestation(&self) -> &Attestation {
        &self.attestation
    }

    /// Id shortcut.
    pub fn id(&self) -> AttestationId {
        self.attestation.attestation_id
    }

    /// Lifecycle with transition log.
    pub fn lifecycle(&self) -> &AttestationLifecycle {
        &self.lifecycle
    }

    /// Current state.
    pub fn state(&self) -> AttestationState {
        self.lifecycle.state
    }

    /// The stored proof from `signer`, if any.
    pub fn proof(&self, signer: &Identity) -> Option<&ProofOfSignature> {
        self.proofs.get(signer)
    }

    /// Identities with a stored proof.
    pub fn collected(&self) -> BTreeSet<Identity> {
        self.proofs.keys().copied().collect()
    }

    /// Stored proofs in arrival order.
    pub fn proofs_by_arrival(&self) -> Vec<ProofOfSignature> {
        self.arrival
            .iter()
            .filter_map(|id| self.proofs.get(id).cloned())
            .collect()
    }

    /// The proof of agreement, once the policy was satisfied.
    pub fn agreement(&self) -> Option<&ProofOfAgreement> {
        self.agreement.as_ref()
    }

    /// The creator's revocation proof, once revoked.
    pub fn revocation(&self) -> Option<&ProofOfSignature> {
        self.revocation.as_ref()
    }

    /// Whether `identity` currently holds this attestation: recipient of
    /// an agreed, unrevoked attestation.
    pub fn is_held_by(&self, identity: &Identity) -> bool {
        self.lifecycle.is_agreed() && &self.attestation.recipient == identity
    }

    /// Store or replace the proof of `proof.signer`. The first arrival
    /// position of a signer is kept across replacements.
    pub fn store_proof(&mut self, proof: ProofOfSignature) {
        if !self.proofs.contains_key(&proof.signer) {
            self.arrival.push(proof.signer);
        }
        self.proofs.insert(proof.signer, proof);
    }

    /// Move to `Agreed` if the stored proofs satisfy `policy`.
    ///
    /// Returns whether the record was finalized by this call. Does nothing
    /// unless the record is `Pending`.
    pub fn try_finalize(
        &mut self,
        policy: &SignatoryPolicy,
        at: Timestamp,
    ) -> Result<bool, StateError> {
        if self.lifecycle.check_agree().is_err() {
            return Ok(false);
        }
        let Some(agreement) =
            ProofOfAgreement::finalize(self.id(), policy, &self.proofs, &self.arrival, at)
        else {
            return Ok(false);
        };
        self.lifecycle.agree(at, "signatory policy satisfied")?;
        self.agreement = Some(agreement);
        Ok(true)
    }

    /// Revoke with the creator's verified revocation proof.
    pub fn revoke(
        &mut self,
        proof: ProofOfSignature,
        rules: RevocationRules,
        at: Timestamp,
    ) -> Result<(), StateError> {
        self.lifecycle.revoke(at, rules, "revoked by creator")?;
        self.revocation = Some(proof);
        Ok(())
    }
}
