//! # Proof of Agreement
//!
//! The frozen aggregate of the signatures that satisfied a signatory
//! policy. It has no public constructor: [`ProofOfAgreement::finalize`]
//! returns one only when the policy is satisfied by the supplied proofs.
//!
//! ## Ordering
//!
//! In `Ordered` mode the signatures follow policy positions. Otherwise they
//! follow arrival order. Under a threshold only the first `required`
//! counting signatures are included.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use daosign_core::{AttestationId, Identity, Timestamp};
use daosign_schema::{PolicyMode, SignatoryPolicy};

use crate::signature::ProofOfSignature;

/// Aggregated, policy-satisfying signatures over one attestation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProofOfAgreement {
    attestation_id: AttestationId,
    signatures: Vec<ProofOfSignature>,
    finalized_at: Timestamp,
}

impl ProofOfAgreement {
    /// Aggregate `proofs` if they satisfy `policy`.
    ///
    /// `arrival` lists signers in the order their proofs were first stored.
    pub fn finalize(
        attestation_id: AttestationId,
        policy: &SignatoryPolicy,
        proofs: &BTreeMap<Identity, ProofOfSignature>,
        arrival: &[Identity],
        finalized_at: Timestamp,
    ) -> Option<Self> {
        let collected: BTreeSet<Identity> = proofs.keys().copied().collect();
        if !policy.is_satisfied(&collected) {
            return None;
        }

        let counting = policy.counting_signers(&collected);
        let order: Vec<Identity> = match policy.mode {
            PolicyMode::Ordered => counting,
            PolicyMode::All | PolicyMode::Threshold { .. } => {
                let counting: BTreeSet<Identity> = counting.into_iter().collect();
                arrival
                    .iter()
                    .filter(|id| counting.contains(id))
                    .copied()
                    .take(policy.required_count())
                    .collect()
            }
        };

        let signatures = order
            .iter()
            .filter_map(|id| proofs.get(id).cloned())
            .collect();
        Some(Self {
            attestation_id,
            signatures,
            finalized_at,
        })
    }

    /// The attestation agreed on.
    pub fn attestation_id(&self) -> AttestationId {
        self.attestation_id
    }

    /// The satisfying signatures, in agreement order.
    pub fn signatures(&self) -> &[ProofOfSignature] {
        &self.signatures
    }

    /// Signers in agreement order.
    pub fn signers(&self) -> Vec<Identity> {
        self.signatures.iter().map(|p| p.signer).collect()
    }

    /// When the policy became satisfied.
    pub fn finalized_at(&self) -> Timestamp {
        self.finalized_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daosign_core::TypedDataHash;

    fn id(b: u8) -> Identity {
        Identity([b; 32])
    }

    fn proof(signer: Identity) -> ProofOfSignature {
        ProofOfSignature {
            attestation_id: AttestationId(1),
            signer,
            typed_data_hash: TypedDataHash::from_hex(&"11".repeat(32)).unwrap(),
            signature: vec![signer.0[0]; 64],
        }
    }

    fn table(signers: &[u8]) -> (BTreeMap<Identity, ProofOfSignature>, Vec<Identity>) {
        let arrival: Vec<Identity> = signers.iter().map(|b| id(*b)).collect();
        let proofs = arrival.iter().map(|i| (*i, proof(*i))).collect();
        (proofs, arrival)
    }

    fn at() -> Timestamp {
        Timestamp::from_epoch_secs(500).unwrap()
    }

    #[test]
    fn unsatisfied_policy_yields_nothing() {
        let policy = SignatoryPolicy::all([id(1), id(2)]);
        let (proofs, arrival) = table(&[1]);
        assert!(ProofOfAgreement::finalize(AttestationId(1), &policy, &proofs, &arrival, at())
            .is_none());
    }

    #[test]
    fn threshold_keeps_arrival_order_and_required_count() {
        let policy = SignatoryPolicy::threshold(2, [id(1), id(2), id(3)]);
        let (proofs, arrival) = table(&[3, 1, 2]);
        let poa =
            ProofOfAgreement::finalize(AttestationId(1), &policy, &proofs, &arrival, at()).unwrap();
        assert_eq!(poa.signers(), vec![id(3), id(1)]);
        assert_eq!(poa.finalized_at(), at());
        assert_eq!(poa.attestation_id(), AttestationId(1));
    }

    #[test]
    fn ordered_follows_positions_not_arrival() {
        let policy = SignatoryPolicy::ordered([id(1), id(2), id(3)]);
        let (proofs, arrival) = table(&[3, 2, 1]);
        let poa =
            ProofOfAgreement::finalize(AttestationId(1), &policy, &proofs, &arrival, at()).unwrap();
        assert_eq!(poa.signers(), vec![id(1), id(2), id(3)]);
    }

    #[test]
    fn unlisted_signers_are_excluded() {
        let policy = SignatoryPolicy::all([id(1)]);
        let (proofs, arrival) = table(&[9, 1]);
        let poa =
            ProofOfAgreement::finalize(AttestationId(1), &policy, &proofs, &arrival, at()).unwrap();
        assert_eq!(poa.signers(), vec![id(1)]);
        assert_eq!(poa.signatures()[0], proof(id(1)));
    }
}
