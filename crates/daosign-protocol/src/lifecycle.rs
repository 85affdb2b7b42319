//! # Proof Lifecycle
//!
//! Applies one signature or one revocation to one attestation record. The
//! caller holds the record's exclusive lock and supplies everything that
//! lives outside the record: the schema, the current time and whether the
//! signer meets the policy prerequisites.
//!
//! ## All-or-nothing
//!
//! Every check runs before the first mutation, so a rejected operation
//! leaves the record exactly as it was.
//!
//! ## Check order for a signature
//!
//! 1. The proof names this attestation and its digest equals the digest
//!    re-derived from the stored message (`SchemaMismatch`).
//! 2. The signature verifies for the claimed signer (`SignatureInvalid`).
//! 3. The signer is listed and meets every prerequisite
//!    (`NotAuthorizedSigner`).
//! 4. The schema has not expired (`SchemaExpired`).
//! 5. State: revoked attestations reject everything (`WrongState`); a
//!    byte-identical resubmission is accepted without change; any other
//!    submission to an agreed attestation is `AlreadyFinalized`.

use daosign_core::{SigningDomain, Timestamp, TypedDataHash, TypedStruct};
use daosign_crypto::SignatureVerifier;
use daosign_proof::{
    Attestation, AttestationRecord, AttestationRequest, ProofOfSignature, RevokeMessage,
};
use daosign_schema::Schema;
use daosign_state::{AttestationState, RevocationRules, StateError};

use crate::error::ProtocolError;

/// What a successful signature submission did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureOutcome {
    /// First proof from this signer; policy not yet satisfied.
    Stored,
    /// Replaced this signer's earlier proof; policy not yet satisfied.
    Replaced,
    /// The proof satisfied the policy and the attestation is now agreed.
    Finalized,
    /// Identical to the stored proof; nothing changed.
    Unchanged,
}

/// Context of one signature submission gathered outside the record lock.
#[derive(Debug, Clone, Copy)]
pub struct SubmissionContext {
    /// Current time.
    pub now: Timestamp,
    /// Whether the signer meets every policy prerequisite.
    pub prerequisites_met: bool,
}

/// Signature and revocation rules bound to a signing domain and verifier.
pub struct ProofLifecycle<'a> {
    domain: &'a SigningDomain,
    verifier: &'a dyn SignatureVerifier,
}

impl<'a> ProofLifecycle<'a> {
    /// Lifecycle under `domain`, verifying with `verifier`.
    pub fn new(domain: &'a SigningDomain, verifier: &'a dyn SignatureVerifier) -> Self {
        Self { domain, verifier }
    }

    /// Digest of the attestation message, derived afresh.
    pub fn attestation_digest(
        &self,
        attestation: &Attestation,
    ) -> Result<TypedDataHash, ProtocolError> {
        attestation
            .signing_hash(self.domain)
            .map_err(|e| ProtocolError::encoding(attestation.attestation_id, e))
    }

    /// Digest of the creation request a creator signs.
    pub fn creation_digest(
        &self,
        request: &AttestationRequest,
    ) -> Result<TypedDataHash, ProtocolError> {
        request
            .signing_hash(self.domain)
            .map_err(|e| ProtocolError::encoding(request.schema_id, e))
    }

    /// Digest of the revoke message for `attestation`.
    pub fn revoke_digest(&self, attestation: &Attestation) -> Result<TypedDataHash, ProtocolError> {
        RevokeMessage::for_attestation(attestation)
            .signing_hash(self.domain)
            .map_err(|e| ProtocolError::encoding(attestation.attestation_id, e))
    }

    /// Add one signer's proof to `record`.
    pub fn add_signature(
        &self,
        record: &mut AttestationRecord,
        schema: &Schema,
        proof: ProofOfSignature,
        ctx: SubmissionContext,
    ) -> Result<SignatureOutcome, ProtocolError> {
        let attestation_id = record.id();
        let expected = self.attestation_digest(record.attestation())?;

        if proof.attestation_id != attestation_id {
            return Err(ProtocolError::SchemaMismatch {
                attestation_id,
                expected,
                actual: proof.typed_data_hash,
            });
        }
        proof
            .verify_against(&expected, self.verifier)
            .map_err(|e| ProtocolError::from_proof(record.attestation().schema_id, e))?;

        if !schema.policy.is_listed(&proof.signer) {
            return Err(ProtocolError::NotAuthorizedSigner {
                attestation_id,
                signer: proof.signer,
                reason: "not listed in the signatory policy".to_string(),
            });
        }
        if !ctx.prerequisites_met {
            return Err(ProtocolError::NotAuthorizedSigner {
                attestation_id,
                signer: proof.signer,
                reason: "signer prerequisites are not met".to_string(),
            });
        }

        if let Some(expired_at) = schema.expires_at().filter(|at| ctx.now >= *at) {
            return Err(ProtocolError::SchemaExpired {
                schema_id: record.attestation().schema_id,
                expired_at,
            });
        }

        let state = record.state();
        if state == AttestationState::Revoked {
            return Err(ProtocolError::WrongState {
                attestation_id,
                source: StateError::TerminalState { state },
            });
        }
        let previous = record.proof(&proof.signer);
        if previous == Some(&proof) {
            return Ok(SignatureOutcome::Unchanged);
        }
        if state == AttestationState::Agreed {
            return Err(ProtocolError::AlreadyFinalized {
                attestation_id,
                signer: proof.signer,
            });
        }

        let replaced = previous.is_some();
        record.store_proof(proof);
        let finalized = record
            .try_finalize(&schema.policy, ctx.now)
            .map_err(|source| ProtocolError::WrongState {
                attestation_id,
                source,
            })?;

        Ok(if finalized {
            SignatureOutcome::Finalized
        } else if replaced {
            SignatureOutcome::Replaced
        } else {
            SignatureOutcome::Stored
        })
    }

    /// Revoke `record` with the creator's signature over the revoke digest.
    pub fn revoke(
        &self,
        record: &mut AttestationRecord,
        schema: &Schema,
        signature: &[u8],
        now: Timestamp,
    ) -> Result<(), ProtocolError> {
        let attestation_id = record.id();
        let creator = record.attestation().creator;
        let digest = self.revoke_digest(record.attestation())?;

        if !self.verifier.verify(&creator, &digest, signature) {
            return Err(ProtocolError::NotAuthorized {
                subject: attestation_id.to_string(),
                identity: creator,
                reason: "revocation must be signed by the attestation creator".to_string(),
            });
        }

        let rules = RevocationRules {
            revocable: schema.metadata.revocable,
            before_agreement: schema.metadata.revocable_before_agreement,
        };
        let proof = ProofOfSignature {
            attestation_id,
            signer: creator,
            typed_data_hash: digest,
            signature: signature.to_vec(),
        };
        record
            .revoke(proof, rules, now)
            .map_err(|source| ProtocolError::WrongState {
                attestation_id,
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daosign_core::{AttestationId, FieldType, Identity, SchemaId};
    use daosign_crypto::{Ed25519KeyPair, Ed25519Verifier};
    use daosign_proof::AttestationResult;
    use daosign_schema::{FieldDefinition, SchemaMetadata, SignatoryPolicy};

    struct Fixture {
        domain: SigningDomain,
        creator: Ed25519KeyPair,
        signers: Vec<Ed25519KeyPair>,
        schema: Schema,
        record: AttestationRecord,
    }

    fn ts(secs: i64) -> Timestamp {
        Timestamp::from_epoch_secs(secs).unwrap()
    }

    fn fixture(policy: impl FnOnce(Vec<Identity>) -> SignatoryPolicy) -> Fixture {
        let creator = Ed25519KeyPair::from_seed(&[1; 32]);
        let signers: Vec<_> = (10u8..13).map(|b| Ed25519KeyPair::from_seed(&[b; 32])).collect();
        let schema = Schema {
            metadata: SchemaMetadata {
                name: "nda".into(),
                description: String::new(),
                attestation_type: "agreement".into(),
                creator: creator.identity(),
                created_at: ts(0),
                expire_in: 0,
                is_public: true,
                revocable: true,
                revocable_before_agreement: false,
                nft: None,
            },
            policy: policy(signers.iter().map(Ed25519KeyPair::identity).collect()),
            fields: vec![FieldDefinition::new("terms", FieldType::String)],
        };
        let record = AttestationRecord::new(Attestation {
            attestation_id: AttestationId(1),
            schema_id: SchemaId(1),
            results: vec![AttestationResult::string("terms", "keep quiet")],
            creator: creator.identity(),
            recipient: Identity::ZERO,
            created_at: ts(100),
        });
        Fixture {
            domain: SigningDomain::new("daosign", "0.1.0", 1, Identity::ZERO),
            creator,
            signers,
            schema,
            record,
        }
    }

    fn ctx() -> SubmissionContext {
        SubmissionContext {
            now: ts(200),
            prerequisites_met: true,
        }
    }

    impl Fixture {
        fn proof(&self, i: usize) -> ProofOfSignature {
            ProofOfSignature::sign(self.record.attestation(), &self.domain, &self.signers[i])
                .unwrap()
        }

        fn add(&mut self, proof: ProofOfSignature) -> Result<SignatureOutcome, ProtocolError> {
            let lc = ProofLifecycle::new(&self.domain, &Ed25519Verifier);
            lc.add_signature(&mut self.record, &self.schema, proof, ctx())
        }

        fn revoke_sig(&self, key: &Ed25519KeyPair) -> Vec<u8> {
            let lc = ProofLifecycle::new(&self.domain, &Ed25519Verifier);
            let digest = lc.revoke_digest(self.record.attestation()).unwrap();
            key.sign(&digest).as_bytes().to_vec()
        }

        fn revoke(&mut self, sig: &[u8]) -> Result<(), ProtocolError> {
            let lc = ProofLifecycle::new(&self.domain, &Ed25519Verifier);
            lc.revoke(&mut self.record, &self.schema, sig, ts(300))
        }
    }

    #[test]
    fn threshold_finalizes_on_second_signature() {
        let mut f = fixture(|ids| SignatoryPolicy::threshold(2, ids));
        assert_eq!(f.add(f.proof(0)).unwrap(), SignatureOutcome::Stored);
        assert_eq!(f.record.state(), AttestationState::Pending);
        assert_eq!(f.add(f.proof(1)).unwrap(), SignatureOutcome::Finalized);
        assert_eq!(f.record.state(), AttestationState::Agreed);
        assert_eq!(f.record.agreement().unwrap().signatures().len(), 2);
    }

    #[test]
    fn rejected_signature_leaves_record_untouched() {
        let mut f = fixture(SignatoryPolicy::all);
        f.add(f.proof(0)).unwrap();
        let before = serde_json::to_value(&f.record).unwrap();

        let mut bad = f.proof(1);
        bad.signature[0] ^= 1;
        assert!(matches!(f.add(bad), Err(ProtocolError::SignatureInvalid { .. })));
        assert_eq!(serde_json::to_value(&f.record).unwrap(), before);
    }

    #[test]
    fn proof_for_another_attestation_is_a_mismatch() {
        let mut f = fixture(SignatoryPolicy::all);
        let mut p = f.proof(0);
        p.attestation_id = AttestationId(2);
        assert!(matches!(f.add(p), Err(ProtocolError::SchemaMismatch { .. })));
    }

    #[test]
    fn unlisted_signer_is_rejected_after_signature_check() {
        let mut f = fixture(|ids| SignatoryPolicy::all(ids.into_iter().take(2)));
        let err = f.add(f.proof(2)).unwrap_err();
        assert!(matches!(err, ProtocolError::NotAuthorizedSigner { .. }));
    }

    #[test]
    fn unmet_prerequisites_reject() {
        let f = fixture(SignatoryPolicy::all);
        let mut record = f.record.clone();
        let lc = ProofLifecycle::new(&f.domain, &Ed25519Verifier);
        let err = lc
            .add_signature(
                &mut record,
                &f.schema,
                f.proof(0),
                SubmissionContext {
                    now: ts(200),
                    prerequisites_met: false,
                },
            )
            .unwrap_err();
        assert!(err.to_string().contains("prerequisites"));
    }

    #[test]
    fn expired_schema_rejects_signatures() {
        let mut f = fixture(SignatoryPolicy::all);
        f.schema.metadata.expire_in = 200;
        let lc = ProofLifecycle::new(&f.domain, &Ed25519Verifier);
        let p = f.proof(0);
        let err = lc
            .add_signature(
                &mut f.record,
                &f.schema,
                p,
                SubmissionContext {
                    now: ts(200),
                    prerequisites_met: true,
                },
            )
            .unwrap_err();
        assert_eq!(
            err,
            ProtocolError::SchemaExpired {
                schema_id: SchemaId(1),
                expired_at: ts(200)
            }
        );
    }

    #[test]
    fn resubmission_before_agreement_replaces_and_identical_is_unchanged() {
        let mut f = fixture(SignatoryPolicy::all);
        let p = f.proof(0);
        assert_eq!(f.add(p.clone()).unwrap(), SignatureOutcome::Stored);
        assert_eq!(f.add(p).unwrap(), SignatureOutcome::Unchanged);
    }

    #[test]
    fn late_listed_signer_gets_already_finalized() {
        let mut f = fixture(|ids| SignatoryPolicy::threshold(1, ids));
        let first = f.proof(0);
        f.add(first.clone()).unwrap();
        assert!(matches!(
            f.add(f.proof(1)),
            Err(ProtocolError::AlreadyFinalized { .. })
        ));
        assert_eq!(f.add(first).unwrap(), SignatureOutcome::Unchanged);
    }

    #[test]
    fn revoke_requires_creator_signature() {
        let mut f = fixture(|ids| SignatoryPolicy::threshold(1, ids));
        f.add(f.proof(0)).unwrap();

        let stranger = f.revoke_sig(&f.signers[0]);
        assert!(matches!(f.revoke(&stranger), Err(ProtocolError::NotAuthorized { .. })));
        assert_eq!(f.record.state(), AttestationState::Agreed);

        let sig = f.revoke_sig(&f.creator);
        f.revoke(&sig).unwrap();
        assert_eq!(f.record.state(), AttestationState::Revoked);
        assert_eq!(f.record.lifecycle().revoked_at, Some(ts(300)));

        assert!(matches!(f.revoke(&sig), Err(ProtocolError::WrongState { .. })));
        assert!(matches!(f.add(f.proof(1)), Err(ProtocolError::WrongState { .. })));
    }

    #[test]
    fn attestation_signature_cannot_revoke() {
        let mut f = fixture(|ids| SignatoryPolicy::threshold(1, ids));
        f.add(f.proof(0)).unwrap();
        let lc = ProofLifecycle::new(&f.domain, &Ed25519Verifier);
        let att_digest = lc.attestation_digest(f.record.attestation()).unwrap();
        let replay = f.creator.sign(&att_digest).as_bytes().to_vec();
        assert!(matches!(f.revoke(&replay), Err(ProtocolError::NotAuthorized { .. })));
    }

    #[test]
    fn pending_revocation_is_wrong_state_without_flag() {
        let mut f = fixture(SignatoryPolicy::all);
        let sig = f.revoke_sig(&f.creator);
        assert!(matches!(f.revoke(&sig), Err(ProtocolError::WrongState { .. })));

        f.schema.metadata.revocable_before_agreement = true;
        f.revoke(&sig).unwrap();
        assert_eq!(f.record.state(), AttestationState::Revoked);
    }

    #[test]
    fn non_revocable_schema_is_wrong_state() {
        let mut f = fixture(|ids| SignatoryPolicy::threshold(1, ids));
        f.schema.metadata.revocable = false;
        f.add(f.proof(0)).unwrap();
        let sig = f.revoke_sig(&f.creator);
        assert!(matches!(
            f.revoke(&sig),
            Err(ProtocolError::WrongState {
                source: StateError::NotRevocable,
                ..
            })
        ));
    }
}
