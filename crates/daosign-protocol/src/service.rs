//! # Attestation Service
//!
//! The inbound interface of the protocol: schema registration, attestation
//! creation, signature and revocation submission, and queries.
//!
//! Each submission is one transaction against one attestation. The service
//! resolves everything that lives outside the attestation first (schema,
//! clock, signing domain, signer prerequisite holdings) and then applies the
//! operation through [`ProofLifecycle`] inside
//! [`Persistence::try_update_attestation`], which serializes it against any
//! other operation on the same attestation.
//!
//! Schema digests are bound to the store's registry domain; attestation and
//! revoke digests to [`IdentityService::resolve_verifying_context`]. Build
//! the store from the same identity service (as [`AttestationService::new`]
//! does) to keep them equal.

use std::collections::BTreeSet;
use std::sync::Arc;

use daosign_core::{AttestationId, Identity, SchemaId, SigningDomain, Timestamp, TypedDataHash};
use daosign_crypto::{Ed25519Verifier, SignatureVerifier};
use daosign_proof::{
    check_results, AttestationRecord, AttestationRequest, AttestationResult, ProofOfSignature,
};
use daosign_schema::{RegisteredSchema, Schema};

use crate::error::ProtocolError;
use crate::lifecycle::{ProofLifecycle, SignatureOutcome, SubmissionContext};
use crate::ports::{IdentityService, MemoryStore, Persistence};
use crate::view::AttestationView;

/// The protocol entry point.
pub struct AttestationService<I: IdentityService, P: Persistence = MemoryStore> {
    identity: I,
    store: P,
    verifier: Arc<dyn SignatureVerifier>,
}

impl<I: IdentityService> AttestationService<I, MemoryStore> {
    /// Service over a fresh [`MemoryStore`] bound to the identity
    /// service's signing domain, verifying Ed25519 signatures.
    pub fn new(identity: I) -> Self {
        let store = MemoryStore::new(identity.resolve_verifying_context());
        Self::with_store(identity, store)
    }
}

impl<I: IdentityService, P: Persistence> AttestationService<I, P> {
    /// Service over an existing store.
    pub fn with_store(identity: I, store: P) -> Self {
        Self {
            identity,
            store,
            verifier: Arc::new(Ed25519Verifier),
        }
    }

    /// Replace the signature verifier.
    pub fn with_verifier(mut self, verifier: Arc<dyn SignatureVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    /// The identity service.
    pub fn identity(&self) -> &I {
        &self.identity
    }

    /// The backing store.
    pub fn store(&self) -> &P {
        &self.store
    }

    /// The signing domain attestation digests are bound to.
    pub fn domain(&self) -> SigningDomain {
        self.identity.resolve_verifying_context()
    }

    // -- Schemas --------------------------------------------------------------

    /// Digest a registrant signs for [`Self::register_signed_schema`].
    pub fn schema_digest(&self, schema: &Schema) -> Result<TypedDataHash, ProtocolError> {
        Ok(self.store.read_schemas(|r| r.digest(schema))?)
    }

    /// Validate and register `schema`.
    pub fn register_schema(&self, schema: Schema) -> Result<SchemaId, ProtocolError> {
        let name = schema.metadata.name.clone();
        let creator = schema.metadata.creator;
        let id = self.store.write_schemas(|r| r.register(schema))?;
        tracing::info!(schema_id = %id, name = %name, creator = %creator, "schema created");
        Ok(id)
    }

    /// Register `schema` with its creator's signature over
    /// [`Self::schema_digest`].
    pub fn register_signed_schema(
        &self,
        schema: Schema,
        signature: &[u8],
    ) -> Result<SchemaId, ProtocolError> {
        let creator = schema.metadata.creator;
        let digest = self.schema_digest(&schema)?;
        if !self.verifier.verify(&creator, &digest, signature) {
            tracing::warn!(
                name = %schema.metadata.name,
                creator = %creator,
                "schema signature rejected"
            );
            return Err(ProtocolError::NotAuthorized {
                subject: format!("schema {:?}", schema.metadata.name),
                identity: creator,
                reason: "schema must be signed by its creator".to_string(),
            });
        }
        let name = schema.metadata.name.clone();
        let id = self
            .store
            .write_schemas(|r| r.register_signed(schema, signature.to_vec()))?;
        tracing::info!(
            schema_id = %id,
            name = %name,
            creator = %creator,
            signed = true,
            "schema created"
        );
        Ok(id)
    }

    /// A registered schema.
    pub fn get_schema(&self, id: SchemaId) -> Result<RegisteredSchema, ProtocolError> {
        Ok(self.store.read_schemas(|r| r.get(id).cloned())?)
    }

    // -- Attestations ---------------------------------------------------------

    /// Digest a creator signs for [`Self::create_attestation`].
    pub fn creation_digest(
        &self,
        request: &AttestationRequest,
    ) -> Result<TypedDataHash, ProtocolError> {
        let domain = self.domain();
        ProofLifecycle::new(&domain, self.verifier.as_ref()).creation_digest(request)
    }

    /// Create a `Pending` attestation of `schema_id`.
    ///
    /// `signature` is the creator's signature over [`Self::creation_digest`]
    /// of the same request. Rejects a signature that does not verify as
    /// `creator`, private schemas unless `creator` is the schema creator,
    /// expired schemas, and results that do not match the schema fields.
    pub fn create_attestation(
        &self,
        schema_id: SchemaId,
        results: Vec<AttestationResult>,
        creator: Identity,
        recipient: Identity,
        created_at: Timestamp,
        signature: &[u8],
    ) -> Result<AttestationId, ProtocolError> {
        let schema = self.get_schema(schema_id)?.schema;
        let request = AttestationRequest {
            schema_id,
            results,
            creator,
            recipient,
            created_at,
        };

        let digest = self.creation_digest(&request)?;
        if !self.verifier.verify(&creator, &digest, signature) {
            tracing::warn!(
                schema_id = %schema_id,
                creator = %creator,
                "attestation creation signature rejected"
            );
            return Err(ProtocolError::NotAuthorized {
                subject: schema_id.to_string(),
                identity: creator,
                reason: "attestation must be signed by its creator".to_string(),
            });
        }
        if !schema.metadata.is_public && creator != schema.metadata.creator {
            return Err(ProtocolError::NotAuthorized {
                subject: schema_id.to_string(),
                identity: creator,
                reason: "only the schema creator may attest a private schema".to_string(),
            });
        }
        if let Some(expired_at) = self.expiry(&schema) {
            return Err(ProtocolError::SchemaExpired {
                schema_id,
                expired_at,
            });
        }
        check_results(&request.results, &schema.fields)
            .map_err(|e| ProtocolError::from_proof(schema_id, e))?;

        let id = self.store.insert_attestation(|attestation_id| {
            AttestationRecord::new(request.into_attestation(attestation_id))
        });
        tracing::info!(
            attestation_id = %id,
            schema_id = %schema_id,
            creator = %creator,
            "attestation created"
        );
        Ok(id)
    }

    /// Digest signers sign for attestation `id`, derived from the stored
    /// message.
    pub fn attestation_digest(&self, id: AttestationId) -> Result<TypedDataHash, ProtocolError> {
        let record = self.load(id, ProtocolError::AttestationNotFound)?;
        let domain = self.domain();
        ProofLifecycle::new(&domain, self.verifier.as_ref())
            .attestation_digest(record.attestation())
    }

    /// Digest the creator signs to revoke attestation `id`.
    pub fn revoke_digest(&self, id: AttestationId) -> Result<TypedDataHash, ProtocolError> {
        let record = self.load(id, ProtocolError::AttestationNotFound)?;
        let domain = self.domain();
        ProofLifecycle::new(&domain, self.verifier.as_ref()).revoke_digest(record.attestation())
    }

    /// Add `signer`'s signature over the attestation digest.
    pub fn submit_signature(
        &self,
        id: AttestationId,
        signer: Identity,
        signature: Vec<u8>,
    ) -> Result<AttestationView, ProtocolError> {
        let record = self.load(id, ProtocolError::UnknownAttestation)?;
        let domain = self.domain();
        let digest = ProofLifecycle::new(&domain, self.verifier.as_ref())
            .attestation_digest(record.attestation())?;
        self.submit(
            record,
            ProofOfSignature {
                attestation_id: id,
                signer,
                typed_data_hash: digest,
                signature,
            },
        )
    }

    /// Add a complete proof of signature. Its digest must equal the digest
    /// re-derived from the stored attestation.
    pub fn submit_proof(&self, proof: ProofOfSignature) -> Result<AttestationView, ProtocolError> {
        let record = self.load(proof.attestation_id, ProtocolError::UnknownAttestation)?;
        self.submit(record, proof)
    }

    fn submit(
        &self,
        snapshot: AttestationRecord,
        proof: ProofOfSignature,
    ) -> Result<AttestationView, ProtocolError> {
        let id = snapshot.id();
        let schema_id = snapshot.attestation().schema_id;
        let schema = self.get_schema(schema_id)?.schema;
        let signer = proof.signer;

        let prerequisites_met = schema.policy.prerequisites.is_empty() || {
            let held = self.holdings(&signer);
            schema.policy.prerequisites_met(|sid| held.contains(&sid))
        };
        let ctx = SubmissionContext {
            now: self.identity.current_timestamp(),
            prerequisites_met,
        };
        let domain = self.domain();
        let lifecycle = ProofLifecycle::new(&domain, self.verifier.as_ref());

        let result = self
            .store
            .try_update_attestation(id, |record| {
                let outcome = lifecycle.add_signature(record, &schema, proof, ctx)?;
                let digest = lifecycle.attestation_digest(record.attestation())?;
                let view = AttestationView::new(record, digest, schema.is_expired_at(ctx.now));
                Ok::<_, ProtocolError>((outcome, view))
            })
            .ok_or(ProtocolError::UnknownAttestation(id))?;

        match result {
            Ok((outcome, view)) => {
                match outcome {
                    SignatureOutcome::Finalized => {
                        tracing::info!(attestation_id = %id, signer = %signer, "proof stored");
                        tracing::info!(
                            attestation_id = %id,
                            signers = view.agreement.as_ref().map_or(0, |a| a.signatures().len()),
                            "agreement finalized"
                        );
                    }
                    SignatureOutcome::Stored | SignatureOutcome::Replaced => {
                        tracing::info!(
                            attestation_id = %id,
                            signer = %signer,
                            ?outcome,
                            "proof stored"
                        );
                    }
                    SignatureOutcome::Unchanged => {
                        tracing::debug!(
                            attestation_id = %id,
                            signer = %signer,
                            "identical proof resubmitted"
                        );
                    }
                }
                Ok(view)
            }
            Err(e) => {
                tracing::warn!(
                    attestation_id = %id,
                    signer = %signer,
                    code = e.kind().code(),
                    error = %e,
                    "signature rejected"
                );
                Err(e)
            }
        }
    }

    /// Revoke attestation `id` with the creator's signature over
    /// [`Self::revoke_digest`].
    pub fn request_revocation(
        &self,
        id: AttestationId,
        signature: &[u8],
    ) -> Result<AttestationView, ProtocolError> {
        let snapshot = self.load(id, ProtocolError::UnknownAttestation)?;
        let schema = self.get_schema(snapshot.attestation().schema_id)?.schema;
        let now = self.identity.current_timestamp();
        let domain = self.domain();
        let lifecycle = ProofLifecycle::new(&domain, self.verifier.as_ref());

        let view = self
            .store
            .try_update_attestation(id, |record| {
                lifecycle.revoke(record, &schema, signature, now)?;
                let digest = lifecycle.attestation_digest(record.attestation())?;
                Ok::<_, ProtocolError>(AttestationView::new(
                    record,
                    digest,
                    schema.is_expired_at(now),
                ))
            })
            .ok_or(ProtocolError::UnknownAttestation(id))?
            .map_err(|e| {
                tracing::warn!(
                    attestation_id = %id,
                    code = e.kind().code(),
                    error = %e,
                    "revocation rejected"
                );
                e
            })?;
        tracing::info!(attestation_id = %id, "attestation revoked");
        Ok(view)
    }

    /// Read-only snapshot of attestation `id`.
    pub fn get_attestation(&self, id: AttestationId) -> Result<AttestationView, ProtocolError> {
        let record = self.load(id, ProtocolError::AttestationNotFound)?;
        self.view(&record)
    }

    /// Attestations of `schema_id` where `identity` is the recipient or a
    /// listed signer, in id order.
    pub fn list_user_attestations(
        &self,
        schema_id: SchemaId,
        identity: &Identity,
    ) -> Result<Vec<AttestationView>, ProtocolError> {
        let schema = self.get_schema(schema_id)?.schema;
        let listed = schema.policy.is_listed(identity);
        let mut records = Vec::new();
        self.store.scan_attestations(|record| {
            let a = record.attestation();
            if a.schema_id == schema_id && (listed || &a.recipient == identity) {
                records.push(record.clone());
            }
        });
        records.iter().map(|r| self.view(r)).collect()
    }

    // -- Internals ------------------------------------------------------------

    fn load(
        &self,
        id: AttestationId,
        missing: fn(AttestationId) -> ProtocolError,
    ) -> Result<AttestationRecord, ProtocolError> {
        self.store.load_attestation(id).ok_or_else(|| missing(id))
    }

    fn view(&self, record: &AttestationRecord) -> Result<AttestationView, ProtocolError> {
        let schema = self.get_schema(record.attestation().schema_id)?.schema;
        let domain = self.domain();
        let digest = ProofLifecycle::new(&domain, self.verifier.as_ref())
            .attestation_digest(record.attestation())?;
        let expired = schema.is_expired_at(self.identity.current_timestamp());
        Ok(AttestationView::new(record, digest, expired))
    }

    fn expiry(&self, schema: &Schema) -> Option<Timestamp> {
        let now = self.identity.current_timestamp();
        schema.expires_at().filter(|at| now >= *at)
    }

    /// Schemas `identity` holds an agreed, unrevoked attestation of as
    /// recipient.
    fn holdings(&self, identity: &Identity) -> BTreeSet<SchemaId> {
        let mut held = BTreeSet::new();
        self.store.scan_attestations(|record| {
            if record.is_held_by(identity) {
                held.insert(record.attestation().schema_id);
            }
        });
        held
    }
}
