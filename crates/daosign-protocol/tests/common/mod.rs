//! Shared fixtures for protocol integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use daosign_core::{AttestationId, FieldType, Identity, SchemaId, SigningDomain, Timestamp};
use daosign_crypto::Ed25519KeyPair;
use daosign_proof::{AttestationRequest, AttestationResult};
use daosign_protocol::{
    AttestationService, AttestationView, IdentityService, ManualIdentityService, ProtocolError,
};
use daosign_schema::{FieldDefinition, Schema, SchemaMetadata, SignatoryPolicy};

pub const START: i64 = 1_700_000_000;

pub fn domain() -> SigningDomain {
    SigningDomain::new("daosign", "0.1.0", 1, Identity([0xdd; 32]))
}

pub fn key(seed: u8) -> Ed25519KeyPair {
    Ed25519KeyPair::from_seed(&[seed; 32])
}

pub fn ts(secs: i64) -> Timestamp {
    Timestamp::from_epoch_secs(secs).unwrap()
}

pub fn schema(creator: Identity, policy: SignatoryPolicy) -> Schema {
    Schema {
        metadata: SchemaMetadata {
            name: "service_agreement".into(),
            description: "Two-party service agreement".into(),
            attestation_type: "agreement".into(),
            creator,
            created_at: ts(START),
            expire_in: 0,
            is_public: true,
            revocable: true,
            revocable_before_agreement: false,
            nft: None,
        },
        policy,
        fields: vec![
            FieldDefinition::new("terms", FieldType::String),
            FieldDefinition::new("amount", FieldType::Uint256),
        ],
    }
}

pub fn results() -> Vec<AttestationResult> {
    vec![
        AttestationResult::string("terms", "deliver 3 audits in Q3"),
        AttestationResult::uint("amount", 12_000),
    ]
}

pub struct Harness {
    pub service: AttestationService<Arc<ManualIdentityService>>,
    pub clock: Arc<ManualIdentityService>,
    pub creator: Ed25519KeyPair,
}

impl Harness {
    pub fn new() -> Self {
        let clock = Arc::new(ManualIdentityService::new(domain(), ts(START)));
        Self {
            service: AttestationService::new(Arc::clone(&clock)),
            clock,
            creator: key(1),
        }
    }

    pub fn register(&self, policy: SignatoryPolicy) -> SchemaId {
        self.service
            .register_schema(schema(self.creator.identity(), policy))
            .unwrap()
    }

    pub fn attest(&self, schema_id: SchemaId) -> AttestationId {
        self.attest_for(schema_id, Identity::ZERO)
    }

    pub fn attest_for(&self, schema_id: SchemaId, recipient: Identity) -> AttestationId {
        let request = AttestationRequest {
            schema_id,
            results: results(),
            creator: self.creator.identity(),
            recipient,
            created_at: self.clock.current_timestamp(),
        };
        self.create(request, &self.creator).unwrap()
    }

    /// Create `request`, signed by `signer` whatever creator it claims.
    pub fn create(
        &self,
        request: AttestationRequest,
        signer: &Ed25519KeyPair,
    ) -> Result<AttestationId, ProtocolError> {
        let digest = self.service.creation_digest(&request)?;
        let signature = signer.sign(&digest);
        self.service.create_attestation(
            request.schema_id,
            request.results,
            request.creator,
            request.recipient,
            request.created_at,
            signature.as_bytes(),
        )
    }

    /// A request for `schema_id` by the harness creator at the current time.
    pub fn request(&self, schema_id: SchemaId) -> AttestationRequest {
        AttestationRequest {
            schema_id,
            results: results(),
            creator: self.creator.identity(),
            recipient: Identity::ZERO,
            created_at: self.clock.current_timestamp(),
        }
    }

    pub fn sign(
        &self,
        id: AttestationId,
        signer: &Ed25519KeyPair,
    ) -> Result<AttestationView, ProtocolError> {
        let digest = self.service.attestation_digest(id)?;
        self.service
            .submit_signature(id, signer.identity(), signer.sign(&digest).as_bytes().to_vec())
    }

    pub fn revoke_with(
        &self,
        id: AttestationId,
        signer: &Ed25519KeyPair,
    ) -> Result<AttestationView, ProtocolError> {
        let digest = self.service.revoke_digest(id)?;
        self.service
            .request_revocation(id, signer.sign(&digest).as_bytes())
    }
}
