//! # Demo Subcommand
//!
//! Drives the in-memory [`AttestationService`] through a 2-of-3 agreement:
//! register a schema, create a signed attestation, collect two signatures, show
//! the third being refused, then revoke as the creator.

use anyhow::{bail, Context, Result};
use clap::Args;

use daosign_core::{AttestationId, FieldType, Identity, SchemaId, SigningDomain, Timestamp};
use daosign_crypto::Ed25519KeyPair;
use daosign_proof::{Attestation, AttestationRequest, AttestationResult};
use daosign_protocol::{AttestationService, AttestationView, IdentityService, SystemIdentityService};
use daosign_schema::{FieldDefinition, Schema, SchemaMetadata, SignatoryPolicy};

/// Arguments for `daosign demo`.
#[derive(Args, Debug)]
pub struct DemoArgs {
    /// Print the final attestation as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Execute `daosign demo`.
pub fn run_demo(args: &DemoArgs, domain: SigningDomain) -> Result<u8> {
    let service = AttestationService::new(SystemIdentityService::new(domain));
    let view = run_flow(&service)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    }
    Ok(0)
}

/// Run the scripted flow and return the final, revoked attestation.
pub fn run_flow<I: IdentityService>(service: &AttestationService<I>) -> Result<AttestationView> {
    let creator = Ed25519KeyPair::generate();
    let signers = [
        Ed25519KeyPair::generate(),
        Ed25519KeyPair::generate(),
        Ed25519KeyPair::generate(),
    ];
    let identities: Vec<Identity> = signers.iter().map(|k| k.identity()).collect();

    let schema_id = service
        .register_schema(demo_schema(creator.identity(), &identities, 2))
        .context("schema registration failed")?;
    println!("schema     {schema_id} registered (2 of 3)");

    let request = AttestationRequest {
        schema_id,
        results: demo_results(),
        creator: creator.identity(),
        recipient: Identity::ZERO,
        created_at: service.identity().current_timestamp(),
    };
    let signature = creator.sign(&service.creation_digest(&request)?);
    let id = service
        .create_attestation(
            request.schema_id,
            request.results,
            request.creator,
            request.recipient,
            request.created_at,
            signature.as_bytes(),
        )
        .context("attestation creation failed")?;
    println!("attestation {id} created");

    for (name, key) in ["x", "y"].iter().zip(&signers) {
        let view = sign(service, id, key)?;
        println!("signer {name}   {} -> {}", key.identity(), view.state);
    }

    match sign(service, id, &signers[2]) {
        Ok(_) => bail!("late signature was accepted after agreement"),
        Err(e) => println!("signer z   refused: {e:#}"),
    }

    let digest = service.revoke_digest(id)?;
    let view = service
        .request_revocation(id, creator.sign(&digest).as_bytes())
        .context("revocation failed")?;
    println!("attestation {id} {}", view.state);
    Ok(view)
}

fn sign<I: IdentityService>(
    service: &AttestationService<I>,
    id: AttestationId,
    key: &Ed25519KeyPair,
) -> Result<AttestationView> {
    let digest = service.attestation_digest(id)?;
    Ok(service.submit_signature(id, key.identity(), key.sign(&digest).as_bytes().to_vec())?)
}

/// A revocable threshold schema with a `terms` string and an `amount`.
pub fn demo_schema(creator: Identity, signers: &[Identity], required: u32) -> Schema {
    Schema {
        metadata: SchemaMetadata {
            name: "service_agreement".into(),
            description: "Service agreement between a client and contractors".into(),
            attestation_type: "agreement".into(),
            creator,
            created_at: Timestamp::now(),
            expire_in: 0,
            is_public: true,
            revocable: true,
            revocable_before_agreement: false,
            nft: None,
        },
        policy: SignatoryPolicy::threshold(required, signers.iter().copied()),
        fields: vec![
            FieldDefinition::new("terms", FieldType::String),
            FieldDefinition::new("amount", FieldType::Uint256),
        ],
    }
}

fn demo_results() -> Vec<AttestationResult> {
    vec![
        AttestationResult::string("terms", "three audits delivered in Q3"),
        AttestationResult::uint("amount", 12_000),
    ]
}

/// A creation request for [`demo_schema`] registered under id 1.
pub fn demo_request(creator: Identity) -> AttestationRequest {
    AttestationRequest {
        schema_id: SchemaId(1),
        results: demo_results(),
        creator,
        recipient: Identity::ZERO,
        created_at: Timestamp::now(),
    }
}

/// An attestation of [`demo_schema`] as it would be stored under id 1.
pub fn demo_attestation(creator: Identity) -> Attestation {
    demo_request(creator).into_attestation(AttestationId(1))
}
