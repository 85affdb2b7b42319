//! # Attestation, Creation and Revoke Messages
//!
//! The typed messages parties sign about an attestation:
//!
//! ```text
//! Attestation(uint256 attestationId,uint256 schemaId,AttestationResult[] results,address creator,address recipient,uint256 createdAt)
//! CreateAttestation(uint256 schemaId,AttestationResult[] results,address creator,address recipient,uint256 createdAt)
//! AttestationResult(string name,string resultType,bytes value)
//! Revoke(uint256 attestationId,address creator,string action)
//! ```
//!
//! The creator signs `CreateAttestation` before an id exists; signers sign
//! `Attestation` once it does. The type strings differ, so a signature over
//! one message can never be presented as a signature over another. Result values travel as raw
//! bytes tagged with their field type and are hashed as `bytes`; their
//! decodability is checked once, against the schema, when the attestation
//! is created.

use serde::{Deserialize, Serialize};

use daosign_core::{
    AttestationId, EncodingError, FieldType, Identity, SchemaId, Timestamp, TypeDescriptor,
    TypeSet, TypedStruct, TypedValue,
};
use daosign_schema::FieldDefinition;

use crate::error::ProofError;

/// `action` member of every revoke message.
pub const REVOKE_ACTION: &str = "revoke";

/// One attestation result: the value for one schema field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttestationResult {
    /// Field name, matching the schema's field at the same position.
    pub name: String,
    /// Type tag, matching the schema's field at the same position.
    #[serde(rename = "type")]
    pub result_type: FieldType,
    /// Raw value bytes.
    #[serde(with = "daosign_core::serde_hex")]
    pub value: Vec<u8>,
}

impl AttestationResult {
    /// A result with raw value bytes.
    pub fn new(name: &str, result_type: FieldType, value: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.to_string(),
            result_type,
            value: value.into(),
        }
    }

    /// A UTF-8 `string` result.
    pub fn string(name: &str, value: &str) -> Self {
        Self::new(name, FieldType::String, value.as_bytes())
    }

    /// A `uint256` result, big-endian.
    pub fn uint(name: &str, value: u128) -> Self {
        Self::new(name, FieldType::Uint256, value.to_be_bytes())
    }

    /// An `address` result.
    pub fn address(name: &str, value: Identity) -> Self {
        Self::new(name, FieldType::Address, value.0)
    }

    /// A `bool` result.
    pub fn boolean(name: &str, value: bool) -> Self {
        Self::new(name, FieldType::Bool, [u8::from(value)])
    }

    /// Decode the raw bytes under the result's type tag.
    pub fn decode(&self, path: &str) -> Result<TypedValue, EncodingError> {
        TypedValue::from_raw(&self.result_type, &self.value, path)
    }

    fn typed_value(&self) -> TypedValue {
        TypedValue::Struct(vec![
            self.name.as_str().into(),
            TypedValue::String(self.result_type.tag()),
            TypedValue::Bytes(self.value.clone()),
        ])
    }
}

/// The attestation message every signer signs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attestation {
    /// Assigned id.
    pub attestation_id: AttestationId,
    /// Schema the results conform to.
    pub schema_id: SchemaId,
    /// Result values, one per schema field, in field order.
    pub results: Vec<AttestationResult>,
    /// Creator; the only identity that may revoke.
    pub creator: Identity,
    /// Recipient, or [`Identity::ZERO`] for none.
    pub recipient: Identity,
    /// Creation instant, frozen into the signed message.
    pub created_at: Timestamp,
}

impl Attestation {
    /// Check results against the schema's field definitions position by
    /// position: same count, same names, same type tags, and every value
    /// decodes under its tag.
    pub fn check_results(&self, fields: &[FieldDefinition]) -> Result<(), ProofError> {
        check_results(&self.results, fields)
    }
}

fn result_descriptor() -> TypeDescriptor {
    TypeDescriptor::new(
        "AttestationResult",
        [
            ("name", FieldType::String),
            ("resultType", FieldType::String),
            ("value", FieldType::Bytes),
        ],
    )
}

fn results_value(results: &[AttestationResult]) -> TypedValue {
    TypedValue::Array(results.iter().map(AttestationResult::typed_value).collect())
}

/// What a creator asks to attest, signed before an id is assigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttestationRequest {
    /// Schema the results conform to.
    pub schema_id: SchemaId,
    /// Result values, one per schema field, in field order.
    pub results: Vec<AttestationResult>,
    /// Claimed creator; must have signed the request.
    pub creator: Identity,
    /// Recipient, or [`Identity::ZERO`] for none.
    pub recipient: Identity,
    /// Creation instant.
    pub created_at: Timestamp,
}

impl AttestationRequest {
    /// The stored attestation under `attestation_id`.
    pub fn into_attestation(self, attestation_id: AttestationId) -> Attestation {
        Attestation {
            attestation_id,
            schema_id: self.schema_id,
            results: self.results,
            creator: self.creator,
            recipient: self.recipient,
            created_at: self.created_at,
        }
    }
}

impl TypedStruct for AttestationRequest {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::new(
            "CreateAttestation",
            [
                ("schemaId", FieldType::Uint256),
                (
                    "results",
                    FieldType::Array(Box::new(FieldType::Struct("AttestationResult".into()))),
                ),
                ("creator", FieldType::Address),
                ("recipient", FieldType::Address),
                ("createdAt", FieldType::Uint256),
            ],
        )
    }

    fn type_set() -> TypeSet {
        TypeSet::new().with(result_descriptor())
    }

    fn typed_value(&self) -> Result<TypedValue, EncodingError> {
        Ok(TypedValue::Struct(vec![
            self.schema_id.value().into(),
            results_value(&self.results),
            self.creator.into(),
            self.recipient.into(),
            self.created_at.hash_secs()?.into(),
        ]))
    }
}

/// Free-standing form of [`Attestation::check_results`], used before an id
/// has been assigned.
pub fn check_results(
    results: &[AttestationResult],
    fields: &[FieldDefinition],
) -> Result<(), ProofError> {
    if results.len() != fields.len() {
        return Err(ProofError::ResultCount {
            expected: fields.len(),
            actual: results.len(),
        });
    }
    for (index, (result, field)) in results.iter().zip(fields).enumerate() {
        if result.name != field.name || result.result_type != field.field_type {
            return Err(ProofError::ResultMismatch {
                index,
                expected: format!("{} {}", field.field_type, field.name),
                actual: format!("{} {}", result.result_type, result.name),
            });
        }
        result.decode(&format!("Attestation.results[{index}].value"))?;
    }
    Ok(())
}

impl TypedStruct for Attestation {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::new(
            "Attestation",
            [
                ("attestationId", FieldType::Uint256),
                ("schemaId", FieldType::Uint256),
                (
                    "results",
                    FieldType::Array(Box::new(FieldType::Struct("AttestationResult".into()))),
                ),
                ("creator", FieldType::Address),
                ("recipient", FieldType::Address),
                ("createdAt", FieldType::Uint256),
            ],
        )
    }

    fn type_set() -> TypeSet {
        TypeSet::new().with(result_descriptor())
    }

    fn typed_value(&self) -> Result<TypedValue, EncodingError> {
        Ok(TypedValue::Struct(vec![
            self.attestation_id.value().into(),
            self.schema_id.value().into(),
            results_value(&self.results),
            self.creator.into(),
            self.recipient.into(),
            self.created_at.hash_secs()?.into(),
        ]))
    }
}

/// The message a creator signs to revoke an attestation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevokeMessage {
    /// The attestation to revoke.
    pub attestation_id: AttestationId,
    /// Its recorded creator.
    pub creator: Identity,
}

impl RevokeMessage {
    /// Revoke message for `attestation`.
    pub fn for_attestation(attestation: &Attestation) -> Self {
        Self {
            attestation_id: attestation.attestation_id,
            creator: attestation.creator,
        }
    }
}

impl TypedStruct for RevokeMessage {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::new(
            "Revoke",
            [
                ("attestationId", FieldType::Uint256),
                ("creator", FieldType::Address),
                ("action", FieldType::String),
            ],
        )
    }

    fn typed_value(&self) -> Result<TypedValue, EncodingError> {
        Ok(TypedValue::Struct(vec![
            self.attestation_id.value().into(),
            self.creator.into(),
            REVOKE_ACTION.into(),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daosign_core::{type_string, SigningDomain};

    fn attestation() -> Attestation {
        Attestation {
            attestation_id: AttestationId(1),
            schema_id: SchemaId(1),
            results: vec![
                AttestationResult::string("terms", "pay 10 units"),
                AttestationResult::uint("amount", 10),
            ],
            creator: Identity([1; 32]),
            recipient: Identity([2; 32]),
            created_at: Timestamp::from_epoch_secs(1_700_000_000).unwrap(),
        }
    }

    fn fields() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::new("terms", FieldType::String),
            FieldDefinition::new("amount", FieldType::Uint256),
        ]
    }

    fn domain() -> SigningDomain {
        SigningDomain::new("daosign", "0.1.0", 1, Identity::ZERO)
    }

    #[test]
    fn attestation_type_string_is_fixed() {
        assert_eq!(
            type_string(&Attestation::descriptor(), &Attestation::type_set()).unwrap(),
            "Attestation(uint256 attestationId,uint256 schemaId,AttestationResult[] results,\
             address creator,address recipient,uint256 createdAt)\
             AttestationResult(string name,string resultType,bytes value)"
        );
    }

    #[test]
    fn revoke_type_string_is_fixed() {
        assert_eq!(
            type_string(&RevokeMessage::descriptor(), &RevokeMessage::type_set()).unwrap(),
            "Revoke(uint256 attestationId,address creator,string action)"
        );
    }

    fn request() -> AttestationRequest {
        let a = attestation();
        AttestationRequest {
            schema_id: a.schema_id,
            results: a.results,
            creator: a.creator,
            recipient: a.recipient,
            created_at: a.created_at,
        }
    }

    #[test]
    fn request_type_string_is_fixed() {
        assert_eq!(
            type_string(&AttestationRequest::descriptor(), &AttestationRequest::type_set())
                .unwrap(),
            "CreateAttestation(uint256 schemaId,AttestationResult[] results,\
             address creator,address recipient,uint256 createdAt)\
             AttestationResult(string name,string resultType,bytes value)"
        );
    }

    #[test]
    fn request_becomes_the_stored_attestation() {
        assert_eq!(request().into_attestation(AttestationId(1)), attestation());
    }

    #[test]
    fn request_digest_differs_from_attestation_digest() {
        let req = request().signing_hash(&domain()).unwrap();
        assert_ne!(req, attestation().signing_hash(&domain()).unwrap());

        let mut other = request();
        other.creator = Identity([3; 32]);
        assert_ne!(req, other.signing_hash(&domain()).unwrap());
    }

    #[test]
    fn pre_epoch_creation_time_cannot_be_digested() {
        for secs in [-1, -5, -1_000] {
            let mut a = attestation();
            a.created_at = Timestamp::from_epoch_secs(secs).unwrap();
            assert_eq!(
                a.signing_hash(&domain()),
                Err(EncodingError::PreEpochTimestamp(secs))
            );
        }
        let mut r = request();
        r.created_at = Timestamp::from_epoch_secs(-5).unwrap();
        assert!(r.signing_hash(&domain()).is_err());
    }

    #[test]
    fn revoke_and_attestation_digests_differ() {
        let a = attestation();
        let att = a.signing_hash(&domain()).unwrap();
        let rev = RevokeMessage::for_attestation(&a).signing_hash(&domain()).unwrap();
        assert_ne!(att, rev);
    }

    #[test]
    fn every_member_affects_the_digest() {
        let base = attestation().signing_hash(&domain()).unwrap();

        let mut a = attestation();
        a.results[0].value = b"pay 11 units".to_vec();
        assert_ne!(a.signing_hash(&domain()).unwrap(), base);

        let mut a = attestation();
        a.recipient = Identity::ZERO;
        assert_ne!(a.signing_hash(&domain()).unwrap(), base);

        let mut a = attestation();
        a.created_at = a.created_at.plus_secs(1);
        assert_ne!(a.signing_hash(&domain()).unwrap(), base);

        let mut a = attestation();
        a.attestation_id = AttestationId(2);
        assert_ne!(a.signing_hash(&domain()).unwrap(), base);
    }

    #[test]
    fn results_match_fields() {
        assert!(attestation().check_results(&fields()).is_ok());
    }

    #[test]
    fn result_count_mismatch() {
        let mut a = attestation();
        a.results.pop();
        assert_eq!(
            a.check_results(&fields()).unwrap_err(),
            ProofError::ResultCount {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn result_name_or_type_mismatch() {
        let mut a = attestation();
        a.results.swap(0, 1);
        assert!(matches!(
            a.check_results(&fields()),
            Err(ProofError::ResultMismatch { index: 0, .. })
        ));
    }

    #[test]
    fn undecodable_value_is_an_encoding_error() {
        let mut a = attestation();
        a.results[0].value = vec![0xff, 0xfe];
        assert!(matches!(
            a.check_results(&fields()),
            Err(ProofError::Encoding(EncodingError::InvalidUtf8 { .. }))
        ));
    }

    #[test]
    fn result_helpers_decode() {
        let who = Identity([9; 32]);
        assert_eq!(
            AttestationResult::address("who", who).decode("p").unwrap(),
            TypedValue::Address(who)
        );
        assert_eq!(
            AttestationResult::boolean("ok", true).decode("p").unwrap(),
            TypedValue::Bool(true)
        );
    }

    #[test]
    fn result_value_serializes_as_hex() {
        let r = AttestationResult::string("t", "hi");
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["value"], hex::encode("hi"));
        assert_eq!(json["type"], "string");
    }
}
