//! # Schema Model
//!
//! A schema declares the shape of an attestation (its ordered field
//! definitions), who must sign it (the [`SignatoryPolicy`]) and descriptive
//! metadata. The schema hash stored by the registry is the typed-data digest
//! of the `Schema` message below; a registrant signs that digest to register
//! a schema with a Proof of Authority.
//!
//! ```text
//! Schema(SchemaMetadata metadata,SignatoryPolicy policy,FieldDefinition[] fields)
//! FieldDefinition(string name,string fieldType)
//! Prerequisite(string operator,uint256[] schemaIds,string description)
//! SchemaMetadata(string name,string description,string attestationType,address creator,
//!                uint256 createdAt,uint256 expireIn,bool isPublic,bool isRevocable,
//!                bool revocableBeforeAgreement,bool isNft,string nftName,string nftSymbol)
//! Signatory(address identity,uint256 position,string description)
//! SignatoryPolicy(string mode,uint256 threshold,Signatory[] signatories,Prerequisite[] prerequisites)
//! ```
//!
//! The schema id is not part of the message: ids are assigned at
//! registration, after the registrant has signed.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use daosign_core::{
    EncodingError, FieldType, Identity, Timestamp, TypeDescriptor, TypeSet, TypedStruct,
    TypedValue,
};

use crate::error::{SchemaError, Violation, Violations};
use crate::policy::SignatoryPolicy;

/// NFT collection linked to a schema. Minting itself happens elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NftCollection {
    /// Collection name.
    pub name: String,
    /// Collection ticker symbol.
    pub symbol: String,
}

/// Descriptive and behavioral metadata of a schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaMetadata {
    /// Short name (`daosign_vacancy`).
    pub name: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Application-level kind (`agreement`, `certificate`).
    pub attestation_type: String,
    /// Registrant identity; owns the schema.
    pub creator: Identity,
    /// Registration instant; expiry is measured from here.
    pub created_at: Timestamp,
    /// Lifetime in seconds; `0` never expires.
    #[serde(default)]
    pub expire_in: u64,
    /// Anyone may create attestations. When false only `creator` may.
    #[serde(default = "default_true")]
    pub is_public: bool,
    /// Agreed attestations may be revoked by their creator.
    #[serde(default)]
    pub revocable: bool,
    /// Pending attestations may be revoked as well.
    #[serde(default)]
    pub revocable_before_agreement: bool,
    /// Linked NFT collection, if any.
    #[serde(default)]
    pub nft: Option<NftCollection>,
}

fn default_true() -> bool {
    true
}

/// One declared attestation field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Field name.
    pub name: String,
    /// Primitive type tag of the field's value.
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl FieldDefinition {
    /// Convenience constructor.
    pub fn new(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.to_string(),
            field_type,
        }
    }
}

/// A schema definition as submitted for registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Schema {
    /// Metadata.
    pub metadata: SchemaMetadata,
    /// Proof of Authority.
    pub policy: SignatoryPolicy,
    /// Ordered field definitions.
    pub fields: Vec<FieldDefinition>,
}

impl Schema {
    /// Every structural problem with this schema and its policy.
    pub fn violations(&self) -> Violations {
        let mut out = Violations::default();

        if self.metadata.name.trim().is_empty() {
            out.push(Violation::new("metadata.name", "schema name is empty"));
        }
        if self.metadata.creator.is_zero() {
            out.push(Violation::new("metadata.creator", "creator is the zero identity"));
        }
        if self.metadata.created_at.is_pre_epoch() {
            out.push(Violation::new(
                "metadata.created_at",
                "creation time precedes the unix epoch",
            ));
        }
        if self.metadata.revocable_before_agreement && !self.metadata.revocable {
            out.push(Violation::new(
                "metadata.revocable_before_agreement",
                "revocation before agreement requires the schema to be revocable",
            ));
        }
        if let Some(nft) = &self.metadata.nft {
            if nft.name.is_empty() || nft.symbol.is_empty() {
                out.push(Violation::new("metadata.nft", "NFT collection needs a name and symbol"));
            }
        }

        if self.fields.is_empty() {
            out.push(Violation::new("fields", "schema defines no fields"));
        }
        let mut names = BTreeSet::new();
        for (i, f) in self.fields.iter().enumerate() {
            let path = format!("fields[{i}]");
            if f.name.is_empty() {
                out.push(Violation::new(&path, "field name is empty"));
            } else if !names.insert(f.name.as_str()) {
                out.push(Violation::new(&path, format!("duplicate field name {:?}", f.name)));
            }
            if !f.field_type.is_primitive() {
                out.push(Violation::new(
                    &path,
                    format!("field type {} is not a primitive type tag", f.field_type),
                ));
            }
        }

        out.extend(self.policy.violations());
        out
    }

    /// Validate the schema, reporting every violation at once.
    pub fn validate(&self) -> Result<(), SchemaError> {
        self.violations().into_result(&self.metadata.name)
    }

    /// Instant the schema expires, if it ever does.
    pub fn expires_at(&self) -> Option<Timestamp> {
        let m = &self.metadata;
        (m.expire_in > 0).then(|| m.created_at.plus_secs(m.expire_in))
    }

    /// Whether the schema has expired at `now`.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.expires_at().is_some_and(|at| now >= at)
    }

    fn metadata_descriptor() -> TypeDescriptor {
        TypeDescriptor::new(
            "SchemaMetadata",
            [
                ("name", FieldType::String),
                ("description", FieldType::String),
                ("attestationType", FieldType::String),
                ("creator", FieldType::Address),
                ("createdAt", FieldType::Uint256),
                ("expireIn", FieldType::Uint256),
                ("isPublic", FieldType::Bool),
                ("isRevocable", FieldType::Bool),
                ("revocableBeforeAgreement", FieldType::Bool),
                ("isNft", FieldType::Bool),
                ("nftName", FieldType::String),
                ("nftSymbol", FieldType::String),
            ],
        )
    }

    fn metadata_value(&self) -> Result<TypedValue, EncodingError> {
        let m = &self.metadata;
        let (nft_name, nft_symbol) = m
            .nft
            .as_ref()
            .map_or(("", ""), |n| (n.name.as_str(), n.symbol.as_str()));
        Ok(TypedValue::Struct(vec![
            m.name.as_str().into(),
            m.description.as_str().into(),
            m.attestation_type.as_str().into(),
            m.creator.into(),
            m.created_at.hash_secs()?.into(),
            m.expire_in.into(),
            m.is_public.into(),
            m.revocable.into(),
            m.revocable_before_agreement.into(),
            m.nft.is_some().into(),
            nft_name.into(),
            nft_symbol.into(),
        ]))
    }
}

impl TypedStruct for Schema {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::new(
            "Schema",
            [
                ("metadata", FieldType::Struct("SchemaMetadata".into())),
                ("policy", FieldType::Struct("SignatoryPolicy".into())),
                (
                    "fields",
                    FieldType::Array(Box::new(FieldType::Struct("FieldDefinition".into()))),
                ),
            ],
        )
    }

    fn type_set() -> TypeSet {
        let mut types = TypeSet::new()
            .with(Self::metadata_descriptor())
            .with(TypeDescriptor::new(
                "FieldDefinition",
                [("name", FieldType::String), ("fieldType", FieldType::String)],
            ));
        for d in SignatoryPolicy::type_descriptors() {
            types.insert(d);
        }
        types
    }

    fn typed_value(&self) -> Result<TypedValue, EncodingError> {
        let fields = self
            .fields
            .iter()
            .map(|f| {
                TypedValue::Struct(vec![
                    f.name.as_str().into(),
                    TypedValue::String(f.field_type.tag()),
                ])
            })
            .collect();
        Ok(TypedValue::Struct(vec![
            self.metadata_value()?,
            self.policy.typed_value(),
            TypedValue::Array(fields),
        ]))
    }
}
