//! # Schema Registry
//!
//! Validates, hashes and stores schemas under monotonically increasing
//! ids. Ids are never reused and stored schemas never change; a policy edit
//! is a new registration with a new id.
//!
//! Prerequisites may only reference schemas that are already registered, so
//! the prerequisite graph is acyclic and every reference resolves.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use daosign_core::{SchemaId, SigningDomain, TypedDataHash, TypedStruct};

use crate::error::{SchemaError, Violation};
use crate::schema::Schema;

/// A schema as stored by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredSchema {
    /// Assigned id.
    pub id: SchemaId,
    /// The schema exactly as submitted.
    pub schema: Schema,
    /// Typed-data digest of the `Schema` message under the registry domain.
    pub hash: TypedDataHash,
    /// Registrant's signature over `hash`, when registered with one.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "opt_hex")]
    pub signature: Option<Vec<u8>>,
}

/// In-memory schema table.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    domain: SigningDomain,
    schemas: BTreeMap<SchemaId, RegisteredSchema>,
    next_id: u64,
}

impl SchemaRegistry {
    /// First id handed out.
    pub const FIRST_ID: SchemaId = SchemaId(1);

    /// An empty registry hashing under `domain`.
    pub fn new(domain: SigningDomain) -> Self {
        Self {
            domain,
            schemas: BTreeMap::new(),
            next_id: Self::FIRST_ID.0,
        }
    }

    /// The signing domain schema hashes are computed under.
    pub fn domain(&self) -> &SigningDomain {
        &self.domain
    }

    /// Digest a registrant signs to register `schema`.
    pub fn digest(&self, schema: &Schema) -> Result<TypedDataHash, SchemaError> {
        Ok(schema.signing_hash(&self.domain)?)
    }

    /// Validate and store `schema`, returning its new id.
    pub fn register(&mut self, schema: Schema) -> Result<SchemaId, SchemaError> {
        self.insert(schema, None)
    }

    /// Store a schema together with the registrant signature that was
    /// verified against [`Self::digest`].
    pub fn register_signed(
        &mut self,
        schema: Schema,
        signature: Vec<u8>,
    ) -> Result<SchemaId, SchemaError> {
        self.insert(schema, Some(signature))
    }

    fn insert(
        &mut self,
        schema: Schema,
        signature: Option<Vec<u8>>,
    ) -> Result<SchemaId, SchemaError> {
        let mut violations = schema.violations();
        for (i, p) in schema.policy.prerequisites.iter().enumerate() {
            for sid in &p.schema_ids {
                if !self.schemas.contains_key(sid) {
                    violations.push(Violation::new(
                        format!("policy.prerequisites[{i}]"),
                        format!("references unregistered {sid}"),
                    ));
                }
            }
        }
        violations.into_result(&schema.metadata.name)?;

        let hash = self.digest(&schema)?;
        let id = SchemaId(self.next_id);
        self.next_id += 1;
        self.schemas.insert(
            id,
            RegisteredSchema {
                id,
                schema,
                hash,
                signature,
            },
        );
        Ok(id)
    }

    /// Look up a schema.
    pub fn get(&self, id: SchemaId) -> Result<&RegisteredSchema, SchemaError> {
        self.schemas.get(&id).ok_or(SchemaError::NotFound(id))
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: SchemaId) -> bool {
        self.schemas.contains_key(&id)
    }

    /// Number of registered schemas.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// All schemas in id order.
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredSchema> {
        self.schemas.values()
    }
}

mod opt_hex {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        match v {
            Some(bytes) => s.serialize_some(&hex::encode(bytes)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        Option::<String>::deserialize(d)?
            .map(|s| hex::decode(s.trim_start_matches("0x")).map_err(serde::de::Error::custom))
            .transpose()
    }
}
