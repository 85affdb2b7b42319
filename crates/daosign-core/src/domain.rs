//! # Signing Domain
//!
//! The domain separator bound into every message digest. Two deployments
//! with different names, versions, chain ids or verifying contracts produce
//! different digests for identical messages, so a signature collected for
//! one deployment is never valid on another.

use serde::{Deserialize, Serialize};

use crate::error::EncodingError;
use crate::identity::Identity;
use crate::typed_data::{hash_struct, FieldType, TypeDescriptor, TypeSet, TypedValue};

/// Name of the domain struct type.
pub const DOMAIN_TYPE_NAME: &str = "EIP712Domain";

/// Domain-separation parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigningDomain {
    /// Human-readable protocol name.
    pub name: String,
    /// Protocol version.
    pub version: String,
    /// Chain or network identifier.
    pub chain_id: u64,
    /// Identity of the deployment that verifies signatures.
    pub verifying_contract: Identity,
}

impl SigningDomain {
    /// Construct a domain.
    pub fn new(name: &str, version: &str, chain_id: u64, verifying_contract: Identity) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            chain_id,
            verifying_contract,
        }
    }

    /// `EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)`
    pub fn descriptor() -> TypeDescriptor {
        TypeDescriptor::new(
            DOMAIN_TYPE_NAME,
            [
                ("name", FieldType::String),
                ("version", FieldType::String),
                ("chainId", FieldType::Uint256),
                ("verifyingContract", FieldType::Address),
            ],
        )
    }

    /// Positional typed value of this domain.
    pub fn typed_value(&self) -> TypedValue {
        TypedValue::Struct(vec![
            self.name.as_str().into(),
            self.version.as_str().into(),
            self.chain_id.into(),
            self.verifying_contract.into(),
        ])
    }

    /// `hashStruct` of the domain.
    pub fn hash(&self) -> Result<[u8; 32], EncodingError> {
        hash_struct(&Self::descriptor(), &self.typed_value(), &TypeSet::new())
    }
}
