//! # Typed-Data Codec: Deterministic Struct Hashing
//!
//! Canonicalizes a typed value into a 32-byte digest following the EIP-712
//! construction. This is the only path by which the protocol produces bytes
//! that anyone signs.
//!
//! ## Type Strings
//!
//! A struct type is rendered as `Name(type1 name1,type2 name2,...)` with the
//! members in declaration order. The full type string of a struct is its own
//! rendering followed by the renderings of every struct type it references
//! (transitively), those referenced types sorted lexicographically by name:
//!
//! ```text
//! Attestation(...,AttestationResult[] results,...)AttestationResult(string name,...)
//! ```
//!
//! Recursive type references are rejected, as is nesting deeper than
//! [`MAX_DEPTH`].
//!
//! ## Value Encoding
//!
//! `hashStruct(s) = keccak256(typeHash ‖ enc(v1) ‖ ... ‖ enc(vn))` where each
//! member encodes to one 32-byte word:
//!
//! | Tag | Encoding |
//! |-----|----------|
//! | `string` | `keccak256(utf8 bytes)` |
//! | `bytes` | `keccak256(bytes)` |
//! | `uint256` | 32-byte big-endian |
//! | `address` | the 32-byte identity |
//! | `bool` | `0` or `1` as a 32-byte big-endian word |
//! | struct | `hashStruct` of the nested value |
//! | `T[]` | `keccak256(enc(e1) ‖ ... ‖ enc(en))`, at most [`MAX_ARRAY_LEN`] elements |
//!
//! The final message digest is
//! `keccak256(0x19 0x01 ‖ hashStruct(domain) ‖ hashStruct(message))`.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::digest::{keccak256, TypedDataHash};
use crate::domain::SigningDomain;
use crate::error::EncodingError;
use crate::identity::Identity;

/// Fixed two-byte prefix of every signable message.
pub const MESSAGE_PREFIX: [u8; 2] = [0x19, 0x01];

/// Maximum number of elements in any array inside a typed value.
pub const MAX_ARRAY_LEN: usize = 1024;

/// Maximum nesting depth of struct references.
pub const MAX_DEPTH: usize = 16;

// ─── Type tags ───────────────────────────────────────────────────────

/// The type tag of a struct member.
///
/// Closed enumeration: every encoding rule is an exhaustive match on this
/// type. Serializes as its canonical tag string (`"uint256"`, `"Signer[]"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// UTF-8 string, hashed.
    String,
    /// Arbitrary bytes, hashed.
    Bytes,
    /// Unsigned 256-bit integer.
    Uint256,
    /// A 32-byte party identity.
    Address,
    /// Boolean.
    Bool,
    /// Reference to a named struct type.
    Struct(String),
    /// Dynamic array of the inner type.
    Array(Box<FieldType>),
}

impl FieldType {
    /// Parse a canonical type tag.
    ///
    /// Primitive tags are lowercase. Struct names must start with an ASCII
    /// uppercase letter and contain only ASCII alphanumerics or `_`. Any
    /// other tag (for example `uint8` or `int256`) is unrecognized.
    pub fn parse(tag: &str) -> Result<Self, EncodingError> {
        if let Some(inner) = tag.strip_suffix("[]") {
            return Ok(Self::Array(Box::new(Self::parse(inner)?)));
        }
        match tag {
            "string" => Ok(Self::String),
            "bytes" => Ok(Self::Bytes),
            "uint256" => Ok(Self::Uint256),
            "address" => Ok(Self::Address),
            "bool" => Ok(Self::Bool),
            name if is_struct_name(name) => Ok(Self::Struct(name.to_string())),
            other => Err(EncodingError::UnknownTypeTag(other.to_string())),
        }
    }

    /// The canonical tag string used in type strings.
    pub fn tag(&self) -> String {
        match self {
            Self::String => "string".to_string(),
            Self::Bytes => "bytes".to_string(),
            Self::Uint256 => "uint256".to_string(),
            Self::Address => "address".to_string(),
            Self::Bool => "bool".to_string(),
            Self::Struct(name) => name.clone(),
            Self::Array(inner) => format!("{}[]", inner.tag()),
        }
    }

    /// The struct name this tag ultimately refers to, looking through arrays.
    pub fn struct_name(&self) -> Option<&str> {
        match self {
            Self::Struct(name) => Some(name),
            Self::Array(inner) => inner.struct_name(),
            _ => None,
        }
    }

    /// Whether this tag is one of the five primitives.
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Self::String | Self::Bytes | Self::Uint256 | Self::Address | Self::Bool
        )
    }
}

fn is_struct_name(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl FromStr for FieldType {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.tag())
    }
}

impl Serialize for FieldType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.tag())
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

// ─── Type descriptors ────────────────────────────────────────────────

/// One member of a struct type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeMember {
    /// Member name.
    pub name: String,
    /// Member type tag.
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

/// An ordered struct type description. Member order is part of the hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeDescriptor {
    /// Struct type name.
    pub name: String,
    /// Members in declaration order.
    pub members: Vec<TypeMember>,
}

impl TypeDescriptor {
    /// Build a descriptor from `(name, type)` pairs.
    pub fn new<'a>(name: &str, members: impl IntoIterator<Item = (&'a str, FieldType)>) -> Self {
        Self {
            name: name.to_string(),
            members: members
                .into_iter()
                .map(|(n, t)| TypeMember {
                    name: n.to_string(),
                    field_type: t,
                })
                .collect(),
        }
    }

    /// `Name(type1 name1,type2 name2)` for this struct alone.
    pub fn encode_head(&self) -> String {
        let members: Vec<String> = self
            .members
            .iter()
            .map(|m| format!("{} {}", m.field_type.tag(), m.name))
            .collect();
        format!("{}({})", self.name, members.join(","))
    }
}

/// The set of struct types a message may reference by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeSet {
    types: BTreeMap<String, TypeDescriptor>,
}

impl TypeSet {
    /// An empty set (messages made only of primitives).
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, descriptor: TypeDescriptor) -> Self {
        self.insert(descriptor);
        self
    }

    /// Insert or replace a struct type definition.
    pub fn insert(&mut self, descriptor: TypeDescriptor) {
        self.types.insert(descriptor.name.clone(), descriptor);
    }

    /// Look up a struct type by name.
    pub fn get(&self, name: &str) -> Option<&TypeDescriptor> {
        self.types.get(name)
    }

    fn resolve(&self, name: &str) -> Result<&TypeDescriptor, EncodingError> {
        self.get(name)
            .ok_or_else(|| EncodingError::UndefinedType(name.to_string()))
    }
}

/// Full type string of `root`: root head first, then every referenced struct
/// head sorted by name.
pub fn type_string(root: &TypeDescriptor, types: &TypeSet) -> Result<String, EncodingError> {
    let mut deps = BTreeSet::new();
    let mut stack = vec![root.name.clone()];
    collect_dependencies(root, types, &mut deps, &mut stack)?;

    let mut out = root.encode_head();
    for name in &deps {
        out.push_str(&types.resolve(name)?.encode_head());
    }
    Ok(out)
}

fn collect_dependencies(
    descriptor: &TypeDescriptor,
    types: &TypeSet,
    deps: &mut BTreeSet<String>,
    stack: &mut Vec<String>,
) -> Result<(), EncodingError> {
    if stack.len() > MAX_DEPTH {
        return Err(EncodingError::TooDeep(MAX_DEPTH));
    }
    for member in &descriptor.members {
        let Some(name) = member.field_type.struct_name() else {
            continue;
        };
        if stack.iter().any(|s| s == name) {
            return Err(EncodingError::RecursiveType(name.to_string()));
        }
        let nested = types.resolve(name)?;
        if deps.insert(name.to_string()) {
            stack.push(name.to_string());
            collect_dependencies(nested, types, deps, stack)?;
            stack.pop();
        }
    }
    Ok(())
}

/// `keccak256(type_string(root))`.
pub fn type_hash(root: &TypeDescriptor, types: &TypeSet) -> Result<[u8; 32], EncodingError> {
    Ok(keccak256(type_string(root, types)?.as_bytes()))
}

// ─── Values ──────────────────────────────────────────────────────────

/// An unsigned 256-bit integer stored as 32 big-endian bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Uint256(pub [u8; 32]);

impl Uint256 {
    /// Zero.
    pub const ZERO: Uint256 = Uint256([0u8; 32]);

    /// Build from a big-endian slice of at most 32 bytes, left-padding with zeros.
    pub fn from_be_slice(bytes: &[u8]) -> Option<Self> {
        if bytes.len() > 32 {
            return None;
        }
        let mut out = [0u8; 32];
        out[32 - bytes.len()..].copy_from_slice(bytes);
        Some(Self(out))
    }

    /// Narrow to `u128` if the value fits.
    pub fn to_u128(&self) -> Option<u128> {
        if self.0[..16].iter().any(|b| *b != 0) {
            return None;
        }
        let mut low = [0u8; 16];
        low.copy_from_slice(&self.0[16..]);
        Some(u128::from_be_bytes(low))
    }
}

impl From<u64> for Uint256 {
    fn from(v: u64) -> Self {
        Self::from(u128::from(v))
    }
}

impl From<u128> for Uint256 {
    fn from(v: u128) -> Self {
        let mut out = [0u8; 32];
        out[16..].copy_from_slice(&v.to_be_bytes());
        Self(out)
    }
}

/// A runtime value to be hashed against a [`FieldType`].
///
/// Struct values are positional: element `i` belongs to member `i` of the
/// struct's descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TypedValue {
    /// UTF-8 string.
    String(String),
    /// Arbitrary bytes.
    Bytes(Vec<u8>),
    /// Unsigned 256-bit integer.
    Uint(Uint256),
    /// Party identity.
    Address(Identity),
    /// Boolean.
    Bool(bool),
    /// Positional struct members.
    Struct(Vec<TypedValue>),
    /// Array elements.
    Array(Vec<TypedValue>),
}

impl TypedValue {
    /// Decode a raw byte value declared with a primitive tag.
    ///
    /// This is how attestation results, which arrive as `(type, bytes)`
    /// pairs, become typed values. `path` names the field for error reports.
    pub fn from_raw(field_type: &FieldType, raw: &[u8], path: &str) -> Result<Self, EncodingError> {
        match field_type {
            FieldType::String => std::str::from_utf8(raw)
                .map(|s| Self::String(s.to_string()))
                .map_err(|_| EncodingError::InvalidUtf8 {
                    path: path.to_string(),
                }),
            FieldType::Bytes => Ok(Self::Bytes(raw.to_vec())),
            FieldType::Uint256 => Uint256::from_be_slice(raw).map(Self::Uint).ok_or(
                EncodingError::IntegerOverflow {
                    path: path.to_string(),
                    len: raw.len(),
                },
            ),
            FieldType::Address => Identity::from_slice(raw).map(Self::Address).map_err(|_| {
                EncodingError::InvalidAddress {
                    path: path.to_string(),
                    len: raw.len(),
                }
            }),
            FieldType::Bool => match raw {
                [0] => Ok(Self::Bool(false)),
                [1] => Ok(Self::Bool(true)),
                _ => Err(EncodingError::InvalidBool {
                    path: path.to_string(),
                }),
            },
            FieldType::Struct(_) | FieldType::Array(_) => Err(EncodingError::TypeMismatch {
                path: path.to_string(),
                expected: field_type.tag(),
                actual: "raw bytes".to_string(),
            }),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Uint(_) => "uint256",
            Self::Address(_) => "address",
            Self::Bool(_) => "bool",
            Self::Struct(_) => "struct",
            Self::Array(_) => "array",
        }
    }
}

impl From<&str> for TypedValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<u64> for TypedValue {
    fn from(v: u64) -> Self {
        Self::Uint(Uint256::from(v))
    }
}

impl From<Identity> for TypedValue {
    fn from(id: Identity) -> Self {
        Self::Address(id)
    }
}

impl From<bool> for TypedValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

// ─── Hashing ─────────────────────────────────────────────────────────

/// `hashStruct(descriptor, value)`.
pub fn hash_struct(
    descriptor: &TypeDescriptor,
    value: &TypedValue,
    types: &TypeSet,
) -> Result<[u8; 32], EncodingError> {
    hash_struct_at(descriptor, value, types, &descriptor.name, 0)
}

fn hash_struct_at(
    descriptor: &TypeDescriptor,
    value: &TypedValue,
    types: &TypeSet,
    path: &str,
    depth: usize,
) -> Result<[u8; 32], EncodingError> {
    if depth > MAX_DEPTH {
        return Err(EncodingError::TooDeep(MAX_DEPTH));
    }
    let TypedValue::Struct(values) = value else {
        return Err(EncodingError::TypeMismatch {
            path: path.to_string(),
            expected: descriptor.name.clone(),
            actual: value.kind().to_string(),
        });
    };
    if values.len() != descriptor.members.len() {
        return Err(EncodingError::FieldCount {
            path: path.to_string(),
            type_name: descriptor.name.clone(),
            expected: descriptor.members.len(),
            actual: values.len(),
        });
    }

    let mut buf = Vec::with_capacity(32 * (values.len() + 1));
    buf.extend_from_slice(&type_hash(descriptor, types)?);
    for (member, v) in descriptor.members.iter().zip(values) {
        let member_path = format!("{path}.{}", member.name);
        buf.extend_from_slice(&encode_field(&member.field_type, v, types, &member_path, depth)?);
    }
    Ok(keccak256(&buf))
}

fn encode_field(
    field_type: &FieldType,
    value: &TypedValue,
    types: &TypeSet,
    path: &str,
    depth: usize,
) -> Result<[u8; 32], EncodingError> {
    match (field_type, value) {
        (FieldType::String, TypedValue::String(s)) => Ok(keccak256(s.as_bytes())),
        (FieldType::Bytes, TypedValue::Bytes(b)) => Ok(keccak256(b)),
        (FieldType::Uint256, TypedValue::Uint(u)) => Ok(u.0),
        (FieldType::Address, TypedValue::Address(id)) => Ok(*id.as_bytes()),
        (FieldType::Bool, TypedValue::Bool(b)) => {
            let mut word = [0u8; 32];
            word[31] = u8::from(*b);
            Ok(word)
        }
        (FieldType::Struct(name), TypedValue::Struct(_)) => {
            let nested = types.resolve(name)?;
            hash_struct_at(nested, value, types, path, depth + 1)
        }
        (FieldType::Array(inner), TypedValue::Array(elements)) => {
            if elements.len() > MAX_ARRAY_LEN {
                return Err(EncodingError::ArrayTooLong {
                    path: path.to_string(),
                    len: elements.len(),
                    max: MAX_ARRAY_LEN,
                });
            }
            let mut buf = Vec::with_capacity(32 * elements.len());
            for (i, e) in elements.iter().enumerate() {
                let elem_path = format!("{path}[{i}]");
                buf.extend_from_slice(&encode_field(inner, e, types, &elem_path, depth)?);
            }
            Ok(keccak256(&buf))
        }
        _ => Err(EncodingError::TypeMismatch {
            path: path.to_string(),
            expected: field_type.tag(),
            actual: value.kind().to_string(),
        }),
    }
}

/// `keccak256(0x1901 ‖ hashDomain(domain) ‖ hashStruct(descriptor, value))`.
pub fn encode_message(
    domain: &SigningDomain,
    descriptor: &TypeDescriptor,
    value: &TypedValue,
    types: &TypeSet,
) -> Result<TypedDataHash, EncodingError> {
    let domain_hash = domain.hash()?;
    let struct_hash = hash_struct(descriptor, value, types)?;

    let mut buf = Vec::with_capacity(2 + 32 + 32);
    buf.extend_from_slice(&MESSAGE_PREFIX);
    buf.extend_from_slice(&domain_hash);
    buf.extend_from_slice(&struct_hash);
    Ok(TypedDataHash::new(keccak256(&buf)))
}

/// A Rust value with a fixed typed-data shape.
///
/// Implementors describe their struct type once and project themselves into
/// a [`TypedValue`]; the provided methods do the hashing.
pub trait TypedStruct {
    /// Root struct descriptor.
    fn descriptor() -> TypeDescriptor;

    /// Referenced struct types (empty when the root has only primitives).
    fn type_set() -> TypeSet {
        TypeSet::new()
    }

    /// Positional value of this instance.
    fn typed_value(&self) -> Result<TypedValue, EncodingError>;

    /// `hashStruct` of this instance.
    fn struct_hash(&self) -> Result<[u8; 32], EncodingError> {
        hash_struct(&Self::descriptor(), &self.typed_value()?, &Self::type_set())
    }

    /// Domain-separated digest that a signer signs.
    fn signing_hash(&self, domain: &SigningDomain) -> Result<TypedDataHash, EncodingError> {
        encode_message(domain, &Self::descriptor(), &self.typed_value()?, &Self::type_set())
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn record() -> TypeDescriptor {
        TypeDescriptor::new(
            "Record",
            [
                ("label", FieldType::String),
                ("amount", FieldType::Uint256),
                ("owner", FieldType::Address),
                ("flag", FieldType::Bool),
                ("blob", FieldType::Bytes),
            ],
        )
    }

    fn value(label: &str, amount: u64, owner: [u8; 32], flag: bool, blob: &[u8]) -> TypedValue {
        TypedValue::Struct(vec![
            label.into(),
            amount.into(),
            Identity(owner).into(),
            flag.into(),
            TypedValue::Bytes(blob.to_vec()),
        ])
    }

    fn domain(chain: u64) -> SigningDomain {
        SigningDomain::new("daosign", "0.1.0", chain, Identity::ZERO)
    }

    proptest! {
        /// The same triple always produces the same digest.
        #[test]
        fn encode_message_deterministic(
            label in "[a-zA-Z0-9 ]{0,24}",
            amount in any::<u64>(),
            owner in any::<[u8; 32]>(),
            flag in any::<bool>(),
            blob in prop::collection::vec(any::<u8>(), 0..64),
        ) {
            let v = value(&label, amount, owner, flag, &blob);
            let a = encode_message(&domain(1), &record(), &v, &TypeSet::new()).unwrap();
            let b = encode_message(&domain(1), &record(), &v, &TypeSet::new()).unwrap();
            prop_assert_eq!(a, b);
        }

        /// Changing the amount changes the digest.
        #[test]
        fn amount_change_detected(amount in any::<u64>(), delta in 1u64..1000) {
            let a = value("x", amount, [1; 32], true, b"");
            let b = value("x", amount.wrapping_add(delta), [1; 32], true, b"");
            prop_assert_ne!(
                encode_message(&domain(1), &record(), &a, &TypeSet::new()).unwrap(),
                encode_message(&domain(1), &record(), &b, &TypeSet::new()).unwrap()
            );
        }

        /// Flipping any single bit of the owner changes the digest.
        #[test]
        fn owner_bit_flip_detected(owner in any::<[u8; 32]>(), bit in 0usize..256) {
            let mut flipped = owner;
            flipped[bit / 8] ^= 1 << (bit % 8);
            let a = value("x", 1, owner, false, b"");
            let b = value("x", 1, flipped, false, b"");
            prop_assert_ne!(
                encode_message(&domain(1), &record(), &a, &TypeSet::new()).unwrap(),
                encode_message(&domain(1), &record(), &b, &TypeSet::new()).unwrap()
            );
        }

        /// The chain id is bound into the digest.
        #[test]
        fn chain_id_bound(c1 in any::<u64>(), c2 in any::<u64>()) {
            prop_assume!(c1 != c2);
            let v = value("x", 1, [0; 32], false, b"");
            prop_assert_ne!(
                encode_message(&domain(c1), &record(), &v, &TypeSet::new()).unwrap(),
                encode_message(&domain(c2), &record(), &v, &TypeSet::new()).unwrap()
            );
        }
    }
}
