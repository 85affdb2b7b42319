//! # Signatory Policy and Authority Evaluation
//!
//! A [`SignatoryPolicy`] is the schema's Proof of Authority: the listed
//! signer identities, each with a signing-order position, the mode that
//! decides when enough of them have signed, and optional prerequisites a
//! signer must hold before their signature is accepted.
//!
//! ## Modes
//!
//! | Mode | Satisfied when |
//! |------|----------------|
//! | `All` | every listed identity has signed |
//! | `Threshold { required: m }` | at least `m` distinct listed identities have signed |
//! | `Ordered` | every listed identity has signed; a signer only counts once every signer at a lower position has signed |
//!
//! ## Positions
//!
//! The distinct positions used by a policy must be exactly `0..=k` for some
//! `k`. Signers may share a position, which makes them a parallel stage in
//! `Ordered` mode. Policies that do not care about order leave every
//! position at `0`.
//!
//! ## Prerequisites
//!
//! Each prerequisite names schema ids and an operator. A signer *holds* a
//! schema when they are the recipient of an agreed, unrevoked attestation of
//! it; the caller supplies that lookup. Every prerequisite must pass.
//!
//! Evaluation never mutates anything and is monotone: adding identities to
//! a satisfying set keeps it satisfying.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use daosign_core::{FieldType, Identity, SchemaId, TypeDescriptor, TypedValue, Uint256};

use crate::error::{Violation, Violations};

/// How many listed signers must sign, and in what order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PolicyMode {
    /// Every listed identity.
    All,
    /// At least `required` distinct listed identities.
    Threshold {
        /// `M` in M-of-N.
        required: u32,
    },
    /// Every listed identity, counted in position order.
    Ordered,
}

impl PolicyMode {
    /// Tag used in the schema's typed-data encoding.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::All => "ALL",
            Self::Threshold { .. } => "THRESHOLD",
            Self::Ordered => "ORDERED",
        }
    }
}

/// One listed signer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signatory {
    /// The signer's public identity.
    pub identity: Identity,
    /// Signing-order position, starting at 0.
    #[serde(default)]
    pub position: u32,
    /// Free-text role ("Main Signatory").
    #[serde(default)]
    pub description: String,
}

/// Boolean combinator over held schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PrerequisiteOperator {
    /// Every listed schema is held.
    And,
    /// At least one listed schema is held.
    Or,
    /// No listed schema is held.
    Not,
}

impl PrerequisiteOperator {
    /// Tag used in the schema's typed-data encoding.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
        }
    }
}

/// A condition on attestations the signer must (or must not) hold.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Prerequisite {
    /// How the held schemas are combined.
    pub operator: PrerequisiteOperator,
    /// Schemas referenced by the condition.
    pub schema_ids: Vec<SchemaId>,
    /// Free-text explanation.
    #[serde(default)]
    pub description: String,
}

impl Prerequisite {
    /// Evaluate against a holdings lookup.
    pub fn is_met(&self, holds: impl Fn(SchemaId) -> bool) -> bool {
        match self.operator {
            PrerequisiteOperator::And => self.schema_ids.iter().all(|id| holds(*id)),
            PrerequisiteOperator::Or => self.schema_ids.iter().any(|id| holds(*id)),
            PrerequisiteOperator::Not => !self.schema_ids.iter().any(|id| holds(*id)),
        }
    }
}

/// The signer set and satisfaction rule of a schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignatoryPolicy {
    /// Satisfaction rule.
    pub mode: PolicyMode,
    /// Listed signers, in declaration order.
    pub signatories: Vec<Signatory>,
    /// Conditions every signer must meet.
    #[serde(default)]
    pub prerequisites: Vec<Prerequisite>,
}

impl SignatoryPolicy {
    /// Every identity must sign, in any order.
    pub fn all(identities: impl IntoIterator<Item = Identity>) -> Self {
        Self::unordered(PolicyMode::All, identities)
    }

    /// `required` of the identities must sign, in any order.
    pub fn threshold(required: u32, identities: impl IntoIterator<Item = Identity>) -> Self {
        Self::unordered(PolicyMode::Threshold { required }, identities)
    }

    /// Every identity must sign, in the given order.
    pub fn ordered(identities: impl IntoIterator<Item = Identity>) -> Self {
        Self {
            mode: PolicyMode::Ordered,
            signatories: identities
                .into_iter()
                .zip(0u32..)
                .map(|(identity, position)| Signatory {
                    identity,
                    position,
                    description: String::new(),
                })
                .collect(),
            prerequisites: Vec::new(),
        }
    }

    fn unordered(mode: PolicyMode, identities: impl IntoIterator<Item = Identity>) -> Self {
        Self {
            mode,
            signatories: identities
                .into_iter()
                .map(|identity| Signatory {
                    identity,
                    position: 0,
                    description: String::new(),
                })
                .collect(),
            prerequisites: Vec::new(),
        }
    }

    /// Builder-style prerequisite.
    pub fn with_prerequisite(mut self, prerequisite: Prerequisite) -> Self {
        self.prerequisites.push(prerequisite);
        self
    }

    /// The listed entry for `identity`, if any.
    pub fn signatory(&self, identity: &Identity) -> Option<&Signatory> {
        self.signatories.iter().find(|s| &s.identity == identity)
    }

    /// Whether `identity` is a listed signer.
    pub fn is_listed(&self, identity: &Identity) -> bool {
        self.signatory(identity).is_some()
    }

    /// Number of distinct signatures needed for satisfaction.
    pub fn required_count(&self) -> usize {
        match self.mode {
            PolicyMode::Threshold { required } => required as usize,
            PolicyMode::All | PolicyMode::Ordered => self.signatories.len(),
        }
    }

    /// Structural problems with this policy. Empty when well formed.
    pub fn violations(&self) -> Violations {
        let mut out = Violations::default();

        if self.signatories.is_empty() {
            out.push(Violation::new("policy.signatories", "policy lists no signatories"));
        }

        let mut seen = BTreeSet::new();
        for (i, s) in self.signatories.iter().enumerate() {
            let path = format!("policy.signatories[{i}]");
            if s.identity.is_zero() {
                out.push(Violation::new(&path, "signer identity is the zero identity"));
            }
            if !seen.insert(s.identity) {
                out.push(Violation::new(
                    &path,
                    format!("identity {} is listed more than once", s.identity),
                ));
            }
        }

        if let PolicyMode::Threshold { required } = self.mode {
            if required == 0 {
                out.push(Violation::new("policy.mode.required", "threshold must be at least 1"));
            } else if required as usize > self.signatories.len() {
                out.push(Violation::new(
                    "policy.mode.required",
                    format!(
                        "threshold {required} exceeds the {} listed signers",
                        self.signatories.len()
                    ),
                ));
            }
        }

        let positions: BTreeSet<u32> = self.signatories.iter().map(|s| s.position).collect();
        if let Some(gap) = (0u32..).zip(&positions).find(|(want, got)| want != *got) {
            out.push(Violation::new(
                "policy.signatories",
                format!(
                    "signing positions must be contiguous from 0; position {} is missing",
                    gap.0
                ),
            ));
        }

        for (i, p) in self.prerequisites.iter().enumerate() {
            if p.schema_ids.is_empty() {
                out.push(Violation::new(
                    format!("policy.prerequisites[{i}]"),
                    "prerequisite references no schemas",
                ));
            }
        }

        out
    }

    /// Listed signers whose signatures currently count, in policy order.
    ///
    /// In `Ordered` mode a signer counts only once every signer at a lower
    /// position has signed; later signatures are stored but do not count.
    /// Identities not listed in the policy never count.
    pub fn counting_signers(&self, collected: &BTreeSet<Identity>) -> Vec<Identity> {
        match self.mode {
            PolicyMode::All | PolicyMode::Threshold { .. } => self
                .signatories
                .iter()
                .filter(|s| collected.contains(&s.identity))
                .map(|s| s.identity)
                .collect(),
            PolicyMode::Ordered => {
                let mut stages: BTreeMap<u32, Vec<Identity>> = BTreeMap::new();
                for s in &self.signatories {
                    stages.entry(s.position).or_default().push(s.identity);
                }
                let mut out = Vec::new();
                for stage in stages.values() {
                    let present: Vec<Identity> = stage
                        .iter()
                        .filter(|id| collected.contains(id))
                        .copied()
                        .collect();
                    let complete = present.len() == stage.len();
                    out.extend(present);
                    if !complete {
                        break;
                    }
                }
                out
            }
        }
    }

    /// Whether the collected identities satisfy the policy.
    pub fn is_satisfied(&self, collected: &BTreeSet<Identity>) -> bool {
        if self.signatories.is_empty() {
            return false;
        }
        self.counting_signers(collected).len() >= self.required_count()
    }

    /// Whether a signer with the given holdings meets every prerequisite.
    pub fn prerequisites_met(&self, holds: impl Fn(SchemaId) -> bool) -> bool {
        self.prerequisites.iter().all(|p| p.is_met(&holds))
    }

    // ── typed-data projection ───────────────────────────────────────

    pub(crate) fn type_descriptors() -> [TypeDescriptor; 3] {
        [
            TypeDescriptor::new(
                "SignatoryPolicy",
                [
                    ("mode", FieldType::String),
                    ("threshold", FieldType::Uint256),
                    (
                        "signatories",
                        FieldType::Array(Box::new(FieldType::Struct("Signatory".into()))),
                    ),
                    (
                        "prerequisites",
                        FieldType::Array(Box::new(FieldType::Struct("Prerequisite".into()))),
                    ),
                ],
            ),
            TypeDescriptor::new(
                "Signatory",
                [
                    ("identity", FieldType::Address),
                    ("position", FieldType::Uint256),
                    ("description", FieldType::String),
                ],
            ),
            TypeDescriptor::new(
                "Prerequisite",
                [
                    ("operator", FieldType::String),
                    ("schemaIds", FieldType::Array(Box::new(FieldType::Uint256))),
                    ("description", FieldType::String),
                ],
            ),
        ]
    }

    pub(crate) fn typed_value(&self) -> TypedValue {
        let signatories = self
            .signatories
            .iter()
            .map(|s| {
                TypedValue::Struct(vec![
                    s.identity.into(),
                    u64::from(s.position).into(),
                    s.description.as_str().into(),
                ])
            })
            .collect();
        let prerequisites = self
            .prerequisites
            .iter()
            .map(|p| {
                TypedValue::Struct(vec![
                    p.operator.tag().into(),
                    TypedValue::Array(p.schema_ids.iter().map(|id| id.value().into()).collect()),
                    p.description.as_str().into(),
                ])
            })
            .collect();
        TypedValue::Struct(vec![
            self.mode.tag().into(),
            TypedValue::Uint(Uint256::from(self.required_count() as u64)),
            TypedValue::Array(signatories),
            TypedValue::Array(prerequisites),
        ])
    }
}

/// Whether `collected` satisfies `policy`. Duplicates count once.
pub fn is_satisfied<'a>(
    policy: &SignatoryPolicy,
    collected: impl IntoIterator<Item = &'a Identity>,
) -> bool {
    let set: BTreeSet<Identity> = collected.into_iter().copied().collect();
    policy.is_satisfied(&set)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(b: u8) -> Identity {
        Identity([b; 32])
    }

    fn set(ids: &[u8]) -> BTreeSet<Identity> {
        ids.iter().map(|b| id(*b)).collect()
    }

    #[test]
    fn all_mode_requires_everyone() {
        let p = SignatoryPolicy::all([id(1), id(2), id(3)]);
        assert!(!p.is_satisfied(&set(&[1, 2])));
        assert!(p.is_satisfied(&set(&[1, 2, 3])));
        assert!(p.is_satisfied(&set(&[3, 2, 1, 9])));
    }

    #[test]
    fn threshold_counts_distinct_listed_identities() {
        let p = SignatoryPolicy::threshold(2, [id(1), id(2), id(3)]);
        assert!(!p.is_satisfied(&set(&[1])));
        assert!(!p.is_satisfied(&set(&[1, 9])));
        assert!(p.is_satisfied(&set(&[1, 3])));
        assert!(!is_satisfied(&p, &[id(1), id(1)]));
        assert!(is_satisfied(&p, &[id(1), id(1), id(2)]));
    }

    #[test]
    fn ordered_mode_ignores_signers_after_a_gap() {
        let p = SignatoryPolicy::ordered([id(1), id(2), id(3)]);
        assert_eq!(p.counting_signers(&set(&[2, 3])), Vec::<Identity>::new());
        assert_eq!(p.counting_signers(&set(&[1, 3])), vec![id(1)]);
        assert!(!p.is_satisfied(&set(&[1, 3])));
        assert!(p.is_satisfied(&set(&[1, 2, 3])));
    }

    #[test]
    fn ordered_mode_parallel_stage() {
        let mut p = SignatoryPolicy::ordered([id(1), id(2), id(3)]);
        p.signatories[2].position = 1;
        assert!(p.violations().is_empty());
        assert_eq!(p.counting_signers(&set(&[1, 3])), vec![id(1), id(3)]);
        assert!(p.is_satisfied(&set(&[1, 2, 3])));
    }

    #[test]
    fn threshold_above_signer_count_is_violation() {
        let p = SignatoryPolicy::threshold(4, [id(1), id(2), id(3)]);
        let v = p.violations();
        assert_eq!(v.len(), 1);
        assert!(v.any_at("policy.mode.required"));
    }

    #[test]
    fn zero_threshold_is_violation() {
        assert!(!SignatoryPolicy::threshold(0, [id(1)]).violations().is_empty());
    }

    #[test]
    fn non_contiguous_positions_are_violation() {
        let mut p = SignatoryPolicy::ordered([id(1), id(2)]);
        p.signatories[1].position = 2;
        let v = p.violations();
        assert!(v.violations()[0].message.contains("position 1 is missing"));
    }

    #[test]
    fn positions_must_start_at_zero() {
        let mut p = SignatoryPolicy::all([id(1)]);
        p.signatories[0].position = 1;
        assert!(!p.violations().is_empty());
    }

    #[test]
    fn duplicate_and_zero_identities_are_violations() {
        let p = SignatoryPolicy::all([id(1), id(1), Identity::ZERO]);
        assert_eq!(p.violations().len(), 2);
    }

    #[test]
    fn empty_policy_is_violation_and_never_satisfied() {
        let p = SignatoryPolicy::all([]);
        assert!(!p.violations().is_empty());
        assert!(!p.is_satisfied(&set(&[1])));
    }

    #[test]
    fn prerequisite_operators() {
        let held = |id: SchemaId| id == SchemaId(1);
        let and = Prerequisite {
            operator: PrerequisiteOperator::And,
            schema_ids: vec![SchemaId(1), SchemaId(2)],
            description: String::new(),
        };
        let or = Prerequisite {
            operator: PrerequisiteOperator::Or,
            ..and.clone()
        };
        let not = Prerequisite {
            operator: PrerequisiteOperator::Not,
            ..and.clone()
        };
        assert!(!and.is_met(held));
        assert!(or.is_met(held));
        assert!(!not.is_met(held));
        assert!(not.is_met(|_| false));
    }

    #[test]
    fn policy_serde_yaml() {
        let yaml = format!(
            "mode:\n  kind: threshold\n  required: 1\nsignatories:\n  - identity: \"{}\"\nprerequisites:\n  - operator: NOT\n    schema_ids: [3]\n",
            id(5).to_hex()
        );
        let p: SignatoryPolicy = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(p.mode, PolicyMode::Threshold { required: 1 });
        assert_eq!(p.signatories[0].position, 0);
        assert_eq!(p.prerequisites[0].operator, PrerequisiteOperator::Not);
        assert!(p.violations().is_empty());
    }
}
