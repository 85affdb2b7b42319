//! # daosign-state: Attestation Lifecycle
//!
//! Implements the attestation state machine:
//!
//! - **Attestation** (`attestation.rs`): `Pending → Agreed → Revoked`, with a
//!   direct `Pending → Revoked` edge only when the schema permits revocation
//!   before agreement.
//!
//! ## Design
//!
//! The state is a closed enum and every transition goes through a method
//! that checks the current state first. Each mutating method has a
//! side-effect-free `check_*` twin so a caller can validate a whole
//! operation before touching any state.

pub mod attestation;

pub use attestation::{
    AttestationLifecycle, AttestationState, RevocationRules, StateError, TransitionRecord,
};
