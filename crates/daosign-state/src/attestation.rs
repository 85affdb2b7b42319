//! # Attestation Lifecycle State Machine
//!
//! ## States
//!
//! ```text
//! Pending ──▶ Agreed ──▶ Revoked (terminal)
//!    │                      ▲
//!    └──────────────────────┘  only with `revocable_before_agreement`
//! ```
//!
//! The machine is driven by the proof lifecycle: `agree` once the
//! signatory policy is satisfied, `revoke` once the creator's revocation
//! signature has been verified. Every transition is logged with the instant
//! supplied by the caller; this module never reads the wall clock.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use daosign_core::Timestamp;

// ─── Attestation State ───────────────────────────────────────────────

/// The lifecycle state of an attestation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttestationState {
    /// Created, collecting signatures.
    Pending,
    /// Signatory policy satisfied; a proof of agreement exists.
    Agreed,
    /// Revoked by its creator (terminal).
    Revoked,
}

impl AttestationState {
    /// Whether this state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Revoked)
    }

    /// Whether new signatures may still change the outcome.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for AttestationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Agreed => "AGREED",
            Self::Revoked => "REVOKED",
        };
        f.write_str(s)
    }
}

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors that can occur during attestation lifecycle transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// Attempted transition is not valid from the current state.
    #[error("invalid attestation transition: {from} -> {to}")]
    InvalidTransition {
        /// Current state.
        from: AttestationState,
        /// Attempted target state.
        to: AttestationState,
    },

    /// Attestation is in a terminal state.
    #[error("attestation is in terminal state {state}")]
    TerminalState {
        /// The terminal state.
        state: AttestationState,
    },

    /// The schema does not allow revocation at all.
    #[error("attestations of this schema are not revocable")]
    NotRevocable,
}

// ─── Revocation rules ────────────────────────────────────────────────

/// Schema-level switches governing the `Revoked` transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RevocationRules {
    /// Revocation is permitted at all.
    pub revocable: bool,
    /// Revocation is permitted while still `Pending`.
    pub before_agreement: bool,
}

// ─── Transition Log ──────────────────────────────────────────────────

/// Record of an attestation state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// State before the transition.
    pub from_state: AttestationState,
    /// State after the transition.
    pub to_state: AttestationState,
    /// When the transition occurred.
    pub timestamp: Timestamp,
    /// Reason for the transition.
    pub reason: String,
}

// ─── Lifecycle ───────────────────────────────────────────────────────

/// An attestation's lifecycle state with its transition history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationLifecycle {
    /// Current lifecycle state.
    pub state: AttestationState,
    /// When the attestation was created.
    pub created_at: Timestamp,
    /// When the policy was satisfied.
    pub agreed_at: Option<Timestamp>,
    /// When the attestation was revoked.
    pub revoked_at: Option<Timestamp>,
    /// Ordered log of all state transitions.
    pub transitions: Vec<TransitionRecord>,
}

impl AttestationLifecycle {
    /// A fresh lifecycle in `Pending`.
    pub fn new(created_at: Timestamp) -> Self {
        Self {
            state: AttestationState::Pending,
            created_at,
            agreed_at: None,
            revoked_at: None,
            transitions: Vec::new(),
        }
    }

    /// Check that `agree` would succeed, without mutating.
    pub fn check_agree(&self) -> Result<(), StateError> {
        self.require_state(AttestationState::Pending, AttestationState::Agreed)
    }

    /// Policy satisfied (PENDING → AGREED).
    pub fn agree(&mut self, at: Timestamp, reason: &str) -> Result<(), StateError> {
        self.check_agree()?;
        self.agreed_at = Some(at);
        self.do_transition(AttestationState::Agreed, at, reason);
        Ok(())
    }

    /// Check that `revoke` would succeed under `rules`, without mutating.
    pub fn check_revoke(&self, rules: RevocationRules) -> Result<(), StateError> {
        if self.state.is_terminal() {
            return Err(StateError::TerminalState { state: self.state });
        }
        if !rules.revocable {
            return Err(StateError::NotRevocable);
        }
        match self.state {
            AttestationState::Agreed => Ok(()),
            AttestationState::Pending if rules.before_agreement => Ok(()),
            from => Err(StateError::InvalidTransition {
                from,
                to: AttestationState::Revoked,
            }),
        }
    }

    /// Revoke (AGREED → REVOKED, or PENDING → REVOKED when permitted).
    pub fn revoke(
        &mut self,
        at: Timestamp,
        rules: RevocationRules,
        reason: &str,
    ) -> Result<(), StateError> {
        self.check_revoke(rules)?;
        self.revoked_at = Some(at);
        self.do_transition(AttestationState::Revoked, at, reason);
        Ok(())
    }

    /// Whether the attestation is currently agreed and not revoked.
    pub fn is_agreed(&self) -> bool {
        self.state == AttestationState::Agreed
    }

    fn require_state(
        &self,
        expected: AttestationState,
        target: AttestationState,
    ) -> Result<(), StateError> {
        if self.state.is_terminal() {
            return Err(StateError::TerminalState { state: self.state });
        }
        if self.state != expected {
            return Err(StateError::InvalidTransition {
                from: self.state,
                to: target,
            });
        }
        Ok(())
    }

    fn do_transition(&mut self, to: AttestationState, at: Timestamp, reason: &str) {
        self.transitions.push(TransitionRecord {
            from_state: self.state,
            to_state: to,
            timestamp: at,
            reason: reason.to_string(),
        });
        self.state = to;
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
