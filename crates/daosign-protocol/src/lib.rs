//! # daosign-protocol: Proof Lifecycle and Attestation Service
//!
//! Turns independent per-party signatures into a single proof of agreement:
//!
//! ```text
//! register schema ─▶ create attestation (PENDING)
//!                        │  submit signature × n
//!                        ▼
//!                 policy satisfied ─▶ AGREED + ProofOfAgreement
//!                        │  creator's revoke signature
//!                        ▼
//!                     REVOKED
//! ```
//!
//! - [`AttestationService`] is the inbound interface.
//! - [`ProofLifecycle`] applies one signature or revocation to one record,
//!   all-or-nothing.
//! - [`IdentityService`] and [`Persistence`] are the outbound ports;
//!   [`MemoryStore`] is the in-process store with per-attestation locking.
//! - [`ProtocolConfig`] selects the signing domain.
//!
//! Protocol events (schema created, attestation created, proof stored,
//! agreement finalized, attestation revoked) are emitted as `tracing`
//! events at `info`; rejections at `warn`.

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod ports;
pub mod service;
pub mod view;

pub use config::{ConfigError, ProtocolConfig};
pub use error::{ErrorKind, ProtocolError};
pub use lifecycle::{ProofLifecycle, SignatureOutcome, SubmissionContext};
pub use ports::{
    IdentityService, ManualIdentityService, MemoryStore, Persistence, SystemIdentityService,
};
pub use service::AttestationService;
pub use view::AttestationView;
