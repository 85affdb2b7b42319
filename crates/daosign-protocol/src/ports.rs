//! # Outbound Ports
//!
//! The capabilities the protocol consumes but does not own:
//!
//! - [`IdentityService`]: the current time and the signing domain. The
//!   protocol never reads the wall clock or ambient chain state itself.
//! - [`Persistence`]: schema and attestation tables with per-attestation
//!   exclusive updates.
//!
//! [`MemoryStore`] is the in-process persistence. It keeps one mutex per
//! attestation record behind a table-level `RwLock`, so operations on
//! different attestations run in parallel while read-modify-write on one
//! attestation is serialized. Locks are `parking_lot` (non-poisoning) and
//! the table lock is never held while a record lock is taken.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use daosign_core::{AttestationId, SigningDomain, Timestamp};
use daosign_proof::AttestationRecord;
use daosign_schema::SchemaRegistry;

// -- Identity service ---------------------------------------------------------

/// Time and signing context supplied by the host.
pub trait IdentityService: Send + Sync {
    /// Current instant.
    fn current_timestamp(&self) -> Timestamp;

    /// Signing domain every digest is bound to.
    fn resolve_verifying_context(&self) -> SigningDomain;
}

/// Wall-clock identity service with a fixed domain.
#[derive(Debug, Clone)]
pub struct SystemIdentityService {
    domain: SigningDomain,
}

impl SystemIdentityService {
    /// Service for `domain`.
    pub fn new(domain: SigningDomain) -> Self {
        Self { domain }
    }
}

impl IdentityService for SystemIdentityService {
    fn current_timestamp(&self) -> Timestamp {
        Timestamp::now()
    }

    fn resolve_verifying_context(&self) -> SigningDomain {
        self.domain.clone()
    }
}

/// Identity service with a caller-driven clock, for tests and replays.
#[derive(Debug)]
pub struct ManualIdentityService {
    domain: SigningDomain,
    now: Mutex<Timestamp>,
}

impl ManualIdentityService {
    /// Clock starting at `now`.
    pub fn new(domain: SigningDomain, now: Timestamp) -> Self {
        Self {
            domain,
            now: Mutex::new(now),
        }
    }

    /// Set the clock.
    pub fn set(&self, now: Timestamp) {
        *self.now.lock() = now;
    }

    /// Move the clock forward.
    pub fn advance(&self, secs: u64) {
        let mut now = self.now.lock();
        *now = now.plus_secs(secs);
    }
}

impl IdentityService for ManualIdentityService {
    fn current_timestamp(&self) -> Timestamp {
        *self.now.lock()
    }

    fn resolve_verifying_context(&self) -> SigningDomain {
        self.domain.clone()
    }
}

impl<T: IdentityService + ?Sized> IdentityService for Arc<T> {
    fn current_timestamp(&self) -> Timestamp {
        (**self).current_timestamp()
    }

    fn resolve_verifying_context(&self) -> SigningDomain {
        (**self).resolve_verifying_context()
    }
}

// -- Persistence --------------------------------------------------------------

/// Schema and attestation storage with per-attestation atomic updates.
///
/// Schemas are immutable once registered and are never removed, so an
/// attestation's schema id always resolves.
pub trait Persistence: Send + Sync {
    /// Read the schema registry.
    fn read_schemas<R>(&self, f: impl FnOnce(&SchemaRegistry) -> R) -> R;

    /// Mutate the schema registry under its exclusive lock.
    fn write_schemas<R>(&self, f: impl FnOnce(&mut SchemaRegistry) -> R) -> R;

    /// Store a new record built for the next attestation id.
    fn insert_attestation(
        &self,
        build: impl FnOnce(AttestationId) -> AttestationRecord,
    ) -> AttestationId;

    /// Snapshot of one record.
    fn load_attestation(&self, id: AttestationId) -> Option<AttestationRecord>;

    /// Atomically read-validate-update one record.
    ///
    /// The closure runs under that record's exclusive lock. It must leave
    /// the record untouched when it returns `Err`. Returns `None` if the
    /// record does not exist.
    fn try_update_attestation<R, E>(
        &self,
        id: AttestationId,
        f: impl FnOnce(&mut AttestationRecord) -> Result<R, E>,
    ) -> Option<Result<R, E>>;

    /// Visit every record in id order, each under its own lock.
    fn scan_attestations(&self, f: impl FnMut(&AttestationRecord));
}

#[derive(Debug)]
struct AttestationTable {
    next_id: u64,
    records: BTreeMap<AttestationId, Arc<Mutex<AttestationRecord>>>,
}

/// In-memory [`Persistence`].
#[derive(Debug, Clone)]
pub struct MemoryStore {
    schemas: Arc<RwLock<SchemaRegistry>>,
    attestations: Arc<RwLock<AttestationTable>>,
}

impl MemoryStore {
    /// First attestation id handed out.
    pub const FIRST_ATTESTATION_ID: AttestationId = AttestationId(1);

    /// Empty store whose schema hashes are bound to `domain`.
    pub fn new(domain: SigningDomain) -> Self {
        Self {
            schemas: Arc::new(RwLock::new(SchemaRegistry::new(domain))),
            attestations: Arc::new(RwLock::new(AttestationTable {
                next_id: Self::FIRST_ATTESTATION_ID.value(),
                records: BTreeMap::new(),
            })),
        }
    }

    /// Number of stored attestations.
    pub fn attestation_count(&self) -> usize {
        self.attestations.read().records.len()
    }

    fn record(&self, id: AttestationId) -> Option<Arc<Mutex<AttestationRecord>>> {
        self.attestations.read().records.get(&id).cloned()
    }
}

impl Persistence for MemoryStore {
    fn read_schemas<R>(&self, f: impl FnOnce(&SchemaRegistry) -> R) -> R {
        f(&self.schemas.read())
    }

    fn write_schemas<R>(&self, f: impl FnOnce(&mut SchemaRegistry) -> R) -> R {
        f(&mut self.schemas.write())
    }

    fn insert_attestation(
        &self,
        build: impl FnOnce(AttestationId) -> AttestationRecord,
    ) -> AttestationId {
        let mut table = self.attestations.write();
        let id = AttestationId(table.next_id);
        table.next_id += 1;
        table.records.insert(id, Arc::new(Mutex::new(build(id))));
        id
    }

    fn load_attestation(&self, id: AttestationId) -> Option<AttestationRecord> {
        self.record(id).map(|r| r.lock().clone())
    }

    fn try_update_attestation<R, E>(
        &self,
        id: AttestationId,
        f: impl FnOnce(&mut AttestationRecord) -> Result<R, E>,
    ) -> Option<Result<R, E>> {
        let record = self.record(id)?;
        let mut guard = record.lock();
        Some(f(&mut guard))
    }

    fn scan_attestations(&self, mut f: impl FnMut(&AttestationRecord)) {
        let records: Vec<_> = self.attestations.read().records.values().cloned().collect();
        for record in records {
            f(&record.lock());
        }
    }
}
