//! # Temporal Types: UTC-Only Timestamps
//!
//! Defines `Timestamp`, a UTC, second-precision instant. Timestamps enter
//! typed-data hashes as `uint256` unix seconds, so sub-second components are
//! discarded at construction; two timestamps that hash the same compare equal.
//!
//! The protocol never reads the wall clock itself. Every "now" is supplied by
//! the caller's identity service and passed in explicitly.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EncodingError, ValidationError};

/// A UTC-only timestamp, truncated to seconds precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current UTC time, truncated to seconds.
    pub fn now() -> Self {
        Self::from_utc(Utc::now())
    }

    /// From a `DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt.with_nanosecond(0).unwrap_or(dt))
    }

    /// From unix epoch seconds.
    pub fn from_epoch_secs(secs: i64) -> Result<Self, ValidationError> {
        DateTime::from_timestamp(secs, 0)
            .map(Self)
            .ok_or(ValidationError::InvalidTimestamp(secs))
    }

    /// Unix epoch seconds.
    pub fn epoch_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// Whether this instant precedes the unix epoch.
    pub fn is_pre_epoch(&self) -> bool {
        self.0.timestamp() < 0
    }

    /// Unix epoch seconds as used in typed-data encoding. Instants before
    /// the epoch have no `uint256` encoding and are rejected.
    pub fn hash_secs(&self) -> Result<u64, EncodingError> {
        let secs = self.0.timestamp();
        u64::try_from(secs).map_err(|_| EncodingError::PreEpochTimestamp(secs))
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// This instant shifted forward by `secs` seconds, saturating.
    pub fn plus_secs(&self, secs: u64) -> Self {
        i64::try_from(secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .and_then(|delta| self.0.checked_add_signed(delta))
            .map_or(Self(DateTime::<Utc>::MAX_UTC), Self)
    }

    /// Render as ISO8601 with Z suffix (e.g. `2026-01-15T12:00:00Z`).
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_subseconds() {
        let dt = DateTime::from_timestamp(1_700_000_000, 999_000_000).unwrap();
        let ts = Timestamp::from_utc(dt);
        assert_eq!(ts, Timestamp::from_epoch_secs(1_700_000_000).unwrap());
    }

    #[test]
    fn iso8601_format() {
        let ts = Timestamp::from_epoch_secs(0).unwrap();
        assert_eq!(ts.to_string(), "1970-01-01T00:00:00Z");
    }

    #[test]
    fn plus_secs_and_ordering() {
        let ts = Timestamp::from_epoch_secs(100).unwrap();
        let later = ts.plus_secs(50);
        assert_eq!(later.epoch_secs(), 150);
        assert!(later > ts);
    }

    #[test]
    fn pre_epoch_instants_have_no_hash_encoding() {
        let ts = Timestamp::from_epoch_secs(-5).unwrap();
        assert!(ts.is_pre_epoch());
        assert_eq!(ts.hash_secs(), Err(EncodingError::PreEpochTimestamp(-5)));

        let epoch = Timestamp::from_epoch_secs(0).unwrap();
        assert!(!epoch.is_pre_epoch());
        assert_eq!(epoch.hash_secs(), Ok(0));
    }
}
