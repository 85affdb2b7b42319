//! Protocol configuration.
//!
//! Selects the signing domain. Defaults suit local use; override through
//! environment variables or explicit construction.

use daosign_core::{Identity, SigningDomain};

/// Signing-domain configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolConfig {
    /// Domain name. Default: `daosign`.
    pub domain_name: String,
    /// Domain version. Default: `0.1.0`.
    pub domain_version: String,
    /// Chain id. Default: `1`.
    pub chain_id: u64,
    /// Verifying contract identity. Default: the zero identity.
    pub verifying_contract: Identity,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            domain_name: "daosign".to_string(),
            domain_version: "0.1.0".to_string(),
            chain_id: 1,
            verifying_contract: Identity::ZERO,
        }
    }
}

impl ProtocolConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `DAOSIGN_DOMAIN_NAME` (default: `daosign`)
    /// - `DAOSIGN_DOMAIN_VERSION` (default: `0.1.0`)
    /// - `DAOSIGN_CHAIN_ID` (default: `1`)
    /// - `DAOSIGN_VERIFYING_CONTRACT` (default: 64 zero hex digits)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let chain_id = match lookup("DAOSIGN_CHAIN_ID") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid("DAOSIGN_CHAIN_ID".to_string(), raw))?,
            None => defaults.chain_id,
        };
        let verifying_contract = match lookup("DAOSIGN_VERIFYING_CONTRACT") {
            Some(raw) => Identity::from_hex(&raw).map_err(|e| {
                ConfigError::Invalid("DAOSIGN_VERIFYING_CONTRACT".to_string(), e.to_string())
            })?,
            None => defaults.verifying_contract,
        };
        Ok(Self {
            domain_name: lookup("DAOSIGN_DOMAIN_NAME").unwrap_or(defaults.domain_name),
            domain_version: lookup("DAOSIGN_DOMAIN_VERSION").unwrap_or(defaults.domain_version),
            chain_id,
            verifying_contract,
        })
    }

    /// The signing domain this configuration selects.
    pub fn domain(&self) -> SigningDomain {
        SigningDomain::new(
            &self.domain_name,
            &self.domain_version,
            self.chain_id,
            self.verifying_contract,
        )
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}
