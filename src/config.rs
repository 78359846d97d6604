//! Core configuration.
//!
//! Peppers, time windows and naming are fixed at startup. Missing or invalid
//! key material is a fatal `Configuration` error - the vault never starts
//! with a partial key setup.

use std::time::Duration;

use crate::crypto::Pepper;
use crate::error::{Result, VaultError};

/// Grace window for a `PENDING` record to finish committing
pub const DEFAULT_GRACE_WINDOW: Duration = Duration::from_secs(15 * 60);

/// Retention for parked writes
pub const DEFAULT_PARK_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Deadline for a single external store call
pub const DEFAULT_OP_DEADLINE: Duration = Duration::from_secs(10);

/// Key prefix for parked writes in the park queue
pub const PARK_KEY_PREFIX: &str = "temp_vault:";

/// Vault configuration
pub struct VaultConfig {
    /// Pepper for the primary shard (part A)
    pub pepper_a: Pepper,
    /// Pepper for the secondary shard (part B)
    pub pepper_b: Pepper,
    /// How long a PENDING record may live before the reaper collects it
    pub grace_window: Duration,
    /// How long a parked write is retained
    pub park_ttl: Duration,
    /// Per-call deadline for external store operations
    pub op_deadline: Duration,
    /// Table name prefix (multi-tenant deployments give each tenant its own)
    pub table_prefix: String,
}

impl VaultConfig {
    /// Build a configuration with default windows.
    pub fn new(pepper_a: Pepper, pepper_b: Pepper) -> Self {
        Self {
            pepper_a,
            pepper_b,
            grace_window: DEFAULT_GRACE_WINDOW,
            park_ttl: DEFAULT_PARK_TTL,
            op_deadline: DEFAULT_OP_DEADLINE,
            table_prefix: "vault".into(),
        }
    }

    /// Load configuration from the environment.
    ///
    /// `SHARDKEEP_PEPPER_A` and `SHARDKEEP_PEPPER_B` are required 64-char hex
    /// keys; `SHARDKEEP_TABLE_PREFIX` is optional.
    pub fn from_env() -> Result<Self> {
        let pepper_a = std::env::var("SHARDKEEP_PEPPER_A")
            .map_err(|_| VaultError::Configuration("SHARDKEEP_PEPPER_A is not set".into()))?;
        let pepper_b = std::env::var("SHARDKEEP_PEPPER_B")
            .map_err(|_| VaultError::Configuration("SHARDKEEP_PEPPER_B is not set".into()))?;

        let mut config = Self::new(Pepper::from_hex(&pepper_a)?, Pepper::from_hex(&pepper_b)?);

        if let Ok(prefix) = std::env::var("SHARDKEEP_TABLE_PREFIX") {
            config = config.with_table_prefix(&prefix)?;
        }

        Ok(config)
    }

    /// Override the table prefix. Alphanumeric and underscore only - the
    /// prefix is interpolated into SQL identifiers and cannot be a bind
    /// parameter.
    pub fn with_table_prefix(mut self, prefix: &str) -> Result<Self> {
        if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(VaultError::Configuration(format!(
                "invalid table prefix {:?}: must be alphanumeric",
                prefix
            )));
        }
        self.table_prefix = prefix.to_string();
        Ok(self)
    }
}
