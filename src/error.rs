//! Error types for shardkeep.

use thiserror::Error;

/// Result type for vault operations
pub type Result<T> = std::result::Result<T, VaultError>;

/// Vault error types
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Decryption failed: {0}")]
    Decryption(String),

    #[error("Prepare phase failed: {0}")]
    PrepareFailed(String),

    #[error("Durable storage unreachable - both shards and the park queue are down")]
    DurableStorageUnreachable,

    #[error("Storage error: {0}")]
    Storage(#[from] crate::store::StoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl VaultError {
    /// Logical failures that must never be papered over by degradation.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_) | Self::InvalidRequest(_)
        )
    }

    /// Infrastructure failures that degrade gracefully (park, skip, retry later).
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::DurableStorageUnreachable)
    }

    /// Errors that warrant a security-level log entry.
    pub fn is_security_critical(&self) -> bool {
        matches!(self, Self::Decryption(_))
    }
}
