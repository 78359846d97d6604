//! Store collaborator contracts.
//!
//! The core consumes two independent relational shard stores and one
//! key-value park queue. Engines are external; this module defines the
//! contracts plus the bundled adapters (`sqlite`, `memory`).

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

pub use memory::MemoryParkStore;
pub use sqlite::SqliteShardStore;

/// Store-level error type
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),

    #[error("store unreachable: {0}")]
    Unreachable(String),

    #[error("operation deadline exceeded")]
    DeadlineExceeded,
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

/// Apply a per-call deadline to a store operation. An expired deadline is
/// treated exactly like an unreachable store.
pub async fn with_deadline<T>(
    deadline: Duration,
    op: impl Future<Output = Result<T, StoreError>>,
) -> Result<T, StoreError> {
    match tokio::time::timeout(deadline, op).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::DeadlineExceeded),
    }
}

/// Lifecycle state of a shard row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShardStatus {
    /// Prepared, not yet confirmed committed on both shards
    Pending,
    /// Confirmed on both shards
    Active,
}

impl ShardStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Active => "ACTIVE",
        }
    }
}

/// Row inserted during the prepare phase
pub struct NewShardRow {
    pub id: Uuid,
    pub owner_hash: String,
    /// Pepper-encrypted part (self-describing token bytes)
    pub content: Vec<u8>,
    /// IV material of the pre-split encryption, carried alongside
    pub iv: String,
    pub order_index: i64,
    /// Reaper collects the row if still PENDING past this instant
    pub cleanup_deadline: DateTime<Utc>,
}

/// Row returned by the read path
pub struct ShardRow {
    pub id: Uuid,
    pub content: Vec<u8>,
    pub iv: String,
    pub order_index: i64,
}

/// One of the two independent relational stores, each holding half of every
/// secret. Individual operations are retry-free; only row-level atomicity is
/// assumed.
#[async_trait]
pub trait ShardStore: Send + Sync {
    /// Insert a row with status PENDING.
    async fn insert_pending(&self, row: &NewShardRow) -> Result<(), StoreError>;

    /// Flip a row's status to ACTIVE.
    async fn mark_active(&self, id: Uuid) -> Result<(), StoreError>;

    /// All ACTIVE rows for an owner, ordered by `order_index`.
    async fn fetch_active_by_owner(&self, owner_hash: &str) -> Result<Vec<ShardRow>, StoreError>;

    /// Update a row's order index, scoped to its owner. Never touches
    /// content or status.
    async fn update_order(
        &self,
        id: Uuid,
        owner_hash: &str,
        order_index: i64,
    ) -> Result<(), StoreError>;

    /// Delete one row by id.
    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;

    /// Bulk delete by id set. Returns the number of rows removed.
    async fn delete_many(&self, ids: &[Uuid]) -> Result<usize, StoreError>;

    /// Delete every row belonging to an owner. Returns the number removed.
    async fn delete_by_owner(&self, owner_hash: &str) -> Result<usize, StoreError>;

    /// Ids of PENDING rows whose cleanup deadline is in the past.
    async fn expired_pending(&self, now: DateTime<Utc>) -> Result<Vec<Uuid>, StoreError>;

    /// Remove all rows.
    async fn truncate(&self) -> Result<(), StoreError>;

    /// Connectivity probe.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Key-value overflow buffer for writes that could not reach the shards.
/// Enumeration returns all live (unexpired) keys; no ordering is guaranteed.
#[async_trait]
pub trait ParkStore: Send + Sync {
    /// Store a value under a key with an expiry.
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Fetch a live value, or None if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Remove a key. Removing an absent key is a no-op.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// All live keys starting with `prefix`.
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError>;

    /// Drop everything.
    async fn flush(&self) -> Result<(), StoreError>;

    /// Connectivity probe.
    async fn ping(&self) -> Result<(), StoreError>;
}
