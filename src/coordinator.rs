//! Vault coordinator - the write path.
//!
//! A save splits the payload, encrypts each half under its shard's pepper,
//! and runs a two-phase protocol across both shards: insert PENDING rows,
//! then flip both to ACTIVE. When the shards cannot be reached, the full
//! request is parked in the key-value queue and replayed by the sync worker.

use std::future::Future;
use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::config::{VaultConfig, PARK_KEY_PREFIX};
use crate::crypto::aead;
use crate::error::{Result, VaultError};
use crate::logging::{LogLevel, LogSink};
use crate::park::ParkedWrite;
use crate::splitter;
use crate::store::{NewShardRow, ParkStore, ShardStore, StoreError};

/// Largest accepted reorder batch
const MAX_REORDER_BATCH: usize = 500;

/// Minimum owner hash length accepted on any operation
const MIN_OWNER_HASH_LEN: usize = 32;

/// How a save reacts to shard failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Degrade to the park queue when the shards are unreachable
    WriteThrough,
    /// Surface shard failures to the caller (used by the sync worker)
    ForceDirect,
}

/// Validated save input
#[derive(Debug, Clone)]
pub struct SaveRequest {
    pub id: Uuid,
    pub owner_hash: String,
    /// Opaque pre-split payload (already ciphertext from the caller's side)
    pub payload: Vec<u8>,
    /// IV material of the payload's own encryption, carried alongside
    pub iv: String,
    pub order_index: i64,
}

impl SaveRequest {
    /// Reject malformed input before it reaches any store.
    pub fn validate(&self) -> Result<()> {
        if self.owner_hash.len() < MIN_OWNER_HASH_LEN {
            return Err(VaultError::InvalidRequest(format!(
                "owner hash must be at least {} chars",
                MIN_OWNER_HASH_LEN
            )));
        }
        if self.payload.is_empty() {
            return Err(VaultError::InvalidRequest("payload is empty".into()));
        }
        if self.iv.is_empty() {
            return Err(VaultError::InvalidRequest("iv material is empty".into()));
        }
        Ok(())
    }
}

/// One entry of a reorder batch
#[derive(Debug, Clone)]
pub struct ReorderItem {
    pub id: Uuid,
    pub order: i64,
}

/// Per-shard result of a best-effort delete
#[derive(Debug, Clone, Copy)]
pub struct DeleteOutcome {
    pub primary: bool,
    pub secondary: bool,
}

impl DeleteOutcome {
    pub fn is_complete(&self) -> bool {
        self.primary && self.secondary
    }
}

/// Per-target result of a full wipe
#[derive(Debug, Clone, Copy)]
pub struct WipeReport {
    pub primary: bool,
    pub secondary: bool,
    pub park: bool,
}

/// Dependency connectivity snapshot
#[derive(Debug, Clone, Copy)]
pub struct HealthReport {
    pub primary: bool,
    pub secondary: bool,
    pub park: bool,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.primary && self.secondary && self.park
    }
}

/// Orchestrates split, dual encryption and the two-phase write across both
/// shards, with park-queue degradation.
pub struct VaultCoordinator {
    primary: Arc<dyn ShardStore>,
    secondary: Arc<dyn ShardStore>,
    park: Arc<dyn ParkStore>,
    config: Arc<VaultConfig>,
    sink: Arc<dyn LogSink>,
}

impl VaultCoordinator {
    pub fn new(
        primary: Arc<dyn ShardStore>,
        secondary: Arc<dyn ShardStore>,
        park: Arc<dyn ParkStore>,
        config: Arc<VaultConfig>,
        sink: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            primary,
            secondary,
            park,
            config,
            sink,
        }
    }

    /// Wrap a store call in the configured deadline.
    async fn bounded<T>(
        &self,
        op: impl Future<Output = std::result::Result<T, StoreError>>,
    ) -> std::result::Result<T, StoreError> {
        crate::store::with_deadline(self.config.op_deadline, op).await
    }

    /// Store a secret.
    ///
    /// In `WriteThrough` mode a prepare failure degrades to the park queue
    /// and the caller still sees success; only `DurableStorageUnreachable`
    /// (shards and park queue both down) is surfaced as a hard failure. In
    /// `ForceDirect` mode shard failures are surfaced so the caller can
    /// decide whether to re-park or drop.
    ///
    /// Once both prepares exist the coordinator never rolls back: a commit
    /// that activates only one shard is logged as a partial commit and left
    /// for the reaper and the read path's integrity check to reconcile.
    /// Rolling back after prepare would risk losing a write the caller
    /// already believes succeeded.
    pub async fn save(&self, req: &SaveRequest, mode: WriteMode) -> Result<()> {
        req.validate()?;

        // Split first, then encrypt each half under its own pepper. Crypto
        // failures are logical errors and never degrade to the park queue.
        let (raw_a, raw_b) = splitter::split(&req.payload);
        let content_a = aead::encrypt(&self.config.pepper_a, &raw_a)?;
        let content_b = aead::encrypt(&self.config.pepper_b, &raw_b)?;

        match self.two_phase_commit(req, content_a, content_b).await {
            Ok(()) => Ok(()),
            Err(err) if mode == WriteMode::ForceDirect => {
                self.sink.record(
                    LogLevel::Error,
                    "direct shard write failed",
                    json!({ "id": req.id, "error": err.to_string() }),
                );
                Err(err)
            }
            Err(err) => self.park_write(req, &err).await,
        }
    }

    async fn two_phase_commit(
        &self,
        req: &SaveRequest,
        content_a: Vec<u8>,
        content_b: Vec<u8>,
    ) -> Result<()> {
        let cleanup_deadline = Utc::now()
            + ChronoDuration::from_std(self.config.grace_window)
                .unwrap_or_else(|_| ChronoDuration::minutes(15));

        let row_a = NewShardRow {
            id: req.id,
            owner_hash: req.owner_hash.clone(),
            content: content_a,
            iv: req.iv.clone(),
            order_index: req.order_index,
            cleanup_deadline,
        };
        let row_b = NewShardRow {
            id: req.id,
            owner_hash: req.owner_hash.clone(),
            content: content_b,
            iv: req.iv.clone(),
            order_index: req.order_index,
            cleanup_deadline,
        };

        // Prepare phase: primary first, then secondary.
        if let Err(e) = self.bounded(self.primary.insert_pending(&row_a)).await {
            return Err(VaultError::PrepareFailed(format!("primary prepare: {}", e)));
        }

        if let Err(e) = self.bounded(self.secondary.insert_pending(&row_b)).await {
            self.sink.record(
                LogLevel::Error,
                "secondary prepare failed, rolling back primary",
                json!({ "id": req.id, "error": e.to_string() }),
            );
            if let Err(rollback_err) = self.bounded(self.primary.delete(req.id)).await {
                // The stranded PENDING row is invisible to readers and will
                // be collected by the reaper once its deadline passes.
                self.sink.record(
                    LogLevel::Error,
                    "compensating delete failed, primary row awaits reaper",
                    json!({ "id": req.id, "error": rollback_err.to_string() }),
                );
            }
            return Err(VaultError::PrepareFailed(format!("secondary prepare: {}", e)));
        }

        // Commit phase: flip both to ACTIVE. No rollback past this point.
        let commit = async {
            self.bounded(self.primary.mark_active(req.id)).await?;
            self.bounded(self.secondary.mark_active(req.id)).await
        };
        if let Err(e) = commit.await {
            self.sink.record(
                LogLevel::Warn,
                "partial commit, record hidden until reconciled",
                json!({ "id": req.id, "error": e.to_string() }),
            );
        }

        Ok(())
    }

    async fn park_write(&self, req: &SaveRequest, cause: &VaultError) -> Result<()> {
        self.sink.record(
            LogLevel::Warn,
            "shard providers down, parking write",
            json!({ "id": req.id, "error": cause.to_string() }),
        );

        let entry = ParkedWrite::new(req.id, &req.owner_hash, &req.payload, &req.iv, req.order_index);
        let key = entry.park_key(PARK_KEY_PREFIX);
        let value = entry.encode()?;

        match self
            .bounded(self.park.put(&key, &value, self.config.park_ttl))
            .await
        {
            Ok(()) => {
                self.sink
                    .record(LogLevel::Info, "write parked", json!({ "key": key }));
                Ok(())
            }
            Err(park_err) => {
                self.sink.record(
                    LogLevel::Error,
                    "total storage failure, shards and park queue both down",
                    json!({ "id": req.id, "error": park_err.to_string() }),
                );
                Err(VaultError::DurableStorageUnreachable)
            }
        }
    }

    /// Best-effort parallel delete from both shards. Partial failure is
    /// logged and reported per shard, never retried synchronously.
    pub async fn delete(&self, id: Uuid) -> Result<DeleteOutcome> {
        let (a, b) = tokio::join!(
            self.bounded(self.primary.delete(id)),
            self.bounded(self.secondary.delete(id)),
        );

        let outcome = DeleteOutcome {
            primary: a.is_ok(),
            secondary: b.is_ok(),
        };
        if !outcome.is_complete() {
            self.sink.record(
                LogLevel::Warn,
                "partial delete",
                json!({
                    "id": id,
                    "primary": outcome.primary,
                    "secondary": outcome.secondary,
                }),
            );
        }
        Ok(outcome)
    }

    /// Update display ordering for an owner's records. Touches only the
    /// primary shard's `order_index` column and takes no part in the
    /// two-phase protocol.
    pub async fn reorder(&self, owner_hash: &str, items: &[ReorderItem]) -> Result<()> {
        if owner_hash.len() < MIN_OWNER_HASH_LEN {
            return Err(VaultError::InvalidRequest(format!(
                "owner hash must be at least {} chars",
                MIN_OWNER_HASH_LEN
            )));
        }
        if items.is_empty() {
            return Err(VaultError::InvalidRequest("reorder batch is empty".into()));
        }
        if items.len() > MAX_REORDER_BATCH {
            return Err(VaultError::InvalidRequest(format!(
                "reorder batch exceeds {} items",
                MAX_REORDER_BATCH
            )));
        }
        if let Some(item) = items.iter().find(|i| i.order < 0) {
            return Err(VaultError::InvalidRequest(format!(
                "negative order for {}",
                item.id
            )));
        }

        for item in items {
            self.bounded(self.primary.update_order(item.id, owner_hash, item.order))
                .await
                .map_err(VaultError::from)?;
        }
        Ok(())
    }

    /// Best-effort parallel removal of everything an owner has stored.
    pub async fn wipe_by_owner(&self, owner_hash: &str) -> Result<DeleteOutcome> {
        let (a, b) = tokio::join!(
            self.bounded(self.primary.delete_by_owner(owner_hash)),
            self.bounded(self.secondary.delete_by_owner(owner_hash)),
        );

        let outcome = DeleteOutcome {
            primary: a.is_ok(),
            secondary: b.is_ok(),
        };
        if !outcome.is_complete() {
            self.sink.record(
                LogLevel::Warn,
                "partial owner wipe",
                json!({
                    "primary": outcome.primary,
                    "secondary": outcome.secondary,
                }),
            );
        }
        Ok(outcome)
    }

    /// Full-system wipe: truncate both shards, flush the park queue, purge
    /// log collections. Every step is best effort and reported per target.
    pub async fn wipe_all(&self) -> WipeReport {
        self.sink.record(
            LogLevel::Security,
            "full system wipe initiated",
            json!({}),
        );

        let (a, b, p) = tokio::join!(
            self.bounded(self.primary.truncate()),
            self.bounded(self.secondary.truncate()),
            self.bounded(self.park.flush()),
        );
        self.sink.purge();

        let report = WipeReport {
            primary: a.is_ok(),
            secondary: b.is_ok(),
            park: p.is_ok(),
        };
        self.sink.record(
            LogLevel::Security,
            "full system wipe completed",
            json!({
                "primary": report.primary,
                "secondary": report.secondary,
                "park": report.park,
            }),
        );
        report
    }

    /// Ping every dependency concurrently.
    pub async fn health(&self) -> HealthReport {
        let (a, b, p) = tokio::join!(
            self.bounded(self.primary.ping()),
            self.bounded(self.secondary.ping()),
            self.bounded(self.park.ping()),
        );
        HealthReport {
            primary: a.is_ok(),
            secondary: b.is_ok(),
            park: p.is_ok(),
        }
    }
}
