//! Sync worker - drains the park queue back into the shards.
//!
//! Runs periodically. Every parked write is replayed through the coordinator
//! in force-direct mode: a success removes the parked entry, a failure
//! leaves it for the next run. One entry's failure never aborts the scan.

use std::sync::Arc;

use serde_json::json;

use crate::config::{VaultConfig, PARK_KEY_PREFIX};
use crate::coordinator::{SaveRequest, VaultCoordinator, WriteMode};
use crate::error::Result;
use crate::logging::{LogLevel, LogSink};
use crate::park::ParkedWrite;
use crate::store::{self, ParkStore};

/// Outcome of one drain pass
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncReport {
    pub synced: usize,
    pub failed: usize,
}

/// Replays parked writes into the shards.
pub struct SyncWorker {
    coordinator: Arc<VaultCoordinator>,
    park: Arc<dyn ParkStore>,
    config: Arc<VaultConfig>,
    sink: Arc<dyn LogSink>,
}

impl SyncWorker {
    pub fn new(
        coordinator: Arc<VaultCoordinator>,
        park: Arc<dyn ParkStore>,
        config: Arc<VaultConfig>,
        sink: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            coordinator,
            park,
            config,
            sink,
        }
    }

    /// Drain every currently parked write.
    ///
    /// Idempotent: a fully drained queue makes the next run a no-op, and an
    /// entry that was already promoted simply no longer exists. Entries that
    /// fail to replay stay parked until they succeed or their retention
    /// expires.
    pub async fn drain_parked(&self) -> Result<SyncReport> {
        let keys = store::with_deadline(
            self.config.op_deadline,
            self.park.keys_with_prefix(PARK_KEY_PREFIX),
        )
        .await?;

        if keys.is_empty() {
            return Ok(SyncReport::default());
        }

        let mut report = SyncReport::default();
        for key in keys {
            match self.replay(&key).await {
                Ok(true) => report.synced += 1,
                // Entry vanished between scan and read (expired or already
                // promoted by an overlapping run).
                Ok(false) => {}
                Err(e) => {
                    report.failed += 1;
                    self.sink.record(
                        LogLevel::Error,
                        "parked write replay failed, entry retained",
                        json!({ "key": key, "error": e.to_string() }),
                    );
                }
            }
        }

        self.sink.record(
            LogLevel::Info,
            "park queue drain complete",
            json!({ "synced": report.synced, "failed": report.failed }),
        );
        Ok(report)
    }

    async fn replay(&self, key: &str) -> Result<bool> {
        let deadline = self.config.op_deadline;
        let raw = match store::with_deadline(deadline, self.park.get(key)).await? {
            Some(raw) => raw,
            None => return Ok(false),
        };

        let entry = ParkedWrite::decode(&raw)?;
        let req = SaveRequest {
            id: entry.id,
            owner_hash: entry.owner_hash,
            payload: entry.payload,
            iv: entry.iv,
            order_index: entry.order_index,
        };

        self.coordinator.save(&req, WriteMode::ForceDirect).await?;
        store::with_deadline(deadline, self.park.remove(key)).await?;
        Ok(true)
    }

    /// Decode every live parked entry, for diagnostics and operator tooling.
    /// Undecodable entries are logged and omitted.
    pub async fn parked_entries(&self) -> Result<Vec<ParkedWrite>> {
        let deadline = self.config.op_deadline;
        let keys =
            store::with_deadline(deadline, self.park.keys_with_prefix(PARK_KEY_PREFIX)).await?;

        let mut entries = Vec::with_capacity(keys.len());
        for key in keys {
            let Some(raw) = store::with_deadline(deadline, self.park.get(&key)).await? else {
                continue;
            };
            match ParkedWrite::decode(&raw) {
                Ok(entry) => entries.push(entry),
                Err(e) => self.sink.record(
                    LogLevel::Error,
                    "undecodable parked entry",
                    json!({ "key": key, "error": e.to_string() }),
                ),
            }
        }
        Ok(entries)
    }
}
