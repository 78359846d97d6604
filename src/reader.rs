//! Vault reader - the read path.
//!
//! Fetches both shards' ACTIVE rows for an owner concurrently, decrypts each
//! part under its own pepper and reassembles the original payload. A record
//! missing its counterpart is never half-returned: it is skipped with a
//! security alert and reconciliation is left to the reaper.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use crate::config::VaultConfig;
use crate::crypto::aead;
use crate::error::{Result, VaultError};
use crate::logging::{LogLevel, LogSink};
use crate::splitter;
use crate::store::{self, ShardStore};

/// A reassembled secret
#[derive(Debug, Clone)]
pub struct SecretRecord {
    pub id: Uuid,
    pub owner_hash: String,
    /// The original payload, exactly as saved
    pub payload: Vec<u8>,
    pub iv: String,
    pub order_index: i64,
}

/// Read-path orchestrator.
pub struct VaultReader {
    primary: Arc<dyn ShardStore>,
    secondary: Arc<dyn ShardStore>,
    config: Arc<VaultConfig>,
    sink: Arc<dyn LogSink>,
}

impl VaultReader {
    pub fn new(
        primary: Arc<dyn ShardStore>,
        secondary: Arc<dyn ShardStore>,
        config: Arc<VaultConfig>,
        sink: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            primary,
            secondary,
            config,
            sink,
        }
    }

    /// Fetch and reassemble every readable secret for an owner, ordered by
    /// `order_index`.
    ///
    /// A one-sided ACTIVE row is a data-integrity violation: the record is
    /// skipped and exactly one security alert is emitted for it. A
    /// decryption failure on either part likewise skips only that record.
    pub async fn fetch_by_owner(&self, owner_hash: &str) -> Result<Vec<SecretRecord>> {
        let deadline = self.config.op_deadline;
        let (rows_a, rows_b) = tokio::try_join!(
            store::with_deadline(deadline, self.primary.fetch_active_by_owner(owner_hash)),
            store::with_deadline(deadline, self.secondary.fetch_active_by_owner(owner_hash)),
        )
        .map_err(VaultError::from)?;

        if rows_a.is_empty() {
            return Ok(Vec::new());
        }

        let parts_b: HashMap<Uuid, Vec<u8>> =
            rows_b.into_iter().map(|row| (row.id, row.content)).collect();

        let mut records = Vec::with_capacity(rows_a.len());
        for row_a in rows_a {
            let Some(content_b) = parts_b.get(&row_a.id) else {
                self.sink.record(
                    LogLevel::Security,
                    "integrity check failed, secondary part missing",
                    json!({ "id": row_a.id }),
                );
                continue;
            };

            let part_a = match aead::decrypt(&self.config.pepper_a, &row_a.content) {
                Ok(part) => part,
                Err(e) => {
                    self.sink.record(
                        LogLevel::Error,
                        "primary part decryption failed",
                        json!({ "id": row_a.id, "error": e.to_string() }),
                    );
                    continue;
                }
            };
            let part_b = match aead::decrypt(&self.config.pepper_b, content_b) {
                Ok(part) => part,
                Err(e) => {
                    self.sink.record(
                        LogLevel::Error,
                        "secondary part decryption failed",
                        json!({ "id": row_a.id, "error": e.to_string() }),
                    );
                    continue;
                }
            };

            records.push(SecretRecord {
                id: row_a.id,
                owner_hash: owner_hash.to_string(),
                payload: splitter::join(&part_a, &part_b),
                iv: row_a.iv,
                order_index: row_a.order_index,
            });
        }

        Ok(records)
    }
}
