//! Zombie record collector.
//!
//! A PENDING row whose commit never completed within the grace window is a
//! zombie. The reaper sweeps both shards for them on a periodic trigger.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;

use crate::config::VaultConfig;
use crate::error::Result;
use crate::logging::{LogLevel, LogSink};
use crate::store::{self, ShardStore};

/// Collects expired PENDING rows from both shards.
pub struct Reaper {
    primary: Arc<dyn ShardStore>,
    secondary: Arc<dyn ShardStore>,
    config: Arc<VaultConfig>,
    sink: Arc<dyn LogSink>,
}

impl Reaper {
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

    /// Remove every record stuck in PENDING past its cleanup deadline.
    ///
    /// Secondary rows are deleted before primary rows: if this run dies
    /// between the two deletes, the survivors are primary rows the next scan
    /// finds again, never secondary rows no scan would ever reference. Any
    /// failure deletes nothing further and the run is safe to repeat.
    ///
    /// Returns the number of zombie records collected.
    pub async fn cleanup_zombies(&self) -> Result<usize> {
        let deadline = self.config.op_deadline;
        let zombies =
            store::with_deadline(deadline, self.primary.expired_pending(Utc::now())).await?;

        if zombies.is_empty() {
            return Ok(0);
        }

        self.sink.record(
            LogLevel::Warn,
            "collecting zombie records",
            json!({ "count": zombies.len() }),
        );

        store::with_deadline(deadline, self.secondary.delete_many(&zombies)).await?;
        let removed = store::with_deadline(deadline, self.primary.delete_many(&zombies)).await?;

        self.sink.record(
            LogLevel::Info,
            "zombie cleanup complete",
            json!({ "removed": removed }),
        );
        Ok(removed)
    }
}
