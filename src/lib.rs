//! # shardkeep
//!
//! Dual-shard secret storage core. No single store ever holds a full
//! plaintext or full ciphertext, a write that cannot reach both shards is
//! never silently lost, and partial failures heal without an operator.
//!
//! ## Architecture
//!
//! ```text
//!                save                     fetch
//!                  │                        │
//!           ┌──────▼──────┐          ┌──────▼──────┐
//!           │ COORDINATOR │          │   READER    │
//!           │ split+2keys │          │ join+verify │
//!           └──┬───────┬──┘          └──┬───────┬──┘
//!       prepare│commit │ on failure     │       │
//!        ┌─────▼──┐ ┌──▼─────┐   ┌──────▼─┐ ┌───▼────┐
//!        │ SHARD A│ │ SHARD B│   │ SHARD A│ │ SHARD B│
//!        └────▲───┘ └───▲────┘   └────────┘ └────────┘
//!             │         │
//!        ┌────┴─────────┴───┐        ┌────────────┐
//!        │   SYNC WORKER    │◄───────│ PARK QUEUE │
//!        └──────────────────┘        └────────────┘
//! ```
//!
//! ## Security model
//!
//! - Each shard stores one half of the payload's ciphertext
//! - Each half is re-encrypted with AES-256-GCM under a shard-specific pepper
//! - Peppers are independent secrets: one compromised store recovers nothing
//! - One-sided records are never returned to a reader

pub mod config;
pub mod coordinator;
pub mod crypto;
pub mod error;
pub mod logging;
pub mod park;
pub mod reader;
pub mod reaper;
pub mod splitter;
pub mod store;
pub mod sync_worker;

pub use config::VaultConfig;
pub use coordinator::{
    DeleteOutcome, HealthReport, ReorderItem, SaveRequest, VaultCoordinator, WipeReport, WriteMode,
};
pub use crypto::Pepper;
pub use error::{Result, VaultError};
pub use logging::{LogLevel, LogSink, NullSink, TracingSink};
pub use park::ParkedWrite;
pub use reader::{SecretRecord, VaultReader};
pub use reaper::Reaper;
pub use store::{MemoryParkStore, ParkStore, ShardStore, SqliteShardStore};
pub use sync_worker::{SyncReport, SyncWorker};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, "1.0.0");
    }
}
