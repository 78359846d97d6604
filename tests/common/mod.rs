#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::Value;
use uuid::Uuid;

use shardkeep::store::{
    MemoryParkStore, NewShardRow, ParkStore, ShardRow, ShardStore, SqliteShardStore, StoreError,
};
use shardkeep::{
    LogLevel, LogSink, Pepper, Reaper, SaveRequest, SyncWorker, VaultConfig, VaultCoordinator,
    VaultReader,
};

/// Sink that captures events for assertions.
pub struct CapturingSink {
    pub events: Mutex<Vec<(LogLevel, String)>>,
}

impl CapturingSink {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn count(&self, level: LogLevel) -> usize {
        self.events.lock().iter().filter(|(l, _)| *l == level).count()
    }

    pub fn security_alerts(&self) -> usize {
        self.count(LogLevel::Security)
    }
}

impl LogSink for CapturingSink {
    fn record(&self, level: LogLevel, message: &str, _metadata: Value) {
        self.events.lock().push((level, message.to_string()));
    }
}

/// Shard store wrapper with injectable outages.
pub struct FlakyShard {
    inner: SqliteShardStore,
    down: AtomicBool,
    commit_down: AtomicBool,
}

impl FlakyShard {
    pub fn new() -> Self {
        Self {
            inner: SqliteShardStore::open_in_memory("vault").unwrap(),
            down: AtomicBool::new(false),
            commit_down: AtomicBool::new(false),
        }
    }

    /// Make every operation fail, as if the store were unreachable.
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    /// Make only status flips fail, stranding records in PENDING.
    pub fn set_commit_down(&self, down: bool) {
        self.commit_down.store(down, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(StoreError::Unreachable("injected outage".into()));
        }
        Ok(())
    }

    /// All PENDING ids, regardless of deadline.
    pub async fn pending_ids(&self) -> Vec<Uuid> {
        self.inner
            .expired_pending(Utc::now() + chrono::Duration::days(365))
            .await
            .unwrap()
    }

    pub async fn active_rows(&self, owner_hash: &str) -> Vec<ShardRow> {
        self.inner.fetch_active_by_owner(owner_hash).await.unwrap()
    }
}

#[async_trait]
impl ShardStore for FlakyShard {
    async fn insert_pending(&self, row: &NewShardRow) -> Result<(), StoreError> {
        self.check()?;
        self.inner.insert_pending(row).await
    }

    async fn mark_active(&self, id: Uuid) -> Result<(), StoreError> {
        self.check()?;
        if self.commit_down.load(Ordering::SeqCst) {
            return Err(StoreError::Unreachable("injected commit outage".into()));
        }
        self.inner.mark_active(id).await
    }

    async fn fetch_active_by_owner(&self, owner_hash: &str) -> Result<Vec<ShardRow>, StoreError> {
        self.check()?;
        self.inner.fetch_active_by_owner(owner_hash).await
    }

    async fn update_order(
        &self,
        id: Uuid,
        owner_hash: &str,
        order_index: i64,
    ) -> Result<(), StoreError> {
        self.check()?;
        self.inner.update_order(id, owner_hash, order_index).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.check()?;
        self.inner.delete(id).await
    }

    async fn delete_many(&self, ids: &[Uuid]) -> Result<usize, StoreError> {
        self.check()?;
        self.inner.delete_many(ids).await
    }

    async fn delete_by_owner(&self, owner_hash: &str) -> Result<usize, StoreError> {
        self.check()?;
        self.inner.delete_by_owner(owner_hash).await
    }

    async fn expired_pending(&self, now: DateTime<Utc>) -> Result<Vec<Uuid>, StoreError> {
        self.check()?;
        self.inner.expired_pending(now).await
    }

    async fn truncate(&self) -> Result<(), StoreError> {
        self.check()?;
        self.inner.truncate().await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check()?;
        self.inner.ping().await
    }
}

/// Park store wrapper with an injectable outage.
pub struct FlakyPark {
    inner: MemoryParkStore,
    down: AtomicBool,
}

impl FlakyPark {
    pub fn new() -> Self {
        Self {
            inner: MemoryParkStore::new(),
            down: AtomicBool::new(false),
        }
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(StoreError::Unreachable("injected outage".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ParkStore for FlakyPark {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        self.check()?;
        self.inner.put(key, value, ttl).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.check()?;
        self.inner.get(key).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.check()?;
        self.inner.remove(key).await
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        self.check()?;
        self.inner.keys_with_prefix(prefix).await
    }

    async fn flush(&self) -> Result<(), StoreError> {
        self.check()?;
        self.inner.flush().await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check()?;
        self.inner.ping().await
    }
}

/// Fully wired vault with failure-injectable stores.
pub struct VaultHarness {
    pub primary: Arc<FlakyShard>,
    pub secondary: Arc<FlakyShard>,
    pub park: Arc<FlakyPark>,
    pub sink: Arc<CapturingSink>,
    pub config: Arc<VaultConfig>,
    pub coordinator: Arc<VaultCoordinator>,
    pub reader: VaultReader,
    pub worker: SyncWorker,
    pub reaper: Reaper,
}

impl VaultHarness {
    pub fn new() -> Self {
        Self::with_grace(Duration::from_secs(900))
    }

    pub fn with_grace(grace_window: Duration) -> Self {
        init_tracing();

        let primary = Arc::new(FlakyShard::new());
        let secondary = Arc::new(FlakyShard::new());
        let park = Arc::new(FlakyPark::new());
        let sink = Arc::new(CapturingSink::new());

        let mut config = VaultConfig::new(Pepper::generate(), Pepper::generate());
        config.grace_window = grace_window;
        config.op_deadline = Duration::from_secs(2);
        let config = Arc::new(config);

        let coordinator = Arc::new(VaultCoordinator::new(
            primary.clone(),
            secondary.clone(),
            park.clone(),
            config.clone(),
            sink.clone(),
        ));
        let reader = VaultReader::new(
            primary.clone(),
            secondary.clone(),
            config.clone(),
            sink.clone(),
        );
        let worker = SyncWorker::new(
            coordinator.clone(),
            park.clone(),
            config.clone(),
            sink.clone(),
        );
        let reaper = Reaper::new(
            primary.clone(),
            secondary.clone(),
            config.clone(),
            sink.clone(),
        );

        Self {
            primary,
            secondary,
            park,
            sink,
            config,
            coordinator,
            reader,
            worker,
            reaper,
        }
    }
}

/// Initialize test logging once; later calls are no-ops.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Pad a short tag into a valid owner hash.
pub fn owner_hash(tag: &str) -> String {
    format!("{:_<32}", tag)
}

pub fn save_request(owner_hash: &str, payload: &[u8]) -> SaveRequest {
    SaveRequest {
        id: Uuid::new_v4(),
        owner_hash: owner_hash.to_string(),
        payload: payload.to_vec(),
        iv: "aabbccddeeff001122334455".into(),
        order_index: 0,
    }
}
