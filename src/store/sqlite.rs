//! SQLite shard adapter.
//!
//! Each shard is its own database file, so the two shards stay independently
//! owned and independently failable. Statements are parameterized; only the
//! validated table prefix is interpolated.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, params_from_iter, Connection};
use std::path::Path;
use uuid::Uuid;

use super::{NewShardRow, ShardRow, ShardStatus, ShardStore, StoreError};

/// One shard backed by a SQLite database.
pub struct SqliteShardStore {
    conn: Mutex<Connection>,
    table: String,
}

impl SqliteShardStore {
    /// Open (or create) a shard database at the given path.
    pub fn open(path: &Path, table_prefix: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
            table: format!("{}_shards", table_prefix),
        };
        store.run_migrations()?;
        Ok(store)
    }

    /// Open an in-memory shard (used by tests and ephemeral deployments).
    pub fn open_in_memory(table_prefix: &str) -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
            table: format!("{}_shards", table_prefix),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute_batch(&format!(
            "
            CREATE TABLE IF NOT EXISTS {table} (
                id               TEXT PRIMARY KEY,
                owner_hash       TEXT NOT NULL,
                content          BLOB NOT NULL,
                iv               TEXT NOT NULL,
                order_index      INTEGER NOT NULL DEFAULT 0,
                status           TEXT NOT NULL,
                cleanup_deadline INTEGER NOT NULL, -- unix millis
                created_at       TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_{table}_owner
                ON {table}(owner_hash, status);

            CREATE INDEX IF NOT EXISTS idx_{table}_deadline
                ON {table}(status, cleanup_deadline);
            ",
            table = self.table
        ))?;

        tracing::debug!(table = %self.table, "shard migrations completed");
        Ok(())
    }

    fn parse_id(id_str: &str) -> Result<Uuid, StoreError> {
        Uuid::parse_str(id_str).map_err(|e| StoreError::Database(format!("bad row id: {}", e)))
    }
}

#[async_trait]
impl ShardStore for SqliteShardStore {
    async fn insert_pending(&self, row: &NewShardRow) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            &format!(
                "INSERT INTO {} (id, owner_hash, content, iv, order_index, status, cleanup_deadline, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                self.table
            ),
            params![
                row.id.to_string(),
                row.owner_hash,
                row.content,
                row.iv,
                row.order_index,
                ShardStatus::Pending.as_str(),
                row.cleanup_deadline.timestamp_millis(),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    async fn mark_active(&self, id: Uuid) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            &format!("UPDATE {} SET status = ?1 WHERE id = ?2", self.table),
            params![ShardStatus::Active.as_str(), id.to_string()],
        )?;
        Ok(())
    }

    async fn fetch_active_by_owner(&self, owner_hash: &str) -> Result<Vec<ShardRow>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT id, content, iv, order_index FROM {}
             WHERE owner_hash = ?1 AND status = ?2
             ORDER BY order_index ASC",
            self.table
        ))?;

        let rows = stmt.query_map(
            params![owner_hash, ShardStatus::Active.as_str()],
            |row| {
                let id_str: String = row.get(0)?;
                let content: Vec<u8> = row.get(1)?;
                let iv: String = row.get(2)?;
                let order_index: i64 = row.get(3)?;
                Ok((id_str, content, iv, order_index))
            },
        )?;

        let mut result = Vec::new();
        for row in rows {
            let (id_str, content, iv, order_index) = row?;
            result.push(ShardRow {
                id: Self::parse_id(&id_str)?,
                content,
                iv,
                order_index,
            });
        }
        Ok(result)
    }

    async fn update_order(
        &self,
        id: Uuid,
        owner_hash: &str,
        order_index: i64,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            &format!(
                "UPDATE {} SET order_index = ?1 WHERE id = ?2 AND owner_hash = ?3",
                self.table
            ),
            params![order_index, id.to_string(), owner_hash],
        )?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1", self.table),
            params![id.to_string()],
        )?;
        Ok(())
    }

    async fn delete_many(&self, ids: &[Uuid]) -> Result<usize, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let conn = self.conn.lock();
        let removed = conn.execute(
            &format!("DELETE FROM {} WHERE id IN ({})", self.table, placeholders),
            params_from_iter(ids.iter().map(|id| id.to_string())),
        )?;
        Ok(removed)
    }

    async fn delete_by_owner(&self, owner_hash: &str) -> Result<usize, StoreError> {
        let conn = self.conn.lock();
        let removed = conn.execute(
            &format!("DELETE FROM {} WHERE owner_hash = ?1", self.table),
            params![owner_hash],
        )?;
        Ok(removed)
    }

    async fn expired_pending(&self, now: DateTime<Utc>) -> Result<Vec<Uuid>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT id FROM {} WHERE status = ?1 AND cleanup_deadline < ?2",
            self.table
        ))?;

        let rows = stmt.query_map(
            params![ShardStatus::Pending.as_str(), now.timestamp_millis()],
            |row| {
                let id_str: String = row.get(0)?;
                Ok(id_str)
            },
        )?;

        let mut ids = Vec::new();
        for row in rows {
            ids.push(Self::parse_id(&row?)?);
        }
        Ok(ids)
    }

    async fn truncate(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute(&format!("DELETE FROM {}", self.table), [])?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }
}
