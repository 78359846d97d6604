//! Parked write entries.
//!
//! When both shard prepares cannot complete, the full write request is
//! serialized into the park queue under a time-suffixed key and replayed
//! later by the sync worker.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A full write request held in the park queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParkedWrite {
    pub id: Uuid,
    pub owner_hash: String,
    /// Original pre-split payload, carried verbatim
    #[serde(with = "base64_bytes")]
    pub payload: Vec<u8>,
    pub iv: String,
    pub order_index: i64,
    /// Milliseconds since epoch at park time; also suffixes the key
    pub parked_at_ms: i64,
}

impl ParkedWrite {
    pub fn new(id: Uuid, owner_hash: &str, payload: &[u8], iv: &str, order_index: i64) -> Self {
        Self {
            id,
            owner_hash: owner_hash.to_string(),
            payload: payload.to_vec(),
            iv: iv.to_string(),
            order_index,
            parked_at_ms: Utc::now().timestamp_millis(),
        }
    }

    /// Key this entry parks under. Time-suffixed so repeated attempts for
    /// the same id never overwrite one another.
    pub fn park_key(&self, prefix: &str) -> String {
        format!("{}{}:{}", prefix, self.id, self.parked_at_ms)
    }

    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn decode(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

mod base64_bytes {
    use super::{Engine, BASE64};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        BASE64.decode(encoded).map_err(serde::de::Error::custom)
    }
}
