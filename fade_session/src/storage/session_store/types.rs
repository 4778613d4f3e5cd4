use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::storage::errors::StorageError;
use crate::storage::types::{CacheData, SessionData};

pub struct InMemorySessionStore {
    pub(super) entry: RwLock<HashMap<String, CacheData>>,
}

pub struct RedisSessionStore {
    pub(super) client: redis::Client,
}

/// Key-value store with per-key expiry that backs the session layer.
///
/// Reads return the type's zero value (`""`, `0`, an empty map) for keys that
/// are absent or expired; `Err` is reserved for backend failures. Fade
/// operations set an absolute expiry `ttl` seconds from the call, and a
/// non-positive `ttl` removes the key. Implementations are shared between
/// requests and must tolerate concurrent callers.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Initialize the store. This is called when the store is created.
    async fn init(&self) -> Result<(), StorageError> {
        Ok(())
    }

    /// Delete a key. Deleting an absent key is not an error.
    async fn del(&self, key: &str) -> Result<(), StorageError>;

    /// Remaining lifespan in seconds: `EXPIRY_ABSENT` for absent or expired
    /// keys, `EXPIRY_PERSISTENT` for keys stored without a ttl.
    async fn expiry(&self, key: &str) -> Result<i64, StorageError>;

    /// Set a string with remaining lifespan in seconds.
    async fn fade_str(&self, key: &str, val: &str, ttl: i64) -> Result<(), StorageError>;

    /// Set an integer with remaining lifespan in seconds.
    async fn fade_int(&self, key: &str, val: i64, ttl: i64) -> Result<(), StorageError>;

    /// Set a map with remaining lifespan in seconds.
    async fn fade_msx(&self, key: &str, val: &SessionData, ttl: i64)
    -> Result<(), StorageError>;

    /// Set a map with a ttl only if the key doesn't already exist (atomic check-and-set).
    /// Returns true if the value was stored, false if the key was taken.
    async fn fade_msx_if_absent(
        &self,
        key: &str,
        val: &SessionData,
        ttl: i64,
    ) -> Result<bool, StorageError>;

    async fn get_str(&self, key: &str) -> Result<String, StorageError>;

    async fn get_int(&self, key: &str) -> Result<i64, StorageError>;

    async fn get_msx(&self, key: &str) -> Result<SessionData, StorageError>;

    /// Increment by one and return the new value. An absent key starts at zero
    /// and an existing expiry is preserved.
    async fn inc(&self, key: &str) -> Result<i64, StorageError>;

    async fn set_str(&self, key: &str, val: &str) -> Result<(), StorageError>;

    async fn set_int(&self, key: &str, val: i64) -> Result<(), StorageError>;

    async fn set_msx(&self, key: &str, val: &SessionData) -> Result<(), StorageError>;
}

/// Decode a stored map, treating unreadable text as an empty payload.
pub(super) fn decode_msx(key: &str, raw: &str) -> SessionData {
    match serde_json::from_str::<SessionData>(raw) {
        Ok(map) => map,
        Err(e) => {
            tracing::warn!("Stored value for {key} is not a JSON object: {e}");
            SessionData::new()
        }
    }
}

pub(super) fn decode_int(raw: &str) -> i64 {
    raw.trim().parse().unwrap_or(0)
}
