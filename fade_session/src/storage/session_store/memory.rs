use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::storage::errors::StorageError;
use crate::storage::types::{CacheData, EXPIRY_ABSENT, SessionData};

use super::types::{InMemorySessionStore, SessionStore, decode_int, decode_msx};

impl InMemorySessionStore {
    pub fn new() -> Self {
        tracing::info!("Creating new in-memory session store");
        Self {
            entry: RwLock::new(HashMap::new()),
        }
    }

    /// Number of live (unexpired) entries.
    pub async fn len(&self) -> usize {
        let now = Utc::now();
        self.entry
            .read()
            .await
            .values()
            .filter(|data| !data.is_expired(now))
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop every expired entry and return how many were removed.
    pub async fn prune_expired(&self) -> usize {
        let now = Utc::now();
        let mut entry = self.entry.write().await;
        let before = entry.len();
        entry.retain(|_, data| !data.is_expired(now));
        let pruned = before - entry.len();
        if pruned > 0 {
            tracing::debug!("Pruned {pruned} expired session store entries");
        }
        pruned
    }

    fn expires_at(ttl: i64) -> Result<DateTime<Utc>, StorageError> {
        TimeDelta::try_seconds(ttl)
            .and_then(|delta| Utc::now().checked_add_signed(delta))
            .ok_or_else(|| StorageError::Storage(format!("ttl of {ttl}s is out of range")))
    }

    async fn live(&self, key: &str) -> Option<CacheData> {
        let now = Utc::now();
        self.entry
            .read()
            .await
            .get(key)
            .filter(|data| !data.is_expired(now))
            .cloned()
    }

    async fn put(&self, key: &str, value: String, expires_at: Option<DateTime<Utc>>) {
        self.entry
            .write()
            .await
            .insert(key.to_string(), CacheData { value, expires_at });
    }

    async fn fade(&self, key: &str, value: String, ttl: i64) -> Result<(), StorageError> {
        if ttl <= 0 {
            self.entry.write().await.remove(key);
            return Ok(());
        }
        let expires_at = Self::expires_at(ttl)?;
        self.put(key, value, Some(expires_at)).await;
        Ok(())
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn del(&self, key: &str) -> Result<(), StorageError> {
        self.entry.write().await.remove(key);
        Ok(())
    }

    async fn expiry(&self, key: &str) -> Result<i64, StorageError> {
        let now = Utc::now();
        Ok(self
            .entry
            .read()
            .await
            .get(key)
            .map_or(EXPIRY_ABSENT, |data| data.remaining_secs(now)))
    }

    async fn fade_str(&self, key: &str, val: &str, ttl: i64) -> Result<(), StorageError> {
        self.fade(key, val.to_string(), ttl).await
    }

    async fn fade_int(&self, key: &str, val: i64, ttl: i64) -> Result<(), StorageError> {
        self.fade(key, val.to_string(), ttl).await
    }

    async fn fade_msx(
        &self,
        key: &str,
        val: &SessionData,
        ttl: i64,
    ) -> Result<(), StorageError> {
        self.fade(key, serde_json::to_string(val)?, ttl).await
    }

    async fn fade_msx_if_absent(
        &self,
        key: &str,
        val: &SessionData,
        ttl: i64,
    ) -> Result<bool, StorageError> {
        let value = serde_json::to_string(val)?;
        let expires_at = if ttl > 0 {
            Some(Self::expires_at(ttl)?)
        } else {
            None
        };
        let now = Utc::now();
        let mut entry = self.entry.write().await;

        if entry.get(key).is_some_and(|data| !data.is_expired(now)) {
            return Ok(false);
        }
        match expires_at {
            Some(expires_at) => {
                entry.insert(
                    key.to_string(),
                    CacheData {
                        value,
                        expires_at: Some(expires_at),
                    },
                );
            }
            None => {
                entry.remove(key);
            }
        }
        Ok(true)
    }

    async fn get_str(&self, key: &str) -> Result<String, StorageError> {
        Ok(self.live(key).await.map(|data| data.value).unwrap_or_default())
    }

    async fn get_int(&self, key: &str) -> Result<i64, StorageError> {
        Ok(self
            .live(key)
            .await
            .map_or(0, |data| decode_int(&data.value)))
    }

    async fn get_msx(&self, key: &str) -> Result<SessionData, StorageError> {
        Ok(self
            .live(key)
            .await
            .map(|data| decode_msx(key, &data.value))
            .unwrap_or_default())
    }

    async fn inc(&self, key: &str) -> Result<i64, StorageError> {
        let now = Utc::now();
        let mut entry = self.entry.write().await;

        let (current, expires_at) = match entry.get(key).filter(|data| !data.is_expired(now)) {
            Some(data) => {
                let current = data.value.trim().parse::<i64>().map_err(|_| {
                    StorageError::Storage(format!("Value for {key} is not an integer"))
                })?;
                (current, data.expires_at)
            }
            None => (0, None),
        };

        let next = current
            .checked_add(1)
            .ok_or_else(|| StorageError::Storage(format!("Increment overflow for {key}")))?;
        entry.insert(
            key.to_string(),
            CacheData {
                value: next.to_string(),
                expires_at,
            },
        );
        Ok(next)
    }

    async fn set_str(&self, key: &str, val: &str) -> Result<(), StorageError> {
        self.put(key, val.to_string(), None).await;
        Ok(())
    }

    async fn set_int(&self, key: &str, val: i64) -> Result<(), StorageError> {
        self.put(key, val.to_string(), None).await;
        Ok(())
    }

    async fn set_msx(&self, key: &str, val: &SessionData) -> Result<(), StorageError> {
        self.put(key, serde_json::to_string(val)?, None).await;
        Ok(())
    }
}
