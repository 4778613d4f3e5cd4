use async_trait::async_trait;
use redis::{self, AsyncCommands, aio::MultiplexedConnection};

use crate::storage::errors::StorageError;
use crate::storage::types::SessionData;

use super::types::{RedisSessionStore, SessionStore, decode_int, decode_msx};

const SESSION_PREFIX: &str = "session";

impl RedisSessionStore {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    fn make_key(key: &str) -> String {
        format!("{SESSION_PREFIX}:{key}")
    }

    async fn conn(&self) -> Result<MultiplexedConnection, StorageError> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    async fn fade(&self, key: &str, value: String, ttl: i64) -> Result<(), StorageError> {
        let mut conn = self.conn().await?;
        let key = Self::make_key(key);

        // SET EX rejects a zero ttl; the value would be dead on arrival anyway.
        if ttl <= 0 {
            let _: () = conn.del(&key).await?;
            return Ok(());
        }
        let _: () = conn.set_ex(&key, value, ttl as u64).await?;
        Ok(())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        let mut conn = self.conn().await?;
        let _: () = conn.set(Self::make_key(key), value).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut conn = self.conn().await?;
        let value: Option<String> = conn.get(Self::make_key(key)).await?;
        Ok(value)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn init(&self) -> Result<(), StorageError> {
        // Verify the connection works
        let _conn = self.conn().await?;
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), StorageError> {
        let mut conn = self.conn().await?;
        let _: () = conn.del(Self::make_key(key)).await?;
        Ok(())
    }

    async fn expiry(&self, key: &str) -> Result<i64, StorageError> {
        // TTL already answers -2 for missing keys and -1 for keys without expiry.
        let mut conn = self.conn().await?;
        let remaining: i64 = conn.ttl(Self::make_key(key)).await?;
        Ok(remaining)
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
        let mut conn = self.conn().await?;
        let key = Self::make_key(key);

        if ttl <= 0 {
            let exists: bool = conn.exists(&key).await?;
            return Ok(!exists);
        }

        // SET NX EX claims the key and arms its expiry in one round trip.
        let reply: Option<String> = redis::cmd("SET")
            .arg(&key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl)
            .query_async(&mut conn)
            .await?;
        Ok(reply.is_some())
    }

    async fn get_str(&self, key: &str) -> Result<String, StorageError> {
        Ok(self.get(key).await?.unwrap_or_default())
    }

    async fn get_int(&self, key: &str) -> Result<i64, StorageError> {
        Ok(self.get(key).await?.map_or(0, |raw| decode_int(&raw)))
    }

    async fn get_msx(&self, key: &str) -> Result<SessionData, StorageError> {
        Ok(self
            .get(key)
            .await?
            .map(|raw| decode_msx(key, &raw))
            .unwrap_or_default())
    }

    async fn inc(&self, key: &str) -> Result<i64, StorageError> {
        let mut conn = self.conn().await?;
        let next: i64 = conn.incr(Self::make_key(key), 1).await?;
        Ok(next)
    }

    async fn set_str(&self, key: &str, val: &str) -> Result<(), StorageError> {
        self.set(key, val.to_string()).await
    }

    async fn set_int(&self, key: &str, val: i64) -> Result<(), StorageError> {
        self.set(key, val.to_string()).await
    }

    async fn set_msx(&self, key: &str, val: &SessionData) -> Result<(), StorageError> {
        self.set(key, serde_json::to_string(val)?).await
    }
}
