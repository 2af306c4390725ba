use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisResult};

use super::{KvStore, StoreError};

/// Redis-backed store.
///
/// Holds one `ConnectionManager` for the life of the process; it multiplexes
/// concurrent callers and reconnects on its own. Each command is bounded by
/// `call_timeout`. A timed-out command is abandoned, not rolled back.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    call_timeout: Duration,
}

impl RedisStore {
    pub async fn connect(redis_url: &str, call_timeout: Duration) -> anyhow::Result<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self::new(conn, call_timeout))
    }

    pub fn new(conn: ConnectionManager, call_timeout: Duration) -> Self {
        Self { conn, call_timeout }
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = RedisResult<T>>,
    ) -> Result<T, StoreError> {
        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(result) => result.map_err(StoreError::from),
            Err(_) => Err(StoreError::Timeout(self.call_timeout)),
        }
    }
}

#[async_trait]
impl KvStore for RedisStore {
    async fn enumerate_keys(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn.clone();
        self.bounded(conn.keys::<_, Vec<String>>(pattern)).await
    }

    async fn get_all_fields(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        let mut conn = self.conn.clone();
        self.bounded(conn.hgetall::<_, HashMap<String, String>>(key))
            .await
    }

    async fn get_field(&self, key: &str, field: &str) -> Result<String, StoreError> {
        let mut conn = self.conn.clone();
        // HGET replies nil for a missing key or field
        self.bounded(conn.hget::<_, _, Option<String>>(key, field))
            .await?
            .ok_or_else(|| StoreError::NotFound {
                key: key.to_string(),
                field: field.to_string(),
            })
    }

    async fn set_add(&self, key: &str, member: &str) -> Result<usize, StoreError> {
        let mut conn = self.conn.clone();
        self.bounded(conn.sadd::<_, _, usize>(key, member)).await
    }

    async fn delete_fields(&self, key: &str, fields: &[&str]) -> Result<usize, StoreError> {
        let mut conn = self.conn.clone();
        self.bounded(conn.hdel::<_, _, usize>(key, fields)).await
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn.clone();
        self.bounded(conn.smembers::<_, Vec<String>>(key)).await
    }

    async fn set_fields(&self, key: &str, fields: &[(&str, &str)]) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        self.bounded(conn.hset_multiple::<_, _, _, ()>(key, fields))
            .await
    }
}
