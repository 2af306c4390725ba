pub mod memory;
pub mod redis;

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] ::redis::RedisError),

    #[error("store call timed out after {0:?}")]
    Timeout(Duration),

    #[error("field {field:?} not found in {key}")]
    NotFound { key: String, field: String },
}

/// Minimal key-value contract the request workflow is built on.
///
/// Every operation is atomic for the single key it touches and nothing more.
/// Implementations: RedisStore (production), MemoryStore (tests, local dev).
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Keys matching a glob pattern such as `request:*`.
    async fn enumerate_keys(&self, pattern: &str) -> Result<Vec<String>, StoreError>;

    /// All fields of a hash. A missing key yields an empty map.
    async fn get_all_fields(&self, key: &str) -> Result<HashMap<String, String>, StoreError>;

    /// One field of a hash, or `StoreError::NotFound`.
    async fn get_field(&self, key: &str, field: &str) -> Result<String, StoreError>;

    /// Add a member to a set. Returns how many members were new (0 or 1).
    async fn set_add(&self, key: &str, member: &str) -> Result<usize, StoreError>;

    /// Delete fields from a hash in one call. Returns how many were removed.
    async fn delete_fields(&self, key: &str, fields: &[&str]) -> Result<usize, StoreError>;

    async fn set_members(&self, key: &str) -> Result<Vec<String>, StoreError>;

    async fn set_fields(&self, key: &str, fields: &[(&str, &str)]) -> Result<(), StoreError>;
}
