use crate::error::StoreResult;
use async_trait::async_trait;
use std::time::Duration;

/// Port for the key/value store backing the cache
///
/// Values are opaque serialized strings. Implementations may be remote and
/// shared between processes; callers guard every call with retries.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Store `value` under `key`, expiring after `ttl`
    async fn set(&self, key: &str, value: String, ttl: Duration) -> StoreResult<()>;

    /// Delete a key, returning whether it existed
    async fn delete(&self, key: &str) -> StoreResult<bool>;

    /// Keys matching a glob pattern (`*` matches any run of characters)
    async fn keys(&self, pattern: &str) -> StoreResult<Vec<String>>;
}
