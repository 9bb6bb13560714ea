//! Key-value store adapters
//!
//! [`CacheStore`] is the thin seam between the cache and its backend: get,
//! set-with-ttl, delete, remaining-ttl, and a prefix scan. Every transport or
//! protocol failure surfaces as [`Error::StoreUnavailable`]; callers decide
//! whether to fail open.
//!
//! Values are text (base64 cipher tokens), so any text-capable KV protocol
//! with TTL support can back this trait.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::Result;

pub mod memory;
pub mod redis;

pub use memory::MemoryStore;
pub use redis::RedisStore;

/// Adapter over a key-value backend with TTL support.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch the value at `key`, or `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write `value` at `key` with a time-to-live.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Remove the entry at `key`. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Remaining time-to-live of the entry at `key`, if the backend tracks
    /// one (`None` for absent entries and entries without expiry).
    async fn ttl(&self, key: &str) -> Result<Option<Duration>>;

    /// All keys currently starting with `prefix`.
    ///
    /// Each call is a fresh, finite scan — a snapshot, not a live cursor.
    /// Entries created or evicted mid-scan may or may not appear.
    async fn scan(&self, prefix: &str) -> Result<Vec<String>>;
}

// Shared handles delegate, so one store can back several cache instances
// (e.g. the pre- and post-rotation cipher configurations).
#[async_trait]
impl<S: CacheStore + ?Sized> CacheStore for Arc<S> {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        (**self).set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key).await
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        (**self).ttl(key).await
    }

    async fn scan(&self, prefix: &str) -> Result<Vec<String>> {
        (**self).scan(prefix).await
    }
}
