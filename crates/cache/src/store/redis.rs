//! Redis store backend
//!
//! Production backend over the `redis` crate's tokio connection manager. The
//! manager multiplexes one connection and reconnects on failure; individual
//! command errors still surface as `StoreUnavailable` so callers can fail
//! open. Command timeouts are the client's responsibility and must stay
//! finite, or a dead backend could hang the compute path.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use super::CacheStore;
use crate::{Error, Result};

/// A [`CacheStore`] backed by Redis.
#[derive(Clone)]
pub struct RedisStore {
    manager: ConnectionManager,
}

impl RedisStore {
    /// Connect to Redis at `url` (e.g. `redis://127.0.0.1:6379`).
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| Error::store_unavailable(format!("invalid Redis URL: {e}")))?;
        let manager = client
            .get_connection_manager()
            .await
            .map_err(|e| Error::store_unavailable(format!("connection failed: {e}")))?;
        Ok(Self { manager })
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RedisStore")
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.manager.clone();
        conn.get(key)
            .await
            .map_err(|e| Error::store_unavailable(format!("GET failed: {e}")))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.manager.clone();
        // SETEX rejects a zero expiry; clamp to the minimum of one second.
        let seconds = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, value, seconds)
            .await
            .map_err(|e| Error::store_unavailable(format!("SETEX failed: {e}")))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.manager.clone();
        conn.del::<_, ()>(key)
            .await
            .map_err(|e| Error::store_unavailable(format!("DEL failed: {e}")))
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        let mut conn = self.manager.clone();
        let remaining: i64 = conn
            .ttl(key)
            .await
            .map_err(|e| Error::store_unavailable(format!("TTL failed: {e}")))?;
        // Redis answers -2 for a missing key and -1 for a key without expiry.
        Ok(u64::try_from(remaining).ok().map(Duration::from_secs))
    }

    async fn scan(&self, prefix: &str) -> Result<Vec<String>> {
        let mut conn = self.manager.clone();
        let pattern = format!("{prefix}*");
        let mut keys = Vec::new();
        let mut iter = conn
            .scan_match::<_, String>(&pattern)
            .await
            .map_err(|e| Error::store_unavailable(format!("SCAN failed: {e}")))?;
        while let Some(key) = iter.next_item().await {
            keys.push(key);
        }
        Ok(keys)
    }
}
