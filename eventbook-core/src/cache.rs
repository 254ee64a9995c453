use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use log::warn;
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// How long a cached value lives before it expires on its own, in seconds
pub const DEFAULT_TTL_SECONDS: u64 = 1800;

pub type CacheResult<T> = std::result::Result<T, CacheError>;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache is unreachable: {0}")]
    Unreachable(String),
    #[error("Cache operation failed: {0}")]
    Operation(String),
}

/// A key-value store with expiring entries
#[async_trait]
pub trait CacheStore: Send + Sync + 'static {
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;
    async fn set_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> CacheResult<()>;
    async fn del(&self, key: &str) -> CacheResult<()>;
    async fn ping(&self) -> CacheResult<()>;
    async fn flush_all(&self) -> CacheResult<()>;
}

/// A redis implementation of [CacheStore]
pub struct RedisCache {
    manager: ConnectionManager,
}

impl RedisCache {
    pub async fn new(url: &str) -> CacheResult<Self> {
        let client = Client::open(url).map_err(|e| CacheError::Unreachable(e.to_string()))?;

        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheError::Unreachable(e.to_string()))?;

        Ok(Self { manager })
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.manager.clone();

        conn.get(key)
            .await
            .map_err(|e| CacheError::Operation(e.to_string()))
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> CacheResult<()> {
        let mut conn = self.manager.clone();

        conn.set_ex(key, value, ttl_seconds)
            .await
            .map_err(|e| CacheError::Operation(e.to_string()))
    }

    async fn del(&self, key: &str) -> CacheResult<()> {
        let mut conn = self.manager.clone();

        conn.del(key)
            .await
            .map_err(|e| CacheError::Operation(e.to_string()))
    }

    async fn ping(&self) -> CacheResult<()> {
        let mut conn = self.manager.clone();

        redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::Operation(e.to_string()))
    }

    async fn flush_all(&self) -> CacheResult<()> {
        let mut conn = self.manager.clone();

        redis::cmd("FLUSHALL")
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::Operation(e.to_string()))
    }
}

/// Cache-aside helper over a [CacheStore].
///
/// Reads go through the cache, falling back to the source of truth when the
/// cache is unreachable. Writers are responsible for invalidating the keys
/// they make stale, via [CacheLayer::invalidate].
#[derive(Clone)]
pub struct CacheLayer {
    store: Arc<dyn CacheStore>,
}

impl CacheLayer {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// Returns the cached value under `key`, or computes, stores and returns
    /// a fresh one. A cache error bypasses the cache entirely, so the read
    /// still succeeds. A compute error propagates and nothing is stored.
    pub async fn get_or_compute<T, E, F, Fut>(&self, key: &str, compute: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        match self.store.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => return Ok(value),
                // A corrupt entry is treated as a miss and overwritten below
                Err(e) => warn!("Discarding unreadable cache entry {}: {}", key, e),
            },
            Ok(None) => {}
            Err(e) => {
                warn!("Cache read for {} failed, going to the source: {}", key, e);
                return compute().await;
            }
        }

        let fresh = compute().await?;

        match serde_json::to_string(&fresh) {
            Ok(raw) => {
                if let Err(e) = self.store.set_ex(key, &raw, DEFAULT_TTL_SECONDS).await {
                    warn!("Cache write for {} failed: {}", key, e);
                }
            }
            Err(e) => warn!("Could not serialize value for cache key {}: {}", key, e),
        }

        Ok(fresh)
    }

    /// Deletes the given keys. Deleting a key that doesn't exist is a no-op,
    /// and cache errors are logged rather than surfaced.
    pub async fn invalidate(&self, keys: &[&str]) {
        for key in keys {
            if let Err(e) = self.store.del(key).await {
                warn!("Cache invalidation for {} failed: {}", key, e);
            }
        }
    }

    pub async fn ping(&self) -> CacheResult<()> {
        self.store.ping().await
    }
}
