//! Cache backends
//!
//! Derived aggregates are memoized in a key/value cache with a fixed TTL.
//! The production backend is Redis; values are stored as JSON strings.

pub mod problems;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use crate::error::AppResult;

#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get_raw(&self, key: &str) -> AppResult<Option<String>>;

    async fn set_raw(&self, key: &str, value: &str, ttl_secs: u64) -> AppResult<()>;

    async fn delete(&self, key: &str) -> AppResult<()>;
}

/// Redis backed cache
#[derive(Clone)]
pub struct RedisCache {
    redis: ConnectionManager,
}

impl RedisCache {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl CacheBackend for RedisCache {
    async fn get_raw(&self, key: &str) -> AppResult<Option<String>> {
        let mut redis = self.redis.clone();
        let value: Option<String> = redis.get(key).await?;
        Ok(value)
    }

    async fn set_raw(&self, key: &str, value: &str, ttl_secs: u64) -> AppResult<()> {
        let mut redis = self.redis.clone();
        redis.set_ex::<_, _, ()>(key, value, ttl_secs).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let mut redis = self.redis.clone();
        redis.del::<_, ()>(key).await?;
        Ok(())
    }
}
