//! Redis-backed read-through cache (component D).
//!
//! Ported from `original_source/internal/redis/redis.go`'s `Get/Set/Delete`
//! shape, implemented against `redis::aio::ConnectionManager` (the crate
//! the rest of the retrieval pack reaches for — the teacher has no cache
//! dependency to generalize from this).

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use relation_core::Cache;
use relation_domain::{ErrorCode, RelationError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    pub async fn connect(addr: &str) -> Result<Self, RelationError> {
        let client = redis::Client::open(addr)
            .map_err(|e| RelationError::wrap(e, ErrorCode::Internal, "redis.Open"))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| RelationError::wrap(e, ErrorCode::Internal, "redis.Connect"))?;
        Ok(RedisCache { conn })
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get<T: DeserializeOwned + 'static>(&self, key: &str) -> Result<T, RelationError> {
        let mut conn = self.conn.clone();
        let raw: String = conn
            .get(key)
            .await
            .map_err(|e| RelationError::wrap(e, ErrorCode::NotFound, "cache.Get"))?;
        serde_json::from_str(&raw)
            .map_err(|e| RelationError::wrap(e, ErrorCode::Internal, "cache.Get decode"))
    }

    async fn set<T: Serialize + Sync + 'static>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<(), RelationError> {
        let raw = serde_json::to_string(value)
            .map_err(|e| RelationError::wrap(e, ErrorCode::Internal, "cache.Set encode"))?;
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, raw, ttl.as_secs().max(1))
            .await
            .map_err(|e| RelationError::wrap(e, ErrorCode::Internal, "cache.Set"))
    }

    async fn delete(&self, key: &str) -> Result<(), RelationError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key)
            .await
            .map_err(|e| RelationError::wrap(e, ErrorCode::Internal, "cache.Delete"))
    }
}
