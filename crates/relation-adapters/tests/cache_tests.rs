//! Requires a live `REDIS_URL`; skip-if-unset, mirroring the persistence
//! crate's `DATABASE_URL` gating.

use relation_adapters::RedisCache;
use relation_core::Cache;
use std::time::Duration;

macro_rules! skip_without_redis {
    () => {
        if std::env::var("REDIS_URL").is_err() {
            eprintln!("skip (no REDIS_URL)");
            return;
        }
    };
}

#[tokio::test]
async fn set_then_get_round_trips() {
    skip_without_redis!();
    let url = std::env::var("REDIS_URL").unwrap();
    let cache = RedisCache::connect(&url).await.unwrap();

    cache.set("relationer-test-key", &42i64, Duration::from_secs(5)).await.unwrap();
    let value: i64 = cache.get("relationer-test-key").await.unwrap();
    assert_eq!(value, 42);

    cache.delete("relationer-test-key").await.unwrap();
    assert!(cache.get::<i64>("relationer-test-key").await.is_err());
}

#[tokio::test]
async fn get_on_missing_key_is_an_error() {
    skip_without_redis!();
    let url = std::env::var("REDIS_URL").unwrap();
    let cache = RedisCache::connect(&url).await.unwrap();

    assert!(cache.get::<i64>("relationer-test-key-does-not-exist").await.is_err());
}
