//! Server-wide configuration. Ported from the teacher's `src/config.rs`
//! `Lazy<AppConfig>` + `dotenvy` pattern, generalized past a single
//! database section into the full ambient stack this server needs.

use std::env;
use std::time::Duration;

use once_cell::sync::Lazy;
use relation_persistence::DbConfig;

fn env_duration_ms(key: &str, default_ms: u64) -> Duration {
    let ms = env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default_ms);
    Duration::from_millis(ms)
}

/// Application-wide configuration, evaluated once on first access.
pub struct AppConfig {
    pub database: DbConfig,
    pub redis_url: String,
    pub amqp_url: String,
    pub http_addr: String,
    /// Applies to reads, writes, and idle connections alike (spec.md §5's
    /// "1s read/write/idle" server timeout).
    pub request_timeout: Duration,
}

pub static CONFIG: Lazy<AppConfig> = Lazy::new(|| {
    relation_persistence::init_dotenv();
    AppConfig {
        database: DbConfig::from_env(),
        redis_url: env::var("REDIS_URL").expect("REDIS_URL not set"),
        amqp_url: env::var("AMQP_URL").expect("AMQP_URL not set"),
        http_addr: env::var("HTTP_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
        request_timeout: env_duration_ms("REQUEST_TIMEOUT_MS", 1_000),
    }
});
