//! Environment-driven configuration. Ported from `src/config.rs` /
//! `chem-persistence/src/config.rs`'s `Lazy<Config>` + `dotenvy` pattern.

use std::env;

use once_cell::sync::Lazy;

static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenvy::dotenv();
});

/// Forces early `.env` loading for callers (CLI, server) that want it done
/// before reading any other environment variable.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub min_connections: u32,
    pub max_connections: u32,
}

impl DbConfig {
    pub fn from_env() -> Self {
        init_dotenv();
        let url = env::var("DATABASE_URL").expect("DATABASE_URL not set");
        let min_connections =
            env::var("DATABASE_MIN_CONNECTIONS").ok().and_then(|v| v.parse().ok()).unwrap_or(2);
        let max_connections =
            env::var("DATABASE_MAX_CONNECTIONS").ok().and_then(|v| v.parse().ok()).unwrap_or(10);
        DbConfig { url, min_connections, max_connections }
    }
}
