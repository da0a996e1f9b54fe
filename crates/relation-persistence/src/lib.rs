//! relation-persistence: the Postgres-backed `Store` adapter (component C).
//!
//! Modules:
//! - `config`: environment-driven `DbConfig`, `.env` loading.
//! - `error`: sqlx error -> `RelationError` classification.
//! - `pg`: `PgStore`, the `relation_core::Store` implementation.

pub mod config;
pub mod error;
pub mod pg;

pub use config::{init_dotenv, DbConfig};
pub use error::classify;
pub use pg::PgStore;
