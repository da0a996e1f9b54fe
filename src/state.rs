//! Shared application state threaded through every handler via `axum::State`.

use std::sync::Arc;

use relation_adapters::{AmqpBroker, RedisCache};
use relation_core::GraphStore;
use relation_persistence::PgStore;

pub type Graph = GraphStore<PgStore, RedisCache>;

#[derive(Clone)]
pub struct AppState {
    pub graph: Arc<Graph>,
    pub broker: Arc<AmqpBroker>,
}
