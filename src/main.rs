//! relationer-server: wires the Graph Store (component F) to a Postgres
//! `Store`, a Redis `Cache`, an AMQP `MessageBroker`, and the HTTP handler
//! surface (component H). Ported from the teacher's binary entrypoint
//! shape, generalized past the molecule-flow demo into a long-running
//! server per spec.md §5.

use std::sync::Arc;

use lapin::{Connection, ConnectionProperties};
use log::info;
use relation_adapters::{AmqpBroker, RedisCache};
use relation_core::GraphStore;
use relation_domain::{ErrorCode, RelationError};
use relation_persistence::PgStore;
use relationer_rust::config::CONFIG;
use relationer_rust::http;
use relationer_rust::state::AppState;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() {
    env_logger::init();

    if let Err(err) = run().await {
        log::error!("relationer-server exiting: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), RelationError> {
    let pg = PgStore::connect(&CONFIG.database).await?;
    pg.run_pending_migrations().await?;

    let cache = RedisCache::connect(&CONFIG.redis_url).await?;

    let amqp = Connection::connect(&CONFIG.amqp_url, ConnectionProperties::default())
        .await
        .map_err(|e| RelationError::wrap(e, ErrorCode::Internal, "amqp connect"))?;
    let channel = amqp
        .create_channel()
        .await
        .map_err(|e| RelationError::wrap(e, ErrorCode::Internal, "amqp create_channel"))?;
    let broker = AmqpBroker::connect(channel).await?;

    let rows = pg.load_rows().await?;
    let graph = GraphStore::new(pg, cache);
    graph.load(rows).await?;

    let state = AppState { graph: Arc::new(graph), broker: Arc::new(broker) };

    let app = http::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(CONFIG.request_timeout));

    info!("relationer-server listening on {}", CONFIG.http_addr);
    let listener = tokio::net::TcpListener::bind(&CONFIG.http_addr)
        .await
        .map_err(|e| RelationError::wrap(e, ErrorCode::Internal, "tcp bind"))?;
    axum::serve(listener, app).await.map_err(|e| RelationError::wrap(e, ErrorCode::Internal, "http serve"))?;
    Ok(())
}
