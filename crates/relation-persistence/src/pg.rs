//! Postgres-backed `Store` (component C).
//!
//! Ported from `original_source/internal/postgresql/{postgresql,store}.go`'s
//! `BeginTX`/`defer tx.Rollback()`/`tx.Commit()` shape, realized with sqlx's
//! `pool.begin()` (whose `Transaction` rolls back on `Drop` if never
//! committed — no explicit deferred-rollback call needed), following the
//! async pattern `src/config.rs` + `src/database/repository.rs` establish in
//! the root binary rather than the diesel-based sibling crate.

use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use log::debug;
use relation_core::Store;
use relation_domain::{Friendship, Person, RelationError};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::DbConfig;
use crate::error::classify;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(config: &DbConfig) -> Result<Self, RelationError> {
        let pool = PgPoolOptions::new()
            .min_connections(config.min_connections)
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await
            .map_err(classify)?;
        Ok(PgStore { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        PgStore { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the embedded migrations. Ported from
    /// `chem-persistence/src/migrations.rs`'s embedded-migration wrapper,
    /// retargeted at sqlx's `migrate!` macro in place of diesel's.
    pub async fn run_pending_migrations(&self) -> Result<(), RelationError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| RelationError::wrap(e, relation_domain::ErrorCode::Internal, "migrate"))
    }

    /// Fetches every person row left-joined against its outgoing friendship
    /// edges, ordered by person id, for `GraphStore::load` to assemble.
    /// spec.md §9 resolves the Go source's `FULL JOIN` down to a `LEFT JOIN`
    /// since the adjacency key is always the person side.
    pub async fn load_rows(&self) -> Result<Vec<(Person, Option<i64>)>, RelationError> {
        let rows = sqlx::query_as::<_, (i64, String, chrono::DateTime<Utc>, Option<i64>)>(
            "SELECT p.id, p.name, p.created_at, f.person2_id \
             FROM people p \
             LEFT JOIN friendships f ON f.person1_id = p.id \
             ORDER BY p.id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(classify)?;

        Ok(rows
            .into_iter()
            .map(|(id, name, created_at, peer)| (Person { id, name, created_at }, peer))
            .collect())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn add_person(&self, person: &mut Person) -> Result<(), RelationError> {
        let mut tx = self.pool.begin().await.map_err(classify)?;
        let now = Utc::now().trunc_subsecs(0);

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO people (name, created_at) VALUES ($1, $2) RETURNING id",
        )
        .bind(&person.name)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(classify)?;

        person.id = id;
        person.created_at = now;
        tx.commit().await.map_err(classify)?;
        debug!("added person {id}");
        Ok(())
    }

    async fn add_friendship(&self, friendship: &Friendship) -> Result<(), RelationError> {
        let peer = friendship.with[0];
        let mut tx = self.pool.begin().await.map_err(classify)?;

        sqlx::query("INSERT INTO friendships (person1_id, person2_id) VALUES ($1, $2)")
            .bind(friendship.p1.id)
            .bind(peer)
            .execute(&mut *tx)
            .await
            .map_err(classify)?;

        tx.commit().await.map_err(classify)?;
        debug!("added friendship {} -> {}", friendship.p1.id, peer);
        Ok(())
    }

    async fn remove_person(&self, id: i64) -> Result<(), RelationError> {
        let mut tx = self.pool.begin().await.map_err(classify)?;

        sqlx::query("DELETE FROM people WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(classify)?;

        tx.commit().await.map_err(classify)?;
        debug!("removed person {id}");
        Ok(())
    }
}
