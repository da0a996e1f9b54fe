//! Capability contracts for the Graph Store's collaborators.
//!
//! Ported from `original_source/internal/service/{store,cache,message_broker}.go`.
//! Rust has no interface-vs-struct split the way Go does; these traits are
//! the direct translation of the Go `service` package's interfaces, and
//! each has exactly one production implementation (in `relation-persistence`
//! / `relation-adapters`) plus in-memory/no-op test doubles, matching
//! spec.md §9's "interface abstraction over polymorphism" note.

use async_trait::async_trait;
use relation_domain::{Friendship, Person, RelationError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// The persistent relational backing store (component C).
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Inserts `person` and writes the generated id back into it.
    async fn add_person(&self, person: &mut Person) -> Result<(), RelationError>;

    /// Inserts a single directed edge `friendship.p1 -> friendship.with[0]`.
    async fn add_friendship(&self, friendship: &Friendship) -> Result<(), RelationError>;

    /// Deletes the person and, via schema cascade, their outgoing/incoming edges.
    async fn remove_person(&self, id: i64) -> Result<(), RelationError>;
}

/// A TTL'd read-through cache (component D). Any `Err` from `get` is a miss.
#[async_trait]
pub trait Cache: Send + Sync + 'static {
    async fn get<T: DeserializeOwned + 'static>(&self, key: &str) -> Result<T, RelationError>;

    async fn set<T: Serialize + Sync + 'static>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<(), RelationError>;

    async fn delete(&self, key: &str) -> Result<(), RelationError>;
}

/// The server-side change-event publisher (component E).
#[async_trait]
pub trait MessageBroker: Send + Sync + 'static {
    async fn created_person(&self, person: &Person) -> Result<(), RelationError>;
    async fn created_friendship(&self, friendship: &Friendship) -> Result<(), RelationError>;
    async fn deleted_person(&self, id: i64) -> Result<(), RelationError>;
}
