//! Exercises spec.md §8's invariants P1-P4 and scenarios S2-S3 against an
//! in-memory `Store`/`Cache` test double pair.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use relation_core::{Cache, GraphStore, Store};
use relation_domain::{Friendship, Person, RelationError};
use serde::de::DeserializeOwned;
use serde::Serialize;

struct FakeStore {
    next_id: AtomicI64,
}

impl FakeStore {
    fn new() -> Self {
        FakeStore { next_id: AtomicI64::new(1) }
    }
}

#[async_trait]
impl Store for FakeStore {
    async fn add_person(&self, person: &mut Person) -> Result<(), RelationError> {
        person.id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn add_friendship(&self, _friendship: &Friendship) -> Result<(), RelationError> {
        Ok(())
    }

    async fn remove_person(&self, _id: i64) -> Result<(), RelationError> {
        Ok(())
    }
}

#[derive(Default)]
struct FakeCache {
    values: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl Cache for FakeCache {
    async fn get<T: DeserializeOwned + 'static>(&self, key: &str) -> Result<T, RelationError> {
        let values = self.values.lock().unwrap();
        let raw = values
            .get(key)
            .ok_or_else(|| RelationError::new(relation_domain::ErrorCode::NotFound, "miss"))?;
        serde_json::from_str(raw)
            .map_err(|e| RelationError::wrap(e, relation_domain::ErrorCode::Internal, "cache decode"))
    }

    async fn set<T: Serialize + Sync + 'static>(
        &self,
        key: &str,
        value: &T,
        _ttl: Duration,
    ) -> Result<(), RelationError> {
        let raw = serde_json::to_string(value)
            .map_err(|e| RelationError::wrap(e, relation_domain::ErrorCode::Internal, "cache encode"))?;
        self.values.lock().unwrap().insert(key.to_string(), raw);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), RelationError> {
        self.values.lock().unwrap().remove(key);
        Ok(())
    }
}

fn store() -> GraphStore<FakeStore, FakeCache> {
    GraphStore::new(FakeStore::new(), FakeCache::default())
}

#[tokio::test]
async fn p1_add_friendship_creates_edge() {
    let g = store();
    let u = g.add_person(Person::new("u")).await.unwrap();
    let v = g.add_person(Person::new("v")).await.unwrap();
    g.add_friendship(Friendship { p1: u.clone(), with: vec![v.id] }).await.unwrap();

    let f = g.get_friendship(u.id).await.unwrap();
    assert!(f.with.contains(&v.id));
}

#[tokio::test]
async fn p2_remove_person_cascades() {
    let g = store();
    let a = g.add_person(Person::new("a")).await.unwrap();
    let b = g.add_person(Person::new("b")).await.unwrap();
    g.add_friendship(Friendship { p1: a.clone(), with: vec![b.id] }).await.unwrap();
    g.add_friendship(Friendship { p1: b.clone(), with: vec![a.id] }).await.unwrap();

    g.remove_person(b.id).await.unwrap();

    assert!(g.get_person(b.id).await.is_err());
    let remaining = g.get_friendship(a.id).await.unwrap();
    assert!(!remaining.with.contains(&b.id));
}

#[tokio::test]
async fn s2_unidirectional_depth_is_inclusive_and_directed() {
    let g = store();
    let a = g.add_person(Person::new("a")).await.unwrap();
    let b = g.add_person(Person::new("b")).await.unwrap();
    let c = g.add_person(Person::new("c")).await.unwrap();
    g.add_friendship(Friendship { p1: a.clone(), with: vec![b.id] }).await.unwrap();
    g.add_friendship(Friendship { p1: b.clone(), with: vec![c.id] }).await.unwrap();

    assert_eq!(g.get_depth(a.id, c.id).await.unwrap(), 3);
    assert!(g.get_depth(c.id, a.id).await.is_err());
}

#[tokio::test]
async fn s3_remove_middle_node_breaks_path() {
    let g = store();
    let a = g.add_person(Person::new("a")).await.unwrap();
    let b = g.add_person(Person::new("b")).await.unwrap();
    let c = g.add_person(Person::new("c")).await.unwrap();
    g.add_friendship(Friendship { p1: a.clone(), with: vec![b.id] }).await.unwrap();
    g.add_friendship(Friendship { p1: b.clone(), with: vec![c.id] }).await.unwrap();

    g.remove_person(b.id).await.unwrap();

    let a_edges = g.get_friendship(a.id).await.unwrap();
    assert!(a_edges.with.is_empty());
    let c_edges = g.get_friendship(c.id).await.unwrap();
    assert!(c_edges.with.is_empty());
    assert!(g.get_depth(a.id, c.id).await.is_err());
}

#[tokio::test]
async fn p4_depth_is_stable_across_repeated_calls() {
    let g = store();
    let a = g.add_person(Person::new("a")).await.unwrap();
    let b = g.add_person(Person::new("b")).await.unwrap();
    g.add_friendship(Friendship { p1: a.clone(), with: vec![b.id] }).await.unwrap();

    let first = g.get_depth(a.id, b.id).await.unwrap();
    let second = g.get_depth(a.id, b.id).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn add_friendship_rejects_more_than_one_peer() {
    let g = store();
    let a = g.add_person(Person::new("a")).await.unwrap();
    let b = g.add_person(Person::new("b")).await.unwrap();
    let c = g.add_person(Person::new("c")).await.unwrap();

    let err = g.add_friendship(Friendship { p1: a, with: vec![b.id, c.id] }).await.unwrap_err();
    assert_eq!(err.code(), relation_domain::ErrorCode::Conflict);
}

#[tokio::test]
async fn load_runs_at_most_once() {
    let g = store();
    let rows = vec![(Person { id: 1, name: "a".into(), created_at: chrono::Utc::now() }, None)];
    g.load(rows).await.unwrap();
    // Second call is a no-op even with different rows.
    let rows2 = vec![(Person { id: 2, name: "b".into(), created_at: chrono::Utc::now() }, None)];
    g.load(rows2).await.unwrap();

    assert!(g.get_person(1).await.is_ok());
    assert!(g.get_person(2).await.is_err());
}
