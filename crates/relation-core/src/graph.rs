//! The Graph Store: concurrent in-memory adjacency list in front of a
//! persistent store and a read-through cache.
//!
//! Ported from `original_source/internal/graph/store.go`, generalized from
//! a single concrete Postgres/Redis pairing to generic `Store`/`Cache`
//! collaborators (component F / spec.md §4.F).

use std::collections::HashMap;
use std::time::Duration;

use log::{debug, warn};
use relation_domain::{error_code, ErrorCode, Friendship, Person, RelationError};
use tokio::sync::{OnceCell, RwLock};

use crate::traits::{Cache, Store};

const DEPTH_TTL: Duration = Duration::from_secs(5 * 60);
const FRIENDSHIP_TTL: Duration = Duration::from_secs(5);

struct Inner {
    nodes: Vec<Person>,
    edges: HashMap<i64, Vec<i64>>,
}

/// Concurrent-safe in-memory social graph, write-through to `repo` and
/// read-through against `cache`.
pub struct GraphStore<S: Store, C: Cache> {
    repo: S,
    cache: C,
    inner: RwLock<Inner>,
    loaded: OnceCell<()>,
}

impl<S: Store, C: Cache> GraphStore<S, C> {
    pub fn new(repo: S, cache: C) -> Self {
        GraphStore {
            repo,
            cache,
            inner: RwLock::new(Inner { nodes: Vec::new(), edges: HashMap::new() }),
            loaded: OnceCell::new(),
        }
    }

    /// Performs at most one full scan of the backing store, building
    /// `nodes`/`edges` atomically. Subsequent calls are no-ops (I4).
    ///
    /// `rows` is the already-fetched `people LEFT JOIN friendships` result
    /// (person id, name, created_at, nullable peer id), ordered by person
    /// id — spec.md §9 resolves the source's `FULL JOIN` down to a
    /// `LEFT JOIN` since the adjacency key is always the person. Fetching
    /// those rows is `relation-persistence`'s job; this only assembles them.
    pub async fn load(
        &self,
        rows: impl IntoIterator<Item = (Person, Option<i64>)>,
    ) -> Result<(), RelationError> {
        self.loaded
            .get_or_try_init(|| async {
                let mut guard = self.inner.write().await;
                let mut nodes: Vec<Person> = Vec::new();
                let mut edges: HashMap<i64, Vec<i64>> = HashMap::new();
                for (person, peer) in rows {
                    if nodes.last().map(|p| p.id) != Some(person.id) {
                        edges.entry(person.id).or_default();
                        nodes.push(person);
                    }
                    if let Some(peer_id) = peer {
                        edges.entry(nodes.last().unwrap().id).or_default().push(peer_id);
                    }
                }
                guard.nodes = nodes;
                guard.edges = edges;
                debug!("graph store loaded: {} nodes", guard.nodes.len());
                Ok::<(), RelationError>(())
            })
            .await?;
        Ok(())
    }

    pub async fn add_person(&self, mut person: Person) -> Result<Person, RelationError> {
        person.validate()?;
        self.repo.add_person(&mut person).await?;
        let mut guard = self.inner.write().await;
        guard.edges.entry(person.id).or_default();
        guard.nodes.push(person.clone());
        Ok(person)
    }

    /// After return, `repo` has the edge and `edges[friendship.p1.id]`
    /// contains the peer (P1). Re-checks I2 under the same write-lock
    /// acquisition that performs the insert (spec.md §9 Open Question:
    /// no drop-between-locks window).
    pub async fn add_friendship(&self, friendship: Friendship) -> Result<(), RelationError> {
        friendship.validate()?;
        if friendship.with.len() != 1 {
            return Err(RelationError::new(
                ErrorCode::Conflict,
                "provided friendship should only be with one person",
            ));
        }
        let peer = friendship.with[0];
        self.repo.add_friendship(&friendship).await?;

        let mut guard = self.inner.write().await;
        let entry = guard.edges.entry(friendship.p1.id).or_default();
        if !entry.contains(&peer) {
            entry.push(peer);
        }
        Ok(())
    }

    /// After return, the node and all its outgoing edges are removed (P2).
    pub async fn remove_person(&self, id: i64) -> Result<(), RelationError> {
        {
            let guard = self.inner.read().await;
            if !guard.nodes.iter().any(|p| p.id == id) {
                return Err(RelationError::new(ErrorCode::NotFound, "person not found"));
            }
        }
        self.repo.remove_person(id).await?;

        let mut guard = self.inner.write().await;
        guard.edges.remove(&id);
        for edges in guard.edges.values_mut() {
            edges.retain(|&peer| peer != id);
        }
        guard.nodes.retain(|p| p.id != id);
        Ok(())
    }

    pub async fn get_person(&self, id: i64) -> Result<Person, RelationError> {
        let guard = self.inner.read().await;
        guard
            .nodes
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| RelationError::new(ErrorCode::NotFound, "person not found"))
    }

    /// BFS hop count from `first` to `target`, endpoints inclusive.
    /// Cache-backed: checks `D<first><second>` then `D<second><first>`
    /// before computing; on success writes `D<first><second>` with a
    /// 5-minute TTL. A cache-set failure is reported but the already
    /// computed depth is still returned (spec.md §7).
    pub async fn get_depth(&self, first: i64, second: i64) -> Result<i64, RelationError> {
        let fwd_key = format!("D{first}{second}");
        if let Ok(depth) = self.cache.get::<i64>(&fwd_key).await {
            return Ok(depth);
        }
        let rev_key = format!("D{second}{first}");
        if let Ok(depth) = self.cache.get::<i64>(&rev_key).await {
            return Ok(depth);
        }

        let depth = self.bfs_depth(first, second).await?;

        if let Err(err) = self.cache.set(&fwd_key, &depth, DEPTH_TTL).await {
            warn!("cache.set failed for {fwd_key}: {err}");
        }
        Ok(depth)
    }

    async fn bfs_depth(&self, first: i64, target: i64) -> Result<i64, RelationError> {
        let guard = self.inner.read().await;
        if !guard.edges.contains_key(&first) || !guard.edges.contains_key(&target) {
            return Err(RelationError::new(ErrorCode::NotFound, "one of the ids provided doesn't exist"));
        }

        let mut queue = std::collections::VecDeque::new();
        let mut visited = std::collections::HashSet::new();
        queue.push_back(first);

        let mut count: i64 = 0;
        loop {
            let Some(cur) = queue.pop_front() else {
                return Err(RelationError::new(
                    ErrorCode::NotFound,
                    "target wasn't found in any relationship connection",
                ));
            };
            visited.insert(cur);
            if let Some(neighbors) = guard.edges.get(&cur) {
                for &next in neighbors {
                    if !visited.contains(&next) {
                        queue.push_back(next);
                    }
                }
            }
            count += 1;
            if cur == target {
                return Ok(count);
            }
        }
    }

    /// `{p1, with: outgoing peer ids}`, cache-backed with a 5-second TTL.
    pub async fn get_friendship(&self, id: i64) -> Result<Friendship, RelationError> {
        let key = format!("F{id}");
        if let Ok(friendship) = self.cache.get::<Friendship>(&key).await {
            return Ok(friendship);
        }

        let person = self.get_person(id).await?;
        let with = {
            let guard = self.inner.read().await;
            guard.edges.get(&person.id).cloned().unwrap_or_default()
        };
        let friendship = Friendship { p1: person, with };

        if let Err(err) = self.cache.set(&key, &friendship, FRIENDSHIP_TTL).await {
            warn!("cache.set failed for {key}: {err}");
        }
        Ok(friendship)
    }

    /// Snapshot of every node's outgoing adjacency.
    pub async fn get_all(&self) -> Result<Vec<Friendship>, RelationError> {
        let guard = self.inner.read().await;
        let mut out = Vec::with_capacity(guard.nodes.len());
        for person in &guard.nodes {
            let with = guard.edges.get(&person.id).cloned().unwrap_or_default();
            out.push(Friendship { p1: person.clone(), with });
        }
        Ok(out)
    }
}

/// `error_code` convenience for the `?`-propagated `RelationError` boxed as
/// `dyn Error` at crate boundaries that need it (HTTP handler surface).
pub fn classify(err: &RelationError) -> ErrorCode {
    error_code(err)
}
