//! Friendship domain type. See `original_source/internal/friendship.go`.
//!
//! Directed from `p1`'s perspective. The write form on the wire carries
//! exactly one peer in `with`; the read form may carry many (all outgoing
//! neighbors). Both use this one type — the single-peer constraint for
//! writes is enforced by `relation_core::GraphStore::add_friendship`, not
//! here (see spec.md §4.F).

use serde::{Deserialize, Serialize};

use crate::error::{ErrorCode, RelationError};
use crate::person::Person;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Friendship {
    pub p1: Person,
    pub with: Vec<i64>,
}

impl Friendship {
    pub fn validate(&self) -> Result<(), RelationError> {
        if self.with.is_empty() {
            return Err(RelationError::new(ErrorCode::Invalid, "at least one person is required"));
        }
        Ok(())
    }
}
