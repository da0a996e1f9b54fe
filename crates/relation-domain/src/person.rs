//! Person domain type. See `original_source/internal/person.go`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ErrorCode, RelationError};

/// A person in the social graph. `id` is unset (`0`) until the persistent
/// store assigns one on insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: i64,
    pub name: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Person {
    /// A not-yet-persisted person with an unset id.
    pub fn new(name: impl Into<String>) -> Self {
        Person { id: 0, name: name.into(), created_at: Utc::now() }
    }

    pub fn validate(&self) -> Result<(), RelationError> {
        if self.name.is_empty() {
            return Err(RelationError::new(ErrorCode::Invalid, "name is a required field"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_name() {
        let p = Person::new("");
        assert!(p.validate().is_err());
    }

    #[test]
    fn accepts_non_empty_name() {
        let p = Person::new("Ada");
        assert!(p.validate().is_ok());
    }

    #[test]
    fn json_roundtrip_is_identity() {
        let p = Person { id: 7, name: "Grace".into(), created_at: Utc::now() };
        let encoded = serde_json::to_string(&p).unwrap();
        let decoded: Person = serde_json::from_str(&encoded).unwrap();
        assert_eq!(p, decoded);
    }
}
