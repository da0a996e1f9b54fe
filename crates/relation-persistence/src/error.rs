//! Classifies sqlx/Postgres driver errors into the shared `ErrorCode`
//! taxonomy. Mirrors `chem-persistence::PersistenceError::from(DieselError)`'s
//! kind-matching, retargeted at sqlx's error shape, and
//! `original_source/internal/postgresql/store.go`'s `parsePostgreErr`.

use relation_domain::{ErrorCode, RelationError};

/// Postgres SQLSTATE for a unique-constraint violation.
const UNIQUE_VIOLATION: &str = "23505";

pub fn classify(err: sqlx::Error) -> RelationError {
    match &err {
        sqlx::Error::RowNotFound => RelationError::wrap(err, ErrorCode::NotFound, "row not found"),
        sqlx::Error::Database(db_err) => {
            if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
                let msg = db_err.message().to_string();
                RelationError::wrap(err, ErrorCode::Conflict, msg)
            } else {
                let msg = db_err.message().to_string();
                RelationError::wrap(err, ErrorCode::Internal, msg)
            }
        }
        _ => RelationError::wrap(err, ErrorCode::Internal, "database error"),
    }
}
