//! Tagged error model shared by every layer of the system.
//!
//! Mirrors the closed error-code taxonomy the rest of the system classifies
//! failures into (CONFLICT, INTERNAL, INVALID, NOTFOUND) plus a
//! bidirectional mapping to HTTP status codes. Adapters (persistence,
//! cache, broker) wrap their own driver errors into a `RelationError` at
//! their boundary; nothing above that boundary ever matches on a driver
//! error type directly.

use std::error::Error as StdError;

use thiserror::Error;

/// Closed set of machine-readable error classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Conflict,
    Internal,
    Invalid,
    NotFound,
}

impl ErrorCode {
    /// Maps a code to its HTTP status. Every variant has exactly one status.
    pub fn http_status(self) -> u16 {
        match self {
            ErrorCode::Conflict => 409,
            ErrorCode::Invalid => 400,
            ErrorCode::NotFound => 404,
            ErrorCode::Internal => 500,
        }
    }

    /// Inverse of `http_status`. Unknown statuses classify as `Internal`.
    pub fn from_http_status(status: u16) -> ErrorCode {
        match status {
            409 => ErrorCode::Conflict,
            400 => ErrorCode::Invalid,
            404 => ErrorCode::NotFound,
            _ => ErrorCode::Internal,
        }
    }
}

/// A wrapped, tagged error. `origin` preserves the chain for `source()`,
/// `message` is the human-readable addition at this layer, `code` is the
/// machine-readable classification.
#[derive(Debug, Error)]
#[error("{}", self.render())]
pub struct RelationError {
    #[source]
    origin: Option<Box<dyn StdError + Send + Sync + 'static>>,
    message: String,
    code: ErrorCode,
}

impl RelationError {
    /// Builds a fresh error with no wrapped origin.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        RelationError { origin: None, message: message.into(), code }
    }

    /// Wraps an existing error, attaching a code and a new message.
    pub fn wrap(
        origin: impl StdError + Send + Sync + 'static,
        code: ErrorCode,
        message: impl Into<String>,
    ) -> Self {
        RelationError { origin: Some(Box::new(origin)), message: message.into(), code }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    fn render(&self) -> String {
        match &self.origin {
            Some(origin) => format!("{origin}: {}", self.message),
            None => self.message.clone(),
        }
    }
}

/// Walks the error chain looking for the deepest `RelationError` and
/// returns its code. A non-tagged error classifies as `Internal`.
pub fn error_code(err: &(dyn StdError + 'static)) -> ErrorCode {
    let mut cursor: Option<&(dyn StdError + 'static)> = Some(err);
    let mut found = None;
    while let Some(e) = cursor {
        if let Some(tagged) = e.downcast_ref::<RelationError>() {
            found = Some(tagged.code());
        }
        cursor = e.source();
    }
    found.unwrap_or(ErrorCode::Internal)
}

pub type Result<T> = std::result::Result<T, RelationError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn status_mapping_is_bidirectional() {
        for code in [ErrorCode::Conflict, ErrorCode::Internal, ErrorCode::Invalid, ErrorCode::NotFound] {
            assert_eq!(ErrorCode::from_http_status(code.http_status()), code);
        }
    }

    #[test]
    fn unknown_status_is_internal() {
        assert_eq!(ErrorCode::from_http_status(418), ErrorCode::Internal);
    }

    #[test]
    fn error_code_walks_wrapped_chain() {
        let io_err = io::Error::other("disk full");
        let wrapped = RelationError::wrap(io_err, ErrorCode::Internal, "tx.Commit");
        assert_eq!(error_code(&wrapped), ErrorCode::Internal);
    }

    #[test]
    fn display_includes_origin() {
        let io_err = io::Error::other("boom");
        let wrapped = RelationError::wrap(io_err, ErrorCode::Internal, "db.BeginTX");
        assert!(wrapped.to_string().contains("db.BeginTX"));
        assert!(wrapped.to_string().contains("boom"));
    }
}
