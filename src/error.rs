//! Maps every error surface the HTTP layer can produce onto spec.md
//! §4.H/§6/§7's `{"error": "<msg>"}` envelope, grounded on `estuary-flow`'s
//! `AppError`/`IntoResponse` shape.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::error;
use relation_domain::{error_code, RelationError};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Every error an HTTP handler can surface, mapped to the status spec.md
/// §4.H/§7 dictates. Malformed JSON and unparseable path ids both surface
/// as 409, overriding axum's own 400/422 defaults for those rejections.
#[derive(Debug)]
pub enum ApiError {
    Relation(RelationError),
    MalformedJson(JsonRejection),
    InvalidId(PathRejection),
}

impl From<RelationError> for ApiError {
    fn from(err: RelationError) -> Self {
        ApiError::Relation(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(err: JsonRejection) -> Self {
        ApiError::MalformedJson(err)
    }
}

impl From<PathRejection> for ApiError {
    fn from(err: PathRejection) -> Self {
        ApiError::InvalidId(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Relation(err) => {
                let status = StatusCode::from_u16(error_code(err).http_status())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                (status, err.to_string())
            }
            ApiError::MalformedJson(err) => (StatusCode::CONFLICT, err.to_string()),
            ApiError::InvalidId(_) => (StatusCode::CONFLICT, "invalid id".to_string()),
        };

        if status.is_server_error() {
            error!(target: "relationer", "{status} {message}");
        }
        (status, Json(ErrorBody { error: message })).into_response()
    }
}
