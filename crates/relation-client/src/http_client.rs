//! Thin HTTP wrapper around the server's REST surface (spec.md §6),
//! grounded on `original_source/client/client.go`'s `Client` struct (the
//! broker-consuming half is `consumer`/`pool`; this is purely the outbound
//! request half the CLI needs).

use std::time::Duration;

use relation_domain::{ErrorCode, Friendship, Person, RelationError};
use serde::Deserialize;
use serde_json::json;

/// Default client HTTP timeout per spec.md §5.
const CLIENT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// A thin `reqwest`-backed client for the people/friendship HTTP API.
pub struct RelationClient {
    base_url: String,
    http: reqwest::Client,
}

impl RelationClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(CLIENT_TIMEOUT)
            .build()
            .expect("failed to build HTTP client");
        RelationClient { base_url: base_url.into(), http }
    }

    pub async fn add_person(&self, name: &str) -> Result<Person, RelationError> {
        let resp = self
            .http
            .post(format!("{}/people", self.base_url))
            .json(&json!({ "name": name }))
            .send()
            .await
            .map_err(|e| RelationError::wrap(e, ErrorCode::Internal, "request failed"))?;
        Self::decode(resp).await
    }

    pub async fn get_person(&self, id: i64) -> Result<Person, RelationError> {
        let resp = self
            .http
            .get(format!("{}/people/{id}", self.base_url))
            .send()
            .await
            .map_err(|e| RelationError::wrap(e, ErrorCode::Internal, "request failed"))?;
        Self::decode(resp).await
    }

    pub async fn remove_person(&self, id: i64) -> Result<(), RelationError> {
        let resp = self
            .http
            .delete(format!("{}/people/{id}", self.base_url))
            .send()
            .await
            .map_err(|e| RelationError::wrap(e, ErrorCode::Internal, "request failed"))?;
        Self::decode_empty(resp).await
    }

    /// `mutual` issues a second request with the endpoints swapped, matching
    /// the CLI's `--mutual` flag (spec.md §4.G's model: bidirectionality is
    /// two directed inserts, never a single symmetric write).
    pub async fn add_friendship(&self, p1: Person, peer: i64, mutual: bool) -> Result<Friendship, RelationError> {
        let body = json!({ "p1": p1, "with": [peer] });
        let resp = self
            .http
            .post(format!("{}/friendship", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| RelationError::wrap(e, ErrorCode::Internal, "request failed"))?;
        let friendship: Friendship = Self::decode(resp).await?;

        if mutual {
            let reverse = self.get_person(peer).await?;
            let body = json!({ "p1": reverse, "with": [friendship.p1.id] });
            let resp = self
                .http
                .post(format!("{}/friendship", self.base_url))
                .json(&body)
                .send()
                .await
                .map_err(|e| RelationError::wrap(e, ErrorCode::Internal, "request failed"))?;
            Self::decode::<Friendship>(resp).await?;
        }

        Ok(friendship)
    }

    pub async fn get_friendship(&self, id: i64) -> Result<Friendship, RelationError> {
        let resp = self
            .http
            .get(format!("{}/friendship/{id}", self.base_url))
            .send()
            .await
            .map_err(|e| RelationError::wrap(e, ErrorCode::Internal, "request failed"))?;
        Self::decode(resp).await
    }

    pub async fn get_depth(&self, p1: i64, p2: i64) -> Result<i64, RelationError> {
        #[derive(Deserialize)]
        struct DepthBody {
            depth: i64,
        }
        let resp = self
            .http
            .get(format!("{}/friendship/depth/{p1}/{p2}", self.base_url))
            .send()
            .await
            .map_err(|e| RelationError::wrap(e, ErrorCode::Internal, "request failed"))?;
        let body: DepthBody = Self::decode(resp).await?;
        Ok(body.depth)
    }

    async fn decode<T: for<'de> Deserialize<'de>>(resp: reqwest::Response) -> Result<T, RelationError> {
        let status = resp.status();
        if status.is_success() {
            resp.json::<T>()
                .await
                .map_err(|e| RelationError::wrap(e, ErrorCode::Internal, "decode response"))
        } else {
            Err(Self::error_from_body(status.as_u16(), resp).await)
        }
    }

    async fn decode_empty(resp: reqwest::Response) -> Result<(), RelationError> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::error_from_body(status.as_u16(), resp).await)
        }
    }

    async fn error_from_body(status: u16, resp: reqwest::Response) -> RelationError {
        let code = ErrorCode::from_http_status(status);
        match resp.json::<ErrorBody>().await {
            Ok(body) => RelationError::new(code, body.error),
            Err(_) => RelationError::new(code, format!("request failed with status {status}")),
        }
    }
}
