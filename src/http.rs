//! HTTP handler surface (component H): a thin JSON adapter over the Graph
//! Store and the broker adapter. Routes exactly as spec.md §4.H, `chi`'s
//! `{id}` path params becoming axum's `:id`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use relation_core::MessageBroker;
use relation_domain::{Friendship, Person};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/people", get(get_all).post(add_person))
        .route("/people/:id", get(get_person).delete(remove_person))
        .route("/friendship", post(add_friendship))
        .route("/friendship/:id", get(get_friendship))
        .route("/friendship/depth/:a/:b", get(get_depth))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct AddPersonRequest {
    name: String,
}

#[derive(Debug, Serialize)]
struct DepthResponse {
    depth: i64,
}

async fn get_all(State(state): State<AppState>) -> Result<Json<Vec<Friendship>>, ApiError> {
    let all = state.graph.get_all().await?;
    Ok(Json(all))
}

/// `POST /people` → `AddPerson` then emit `person.created` (HTTP 201). The
/// broker publish failure surfaces to the caller but does not roll back
/// the already-committed store write (spec.md §7).
async fn add_person(
    State(state): State<AppState>,
    body: Result<Json<AddPersonRequest>, axum::extract::rejection::JsonRejection>,
) -> Result<(StatusCode, Json<Person>), ApiError> {
    let Json(req) = body?;
    let person = state.graph.add_person(Person::new(req.name)).await?;
    state.broker.created_person(&person).await?;
    Ok((StatusCode::CREATED, Json(person)))
}

async fn get_person(
    State(state): State<AppState>,
    id: Result<Path<i64>, axum::extract::rejection::PathRejection>,
) -> Result<Json<Person>, ApiError> {
    let Path(id) = id?;
    let person = state.graph.get_person(id).await?;
    Ok(Json(person))
}

/// `DELETE /people/{id}` → `RemovePerson` then emit `person.deleted`
/// (HTTP 204).
async fn remove_person(
    State(state): State<AppState>,
    id: Result<Path<i64>, axum::extract::rejection::PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    state.graph.remove_person(id).await?;
    state.broker.deleted_person(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /friendship` → `AddFriendship` then emit `friendship.created`
/// (HTTP 201).
async fn add_friendship(
    State(state): State<AppState>,
    body: Result<Json<Friendship>, axum::extract::rejection::JsonRejection>,
) -> Result<(StatusCode, Json<Friendship>), ApiError> {
    let Json(friendship) = body?;
    state.graph.add_friendship(friendship.clone()).await?;
    state.broker.created_friendship(&friendship).await?;
    Ok((StatusCode::CREATED, Json(friendship)))
}

async fn get_friendship(
    State(state): State<AppState>,
    id: Result<Path<i64>, axum::extract::rejection::PathRejection>,
) -> Result<Json<Friendship>, ApiError> {
    let Path(id) = id?;
    let friendship = state.graph.get_friendship(id).await?;
    Ok(Json(friendship))
}

async fn get_depth(
    State(state): State<AppState>,
    path: Result<Path<(i64, i64)>, axum::extract::rejection::PathRejection>,
) -> Result<Json<DepthResponse>, ApiError> {
    let Path((a, b)) = path?;
    let depth = state.graph.get_depth(a, b).await?;
    Ok(Json(DepthResponse { depth }))
}
