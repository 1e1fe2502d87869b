use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::Value;
use tracing::{info, instrument};

use crate::{
    auth::{extractors::AuthUser, services::authorize_owner},
    error::ApiError,
    state::AppState,
    store::{into_document, parse_id, Collection, DeleteResult, Filter, InsertOneResult},
};

pub fn recommendation_routes() -> Router<AppState> {
    Router::new()
        .route("/recommend", post(create_recommendation))
        .route("/recommend/:id", delete(delete_recommendation))
        .route("/my-recommendations/:email", get(my_recommendations))
        .route("/recommendations/:email", get(recommendations_for_owner))
}

#[instrument(skip(state, body))]
pub async fn create_recommendation(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<InsertOneResult>, ApiError> {
    let doc = into_document(body)?;
    let result = state
        .store
        .insert_one(Collection::Recommendations, doc)
        .await
        .map_err(ApiError::Store)?;
    info!(id = %result.inserted_id, "recommendation created");
    Ok(Json(result))
}

/// Recommendations written by `email` (top-level `email` field).
///
/// Needs a valid token but does not compare it to `email`.
#[instrument(skip(state, _principal))]
pub async fn my_recommendations(
    State(state): State<AppState>,
    AuthUser(_principal): AuthUser,
    Path(email): Path<String>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let docs = state
        .store
        .find(Collection::Recommendations, Filter::Email(email))
        .await
        .map_err(ApiError::Store)?;
    Ok(Json(docs))
}

/// Recommendations made on products owned by `email`.
#[instrument(skip(state))]
pub async fn recommendations_for_owner(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(email): Path<String>,
) -> Result<Json<Vec<Value>>, ApiError> {
    authorize_owner(&principal, &email)?;
    let docs = state
        .store
        .find(Collection::Recommendations, Filter::OwnerEmail(email))
        .await
        .map_err(ApiError::Store)?;
    Ok(Json(docs))
}

#[instrument(skip(state))]
pub async fn delete_recommendation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResult>, ApiError> {
    let id = parse_id(&id)?;
    let result = state
        .store
        .delete_one(Collection::Recommendations, id)
        .await
        .map_err(ApiError::Store)?;
    info!(%id, deleted = result.deleted_count, "recommendation delete");
    Ok(Json(result))
}
