use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::Value;
use tracing::{info, instrument};

use super::dto::ProductUpdate;
use crate::{
    auth::{extractors::AuthUser, services::authorize_owner},
    error::ApiError,
    state::AppState,
    store::{
        into_document, parse_id, Collection, DeleteResult, Filter, InsertOneResult, UpdateResult,
    },
};

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/product", post(create_product))
        .route("/products", get(list_products))
        .route("/products/:email", get(list_products_by_owner))
        .route("/productQuery/:id", get(get_product))
        .route(
            "/product/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/update/:id", put(update_product))
        .route("/newProduct", get(featured_products))
}

#[instrument(skip(state, body))]
pub async fn create_product(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<InsertOneResult>, ApiError> {
    let doc = into_document(body)?;
    let result = state
        .store
        .insert_one(Collection::Products, doc)
        .await
        .map_err(ApiError::Store)?;
    info!(id = %result.inserted_id, "product created");
    Ok(Json(result))
}

#[instrument(skip(state))]
pub async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<Value>>, ApiError> {
    let docs = state
        .store
        .find(Collection::Products, Filter::All)
        .await
        .map_err(ApiError::Store)?;
    Ok(Json(docs))
}

#[instrument(skip(state))]
pub async fn featured_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let docs = state
        .store
        .find(Collection::Products, Filter::Featured)
        .await
        .map_err(ApiError::Store)?;
    Ok(Json(docs))
}

/// Responds with the document, or `null` when the id is unknown.
#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Option<Value>>, ApiError> {
    let id = parse_id(&id)?;
    let doc = state
        .store
        .find_one(Collection::Products, id)
        .await
        .map_err(ApiError::Store)?;
    Ok(Json(doc))
}

#[instrument(skip(state))]
pub async fn list_products_by_owner(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(email): Path<String>,
) -> Result<Json<Vec<Value>>, ApiError> {
    authorize_owner(&principal, &email)?;
    let docs = state
        .store
        .find(Collection::Products, Filter::OwnerEmail(email))
        .await
        .map_err(ApiError::Store)?;
    Ok(Json(docs))
}

#[instrument(skip(state, body))]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ProductUpdate>,
) -> Result<Json<UpdateResult>, ApiError> {
    let id = parse_id(&id)?;
    let result = state
        .store
        .update_one_upsert(Collection::Products, id, body.into_fields())
        .await
        .map_err(ApiError::Store)?;
    info!(
        %id,
        matched = result.matched_count,
        upserted = result.upserted_count,
        "product updated"
    );
    Ok(Json(result))
}

#[instrument(skip(state))]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResult>, ApiError> {
    let id = parse_id(&id)?;
    let result = state
        .store
        .delete_one(Collection::Products, id)
        .await
        .map_err(ApiError::Store)?;
    info!(%id, deleted = result.deleted_count, "product delete");
    Ok(Json(result))
}
