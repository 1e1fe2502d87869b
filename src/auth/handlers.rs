use axum::{
    extract::{FromRef, State},
    http::{header, HeaderMap},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        cookies::{cleared_token_cookie, token_cookie},
        dto::{StatusResponse, TokenRequest},
        services::{is_valid_email, JwtKeys},
    },
    error::ApiError,
    state::AppState,
};

pub fn token_routes() -> Router<AppState> {
    Router::new()
        .route("/jwt", post(issue_token))
        .route("/logout", get(logout))
}

/// Issues an identity token for the submitted email and sets it as a cookie.
///
/// No proof of control over the address is taken; the token is the sole
/// identity evidence from here on.
#[instrument(skip(state, payload))]
pub async fn issue_token(
    State(state): State<AppState>,
    Json(payload): Json<TokenRequest>,
) -> Result<(HeaderMap, Json<StatusResponse>), ApiError> {
    let email = payload.email.trim();
    if !is_valid_email(email) {
        warn!(%email, "invalid email");
        return Err(ApiError::BadRequest("Invalid email".into()));
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(email).map_err(ApiError::Internal)?;
    let cookie = token_cookie(token, keys.ttl, state.config.production).map_err(ApiError::Internal)?;

    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, cookie);
    info!(%email, "token issued");
    Ok((headers, Json(StatusResponse { success: true })))
}

#[instrument(skip(state))]
pub async fn logout(
    State(state): State<AppState>,
) -> Result<(HeaderMap, Json<StatusResponse>), ApiError> {
    let cookie = cleared_token_cookie(state.config.production).map_err(ApiError::Internal)?;
    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, cookie);
    info!("token cookie cleared");
    Ok((headers, Json(StatusResponse { success: true })))
}
