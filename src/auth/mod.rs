use crate::state::AppState;
use axum::Router;

mod claims;
pub mod cookies;
mod dto;
pub(crate) mod extractors;
pub mod handlers;
pub mod services;

pub fn router() -> Router<AppState> {
    handlers::token_routes()
}
