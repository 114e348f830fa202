//! HTTP route handlers.

pub mod conversations;
pub mod credentials;
pub mod extractions;
pub mod monitoring;
pub mod providers;
pub mod tools;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;

use crate::state::AppState;

/// Build the main Axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(providers::routes())
        .merge(credentials::routes())
        .merge(extractions::routes())
        .merge(monitoring::routes())
        .merge(tools::routes())
        .merge(conversations::routes())
}
