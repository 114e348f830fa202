//! Provider and tool listing routes.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/providers", get(list_providers))
        .route("/providers/{id}/tools", get(list_provider_tools))
        .route("/tools", get(list_all_tools))
}

async fn list_providers(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let providers = state.registry.list_providers();
    Json(serde_json::json!({
        "providers": providers,
        "total_providers": providers.len(),
        "total_tools": state.registry.total_tools(),
    }))
}

async fn list_provider_tools(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let tools = state.registry.list_tools(Some(&id))?;
    Ok(Json(serde_json::json!({
        "provider": id,
        "tools": tools,
        "count": tools.len(),
    })))
}

async fn list_all_tools(State(state): State<Arc<AppState>>) -> ApiResult<Json<serde_json::Value>> {
    let tools = state.registry.list_tools(None)?;
    Ok(Json(serde_json::json!({
        "tools": tools,
        "count": tools.len(),
    })))
}
