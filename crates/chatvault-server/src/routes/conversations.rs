//! Conversation store listing routes.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chatvault_store::ListFilter;
use serde::Deserialize;

use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/conversations", get(list_conversations))
        .route("/conversations/{id}", get(get_conversation))
}

#[derive(Deserialize)]
struct ListQuery {
    provider: Option<String>,
    subject: Option<String>,
    #[serde(default = "default_page")]
    page: usize,
    #[serde(default = "default_page_size")]
    page_size: usize,
}

fn default_page() -> usize {
    1
}

fn default_page_size() -> usize {
    20
}

async fn list_conversations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Json<serde_json::Value> {
    let filter = ListFilter {
        provider: query.provider,
        subject: query.subject,
    };
    let (conversations, total) = state
        .store
        .list(&filter, query.page, query.page_size.clamp(1, 100));

    Json(serde_json::json!({
        "conversations": conversations,
        "total": total,
        "page": query.page,
        "page_size": query.page_size,
    }))
}

async fn get_conversation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<chatvault_core::Conversation>> {
    let conversation = state
        .store
        .get(&id)
        .ok_or_else(|| chatvault_core::Error::NotFound(format!("conversation {}", id)))?;
    Ok(Json(conversation))
}
