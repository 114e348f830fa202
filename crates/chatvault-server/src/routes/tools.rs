//! Direct tool invocation route.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;

use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/tools/invoke", post(invoke_tool))
}

#[derive(Deserialize)]
struct InvokeRequest {
    provider: String,
    tool_name: String,
    #[serde(default)]
    parameters: serde_json::Value,
}

async fn invoke_tool(
    State(state): State<Arc<AppState>>,
    Json(req): Json<InvokeRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let credential = state.credential_from_fields(&req.provider, &req.parameters)?;
    let result = state
        .gateway
        .invoke(&req.tool_name, &req.provider, &credential, &req.parameters)
        .await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "tool_name": result.tool,
        "provider": result.provider,
        "result": result.output,
        "execution_time_ms": result.elapsed_ms,
    })))
}
