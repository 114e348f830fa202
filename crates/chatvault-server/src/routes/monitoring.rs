//! Monitoring session routes.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/monitoring", post(start_monitoring).get(list_sessions))
        .route("/monitoring/{id}", get(session_status))
        .route("/monitoring/{id}/stop", post(stop_monitoring))
        .route("/monitoring/{id}/pause", post(pause_monitoring))
        .route("/monitoring/{id}/resume", post(resume_monitoring))
}

#[derive(Deserialize)]
struct StartRequest {
    provider: String,
    tool_name: String,
    #[serde(default)]
    parameters: serde_json::Value,
    webhook_url: String,
}

async fn start_monitoring(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StartRequest>,
) -> ApiResult<(StatusCode, Json<serde_json::Value>)> {
    let credential = state.credential_from_fields(&req.provider, &req.parameters)?;
    let session_id = state.monitor.start(
        &req.provider,
        &req.tool_name,
        &credential,
        req.parameters,
        &req.webhook_url,
    )?;

    let session = state.monitor.status(&session_id)?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "session_id": session.id,
            "provider": session.provider,
            "tool_name": session.tool,
            "status": session.state,
            "started_at": session.started_at,
            "next_check": session.next_poll_at,
        })),
    ))
}

async fn list_sessions(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let sessions = state.monitor.list();
    Json(serde_json::json!({
        "sessions": sessions,
        "count": sessions.len(),
    }))
}

async fn session_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<chatvault_monitor::MonitoringSession>> {
    Ok(Json(state.monitor.status(&id)?))
}

async fn stop_monitoring(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    state.monitor.stop(&id)?;
    Ok(Json(serde_json::json!({
        "success": true,
        "session_id": id,
        "status": "stopped",
    })))
}

async fn pause_monitoring(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    state.monitor.pause(&id)?;
    Ok(Json(serde_json::json!({
        "success": true,
        "session_id": id,
        "status": "paused",
    })))
}

async fn resume_monitoring(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    state.monitor.resume(&id)?;
    Ok(Json(serde_json::json!({
        "success": true,
        "session_id": id,
        "status": "active",
    })))
}
