//! Extraction job routes — submit, status, cancel, summary.

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
        .route("/extractions", post(submit_job).get(job_summary))
        .route("/extractions/{id}", get(job_status))
        .route("/extractions/{id}/cancel", post(cancel_job))
}

#[derive(Deserialize)]
struct SubmitRequest {
    provider: String,
    tool_name: String,
    #[serde(default)]
    parameters: serde_json::Value,
}

async fn submit_job(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SubmitRequest>,
) -> ApiResult<(StatusCode, Json<serde_json::Value>)> {
    let credential = state.credential_from_fields(&req.provider, &req.parameters)?;
    let job_id = state
        .scheduler
        .submit(&req.provider, &req.tool_name, &credential, req.parameters)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({
            "job_id": job_id,
            "provider": req.provider,
            "tool_name": req.tool_name,
        })),
    ))
}

async fn job_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<chatvault_jobs::ExtractionJob>> {
    Ok(Json(state.scheduler.status(&id)?))
}

async fn cancel_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    state.scheduler.cancel(&id)?;
    Ok(Json(serde_json::json!({ "success": true, "job_id": id })))
}

async fn job_summary(State(state): State<Arc<AppState>>) -> Json<chatvault_jobs::JobSummary> {
    Json(state.scheduler.summary())
}
