//! Credential validation route.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;

use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/credentials/validate", post(validate_credentials))
}

#[derive(Deserialize)]
struct ValidateRequest {
    provider: String,
    #[serde(default)]
    credentials: serde_json::Value,
}

async fn validate_credentials(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ValidateRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let credential = state.credential_from_fields(&req.provider, &req.credentials)?;
    let record = state.validator.validate(&req.provider, &credential).await?;
    Ok(Json(serde_json::json!({
        "provider": record.provider,
        "valid": record.valid,
        "fingerprint": record.fingerprint,
        "expires_at": record.expires_at,
        "permissions": record.permissions,
    })))
}
