//! Error-to-HTTP mapping for route handlers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chatvault_core::{Error, ErrorDetail};

/// Wrapper turning orchestrator errors into HTTP responses.
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::UnknownProvider(_) | Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::InvalidCredentials(_) => StatusCode::UNAUTHORIZED,
            Error::SchemaValidation { .. } | Error::MalformedPayload(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Error::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Error::JobAlreadyRunning { .. } | Error::SessionAlreadyActive { .. } => {
                StatusCode::CONFLICT
            }
            Error::CredentialsNotValidated(_) => StatusCode::PRECONDITION_FAILED,
            Error::ProviderUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::Execution(_) => StatusCode::BAD_GATEWAY,
            Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(serde_json::json!({ "error": ErrorDetail::from(&self.0) }));
        (status, body).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
