use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use service::errors::{ServiceError, NON_FIELD};
use thiserror::Error;
use tracing::{error, warn};

/// HTTP rendering of a service failure.
#[derive(Debug)]
pub struct ApiError(pub ServiceError);

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self { Self(e) }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ServiceError::Validation(_) | ServiceError::Conflict(_) | ServiceError::Gateway(_) => StatusCode::BAD_REQUEST,
            ServiceError::Unauthenticated | ServiceError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Db(_) | ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.0.code();
        let body = match self.0 {
            ServiceError::Validation(errors) => json!({ "errors": errors.as_map() }),
            ServiceError::Conflict(detail) => {
                warn!(code, %detail, "constraint violation reached the HTTP layer");
                json!({ "errors": { NON_FIELD: ["A record with these values already exists."] } })
            }
            e @ (ServiceError::Db(_) | ServiceError::Internal(_)) => {
                error!(code, error = %e, "request failed");
                json!({ "error": "internal server error" })
            }
            e => json!({ "error": e.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("payment gateway setup failed: {0}")]
    Gateway(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}
