use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use pkg_types::error::GovernanceError;
use serde::Serialize;
use tracing::error;

/// JSON error body: `{"error": "<code>", "message": "<reason>"}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

/// Error returned by handlers; converts into an HTTP response.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn forbidden(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            code,
            message: message.into(),
        }
    }
}

impl From<GovernanceError> for ApiError {
    fn from(err: GovernanceError) -> Self {
        let status = StatusCode::from_u16(err.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!("Governance backend failure: {:#}", err);
        }
        let message = match &err {
            GovernanceError::PolicyDenied(denial) => denial.to_string(),
            GovernanceError::Store(_) => "internal storage error".to_string(),
            other => other.to_string(),
        };
        Self {
            status,
            code: err.error_code(),
            message,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.code.to_string(),
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
