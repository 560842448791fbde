use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::ports::RepositoryError;
use crate::validation::{ValidationError, ValidationErrors};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(ValidationErrors),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("{reason} (risk score {risk_score})")]
    RiskBlocked { reason: String, risk_score: u8 },

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) | AppError::RiskBlocked { .. } => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
        }
    }

    /// Only infrastructure failures are defects; everything else is an expected outcome.
    pub fn is_internal(&self) -> bool {
        matches!(self, AppError::Internal(_))
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(errors)
    }
}

impl From<ValidationError> for AppError {
    fn from(error: ValidationError) -> Self {
        AppError::Validation(error.into())
    }
}

impl From<RepositoryError> for AppError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound(what) => AppError::NotFound(what),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match &self {
            AppError::Validation(errors) => json!({
                "error": "Validation failed",
                "errors": errors,
                "status": status.as_u16(),
            }),
            AppError::RiskBlocked { reason, risk_score } => json!({
                "error": reason,
                "risk_score": risk_score,
                "status": status.as_u16(),
            }),
            err if err.is_internal() => {
                tracing::error!("Request failed: {}", err);
                json!({
                    "error": "Internal server error",
                    "status": status.as_u16(),
                })
            }
            err => json!({
                "error": err.to_string(),
                "status": status.as_u16(),
            }),
        };

        (status, Json(body)).into_response()
    }
}
