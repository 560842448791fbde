pub mod admin;
pub mod transactions;

use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::validation::ValidationError;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub db: String,
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let db_status = match state.transactions.health_check().await {
        Ok(()) => "connected",
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            "disconnected"
        }
    };

    let health_response = HealthStatus {
        status: if db_status == "connected" {
            "healthy".to_string()
        } else {
            "unhealthy".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        db: db_status.to_string(),
    };

    // Return 503 if the store is down, 200 otherwise
    let status_code = if db_status == "connected" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(health_response))
}

/// Malformed or unexpected JSON bodies are reported like any other validation failure.
pub(crate) fn body_rejection(rejection: JsonRejection) -> AppError {
    AppError::from(ValidationError::new("body", rejection.body_text()))
}
