use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::body_rejection;
use crate::domain::{
    AuditEventType, AuditOutcome, AuthenticatedPrincipal, RequestContext, VerificationAction,
};
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerifyRequest {
    pub action: VerificationAction,
    #[serde(default)]
    pub verification_notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SwiftValidateRequest {
    pub swift_code: String,
}

pub async fn list_pending(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
) -> Result<impl IntoResponse, AppError> {
    let pending = state.queries.list_pending(&principal).await?;
    Ok(Json(pending))
}

pub async fn verify_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    principal: AuthenticatedPrincipal,
    ctx: RequestContext,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload.map_err(body_rejection)?;
    let tx = state
        .verify_transaction
        .decide(
            id,
            &principal,
            request.action,
            request.verification_notes.as_deref(),
            &ctx,
        )
        .await?;

    Ok(Json(tx))
}

pub async fn validate_swift(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
    ctx: RequestContext,
    payload: Result<Json<SwiftValidateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload.map_err(body_rejection)?;
    let result = state.swift.validate(&request.swift_code);

    let outcome = if result.valid {
        AuditOutcome::Success
    } else {
        AuditOutcome::Failed
    };
    state
        .audit
        .record_for(
            AuditEventType::AdminAction,
            &principal,
            &ctx,
            outcome,
            json!({
                "action": "swift_validate",
                "swift_code": result.swift_code,
                "reason": result.reason,
            }),
        )
        .await;

    Ok(Json(result))
}
