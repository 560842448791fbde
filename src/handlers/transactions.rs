use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use super::body_rejection;
use crate::domain::{AuthenticatedPrincipal, RequestContext};
use crate::error::AppError;
use crate::validation::RawTransactionDraft;
use crate::AppState;

pub async fn create_transaction(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
    ctx: RequestContext,
    payload: Result<Json<RawTransactionDraft>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(raw) = payload.map_err(body_rejection)?;
    let tx = state.create_transaction.execute(&principal, &raw, &ctx).await?;

    Ok((StatusCode::CREATED, Json(tx)))
}

pub async fn list_my_transactions(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
) -> Result<impl IntoResponse, AppError> {
    let transactions = state.queries.list_mine(&principal).await?;
    Ok(Json(transactions))
}

pub async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    principal: AuthenticatedPrincipal,
) -> Result<impl IntoResponse, AppError> {
    let tx = state.queries.get(&principal, id).await?;
    Ok(Json(tx))
}
