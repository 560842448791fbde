//! Principal and client context extraction.
//!
//! Identity is established upstream. This service reads the already
//! authenticated principal from `x-principal-id` and `x-principal-role`.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use std::convert::Infallible;

use crate::domain::{AuthenticatedPrincipal, RequestContext, Role};
use crate::error::AppError;

pub const PRINCIPAL_ID_HEADER: &str = "x-principal-id";
pub const PRINCIPAL_ROLE_HEADER: &str = "x-principal-role";

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

pub fn principal_from_headers(headers: &HeaderMap) -> Result<AuthenticatedPrincipal, AppError> {
    let id = header_str(headers, PRINCIPAL_ID_HEADER)
        .ok_or_else(|| AppError::Unauthorized("Missing principal".to_string()))?;
    let role = header_str(headers, PRINCIPAL_ROLE_HEADER)
        .ok_or_else(|| AppError::Unauthorized("Missing principal role".to_string()))?
        .parse::<Role>()
        .map_err(|_| AppError::Unauthorized("Unknown principal role".to_string()))?;

    Ok(AuthenticatedPrincipal::new(id, role))
}

pub fn context_from_headers(headers: &HeaderMap) -> RequestContext {
    // First hop of x-forwarded-for is the client.
    let ip_address = header_str(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let user_agent = header_str(headers, "user-agent").map(str::to_string);

    RequestContext::new(ip_address, user_agent)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedPrincipal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        principal_from_headers(&parts.headers)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(context_from_headers(&parts.headers))
    }
}

/// Guards the admin router. Use cases still check the role themselves.
pub async fn require_admin<B>(req: Request<B>, next: Next<B>) -> Result<Response, AppError> {
    let principal = principal_from_headers(req.headers())?;
    if !principal.is_admin() {
        tracing::warn!(
            principal_id = %principal.id,
            uri = %req.uri(),
            "Admin route requested by non-admin"
        );
        return Err(AppError::Forbidden("Admin role required".to_string()));
    }

    Ok(next.run(req).await)
}
