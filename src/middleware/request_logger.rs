//! Per-request tracing with a correlation id.

use axum::{
    body::Body,
    http::{HeaderValue, Method, Request, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::time::Instant;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Larger JSON bodies are summarized instead of logged.
const BODY_LOG_LIMIT: usize = 1024;

fn body_logging_enabled() -> bool {
    std::env::var("LOG_REQUEST_BODY")
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(false)
}

/// Masked rendering of a request body. Submissions carry account numbers.
fn describe_body(bytes: &[u8]) -> String {
    match serde_json::from_slice::<serde_json::Value>(bytes) {
        Ok(json) if bytes.len() <= BODY_LOG_LIMIT => {
            serde_json::to_string(&crate::utils::sanitize::sanitize_json(&json))
                .unwrap_or_else(|_| "[unprintable json]".to_string())
        }
        Ok(_) => format!("[json, {} bytes]", bytes.len()),
        Err(_) => format!("[non-json, {} bytes]", bytes.len()),
    }
}

/// Buffers the body for logging and hands back an equivalent request.
async fn log_with_body(
    req: Request<Body>,
    request_id: &str,
    method: &Method,
    uri: &Uri,
) -> Result<Request<Body>, Response> {
    let (parts, body) = req.into_parts();
    let bytes = hyper::body::to_bytes(body).await.map_err(|e| {
        tracing::warn!(
            request_id = %request_id,
            method = %method,
            uri = %uri,
            "Unreadable request body: {}",
            e
        );
        (StatusCode::BAD_REQUEST, "Unreadable request body").into_response()
    })?;

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        body_size = bytes.len(),
        body = %describe_body(&bytes),
        "Request received"
    );

    Ok(Request::from_parts(parts, Body::from(bytes)))
}

pub async fn request_logger_middleware(mut req: Request<Body>, next: Next<Body>) -> Response {
    let started = Instant::now();
    let request_id = Uuid::new_v4().to_string();
    let header_value = HeaderValue::from_str(&request_id).ok();
    let method = req.method().clone();
    let uri = req.uri().clone();

    if let Some(value) = header_value.clone() {
        req.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    if body_logging_enabled() {
        req = match log_with_body(req, &request_id, &method, &uri).await {
            Ok(req) => req,
            Err(rejection) => return rejection,
        };
    } else {
        tracing::info!(request_id = %request_id, method = %method, uri = %uri, "Request received");
    }

    let mut response = next.run(req).await;

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = response.status().as_u16(),
        latency_ms = started.elapsed().as_millis() as u64,
        "Request completed"
    );

    if let Some(value) = header_value {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::post, Router};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_response_carries_request_id() {
        let app = Router::new()
            .route("/transactions", post(|| async { "ok" }))
            .layer(axum::middleware::from_fn(request_logger_middleware));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/transactions")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let id = response.headers().get(REQUEST_ID_HEADER).unwrap();
        assert!(Uuid::parse_str(id.to_str().unwrap()).is_ok());
    }

    #[test]
    fn body_description_masks_account_numbers() {
        let body = br#"{"recipient_account_info":{"account_number":"62001234567"}}"#;
        let described = describe_body(body);
        assert!(!described.contains("62001234567"));

        assert_eq!(describe_body(b"plain"), "[non-json, 5 bytes]");
    }
}
