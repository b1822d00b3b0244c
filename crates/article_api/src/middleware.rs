//! Request logging middleware.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use log::info;
use std::time::Instant;

/// Logs one metadata-only line per request; bodies are never logged.
pub async fn log_requests(request: Request, next: Next) -> Response {
    let started_at = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    info!(
        "event=http_request module=api status={} method={} path={} duration_ms={}",
        response.status().as_u16(),
        method,
        path,
        started_at.elapsed().as_millis()
    );
    response
}
