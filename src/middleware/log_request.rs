//! Per-request structured logging: one `info!` event per request carrying
//! method, path, status, and duration.

use std::time::Instant;

use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

pub async fn log_requests<B>(request: Request<B>, next: Next<B>) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    tracing::info!(
        %method,
        %path,
        status = response.status().as_u16(),
        duration_ms = start.elapsed().as_millis() as u64,
        "request"
    );

    response.into_response()
}
