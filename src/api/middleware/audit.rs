//! Access logging and response hardening.
//!
//! Logs method, path, status and latency for every request, and marks every
//! response as non-cacheable since bodies may carry health information.

use std::time::Instant;

use axum::http::header::{HeaderValue, CACHE_CONTROL};
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let mut response = next.run(req).await;

    response
        .headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));

    let status = response.status().as_u16();
    let latency_ms = started.elapsed().as_millis() as u64;
    if response.status().is_server_error() {
        tracing::warn!(%method, %path, status, latency_ms, "API access");
    } else {
        tracing::info!(%method, %path, status, latency_ms, "API access");
    }

    response
}
