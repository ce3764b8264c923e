//! Access logging middleware.
//!
//! One `tracing` event per request with method, path, status, caller and
//! latency. Runs outermost; the caller id comes from the `AuthUser` the auth
//! middleware leaves on the response.

use std::time::Instant;

use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::api::types::AuthUser;

pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    let status = response.status().as_u16();
    let user_id = response
        .extensions()
        .get::<AuthUser>()
        .map(|u| u.user_id.to_string())
        .unwrap_or_else(|| "-".into());
    let latency_ms = started.elapsed().as_millis() as u64;

    if status >= 500 {
        tracing::warn!(%method, %path, status, %user_id, latency_ms, "request failed");
    } else {
        tracing::info!(%method, %path, status, %user_id, latency_ms, "request");
    }

    response
}
