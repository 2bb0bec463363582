//! Request logging middleware

use std::time::Instant;

use axum::{
    body::Body,
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

/// Log one line per request inside a span carrying a request id
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let span = info_span!("request", request_id = %Uuid::new_v4(), method = %method, path = %path);

    let response = next.run(request).instrument(span.clone()).await;

    let _entered = span.enter();
    let status = response.status();
    let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

    if status.is_server_error() {
        warn!(status = status.as_u16(), duration_ms, "Request failed");
    } else if status.is_client_error() && status != StatusCode::NOT_FOUND {
        warn!(status = status.as_u16(), duration_ms, "Request rejected");
    } else if path != "/health" {
        info!(status = status.as_u16(), duration_ms, "Request completed");
    }

    response
}
