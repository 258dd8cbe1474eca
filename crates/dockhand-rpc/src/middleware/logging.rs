//! Request logging.
//!
//! Every request is logged once it has been answered. Requests that reached
//! the RPC handler also carry the JSON-RPC method and whether it failed.

use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use tracing::info;

use crate::engine::CallSummary;

/// Logs HTTP method, path, status and duration, plus the RPC call if any.
pub async fn request_logging(request: Request, next: Next) -> Response {
    let http_method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    let duration_ms = start.elapsed().as_millis();
    let status = response.status().as_u16();

    match response.extensions().get::<CallSummary>() {
        Some(call) => info!(
            http_method = %http_method,
            path = %path,
            status,
            duration_ms = %duration_ms,
            rpc_method = call.method.as_deref().unwrap_or("<malformed>"),
            rpc_failed = call.failed,
            "RPC request"
        ),
        None => info!(
            http_method = %http_method,
            path = %path,
            status,
            duration_ms = %duration_ms,
            "HTTP request"
        ),
    }

    response
}
