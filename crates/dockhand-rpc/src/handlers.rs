//! HTTP handlers.

use axum::{Extension, Json};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;

use crate::codec::RpcResponse;
use crate::engine::CallSummary;
use crate::state::AppState;

/// `/rpc`: one buffered JSON-RPC request in, one response out.
///
/// The call summary rides along as a response extension for the request log.
pub async fn rpc(
    State(state): State<AppState>,
    body: Bytes,
) -> (Extension<CallSummary>, Json<RpcResponse>) {
    let (summary, response) = state.engine.handle_call(&body).await;
    (Extension(summary), Json(response))
}

/// Every other path.
pub async fn not_found() -> Response {
    StatusCode::NOT_FOUND.into_response()
}
