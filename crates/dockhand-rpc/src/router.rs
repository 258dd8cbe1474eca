//! Route definitions for the RPC listener.
//!
//! Only `/rpc` is dispatched; every other path is a 404. Authentication
//! wraps the fallback too, so unauthenticated callers always see 401.

use axum::Router;
use axum::middleware as axum_middleware;
use axum::routing::any;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Path the JSON-RPC endpoint is served on.
pub const RPC_PATH: &str = "/rpc";

/// Build the complete router with all middleware.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(RPC_PATH, any(handlers::rpc))
        .fallback(handlers::not_found)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_basic_auth,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}
