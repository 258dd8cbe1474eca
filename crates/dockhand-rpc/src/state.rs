//! Shared state handed to every request.

use std::sync::Arc;

use dockhand_core::config::AuthConfig;

use crate::engine::RpcEngine;

/// Immutable after startup; cloning is cheap.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Frozen dispatch engine.
    pub engine: Arc<RpcEngine>,
    /// Credentials every request must present.
    pub auth: Arc<AuthConfig>,
}

impl AppState {
    pub fn new(engine: RpcEngine, auth: AuthConfig) -> Self {
        Self {
            engine: Arc::new(engine),
            auth: Arc::new(auth),
        }
    }
}
