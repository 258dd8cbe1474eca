//! Listener lifecycle.

use std::future::Future;

use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use dockhand_core::config::ServerConfig;
use dockhand_core::error::{AppError, ErrorKind};
use dockhand_core::result::AppResult;

/// Binds the configured address and serves `app` until `shutdown` resolves.
///
/// In-flight requests finish before this returns; detached install tasks
/// are not waited for.
pub async fn serve<F>(config: &ServerConfig, app: Router, shutdown: F) -> AppResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Configuration,
            format!("Failed to bind {addr}: {e}"),
            e,
        )
    })?;

    info!(addr = %addr, "RPC server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("RPC server stopped");
    Ok(())
}
