//! The plugin capability contract.
//!
//! A plugin is one of two tiers:
//!
//! - [`BasePlugin`]: a named, versioned unit that may publish a manifest and
//!   registers its RPC methods into the shared [`DispatchTable`].
//! - [`InstallablePlugin`]: additionally manages one container per install,
//!   addressed by container id.
//!
//! Drivers that can install an application implement [`Installer`] on top,
//! which lets [`InstallableService`](crate::InstallableService) generate the
//! whole standard RPC surface for them.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use dockhand_core::error::AppError;
use dockhand_core::result::AppResult;

use crate::dispatch::DispatchTable;
use crate::manifest::Manifest;
use crate::options::PluginOptions;
use crate::runtime::{ContainerRuntime, ContainerState, STOP_GRACE};

/// Identity and RPC registration shared by every plugin.
pub trait BasePlugin: Send + Sync + std::fmt::Debug {
    /// Lowercase plugin name, e.g. `deluge`.
    fn name(&self) -> &str;

    /// Driver version, bumped when install behaviour changes.
    fn version(&self) -> i32;

    /// Static metadata, if the plugin publishes any.
    fn manifest(&self) -> Option<&Manifest>;

    /// Service name the plugin's methods are registered under.
    fn rpc_name(&self) -> String {
        capitalize(self.name())
    }

    /// Attaches this plugin's methods to `table`.
    ///
    /// Claiming a service name that is already taken fails with `Conflict`.
    fn register_rpc(self: Arc<Self>, table: &mut DispatchTable) -> AppResult<()>;
}

/// Container lifecycle for plugins that install an application.
///
/// All operations forward to the plugin's [`ContainerRuntime`].
#[async_trait]
pub trait InstallablePlugin: BasePlugin {
    /// The container engine this plugin drives.
    fn runtime(&self) -> &Arc<dyn ContainerRuntime>;

    /// Starts an existing container.
    async fn start(&self, container_id: &str) -> AppResult<()> {
        ensure_exists(self.runtime().as_ref(), container_id, "start").await?;
        self.runtime().start_container(container_id).await?;
        info!(plugin = %self.name(), container_id = %container_id, "Container started");
        Ok(())
    }

    /// Stops a running container.
    async fn stop(&self, container_id: &str) -> AppResult<()> {
        ensure_exists(self.runtime().as_ref(), container_id, "stop").await?;
        self.runtime()
            .stop_container(container_id, STOP_GRACE)
            .await?;
        info!(plugin = %self.name(), container_id = %container_id, "Container stopped");
        Ok(())
    }

    /// Stops then starts a container. A failed stop is logged and ignored.
    async fn restart(&self, container_id: &str) -> AppResult<()> {
        if let Err(e) = self.stop(container_id).await {
            warn!(
                plugin = %self.name(),
                container_id = %container_id,
                error = %e,
                "Stop before restart failed, starting anyway"
            );
        }
        self.start(container_id).await
    }

    /// Current state of a container.
    async fn status(&self, container_id: &str) -> AppResult<ContainerState> {
        require_id(container_id)?;
        self.runtime().inspect_container(container_id).await
    }

    /// Force-removes a container.
    async fn uninstall(&self, container_id: &str) -> AppResult<()> {
        require_id(container_id)?;
        debug!(plugin = %self.name(), container_id = %container_id, "Removing container");
        self.runtime().remove_container(container_id).await?;
        info!(plugin = %self.name(), container_id = %container_id, "Container removed");
        Ok(())
    }
}

/// The driver-specific install step.
#[async_trait]
pub trait Installer: InstallablePlugin + 'static {
    /// Options the driver accepts; must embed [`BaseOptions`](crate::BaseOptions).
    type Options: PluginOptions;

    /// Installs the application, filling in `options` as it goes.
    ///
    /// On success `options.base().container_id` names the new container.
    /// Whatever state `options` is left in, success or not, becomes the
    /// job's final options snapshot.
    async fn install(&self, options: &mut Self::Options) -> AppResult<()>;
}

fn require_id(container_id: &str) -> AppResult<()> {
    if container_id.is_empty() {
        return Err(AppError::validation("container_id is required"));
    }
    Ok(())
}

async fn ensure_exists(
    runtime: &dyn ContainerRuntime,
    container_id: &str,
    action: &str,
) -> AppResult<()> {
    require_id(container_id)?;
    if !runtime.container_exists(container_id).await? {
        return Err(AppError::not_found(format!(
            "Could not find container to {action} with id '{container_id}'"
        )));
    }
    Ok(())
}

/// Upper-cases the first character: `deluge` → `Deluge`.
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use dockhand_core::error::ErrorKind;

    use super::*;
    use crate::runtime::ContainerSpec;
    use crate::runtime::mock::MockRuntime;

    #[derive(Debug)]
    struct Bare {
        runtime: Arc<dyn ContainerRuntime>,
    }

    impl BasePlugin for Bare {
        fn name(&self) -> &str {
            "bare"
        }

        fn version(&self) -> i32 {
            1
        }

        fn manifest(&self) -> Option<&Manifest> {
            None
        }

        fn register_rpc(self: Arc<Self>, _table: &mut DispatchTable) -> AppResult<()> {
            Ok(())
        }
    }

    impl InstallablePlugin for Bare {
        fn runtime(&self) -> &Arc<dyn ContainerRuntime> {
            &self.runtime
        }
    }

    fn bare() -> (Bare, Arc<MockRuntime>) {
        let mock = Arc::new(MockRuntime::new());
        let runtime: Arc<dyn ContainerRuntime> = mock.clone();
        (Bare { runtime }, mock)
    }

    #[test]
    fn test_rpc_name_defaults_to_capitalized_name() {
        let (plugin, _) = bare();
        assert_eq!(plugin.rpc_name(), "Bare");
        assert_eq!(capitalize(""), "");
    }

    #[tokio::test]
    async fn test_start_stop_status() {
        let (plugin, mock) = bare();
        let id = mock
            .insert_container(ContainerSpec::new("bare_1", "bare"), false)
            .await;

        plugin.start(&id).await.expect("start");
        assert_eq!(plugin.status(&id).await.expect("status").running, Some(true));

        plugin.stop(&id).await.expect("stop");
        assert_eq!(plugin.status(&id).await.expect("status").running, Some(false));
    }

    #[tokio::test]
    async fn test_missing_container_is_not_found() {
        let (plugin, mock) = bare();
        for err in [
            plugin.start("nope").await.unwrap_err(),
            plugin.stop("nope").await.unwrap_err(),
            plugin.status("nope").await.unwrap_err(),
            plugin.uninstall("nope").await.unwrap_err(),
        ] {
            assert_eq!(err.kind, ErrorKind::NotFound);
        }
        assert!(
            !mock
                .calls()
                .await
                .iter()
                .any(|c| c.starts_with("start_container") || c.starts_with("stop_container"))
        );
    }

    #[tokio::test]
    async fn test_empty_id_rejected() {
        let (plugin, _) = bare();
        let err = plugin.start("").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_restart_ignores_stop_failure() {
        let (plugin, mock) = bare();
        let id = mock
            .insert_container(ContainerSpec::new("bare_1", "bare"), false)
            .await;
        mock.fail_on("stop_container", "already stopped").await;

        plugin.restart(&id).await.expect("restart");
        assert!(mock.container(&id).await.expect("exists").running);
    }

    #[tokio::test]
    async fn test_uninstall_removes() {
        let (plugin, mock) = bare();
        let id = mock
            .insert_container(ContainerSpec::new("bare_1", "bare"), true)
            .await;

        plugin.uninstall(&id).await.expect("uninstall");
        assert_eq!(mock.container_count().await, 0);
    }
}
