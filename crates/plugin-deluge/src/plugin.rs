//! Deluge plugin implementation.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use dockhand_core::result::AppResult;
use dockhand_plugin::manifest::load_manifest;
use dockhand_plugin::options::free_port;
use dockhand_plugin::{
    BasePlugin, ContainerRuntime, ContainerSpec, DispatchTable, InstallablePlugin,
    InstallableService, Installer, Manifest, PluginContext,
};
use dockhand_jobs::JobStore;

use crate::options::DelugeOptions;

/// Plugin name; also the config-folder and manifest-override name.
pub const NAME: &str = "deluge";

/// Image every Deluge container runs.
pub const IMAGE: &str = "linuxserver/deluge";

const BUILTIN_MANIFEST: &str = include_str!("../data/manifest.toml");

/// Deluge driver.
///
/// The container runs with the image's stock web UI configuration. The
/// generated `password` is reported back in the job options but is not
/// written into Deluge's `web.conf`, so the web UI keeps the image's default
/// password until the caller changes it.
#[derive(Debug)]
pub struct DelugePlugin {
    manifest: Manifest,
    runtime: Arc<dyn ContainerRuntime>,
    jobs: Arc<JobStore>,
    home_root: PathBuf,
}

impl DelugePlugin {
    /// Loads the manifest and binds the driver to the shared resources.
    pub fn new(ctx: &PluginContext) -> AppResult<Self> {
        let manifest = load_manifest(NAME, BUILTIN_MANIFEST, ctx.manifest_dir.as_deref())?;
        Ok(Self {
            manifest,
            runtime: Arc::clone(&ctx.runtime),
            jobs: Arc::clone(&ctx.jobs),
            home_root: ctx.home_root.clone(),
        })
    }

    /// Container name for an install on `web_port`.
    pub fn container_name(web_port: &str) -> String {
        format!("dockhand_{NAME}_{web_port}")
    }
}

impl BasePlugin for DelugePlugin {
    fn name(&self) -> &str {
        NAME
    }

    fn version(&self) -> i32 {
        1
    }

    fn manifest(&self) -> Option<&Manifest> {
        Some(&self.manifest)
    }

    fn register_rpc(self: Arc<Self>, table: &mut DispatchTable) -> AppResult<()> {
        let jobs = Arc::clone(&self.jobs);
        InstallableService::new(self, jobs).register(table)
    }
}

impl InstallablePlugin for DelugePlugin {
    fn runtime(&self) -> &Arc<dyn ContainerRuntime> {
        &self.runtime
    }
}

#[async_trait]
impl Installer for DelugePlugin {
    type Options = DelugeOptions;

    async fn install(&self, options: &mut DelugeOptions) -> AppResult<()> {
        info!(plugin = NAME, "Starting Deluge installation");

        options.base.set_defaults(NAME, &self.home_root).await?;
        if options.daemon_port.is_empty() {
            options.daemon_port = free_port().await?;
        }

        debug!(
            plugin = NAME,
            config_folder = %options.base.config_folder,
            data_folder = %options.base.data_folder,
            web_port = %options.base.web_port,
            daemon_port = %options.daemon_port,
            "Deluge options resolved"
        );

        tokio::fs::create_dir_all(&options.base.config_folder).await?;

        self.runtime.pull_image(IMAGE).await?;

        let spec = ContainerSpec {
            binds: options.base.default_bindings(),
            network_mode: Some("host".to_string()),
            ..ContainerSpec::new(Self::container_name(&options.base.web_port), IMAGE)
        };
        let container_id = self.runtime.create_container(&spec).await?;

        self.runtime.start_container(&container_id).await?;
        options.base.container_id = container_id;

        info!(
            plugin = NAME,
            container_id = %options.base.container_id,
            "Deluge container running"
        );
        Ok(())
    }
}
