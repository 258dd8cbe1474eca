//! Plugin context: the shared resources a driver is constructed with.

use std::path::PathBuf;
use std::sync::Arc;

use dockhand_core::config::AppConfig;
use dockhand_jobs::JobStore;

use crate::runtime::ContainerRuntime;

/// Handles every driver receives at construction.
#[derive(Clone)]
pub struct PluginContext {
    /// Container engine.
    pub runtime: Arc<dyn ContainerRuntime>,
    /// Process-wide job store.
    pub jobs: Arc<JobStore>,
    /// Root under which each `run_as_user` has its home directory.
    pub home_root: PathBuf,
    /// Directory searched for manifest overrides, if any.
    pub manifest_dir: Option<PathBuf>,
}

impl PluginContext {
    /// Builds a context from loaded configuration.
    pub fn from_config(
        config: &AppConfig,
        runtime: Arc<dyn ContainerRuntime>,
        jobs: Arc<JobStore>,
    ) -> Self {
        Self {
            runtime,
            jobs,
            home_root: config.plugins.home_root.clone(),
            manifest_dir: Some(config.manifest_dir()),
        }
    }
}

impl std::fmt::Debug for PluginContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginContext")
            .field("home_root", &self.home_root)
            .field("manifest_dir", &self.manifest_dir)
            .finish()
    }
}
