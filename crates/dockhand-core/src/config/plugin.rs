//! Plugin (application driver) configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Settings shared by every application driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Directory holding one home directory per `run_as_user`.
    #[serde(default = "default_home_root")]
    pub home_root: PathBuf,
    /// Directory searched for `<plugin>.toml` manifest overrides.
    /// `None` means `<config dir>/manifests`.
    #[serde(default)]
    pub manifest_dir: Option<PathBuf>,
    /// File the `Proxy` service keeps its entries in.
    /// `None` means `<config dir>/proxies.toml`.
    #[serde(default)]
    pub proxies_file: Option<PathBuf>,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            home_root: default_home_root(),
            manifest_dir: None,
            proxies_file: None,
        }
    }
}

fn default_home_root() -> PathBuf {
    PathBuf::from("/home")
}
