//! Deluge install options.

use serde::{Deserialize, Serialize};

use dockhand_plugin::{BaseOptions, PluginOptions};

/// Options accepted by `Deluge.Install` and `Deluge.Reinstall`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelugeOptions {
    #[serde(flatten)]
    pub base: BaseOptions,
    /// Port the Deluge daemon listens on. Allocated when empty.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub daemon_port: String,
}

impl PluginOptions for DelugeOptions {
    fn base(&self) -> &BaseOptions {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseOptions {
        &mut self.base
    }
}
