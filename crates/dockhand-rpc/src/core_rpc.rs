//! Built-in `CoreRPC` introspection service.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use dockhand_core::result::AppResult;
use dockhand_plugin::dispatch::{DispatchTable, typed_handler};
use dockhand_plugin::{BasePlugin, Manifest};

/// Reserved service name of the built-ins.
pub const SERVICE: &str = "CoreRPC";

/// Entry of `CoreRPC.GetPlugins`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginInfo {
    pub name: String,
    pub version: i32,
}

/// `GetVersion`, `GetPlugins` and `GetManifests` over a frozen plugin list.
#[derive(Debug, Clone)]
pub struct CoreRpc {
    version: String,
    plugins: Arc<[Arc<dyn BasePlugin>]>,
}

impl CoreRpc {
    pub fn new(version: impl Into<String>, plugins: Arc<[Arc<dyn BasePlugin>]>) -> Self {
        Self {
            version: version.into(),
            plugins,
        }
    }

    pub fn version(&self) -> String {
        self.version.clone()
    }

    /// Activated plugins in activation order.
    pub fn plugins(&self) -> Vec<PluginInfo> {
        self.plugins
            .iter()
            .map(|p| PluginInfo {
                name: p.name().to_string(),
                version: p.version(),
            })
            .collect()
    }

    /// Manifests of activated plugins that have one, in activation order.
    pub fn manifests(&self) -> Vec<Manifest> {
        self.plugins
            .iter()
            .filter_map(|p| p.manifest().cloned())
            .collect()
    }

    pub fn register(self, table: &mut DispatchTable) -> AppResult<()> {
        let version = self.clone();
        let plugins = self.clone();
        let manifests = self;

        table
            .add_service(SERVICE)?
            .method(
                "GetVersion",
                typed_handler(move |_: Value| {
                    let v = version.version();
                    async move { AppResult::Ok(v) }
                }),
            )
            .method(
                "GetPlugins",
                typed_handler(move |_: Value| {
                    let list = plugins.plugins();
                    async move { AppResult::Ok(list) }
                }),
            )
            .method(
                "GetManifests",
                typed_handler(move |_: Value| {
                    let list = manifests.manifests();
                    async move { AppResult::Ok(list) }
                }),
            );

        Ok(())
    }
}
