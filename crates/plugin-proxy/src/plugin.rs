//! The `Proxy` RPC service.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;

use dockhand_core::result::AppResult;
use dockhand_plugin::dispatch::typed_handler;
use dockhand_plugin::{BasePlugin, DispatchTable, Manifest};

use crate::store::{Proxy, ProxyStore};

/// Plugin name.
pub const NAME: &str = "proxy";

/// Exposes `Proxy.List`, `Proxy.Add` and `Proxy.Remove`.
///
/// Each method answers with the full list after the operation.
#[derive(Debug)]
pub struct ProxyPlugin {
    store: ProxyStore,
}

impl ProxyPlugin {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            store: ProxyStore::new(path),
        }
    }

    pub fn store(&self) -> &ProxyStore {
        &self.store
    }
}

impl BasePlugin for ProxyPlugin {
    fn name(&self) -> &str {
        NAME
    }

    fn version(&self) -> i32 {
        1
    }

    fn manifest(&self) -> Option<&Manifest> {
        None
    }

    fn register_rpc(self: Arc<Self>, table: &mut DispatchTable) -> AppResult<()> {
        let service = self.rpc_name();
        let list = Arc::clone(&self);
        let add = Arc::clone(&self);
        let remove = self;

        table
            .add_service(&service)?
            .method(
                "List",
                typed_handler(move |_: Value| {
                    let plugin = Arc::clone(&list);
                    async move { plugin.store.list().await }
                }),
            )
            .method(
                "Add",
                typed_handler(move |proxy: Proxy| {
                    let plugin = Arc::clone(&add);
                    async move { plugin.store.add(proxy).await }
                }),
            )
            .method(
                "Remove",
                typed_handler(move |proxy: Proxy| {
                    let plugin = Arc::clone(&remove);
                    async move { plugin.store.remove(&proxy.source).await }
                }),
            );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use dockhand_core::error::ErrorKind;
    use serde_json::json;

    use super::*;

    fn setup() -> (DispatchTable, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut table = DispatchTable::new();
        Arc::new(ProxyPlugin::new(dir.path().join("proxies.toml")))
            .register_rpc(&mut table)
            .expect("register");
        (table, dir)
    }

    #[test]
    fn test_registers_under_proxy() {
        let (table, _dir) = setup();
        assert_eq!(
            table.method_names(),
            vec!["Proxy.Add", "Proxy.List", "Proxy.Remove"]
        );
    }

    #[tokio::test]
    async fn test_add_list_remove() {
        let (table, _dir) = setup();
        let route = json!({
            "source": "https://deluge.example",
            "target": "http://127.0.0.1:8112",
            "external_id": "42",
        });

        let added = table
            .resolve("Proxy.Add")
            .expect("method")
            .call(route.clone())
            .await
            .expect("add");
        assert_eq!(added, json!([route]));

        let listed = table
            .resolve("Proxy.List")
            .expect("method")
            .call(Value::Null)
            .await
            .expect("list");
        assert_eq!(listed, added);

        let removed = table
            .resolve("Proxy.Remove")
            .expect("method")
            .call(json!({"source": "https://deluge.example"}))
            .await
            .expect("remove");
        assert_eq!(removed, json!([]));
    }

    #[tokio::test]
    async fn test_add_without_argument_is_invalid() {
        let (table, _dir) = setup();
        let err = table
            .resolve("Proxy.Add")
            .expect("method")
            .call(Value::Null)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidRequest);
    }
}
