//! Integration tests for the `CoreRPC` built-ins.

use std::sync::Arc;

use dockhand_plugin::{BasePlugin, JobsPlugin};
use plugin_deluge::DelugePlugin;
use serde_json::{Value, json};

use crate::helpers::TestApp;

#[tokio::test]
async fn test_get_version_without_plugins() {
    let app = TestApp::build(|_| Vec::new());
    let version = app.call("CoreRPC.GetVersion", Value::Null).await.ok();
    assert_eq!(version, json!(dockhand_core::VERSION));
}

#[tokio::test]
async fn test_get_plugins_in_activation_order() {
    let app = TestApp::new();
    let plugins = app.call("CoreRPC.GetPlugins", Value::Null).await.ok();
    assert_eq!(
        plugins,
        json!([{"name": "deluge", "version": 1}, {"name": "jobs", "version": 1}])
    );
}

#[tokio::test]
async fn test_get_manifests_skips_plugins_without_one() {
    let app = TestApp::build(|ctx| {
        vec![
            Arc::new(JobsPlugin::new(Arc::clone(&ctx.jobs))) as Arc<dyn BasePlugin>,
            Arc::new(DelugePlugin::new(ctx).expect("deluge")),
        ]
    });

    let manifests = app.call("CoreRPC.GetManifests", Value::Null).await.ok();
    let list = manifests.as_array().expect("array");
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["rpc_name"], "Deluge");
}

#[tokio::test]
async fn test_unknown_method_is_rpc_error() {
    let app = TestApp::new();
    let error = app.call("CoreRPC.Reboot", Value::Null).await.err();
    assert!(error.starts_with("METHOD_NOT_FOUND"), "{error}");
}
