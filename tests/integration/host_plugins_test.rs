//! Integration tests for the `Stats` and `Proxy` services.

use std::sync::Arc;
use std::time::Duration;

use dockhand_plugin::{BasePlugin, JobsPlugin};
use plugin_proxy::ProxyPlugin;
use plugin_stats::StatsPlugin;
use serde_json::{Value, json};

use crate::helpers::TestApp;

/// Stats, Jobs and Proxy in daemon activation order.
fn host_app() -> TestApp {
    TestApp::build(|ctx| {
        vec![
            Arc::new(StatsPlugin::new().with_net_interval(Duration::from_millis(10)))
                as Arc<dyn BasePlugin>,
            Arc::new(JobsPlugin::new(Arc::clone(&ctx.jobs))),
            Arc::new(ProxyPlugin::new(ctx.home_root.join("proxies.toml"))),
        ]
    })
}

#[tokio::test]
async fn test_plugins_listed_in_activation_order() {
    let app = host_app();
    let plugins = app.call("CoreRPC.GetPlugins", Value::Null).await.ok();
    assert_eq!(
        plugins,
        json!([
            {"name": "stats", "version": 1},
            {"name": "jobs", "version": 1},
            {"name": "proxy", "version": 1},
        ])
    );
}

#[tokio::test]
async fn test_stats_over_rpc() {
    let app = host_app();

    let memory = app.call("Stats.Memory", Value::Null).await.ok();
    assert!(memory["memory"]["total"].as_u64().expect("total") > 0);

    let net = app.call("Stats.Net", Value::Null).await.ok();
    assert!(net.is_array());

    let error = app
        .call("Stats.DiskSpace", json!({"mounts": ["relative"]}))
        .await
        .err();
    assert!(error.starts_with("VALIDATION:"), "{error}");
}

#[tokio::test]
async fn test_proxy_list_persists_in_file() {
    let app = host_app();
    let route = json!({
        "source": "https://torrents.example",
        "target": "http://127.0.0.1:8112",
        "external_id": "",
    });

    assert_eq!(app.call("Proxy.List", Value::Null).await.ok(), json!([]));
    assert_eq!(app.call("Proxy.Add", route.clone()).await.ok(), json!([route]));

    let raw = std::fs::read_to_string(app.home.path().join("proxies.toml")).expect("file");
    assert!(raw.contains("https://torrents.example"), "{raw}");

    let left = app
        .call("Proxy.Remove", json!({"source": "https://torrents.example"}))
        .await
        .ok();
    assert_eq!(left, json!([]));
}
