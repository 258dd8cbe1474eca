//! Integration tests for the Basic-auth gate.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dockhand_core::error::AppError;
use dockhand_core::result::AppResult;
use dockhand_plugin::dispatch::handler_fn;
use dockhand_plugin::{BasePlugin, DispatchTable, Manifest};
use http::StatusCode;
use serde_json::json;

use crate::helpers::{API_KEY, API_SECRET, TestApp};

/// Counts how often `Sentinel.Hit` runs.
#[derive(Debug, Default)]
struct Sentinel {
    hits: AtomicUsize,
}

impl BasePlugin for Sentinel {
    fn name(&self) -> &str {
        "sentinel"
    }

    fn version(&self) -> i32 {
        1
    }

    fn manifest(&self) -> Option<&Manifest> {
        None
    }

    fn register_rpc(self: Arc<Self>, table: &mut DispatchTable) -> AppResult<()> {
        table.add_service(&self.rpc_name())?.method(
            "Hit",
            handler_fn(move |_| {
                let sentinel = Arc::clone(&self);
                async move {
                    let n = sentinel.hits.fetch_add(1, Ordering::SeqCst) + 1;
                    Ok::<_, AppError>(json!(n))
                }
            }),
        );
        Ok(())
    }
}

fn sentinel_app() -> (TestApp, Arc<Sentinel>) {
    let sentinel = Arc::new(Sentinel::default());
    let registered = Arc::clone(&sentinel);
    let app = TestApp::build(move |_| vec![registered as Arc<dyn BasePlugin>]);
    (app, sentinel)
}

fn hit() -> String {
    json!({"method": "Sentinel.Hit", "params": [], "id": 1}).to_string()
}

#[tokio::test]
async fn test_wrong_credentials_never_dispatch() {
    let (app, sentinel) = sentinel_app();

    for credentials in [
        None,
        Some((API_KEY, "wrong")),
        Some(("wrong", API_SECRET)),
        Some((API_SECRET, API_KEY)),
        Some(("", "")),
    ] {
        let response = app.request("/rpc", credentials, hit()).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{credentials:?}");
        assert_eq!(response.raw_len, 0);
    }

    assert_eq!(sentinel.hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_correct_credentials_dispatch_once() {
    let (app, sentinel) = sentinel_app();

    let response = app
        .request("/rpc", Some((API_KEY, API_SECRET)), hit())
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["result"], 1);
    assert!(response.body["error"].is_null());
    assert_eq!(sentinel.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unknown_path() {
    let app = TestApp::new();

    let unauth = app.request("/status", None, String::new()).await;
    assert_eq!(unauth.status, StatusCode::UNAUTHORIZED);

    let auth = app
        .request("/status", Some((API_KEY, API_SECRET)), String::new())
        .await;
    assert_eq!(auth.status, StatusCode::NOT_FOUND);
}
