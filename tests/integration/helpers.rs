//! Shared test helpers for integration tests.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use http::{Request, StatusCode};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use dockhand_core::config::AuthConfig;
use dockhand_jobs::JobStore;
use dockhand_plugin::runtime::mock::MockRuntime;
use dockhand_plugin::{BasePlugin, JobsPlugin, PluginContext};
use dockhand_rpc::{AppState, RpcEngineBuilder, build_router};
use plugin_deluge::DelugePlugin;

pub const API_KEY: &str = "test-key";
pub const API_SECRET: &str = "test-secret";

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// In-memory container engine behind every driver
    pub runtime: Arc<MockRuntime>,
    /// Process-wide job store
    pub jobs: Arc<JobStore>,
    /// Home root for driver folders; removed on drop
    pub home: TempDir,
}

impl TestApp {
    /// Deluge and Jobs activated, the same way the daemon starts.
    pub fn new() -> Self {
        Self::build(|ctx| {
            vec![
                Arc::new(DelugePlugin::new(ctx).expect("deluge plugin")) as Arc<dyn BasePlugin>,
                Arc::new(JobsPlugin::new(Arc::clone(&ctx.jobs))),
            ]
        })
    }

    /// An app with exactly the plugins `plugins` returns, in that order.
    pub fn build<F>(plugins: F) -> Self
    where
        F: FnOnce(&PluginContext) -> Vec<Arc<dyn BasePlugin>>,
    {
        let home = tempfile::tempdir().expect("Failed to create temp home");
        let runtime = Arc::new(MockRuntime::new());
        let jobs = Arc::new(JobStore::new());

        let ctx = PluginContext {
            runtime: runtime.clone(),
            jobs: Arc::clone(&jobs),
            home_root: home.path().to_path_buf(),
            manifest_dir: None,
        };

        let mut builder = RpcEngineBuilder::new(dockhand_core::VERSION);
        for plugin in plugins(&ctx) {
            builder.activate(plugin).expect("Failed to activate plugin");
        }
        let engine = builder.build().expect("Failed to build engine");

        let auth = AuthConfig {
            api_key: API_KEY.to_string(),
            api_secret: API_SECRET.to_string(),
        };

        Self {
            router: build_router(AppState::new(engine, auth)),
            runtime,
            jobs,
            home,
        }
    }

    /// Sends a raw request with the given Basic credentials.
    pub async fn request(
        &self,
        path: &str,
        credentials: Option<(&str, &str)>,
        body: String,
    ) -> TestResponse {
        let mut req = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json");

        if let Some((user, pass)) = credentials {
            req = req.header(
                "Authorization",
                format!("Basic {}", BASE64.encode(format!("{user}:{pass}"))),
            );
        }

        let req = req.body(Body::from(body)).expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            body,
            raw_len: body_bytes.len(),
        }
    }

    /// Calls a JSON-RPC method with valid credentials and one argument.
    pub async fn call(&self, method: &str, arg: Value) -> RpcOutcome {
        let envelope = json!({"method": method, "params": [arg], "id": 1});
        let response = self
            .request("/rpc", Some((API_KEY, API_SECRET)), envelope.to_string())
            .await;
        assert_eq!(response.status, StatusCode::OK, "HTTP status for {method}");
        RpcOutcome::from_body(response.body)
    }

    /// Polls `Jobs.Get` until the job leaves `Busy`.
    pub async fn wait_for_job(&self, job_id: &str) -> Value {
        for _ in 0..400 {
            let job = self.call("Jobs.Get", json!(job_id)).await.ok();
            if job["status"] != "Busy" {
                return job;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("Job {job_id} never left Busy");
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response body parsed as JSON (Null if not JSON)
    pub body: Value,
    /// Body length in bytes
    pub raw_len: usize,
}

/// Decoded JSON-RPC response
#[derive(Debug)]
pub struct RpcOutcome {
    pub result: Value,
    pub error: Option<String>,
}

impl RpcOutcome {
    fn from_body(body: Value) -> Self {
        Self {
            result: body["result"].clone(),
            error: body["error"].as_str().map(str::to_string),
        }
    }

    /// The result, panicking on an RPC error.
    pub fn ok(self) -> Value {
        if let Some(error) = self.error {
            panic!("Unexpected RPC error: {error}");
        }
        self.result
    }

    /// The error string, panicking on success.
    pub fn err(self) -> String {
        self.error.expect("Expected an RPC error")
    }
}
