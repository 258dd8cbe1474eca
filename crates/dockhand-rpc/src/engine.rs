//! The RPC engine: plugin registry plus the frozen dispatch table.
//!
//! Plugins are activated on an [`RpcEngineBuilder`] during startup. Calling
//! [`RpcEngineBuilder::build`] registers the `CoreRPC` built-ins and freezes
//! everything into an [`RpcEngine`], which needs no lock to serve calls.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use dockhand_core::result::AppResult;
use dockhand_plugin::{BasePlugin, DispatchTable};

use crate::codec::{RpcRequest, RpcResponse};
use crate::core_rpc::CoreRpc;

/// Startup-phase engine that accepts plugin activations.
#[derive(Debug)]
pub struct RpcEngineBuilder {
    version: String,
    plugins: Vec<Arc<dyn BasePlugin>>,
    table: DispatchTable,
}

impl RpcEngineBuilder {
    /// An engine that reports `version` from `CoreRPC.GetVersion`.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            plugins: Vec::new(),
            table: DispatchTable::new(),
        }
    }

    /// Registers the plugin's RPC methods and appends it to the registry.
    ///
    /// A plugin whose registration fails is not added.
    pub fn activate(&mut self, plugin: Arc<dyn BasePlugin>) -> AppResult<()> {
        Arc::clone(&plugin).register_rpc(&mut self.table)?;

        info!(
            plugin = %plugin.name(),
            version = plugin.version(),
            service = %plugin.rpc_name(),
            "Activated plugin"
        );
        self.plugins.push(plugin);
        Ok(())
    }

    /// Number of plugins activated so far.
    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    /// Registers `CoreRPC` and freezes the engine.
    pub fn build(mut self) -> AppResult<RpcEngine> {
        let plugins: Arc<[Arc<dyn BasePlugin>]> = self.plugins.into();
        CoreRpc::new(self.version.clone(), Arc::clone(&plugins)).register(&mut self.table)?;

        debug!(methods = ?self.table.method_names(), "RPC engine ready");
        Ok(RpcEngine {
            version: self.version,
            plugins,
            table: self.table,
        })
    }
}

/// Frozen engine shared by every request handler.
#[derive(Debug)]
pub struct RpcEngine {
    version: String,
    plugins: Arc<[Arc<dyn BasePlugin>]>,
    table: DispatchTable,
}

impl RpcEngine {
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Activated plugins in activation order.
    pub fn plugins(&self) -> &[Arc<dyn BasePlugin>] {
        &self.plugins
    }

    /// Invokes `"Service.Method"` with an already-unwrapped argument.
    pub async fn call(&self, method: &str, argument: Value) -> AppResult<Value> {
        let handler = self.table.resolve(method)?;
        handler.call(argument).await
    }

    /// Decodes one request body, dispatches it and encodes the outcome.
    ///
    /// Every failure, including a malformed envelope, becomes the response's
    /// `error` field.
    pub async fn handle(&self, body: &[u8]) -> RpcResponse {
        self.handle_call(body).await.1
    }

    /// Like [`handle`](Self::handle), also reporting what was called.
    pub async fn handle_call(&self, body: &[u8]) -> (CallSummary, RpcResponse) {
        let request = match RpcRequest::decode(body) {
            Ok(request) => request,
            Err(e) => {
                debug!(error = %e, "Rejected RPC envelope");
                let summary = CallSummary {
                    method: None,
                    failed: true,
                };
                return (summary, RpcResponse::failure(Value::Null, &e));
            }
        };

        let outcome = match request.argument() {
            Ok(argument) => self.call(&request.method, argument).await,
            Err(e) => Err(e),
        };

        let response = match outcome {
            Ok(result) => {
                debug!(method = %request.method, "RPC call succeeded");
                RpcResponse::success(request.id, result)
            }
            Err(e) => {
                debug!(method = %request.method, error = %e, "RPC call failed");
                RpcResponse::failure(request.id, &e)
            }
        };

        let summary = CallSummary {
            method: Some(request.method),
            failed: response.error.is_some(),
        };
        (summary, response)
    }
}

/// The JSON-RPC side of one `/rpc` request, carried to the request log as a
/// response extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSummary {
    /// `Service.Method`, absent when the envelope did not decode.
    pub method: Option<String>,
    /// Whether the response carries an error.
    pub failed: bool,
}
