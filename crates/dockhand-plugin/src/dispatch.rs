//! Dispatch table mapping `"Service.Method"` to callable handlers.
//!
//! The table is filled during plugin activation, before the RPC listener
//! starts, and is read-only afterwards. Handlers must tolerate concurrent
//! invocation; the engine does not serialize calls.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::info;

use dockhand_core::error::AppError;
use dockhand_core::result::AppResult;

/// A single callable RPC method.
#[async_trait]
pub trait RpcHandler: Send + Sync {
    /// Invoke the method with its (already unwrapped) argument.
    async fn call(&self, params: Value) -> AppResult<Value>;
}

/// Closure-based handler.
pub struct FnHandler<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> RpcHandler for FnHandler<F>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AppResult<Value>> + Send + 'static,
{
    async fn call(&self, params: Value) -> AppResult<Value> {
        (self.f)(params).await
    }
}

impl<F> std::fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnHandler")
            .field("f", &"<closure>")
            .finish()
    }
}

/// Wraps an untyped async closure as a handler.
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn RpcHandler>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AppResult<Value>> + Send + 'static,
{
    Arc::new(FnHandler { f })
}

/// Wraps a typed async closure as a handler.
///
/// The argument is decoded from JSON before the call and the result encoded
/// after it. A decode failure is an `InvalidRequest` error.
pub fn typed_handler<P, R, F, Fut>(f: F) -> Arc<dyn RpcHandler>
where
    P: DeserializeOwned + Send + 'static,
    R: Serialize + Send + 'static,
    F: Fn(P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AppResult<R>> + Send + 'static,
{
    let f = Arc::new(f);
    handler_fn(move |params: Value| {
        let f = Arc::clone(&f);
        async move {
            let arg: P = decode_params(params)?;
            let result = f(arg).await?;
            Ok::<Value, AppError>(serde_json::to_value(result)?)
        }
    })
}

/// Decodes a method argument, mapping failures to `InvalidRequest`.
pub fn decode_params<P: DeserializeOwned>(params: Value) -> AppResult<P> {
    serde_json::from_value(params)
        .map_err(|e| AppError::invalid_request(format!("Invalid method argument: {e}")))
}

type MethodMap = HashMap<String, Arc<dyn RpcHandler>>;

/// The shared `"Service.Method"` namespace.
#[derive(Default)]
pub struct DispatchTable {
    /// Service name → method name → handler.
    services: HashMap<String, MethodMap>,
}

impl DispatchTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims a service name and returns a builder for its methods.
    ///
    /// Claiming a name twice is a caller error and fails with `Conflict`.
    pub fn add_service(&mut self, service: &str) -> AppResult<ServiceRegistration<'_>> {
        if service.is_empty() || service.contains('.') {
            return Err(AppError::validation(format!(
                "Invalid RPC service name '{service}'"
            )));
        }
        if self.services.contains_key(service) {
            return Err(AppError::conflict(format!(
                "RPC service '{service}' is already registered"
            )));
        }

        info!(service = %service, "Registering RPC service");

        let methods = self.services.entry(service.to_string()).or_default();
        Ok(ServiceRegistration {
            service: service.to_string(),
            methods,
        })
    }

    /// Resolves `"Service.Method"` to its handler.
    pub fn resolve(&self, method: &str) -> AppResult<Arc<dyn RpcHandler>> {
        let (service, name) = method.rsplit_once('.').ok_or_else(|| {
            AppError::method_not_found(format!("service/method request ill-formed: {method}"))
        })?;

        let methods = self
            .services
            .get(service)
            .ok_or_else(|| AppError::method_not_found(format!("can't find service {method}")))?;

        methods
            .get(name)
            .cloned()
            .ok_or_else(|| AppError::method_not_found(format!("can't find method {method}")))
    }

    /// Whether a service name has been claimed.
    pub fn has_service(&self, service: &str) -> bool {
        self.services.contains_key(service)
    }

    /// All registered `"Service.Method"` names, sorted.
    pub fn method_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .services
            .iter()
            .flat_map(|(service, methods)| {
                methods.keys().map(move |method| format!("{service}.{method}"))
            })
            .collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for DispatchTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchTable")
            .field("methods", &self.method_names())
            .finish()
    }
}

/// Builder returned by [`DispatchTable::add_service`].
pub struct ServiceRegistration<'a> {
    service: String,
    methods: &'a mut MethodMap,
}

impl ServiceRegistration<'_> {
    /// Adds a method handler. A repeated method name replaces the earlier one.
    pub fn method(self, name: &str, handler: Arc<dyn RpcHandler>) -> Self {
        tracing::debug!(service = %self.service, method = %name, "Registered RPC method");
        self.methods.insert(name.to_string(), handler);
        self
    }
}
