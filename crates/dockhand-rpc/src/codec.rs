//! JSON-RPC 1.0 envelope codec.
//!
//! Request: `{"method": "Service.Method", "params": [arg], "id": n}`.
//! Response: `{"id": n, "result": value, "error": "KIND: message" | null}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use dockhand_core::error::AppError;
use dockhand_core::result::AppResult;

/// A decoded request envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcRequest {
    pub method: String,
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub id: Value,
}

impl RpcRequest {
    /// Decodes one request from a buffered body.
    pub fn decode(body: &[u8]) -> AppResult<Self> {
        serde_json::from_slice(body)
            .map_err(|e| AppError::invalid_request(format!("Malformed JSON-RPC request: {e}")))
    }

    /// The single method argument.
    ///
    /// Absent, `null` and `[]` all mean "no argument" and yield `null`; a
    /// one-element array yields its element; a longer array is rejected. Any
    /// other value is taken as the argument itself.
    pub fn argument(&self) -> AppResult<Value> {
        match &self.params {
            Value::Array(items) => match items.as_slice() {
                [] => Ok(Value::Null),
                [arg] => Ok(arg.clone()),
                _ => Err(AppError::invalid_request(format!(
                    "Expected at most one parameter, got {}",
                    items.len()
                ))),
            },
            other => Ok(other.clone()),
        }
    }
}

/// A response envelope. Exactly one of `result`/`error` is meaningful.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub id: Value,
    pub result: Value,
    pub error: Option<String>,
}

impl RpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            id,
            result,
            error: None,
        }
    }

    pub fn failure(id: Value, err: &AppError) -> Self {
        Self {
            id,
            result: Value::Null,
            error: Some(err.to_string()),
        }
    }
}
