//! # dockhand-rpc
//!
//! The RPC engine: one HTTP listener, an HTTP Basic gate in front of
//! everything, and JSON-RPC 1.0 dispatch on `/rpc` into the methods plugins
//! registered, plus the `CoreRPC` built-ins.

pub mod codec;
pub mod core_rpc;
pub mod engine;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;
pub mod state;

pub use codec::{RpcRequest, RpcResponse};
pub use engine::{CallSummary, RpcEngine, RpcEngineBuilder};
pub use router::build_router;
pub use server::serve;
pub use state::AppState;
