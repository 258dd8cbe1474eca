//! Reverse-proxy registry for Dockhand.
//!
//! Keeps the list of `source → target` routes a front proxy should serve,
//! persisted as TOML next to the daemon configuration. The proxy itself is
//! a separate program that reads this file.

pub mod plugin;
pub mod store;

pub use plugin::ProxyPlugin;
pub use store::{Proxy, ProxyStore};
