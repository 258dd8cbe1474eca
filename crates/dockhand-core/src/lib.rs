//! # dockhand-core
//!
//! Core crate for Dockhand. Contains the configuration schema, the
//! unified error system, typed identifiers, and the daemon version.
//!
//! This crate has **no** internal dependencies on other Dockhand crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;

/// Version string reported by `CoreRPC.GetVersion`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
