//! Core type definitions used across the Dockhand workspace.

pub mod id;

pub use id::*;
