//! HTTP middleware applied to every request.

pub mod auth;
pub mod logging;
