//! Integration tests driving the full router in-process.

mod helpers;

mod auth_test;
mod core_rpc_test;
mod deluge_test;
mod host_plugins_test;
mod jobs_test;
