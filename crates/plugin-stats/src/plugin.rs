//! The `Stats` RPC service.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use dockhand_core::result::AppResult;
use dockhand_plugin::dispatch::typed_handler;
use dockhand_plugin::{BasePlugin, DispatchTable, Manifest};

use crate::report::{self, DiskSpaceArgs};

/// Plugin name.
pub const NAME: &str = "stats";

/// How long `Stats.Net` watches the counters by default.
pub const NET_SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

/// Host metrics: `Stats.Cpu`, `Stats.Memory`, `Stats.Load`, `Stats.Host`,
/// `Stats.Net` and `Stats.DiskSpace`.
#[derive(Debug, Clone)]
pub struct StatsPlugin {
    net_interval: Duration,
}

impl StatsPlugin {
    pub fn new() -> Self {
        Self {
            net_interval: NET_SAMPLE_INTERVAL,
        }
    }

    pub fn with_net_interval(mut self, interval: Duration) -> Self {
        self.net_interval = interval;
        self
    }
}

impl Default for StatsPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl BasePlugin for StatsPlugin {
    fn name(&self) -> &str {
        NAME
    }

    fn version(&self) -> i32 {
        1
    }

    fn manifest(&self) -> Option<&Manifest> {
        None
    }

    fn register_rpc(self: Arc<Self>, table: &mut DispatchTable) -> AppResult<()> {
        let service = self.rpc_name();
        let net_interval = self.net_interval;

        table
            .add_service(&service)?
            .method(
                "Cpu",
                typed_handler(|_: Value| async {
                    debug!("Sampling CPU usage");
                    AppResult::Ok(report::cpu().await)
                }),
            )
            .method(
                "Memory",
                typed_handler(|_: Value| async { AppResult::Ok(report::memory()) }),
            )
            .method(
                "Load",
                typed_handler(|_: Value| async { AppResult::Ok(report::load()) }),
            )
            .method(
                "Host",
                typed_handler(|_: Value| async { AppResult::Ok(report::host()) }),
            )
            .method(
                "Net",
                typed_handler(move |_: Value| async move {
                    debug!(interval_ms = net_interval.as_millis() as u64, "Sampling network counters");
                    AppResult::Ok(report::net(net_interval).await)
                }),
            )
            .method(
                "DiskSpace",
                typed_handler(|args: Option<DiskSpaceArgs>| async move {
                    report::disk_space(args.unwrap_or_default())
                }),
            );

        Ok(())
    }
}
