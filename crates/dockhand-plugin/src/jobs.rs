//! The built-in `Jobs` service callers poll install progress through.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use dockhand_core::error::AppError;
use dockhand_core::result::AppResult;
use dockhand_core::types::JobId;
use dockhand_jobs::{Job, JobStore};

use crate::dispatch::{DispatchTable, typed_handler};
use crate::manifest::Manifest;
use crate::traits::BasePlugin;

const LOST_MESSAGE: &str = "Job status got lost, most likely during a reboot of the daemon";

/// Exposes `Jobs.Get`.
#[derive(Debug)]
pub struct JobsPlugin {
    jobs: Arc<JobStore>,
}

impl JobsPlugin {
    pub fn new(jobs: Arc<JobStore>) -> Self {
        Self { jobs }
    }

    /// Looks up a job by its textual id.
    ///
    /// An id that does not parse, was never issued, or was issued by an
    /// earlier run of the daemon is reported as `OperationLost`.
    pub async fn get(&self, id: &str) -> AppResult<Job> {
        let job_id: JobId = id.trim().parse().map_err(|_| {
            debug!(job_id = %id, "Unparseable job id");
            AppError::operation_lost(LOST_MESSAGE)
        })?;

        self.jobs.get(&job_id).await.ok_or_else(|| {
            debug!(job_id = %job_id, "Unknown job id");
            AppError::operation_lost(LOST_MESSAGE)
        })
    }
}

impl BasePlugin for JobsPlugin {
    fn name(&self) -> &str {
        "jobs"
    }

    fn version(&self) -> i32 {
        1
    }

    fn manifest(&self) -> Option<&Manifest> {
        None
    }

    fn register_rpc(self: Arc<Self>, table: &mut DispatchTable) -> AppResult<()> {
        let service = self.rpc_name();
        table.add_service(&service)?.method(
            "Get",
            typed_handler(move |id: Value| {
                let plugin = Arc::clone(&self);
                async move { plugin.get(&job_id_text(&id)).await }
            }),
        );
        Ok(())
    }
}

/// Accepts either a bare id string or `{"job_id": "..."}`.
fn job_id_text(arg: &Value) -> String {
    match arg {
        Value::String(s) => s.clone(),
        Value::Object(map) => map
            .get("job_id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    }
}
