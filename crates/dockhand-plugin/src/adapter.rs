//! Generic RPC adapter turning any [`Installer`] into the standard
//! per-plugin service: `Install`, `Reinstall`, `Start`, `Stop`, `Restart`,
//! `Status` and `Uninstall`.
//!
//! Install and Reinstall return a `Busy` [`Job`] immediately and run the
//! driver on a detached task that records the terminal state exactly once.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use dockhand_core::error::AppError;
use dockhand_core::result::AppResult;
use dockhand_jobs::{Job, JobStore};

use crate::dispatch::{DispatchTable, decode_params, handler_fn, typed_handler};
use crate::options::PluginOptions;
use crate::runtime::ContainerState;
use crate::traits::Installer;

/// Argument of the container-addressed methods.
#[derive(Debug, Clone, Deserialize)]
pub struct ContainerRef {
    #[serde(default)]
    pub container_id: String,
}

/// The standard RPC surface for driver `D`.
#[derive(Debug)]
pub struct InstallableService<D: Installer> {
    driver: Arc<D>,
    jobs: Arc<JobStore>,
}

impl<D: Installer> Clone for InstallableService<D> {
    fn clone(&self) -> Self {
        Self {
            driver: Arc::clone(&self.driver),
            jobs: Arc::clone(&self.jobs),
        }
    }
}

impl<D: Installer> InstallableService<D> {
    pub fn new(driver: Arc<D>, jobs: Arc<JobStore>) -> Self {
        Self { driver, jobs }
    }

    /// Registers all seven methods under the driver's RPC name.
    pub fn register(self, table: &mut DispatchTable) -> AppResult<()> {
        let service = self.driver.rpc_name();

        let install = self.clone();
        let reinstall = self.clone();
        let start = Arc::clone(&self.driver);
        let stop = Arc::clone(&self.driver);
        let restart = Arc::clone(&self.driver);
        let status = Arc::clone(&self.driver);
        let uninstall = Arc::clone(&self.driver);

        table
            .add_service(&service)?
            .method(
                "Install",
                handler_fn(move |params| {
                    let svc = install.clone();
                    async move { svc.install(params, false).await }
                }),
            )
            .method(
                "Reinstall",
                handler_fn(move |params| {
                    let svc = reinstall.clone();
                    async move { svc.install(params, true).await }
                }),
            )
            .method(
                "Start",
                typed_handler(move |r: ContainerRef| {
                    let driver = Arc::clone(&start);
                    async move { acknowledge(driver.start(&r.container_id).await) }
                }),
            )
            .method(
                "Stop",
                typed_handler(move |r: ContainerRef| {
                    let driver = Arc::clone(&stop);
                    async move { acknowledge(driver.stop(&r.container_id).await) }
                }),
            )
            .method(
                "Restart",
                typed_handler(move |r: ContainerRef| {
                    let driver = Arc::clone(&restart);
                    async move { acknowledge(driver.restart(&r.container_id).await) }
                }),
            )
            .method(
                "Status",
                typed_handler(move |r: ContainerRef| {
                    let driver = Arc::clone(&status);
                    async move { container_status(driver.as_ref(), &r.container_id).await }
                }),
            )
            .method(
                "Uninstall",
                typed_handler(move |r: ContainerRef| {
                    let driver = Arc::clone(&uninstall);
                    async move { acknowledge(driver.uninstall(&r.container_id).await) }
                }),
            );

        Ok(())
    }

    /// Creates the job, detaches the install and returns the `Busy` job.
    ///
    /// A reinstall first force-removes `container_id` on the background
    /// task, ignoring failure.
    async fn install(&self, params: Value, reinstall: bool) -> AppResult<Value> {
        let params = if params.is_null() {
            Value::Object(Default::default())
        } else {
            params
        };
        let options: D::Options = decode_params(params.clone())?;

        let job = self.jobs.create(params).await;
        debug!(
            plugin = %self.driver.name(),
            job_id = %job.job_id,
            reinstall,
            "Install job created"
        );

        let snapshot = serde_json::to_value(&job)?;
        tokio::spawn(run_install(
            Arc::clone(&self.driver),
            Arc::clone(&self.jobs),
            job,
            options,
            reinstall,
        ));

        Ok(snapshot)
    }
}

/// Body of the detached install task.
///
/// Everything that runs driver or runtime code sits inside one unwind
/// guard, so the job always receives exactly one terminal state.
async fn run_install<D: Installer>(
    driver: Arc<D>,
    jobs: Arc<JobStore>,
    job: Job,
    mut options: D::Options,
    reinstall: bool,
) {
    let plugin = driver.name().to_string();

    let work = async {
        if reinstall {
            let old = options.base().container_id.clone();
            if let Err(e) = driver.uninstall(&old).await {
                info!(
                    plugin = %plugin,
                    job_id = %job.job_id,
                    container_id = %old,
                    error = %e,
                    "Could not remove old container, reinstalling anyway"
                );
            }
        }

        info!(plugin = %plugin, job_id = %job.job_id, "Starting installation");
        let result = driver.install(&mut options).await;
        let final_options = serde_json::to_value(&options);
        (result, final_options)
    };
    let outcome = AssertUnwindSafe(work).catch_unwind().await;

    let terminal = match outcome {
        Ok((Ok(()), Ok(final_options))) => {
            info!(plugin = %plugin, job_id = %job.job_id, "Installation completed");
            job.finished(final_options)
        }
        Ok((Err(e), final_options)) => {
            warn!(plugin = %plugin, job_id = %job.job_id, error = %e, "Installation failed");
            job.failed(final_options.unwrap_or_else(|_| job.options.clone()), &e)
        }
        Ok((Ok(()), Err(e))) => {
            let e = AppError::from(e);
            error!(plugin = %plugin, job_id = %job.job_id, error = %e, "Could not snapshot install options");
            job.failed(job.options.clone(), &e)
        }
        Err(panic) => {
            let reason = panic_message(panic.as_ref());
            error!(plugin = %plugin, job_id = %job.job_id, reason = %reason, "Installation panicked");
            job.failed(
                job.options.clone(),
                &AppError::internal(format!("Installation panicked: {reason}")),
            )
        }
    };

    if let Err(e) = jobs.set(terminal).await {
        error!(job_id = %job.job_id, error = %e, "Failed to record job outcome");
    }
}

fn acknowledge(result: AppResult<()>) -> AppResult<bool> {
    result.map(|()| true)
}

async fn container_status<D: Installer>(driver: &D, container_id: &str) -> AppResult<ContainerState> {
    driver.status(container_id).await
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
