//! Process-wide, lock-guarded map of job id to job.

use std::collections::HashMap;

use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use dockhand_core::error::AppError;
use dockhand_core::result::AppResult;
use dockhand_core::types::JobId;

use crate::job::{Job, JobStatus};

/// In-memory job store.
///
/// One exclusive lock guards the map and is held only for the duration of
/// a single insert or lookup, never across the operation a job tracks.
#[derive(Debug, Default)]
pub struct JobStore {
    /// Job id → latest snapshot.
    jobs: Mutex<HashMap<JobId, Job>>,
}

impl JobStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates and stores a `Busy` job for `options`, returning it.
    ///
    /// Must be called before the tracked operation starts.
    pub async fn create(&self, options: Value) -> Job {
        let mut jobs = self.jobs.lock().await;

        let mut job = Job::busy(options);
        while jobs.contains_key(&job.job_id) {
            job.job_id = JobId::new();
        }
        jobs.insert(job.job_id, job.clone());

        debug!(job_id = %job.job_id, "Job created");
        job
    }

    /// Records the terminal state of a job.
    ///
    /// Only `Busy → Finished | Failed` is accepted: writing a `Busy` job,
    /// writing over a terminal job, or writing an id this store never issued
    /// are all rejected.
    pub async fn set(&self, job: Job) -> AppResult<()> {
        if job.status == JobStatus::Busy {
            return Err(AppError::conflict(format!(
                "Job '{}' can only be set to a terminal state",
                job.job_id
            )));
        }

        let mut jobs = self.jobs.lock().await;

        let current = jobs
            .get(&job.job_id)
            .ok_or_else(|| AppError::not_found(format!("Job '{}' not found", job.job_id)))?;

        if current.is_terminal() {
            warn!(
                job_id = %job.job_id,
                current = %current.status,
                attempted = %job.status,
                "Rejected write to terminal job"
            );
            return Err(AppError::conflict(format!(
                "Job '{}' is already {}",
                job.job_id, current.status
            )));
        }

        debug!(job_id = %job.job_id, status = %job.status, "Job completed");
        jobs.insert(job.job_id, job);
        Ok(())
    }

    /// Returns the current snapshot of a job, if this process issued it.
    pub async fn get(&self, job_id: &JobId) -> Option<Job> {
        let jobs = self.jobs.lock().await;
        jobs.get(job_id).cloned()
    }

    /// Number of jobs tracked since startup.
    pub async fn len(&self) -> usize {
        self.jobs.lock().await.len()
    }

    /// Whether no job has been created yet.
    pub async fn is_empty(&self) -> bool {
        self.jobs.lock().await.is_empty()
    }
}
