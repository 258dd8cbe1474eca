//! The job record and its state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use dockhand_core::error::{AppError, ErrorKind};
use dockhand_core::types::JobId;

/// Lifecycle state of a job.
///
/// `Busy` is the only non-terminal state. `Finished` and `Failed` are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    /// The background operation is still running.
    Busy,
    /// The background operation completed successfully.
    Finished,
    /// The background operation returned an error or panicked.
    Failed,
}

impl JobStatus {
    /// Whether no further transitions are possible.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Busy)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Busy => write!(f, "busy"),
            Self::Finished => write!(f, "finished"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Failure detail captured from the background operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobError {
    /// Category of the failure.
    pub kind: ErrorKind,
    /// Human-readable message, never empty.
    pub message: String,
}

impl From<&AppError> for JobError {
    fn from(err: &AppError) -> Self {
        let message = if err.message.is_empty() {
            err.kind.to_string()
        } else {
            err.message.clone()
        };
        Self {
            kind: err.kind,
            message,
        }
    }
}

/// Correlation record for one asynchronous operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Opaque identifier the caller polls with.
    pub job_id: JobId,
    /// Current state.
    pub status: JobStatus,
    /// Snapshot of the operation's options. On creation this is the input
    /// as received; on completion it is the options as the driver left them.
    pub options: Value,
    /// Present only when `status` is `Failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JobError>,
    /// When the job was created.
    pub created_at: DateTime<Utc>,
    /// When the job last changed state.
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// A fresh `Busy` job for the given options snapshot.
    pub fn busy(options: Value) -> Self {
        let now = Utc::now();
        Self {
            job_id: JobId::new(),
            status: JobStatus::Busy,
            options,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The `Finished` successor of this job.
    pub fn finished(&self, options: Value) -> Self {
        Self {
            status: JobStatus::Finished,
            options,
            error: None,
            updated_at: Utc::now(),
            ..self.clone()
        }
    }

    /// The `Failed` successor of this job.
    pub fn failed(&self, options: Value, err: &AppError) -> Self {
        Self {
            status: JobStatus::Failed,
            options,
            error: Some(JobError::from(err)),
            updated_at: Utc::now(),
            ..self.clone()
        }
    }

    /// Whether this job has reached a final state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
