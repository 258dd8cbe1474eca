//! # dockhand-jobs
//!
//! Correlation records for fire-and-forget operations. An RPC call that
//! starts a slow operation creates a [`Job`] in the [`JobStore`], hands the
//! job back to its caller immediately, and the background task later writes
//! exactly one terminal state. Callers poll by id.
//!
//! Storage is process memory only: every job is forgotten when the daemon
//! restarts.

pub mod job;
pub mod store;

pub use job::{Job, JobError, JobStatus};
pub use store::JobStore;
