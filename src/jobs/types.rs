//! Job handles, lifecycle states, and the remote job source abstraction.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Lifecycle state of a remote job, collapsed from provider-specific status strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Accepted but not yet picked up by the remote service.
    Pending,
    /// Being worked on remotely.
    Running,
    /// Finished successfully; a result can be extracted.
    Completed,
    /// Finished unsuccessfully.
    Failed,
}

impl JobStatus {
    /// Whether the job can no longer change state.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Lowercase label used in logs and response bodies.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// Opaque handle to a remote long-running operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Identifier assigned by the remote service.
    pub id: String,
    /// Most recently observed status.
    pub status: JobStatus,
    /// Reason reported by the remote service when the job failed.
    pub failure_reason: Option<String>,
}

impl Job {
    /// Build a handle in the given state without a failure reason.
    pub fn new(id: impl Into<String>, status: JobStatus) -> Self {
        Self {
            id: id.into(),
            status,
            failure_reason: None,
        }
    }

    /// Attach the remote-reported failure reason.
    pub fn with_failure_reason(mut self, reason: Option<String>) -> Self {
        self.failure_reason = reason.filter(|value| !value.trim().is_empty());
        self
    }
}

/// Errors surfaced while submitting or tracking a remote job.
#[derive(Debug, Error)]
pub enum PollError {
    /// The remote service rejected the submission (malformed payload, auth failure, ...).
    #[error("Remote service rejected the job: {0}")]
    Submission(String),
    /// The job reached its failed state, or completed without a usable result.
    #[error("Job {job_id} failed: {reason}")]
    JobFailed {
        /// Identifier of the failing job.
        job_id: String,
        /// Reason reported remotely or detected during result extraction.
        reason: String,
    },
    /// The job did not reach a terminal state within the polling budget.
    #[error("Job {job_id} still pending after {queries} status queries over {elapsed:?}")]
    Timeout {
        /// Identifier of the job that was being tracked.
        job_id: String,
        /// Number of status queries issued before giving up.
        queries: u64,
        /// Wall-clock time spent polling.
        elapsed: Duration,
    },
    /// A status or result query failed before the remote service answered.
    #[error("Job status query failed: {0}")]
    Transport(String),
}

/// Remote service able to run a unit of work as a pollable job.
#[async_trait]
pub trait JobSource: Send + Sync {
    /// Description of the work submitted to the remote service.
    type Work: Send + 'static;
    /// Result extracted from a completed job.
    type Output: Send;

    /// Short label used in logs.
    fn kind(&self) -> &'static str;

    /// Send the work to the remote service and return the initial handle.
    async fn submit(&self, work: Self::Work) -> Result<Job, PollError>;

    /// Re-query the current state of a job.
    async fn retrieve(&self, job_id: &str) -> Result<Job, PollError>;

    /// Pull the result payload out of a completed job.
    async fn extract(&self, job: &Job) -> Result<Self::Output, PollError>;
}
