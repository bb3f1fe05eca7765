//! Fixed-interval polling loop.
//!
//! The loop lives inside the caller's task: one status query at a time, a full
//! `tokio::time::sleep` between queries, and no backoff. Dropping the returned future stops the
//! loop and releases its timer; the remote job keeps running.

use crate::config::Config;
use crate::jobs::types::{Job, JobSource, JobStatus, PollError};
use std::time::Duration;
use tokio::time::{Instant, sleep, timeout_at};

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Interval and budget applied while waiting for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    interval: Duration,
    timeout: Option<Duration>,
}

impl PollSettings {
    /// Build settings; the interval is clamped to at least one millisecond.
    pub fn new(interval: Duration, timeout: Option<Duration>) -> Self {
        Self {
            interval: interval.max(MIN_INTERVAL),
            timeout,
        }
    }

    /// Settings derived from `POLL_INTERVAL_MS` / `POLL_TIMEOUT_MS`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.poll_interval(), config.poll_timeout())
    }

    /// Delay between consecutive status queries.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Overall budget, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Status queries allowed within the budget: `floor(timeout / interval) + 1`.
    fn max_queries(&self) -> Option<u128> {
        self.timeout
            .map(|timeout| timeout.as_nanos() / self.interval.as_nanos() + 1)
    }
}

/// Drives a [`JobSource`] from submission to a terminal state.
pub struct Poller<S> {
    source: S,
    settings: PollSettings,
}

impl<S> Poller<S>
where
    S: JobSource,
{
    /// Wrap a job source with the given polling settings.
    pub fn new(source: S, settings: PollSettings) -> Self {
        Self { source, settings }
    }

    /// Submit work and return the initial job handle.
    pub async fn submit(&self, work: S::Work) -> Result<Job, PollError> {
        let job = self.source.submit(work).await?;
        tracing::debug!(
            kind = self.source.kind(),
            job_id = %job.id,
            status = job.status.as_str(),
            "Job submitted"
        );
        Ok(job)
    }

    /// Wait until `job` reaches a terminal state and extract its result.
    ///
    /// A job that is already terminal resolves immediately. Otherwise the first status query is
    /// issued right away and each later query follows a full sleep of the configured interval.
    /// With a budget, polling stops after `floor(timeout / interval) + 1` queries or once the
    /// deadline passes, whichever comes first; a status query still in flight at the deadline is
    /// abandoned.
    pub async fn await_completion(&self, job: Job) -> Result<S::Output, PollError> {
        let kind = self.source.kind();
        let started = Instant::now();
        let deadline = self.settings.timeout().map(|timeout| started + timeout);
        let max_queries = self.settings.max_queries();
        let mut queries: u128 = 0;
        let mut current = job;

        loop {
            match current.status {
                JobStatus::Completed => {
                    tracing::debug!(kind, job_id = %current.id, queries = queries as u64, "Job completed");
                    return self.source.extract(&current).await;
                }
                JobStatus::Failed => {
                    let reason = current
                        .failure_reason
                        .clone()
                        .unwrap_or_else(|| "remote service reported failure".to_string());
                    tracing::warn!(kind, job_id = %current.id, reason = %reason, "Job failed");
                    return Err(PollError::JobFailed {
                        job_id: current.id,
                        reason,
                    });
                }
                JobStatus::Pending | JobStatus::Running => {}
            }

            if max_queries.is_some_and(|limit| queries >= limit) {
                return Err(budget_exhausted(kind, current.id, queries, started));
            }

            if queries > 0 {
                sleep(self.settings.interval).await;
            }

            let job_id = current.id.clone();
            let retrieved = match deadline {
                Some(deadline) => {
                    if Instant::now() > deadline {
                        return Err(budget_exhausted(kind, job_id, queries, started));
                    }
                    match timeout_at(deadline, self.source.retrieve(&job_id)).await {
                        Ok(result) => result,
                        Err(_) => {
                            return Err(budget_exhausted(kind, job_id, queries + 1, started));
                        }
                    }
                }
                None => self.source.retrieve(&job_id).await,
            };
            current = retrieved?;
            queries += 1;
            tracing::debug!(
                kind,
                job_id = %current.id,
                status = current.status.as_str(),
                attempt = queries as u64,
                "Polled job status"
            );
        }
    }

    /// Submit work and wait for its result.
    pub async fn run(&self, work: S::Work) -> Result<S::Output, PollError> {
        let job = self.submit(work).await?;
        self.await_completion(job).await
    }
}

fn budget_exhausted(kind: &str, job_id: String, queries: u128, started: Instant) -> PollError {
    let elapsed = started.elapsed();
    tracing::warn!(kind, job_id = %job_id, queries = queries as u64, ?elapsed, "Polling budget exhausted");
    PollError::Timeout {
        job_id,
        queries: queries as u64,
        elapsed,
    }
}
