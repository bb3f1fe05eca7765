//! Completion polling for long-running remote jobs (assistant runs, vector-store ingestion).

mod poller;
mod types;

pub use poller::{PollSettings, Poller};
pub use types::{Job, JobSource, JobStatus, PollError};
