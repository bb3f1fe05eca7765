//! File-search assistant: thread runs and vector-store ingestion tracked by the poller.

pub mod jobs;
mod service;

pub use jobs::{ThreadRuns, VectorStoreIngestion, strip_citations};
pub use service::{
    AskOutcome, AskRequest, AssistantApi, AssistantError, AssistantService, AttachOutcome,
};
