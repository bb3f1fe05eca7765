//! Job sources for assistant runs and vector-store file ingestion.

use crate::jobs::{Job, JobSource, JobStatus, PollError};
use crate::openai::{LastError, MessageContent, OpenAiClient, OpenAiError, Run, VectorStoreFile};
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;

static CITATION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"【[^】]+】").expect("valid citation pattern"));

/// Collapse a provider run status into the job lifecycle.
pub fn run_status(status: &str) -> Result<JobStatus, PollError> {
    match status {
        "queued" => Ok(JobStatus::Pending),
        "in_progress" | "requires_action" | "cancelling" => Ok(JobStatus::Running),
        "completed" => Ok(JobStatus::Completed),
        "failed" | "cancelled" | "expired" | "incomplete" => Ok(JobStatus::Failed),
        other => Err(PollError::Transport(format!("unknown run status '{other}'"))),
    }
}

/// Collapse a provider vector-store file status into the job lifecycle.
pub fn file_status(status: &str) -> Result<JobStatus, PollError> {
    match status {
        "in_progress" => Ok(JobStatus::Running),
        "completed" => Ok(JobStatus::Completed),
        "failed" | "cancelled" => Ok(JobStatus::Failed),
        other => Err(PollError::Transport(format!("unknown file status '{other}'"))),
    }
}

/// Remove inline citation markers such as `【4:0†source】` and trim whitespace.
pub fn strip_citations(text: &str) -> String {
    CITATION_MARKER.replace_all(text, "").trim().to_string()
}

fn submission_error(error: OpenAiError) -> PollError {
    if error.is_rejection() {
        PollError::Submission(error.to_string())
    } else {
        PollError::Transport(error.to_string())
    }
}

fn transport_error(error: OpenAiError) -> PollError {
    PollError::Transport(error.to_string())
}

fn failure_reason(status: &str, last_error: Option<&LastError>) -> Option<String> {
    last_error
        .and_then(LastError::describe)
        .or_else(|| Some(format!("remote status '{status}'")))
}

fn job_from_run(run: Run) -> Result<Job, PollError> {
    let status = run_status(&run.status)?;
    let reason = failure_reason(&run.status, run.last_error.as_ref());
    let job = Job::new(run.id, status);
    Ok(if status == JobStatus::Failed {
        job.with_failure_reason(reason)
    } else {
        job
    })
}

fn job_from_file(file: VectorStoreFile) -> Result<Job, PollError> {
    let status = file_status(&file.status)?;
    let reason = failure_reason(&file.status, file.last_error.as_ref());
    let job = Job::new(file.id, status);
    Ok(if status == JobStatus::Failed {
        job.with_failure_reason(reason)
    } else {
        job
    })
}

/// Runs of an assistant on one conversation thread.
///
/// The thread is fixed per value, so each request builds its own source and no thread state is
/// shared between requests.
pub struct ThreadRuns {
    client: OpenAiClient,
    thread_id: String,
}

impl ThreadRuns {
    /// Track runs on `thread_id`.
    pub fn new(client: OpenAiClient, thread_id: impl Into<String>) -> Self {
        Self {
            client,
            thread_id: thread_id.into(),
        }
    }
}

#[async_trait]
impl JobSource for ThreadRuns {
    /// Assistant identifier to run.
    type Work = String;
    /// Cleaned answer text.
    type Output = String;

    fn kind(&self) -> &'static str {
        "assistant_run"
    }

    async fn submit(&self, assistant_id: String) -> Result<Job, PollError> {
        let run = self
            .client
            .create_run(&self.thread_id, &assistant_id)
            .await
            .map_err(submission_error)?;
        job_from_run(run)
    }

    async fn retrieve(&self, job_id: &str) -> Result<Job, PollError> {
        let run = self
            .client
            .retrieve_run(&self.thread_id, job_id)
            .await
            .map_err(transport_error)?;
        job_from_run(run)
    }

    /// Only messages written by this run count; older answers on a reused thread are ignored.
    async fn extract(&self, job: &Job) -> Result<String, PollError> {
        let messages = self
            .client
            .list_messages(&self.thread_id, Some(&job.id))
            .await
            .map_err(transport_error)?;

        let answer = messages
            .iter()
            .filter(|message| message.role == "assistant")
            .filter(|message| message.run_id.as_deref() == Some(job.id.as_str()))
            .flat_map(|message| message.content.iter())
            .find_map(|part| match part {
                MessageContent::Text { text } => Some(strip_citations(&text.value)),
                MessageContent::Other => None,
            })
            .filter(|answer| !answer.is_empty());

        answer.ok_or_else(|| PollError::JobFailed {
            job_id: job.id.clone(),
            reason: "run completed without an assistant text answer".to_string(),
        })
    }
}

/// Ingestion of uploaded files into one vector store.
pub struct VectorStoreIngestion {
    client: OpenAiClient,
    vector_store_id: String,
}

impl VectorStoreIngestion {
    /// Track ingestion into `vector_store_id`.
    pub fn new(client: OpenAiClient, vector_store_id: impl Into<String>) -> Self {
        Self {
            client,
            vector_store_id: vector_store_id.into(),
        }
    }
}

#[async_trait]
impl JobSource for VectorStoreIngestion {
    /// Uploaded file identifier.
    type Work = String;
    /// Identifier of the ingested file.
    type Output = String;

    fn kind(&self) -> &'static str {
        "vector_store_file"
    }

    async fn submit(&self, file_id: String) -> Result<Job, PollError> {
        let file = self
            .client
            .create_vector_store_file(&self.vector_store_id, &file_id)
            .await
            .map_err(submission_error)?;
        job_from_file(file)
    }

    async fn retrieve(&self, job_id: &str) -> Result<Job, PollError> {
        let file = self
            .client
            .retrieve_vector_store_file(&self.vector_store_id, job_id)
            .await
            .map_err(transport_error)?;
        job_from_file(file)
    }

    async fn extract(&self, job: &Job) -> Result<String, PollError> {
        Ok(job.id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::{PollSettings, Poller};
    use httpmock::{Method::GET, Method::POST, MockServer};
    use serde_json::json;
    use std::time::Duration;

    fn client(server: &MockServer) -> OpenAiClient {
        OpenAiClient::new(&server.base_url(), "sk-test").expect("client")
    }

    fn fast() -> PollSettings {
        PollSettings::new(Duration::from_millis(5), Some(Duration::from_millis(500)))
    }

    #[test]
    fn run_statuses_collapse_to_lifecycle() {
        assert_eq!(run_status("queued").ok(), Some(JobStatus::Pending));
        for status in ["in_progress", "requires_action", "cancelling"] {
            assert_eq!(run_status(status).ok(), Some(JobStatus::Running));
        }
        assert_eq!(run_status("completed").ok(), Some(JobStatus::Completed));
        for status in ["failed", "cancelled", "expired", "incomplete"] {
            assert_eq!(run_status(status).ok(), Some(JobStatus::Failed));
        }
        assert!(run_status("paused").is_err());
    }

    #[test]
    fn file_statuses_collapse_to_lifecycle() {
        assert_eq!(file_status("in_progress").ok(), Some(JobStatus::Running));
        assert_eq!(file_status("completed").ok(), Some(JobStatus::Completed));
        assert_eq!(file_status("cancelled").ok(), Some(JobStatus::Failed));
        assert!(file_status("queued").is_err());
    }

    #[test]
    fn citations_are_removed() {
        assert_eq!(
            strip_citations(" The policy covers dental【4:0†source】 care.【7:1†handbook.pdf】 "),
            "The policy covers dental care."
        );
        assert_eq!(strip_citations("unclosed 【4:0 marker"), "unclosed 【4:0 marker");
        assert_eq!(strip_citations("empty 【】 brackets"), "empty 【】 brackets");
    }

    #[tokio::test]
    async fn run_answer_is_first_assistant_text() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/threads/thread_1/runs");
                then.status(200)
                    .json_body(json!({ "id": "run_1", "status": "queued" }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/threads/thread_1/runs/run_1");
                then.status(200)
                    .json_body(json!({ "id": "run_1", "status": "completed" }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/threads/thread_1/messages")
                    .query_param("order", "desc")
                    .query_param("run_id", "run_1");
                then.status(200).json_body(json!({
                    "data": [
                        { "id": "msg_3", "role": "assistant", "run_id": "run_1", "content": [
                            { "type": "image_file", "image_file": { "file_id": "img" } },
                            { "type": "text", "text": { "value": "Thirty days.【1:0†policy.pdf】", "annotations": [] } }
                        ]},
                        { "id": "msg_2", "role": "user", "content": [
                            { "type": "text", "text": { "value": "How long is the notice period?", "annotations": [] } }
                        ]},
                        { "id": "msg_1", "role": "assistant", "run_id": "run_0", "content": [
                            { "type": "text", "text": { "value": "Older answer", "annotations": [] } }
                        ]}
                    ]
                }));
            })
            .await;

        let poller = Poller::new(ThreadRuns::new(client(&server), "thread_1"), fast());
        let answer = poller.run("asst_1".into()).await.expect("answer");

        assert_eq!(answer, "Thirty days.");
    }

    #[tokio::test]
    async fn completed_run_without_text_is_job_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/threads/thread_1/messages");
                then.status(200).json_body(json!({
                    "data": [{ "id": "msg_1", "role": "assistant", "run_id": "run_1", "content": [
                        { "type": "text", "text": { "value": "【0:0†source】 ", "annotations": [] } }
                    ]}]
                }));
            })
            .await;

        let poller = Poller::new(ThreadRuns::new(client(&server), "thread_1"), fast());
        let error = poller
            .await_completion(Job::new("run_1", JobStatus::Completed))
            .await
            .expect_err("no usable text");

        assert!(matches!(error, PollError::JobFailed { job_id, .. } if job_id == "run_1"));
    }

    #[tokio::test]
    async fn earlier_answer_on_reused_thread_is_not_returned() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/threads/thread_1/messages");
                then.status(200).json_body(json!({
                    "data": [
                        { "id": "msg_3", "role": "user", "content": [
                            { "type": "text", "text": { "value": "Second question?", "annotations": [] } }
                        ]},
                        { "id": "msg_2", "role": "assistant", "run_id": "run_1", "content": [
                            { "type": "text", "text": { "value": "Answer to the first question", "annotations": [] } }
                        ]}
                    ]
                }));
            })
            .await;

        let poller = Poller::new(ThreadRuns::new(client(&server), "thread_1"), fast());
        let error = poller
            .await_completion(Job::new("run_2", JobStatus::Completed))
            .await
            .expect_err("no answer from run_2");

        assert!(matches!(error, PollError::JobFailed { job_id, .. } if job_id == "run_2"));
    }

    #[tokio::test]
    async fn failed_run_carries_last_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/threads/thread_1/runs/run_1");
                then.status(200).json_body(json!({
                    "id": "run_1",
                    "status": "failed",
                    "last_error": { "code": "rate_limit_exceeded", "message": "Slow down" }
                }));
            })
            .await;

        let poller = Poller::new(ThreadRuns::new(client(&server), "thread_1"), fast());
        let error = poller
            .await_completion(Job::new("run_1", JobStatus::Running))
            .await
            .expect_err("failed run");

        assert!(matches!(
            error,
            PollError::JobFailed { reason, .. } if reason == "rate_limit_exceeded: Slow down"
        ));
    }

    #[tokio::test]
    async fn rejected_run_is_submission_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/threads/thread_1/runs");
                then.status(401).body("invalid api key");
            })
            .await;

        let poller = Poller::new(ThreadRuns::new(client(&server), "thread_1"), fast());
        let error = poller.submit("asst_1".into()).await.expect_err("rejected");

        assert!(matches!(error, PollError::Submission(_)));
    }

    #[tokio::test]
    async fn file_ingestion_polls_until_completed() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/vector_stores/vs_1/files")
                    .json_body(json!({ "file_id": "file_9" }));
                then.status(200)
                    .json_body(json!({ "id": "file_9", "status": "in_progress" }));
            })
            .await;
        let status = server
            .mock_async(|when, then| {
                when.method(GET).path("/vector_stores/vs_1/files/file_9");
                then.status(200)
                    .json_body(json!({ "id": "file_9", "status": "completed" }));
            })
            .await;

        let poller = Poller::new(VectorStoreIngestion::new(client(&server), "vs_1"), fast());
        let file_id = poller.run("file_9".into()).await.expect("ingested");

        assert_eq!(file_id, "file_9");
        status.assert_hits_async(1).await;
    }
}
