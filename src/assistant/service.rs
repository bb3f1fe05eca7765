//! File-search assistant service: questions over threads, files into the vector store.

use crate::assistant::jobs::{ThreadRuns, VectorStoreIngestion};
use crate::config::Config;
use crate::jobs::{JobStatus, PollError, PollSettings, Poller};
use crate::metrics::RelayMetrics;
use crate::openai::{OpenAiClient, OpenAiError};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

const ASSISTANT_NAME: &str = "File-based Assistant";
const ASSISTANT_INSTRUCTIONS: &str =
    "You are an assistant that answers questions based on the uploaded files.";
const VECTOR_STORE_NAME: &str = "Document Vector Store";

/// Errors produced by the assistant service.
#[derive(Debug, Error)]
pub enum AssistantError {
    /// A direct provider call failed.
    #[error("Provider request failed: {0}")]
    Provider(#[from] OpenAiError),
    /// Submitting or tracking a job failed.
    #[error(transparent)]
    Poll(#[from] PollError),
}

/// Question addressed to the assistant.
#[derive(Debug, Clone)]
pub struct AskRequest {
    /// Question text.
    pub question: String,
    /// Thread to continue; a new one is created when absent.
    pub thread_id: Option<String>,
}

/// Answer together with the thread that carries the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AskOutcome {
    /// Cleaned answer text.
    pub answer: String,
    /// Thread to pass back on follow-up questions.
    pub thread_id: String,
}

/// Result of attaching a file to the assistant's vector store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachOutcome {
    /// Ingested file.
    pub file_id: String,
    /// Vector store the file now belongs to.
    pub vector_store_id: String,
    /// Final ingestion status.
    pub status: JobStatus,
}

/// Abstraction over the assistant used by the HTTP surface.
#[async_trait]
pub trait AssistantApi: Send + Sync {
    /// Ask a question, continuing `thread_id` when given.
    async fn ask(&self, request: AskRequest) -> Result<AskOutcome, AssistantError>;

    /// Attach an already-uploaded file to the vector store and wait for ingestion.
    async fn attach_file(&self, file_id: &str) -> Result<AttachOutcome, AssistantError>;
}

/// Assistant and vector store created once at startup.
pub struct AssistantService {
    client: OpenAiClient,
    assistant_id: String,
    vector_store_id: String,
    poll: PollSettings,
    metrics: Arc<RelayMetrics>,
}

impl AssistantService {
    /// Create the file-search assistant and its vector store, then link them.
    pub async fn new(config: &Config, metrics: Arc<RelayMetrics>) -> Result<Self, AssistantError> {
        let client = OpenAiClient::from_config(config)?;
        let assistant = client
            .create_assistant(
                &config.assistant_model,
                ASSISTANT_NAME,
                ASSISTANT_INSTRUCTIONS,
            )
            .await?;
        let vector_store = client.create_vector_store(VECTOR_STORE_NAME).await?;
        client
            .attach_vector_store(&assistant.id, &vector_store.id)
            .await?;
        tracing::info!(
            assistant_id = %assistant.id,
            vector_store_id = %vector_store.id,
            model = %config.assistant_model,
            "Assistant ready"
        );

        Ok(Self::from_parts(
            client,
            assistant.id,
            vector_store.id,
            PollSettings::from_config(config),
            metrics,
        ))
    }

    /// Wrap an existing assistant and vector store.
    pub fn from_parts(
        client: OpenAiClient,
        assistant_id: impl Into<String>,
        vector_store_id: impl Into<String>,
        poll: PollSettings,
        metrics: Arc<RelayMetrics>,
    ) -> Self {
        Self {
            client,
            assistant_id: assistant_id.into(),
            vector_store_id: vector_store_id.into(),
            poll,
            metrics,
        }
    }

    /// Identifier of the managed assistant.
    pub fn assistant_id(&self) -> &str {
        &self.assistant_id
    }

    /// Identifier of the managed vector store.
    pub fn vector_store_id(&self) -> &str {
        &self.vector_store_id
    }
}

#[async_trait]
impl AssistantApi for AssistantService {
    async fn ask(&self, request: AskRequest) -> Result<AskOutcome, AssistantError> {
        let thread_id = match request.thread_id {
            Some(thread_id) => thread_id,
            None => {
                let thread = self.client.create_thread().await?;
                tracing::debug!(thread_id = %thread.id, "Created thread");
                thread.id
            }
        };

        self.client
            .add_user_message(&thread_id, &request.question)
            .await?;
        let poller = Poller::new(ThreadRuns::new(self.client.clone(), &thread_id), self.poll);
        let answer = poller.run(self.assistant_id.clone()).await?;

        self.metrics.record_answer();
        tracing::info!(thread_id = %thread_id, answer_chars = answer.len(), "Question answered");
        Ok(AskOutcome { answer, thread_id })
    }

    async fn attach_file(&self, file_id: &str) -> Result<AttachOutcome, AssistantError> {
        let poller = Poller::new(
            VectorStoreIngestion::new(self.client.clone(), &self.vector_store_id),
            self.poll,
        );
        let file_id = poller.run(file_id.to_string()).await?;

        self.metrics.record_file();
        tracing::info!(file_id = %file_id, vector_store_id = %self.vector_store_id, "File ingested");
        Ok(AttachOutcome {
            file_id,
            vector_store_id: self.vector_store_id.clone(),
            status: JobStatus::Completed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use httpmock::{Method::GET, Method::POST, MockServer};
    use serde_json::json;
    use std::time::Duration;

    fn service(server: &MockServer) -> AssistantService {
        AssistantService::from_parts(
            OpenAiClient::new(&server.base_url(), "sk-test").expect("client"),
            "asst_1",
            "vs_1",
            PollSettings::new(Duration::from_millis(5), Some(Duration::from_millis(500))),
            Arc::new(RelayMetrics::new()),
        )
    }

    async fn mock_completed_run(server: &MockServer, thread_id: &str) {
        let runs = format!("/threads/{thread_id}/runs");
        let run = format!("/threads/{thread_id}/runs/run_1");
        let messages = format!("/threads/{thread_id}/messages");
        server
            .mock_async(|when, then| {
                when.method(POST).path(runs.as_str());
                then.status(200)
                    .json_body(json!({ "id": "run_1", "status": "queued" }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(run.as_str());
                then.status(200)
                    .json_body(json!({ "id": "run_1", "status": "completed" }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(messages.as_str());
                then.status(200).json_body(json!({
                    "data": [{ "id": "msg_2", "role": "assistant", "run_id": "run_1", "content": [
                        { "type": "text", "text": { "value": "Yes.【3:0†faq.pdf】", "annotations": [] } }
                    ]}]
                }));
            })
            .await;
    }

    #[tokio::test]
    async fn ask_without_thread_creates_one() {
        let server = MockServer::start_async().await;
        let create_thread = server
            .mock_async(|when, then| {
                when.method(POST).path("/threads");
                then.status(200).json_body(json!({ "id": "thread_new" }));
            })
            .await;
        let add_message = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/threads/thread_new/messages")
                    .json_body(json!({ "role": "user", "content": "Is parking included?" }));
                then.status(200)
                    .json_body(json!({ "id": "msg_1", "role": "user", "content": [] }));
            })
            .await;
        mock_completed_run(&server, "thread_new").await;
        let service = service(&server);

        let outcome = service
            .ask(AskRequest {
                question: "Is parking included?".into(),
                thread_id: None,
            })
            .await
            .expect("answer");

        assert_eq!(
            outcome,
            AskOutcome {
                answer: "Yes.".into(),
                thread_id: "thread_new".into()
            }
        );
        create_thread.assert_async().await;
        add_message.assert_async().await;
        assert_eq!(service.metrics.snapshot().questions_answered, 1);
    }

    #[tokio::test]
    async fn ask_reuses_supplied_thread() {
        let server = MockServer::start_async().await;
        let create_thread = server
            .mock_async(|when, then| {
                when.method(POST).path("/threads");
                then.status(200).json_body(json!({ "id": "thread_unused" }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/threads/thread_7/messages");
                then.status(200)
                    .json_body(json!({ "id": "msg_1", "role": "user", "content": [] }));
            })
            .await;
        mock_completed_run(&server, "thread_7").await;

        let outcome = service(&server)
            .ask(AskRequest {
                question: "And on weekends?".into(),
                thread_id: Some("thread_7".into()),
            })
            .await
            .expect("answer");

        assert_eq!(outcome.thread_id, "thread_7");
        create_thread.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn failed_file_ingestion_is_reported() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/vector_stores/vs_1/files");
                then.status(200).json_body(json!({
                    "id": "file_1",
                    "status": "failed",
                    "last_error": { "code": "unsupported_file", "message": "Bad format" }
                }));
            })
            .await;
        let service = service(&server);

        let error = service.attach_file("file_1").await.expect_err("failed ingestion");

        assert!(matches!(
            error,
            AssistantError::Poll(PollError::JobFailed { ref reason, .. }) if reason == "unsupported_file: Bad format"
        ));
        assert_eq!(service.metrics.snapshot().files_ingested, 0);
    }

    #[tokio::test]
    async fn startup_creates_and_links_assistant_and_store() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/assistants")
                    .body_contains("file_search")
                    .body_contains("gpt-4o-mini");
                then.status(200).json_body(json!({ "id": "asst_42" }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/vector_stores");
                then.status(200).json_body(json!({ "id": "vs_42" }));
            })
            .await;
        let link = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/assistants/asst_42")
                    .body_contains("vs_42");
                then.status(200).json_body(json!({ "id": "asst_42" }));
            })
            .await;
        let config = Config {
            openai_base_url: server.base_url(),
            ..test_config()
        };

        let service = AssistantService::new(&config, Arc::new(RelayMetrics::new()))
            .await
            .expect("service");

        assert_eq!(service.assistant_id(), "asst_42");
        assert_eq!(service.vector_store_id(), "vs_42");
        link.assert_async().await;
    }
}
