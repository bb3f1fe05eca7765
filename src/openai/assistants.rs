//! Assistants v2 endpoints: assistants, vector stores, threads, messages, and runs.

use crate::openai::client::OpenAiClient;
use crate::openai::types::{
    Assistant, ListResponse, OpenAiError, Run, Thread, ThreadMessage, VectorStore,
    VectorStoreFile,
};
use reqwest::Method;
use serde_json::json;

impl OpenAiClient {
    /// Create an assistant equipped with the `file_search` tool.
    pub async fn create_assistant(
        &self,
        model: &str,
        name: &str,
        instructions: &str,
    ) -> Result<Assistant, OpenAiError> {
        let body = json!({
            "name": name,
            "instructions": instructions,
            "model": model,
            "tools": [{ "type": "file_search" }],
        });
        self.send_json(self.request(Method::POST, "assistants").json(&body))
            .await
    }

    /// Point the assistant's file search at a vector store.
    pub async fn attach_vector_store(
        &self,
        assistant_id: &str,
        vector_store_id: &str,
    ) -> Result<Assistant, OpenAiError> {
        let body = json!({
            "tool_resources": {
                "file_search": { "vector_store_ids": [vector_store_id] }
            }
        });
        self.send_json(
            self.request(Method::POST, &format!("assistants/{assistant_id}"))
                .json(&body),
        )
        .await
    }

    /// Create an empty vector store.
    pub async fn create_vector_store(&self, name: &str) -> Result<VectorStore, OpenAiError> {
        self.send_json(
            self.request(Method::POST, "vector_stores")
                .json(&json!({ "name": name })),
        )
        .await
    }

    /// Attach an uploaded file to a vector store, starting ingestion.
    pub async fn create_vector_store_file(
        &self,
        vector_store_id: &str,
        file_id: &str,
    ) -> Result<VectorStoreFile, OpenAiError> {
        self.send_json(
            self.request(
                Method::POST,
                &format!("vector_stores/{vector_store_id}/files"),
            )
            .json(&json!({ "file_id": file_id })),
        )
        .await
    }

    /// Fetch the ingestion state of a vector store file.
    pub async fn retrieve_vector_store_file(
        &self,
        vector_store_id: &str,
        file_id: &str,
    ) -> Result<VectorStoreFile, OpenAiError> {
        self.send_json(self.request(
            Method::GET,
            &format!("vector_stores/{vector_store_id}/files/{file_id}"),
        ))
        .await
    }

    /// Start a new, empty conversation thread.
    pub async fn create_thread(&self) -> Result<Thread, OpenAiError> {
        self.send_json(self.request(Method::POST, "threads").json(&json!({})))
            .await
    }

    /// Append a user message to a thread.
    pub async fn add_user_message(
        &self,
        thread_id: &str,
        content: &str,
    ) -> Result<ThreadMessage, OpenAiError> {
        self.send_json(
            self.request(Method::POST, &format!("threads/{thread_id}/messages"))
                .json(&json!({ "role": "user", "content": content })),
        )
        .await
    }

    /// List thread messages, newest first, optionally only those produced by `run_id`.
    pub async fn list_messages(
        &self,
        thread_id: &str,
        run_id: Option<&str>,
    ) -> Result<Vec<ThreadMessage>, OpenAiError> {
        let mut request = self
            .request(Method::GET, &format!("threads/{thread_id}/messages"))
            .query(&[("order", "desc")]);
        if let Some(run_id) = run_id {
            request = request.query(&[("run_id", run_id)]);
        }
        let response: ListResponse<ThreadMessage> = self.send_json(request).await?;
        Ok(response.data)
    }

    /// Run an assistant on a thread.
    pub async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run, OpenAiError> {
        self.send_json(
            self.request(Method::POST, &format!("threads/{thread_id}/runs"))
                .json(&json!({ "assistant_id": assistant_id })),
        )
        .await
    }

    /// Fetch the current state of a run.
    pub async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, OpenAiError> {
        self.send_json(self.request(
            Method::GET,
            &format!("threads/{thread_id}/runs/{run_id}"),
        ))
        .await
    }
}

#[cfg(test)]
mod tests {
    use crate::openai::{MessageContent, OpenAiClient};
    use httpmock::{Method::GET, Method::POST, MockServer};
    use serde_json::json;

    fn client(server: &MockServer) -> OpenAiClient {
        OpenAiClient::new(&server.base_url(), "sk-test").expect("client")
    }

    #[tokio::test]
    async fn create_run_sends_assistant_id_and_beta_header() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/threads/thread_1/runs")
                    .header("openai-beta", "assistants=v2")
                    .json_body(json!({ "assistant_id": "asst_1" }));
                then.status(200).json_body(json!({
                    "id": "run_1",
                    "object": "thread.run",
                    "status": "queued"
                }));
            })
            .await;

        let run = client(&server)
            .create_run("thread_1", "asst_1")
            .await
            .expect("run");

        mock.assert_async().await;
        assert_eq!(run.id, "run_1");
        assert_eq!(run.status, "queued");
        assert!(run.last_error.is_none());
    }

    #[tokio::test]
    async fn list_messages_decodes_text_and_skips_other_parts() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/threads/thread_1/messages")
                    .query_param("order", "desc")
                    .query_param("run_id", "run_1");
                then.status(200).json_body(json!({
                    "object": "list",
                    "data": [
                        {
                            "id": "msg_2",
                            "role": "assistant",
                            "run_id": "run_1",
                            "content": [
                                { "type": "image_file", "image_file": { "file_id": "f" } },
                                { "type": "text", "text": { "value": "Answer", "annotations": [] } }
                            ]
                        },
                        {
                            "id": "msg_1",
                            "role": "user",
                            "content": [
                                { "type": "text", "text": { "value": "Question", "annotations": [] } }
                            ]
                        }
                    ]
                }));
            })
            .await;

        let messages = client(&server)
            .list_messages("thread_1", Some("run_1"))
            .await
            .expect("messages");

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "assistant");
        assert_eq!(messages[0].run_id.as_deref(), Some("run_1"));
        assert_eq!(messages[1].run_id, None);
        assert!(matches!(messages[0].content[0], MessageContent::Other));
        assert!(
            matches!(&messages[0].content[1], MessageContent::Text { text } if text.value == "Answer")
        );
    }

    #[tokio::test]
    async fn failed_vector_store_file_carries_last_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/vector_stores/vs_1/files/file_1");
                then.status(200).json_body(json!({
                    "id": "file_1",
                    "status": "failed",
                    "last_error": { "code": "unsupported_file", "message": "bad pdf" }
                }));
            })
            .await;

        let file = client(&server)
            .retrieve_vector_store_file("vs_1", "file_1")
            .await
            .expect("file");

        assert_eq!(file.status, "failed");
        assert_eq!(
            file.last_error.and_then(|error| error.describe()).as_deref(),
            Some("unsupported_file: bad pdf")
        );
    }
}
