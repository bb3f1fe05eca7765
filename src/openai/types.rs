//! Error type and wire representations for provider responses.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Errors returned while interacting with the provider API.
#[derive(Debug, Error)]
pub enum OpenAiError {
    /// Base URL failed to parse or normalize.
    #[error("Invalid provider URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Provider responded with a non-success status code.
    #[error("Unexpected provider response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the provider.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// Provider answered successfully but the body lacked the expected content.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

impl OpenAiError {
    /// Whether the provider refused the request itself (4xx) rather than failing to serve it.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::UnexpectedStatus { status, .. } if status.is_client_error())
    }
}

/// Assistant configured with the file-search tool.
#[derive(Debug, Clone, Deserialize)]
pub struct Assistant {
    /// Provider-assigned identifier.
    pub id: String,
}

/// Vector store backing the assistant's file search.
#[derive(Debug, Clone, Deserialize)]
pub struct VectorStore {
    /// Provider-assigned identifier.
    pub id: String,
}

/// Conversation thread.
#[derive(Debug, Clone, Deserialize)]
pub struct Thread {
    /// Provider-assigned identifier.
    pub id: String,
}

/// Error detail attached to failed runs and ingestion jobs.
#[derive(Debug, Clone, Deserialize)]
pub struct LastError {
    /// Machine-readable error code.
    #[serde(default)]
    pub code: Option<String>,
    /// Human-readable description.
    #[serde(default)]
    pub message: Option<String>,
}

impl LastError {
    /// Flatten into a single reason string.
    pub fn describe(&self) -> Option<String> {
        match (self.code.as_deref(), self.message.as_deref()) {
            (Some(code), Some(message)) => Some(format!("{code}: {message}")),
            (Some(code), None) => Some(code.to_string()),
            (None, Some(message)) => Some(message.to_string()),
            (None, None) => None,
        }
    }
}

/// Execution of an assistant on a thread.
#[derive(Debug, Clone, Deserialize)]
pub struct Run {
    /// Provider-assigned identifier.
    pub id: String,
    /// Raw provider status (`queued`, `in_progress`, `completed`, ...).
    pub status: String,
    /// Failure detail, when the run failed.
    #[serde(default)]
    pub last_error: Option<LastError>,
}

/// File attached to a vector store, with its ingestion status.
#[derive(Debug, Clone, Deserialize)]
pub struct VectorStoreFile {
    /// Identifier of the underlying uploaded file.
    pub id: String,
    /// Raw provider status (`in_progress`, `completed`, `failed`, `cancelled`).
    pub status: String,
    /// Failure detail, when ingestion failed.
    #[serde(default)]
    pub last_error: Option<LastError>,
}

/// Message stored on a thread.
#[derive(Debug, Clone, Deserialize)]
pub struct ThreadMessage {
    /// Provider-assigned identifier.
    pub id: String,
    /// `user` or `assistant`.
    pub role: String,
    /// Run that produced the message; absent for user messages.
    #[serde(default)]
    pub run_id: Option<String>,
    /// Content parts of the message.
    #[serde(default)]
    pub content: Vec<MessageContent>,
}

/// One content part of a thread message.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    /// Plain text part.
    Text {
        /// Text body with annotations.
        text: TextContent,
    },
    /// Any other part (images, refusals, ...).
    #[serde(other)]
    Other,
}

/// Text body of a message part.
#[derive(Debug, Clone, Deserialize)]
pub struct TextContent {
    /// Raw text, possibly containing citation markers.
    pub value: String,
}

#[derive(Deserialize)]
pub(crate) struct ListResponse<T> {
    pub(crate) data: Vec<T>,
}

#[derive(Deserialize)]
pub(crate) struct ChatCompletionResponse {
    #[serde(default)]
    pub(crate) choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
pub(crate) struct ChatChoice {
    pub(crate) message: ChatChoiceMessage,
}

#[derive(Deserialize)]
pub(crate) struct ChatChoiceMessage {
    #[serde(default)]
    pub(crate) content: Option<String>,
    #[serde(default)]
    pub(crate) refusal: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct EmbeddingResponse {
    pub(crate) data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
pub(crate) struct EmbeddingDatum {
    pub(crate) index: usize,
    pub(crate) embedding: Vec<f32>,
}
