//! HTTP surface for the relay.
//!
//! This module exposes a compact Axum router with a handful of endpoints:
//!
//! - `POST /generate-embeddings` – Load the resume corpus and index every candidate. Returns
//!   `{ status, candidates_ingested, entries_written }`.
//! - `POST /query` – Rank candidates for `{ queryText, strategy? }`. Returns
//!   `{ status: "success", candidates, detailedResponse }` or `{ status: "notfound", message }`.
//! - `POST /ask` – Ask the file-search assistant `{ question, threadId? }`. Returns
//!   `{ answer, threadId }`.
//! - `POST /vector-store/files` – Attach an uploaded file `{ fileId }` to the assistant's vector
//!   store and wait for ingestion.
//! - `GET /metrics` – Observe relay counters.
//! - `GET /commands` – Machine-readable command catalog for quick discovery by tools/hosts.
//!
//! A body that cannot be read as the expected JSON, or a missing or blank required field, yields
//! `400`; any downstream failure yields `500` with a short `{ error }` body. A search without
//! qualifying candidates is a `200` with `notfound`.

use crate::assistant::{AskRequest, AssistantApi, AssistantError};
use crate::hiring::{
    HiringApi, HiringError, QueryOutcome, QueryRequest, QueryStrategy, RankedCandidate,
};
use crate::metrics::MetricsSnapshot;
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Shared handles injected into every handler.
struct AppState<H, A> {
    hiring: Arc<H>,
    assistant: Arc<A>,
}

impl<H, A> Clone for AppState<H, A> {
    fn clone(&self) -> Self {
        Self {
            hiring: self.hiring.clone(),
            assistant: self.assistant.clone(),
        }
    }
}

/// Build the HTTP router exposing the relay API surface.
pub fn create_router<H, A>(hiring: Arc<H>, assistant: Arc<A>) -> Router
where
    H: HiringApi + 'static,
    A: AssistantApi + 'static,
{
    Router::new()
        .route("/generate-embeddings", post(generate_embeddings::<H, A>))
        .route("/query", post(query::<H, A>))
        .route("/ask", post(ask::<H, A>))
        .route("/vector-store/files", post(attach_file::<H, A>))
        .route("/metrics", get(get_metrics::<H, A>))
        .route("/commands", get(get_commands))
        .with_state(AppState { hiring, assistant })
}

/// Success response for `POST /generate-embeddings`.
#[derive(Serialize)]
struct GenerateEmbeddingsResponse {
    status: &'static str,
    candidates_ingested: u64,
    entries_written: u64,
}

/// Ingest the configured resume corpus.
async fn generate_embeddings<H, A>(
    State(state): State<AppState<H, A>>,
) -> Result<Json<GenerateEmbeddingsResponse>, AppError>
where
    H: HiringApi,
    A: AssistantApi,
{
    let outcome = state.hiring.generate_embeddings().await?;
    Ok(Json(GenerateEmbeddingsResponse {
        status: "success",
        candidates_ingested: outcome.candidates_ingested,
        entries_written: outcome.entries_written,
    }))
}

/// Request body for `POST /query`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryBody {
    /// Free-text description of the wanted candidate.
    #[serde(default)]
    query_text: Option<String>,
    /// Optional strategy (`categories` | `top_k`), defaults to `categories`.
    #[serde(default)]
    strategy: Option<QueryStrategy>,
}

/// Response body for `POST /query`.
#[derive(Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum QueryResponse {
    Success {
        candidates: Vec<RankedCandidate>,
        #[serde(rename = "detailedResponse")]
        detailed_response: String,
    },
    NotFound {
        message: &'static str,
    },
}

/// Rank candidates for a free-text query.
async fn query<H, A>(
    State(state): State<AppState<H, A>>,
    body: Result<Json<QueryBody>, JsonRejection>,
) -> Result<Json<QueryResponse>, AppError>
where
    H: HiringApi,
    A: AssistantApi,
{
    let Json(body) = body?;
    let query_text = required(body.query_text, "queryText")?;
    let strategy = body.strategy.unwrap_or_default();
    let outcome = state
        .hiring
        .query(QueryRequest {
            query_text,
            strategy,
        })
        .await?;

    Ok(Json(match outcome {
        QueryOutcome::NotFound => QueryResponse::NotFound {
            message: "No candidates matched the query.",
        },
        QueryOutcome::Success {
            candidates,
            detailed_response,
        } => QueryResponse::Success {
            candidates,
            detailed_response,
        },
    }))
}

/// Request body for `POST /ask`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AskBody {
    #[serde(default)]
    question: Option<String>,
    /// Thread returned by a previous answer.
    #[serde(default)]
    thread_id: Option<String>,
}

/// Response body for `POST /ask`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AskResponse {
    answer: String,
    thread_id: String,
}

/// Ask the file-search assistant a question.
async fn ask<H, A>(
    State(state): State<AppState<H, A>>,
    body: Result<Json<AskBody>, JsonRejection>,
) -> Result<Json<AskResponse>, AppError>
where
    H: HiringApi,
    A: AssistantApi,
{
    let Json(body) = body?;
    let question = required(body.question, "question")?;
    let thread_id = body
        .thread_id
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());
    let outcome = state
        .assistant
        .ask(AskRequest {
            question,
            thread_id,
        })
        .await?;
    Ok(Json(AskResponse {
        answer: outcome.answer,
        thread_id: outcome.thread_id,
    }))
}

/// Request body for `POST /vector-store/files`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AttachFileBody {
    #[serde(default)]
    file_id: Option<String>,
}

/// Response body for `POST /vector-store/files`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AttachFileResponse {
    file_id: String,
    vector_store_id: String,
    status: &'static str,
}

/// Attach an uploaded file to the assistant's vector store.
async fn attach_file<H, A>(
    State(state): State<AppState<H, A>>,
    body: Result<Json<AttachFileBody>, JsonRejection>,
) -> Result<Json<AttachFileResponse>, AppError>
where
    H: HiringApi,
    A: AssistantApi,
{
    let Json(body) = body?;
    let file_id = required(body.file_id, "fileId")?;
    let outcome = state.assistant.attach_file(&file_id).await?;
    Ok(Json(AttachFileResponse {
        file_id: outcome.file_id,
        vector_store_id: outcome.vector_store_id,
        status: outcome.status.as_str(),
    }))
}

/// Return the relay counters.
async fn get_metrics<H, A>(State(state): State<AppState<H, A>>) -> Json<MetricsSnapshot>
where
    H: HiringApi,
    A: AssistantApi,
{
    Json(state.hiring.metrics_snapshot())
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery/UX in hosts and tools.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "generate_embeddings",
                method: "POST",
                path: "/generate-embeddings",
                description: "Load the resume corpus and index every candidate per category and as whole text.",
                request_example: None,
            },
            CommandDescriptor {
                name: "query",
                method: "POST",
                path: "/query",
                description: "Rank candidates for a free-text query and summarize them. Strategy is `categories` (default) or `top_k`.",
                request_example: Some(json!({
                    "queryText": "Senior Java backend engineer",
                    "strategy": "categories"
                })),
            },
            CommandDescriptor {
                name: "ask",
                method: "POST",
                path: "/ask",
                description: "Ask the file-search assistant a question. Pass the returned threadId to continue the conversation.",
                request_example: Some(json!({
                    "question": "What does the handbook say about remote work?",
                    "threadId": "thread_abc123"
                })),
            },
            CommandDescriptor {
                name: "attach_file",
                method: "POST",
                path: "/vector-store/files",
                description: "Attach an uploaded file to the assistant's vector store and wait until it is searchable.",
                request_example: Some(json!({ "fileId": "file-abc123" })),
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return relay counters useful for observability dashboards.",
                request_example: None,
            },
        ],
    })
}

fn required(value: Option<String>, field: &'static str) -> Result<String, AppError> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(AppError::MissingField(field))
}

enum AppError {
    MissingField(&'static str),
    InvalidBody(JsonRejection),
    Hiring(HiringError),
    Assistant(AssistantError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::MissingField(field) => (
                StatusCode::BAD_REQUEST,
                format!("Missing required field '{field}'"),
            ),
            Self::InvalidBody(rejection) => (
                StatusCode::BAD_REQUEST,
                format!("Invalid request body: {}", rejection.body_text()),
            ),
            Self::Hiring(error) => {
                tracing::error!(error = %error, "Resume search request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
            }
            Self::Assistant(error) => {
                tracing::error!(error = %error, "Assistant request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidBody(rejection)
    }
}

impl From<HiringError> for AppError {
    fn from(inner: HiringError) -> Self {
        Self::Hiring(inner)
    }
}

impl From<AssistantError> for AppError {
    fn from(inner: AssistantError) -> Self {
        Self::Assistant(inner)
    }
}
