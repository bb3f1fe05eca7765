//! Minimal REST client for the hosted AI provider: chat completions, embeddings, and the
//! assistants v2 surface (assistants, threads, runs, vector stores).

mod assistants;
mod chat;
mod client;
mod types;

pub use chat::{ChatClient, ChatRequest, ResponseFormat};
pub use client::OpenAiClient;
pub use types::{
    Assistant, LastError, MessageContent, OpenAiError, Run, TextContent, Thread, ThreadMessage,
    VectorStore, VectorStoreFile,
};
