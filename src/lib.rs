#![deny(missing_docs)]

//! Core library for the AI relay: resume search and a file-search assistant behind one HTTP
//! surface.

/// HTTP routing and REST handlers.
pub mod api;
/// File-search assistant built on threads, runs, and vector stores.
pub mod assistant;
/// Environment-driven configuration management.
pub mod config;
/// Embedding client abstraction and adapters.
pub mod embedding;
/// Resume search: category aggregation and plain top-K retrieval.
pub mod hiring;
/// Fixed-interval polling of remote long-running jobs.
pub mod jobs;
/// Structured logging and tracing setup.
pub mod logging;
/// Relay activity counters.
pub mod metrics;
/// Hosted AI provider REST client.
pub mod openai;
/// Qdrant vector store integration.
pub mod qdrant;
