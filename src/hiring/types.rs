//! Request, outcome, and error types for resume search.

use crate::embedding::EmbeddingClientError;
use crate::hiring::categories::Category;
use crate::hiring::corpus::CorpusError;
use crate::hiring::extraction::ExtractionError;
use crate::openai::OpenAiError;
use crate::qdrant::QdrantError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors produced by resume ingestion and search.
#[derive(Debug, Error)]
pub enum HiringError {
    /// Category extraction failed or returned an unusable shape.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    /// Embedding provider failed.
    #[error("Embedding failed: {0}")]
    Embedding(#[from] EmbeddingClientError),
    /// Vector index request failed.
    #[error("Vector index request failed: {0}")]
    Index(#[from] QdrantError),
    /// Summary completion failed.
    #[error("Chat request failed: {0}")]
    Chat(#[from] OpenAiError),
    /// Resume corpus could not be loaded.
    #[error(transparent)]
    Corpus(#[from] CorpusError),
}

/// One searchable corpus record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Stable identifier within the corpus.
    pub id: String,
    /// Resume text.
    pub text: String,
}

impl Candidate {
    /// Build a candidate record.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// Candidate materialized from index matches for one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedCandidate {
    /// Candidate identifier.
    pub id: String,
    /// Resume text stored with the matching entries.
    pub text: String,
    /// Aggregate score; an unnormalized sum for the category strategy.
    pub score: f32,
    /// Per-category contributions; empty for the plain top-K strategy.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub category_scores: BTreeMap<Category, f32>,
}

/// Retrieval strategy applied to a query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStrategy {
    /// Per-category search with additive score merge.
    #[default]
    Categories,
    /// Single whole-text search with a score threshold.
    #[serde(alias = "top-k")]
    TopK,
}

impl QueryStrategy {
    /// Stable name used in logs and the command catalog.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Categories => "categories",
            Self::TopK => "top_k",
        }
    }
}

impl std::str::FromStr for QueryStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "categories" | "category" => Ok(Self::Categories),
            "top_k" | "top-k" | "topk" => Ok(Self::TopK),
            other => Err(format!(
                "unknown strategy '{other}' (expected 'categories' or 'top-k')"
            )),
        }
    }
}

/// Search request handled by the hiring service.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    /// Free-text description of the wanted candidate.
    pub query_text: String,
    /// Strategy to apply.
    pub strategy: QueryStrategy,
}

/// Result of a search request.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// No candidate qualified.
    NotFound,
    /// At least one candidate qualified.
    Success {
        /// Ranked candidates, truncated to the configured maximum.
        candidates: Vec<RankedCandidate>,
        /// Recruiter-style summary of the candidates.
        detailed_response: String,
    },
}

/// Counters reported after corpus ingestion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestOutcome {
    /// Candidates read from the corpus and ingested.
    pub candidates_ingested: u64,
    /// Index entries written across both strategies.
    pub entries_written: u64,
}
