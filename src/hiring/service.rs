//! Hiring service coordinating corpus ingestion, retrieval strategies, and summaries.

use crate::config::Config;
use crate::embedding::{EmbeddingClient, get_embedding_client};
use crate::hiring::aggregator::CategoryAggregator;
use crate::hiring::corpus::load_candidates;
use crate::hiring::index::{QdrantIndex, VectorIndex};
use crate::hiring::summary::summarize_candidates;
use crate::hiring::top_k::TopKSearch;
use crate::hiring::types::{
    Candidate, HiringError, IngestOutcome, QueryOutcome, QueryRequest, QueryStrategy,
};
use crate::metrics::{MetricsSnapshot, RelayMetrics};
use crate::openai::{ChatClient, OpenAiClient};
use crate::qdrant::QdrantService;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

/// Abstraction over resume search used by the HTTP surface and the CLI.
#[async_trait]
pub trait HiringApi: Send + Sync {
    /// Load the configured corpus and index every candidate with both strategies.
    async fn generate_embeddings(&self) -> Result<IngestOutcome, HiringError>;

    /// Rank candidates for a query and summarize them.
    async fn query(&self, request: QueryRequest) -> Result<QueryOutcome, HiringError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

/// Tunables for ingestion and retrieval.
#[derive(Debug, Clone)]
pub struct SearchSettings {
    /// Chat model used for extraction and summaries.
    pub chat_model: String,
    /// Resume corpus location.
    pub csv_path: PathBuf,
    /// Keep every N-th corpus row.
    pub sample_every: usize,
    /// Results per category search and per plain search.
    pub top_k: usize,
    /// Exclusive score threshold for the plain strategy.
    pub score_threshold: f32,
    /// Ranked list truncation.
    pub max_candidates: usize,
}

impl SearchSettings {
    /// Settings derived from the loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            chat_model: config.chat_model.clone(),
            csv_path: PathBuf::from(&config.resume_csv_path),
            sample_every: config.resume_sample_every,
            top_k: config.search_top_k,
            score_threshold: config.search_score_threshold,
            max_candidates: config.search_max_candidates,
        }
    }
}

/// Resume search over a shared vector index.
///
/// The service owns long-lived handles to the chat client, embedding client, and index so the
/// HTTP surface and the CLI reuse the same components. Construct it once and share it through an
/// `Arc`.
pub struct HiringService {
    chat: Arc<dyn ChatClient>,
    aggregator: CategoryAggregator,
    top_k: TopKSearch,
    settings: SearchSettings,
    metrics: Arc<RelayMetrics>,
}

impl HiringService {
    /// Build the service from configuration, ensuring the resume collection exists.
    pub async fn new(config: &Config, metrics: Arc<RelayMetrics>) -> Result<Self, HiringError> {
        tracing::info!("Initializing hiring service");
        let chat: Arc<dyn ChatClient> = Arc::new(OpenAiClient::from_config(config)?);
        let embeddings: Arc<dyn EmbeddingClient + Send + Sync> =
            Arc::from(get_embedding_client(config)?);

        let index = QdrantIndex::new(
            QdrantService::from_config(config)?,
            config.qdrant_collection_name.clone(),
        );
        index.ensure_ready(config.embedding_dimension as u64).await?;
        tracing::debug!(collection = %config.qdrant_collection_name, "Resume collection ready");

        Ok(Self::from_parts(
            chat,
            embeddings,
            Arc::new(index),
            SearchSettings::from_config(config),
            metrics,
        ))
    }

    /// Assemble the service from explicit collaborators.
    pub fn from_parts(
        chat: Arc<dyn ChatClient>,
        embeddings: Arc<dyn EmbeddingClient>,
        index: Arc<dyn VectorIndex>,
        settings: SearchSettings,
        metrics: Arc<RelayMetrics>,
    ) -> Self {
        let aggregator = CategoryAggregator::new(
            chat.clone(),
            embeddings.clone(),
            index.clone(),
            settings.chat_model.clone(),
        );
        let top_k = TopKSearch::new(embeddings, index);
        Self {
            chat,
            aggregator,
            top_k,
            settings,
            metrics,
        }
    }

    /// Ingest the given candidates with both strategies.
    pub async fn ingest_candidates(
        &self,
        candidates: &[Candidate],
    ) -> Result<IngestOutcome, HiringError> {
        let mut outcome = IngestOutcome::default();
        for candidate in candidates {
            let by_category = self.aggregator.ingest(candidate).await?;
            let whole_text = self.top_k.ingest(candidate).await?;
            let written = (by_category + whole_text) as u64;
            self.metrics.record_candidate(written);
            outcome.candidates_ingested += 1;
            outcome.entries_written += written;
        }
        Ok(outcome)
    }
}

#[async_trait]
impl HiringApi for HiringService {
    async fn generate_embeddings(&self) -> Result<IngestOutcome, HiringError> {
        let candidates = load_candidates(&self.settings.csv_path, self.settings.sample_every)?;
        tracing::info!(candidates = candidates.len(), "Ingesting resume corpus");
        let outcome = self.ingest_candidates(&candidates).await?;
        tracing::info!(
            candidates = outcome.candidates_ingested,
            entries = outcome.entries_written,
            "Resume corpus ingested"
        );
        Ok(outcome)
    }

    async fn query(&self, request: QueryRequest) -> Result<QueryOutcome, HiringError> {
        let settings = &self.settings;
        let mut candidates = match request.strategy {
            QueryStrategy::Categories => {
                self.aggregator
                    .query(&request.query_text, settings.top_k)
                    .await?
            }
            QueryStrategy::TopK => {
                self.top_k
                    .query(&request.query_text, settings.top_k, settings.score_threshold)
                    .await?
            }
        };
        candidates.truncate(settings.max_candidates);
        tracing::info!(
            strategy = request.strategy.as_str(),
            candidates = candidates.len(),
            "Resume search ranked"
        );

        if candidates.is_empty() {
            self.metrics.record_query();
            return Ok(QueryOutcome::NotFound);
        }

        let detailed_response = summarize_candidates(
            self.chat.as_ref(),
            &settings.chat_model,
            &request.query_text,
            &candidates,
        )
        .await?;
        self.metrics.record_query();
        Ok(QueryOutcome::Success {
            candidates,
            detailed_response,
        })
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}
