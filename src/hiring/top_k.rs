//! Plain whole-text strategy: one embedding per resume, one search per query.

use crate::embedding::{EmbeddingClient, EmbeddingClientError};
use crate::hiring::index::{EntryKind, IndexEntry, IndexFilter, VectorIndex};
use crate::hiring::types::{Candidate, HiringError, RankedCandidate};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Whole-resume similarity search with a score threshold.
#[derive(Clone)]
pub struct TopKSearch {
    embeddings: Arc<dyn EmbeddingClient>,
    index: Arc<dyn VectorIndex>,
}

impl TopKSearch {
    /// Assemble the strategy from its collaborators.
    pub fn new(embeddings: Arc<dyn EmbeddingClient>, index: Arc<dyn VectorIndex>) -> Self {
        Self { embeddings, index }
    }

    /// Store the candidate's full resume as a single entry.
    pub async fn ingest(&self, candidate: &Candidate) -> Result<usize, HiringError> {
        let vector = self.embed(candidate.text.clone()).await?;
        let entry = IndexEntry {
            candidate_id: candidate.id.clone(),
            kind: EntryKind::Resume,
            category: None,
            text: candidate.text.clone(),
            content: candidate.text.clone(),
            vector,
        };
        Ok(self.index.upsert(vec![entry]).await?)
    }

    /// Return up to `top_k` candidates scoring strictly above `threshold`, in index order.
    pub async fn query(
        &self,
        query_text: &str,
        top_k: usize,
        threshold: f32,
    ) -> Result<Vec<RankedCandidate>, HiringError> {
        let vector = self.embed(query_text.to_string()).await?;
        let matches = self
            .index
            .query(vector, top_k, IndexFilter::resumes())
            .await?;
        let total = matches.len();

        let ranked: Vec<RankedCandidate> = matches
            .into_iter()
            .filter(|hit| hit.score > threshold)
            .map(|hit| RankedCandidate {
                id: hit.candidate_id,
                text: hit.text,
                score: hit.score,
                category_scores: BTreeMap::new(),
            })
            .collect();
        tracing::debug!(matches = total, kept = ranked.len(), threshold, "Top-k search complete");
        Ok(ranked)
    }

    async fn embed(&self, text: String) -> Result<Vec<f32>, HiringError> {
        self.embeddings
            .generate_embeddings(vec![text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                EmbeddingClientError::GenerationFailed("provider returned no vector".into()).into()
            })
    }
}
