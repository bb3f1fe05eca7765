//! Multi-category retrieval: one similarity space per category, scores merged per candidate.
//!
//! Both ingestion and querying decompose text into the fixed [`Category`] set. A query runs one
//! filtered search per category, in enumeration order, and each candidate's total is the plain sum
//! of its per-category scores. The total is unnormalized: a candidate hit in several categories can
//! outrank one with a single higher hit.

use crate::embedding::{EmbeddingClient, EmbeddingClientError};
use crate::hiring::categories::{Category, CategoryEmbeddings, CategoryValues, join_values};
use crate::hiring::extraction;
use crate::hiring::index::{EntryKind, IndexEntry, IndexFilter, IndexMatch, VectorIndex};
use crate::hiring::types::{Candidate, HiringError, RankedCandidate};
use crate::openai::ChatClient;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Category-decomposed ingestion and search over a [`VectorIndex`].
#[derive(Clone)]
pub struct CategoryAggregator {
    chat: Arc<dyn ChatClient>,
    embeddings: Arc<dyn EmbeddingClient>,
    index: Arc<dyn VectorIndex>,
    chat_model: String,
}

impl CategoryAggregator {
    /// Assemble an aggregator from its collaborators.
    pub fn new(
        chat: Arc<dyn ChatClient>,
        embeddings: Arc<dyn EmbeddingClient>,
        index: Arc<dyn VectorIndex>,
        chat_model: impl Into<String>,
    ) -> Self {
        Self {
            chat,
            embeddings,
            index,
            chat_model: chat_model.into(),
        }
    }

    /// Derive values for every category from free text.
    pub async fn extract_categories(&self, text: &str) -> Result<CategoryValues, HiringError> {
        Ok(extraction::extract_categories(self.chat.as_ref(), &self.chat_model, text).await?)
    }

    /// Embed each category's joined values, one request per category in enumeration order.
    pub async fn embed_categories(
        &self,
        categories: &CategoryValues,
    ) -> Result<CategoryEmbeddings, HiringError> {
        let mut embeddings = CategoryEmbeddings::new();
        for (category, values) in categories {
            let vector = self.embed_one(join_values(values)).await?;
            embeddings.insert(*category, vector);
        }
        Ok(embeddings)
    }

    /// Store one entry per category for `candidate`; returns the number of entries written.
    pub async fn ingest(&self, candidate: &Candidate) -> Result<usize, HiringError> {
        let categories = self.extract_categories(&candidate.text).await?;
        let embeddings = self.embed_categories(&categories).await?;

        let entries: Vec<IndexEntry> = embeddings
            .into_iter()
            .map(|(category, vector)| IndexEntry {
                candidate_id: candidate.id.clone(),
                kind: EntryKind::Category,
                category: Some(category),
                text: candidate.text.clone(),
                content: categories
                    .get(&category)
                    .map(|values| join_values(values))
                    .unwrap_or_default(),
                vector,
            })
            .collect();

        let written = self.index.upsert(entries).await?;
        tracing::debug!(candidate_id = %candidate.id, entries = written, "Candidate categories indexed");
        Ok(written)
    }

    /// Rank candidates for `query_text` by summed per-category similarity.
    pub async fn query(
        &self,
        query_text: &str,
        top_k_per_category: usize,
    ) -> Result<Vec<RankedCandidate>, HiringError> {
        let categories = self.extract_categories(query_text).await?;
        let embeddings = self.embed_categories(&categories).await?;

        let mut per_category = Vec::with_capacity(embeddings.len());
        for (category, vector) in embeddings {
            let matches = self
                .index
                .query(vector, top_k_per_category, IndexFilter::category(category))
                .await?;
            tracing::debug!(category = %category, matches = matches.len(), "Category search complete");
            per_category.push((category, matches));
        }

        Ok(aggregate(per_category))
    }

    async fn embed_one(&self, text: String) -> Result<Vec<f32>, HiringError> {
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

/// Merge per-category matches into one list sorted by total score, descending.
///
/// Candidates keep the position of their first discovery for tie-breaking; candidates that never
/// matched are absent.
pub fn aggregate<I>(per_category: I) -> Vec<RankedCandidate>
where
    I: IntoIterator<Item = (Category, Vec<IndexMatch>)>,
{
    let mut ranked: Vec<RankedCandidate> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for (category, matches) in per_category {
        for IndexMatch {
            candidate_id,
            text,
            score,
        } in matches
        {
            let position = *positions.entry(candidate_id.clone()).or_insert_with(|| {
                ranked.push(RankedCandidate {
                    id: candidate_id,
                    text,
                    score: 0.0,
                    category_scores: BTreeMap::new(),
                });
                ranked.len() - 1
            });
            let candidate = &mut ranked[position];
            candidate.score += score;
            *candidate.category_scores.entry(category).or_insert(0.0) += score;
        }
    }

    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked
}
