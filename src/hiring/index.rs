//! Vector index seam for resume entries and its Qdrant-backed implementation.

use crate::hiring::categories::Category;
use crate::qdrant::{
    PointInsert, QdrantError, QdrantService, ScoredPoint, SearchFilterArgs, build_search_filter,
};
use async_trait::async_trait;
use serde_json::{Map, Value};

/// What an index entry represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// One category facet of a candidate.
    Category,
    /// The candidate's whole resume text.
    Resume,
}

impl EntryKind {
    /// Payload value stored under `kind`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Resume => "resume",
        }
    }
}

/// Entry written to the index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    /// Candidate the entry belongs to.
    pub candidate_id: String,
    /// Entry flavour.
    pub kind: EntryKind,
    /// Category facet, for [`EntryKind::Category`] entries.
    pub category: Option<Category>,
    /// Full resume text, returned with matches.
    pub text: String,
    /// Text that was embedded (joined category values or the resume itself).
    pub content: String,
    /// Embedding vector.
    pub vector: Vec<f32>,
}

impl IndexEntry {
    /// Logical key: one entry per `(candidate, category)` or per candidate resume.
    pub fn key(&self) -> String {
        match self.category {
            Some(category) => format!("{}/{}", self.candidate_id, category),
            None => format!("{}/{}", self.candidate_id, self.kind.as_str()),
        }
    }

    fn into_point(self) -> PointInsert {
        let key = self.key();
        let mut payload = Map::new();
        payload.insert("candidate_id".into(), Value::String(self.candidate_id));
        payload.insert("kind".into(), Value::String(self.kind.as_str().into()));
        if let Some(category) = self.category {
            payload.insert("category".into(), Value::String(category.as_str().into()));
        }
        payload.insert("text".into(), Value::String(self.text));
        payload.insert("content".into(), Value::String(self.content));
        PointInsert {
            key,
            vector: self.vector,
            payload,
        }
    }
}

/// Restriction applied to a similarity search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexFilter {
    /// Only entries of this kind.
    pub kind: EntryKind,
    /// Only entries of this category.
    pub category: Option<Category>,
}

impl IndexFilter {
    /// Category entries of one facet.
    pub fn category(category: Category) -> Self {
        Self {
            kind: EntryKind::Category,
            category: Some(category),
        }
    }

    /// Whole-resume entries.
    pub fn resumes() -> Self {
        Self {
            kind: EntryKind::Resume,
            category: None,
        }
    }
}

/// Similarity match returned by the index, in index ranking order.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexMatch {
    /// Candidate the matching entry belongs to.
    pub candidate_id: String,
    /// Resume text stored with the entry.
    pub text: String,
    /// Similarity score (cosine, higher is closer).
    pub score: f32,
}

/// Approximate nearest-neighbour store over resume entries.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or overwrite entries; returns how many were written.
    async fn upsert(&self, entries: Vec<IndexEntry>) -> Result<usize, QdrantError>;

    /// Return up to `top_k` matches for `vector` among entries passing `filter`.
    async fn query(
        &self,
        vector: Vec<f32>,
        top_k: usize,
        filter: IndexFilter,
    ) -> Result<Vec<IndexMatch>, QdrantError>;
}

/// [`VectorIndex`] stored in one Qdrant collection.
pub struct QdrantIndex {
    service: QdrantService,
    collection: String,
}

impl QdrantIndex {
    /// Bind a Qdrant client to a collection.
    pub fn new(service: QdrantService, collection: impl Into<String>) -> Self {
        Self {
            service,
            collection: collection.into(),
        }
    }

    /// Create the collection and keyword indexes when missing.
    pub async fn ensure_ready(&self, vector_size: u64) -> Result<(), QdrantError> {
        tracing::debug!(collection = %self.collection, vector_size, "Ensuring resume collection");
        self.service
            .create_collection_if_not_exists(&self.collection, vector_size)
            .await?;
        self.service.ensure_payload_indexes(&self.collection).await
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn upsert(&self, entries: Vec<IndexEntry>) -> Result<usize, QdrantError> {
        let points = entries.into_iter().map(IndexEntry::into_point).collect();
        self.service.upsert_points(&self.collection, points).await
    }

    async fn query(
        &self,
        vector: Vec<f32>,
        top_k: usize,
        filter: IndexFilter,
    ) -> Result<Vec<IndexMatch>, QdrantError> {
        let filter = build_search_filter(&SearchFilterArgs {
            kind: Some(filter.kind.as_str().to_string()),
            category: filter.category.map(|category| category.as_str().to_string()),
            candidate_id: None,
        });
        let points = self
            .service
            .search_points(&self.collection, vector, filter, top_k, None)
            .await?;
        Ok(points.into_iter().filter_map(map_scored_point).collect())
    }
}

fn map_scored_point(point: ScoredPoint) -> Option<IndexMatch> {
    let ScoredPoint { id, score, payload } = point;
    let payload = payload.unwrap_or_default();
    let candidate_id = match payload.get("candidate_id") {
        Some(Value::String(value)) if !value.trim().is_empty() => value.trim().to_string(),
        Some(Value::Number(number)) => number.to_string(),
        _ => {
            tracing::warn!(point_id = %id, "Skipping match without candidate_id");
            return None;
        }
    };
    let text = payload
        .get("text")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Some(IndexMatch {
        candidate_id,
        text,
        score,
    })
}
