//! Resume search: corpus ingestion, category aggregation, plain top-K retrieval, and summaries.

pub mod aggregator;
pub mod categories;
pub mod corpus;
pub mod extraction;
pub mod index;
mod service;
pub mod summary;
#[cfg(test)]
pub(crate) mod testing;
pub mod top_k;
mod types;

pub use aggregator::{CategoryAggregator, aggregate};
pub use categories::{Category, CategoryEmbeddings, CategoryValues};
pub use corpus::CorpusError;
pub use extraction::ExtractionError;
pub use index::{EntryKind, IndexEntry, IndexFilter, IndexMatch, QdrantIndex, VectorIndex};
pub use service::{HiringApi, HiringService, SearchSettings};
pub use top_k::TopKSearch;
pub use types::{
    Candidate, HiringError, IngestOutcome, QueryOutcome, QueryRequest, QueryStrategy,
    RankedCandidate,
};
