//! Qdrant vector store integration.

pub mod client;
pub mod filters;
pub mod payload;
pub mod types;

pub use client::QdrantService;
pub use filters::build_search_filter;
pub use payload::{compute_text_hash, point_id_for_key};
pub use types::{PointInsert, QdrantError, ScoredPoint, SearchFilterArgs};
