use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing relay activity since startup.
#[derive(Default)]
pub struct RelayMetrics {
    candidates_ingested: AtomicU64,
    entries_written: AtomicU64,
    queries_served: AtomicU64,
    questions_answered: AtomicU64,
    files_ingested: AtomicU64,
}

impl RelayMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an ingested candidate and the index entries written for it.
    pub fn record_candidate(&self, entries: u64) {
        self.candidates_ingested.fetch_add(1, Ordering::Relaxed);
        self.entries_written.fetch_add(entries, Ordering::Relaxed);
    }

    /// Record a completed resume search.
    pub fn record_query(&self) {
        self.queries_served.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an answered assistant question.
    pub fn record_answer(&self) {
        self.questions_answered.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a file that finished vector-store ingestion.
    pub fn record_file(&self) {
        self.files_ingested.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            candidates_ingested: self.candidates_ingested.load(Ordering::Relaxed),
            entries_written: self.entries_written.load(Ordering::Relaxed),
            queries_served: self.queries_served.load(Ordering::Relaxed),
            questions_answered: self.questions_answered.load(Ordering::Relaxed),
            files_ingested: self.files_ingested.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of relay counters used for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Candidates ingested into the vector index.
    pub candidates_ingested: u64,
    /// Index entries written across both search strategies.
    pub entries_written: u64,
    /// Resume searches answered, including `notfound` outcomes.
    pub queries_served: u64,
    /// Assistant questions answered.
    pub questions_answered: u64,
    /// Files attached to the assistant's vector store.
    pub files_ingested: u64,
}
