//! In-memory collaborators shared by the hiring unit tests.

use crate::embedding::{EmbeddingClient, EmbeddingClientError};
use crate::hiring::index::{IndexEntry, IndexFilter, IndexMatch, VectorIndex};
use crate::openai::{ChatClient, ChatRequest, OpenAiError};
use crate::qdrant::QdrantError;
use async_trait::async_trait;
use std::sync::Mutex;

/// Chat double answering by prompt substring, recording every request.
#[derive(Default)]
pub(crate) struct FakeChat {
    rules: Vec<(String, String)>,
    fallback: Option<String>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl FakeChat {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn replying(reply: &str) -> Self {
        Self::default().otherwise(reply)
    }

    pub(crate) fn failing() -> Self {
        Self::default()
    }

    /// Reply with `reply` when the prompt contains `needle`; first matching rule wins.
    pub(crate) fn on(mut self, needle: &str, reply: &str) -> Self {
        self.rules.push((needle.to_string(), reply.to_string()));
        self
    }

    pub(crate) fn otherwise(mut self, reply: &str) -> Self {
        self.fallback = Some(reply.to_string());
        self
    }

    pub(crate) fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().expect("chat requests").clone()
    }

    pub(crate) fn last_request(&self) -> Option<ChatRequest> {
        self.requests().pop()
    }
}

#[async_trait]
impl ChatClient for FakeChat {
    async fn complete(&self, request: ChatRequest) -> Result<String, OpenAiError> {
        let reply = self
            .rules
            .iter()
            .find(|(needle, _)| request.prompt.contains(needle.as_str()))
            .map(|(_, reply)| reply.clone())
            .or_else(|| self.fallback.clone());
        self.requests.lock().expect("chat requests").push(request);
        reply.ok_or_else(|| OpenAiError::InvalidResponse("scripted chat failure".into()))
    }
}

/// Embedding double mapping known texts to fixed vectors; unknown texts get a zero vector.
pub(crate) struct FakeEmbeddings {
    dimension: usize,
    known: Vec<(String, Vec<f32>)>,
    fail: bool,
    calls: Mutex<Vec<Vec<String>>>,
}

impl FakeEmbeddings {
    pub(crate) fn new(dimension: usize) -> Self {
        Self {
            dimension,
            known: Vec::new(),
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(2)
        }
    }

    pub(crate) fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.known.push((text.to_string(), vector));
        self
    }

    pub(crate) fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().expect("embedding calls").clone()
    }
}

#[async_trait]
impl EmbeddingClient for FakeEmbeddings {
    async fn generate_embeddings(
        &self,
        texts: Vec<String>,
    ) -> Result<Vec<Vec<f32>>, EmbeddingClientError> {
        self.calls.lock().expect("embedding calls").push(texts.clone());
        if self.fail {
            return Err(EmbeddingClientError::GenerationFailed(
                "scripted embedding failure".into(),
            ));
        }
        Ok(texts
            .iter()
            .map(|text| {
                self.known
                    .iter()
                    .find(|(known, _)| known == text)
                    .map(|(_, vector)| vector.clone())
                    .unwrap_or_else(|| vec![0.0; self.dimension])
            })
            .collect())
    }
}

/// Index double. Scripted filters return canned matches; otherwise stored entries are ranked by
/// cosine similarity.
#[derive(Default)]
pub(crate) struct InMemoryIndex {
    scripted: Vec<(IndexFilter, Vec<IndexMatch>)>,
    entries: Mutex<Vec<IndexEntry>>,
    queries: Mutex<Vec<(IndexFilter, usize)>>,
}

impl InMemoryIndex {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn script(mut self, filter: IndexFilter, matches: Vec<(&str, f32)>) -> Self {
        let matches = matches
            .into_iter()
            .map(|(candidate_id, score)| IndexMatch {
                candidate_id: candidate_id.to_string(),
                text: format!("resume of {candidate_id}"),
                score,
            })
            .collect();
        self.scripted.push((filter, matches));
        self
    }

    pub(crate) fn entries(&self) -> Vec<IndexEntry> {
        self.entries.lock().expect("index entries").clone()
    }

    pub(crate) fn queries(&self) -> Vec<(IndexFilter, usize)> {
        self.queries.lock().expect("index queries").clone()
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn upsert(&self, entries: Vec<IndexEntry>) -> Result<usize, QdrantError> {
        let mut stored = self.entries.lock().expect("index entries");
        let written = entries.len();
        for entry in entries {
            let key = entry.key();
            match stored.iter_mut().find(|existing| existing.key() == key) {
                Some(existing) => *existing = entry,
                None => stored.push(entry),
            }
        }
        Ok(written)
    }

    async fn query(
        &self,
        vector: Vec<f32>,
        top_k: usize,
        filter: IndexFilter,
    ) -> Result<Vec<IndexMatch>, QdrantError> {
        self.queries
            .lock()
            .expect("index queries")
            .push((filter, top_k));

        if let Some((_, matches)) = self.scripted.iter().find(|(scripted, _)| *scripted == filter)
        {
            return Ok(matches.iter().take(top_k).cloned().collect());
        }

        let stored = self.entries.lock().expect("index entries");
        let mut matches: Vec<IndexMatch> = stored
            .iter()
            .filter(|entry| entry.kind == filter.kind && entry.category == filter.category)
            .map(|entry| IndexMatch {
                candidate_id: entry.candidate_id.clone(),
                text: entry.text.clone(),
                score: cosine(&vector, &entry.vector),
            })
            .collect();
        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(top_k);
        Ok(matches)
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
