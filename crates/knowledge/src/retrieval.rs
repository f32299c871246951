//! Retrieval index: similarity-ranked lookup over guideline snippets.
//!
//! Brute-force cosine scan over an in-memory embedding table. The table is
//! built exactly once behind a [`OnceCell`] and is read-only afterwards.
//! When the embedder is missing or fails, the index reports
//! [`IndexStatus::Unavailable`] and callers fall back to static lookup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use vecta_core::{ConditionTag, Embedder, EmbeddingError, GuidelineSnippet, RetrievalError};

use crate::guidelines::{GuidelineStore, format_snippet};
use crate::vector::rank_by_similarity;

/// Lifecycle of the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexStatus {
    Uninitialized,
    Ready,
    Unavailable,
}

impl std::fmt::Display for IndexStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Uninitialized => "uninitialized",
            Self::Ready => "ready",
            Self::Unavailable => "unavailable",
        };
        f.write_str(s)
    }
}

/// A snippet returned by [`RetrievalIndex::retrieve`] with its similarity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedSnippet {
    pub snippet: GuidelineSnippet,
    pub score: f32,
}

/// Diagnostic view of the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    pub status: IndexStatus,
    pub available: bool,
    pub chunks: usize,
    pub model_id: Option<String>,
    pub dimension: Option<usize>,
    pub persist_path: Option<PathBuf>,
    pub unavailable_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexedChunk {
    snippet: GuidelineSnippet,
    embedding: Vec<f32>,
}

/// On-disk form of the embedding table.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedIndex {
    fingerprint: String,
    model_id: String,
    dimension: usize,
    built_at: DateTime<Utc>,
    chunks: Vec<IndexedChunk>,
}

pub struct RetrievalIndex {
    embedder: Option<Arc<dyn Embedder>>,
    persist_path: Option<PathBuf>,
    min_score: f32,
    table: OnceCell<Vec<IndexedChunk>>,
    failure: OnceLock<String>,
}

impl RetrievalIndex {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder: Some(embedder),
            persist_path: None,
            min_score: -1.0,
            table: OnceCell::new(),
            failure: OnceLock::new(),
        }
    }

    /// An index that is unavailable from the start (no embedder configured).
    pub fn unavailable(reason: impl Into<String>) -> Self {
        let failure = OnceLock::new();
        let _ = failure.set(reason.into());
        Self {
            embedder: None,
            persist_path: None,
            min_score: -1.0,
            table: OnceCell::new(),
            failure,
        }
    }

    /// Persist the embedding table to `path` and reuse it across restarts.
    pub fn with_persist_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.persist_path = Some(path.into());
        self
    }

    /// Drop results scoring below `min_score`.
    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    pub fn status(&self) -> IndexStatus {
        if self.failure.get().is_some() {
            IndexStatus::Unavailable
        } else if self.table.initialized() {
            IndexStatus::Ready
        } else {
            IndexStatus::Uninitialized
        }
    }

    /// False once the embedder is known to be missing or broken.
    pub fn is_available(&self) -> bool {
        self.status() != IndexStatus::Unavailable
    }

    pub fn is_ready(&self) -> bool {
        self.status() == IndexStatus::Ready
    }

    pub fn stats(&self) -> IndexStats {
        let status = self.status();
        IndexStats {
            status,
            available: status != IndexStatus::Unavailable,
            chunks: self.table.get().map_or(0, Vec::len),
            model_id: self.embedder.as_ref().map(|e| e.model_id().to_string()),
            dimension: self.embedder.as_ref().map(|e| e.dimension()),
            persist_path: self.persist_path.clone(),
            unavailable_reason: self.failure.get().cloned(),
        }
    }

    /// Index every snippet of a loaded guideline store.
    pub async fn initialize(&self, store: &GuidelineStore) -> Result<(), RetrievalError> {
        let snippets: Vec<GuidelineSnippet> = store.all_snippets().into_iter().cloned().collect();
        self.index(snippets).await
    }

    /// Embed `snippets` and build the table. Runs at most once; later calls
    /// return immediately. A failure marks the index unavailable.
    pub async fn index(&self, snippets: Vec<GuidelineSnippet>) -> Result<(), RetrievalError> {
        if let Some(reason) = self.failure.get() {
            return Err(RetrievalError::Unavailable(reason.clone()));
        }
        let Some(embedder) = self.embedder.as_ref() else {
            return Err(RetrievalError::Unavailable("no embedder configured".into()));
        };

        let result = self
            .table
            .get_or_try_init(|| self.build(embedder.as_ref(), snippets))
            .await;

        match result {
            Ok(table) => {
                info!(
                    model = %embedder.model_id(),
                    chunks = table.len(),
                    "Retrieval index ready"
                );
                Ok(())
            }
            Err(e) => {
                let reason = e.to_string();
                warn!(error = %reason, "Retrieval index unavailable; static guideline lookup will be used");
                let _ = self.failure.set(reason.clone());
                Err(RetrievalError::Unavailable(reason))
            }
        }
    }

    async fn build(
        &self,
        embedder: &dyn Embedder,
        snippets: Vec<GuidelineSnippet>,
    ) -> Result<Vec<IndexedChunk>, EmbeddingError> {
        let fingerprint = fingerprint(embedder, &snippets);

        if let Some(path) = &self.persist_path {
            if let Some(chunks) = load_persisted(path, &fingerprint) {
                info!(path = %path.display(), chunks = chunks.len(), "Loaded persisted retrieval index");
                return Ok(chunks);
            }
        }

        let texts: Vec<String> = snippets.iter().map(format_snippet).collect();
        debug!(chunks = texts.len(), model = %embedder.model_id(), "Embedding guideline snippets");
        let embeddings = embedder.embed_batch(&texts).await?;

        let dimension = embedder.dimension();
        if let Some(bad) = embeddings.iter().find(|e| e.len() != dimension) {
            return Err(EmbeddingError::DimensionMismatch {
                expected: dimension,
                actual: bad.len(),
            });
        }

        let chunks: Vec<IndexedChunk> = snippets
            .into_iter()
            .zip(embeddings)
            .map(|(snippet, embedding)| IndexedChunk { snippet, embedding })
            .collect();

        if let Some(path) = &self.persist_path {
            let persisted = PersistedIndex {
                fingerprint,
                model_id: embedder.model_id().to_string(),
                dimension,
                built_at: Utc::now(),
                chunks,
            };
            if let Err(e) = save_persisted(path, &persisted) {
                warn!(path = %path.display(), error = %e, "Failed to persist retrieval index");
            }
            return Ok(persisted.chunks);
        }

        Ok(chunks)
    }

    /// Top-`k` snippets by descending cosine similarity to `query`.
    ///
    /// `condition_filter` restricts candidates to one condition; `None` or
    /// [`ConditionTag::Unknown`] searches everything.
    pub async fn retrieve(
        &self,
        query: &str,
        k: usize,
        condition_filter: Option<ConditionTag>,
    ) -> Result<Vec<RetrievedSnippet>, RetrievalError> {
        if let Some(reason) = self.failure.get() {
            return Err(RetrievalError::Unavailable(reason.clone()));
        }
        let (Some(embedder), Some(table)) = (self.embedder.as_ref(), self.table.get()) else {
            return Err(RetrievalError::NotReady);
        };
        if k == 0 {
            return Ok(vec![]);
        }

        let query_embedding = embedder.embed(query).await?;
        let filter = condition_filter.filter(|c| c.is_known());

        let candidates = table
            .iter()
            .enumerate()
            .filter(|(_, chunk)| filter.is_none_or(|c| chunk.snippet.condition == c))
            .map(|(i, chunk)| (i, chunk.embedding.as_slice()));

        let ranked = rank_by_similarity(candidates, &query_embedding, k, self.min_score);
        debug!(results = ranked.len(), filter = ?filter, "Retrieved guideline snippets");

        Ok(ranked
            .into_iter()
            .map(|(i, score)| RetrievedSnippet {
                snippet: table[i].snippet.clone(),
                score,
            })
            .collect())
    }
}

/// SHA-256 over model id, dimension and snippet content.
fn fingerprint(embedder: &dyn Embedder, snippets: &[GuidelineSnippet]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(embedder.model_id().as_bytes());
    hasher.update(embedder.dimension().to_le_bytes());
    for s in snippets {
        for part in [s.condition.as_str(), s.topic.as_str(), s.source.as_str(), s.content.as_str()] {
            hasher.update(part.as_bytes());
            hasher.update([0u8]);
        }
    }
    format!("{:x}", hasher.finalize())
}

fn load_persisted(path: &Path, fingerprint: &str) -> Option<Vec<IndexedChunk>> {
    let content = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str::<PersistedIndex>(&content) {
        Ok(persisted) if persisted.fingerprint == fingerprint => Some(persisted.chunks),
        Ok(_) => {
            debug!(path = %path.display(), "Persisted retrieval index is stale; rebuilding");
            None
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring unreadable retrieval index file");
            None
        }
    }
}

fn save_persisted(path: &Path, persisted: &PersistedIndex) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string(persisted)?;
    std::fs::write(path, content)
}
