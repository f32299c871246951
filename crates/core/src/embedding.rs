//! Embedder trait: the injected "text in, fixed-length vector out" collaborator.
//!
//! The retrieval index depends on nothing more specific than this. Model
//! name, dimensionality and transport are configuration of the
//! implementation, not part of the core contract.

use async_trait::async_trait;

use crate::error::EmbeddingError;

/// Produces fixed-length numeric embeddings for text.
///
/// Implementations: feature hashing (offline), Ollama HTTP.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Stable identifier of the model, used to key persisted indexes.
    fn model_id(&self) -> &str;

    /// Length of every vector this embedder returns.
    fn dimension(&self) -> usize;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Embed several texts. The default calls [`Embedder::embed`] in order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }
}
