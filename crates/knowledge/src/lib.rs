//! Knowledge stores for Vecta.
//!
//! - [`ExampleStore`]: few-shot examples grouped by condition.
//! - [`GuidelineStore`]: guideline snippets grouped by condition and topic.
//! - [`RetrievalIndex`]: optional similarity-ranked lookup over guideline
//!   snippets, backed by an injected [`vecta_core::Embedder`].
//!
//! Stores are loaded once and are read-only afterwards; share them behind
//! an `Arc` and read from any number of tasks.

mod document;
pub mod embedder;
pub mod examples;
pub mod guidelines;
pub mod retrieval;
pub mod vector;

pub use embedder::{DEFAULT_DIMENSION, HashingEmbedder, OllamaEmbedder};
pub use examples::{EXAMPLES_WRAPPER_KEY, ExampleStatistics, ExampleStore};
pub use guidelines::{GUIDELINES_WRAPPER_KEY, GuidelineStatistics, GuidelineStore, format_snippet};
pub use retrieval::{IndexStats, IndexStatus, RetrievalIndex, RetrievedSnippet};
pub use vector::{cosine_similarity, rank_by_similarity};
