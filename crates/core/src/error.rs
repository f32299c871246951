//! Error types for the Vecta domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant. Only [`LoadError`] and
//! [`ArgumentError`] ever reach a caller of the context pipeline; retrieval
//! and embedding failures are absorbed by falling back to static lookup.

use std::path::PathBuf;
use thiserror::Error;

/// The top-level error type for all Vecta operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Data loading (fatal at startup) ---
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    // --- Caller contract violations ---
    #[error("Invalid argument: {0}")]
    InvalidArgument(#[from] ArgumentError),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// A backing data file could not be turned into a store.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Data file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to read {}: {reason}", path.display())]
    Read { path: PathBuf, reason: String },

    #[error("Malformed data file {}: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },

    /// Raised only under the strict load policy.
    #[error("Invalid entry '{entry}' in {}: {reason}", path.display())]
    InvalidEntry {
        path: PathBuf,
        entry: String,
        reason: String,
    },
}

/// The calling layer passed something the pipeline cannot accept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    #[error("query_text must not be empty")]
    EmptyQuery,

    #[error("num_examples must be >= 0, got {0}")]
    NegativeExampleCount(i64),

    #[error("guideline_char_budget must be >= 0, got {0}")]
    NegativeBudget(i64),

    #[error("unrecognized analysis_type '{0}' (expected classification, diagnosis, extraction or summary)")]
    UnknownAnalysisType(String),
}

#[derive(Debug, Clone, Error)]
pub enum EmbeddingError {
    #[error("Embedding request failed: {0}")]
    Request(String),

    #[error("Invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Clone, Error)]
pub enum RetrievalError {
    #[error("Retrieval index unavailable: {0}")]
    Unavailable(String),

    #[error("Retrieval index has not been initialized")]
    NotReady,

    #[error("Query embedding failed: {0}")]
    QueryEmbedding(#[from] EmbeddingError),
}
