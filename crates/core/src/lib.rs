//! # Vecta Core
//!
//! Domain types, traits, and error definitions for the Vecta clinical
//! prompt-context engine. This crate performs **no I/O**: it defines the
//! domain model that the store, retrieval and assembly crates implement
//! against.
//!
//! ## Design Philosophy
//!
//! Stored entities are immutable once loaded and tagged with a closed
//! [`ConditionTag`] vocabulary. The one external collaborator, the
//! embedding model, is a trait here so that:
//! - Implementations can be swapped via configuration
//! - Tests run with deterministic offline embedders
//! - All crates depend inward on core

pub mod condition;
pub mod embedding;
pub mod error;
pub mod example;
pub mod guideline;
pub mod policy;

// Re-export key types at crate root for ergonomics
pub use condition::{ConditionTag, UnknownConditionName};
pub use embedding::Embedder;
pub use error::{ArgumentError, EmbeddingError, Error, LoadError, Result, RetrievalError};
pub use example::{AnalysisType, Example, ExpectedOutput, Finding, Provenance};
pub use guideline::{GuidelineSnippet, title_case};
pub use policy::{LoadPolicy, LoadReport, RejectedEntry, SelectionPolicy};
