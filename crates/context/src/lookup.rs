//! Guideline lookup strategies.
//!
//! Two implementations of [`GuidelineLookup`], chosen at startup:
//! [`StaticLookup`] reads the guideline store by exact condition, and
//! [`RetrievalLookup`] ranks snippets through the retrieval index, falling
//! back to static lookup whenever the index is not ready or unavailable.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};
use vecta_core::ConditionTag;
use vecta_knowledge::{GuidelineStore, RetrievalIndex};

use crate::format::{RETRIEVED_GUIDELINES_HEADER, STATIC_GUIDELINES_HEADER, format_retrieved};

/// Where the guideline text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuidelineSource {
    Static,
    Retrieval,
    /// Retrieval was requested but the index could not serve it.
    StaticFallback,
}

/// Guideline text before budget truncation.
#[derive(Debug, Clone, PartialEq)]
pub struct GuidelineText {
    pub header: &'static str,
    pub body: String,
    pub snippets: usize,
    pub source: GuidelineSource,
}

impl GuidelineText {
    pub fn is_empty(&self) -> bool {
        self.body.trim().is_empty()
    }
}

#[async_trait]
pub trait GuidelineLookup: Send + Sync {
    /// Guideline text for a query. Never fails: an unknown condition or an
    /// unavailable backend yields less text, not an error.
    async fn lookup(&self, query: &str, condition: ConditionTag) -> GuidelineText;
}

/// Exact condition match against the guideline store.
#[derive(Clone)]
pub struct StaticLookup {
    store: Arc<GuidelineStore>,
}

impl StaticLookup {
    pub fn new(store: Arc<GuidelineStore>) -> Self {
        Self { store }
    }

    fn text(&self, condition: ConditionTag, source: GuidelineSource) -> GuidelineText {
        GuidelineText {
            header: STATIC_GUIDELINES_HEADER,
            body: self.store.get_guideline(condition, None),
            snippets: self.store.snippets(condition).len(),
            source,
        }
    }
}

#[async_trait]
impl GuidelineLookup for StaticLookup {
    async fn lookup(&self, _query: &str, condition: ConditionTag) -> GuidelineText {
        self.text(condition, GuidelineSource::Static)
    }
}

/// Similarity-ranked lookup with static fallback.
pub struct RetrievalLookup {
    index: Arc<RetrievalIndex>,
    fallback: StaticLookup,
    top_k: usize,
    filter_by_condition: bool,
}

impl RetrievalLookup {
    pub fn new(index: Arc<RetrievalIndex>, fallback: StaticLookup) -> Self {
        Self {
            index,
            fallback,
            top_k: 3,
            filter_by_condition: true,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Restrict candidates to the detected condition when it is known.
    pub fn with_condition_filter(mut self, enabled: bool) -> Self {
        self.filter_by_condition = enabled;
        self
    }
}

#[async_trait]
impl GuidelineLookup for RetrievalLookup {
    async fn lookup(&self, query: &str, condition: ConditionTag) -> GuidelineText {
        let filter = (self.filter_by_condition && condition.is_known()).then_some(condition);

        match self.index.retrieve(query, self.top_k, filter).await {
            Ok(results) if !results.is_empty() => {
                debug!(results = results.len(), %condition, "Using retrieved guidelines");
                GuidelineText {
                    header: RETRIEVED_GUIDELINES_HEADER,
                    body: format_retrieved(&results),
                    snippets: results.len(),
                    source: GuidelineSource::Retrieval,
                }
            }
            Ok(_) => {
                debug!(%condition, "Retrieval returned nothing; using static guidelines");
                self.fallback.text(condition, GuidelineSource::StaticFallback)
            }
            Err(e) => {
                warn!(error = %e, %condition, "Retrieval failed; using static guidelines");
                self.fallback.text(condition, GuidelineSource::StaticFallback)
            }
        }
    }
}
