//! Context assembly pipeline: the single entry point callers use.
//!
//! For each request:
//!
//! 1. Validate the caller's arguments (the only failure surface)
//! 2. Detect the condition from the query text and specialty hint
//! 3. Select up to `num_examples` worked examples for that condition
//! 4. Look up guideline text (static, or retrieval with static fallback)
//!    and truncate it to `guideline_char_budget` characters
//! 5. Concatenate: examples section, then guidelines section
//!
//! Empty sections are omitted entirely, header included.
//!
//! # Determinism
//!
//! With the ordered selection policy and static lookup, identical inputs
//! always produce byte-identical blocks. The assembler holds no per-call
//! state and is safe to share across tasks.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use vecta_core::{AnalysisType, ArgumentError, ConditionTag};
use vecta_knowledge::{ExampleStore, GuidelineStore};

use crate::budget::{char_len, estimate_tokens, truncate_chars};
use crate::detector::{ConditionDetector, DetectionSource};
use crate::format::{format_examples, section};
use crate::lookup::{GuidelineLookup, GuidelineSource, StaticLookup};

// ── Types ─────────────────────────────────────────────────────────────────

/// Per-request knobs, with their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblyOptions {
    pub num_examples: usize,
    pub include_guidelines: bool,
    pub guideline_char_budget: usize,
    pub use_retrieval: bool,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            num_examples: 2,
            include_guidelines: true,
            guideline_char_budget: 1200,
            use_retrieval: false,
        }
    }
}

/// Raw caller input. Unset fields take the assembler's defaults.
///
/// Counts are signed so that a negative value from the calling layer is
/// reported as an [`ArgumentError`] instead of being silently clamped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextRequest {
    pub query_text: String,
    #[serde(default)]
    pub specialty_hint: Option<String>,
    #[serde(default)]
    pub analysis_type: Option<String>,
    #[serde(default)]
    pub num_examples: Option<i64>,
    #[serde(default)]
    pub include_guidelines: Option<bool>,
    #[serde(default)]
    pub guideline_char_budget: Option<i64>,
    #[serde(default)]
    pub use_retrieval: Option<bool>,
}

impl ContextRequest {
    pub fn new(query_text: impl Into<String>) -> Self {
        Self {
            query_text: query_text.into(),
            ..Default::default()
        }
    }

    pub fn with_specialty(mut self, hint: impl Into<String>) -> Self {
        self.specialty_hint = Some(hint.into());
        self
    }

    pub fn with_analysis_type(mut self, analysis_type: impl Into<String>) -> Self {
        self.analysis_type = Some(analysis_type.into());
        self
    }

    pub fn with_num_examples(mut self, n: i64) -> Self {
        self.num_examples = Some(n);
        self
    }

    pub fn with_guidelines(mut self, include: bool) -> Self {
        self.include_guidelines = Some(include);
        self
    }

    pub fn with_guideline_budget(mut self, chars: i64) -> Self {
        self.guideline_char_budget = Some(chars);
        self
    }

    pub fn with_retrieval(mut self, enabled: bool) -> Self {
        self.use_retrieval = Some(enabled);
        self
    }
}

/// A request after argument validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub query_text: String,
    pub specialty_hint: Option<String>,
    pub analysis_type: AnalysisType,
    pub options: AssemblyOptions,
}

impl ContextRequest {
    /// Check the caller contract and fill in defaults.
    pub fn validate(
        &self,
        defaults: &AssemblyOptions,
        default_analysis: AnalysisType,
    ) -> Result<ValidatedRequest, ArgumentError> {
        let query_text = self.query_text.trim();
        if query_text.is_empty() {
            return Err(ArgumentError::EmptyQuery);
        }

        let analysis_type = match self.analysis_type.as_deref().map(str::trim) {
            None | Some("") => default_analysis,
            Some(s) => s.parse()?,
        };

        let num_examples = match self.num_examples {
            None => defaults.num_examples,
            Some(n) if n < 0 => return Err(ArgumentError::NegativeExampleCount(n)),
            Some(n) => n as usize,
        };

        let guideline_char_budget = match self.guideline_char_budget {
            None => defaults.guideline_char_budget,
            Some(n) if n < 0 => return Err(ArgumentError::NegativeBudget(n)),
            Some(n) => n as usize,
        };

        let specialty_hint = self
            .specialty_hint
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(ValidatedRequest {
            query_text: query_text.to_string(),
            specialty_hint,
            analysis_type,
            options: AssemblyOptions {
                num_examples,
                include_guidelines: self.include_guidelines.unwrap_or(defaults.include_guidelines),
                guideline_char_budget,
                use_retrieval: self.use_retrieval.unwrap_or(defaults.use_retrieval),
            },
        })
    }
}

/// The assembled context for one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextBlock {
    /// Examples section, then guidelines section, separated by a blank line.
    pub text: String,
    /// Detected condition, for caller logging.
    pub condition: ConditionTag,
    pub metadata: ContextMetadata,
}

impl ContextBlock {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// What went into a [`ContextBlock`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextMetadata {
    pub analysis_type: AnalysisType,
    pub detected_by: DetectionSource,
    pub example_ids: Vec<String>,
    pub guideline_source: Option<GuidelineSource>,
    pub guideline_truncated: bool,
    pub sections: Vec<SectionStats>,
    pub total_chars: usize,
    pub estimated_tokens: usize,
}

/// Statistics for a single section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionStats {
    pub name: String,
    pub chars: usize,
    pub items_included: usize,
    pub items_total: usize,
}

// ── Assembler ─────────────────────────────────────────────────────────────

/// The context assembler. Stateless per call; build once and share.
pub struct ContextAssembler {
    detector: Arc<ConditionDetector>,
    examples: Arc<ExampleStore>,
    static_lookup: StaticLookup,
    retrieval: Option<Arc<dyn GuidelineLookup>>,
    defaults: AssemblyOptions,
    default_analysis: AnalysisType,
}

impl ContextAssembler {
    pub fn new(examples: Arc<ExampleStore>, guidelines: Arc<GuidelineStore>) -> Self {
        Self {
            detector: Arc::new(ConditionDetector::new()),
            examples,
            static_lookup: StaticLookup::new(guidelines),
            retrieval: None,
            defaults: AssemblyOptions::default(),
            default_analysis: AnalysisType::default(),
        }
    }

    /// Enable retrieval-backed guideline lookup for requests that ask for it.
    pub fn with_retrieval(mut self, lookup: Arc<dyn GuidelineLookup>) -> Self {
        self.retrieval = Some(lookup);
        self
    }

    pub fn with_defaults(mut self, defaults: AssemblyOptions) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_default_analysis_type(mut self, analysis_type: AnalysisType) -> Self {
        self.default_analysis = analysis_type;
        self
    }

    pub fn with_detector(mut self, detector: Arc<ConditionDetector>) -> Self {
        self.detector = detector;
        self
    }

    pub fn defaults(&self) -> &AssemblyOptions {
        &self.defaults
    }

    pub fn has_retrieval(&self) -> bool {
        self.retrieval.is_some()
    }

    /// Assemble one context block.
    ///
    /// Only caller contract violations fail. Unknown conditions, empty
    /// stores and retrieval problems shrink the block instead.
    pub async fn assemble(&self, request: &ContextRequest) -> Result<ContextBlock, ArgumentError> {
        let req = request.validate(&self.defaults, self.default_analysis)?;
        let opts = &req.options;

        // ── Condition ──────────────────────────────────────────────────────
        let detection = self
            .detector
            .explain(&req.query_text, req.specialty_hint.as_deref());
        let condition = detection.condition;

        let mut sections: Vec<String> = Vec::new();
        let mut stats: Vec<SectionStats> = Vec::new();

        // ── Examples ───────────────────────────────────────────────────────
        let selected = self
            .examples
            .get_examples(condition, Some(req.analysis_type), opts.num_examples);
        let available = self
            .examples
            .get_examples(condition, Some(req.analysis_type), usize::MAX)
            .len();
        let examples_text = format_examples(&selected);
        stats.push(SectionStats {
            name: "examples".into(),
            chars: char_len(&examples_text),
            items_included: selected.len(),
            items_total: available,
        });
        if !examples_text.is_empty() {
            sections.push(examples_text);
        }

        // ── Guidelines ─────────────────────────────────────────────────────
        let mut guideline_source = None;
        let mut guideline_truncated = false;
        if opts.include_guidelines {
            let lookup: &dyn GuidelineLookup = match (&self.retrieval, opts.use_retrieval) {
                (Some(retrieval), true) => retrieval.as_ref(),
                (None, true) => {
                    debug!("Retrieval requested but not configured; using static guidelines");
                    &self.static_lookup
                }
                _ => &self.static_lookup,
            };

            let guidelines = lookup.lookup(&req.query_text, condition).await;
            let body = truncate_chars(&guidelines.body, opts.guideline_char_budget);
            guideline_truncated = body != guidelines.body;

            let guidelines_text = section(guidelines.header, &body);
            stats.push(SectionStats {
                name: "guidelines".into(),
                chars: char_len(&guidelines_text),
                items_included: if guidelines_text.is_empty() { 0 } else { guidelines.snippets },
                items_total: guidelines.snippets,
            });
            if !guidelines_text.is_empty() {
                guideline_source = Some(guidelines.source);
                sections.push(guidelines_text);
            }
        }

        let text = sections.join("\n\n");
        debug!(
            %condition,
            examples = selected.len(),
            chars = text.len(),
            "Context assembled"
        );

        Ok(ContextBlock {
            condition,
            metadata: ContextMetadata {
                analysis_type: req.analysis_type,
                detected_by: detection.source,
                example_ids: selected.iter().map(|e| e.id.clone()).collect(),
                guideline_source,
                guideline_truncated,
                sections: stats,
                total_chars: char_len(&text),
                estimated_tokens: estimate_tokens(&text),
            },
            text,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use vecta_core::{Example, ExpectedOutput, Finding, GuidelineSnippet, Provenance};
    use vecta_knowledge::{HashingEmbedder, RetrievalIndex};

    use crate::lookup::RetrievalLookup;

    // ── Helpers ────────────────────────────────────────────────────────

    fn example(id: &str, condition: ConditionTag, at: AnalysisType, input: &str) -> Example {
        Example {
            id: id.into(),
            condition,
            analysis_type: at,
            input_text: input.into(),
            expected_output: ExpectedOutput {
                finding: Finding::for_analysis(at, format!("finding for {id}")),
                clinical_confidence: Some("High".into()),
                evidence: Some(format!("evidence for {id}")),
                medication_analysis: None,
            },
            provenance: Provenance::default(),
        }
    }

    fn guideline(condition: ConditionTag, topic: &str, content: &str) -> GuidelineSnippet {
        GuidelineSnippet {
            condition,
            topic: topic.into(),
            source: "Test Guideline".into(),
            url: None,
            content: content.into(),
        }
    }

    fn assembler() -> ContextAssembler {
        let examples = ExampleStore::from_examples([
            example(
                "ep1",
                ConditionTag::Epilepsy,
                AnalysisType::Classification,
                "3Hz spike-wave, brief staring spells",
            ),
            example(
                "ep2",
                ConditionTag::Epilepsy,
                AnalysisType::Summary,
                "Breakthrough focal seizures on lamotrigine",
            ),
            example(
                "pd1",
                ConditionTag::Parkinsons,
                AnalysisType::Classification,
                "Asymmetric resting tremor",
            ),
        ]);
        let guidelines = GuidelineStore::from_snippets([guideline(
            ConditionTag::Epilepsy,
            "absence_seizures",
            "Ethosuximide is first line for childhood absence epilepsy.",
        )]);
        ContextAssembler::new(Arc::new(examples), Arc::new(guidelines))
    }

    // ── Tests ──────────────────────────────────────────────────────────

    #[tokio::test]
    async fn examples_precede_guidelines() {
        let request = ContextRequest::new("seizure with 3Hz spike wave")
            .with_analysis_type("classification")
            .with_num_examples(1)
            .with_guidelines(true);
        let block = assembler().assemble(&request).await.unwrap();

        assert_eq!(block.condition, ConditionTag::Epilepsy);
        let ex = block.text.find("3Hz spike-wave, brief staring spells").unwrap();
        let gl = block.text.find("Ethosuximide is first line").unwrap();
        assert!(ex < gl);
        assert!(block.text.starts_with("EXAMPLE ANALYSES:"));
        assert!(block.text.contains("\n\nCLINICAL GUIDELINES:\nAbsence Seizures (Test Guideline):"));
        assert_eq!(block.metadata.example_ids, vec!["ep1"]);
        assert_eq!(block.metadata.guideline_source, Some(GuidelineSource::Static));
    }

    #[tokio::test]
    async fn missing_guidelines_omit_header() {
        let request = ContextRequest::new("resting tremor and bradykinesia");
        let block = assembler().assemble(&request).await.unwrap();

        assert_eq!(block.condition, ConditionTag::Parkinsons);
        assert!(block.text.contains("Asymmetric resting tremor"));
        assert!(!block.text.contains("CLINICAL GUIDELINES"));
        assert_eq!(block.metadata.guideline_source, None);
    }

    #[tokio::test]
    async fn unknown_condition_gives_empty_block() {
        let block = assembler()
            .assemble(&ContextRequest::new("routine follow-up, no complaints"))
            .await
            .unwrap();
        assert_eq!(block.condition, ConditionTag::Unknown);
        assert!(block.is_empty());
        assert_eq!(block.metadata.estimated_tokens, 0);
    }

    #[tokio::test]
    async fn assembly_is_idempotent() {
        let asm = assembler();
        let request = ContextRequest::new("absence seizures in a child").with_num_examples(2);
        let a = asm.assemble(&request).await.unwrap();
        let b = asm.assemble(&request).await.unwrap();
        assert_eq!(a.text, b.text);
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn analysis_type_prefers_typed_examples() {
        let request = ContextRequest::new("seizure summary")
            .with_analysis_type("summary")
            .with_num_examples(2);
        let block = assembler().assemble(&request).await.unwrap();
        assert_eq!(block.metadata.example_ids, vec!["ep2"]);
        assert!(block.text.contains("- Clinical Summary: finding for ep2"));
    }

    #[tokio::test]
    async fn guideline_text_respects_budget() {
        for budget in [0, 5, 12, 25, 40, 1000] {
            let request = ContextRequest::new("seizure")
                .with_num_examples(0)
                .with_guideline_budget(budget);
            let block = assembler().assemble(&request).await.unwrap();
            let body = block
                .text
                .strip_prefix("CLINICAL GUIDELINES:\n")
                .unwrap_or(&block.text);
            assert!(char_len(body) <= budget as usize, "budget {budget}: {body:?}");
        }
    }

    #[tokio::test]
    async fn truncation_is_reported() {
        let request = ContextRequest::new("seizure").with_guideline_budget(20);
        let block = assembler().assemble(&request).await.unwrap();
        assert!(block.metadata.guideline_truncated);
        assert!(block.text.ends_with(" [...]"));
    }

    #[tokio::test]
    async fn zero_examples_and_no_guidelines() {
        let request = ContextRequest::new("seizure")
            .with_num_examples(0)
            .with_guidelines(false);
        let block = assembler().assemble(&request).await.unwrap();
        assert!(block.is_empty());
        assert_eq!(block.condition, ConditionTag::Epilepsy);
    }

    #[tokio::test]
    async fn specialty_hint_steers_detection() {
        let request = ContextRequest::new("follow-up visit").with_specialty("neurology");
        let block = assembler().assemble(&request).await.unwrap();
        assert_eq!(block.condition, ConditionTag::Epilepsy);
        assert!(matches!(block.metadata.detected_by, DetectionSource::Specialty { .. }));
    }

    #[tokio::test]
    async fn invalid_arguments_are_rejected() {
        let asm = assembler();

        let err = asm.assemble(&ContextRequest::new("   ")).await.unwrap_err();
        assert_eq!(err, ArgumentError::EmptyQuery);

        let err = asm
            .assemble(&ContextRequest::new("seizure").with_num_examples(-1))
            .await
            .unwrap_err();
        assert_eq!(err, ArgumentError::NegativeExampleCount(-1));

        let err = asm
            .assemble(&ContextRequest::new("seizure").with_guideline_budget(-10))
            .await
            .unwrap_err();
        assert_eq!(err, ArgumentError::NegativeBudget(-10));

        let err = asm
            .assemble(&ContextRequest::new("seizure").with_analysis_type("custom"))
            .await
            .unwrap_err();
        assert!(matches!(err, ArgumentError::UnknownAnalysisType(_)));
    }

    #[tokio::test]
    async fn request_deserializes_from_json() {
        let request: ContextRequest = serde_json::from_str(
            r#"{"query_text": "seizure", "num_examples": 1, "analysis_type": "classification"}"#,
        )
        .unwrap();
        let block = assembler().assemble(&request).await.unwrap();
        assert_eq!(block.metadata.example_ids, vec!["ep1"]);
    }

    #[tokio::test]
    async fn retrieval_requested_without_index_uses_static() {
        let request = ContextRequest::new("seizure").with_retrieval(true);
        let block = assembler().assemble(&request).await.unwrap();
        assert_eq!(block.metadata.guideline_source, Some(GuidelineSource::Static));
    }

    #[tokio::test]
    async fn retrieval_path_uses_index_when_ready() {
        let guidelines = Arc::new(GuidelineStore::from_snippets([
            guideline(
                ConditionTag::Epilepsy,
                "absence_seizures",
                "Ethosuximide is first line for childhood absence epilepsy.",
            ),
            guideline(
                ConditionTag::Epilepsy,
                "status_epilepticus",
                "Benzodiazepine first, then a second-line agent.",
            ),
        ]));
        let index = Arc::new(RetrievalIndex::new(Arc::new(HashingEmbedder::default())));
        index.initialize(&guidelines).await.unwrap();
        let lookup = RetrievalLookup::new(index, StaticLookup::new(guidelines.clone())).with_top_k(1);

        let asm = ContextAssembler::new(Arc::new(ExampleStore::default()), guidelines)
            .with_retrieval(Arc::new(lookup));
        let request = ContextRequest::new("status epilepticus benzodiazepine").with_retrieval(true);
        let block = asm.assemble(&request).await.unwrap();

        assert_eq!(block.metadata.guideline_source, Some(GuidelineSource::Retrieval));
        assert!(block.text.starts_with("RELEVANT CLINICAL GUIDELINES:\n1. STATUS EPILEPTICUS:"));
        assert!(!block.text.contains("Ethosuximide"));
    }

    #[tokio::test]
    async fn retrieval_failure_falls_back_silently() {
        let guidelines = Arc::new(GuidelineStore::from_snippets([guideline(
            ConditionTag::Epilepsy,
            "absence_seizures",
            "Ethosuximide is first line.",
        )]));
        let index = Arc::new(RetrievalIndex::unavailable("embedding service down"));
        let lookup = RetrievalLookup::new(index, StaticLookup::new(guidelines.clone()));
        let asm = ContextAssembler::new(Arc::new(ExampleStore::default()), guidelines)
            .with_retrieval(Arc::new(lookup))
            .with_defaults(AssemblyOptions {
                use_retrieval: true,
                ..Default::default()
            });

        let block = asm.assemble(&ContextRequest::new("seizure")).await.unwrap();
        assert_eq!(block.metadata.guideline_source, Some(GuidelineSource::StaticFallback));
        assert!(block.text.contains("Ethosuximide"));
    }

    #[tokio::test]
    async fn section_stats_track_counts() {
        let request = ContextRequest::new("seizure").with_num_examples(1);
        let block = assembler().assemble(&request).await.unwrap();
        let examples = &block.metadata.sections[0];
        assert_eq!(examples.name, "examples");
        assert_eq!(examples.items_included, 1);
        assert_eq!(examples.items_total, 1);
        let guidelines = &block.metadata.sections[1];
        assert_eq!(guidelines.name, "guidelines");
        assert_eq!(guidelines.items_included, 1);
    }
}
