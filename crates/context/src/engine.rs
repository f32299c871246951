//! Engine bootstrap: wires config, stores, retrieval and assembly together.
//!
//! Startup order:
//! 1. Load the example and guideline stores (fatal on failure)
//! 2. Build the embedder and retrieval index when retrieval is enabled
//! 3. Index the guideline store once; failures degrade to static lookup
//! 4. Build the assembler with the configured defaults

use std::sync::Arc;
use tracing::warn;
use vecta_config::{AppConfig, EmbedderKind, RetrievalConfig};
use vecta_core::{ArgumentError, ConditionTag, Embedder, Error, RetrievalError};
use vecta_knowledge::{
    ExampleStore, GuidelineStore, HashingEmbedder, IndexStats, OllamaEmbedder, RetrievalIndex,
    RetrievedSnippet,
};

use crate::assembler::{AssemblyOptions, ContextAssembler, ContextBlock, ContextRequest};
use crate::detector::{ConditionDetector, Detection};
use crate::lookup::{RetrievalLookup, StaticLookup};
use crate::prompt::{PromptParts, build_prompt};

/// A context block together with the prompt rendered around it.
#[derive(Debug, Clone)]
pub struct RenderedPrompt {
    pub context: ContextBlock,
    pub prompt: String,
}

/// Everything a caller needs, built once from an [`AppConfig`].
pub struct ContextEngine {
    examples: Arc<ExampleStore>,
    guidelines: Arc<GuidelineStore>,
    detector: Arc<ConditionDetector>,
    index: Option<Arc<RetrievalIndex>>,
    assembler: ContextAssembler,
    top_k: usize,
    filter_by_condition: bool,
}

impl ContextEngine {
    /// Load data and bring the engine up. Only data loading is fatal.
    pub async fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let policy = config.data.load_policy;

        let examples_path = config.data.examples_path();
        let examples = ExampleStore::load(&examples_path, policy)?
            .with_selection(config.assembly.selection_policy());
        let guidelines = GuidelineStore::load(&config.data.guidelines_path(), policy)?;

        let engine = Self::from_stores(examples, guidelines, config);
        if let Some(index) = &engine.index {
            if let Err(e) = index.initialize(&engine.guidelines).await {
                warn!(error = %e, "Retrieval index unavailable; static guidelines will be used");
            }
        }
        Ok(engine)
    }

    /// Build from already-loaded stores. The retrieval index, if any, is
    /// left uninitialized.
    pub fn from_stores(examples: ExampleStore, guidelines: GuidelineStore, config: &AppConfig) -> Self {
        let examples = Arc::new(examples);
        let guidelines = Arc::new(guidelines);
        let detector = Arc::new(ConditionDetector::new());
        let retrieval = &config.retrieval;

        let index = retrieval.enabled.then(|| {
            let mut index = match build_embedder(retrieval) {
                Ok(embedder) => RetrievalIndex::new(embedder),
                Err(reason) => RetrievalIndex::unavailable(reason),
            };
            if let Some(path) = config.index_persist_path() {
                index = index.with_persist_path(path);
            }
            Arc::new(index.with_min_score(retrieval.min_score))
        });

        let defaults = AssemblyOptions {
            num_examples: config.assembly.num_examples,
            include_guidelines: config.assembly.include_guidelines,
            guideline_char_budget: config.assembly.guideline_char_budget,
            use_retrieval: retrieval.enabled,
        };

        let static_lookup = StaticLookup::new(guidelines.clone());
        let mut assembler = ContextAssembler::new(examples.clone(), guidelines.clone())
            .with_detector(detector.clone())
            .with_defaults(defaults)
            .with_default_analysis_type(config.assembly.analysis_type);
        if let Some(index) = &index {
            let lookup = RetrievalLookup::new(index.clone(), static_lookup)
                .with_top_k(retrieval.top_k)
                .with_condition_filter(retrieval.filter_by_condition);
            assembler = assembler.with_retrieval(Arc::new(lookup));
        }

        Self {
            examples,
            guidelines,
            detector,
            index,
            assembler,
            top_k: retrieval.top_k,
            filter_by_condition: retrieval.filter_by_condition,
        }
    }

    pub async fn assemble(&self, request: &ContextRequest) -> Result<ContextBlock, ArgumentError> {
        self.assembler.assemble(request).await
    }

    pub fn detect(&self, text: &str, specialty_hint: Option<&str>) -> ConditionTag {
        self.detector.detect(text, specialty_hint)
    }

    pub fn explain(&self, text: &str, specialty_hint: Option<&str>) -> Detection {
        self.detector.explain(text, specialty_hint)
    }

    /// Rank guideline snippets for `query`. `k` defaults to the configured
    /// `top_k`; the condition filter follows the configuration.
    pub async fn retrieve(
        &self,
        query: &str,
        k: Option<usize>,
        condition: Option<ConditionTag>,
    ) -> Result<Vec<RetrievedSnippet>, RetrievalError> {
        let Some(index) = &self.index else {
            return Err(RetrievalError::Unavailable("retrieval is disabled".into()));
        };
        let filter = condition.filter(|_| self.filter_by_condition);
        index.retrieve(query, k.unwrap_or(self.top_k), filter).await
    }

    /// Assemble context for `request` and render the full prompt.
    /// The request's query text doubles as the medical data.
    pub async fn build_prompt(
        &self,
        request: &ContextRequest,
        user_prompt: &str,
    ) -> Result<RenderedPrompt, ArgumentError> {
        let context = self.assemble(request).await?;
        let prompt = build_prompt(&PromptParts {
            analysis_type: context.metadata.analysis_type,
            specialty: request.specialty_hint.as_deref(),
            context: &context.text,
            user_prompt,
            medical_data: &request.query_text,
        });
        Ok(RenderedPrompt { context, prompt })
    }

    pub fn examples(&self) -> &ExampleStore {
        &self.examples
    }

    pub fn guidelines(&self) -> &GuidelineStore {
        &self.guidelines
    }

    pub fn defaults(&self) -> &AssemblyOptions {
        self.assembler.defaults()
    }

    /// `None` when retrieval is disabled.
    pub fn retrieval_stats(&self) -> Option<IndexStats> {
        self.index.as_ref().map(|index| index.stats())
    }
}

/// Embedder for the configured kind, or the reason none is available.
fn build_embedder(config: &RetrievalConfig) -> Result<Arc<dyn Embedder>, String> {
    match config.embedder {
        EmbedderKind::Hashing => Ok(Arc::new(HashingEmbedder::new(config.dimension))),
        EmbedderKind::Ollama => {
            OllamaEmbedder::new(&config.api_url, &config.model, config.dimension)
                .map(|e| Arc::new(e) as Arc<dyn Embedder>)
                .map_err(|e| e.to_string())
        }
        EmbedderKind::None => Err("no embedder configured".into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vecta_knowledge::IndexStatus;

    const EXAMPLES: &str = r#"{
      "neurology_few_shot_examples": {
        "epilepsy": [
          { "id": "ep1", "input": "3Hz spike-wave, brief staring spells", "analysis_type": "classification",
            "expected_output": { "classification": "generalized absence epilepsy", "clinical_confidence": "High" } },
          { "id": "ep2", "input": "Focal impaired awareness seizures", "analysis_type": "classification",
            "expected_output": { "classification": "focal temporal lobe epilepsy" } }
        ],
        "stroke": [
          { "id": "st1", "input": "Sudden left hemiparesis", "analysis_type": "classification",
            "expected_output": { "classification": "right MCA ischemic stroke" } }
        ]
      }
    }"#;

    const GUIDELINES: &str = r#"{
      "neurology_guidelines": {
        "epilepsy_guidelines": {
          "absence_seizures": { "source": "ILAE", "content": "Ethosuximide is first line for absence seizures." }
        },
        "stroke_guidelines": {
          "thrombolysis": { "source": "AHA/ASA", "content": "IV alteplase within 4.5 hours of last known well." }
        }
      }
    }"#;

    fn config_in(dir: &std::path::Path) -> AppConfig {
        std::fs::create_dir_all(dir.join("guidelines")).unwrap();
        std::fs::write(dir.join("few_shot_examples.json"), EXAMPLES).unwrap();
        std::fs::write(dir.join("guidelines").join("neurology_guidelines.json"), GUIDELINES).unwrap();

        let mut config = AppConfig::default();
        config.data.dir = dir.to_path_buf();
        config
    }

    #[tokio::test]
    async fn static_engine_assembles_context() {
        let dir = tempfile::tempdir().unwrap();
        let engine = ContextEngine::from_config(&config_in(dir.path())).await.unwrap();

        assert!(engine.retrieval_stats().is_none());
        let block = engine
            .assemble(&ContextRequest::new("absence seizures with 3Hz spike-wave"))
            .await
            .unwrap();
        assert_eq!(block.condition, ConditionTag::Epilepsy);
        assert!(block.text.contains("Example 2:"));
        assert!(block.text.contains("CLINICAL GUIDELINES:"));
    }

    #[tokio::test]
    async fn missing_data_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.data.dir = dir.path().to_path_buf();

        let err = ContextEngine::from_config(&config).await.err().unwrap();
        assert!(matches!(err, Error::Load(_)));
    }

    #[tokio::test]
    async fn retrieval_engine_indexes_at_startup() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.retrieval.enabled = true;
        config.retrieval.filter_by_condition = false;

        let engine = ContextEngine::from_config(&config).await.unwrap();
        let stats = engine.retrieval_stats().unwrap();
        assert_eq!(stats.status, IndexStatus::Ready);
        assert_eq!(stats.chunks, 2);

        let results = engine.retrieve("alteplase thrombolysis", Some(1), None).await.unwrap();
        assert_eq!(results[0].snippet.topic, "thrombolysis");

        let block = engine
            .assemble(&ContextRequest::new("acute stroke, candidate for alteplase"))
            .await
            .unwrap();
        assert!(block.text.contains("RELEVANT CLINICAL GUIDELINES:"));
    }

    #[tokio::test]
    async fn missing_embedder_degrades_to_static() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.retrieval.enabled = true;
        config.retrieval.embedder = EmbedderKind::None;

        let engine = ContextEngine::from_config(&config).await.unwrap();
        assert_eq!(engine.retrieval_stats().unwrap().status, IndexStatus::Unavailable);

        let block = engine
            .assemble(&ContextRequest::new("acute stroke, candidate for alteplase"))
            .await
            .unwrap();
        assert!(block.text.contains("CLINICAL GUIDELINES:\nThrombolysis"));
        assert!(engine.retrieve("stroke", None, None).await.is_err());
    }

    #[tokio::test]
    async fn disabled_retrieval_reports_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let engine = ContextEngine::from_config(&config_in(dir.path())).await.unwrap();
        let err = engine.retrieve("stroke", None, None).await.unwrap_err();
        assert!(matches!(err, RetrievalError::Unavailable(_)));
    }

    #[tokio::test]
    async fn configured_defaults_apply() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.assembly.num_examples = 1;
        config.assembly.include_guidelines = false;

        let engine = ContextEngine::from_config(&config).await.unwrap();
        let block = engine
            .assemble(&ContextRequest::new("absence seizures"))
            .await
            .unwrap();
        assert_eq!(block.metadata.example_ids, vec!["ep1"]);
        assert!(!block.text.contains("GUIDELINES"));
    }

    #[tokio::test]
    async fn prompt_wraps_assembled_context() {
        let dir = tempfile::tempdir().unwrap();
        let engine = ContextEngine::from_config(&config_in(dir.path())).await.unwrap();

        let request = ContextRequest::new("brief staring spells, 3Hz spike-wave").with_specialty("neurology");
        let rendered = engine.build_prompt(&request, "Classify the seizure type").await.unwrap();
        assert!(rendered.prompt.contains(&rendered.context.text));
        assert!(rendered.prompt.contains("NEUROLOGICAL ANALYSIS:"));
        assert!(rendered.prompt.contains("ANALYSIS REQUEST: Classify the seizure type"));
    }
}
