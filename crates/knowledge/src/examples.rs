//! Example store: immutable index of worked few-shot examples.
//!
//! Loaded once from `few_shot_examples.json`, grouped by condition in file
//! order, and never mutated afterwards. Safe for any number of concurrent
//! readers behind an `Arc`.

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::{debug, info};
use vecta_core::{
    AnalysisType, ConditionTag, Example, ExpectedOutput, Finding, LoadError, LoadPolicy,
    LoadReport, Provenance, SelectionPolicy,
};

use crate::document::{EntrySink, condition_key, parse_document, read_document, scalar_text};

/// Top-level key the example file may be wrapped in.
pub const EXAMPLES_WRAPPER_KEY: &str = "neurology_few_shot_examples";

/// Per-condition example counts plus a total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleStatistics {
    pub per_condition: BTreeMap<ConditionTag, usize>,
    pub total: usize,
}

/// In-memory index: condition → examples in insertion order.
#[derive(Debug, Clone, Default)]
pub struct ExampleStore {
    by_condition: BTreeMap<ConditionTag, Vec<Example>>,
    selection: SelectionPolicy,
    report: LoadReport,
}

impl ExampleStore {
    /// Load examples from a JSON file.
    pub fn load(path: &Path, policy: LoadPolicy) -> Result<Self, LoadError> {
        let root = read_document(path, EXAMPLES_WRAPPER_KEY)?;
        let store = Self::from_document(path, root, policy)?;
        info!(
            path = %path.display(),
            examples = store.len(),
            conditions = store.by_condition.len(),
            rejected = store.report.rejected.len(),
            "Few-shot examples loaded"
        );
        Ok(store)
    }

    /// Parse examples from an in-memory JSON string.
    pub fn from_json(content: &str, policy: LoadPolicy) -> Result<Self, LoadError> {
        let path = Path::new("<inline>");
        let root = parse_document(path, content, EXAMPLES_WRAPPER_KEY)?;
        Self::from_document(path, root, policy)
    }

    /// Build a store from already-validated examples.
    pub fn from_examples(examples: impl IntoIterator<Item = Example>) -> Self {
        let mut by_condition: BTreeMap<ConditionTag, Vec<Example>> = BTreeMap::new();
        let mut accepted = 0;
        for example in examples {
            by_condition.entry(example.condition).or_default().push(example);
            accepted += 1;
        }
        Self {
            by_condition,
            selection: SelectionPolicy::default(),
            report: LoadReport {
                accepted,
                rejected: vec![],
            },
        }
    }

    /// Set how examples are picked when more match than requested.
    pub fn with_selection(mut self, selection: SelectionPolicy) -> Self {
        self.selection = selection;
        self
    }

    fn from_document(
        path: &Path,
        root: Map<String, Value>,
        policy: LoadPolicy,
    ) -> Result<Self, LoadError> {
        let mut sink = EntrySink::new(path, policy);
        let mut by_condition: BTreeMap<ConditionTag, Vec<Example>> = BTreeMap::new();
        let mut seen_ids: HashSet<String> = HashSet::new();

        for (key, entries) in root {
            let condition = match condition_key(&key) {
                Ok(tag) => tag,
                Err(reason) => {
                    sink.reject(key.clone(), reason)?;
                    continue;
                }
            };

            let Value::Array(entries) = entries else {
                sink.reject(key.clone(), "condition value must be a list of examples")?;
                continue;
            };

            for (index, raw) in entries.into_iter().enumerate() {
                let label = raw
                    .get("id")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("{key}/{index}"));

                match parse_example(condition, raw) {
                    Ok(example) if !seen_ids.insert(example.id.clone()) => {
                        sink.reject(label, "duplicate id")?;
                    }
                    Ok(example) => {
                        sink.accept();
                        by_condition.entry(condition).or_default().push(example);
                    }
                    Err(reason) => sink.reject(label, reason)?,
                }
            }
        }

        Ok(Self {
            by_condition,
            selection: SelectionPolicy::default(),
            report: sink.finish(),
        })
    }

    /// Up to `n` examples for `condition`.
    ///
    /// When `analysis_type` is given, examples of that type are preferred;
    /// if the condition has none of that type, the unfiltered list is used.
    /// Unknown or empty conditions yield an empty vector.
    pub fn get_examples(
        &self,
        condition: ConditionTag,
        analysis_type: Option<AnalysisType>,
        n: usize,
    ) -> Vec<&Example> {
        let Some(all) = self.by_condition.get(&condition) else {
            return Vec::new();
        };
        if n == 0 {
            return Vec::new();
        }

        let typed: Vec<&Example> = match analysis_type {
            Some(at) => all.iter().filter(|e| e.analysis_type == at).collect(),
            None => Vec::new(),
        };
        let pool: Vec<&Example> = if typed.is_empty() {
            if analysis_type.is_some() {
                debug!(%condition, "No examples of requested analysis type, using all");
            }
            all.iter().collect()
        } else {
            typed
        };

        self.select(pool, n)
    }

    /// Like [`ExampleStore::get_examples`] but takes a condition name.
    /// Names outside the vocabulary yield an empty vector.
    pub fn get_examples_by_name(
        &self,
        condition: &str,
        analysis_type: Option<AnalysisType>,
        n: usize,
    ) -> Vec<&Example> {
        match condition.parse::<ConditionTag>() {
            Ok(tag) => self.get_examples(tag, analysis_type, n),
            Err(_) => Vec::new(),
        }
    }

    fn select<'a>(&self, pool: Vec<&'a Example>, n: usize) -> Vec<&'a Example> {
        if pool.len() <= n {
            return pool;
        }
        match self.selection {
            SelectionPolicy::Ordered => pool.into_iter().take(n).collect(),
            SelectionPolicy::Sampled { seed: Some(seed) } => {
                let mut rng = StdRng::seed_from_u64(seed);
                pick(&pool, &sample_indices(&mut rng, pool.len(), n))
            }
            SelectionPolicy::Sampled { seed: None } => {
                let mut rng = rand::thread_rng();
                pick(&pool, &sample_indices(&mut rng, pool.len(), n))
            }
        }
    }

    pub fn statistics(&self) -> ExampleStatistics {
        let per_condition: BTreeMap<ConditionTag, usize> = self
            .by_condition
            .iter()
            .map(|(tag, examples)| (*tag, examples.len()))
            .collect();
        let total = per_condition.values().sum();
        ExampleStatistics {
            per_condition,
            total,
        }
    }

    /// Conditions with at least one example, in vocabulary order.
    pub fn conditions(&self) -> Vec<ConditionTag> {
        self.by_condition
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(tag, _)| *tag)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.by_condition.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }
}

/// Sorted distinct indices so sampled examples keep store order.
fn sample_indices<R: Rng + ?Sized>(rng: &mut R, len: usize, n: usize) -> Vec<usize> {
    let mut indices = rand::seq::index::sample(rng, len, n).into_vec();
    indices.sort_unstable();
    indices
}

fn pick<'a>(pool: &[&'a Example], indices: &[usize]) -> Vec<&'a Example> {
    indices.iter().map(|&i| pool[i]).collect()
}

#[derive(Deserialize)]
struct RawExample {
    id: Option<String>,
    input: Option<String>,
    analysis_type: Option<String>,
    expected_output: Option<Map<String, Value>>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    citation: Option<String>,
    #[serde(default)]
    source_url: Option<String>,
}

fn parse_example(condition: ConditionTag, raw: Value) -> Result<Example, String> {
    let raw: RawExample = serde_json::from_value(raw).map_err(|e| e.to_string())?;

    let id = raw
        .id
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or("missing id")?;
    let input_text = raw
        .input
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or("missing input")?;
    let analysis_type: AnalysisType = raw
        .analysis_type
        .ok_or("missing analysis_type")?
        .parse()
        .map_err(|e: vecta_core::ArgumentError| e.to_string())?;
    let output = raw.expected_output.ok_or("missing expected_output")?;

    let finding_text = finding_keys(analysis_type)
        .iter()
        .find_map(|key| output.get(*key).and_then(scalar_text))
        .ok_or_else(|| {
            format!(
                "expected_output has no '{}' field for analysis_type {analysis_type}",
                finding_keys(analysis_type)[0]
            )
        })?;

    let field = |keys: &[&str]| keys.iter().find_map(|k| output.get(*k).and_then(scalar_text));

    Ok(Example {
        id,
        condition,
        analysis_type,
        input_text,
        expected_output: ExpectedOutput {
            finding: Finding::for_analysis(analysis_type, finding_text),
            clinical_confidence: field(&["clinical_confidence", "confidence"]),
            evidence: field(&["evidence"]),
            medication_analysis: field(&["medication_analysis"]),
        },
        provenance: Provenance {
            source: raw.source,
            citation: raw.citation,
            source_url: raw.source_url,
        },
    })
}

/// Field names that may carry the finding for each analysis type,
/// canonical name first.
fn finding_keys(analysis_type: AnalysisType) -> &'static [&'static str] {
    match analysis_type {
        AnalysisType::Classification => &["classification"],
        AnalysisType::Diagnosis => &["diagnosis_support", "diagnosis"],
        AnalysisType::Extraction => &["information_extraction", "extraction"],
        AnalysisType::Summary => &["clinical_summary", "summary"],
    }
}
