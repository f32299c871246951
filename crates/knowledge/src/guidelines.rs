//! Guideline store: immutable index of clinical guideline snippets.
//!
//! The backing file maps condition → topic → `{source, url, content}`.
//! An unknown condition is not exceptional: lookups simply return nothing.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};
use vecta_core::{ConditionTag, GuidelineSnippet, LoadError, LoadPolicy, LoadReport};

use crate::document::{EntrySink, condition_key, parse_document, read_document, render_block};

/// Top-level key the guideline file may be wrapped in.
pub const GUIDELINES_WRAPPER_KEY: &str = "neurology_guidelines";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuidelineStatistics {
    pub per_condition: BTreeMap<ConditionTag, usize>,
    pub total: usize,
}

/// In-memory index: condition → snippets in file order.
#[derive(Debug, Clone, Default)]
pub struct GuidelineStore {
    by_condition: BTreeMap<ConditionTag, Vec<GuidelineSnippet>>,
    report: LoadReport,
}

impl GuidelineStore {
    /// Load guidelines from a JSON file.
    pub fn load(path: &Path, policy: LoadPolicy) -> Result<Self, LoadError> {
        let root = read_document(path, GUIDELINES_WRAPPER_KEY)?;
        let store = Self::from_document(path, root, policy)?;
        info!(
            path = %path.display(),
            snippets = store.len(),
            rejected = store.report.rejected.len(),
            "Clinical guidelines loaded"
        );
        Ok(store)
    }

    /// Parse guidelines from an in-memory JSON string.
    pub fn from_json(content: &str, policy: LoadPolicy) -> Result<Self, LoadError> {
        let path = Path::new("<inline>");
        let root = parse_document(path, content, GUIDELINES_WRAPPER_KEY)?;
        Self::from_document(path, root, policy)
    }

    /// Build a store from already-validated snippets.
    pub fn from_snippets(snippets: impl IntoIterator<Item = GuidelineSnippet>) -> Self {
        let mut by_condition: BTreeMap<ConditionTag, Vec<GuidelineSnippet>> = BTreeMap::new();
        let mut accepted = 0;
        for snippet in snippets {
            by_condition.entry(snippet.condition).or_default().push(snippet);
            accepted += 1;
        }
        Self {
            by_condition,
            report: LoadReport {
                accepted,
                rejected: vec![],
            },
        }
    }

    fn from_document(
        path: &Path,
        root: Map<String, Value>,
        policy: LoadPolicy,
    ) -> Result<Self, LoadError> {
        let mut sink = EntrySink::new(path, policy);
        let mut by_condition: BTreeMap<ConditionTag, Vec<GuidelineSnippet>> = BTreeMap::new();

        for (key, topics) in root {
            let condition = match condition_key(&key) {
                Ok(tag) => tag,
                Err(reason) => {
                    sink.reject(key.clone(), reason)?;
                    continue;
                }
            };

            let Value::Object(topics) = topics else {
                sink.reject(key.clone(), "condition value must be an object of topics")?;
                continue;
            };

            for (topic, record) in topics {
                let label = format!("{key}/{topic}");
                match parse_snippet(condition, &topic, &record) {
                    Ok(snippet) => {
                        sink.accept();
                        by_condition.entry(condition).or_default().push(snippet);
                    }
                    Err(reason) => sink.reject(label, reason)?,
                }
            }
        }

        Ok(Self {
            by_condition,
            report: sink.finish(),
        })
    }

    /// Formatted guideline text for `condition`, optionally limited to one
    /// topic. A topic the condition lacks yields every snippet of the
    /// condition. Empty when the condition has none. Never truncated here.
    pub fn get_guideline(&self, condition: ConditionTag, topic: Option<&str>) -> String {
        let snippets = self.snippets(condition);
        let mut selected: Vec<&GuidelineSnippet> = snippets
            .iter()
            .filter(|s| topic.is_none_or(|t| s.topic.eq_ignore_ascii_case(t)))
            .collect();
        if let Some(topic) = topic.filter(|_| selected.is_empty()) {
            debug!(%condition, topic, "Unknown topic, using all guidelines");
            selected = snippets.iter().collect();
        }
        selected
            .into_iter()
            .map(format_snippet)
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Snippets for one condition, in file order.
    pub fn snippets(&self, condition: ConditionTag) -> &[GuidelineSnippet] {
        self.by_condition
            .get(&condition)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every snippet, grouped by condition in vocabulary order.
    pub fn all_snippets(&self) -> Vec<&GuidelineSnippet> {
        self.by_condition.values().flatten().collect()
    }

    pub fn topics(&self, condition: ConditionTag) -> Vec<&str> {
        self.snippets(condition).iter().map(|s| s.topic.as_str()).collect()
    }

    pub fn statistics(&self) -> GuidelineStatistics {
        let per_condition: BTreeMap<ConditionTag, usize> = self
            .by_condition
            .iter()
            .map(|(tag, snippets)| (*tag, snippets.len()))
            .collect();
        let total = per_condition.values().sum();
        GuidelineStatistics {
            per_condition,
            total,
        }
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

/// `Topic Title (Source):` followed by the content.
pub fn format_snippet(snippet: &GuidelineSnippet) -> String {
    let title = snippet.topic_title();
    if snippet.source.is_empty() {
        format!("{title}:\n{}", snippet.content)
    } else {
        format!("{title} ({}):\n{}", snippet.source, snippet.content)
    }
}

fn parse_snippet(condition: ConditionTag, topic: &str, record: &Value) -> Result<GuidelineSnippet, String> {
    let Value::Object(record) = record else {
        return Err("topic value must be an object with 'content'".into());
    };

    let content = match record.get("content") {
        None | Some(Value::Null) => return Err("missing content".into()),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => render_block(other, 0),
    };
    if content.is_empty() {
        return Err("empty content".into());
    }

    let source = match record.get("source") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(_) => return Err("source must be a string".into()),
    };
    let url = record
        .get("url")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string);

    Ok(GuidelineSnippet {
        condition,
        topic: topic.to_string(),
        source,
        url,
        content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
      "neurology_guidelines": {
        "epilepsy_guidelines": {
          "absence_seizures": {
            "source": "ILAE 2025",
            "url": "https://www.ilae.org",
            "content": "Absence seizures show 3Hz generalized spike-wave. Ethosuximide is first line."
          },
          "first_line_medications": {
            "source": "NICE NG217",
            "content": { "focal": ["lamotrigine", "levetiracetam"], "generalized": "valproate (not in women of childbearing potential)" }
          }
        },
        "stroke_guidelines": {
          "thrombolysis": {
            "source": "AHA/ASA 2019",
            "content": "IV alteplase within 4.5 hours of last known well."
          }
        }
      }
    }"#;

    fn store() -> GuidelineStore {
        GuidelineStore::from_json(FIXTURE, LoadPolicy::Strict).unwrap()
    }

    #[test]
    fn get_guideline_concatenates_all_topics() {
        let text = store().get_guideline(ConditionTag::Epilepsy, None);
        assert!(text.starts_with("Absence Seizures (ILAE 2025):\nAbsence seizures show 3Hz"));
        assert!(text.contains("\n\nFirst Line Medications (NICE NG217):\n"));
        assert!(text.contains("  - lamotrigine"));
        assert!(text.contains("Generalized: valproate"));
    }

    #[test]
    fn topic_filter_limits_output() {
        let text = store().get_guideline(ConditionTag::Epilepsy, Some("absence_seizures"));
        assert!(text.contains("Ethosuximide"));
        assert!(!text.contains("lamotrigine"));
    }

    #[test]
    fn unknown_topic_falls_back_to_whole_condition() {
        let store = store();
        assert_eq!(
            store.get_guideline(ConditionTag::Epilepsy, Some("surgery")),
            store.get_guideline(ConditionTag::Epilepsy, None)
        );
        assert!(!store.get_guideline(ConditionTag::Epilepsy, Some("surgery")).is_empty());
        assert_eq!(store.get_guideline(ConditionTag::Dementia, Some("surgery")), "");
    }

    #[test]
    fn condition_without_snippets_yields_empty() {
        let store = store();
        assert_eq!(store.get_guideline(ConditionTag::Dementia, None), "");
        assert_eq!(store.get_guideline(ConditionTag::Unknown, None), "");
        assert!(store.snippets(ConditionTag::Headache).is_empty());
    }

    #[test]
    fn topics_keep_file_order() {
        assert_eq!(
            store().topics(ConditionTag::Epilepsy),
            vec!["absence_seizures", "first_line_medications"]
        );
    }

    #[test]
    fn url_is_optional() {
        let store = store();
        let snippets = store.snippets(ConditionTag::Epilepsy);
        assert_eq!(snippets[0].url.as_deref(), Some("https://www.ilae.org"));
        assert_eq!(snippets[1].url, None);
    }

    #[test]
    fn statistics_and_all_snippets() {
        let store = store();
        let stats = store.statistics();
        assert_eq!(stats.per_condition[&ConditionTag::Epilepsy], 2);
        assert_eq!(stats.total, 3);
        assert_eq!(store.all_snippets().len(), 3);
    }

    #[test]
    fn bad_records_follow_load_policy() {
        let doc = r#"{
          "stroke": {
            "ok": { "source": "AHA", "content": "Aspirin within 48 hours." },
            "no_content": { "source": "AHA" },
            "not_a_record": "just text"
          },
          "oncology": { "x": { "content": "y" } }
        }"#;

        let lenient = GuidelineStore::from_json(doc, LoadPolicy::SkipInvalid).unwrap();
        assert_eq!(lenient.len(), 1);
        let rejected: Vec<&str> = lenient
            .report()
            .rejected
            .iter()
            .map(|r| r.entry.as_str())
            .collect();
        assert_eq!(rejected, vec!["stroke/no_content", "stroke/not_a_record", "oncology"]);

        let err = GuidelineStore::from_json(doc, LoadPolicy::Strict).unwrap_err();
        assert!(err.to_string().contains("stroke/no_content"));
    }

    #[test]
    fn format_snippet_without_source() {
        let snippet = GuidelineSnippet {
            condition: ConditionTag::Headache,
            topic: "red_flags".into(),
            source: String::new(),
            url: None,
            content: "Thunderclap onset".into(),
        };
        assert_eq!(format_snippet(&snippet), "Red Flags:\nThunderclap onset");
    }
}
