//! Shared JSON document handling for the example and guideline files.
//!
//! File-level problems (missing, unreadable, not JSON, wrong top-level
//! shape) always fail. Entry-level problems go through [`EntrySink`], which
//! applies the configured [`LoadPolicy`].

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::warn;
use vecta_core::{ConditionTag, LoadError, LoadPolicy, LoadReport, RejectedEntry, title_case};

/// Read `path` and return its top-level JSON object, unwrapping
/// `wrapper_key` when the document is nested under it.
pub(crate) fn read_document(path: &Path, wrapper_key: &str) -> Result<Map<String, Value>, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|e| LoadError::Read {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    parse_document(path, &content, wrapper_key)
}

pub(crate) fn parse_document(
    path: &Path,
    content: &str,
    wrapper_key: &str,
) -> Result<Map<String, Value>, LoadError> {
    let value: Value = serde_json::from_str(content).map_err(|e| LoadError::Malformed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let Value::Object(mut root) = value else {
        return Err(LoadError::Malformed {
            path: path.to_path_buf(),
            reason: "top-level value must be an object".into(),
        });
    };

    match root.remove(wrapper_key) {
        Some(Value::Object(inner)) => Ok(inner),
        Some(_) => Err(LoadError::Malformed {
            path: path.to_path_buf(),
            reason: format!("'{wrapper_key}' must be an object"),
        }),
        None => Ok(root),
    }
}

/// Map a document key like `epilepsy` or `epilepsy_guidelines` onto the
/// vocabulary. `unknown` is a detection sentinel, never a storage key.
pub(crate) fn condition_key(key: &str) -> Result<ConditionTag, String> {
    let stem = key.strip_suffix("_guidelines").unwrap_or(key);
    match stem.parse::<ConditionTag>() {
        Ok(ConditionTag::Unknown) => Err("'unknown' cannot be used as a condition key".into()),
        Ok(tag) => Ok(tag),
        Err(e) => Err(e.to_string()),
    }
}

/// Render a field value as a single line of text. Arrays join with `; `.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(scalar_text).collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        }
        Value::Object(_) => {
            let text = render_block(value, 0);
            (!text.is_empty()).then_some(text)
        }
    }
}

/// Render nested guideline content as indented readable text.
///
/// Objects become `Title Case Key: value` lines (nested values on the
/// following lines, indented), arrays become `- item` lines.
pub(crate) fn render_block(value: &Value, indent: usize) -> String {
    let pad = "  ".repeat(indent);
    match value {
        Value::Object(map) => map
            .iter()
            .map(|(key, v)| match v {
                Value::Object(_) | Value::Array(_) => {
                    format!("{pad}{}:\n{}", title_case(key), render_block(v, indent + 1))
                }
                _ => format!("{pad}{}: {}", title_case(key), inline(v)),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Object(_) | Value::Array(_) => render_block(item, indent + 1),
                _ => format!("{pad}- {}", inline(item)),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        _ => format!("{pad}{}", inline(value)),
    }
}

fn inline(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Collects rejected entries according to the load policy.
pub(crate) struct EntrySink {
    path: PathBuf,
    policy: LoadPolicy,
    report: LoadReport,
}

impl EntrySink {
    pub(crate) fn new(path: &Path, policy: LoadPolicy) -> Self {
        Self {
            path: path.to_path_buf(),
            policy,
            report: LoadReport::default(),
        }
    }

    pub(crate) fn accept(&mut self) {
        self.report.accepted += 1;
    }

    /// Record a bad entry. Under [`LoadPolicy::Strict`] this is fatal.
    pub(crate) fn reject(&mut self, entry: impl Into<String>, reason: impl Into<String>) -> Result<(), LoadError> {
        let entry = entry.into();
        let reason = reason.into();
        match self.policy {
            LoadPolicy::Strict => Err(LoadError::InvalidEntry {
                path: self.path.clone(),
                entry,
                reason,
            }),
            LoadPolicy::SkipInvalid => {
                warn!(path = %self.path.display(), entry = %entry, reason = %reason, "Skipping invalid entry");
                self.report.rejected.push(RejectedEntry { entry, reason });
                Ok(())
            }
        }
    }

    pub(crate) fn finish(self) -> LoadReport {
        self.report
    }
}
