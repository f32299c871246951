//! Load-time and selection-time policies.

use serde::{Deserialize, Serialize};

/// What to do with an individual malformed entry inside an otherwise valid
/// data file. Missing or unparseable files always fail regardless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadPolicy {
    /// Log a warning, record the entry in the load report and continue.
    #[default]
    SkipInvalid,
    /// Fail the whole load on the first bad entry.
    Strict,
}

/// How examples are picked when more match than were requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum SelectionPolicy {
    /// First `n` in insertion order.
    #[default]
    Ordered,
    /// Uniform sample without replacement, returned in insertion order.
    /// A fixed seed makes the sample reproducible.
    Sampled {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        seed: Option<u64>,
    },
}

/// One entry the loader refused, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedEntry {
    /// Entry id, or `<condition>/<index>` when the id itself is missing.
    pub entry: String,
    pub reason: String,
}

/// Summary of a load: how many entries made it in and which were refused.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    pub accepted: usize,
    pub rejected: Vec<RejectedEntry>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_lenient_and_ordered() {
        assert_eq!(LoadPolicy::default(), LoadPolicy::SkipInvalid);
        assert_eq!(SelectionPolicy::default(), SelectionPolicy::Ordered);
    }

    #[test]
    fn selection_policy_serializes_with_mode_tag() {
        let json = serde_json::to_string(&SelectionPolicy::Sampled { seed: Some(7) }).unwrap();
        assert!(json.contains("\"mode\":\"sampled\""));
        assert!(json.contains("\"seed\":7"));
    }

    #[test]
    fn report_cleanliness() {
        let mut report = LoadReport::default();
        assert!(report.is_clean());
        report.rejected.push(RejectedEntry {
            entry: "ep9".into(),
            reason: "missing input".into(),
        });
        assert!(!report.is_clean());
    }
}
