//! Clinical guideline snippets.

use serde::{Deserialize, Serialize};

use crate::condition::ConditionTag;

/// A short excerpt of a named clinical guideline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuidelineSnippet {
    pub condition: ConditionTag,
    /// Sub-key within the condition, e.g. `first_line_medications`.
    pub topic: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub content: String,
}

impl GuidelineSnippet {
    /// `first_line_medications` -> `First Line Medications`.
    pub fn topic_title(&self) -> String {
        title_case(&self.topic)
    }
}

/// Turn a snake_case key into Title Case words.
pub fn title_case(key: &str) -> String {
    key.split(['_', ' '])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(|c| c.to_lowercase()))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
