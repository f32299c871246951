//! Text rendering of the context sections.

use vecta_core::{Example, ExpectedOutput, title_case};
use vecta_knowledge::RetrievedSnippet;

pub const EXAMPLES_HEADER: &str = "EXAMPLE ANALYSES:";
pub const STATIC_GUIDELINES_HEADER: &str = "CLINICAL GUIDELINES:";
pub const RETRIEVED_GUIDELINES_HEADER: &str = "RELEVANT CLINICAL GUIDELINES:";

const MISSING: &str = "N/A";

/// Numbered worked examples. Empty input renders as an empty string.
///
/// ```text
/// EXAMPLE ANALYSES:
///
/// Example 1:
/// Input: ...
///
/// Analysis:
/// - Classification: ...
/// - Clinical_Confidence: ...
/// - Evidence: ...
/// - Medication_Analysis: ...
/// ```
pub fn format_examples(examples: &[&Example]) -> String {
    if examples.is_empty() {
        return String::new();
    }

    let rendered: Vec<String> = examples
        .iter()
        .enumerate()
        .map(|(i, example)| {
            format!(
                "Example {}:\nInput: {}\n\nAnalysis:\n{}",
                i + 1,
                example.input_text,
                format_analysis(&example.expected_output)
            )
        })
        .collect();

    format!("{EXAMPLES_HEADER}\n\n{}", rendered.join("\n\n"))
}

/// The four analysis bullets of one example.
pub fn format_analysis(output: &ExpectedOutput) -> String {
    let or_missing = |v: &Option<String>| v.clone().unwrap_or_else(|| MISSING.to_string());
    format!(
        "- {}: {}\n- Clinical_Confidence: {}\n- Evidence: {}\n- Medication_Analysis: {}",
        output.finding.analysis_type().finding_label(),
        output.finding.text(),
        or_missing(&output.clinical_confidence),
        or_missing(&output.evidence),
        or_missing(&output.medication_analysis),
    )
}

/// Numbered retrieval results, most similar first.
pub fn format_retrieved(results: &[RetrievedSnippet]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let source = if r.snippet.source.is_empty() {
                MISSING
            } else {
                r.snippet.source.as_str()
            };
            format!(
                "{}. {}:\n   Source: {}\n   {}",
                i + 1,
                title_case(&r.snippet.topic).to_uppercase(),
                source,
                r.snippet.content.replace('\n', "\n   ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// `header` followed by `body`, or nothing when the body is empty.
pub fn section(header: &str, body: &str) -> String {
    if body.trim().is_empty() {
        String::new()
    } else {
        format!("{header}\n{body}")
    }
}
