//! Worked few-shot examples and their typed expected outputs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::condition::ConditionTag;
use crate::error::ArgumentError;

/// The kind of analysis an example illustrates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    #[default]
    Classification,
    Diagnosis,
    Extraction,
    Summary,
}

impl AnalysisType {
    pub const ALL: [AnalysisType; 4] = [
        AnalysisType::Classification,
        AnalysisType::Diagnosis,
        AnalysisType::Extraction,
        AnalysisType::Summary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Classification => "classification",
            Self::Diagnosis => "diagnosis",
            Self::Extraction => "extraction",
            Self::Summary => "summary",
        }
    }

    /// Label of the finding bullet in rendered examples and prompts.
    pub fn finding_label(&self) -> &'static str {
        match self {
            Self::Classification => "Classification",
            Self::Diagnosis => "Diagnosis Support",
            Self::Extraction => "Information Extraction",
            Self::Summary => "Clinical Summary",
        }
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisType {
    type Err = ArgumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "classification" => Ok(Self::Classification),
            "diagnosis" | "diagnosis_support" => Ok(Self::Diagnosis),
            "extraction" | "information_extraction" => Ok(Self::Extraction),
            "summary" | "summarization" | "clinical_summary" => Ok(Self::Summary),
            _ => Err(ArgumentError::UnknownAnalysisType(s.to_string())),
        }
    }
}

/// The analysis-specific headline of an expected output.
///
/// One variant per [`AnalysisType`]; an example's finding must match its
/// declared analysis type (enforced by the loader).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "text")]
pub enum Finding {
    Classification(String),
    DiagnosisSupport(String),
    InformationExtraction(String),
    ClinicalSummary(String),
}

impl Finding {
    /// Build the finding variant that belongs to `analysis_type`.
    pub fn for_analysis(analysis_type: AnalysisType, text: impl Into<String>) -> Self {
        let text = text.into();
        match analysis_type {
            AnalysisType::Classification => Self::Classification(text),
            AnalysisType::Diagnosis => Self::DiagnosisSupport(text),
            AnalysisType::Extraction => Self::InformationExtraction(text),
            AnalysisType::Summary => Self::ClinicalSummary(text),
        }
    }

    pub fn analysis_type(&self) -> AnalysisType {
        match self {
            Self::Classification(_) => AnalysisType::Classification,
            Self::DiagnosisSupport(_) => AnalysisType::Diagnosis,
            Self::InformationExtraction(_) => AnalysisType::Extraction,
            Self::ClinicalSummary(_) => AnalysisType::Summary,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Classification(t)
            | Self::DiagnosisSupport(t)
            | Self::InformationExtraction(t)
            | Self::ClinicalSummary(t) => t,
        }
    }
}

/// What a model should produce for an example's input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedOutput {
    pub finding: Finding,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinical_confidence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medication_analysis: Option<String>,
}

/// Audit metadata. Never consulted by selection logic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

/// A worked illustration of an analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    pub id: String,
    pub condition: ConditionTag,
    pub analysis_type: AnalysisType,
    pub input_text: String,
    pub expected_output: ExpectedOutput,
    #[serde(default)]
    pub provenance: Provenance,
}
