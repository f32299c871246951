//! Condition detection: keyword triggers with a fixed priority order.
//!
//! Text is scanned against one trigger set per condition, in
//! [`KEYWORD_PRIORITY`] order; the first set with any match wins. Rarer,
//! more specific conditions come first so that, for example, a post-stroke
//! seizure note resolves to stroke rather than epilepsy. Triggers match
//! case-insensitively on word boundaries; a trailing `*` marks a stem.
//!
//! Without a keyword match the specialty hint is consulted, then the
//! result is [`ConditionTag::Unknown`]. Detection never fails.

use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};
use vecta_core::ConditionTag;

/// Condition → triggers, in priority order.
pub const KEYWORD_PRIORITY: &[(ConditionTag, &[&str])] = &[
    (
        ConditionTag::MotorNeuronDisease,
        &["als", "amyotrophic lateral sclerosis", "motor neuron*", "fasciculation*"],
    ),
    (
        ConditionTag::MyastheniaGravis,
        &["myasthen*", "acetylcholine receptor", "neuromuscular junction"],
    ),
    (
        ConditionTag::MultipleSclerosis,
        &["multiple sclerosis", "demyelinat*", "optic neuritis", "oligoclonal"],
    ),
    (
        ConditionTag::SpinalCord,
        &["spinal cord", "myelopathy", "paraplegi*", "tetraplegi*", "quadriplegi*"],
    ),
    (
        ConditionTag::PeripheralNeuropathy,
        &["neuropath*", "polyneuropath*", "nerve damage"],
    ),
    (
        ConditionTag::Stroke,
        &[
            "stroke",
            "cva",
            "ischemic",
            "ischaemic",
            "hemorrhagic",
            "tpa",
            "thrombolysis",
            "hemiparesis",
            "tia",
        ],
    ),
    (
        ConditionTag::Parkinsons,
        &["parkinson*", "tremor", "rigidity", "bradykinesia", "levodopa", "dopamin*"],
    ),
    (
        ConditionTag::Dementia,
        &["dementia", "alzheimer*", "cognitive decline", "memory loss", "mmse", "moca"],
    ),
    (
        ConditionTag::Epilepsy,
        &[
            "seizure*",
            "epilep*",
            "convuls*",
            "eeg",
            "ictal",
            "postictal",
            "antiseizure",
            "asm",
            "spike wave",
            "spike and wave",
        ],
    ),
    (
        ConditionTag::Headache,
        &["headache*", "migraine*", "cephalalgia", "triptan*", "ichd"],
    ),
];

/// Specialty hint → condition, consulted when no keyword matches.
pub const SPECIALTY_FALLBACK: &[(&str, ConditionTag)] = &[
    ("neurology", ConditionTag::Epilepsy),
    ("epileptology", ConditionTag::Epilepsy),
    ("movement_disorders", ConditionTag::Parkinsons),
    ("vascular_neurology", ConditionTag::Stroke),
    ("cerebrovascular", ConditionTag::Stroke),
    ("cognitive_neurology", ConditionTag::Dementia),
    ("neuroimmunology", ConditionTag::MultipleSclerosis),
    ("neuromuscular", ConditionTag::PeripheralNeuropathy),
    ("headache", ConditionTag::Headache),
];

/// How a condition was arrived at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "via", rename_all = "snake_case")]
pub enum DetectionSource {
    Keyword { trigger: String },
    Specialty { hint: String },
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Detection {
    pub condition: ConditionTag,
    pub source: DetectionSource,
}

/// Compiled keyword table. Build once and share.
pub struct ConditionDetector {
    rules: Vec<(ConditionTag, Regex)>,
}

impl ConditionDetector {
    pub fn new() -> Self {
        let rules = KEYWORD_PRIORITY
            .iter()
            .filter_map(|(tag, triggers)| match compile(triggers) {
                Ok(re) => Some((*tag, re)),
                Err(e) => {
                    warn!(condition = %tag, error = %e, "Dropping condition with invalid trigger pattern");
                    None
                }
            })
            .collect();
        Self { rules }
    }

    /// Conditions this detector can match by keyword, in priority order.
    pub fn conditions(&self) -> Vec<ConditionTag> {
        self.rules.iter().map(|(tag, _)| *tag).collect()
    }

    /// Classify `text` (plus optional specialty hint) into exactly one tag.
    pub fn detect(&self, text: &str, specialty_hint: Option<&str>) -> ConditionTag {
        self.explain(text, specialty_hint).condition
    }

    /// Like [`ConditionDetector::detect`], but also reports which trigger
    /// or hint decided the result.
    pub fn explain(&self, text: &str, specialty_hint: Option<&str>) -> Detection {
        for (tag, re) in &self.rules {
            if let Some(m) = re.find(text) {
                debug!(condition = %tag, trigger = m.as_str(), "Condition detected by keyword");
                return Detection {
                    condition: *tag,
                    source: DetectionSource::Keyword {
                        trigger: m.as_str().to_lowercase(),
                    },
                };
            }
        }

        if let Some(hint) = specialty_hint {
            if let Some(tag) = specialty_condition(hint) {
                debug!(condition = %tag, hint, "Condition detected from specialty hint");
                return Detection {
                    condition: tag,
                    source: DetectionSource::Specialty {
                        hint: hint.to_string(),
                    },
                };
            }
        }

        Detection {
            condition: ConditionTag::Unknown,
            source: DetectionSource::None,
        }
    }
}

impl Default for ConditionDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve a specialty hint: a condition name maps to itself, otherwise
/// the fallback table applies.
pub fn specialty_condition(hint: &str) -> Option<ConditionTag> {
    let normalized = normalize_hint(hint);
    if normalized.is_empty() {
        return None;
    }
    if let Ok(tag) = normalized.parse::<ConditionTag>() {
        return tag.is_known().then_some(tag);
    }
    SPECIALTY_FALLBACK
        .iter()
        .find(|(name, _)| *name == normalized)
        .map(|(_, tag)| *tag)
}

fn normalize_hint(hint: &str) -> String {
    hint.trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// One alternation per condition: `(?i)\b(?:t1|t2\w*|...)\b`.
fn compile(triggers: &[&str]) -> Result<Regex, regex::Error> {
    let alternatives: Vec<String> = triggers.iter().map(|t| trigger_pattern(t)).collect();
    Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives.join("|")))
}

fn trigger_pattern(trigger: &str) -> String {
    let (stem, wildcard) = match trigger.strip_suffix('*') {
        Some(stem) => (stem, true),
        None => (trigger, false),
    };
    let words: Vec<String> = stem
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|w| !w.is_empty())
        .map(regex::escape)
        .collect();
    let mut pattern = words.join(r"[\s\-]+");
    if wildcard {
        pattern.push_str(r"\w*");
    }
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(text: &str) -> ConditionTag {
        ConditionDetector::new().detect(text, None)
    }

    #[test]
    fn all_trigger_sets_compile() {
        assert_eq!(ConditionDetector::new().conditions().len(), ConditionTag::KNOWN.len());
    }

    #[test]
    fn tremor_and_bradykinesia_is_parkinsons() {
        assert_eq!(
            detect("patient with resting tremor and bradykinesia"),
            ConditionTag::Parkinsons
        );
    }

    #[test]
    fn no_keywords_and_no_hint_is_unknown() {
        assert_eq!(detect("routine annual physical, no complaints"), ConditionTag::Unknown);
        assert_eq!(detect(""), ConditionTag::Unknown);
    }

    #[test]
    fn detection_is_case_insensitive() {
        assert_eq!(detect("GENERALIZED TONIC-CLONIC SEIZURE"), ConditionTag::Epilepsy);
        assert_eq!(detect("Known Migraineur"), ConditionTag::Headache);
    }

    #[test]
    fn stems_match_inflections() {
        assert_eq!(detect("two seizures last week"), ConditionTag::Epilepsy);
        assert_eq!(detect("new onset epileptiform discharges"), ConditionTag::Epilepsy);
        assert_eq!(detect("diabetic polyneuropathy"), ConditionTag::PeripheralNeuropathy);
        assert_eq!(detect("dopaminergic therapy"), ConditionTag::Parkinsons);
    }

    #[test]
    fn word_boundaries_prevent_substring_hits() {
        // "als" inside "vitals", "tia" inside "initial", "eeg" nowhere.
        assert_eq!(detect("initial vitals stable"), ConditionTag::Unknown);
    }

    #[test]
    fn dosage_units_do_not_trigger() {
        assert_eq!(detect("aspirin 300 mg, latency 20 ms"), ConditionTag::Unknown);
    }

    #[test]
    fn multi_word_triggers_tolerate_spacing_and_hyphens() {
        assert_eq!(detect("3Hz spike-wave discharges"), ConditionTag::Epilepsy);
        assert_eq!(detect("progressive cognitive   decline"), ConditionTag::Dementia);
    }

    #[test]
    fn stroke_outranks_epilepsy() {
        assert_eq!(
            detect("post-stroke seizure three weeks after ischemic event"),
            ConditionTag::Stroke
        );
    }

    #[test]
    fn specific_conditions_outrank_generic_ones() {
        assert_eq!(
            detect("ALS with fasciculations and a single seizure"),
            ConditionTag::MotorNeuronDisease
        );
        assert_eq!(
            detect("relapsing multiple sclerosis, optic neuritis, headache"),
            ConditionTag::MultipleSclerosis
        );
    }

    #[test]
    fn specialty_hint_is_fallback_only() {
        let detector = ConditionDetector::new();
        assert_eq!(detector.detect("no keywords here", Some("Neurology")), ConditionTag::Epilepsy);
        assert_eq!(
            detector.detect("resting tremor", Some("neurology")),
            ConditionTag::Parkinsons
        );
        assert_eq!(
            detector.detect("no keywords here", Some("movement disorders")),
            ConditionTag::Parkinsons
        );
        assert_eq!(detector.detect("no keywords", Some("cardiology")), ConditionTag::Unknown);
    }

    #[test]
    fn condition_name_as_hint_maps_to_itself() {
        assert_eq!(specialty_condition("Multiple Sclerosis"), Some(ConditionTag::MultipleSclerosis));
        assert_eq!(specialty_condition("stroke"), Some(ConditionTag::Stroke));
        assert_eq!(specialty_condition("unknown"), None);
        assert_eq!(specialty_condition("  "), None);
    }

    #[test]
    fn explain_reports_trigger() {
        let detection = ConditionDetector::new().explain("Started on Levodopa", None);
        assert_eq!(detection.condition, ConditionTag::Parkinsons);
        assert_eq!(
            detection.source,
            DetectionSource::Keyword {
                trigger: "levodopa".into()
            }
        );

        let detection = ConditionDetector::new().explain("nothing", Some("neuromuscular"));
        assert_eq!(detection.condition, ConditionTag::PeripheralNeuropathy);
        assert!(matches!(detection.source, DetectionSource::Specialty { .. }));
    }

    #[test]
    fn medication_and_eeg_shorthand_detect_epilepsy() {
        assert_eq!(detect("switched ASM after breakthrough events"), ConditionTag::Epilepsy);
        assert_eq!(detect("3 Hz generalized spike-and-wave"), ConditionTag::Epilepsy);
        assert_eq!(detect("spike and wave discharges on sleep study"), ConditionTag::Epilepsy);
        assert_eq!(detect("chasm between visits"), ConditionTag::Unknown);
    }

    #[test]
    fn detection_is_deterministic() {
        let detector = ConditionDetector::new();
        let text = "migraine with aura, prior TIA";
        assert_eq!(detector.detect(text, None), detector.detect(text, None));
        assert_eq!(detector.detect(text, None), ConditionTag::Stroke);
    }
}
