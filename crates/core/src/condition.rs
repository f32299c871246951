//! Condition vocabulary shared by examples, guidelines and detection.
//!
//! Every stored entity carries a [`ConditionTag`] from this fixed set. The
//! vocabulary is closed: loaders reject tags outside it rather than
//! registering new ones.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A canonical clinical topic area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionTag {
    Epilepsy,
    Parkinsons,
    Stroke,
    Headache,
    Dementia,
    MultipleSclerosis,
    PeripheralNeuropathy,
    MyastheniaGravis,
    SpinalCord,
    MotorNeuronDisease,
    /// No targeted examples or guidelines apply.
    Unknown,
}

impl ConditionTag {
    /// All concrete conditions, excluding [`ConditionTag::Unknown`].
    pub const KNOWN: [ConditionTag; 10] = [
        ConditionTag::Epilepsy,
        ConditionTag::Parkinsons,
        ConditionTag::Stroke,
        ConditionTag::Headache,
        ConditionTag::Dementia,
        ConditionTag::MultipleSclerosis,
        ConditionTag::PeripheralNeuropathy,
        ConditionTag::MyastheniaGravis,
        ConditionTag::SpinalCord,
        ConditionTag::MotorNeuronDisease,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Epilepsy => "epilepsy",
            Self::Parkinsons => "parkinsons",
            Self::Stroke => "stroke",
            Self::Headache => "headache",
            Self::Dementia => "dementia",
            Self::MultipleSclerosis => "multiple_sclerosis",
            Self::PeripheralNeuropathy => "peripheral_neuropathy",
            Self::MyastheniaGravis => "myasthenia_gravis",
            Self::SpinalCord => "spinal_cord",
            Self::MotorNeuronDisease => "motor_neuron_disease",
            Self::Unknown => "unknown",
        }
    }

    /// Human-readable name used in section headers.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Epilepsy => "Epilepsy",
            Self::Parkinsons => "Parkinson's Disease",
            Self::Stroke => "Stroke",
            Self::Headache => "Headache",
            Self::Dementia => "Dementia",
            Self::MultipleSclerosis => "Multiple Sclerosis",
            Self::PeripheralNeuropathy => "Peripheral Neuropathy",
            Self::MyastheniaGravis => "Myasthenia Gravis",
            Self::SpinalCord => "Spinal Cord Disorders",
            Self::MotorNeuronDisease => "Motor Neuron Disease",
            Self::Unknown => "Unknown",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl fmt::Display for ConditionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not in the condition vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownConditionName(pub String);

impl fmt::Display for UnknownConditionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a recognized condition", self.0)
    }
}

impl std::error::Error for UnknownConditionName {}

impl FromStr for ConditionTag {
    type Err = UnknownConditionName;

    /// Case-insensitive; spaces, hyphens and apostrophes are normalized so
    /// that "Parkinson's" and "multiple-sclerosis" resolve.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| *c != '\'')
            .map(|c| if c == ' ' || c == '-' { '_' } else { c })
            .collect();

        let tag = match normalized.as_str() {
            "epilepsy" => Self::Epilepsy,
            "parkinsons" | "parkinson" | "parkinsons_disease" => Self::Parkinsons,
            "stroke" => Self::Stroke,
            "headache" | "migraine" => Self::Headache,
            "dementia" => Self::Dementia,
            "multiple_sclerosis" => Self::MultipleSclerosis,
            "peripheral_neuropathy" => Self::PeripheralNeuropathy,
            "myasthenia_gravis" => Self::MyastheniaGravis,
            "spinal_cord" => Self::SpinalCord,
            "motor_neuron_disease" => Self::MotorNeuronDisease,
            "unknown" => Self::Unknown,
            _ => return Err(UnknownConditionName(s.to_string())),
        };
        Ok(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_as_str() {
        for tag in ConditionTag::KNOWN {
            assert_eq!(tag.as_str().parse::<ConditionTag>().unwrap(), tag);
        }
    }

    #[test]
    fn parse_normalizes_case_and_separators() {
        assert_eq!("Parkinson's".parse::<ConditionTag>().unwrap(), ConditionTag::Parkinsons);
        assert_eq!(
            "Multiple-Sclerosis".parse::<ConditionTag>().unwrap(),
            ConditionTag::MultipleSclerosis
        );
        assert_eq!(
            " motor neuron disease ".parse::<ConditionTag>().unwrap(),
            ConditionTag::MotorNeuronDisease
        );
    }

    #[test]
    fn unrecognized_name_is_an_error() {
        let err = "totally-unknown-tag".parse::<ConditionTag>().unwrap_err();
        assert!(err.to_string().contains("totally-unknown-tag"));
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&ConditionTag::MyastheniaGravis).unwrap();
        assert_eq!(json, "\"myasthenia_gravis\"");
    }

    #[test]
    fn unknown_is_not_in_known_set() {
        assert!(!ConditionTag::KNOWN.contains(&ConditionTag::Unknown));
        assert!(!ConditionTag::Unknown.is_known());
    }
}
