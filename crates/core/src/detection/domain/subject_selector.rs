use serde::{Deserialize, Serialize};

use crate::shared::bounding_box::BoundingBox;

use super::detection_candidate::DetectionCandidate;

/// Default minimum confidence for a person candidate to be considered.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.5;

/// How the single subject is chosen from raw detector output.
///
/// Exactly one policy is active for a run; they are never combined.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Person-class candidates at or above the threshold; highest confidence
    /// wins, and on an exact tie the first one in detector order wins.
    #[default]
    HighestConfidencePerson,
    /// Largest box by area regardless of class or confidence; on an exact
    /// tie the first one in detector order wins.
    LargestAnyClass,
}

impl std::str::FromStr for SelectionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "person" | "highest_confidence_person" => Ok(Self::HighestConfidencePerson),
            "largest" | "largest_any_class" => Ok(Self::LargestAnyClass),
            other => Err(format!(
                "Selection must be 'person' or 'largest', got '{other}'"
            )),
        }
    }
}

impl std::fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HighestConfidencePerson => write!(f, "person"),
            Self::LargestAnyClass => write!(f, "largest"),
        }
    }
}

/// Picks the subject box from `candidates`, or `None` if nothing qualifies.
pub fn select_subject(
    candidates: &[DetectionCandidate],
    policy: SelectionPolicy,
    confidence_threshold: f64,
) -> Option<BoundingBox> {
    match policy {
        SelectionPolicy::HighestConfidencePerson => candidates
            .iter()
            .filter(|c| c.is_person() && c.confidence >= confidence_threshold)
            .fold(None, |best: Option<&DetectionCandidate>, c| match best {
                Some(b) if b.confidence >= c.confidence => Some(b),
                _ => Some(c),
            })
            .map(|c| c.bbox),
        SelectionPolicy::LargestAnyClass => candidates
            .iter()
            .fold(None, |best: Option<&DetectionCandidate>, c| match best {
                Some(b) if b.bbox.area() >= c.bbox.area() => Some(b),
                _ => Some(c),
            })
            .map(|c| c.bbox),
    }
}
