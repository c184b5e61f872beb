use crate::shared::bounding_box::BoundingBox;
use crate::shared::constants::PERSON_CLASS_ID;

/// One raw detector hit: a box, its class, and the detector's confidence.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectionCandidate {
    pub bbox: BoundingBox,
    pub class_id: u32,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
}

impl DetectionCandidate {
    pub fn new(bbox: BoundingBox, class_id: u32, confidence: f64) -> Self {
        Self {
            bbox,
            class_id,
            confidence,
        }
    }

    pub fn is_person(&self) -> bool {
        self.class_id == PERSON_CLASS_ID
    }
}
