use crate::shared::frame::Frame;

use super::detection_candidate::DetectionCandidate;

/// Domain interface for the external object detector.
///
/// Returns zero or more candidates in the detector's own output order.
/// Inference sessions are generally not reentrant, hence `&mut self`;
/// concurrent callers go through a `DetectorPool`.
pub trait SubjectDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectionCandidate>, Box<dyn std::error::Error>>;
}
