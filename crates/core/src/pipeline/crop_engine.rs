use std::sync::Arc;

use crate::cropping::domain::aspect_corrector::correct_aspect;
use crate::cropping::domain::border_trimmer::trim_uniform_border;
use crate::cropping::domain::box_adjuster::pad_and_focus;
use crate::cropping::domain::crop_policy::{CropPolicy, NoSubjectFallback};
use crate::cropping::domain::focus_mode::FocusMode;
use crate::cropping::infrastructure::canonical_resizer::fit_to_canvas;
use crate::detection::domain::detection_candidate::DetectionCandidate;
use crate::detection::domain::subject_selector::select_subject;
use crate::detection::infrastructure::detector_pool::DetectorPool;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

use super::skipped::Skipped;

/// Geometry decided for one image before any pixels are touched.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CropPlan {
    /// A subject was found; each stage's box is kept for diagnostics.
    Subject {
        detected: BoundingBox,
        adjusted: BoundingBox,
        corrected: BoundingBox,
    },
    /// No subject, full-image fallback: the whole frame goes straight to the
    /// resizer.
    FullImage,
}

impl CropPlan {
    /// Final crop rectangle, `None` for the full-image fallback.
    pub fn crop_box(&self) -> Option<BoundingBox> {
        match self {
            Self::Subject { corrected, .. } => Some(*corrected),
            Self::FullImage => None,
        }
    }
}

/// Turns a decoded image into its canonical catalog crop.
///
/// `detect → select → pad/focus → aspect → crop → trim → resize`. The engine
/// holds no per-image state, so one instance serves any number of threads;
/// detector access is arbitrated by the shared [`DetectorPool`].
pub struct CropEngine {
    detectors: Arc<DetectorPool>,
    policy: CropPolicy,
}

impl CropEngine {
    pub fn new(detectors: Arc<DetectorPool>, policy: CropPolicy) -> Self {
        Self { detectors, policy }
    }

    /// Runs the full pipeline on `frame`.
    pub fn process(&self, frame: &Frame, focus: FocusMode) -> Result<Frame, Skipped> {
        let plan = self.plan(frame, focus)?;
        Ok(self.render(frame, &plan))
    }

    /// Runs detection and box geometry only.
    pub fn plan(&self, frame: &Frame, focus: FocusMode) -> Result<CropPlan, Skipped> {
        let candidates = self
            .detectors
            .detect(frame)
            .map_err(Skipped::DetectorFailed)?;
        log::debug!("Detector returned {} candidates", candidates.len());
        plan_from_candidates(&candidates, frame.width(), frame.height(), focus, &self.policy)
    }

    /// Applies a plan to the pixels of `frame`.
    pub fn render(&self, frame: &Frame, plan: &CropPlan) -> Frame {
        let policy = &self.policy;
        let region = match plan.crop_box() {
            Some(bbox) => trim_uniform_border(&frame.crop(&bbox), policy.border_tolerance),
            None => frame.clone(),
        };
        log::debug!("Resizing {}x{} region", region.width(), region.height());
        fit_to_canvas(
            &region,
            policy.output_width,
            policy.output_height,
            policy.bleed,
        )
    }
}

/// Pure geometry stage: chooses the subject and derives every box from it.
pub fn plan_from_candidates(
    candidates: &[DetectionCandidate],
    image_w: u32,
    image_h: u32,
    focus: FocusMode,
    policy: &CropPolicy,
) -> Result<CropPlan, Skipped> {
    let Some(detected) =
        select_subject(candidates, policy.selection, policy.confidence_threshold)
    else {
        return match policy.fallback {
            NoSubjectFallback::Skip => Err(Skipped::NoSubjectDetected),
            NoSubjectFallback::FullImage => {
                log::debug!("No subject, falling back to full image");
                Ok(CropPlan::FullImage)
            }
        };
    };

    let adjusted = pad_and_focus(&detected, image_w, image_h, focus, policy);
    let corrected = correct_aspect(&adjusted, image_w, image_h, policy.target_aspect);
    log::debug!("Subject {detected} → adjusted {adjusted} → corrected {corrected}");

    Ok(CropPlan::Subject {
        detected,
        adjusted,
        corrected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::subject_detector::SubjectDetector;
    use crate::detection::domain::subject_selector::SelectionPolicy;
    use std::sync::Mutex;

    // ── Stubs ──

    struct StubDetector {
        candidates: Vec<DetectionCandidate>,
        calls: Arc<Mutex<usize>>,
    }

    impl SubjectDetector for StubDetector {
        fn detect(
            &mut self,
            _frame: &Frame,
        ) -> Result<Vec<DetectionCandidate>, Box<dyn std::error::Error>> {
            *self.calls.lock().unwrap() += 1;
            Ok(self.candidates.clone())
        }
    }

    struct FailingDetector;

    impl SubjectDetector for FailingDetector {
        fn detect(
            &mut self,
            _frame: &Frame,
        ) -> Result<Vec<DetectionCandidate>, Box<dyn std::error::Error>> {
            Err("session crashed".into())
        }
    }

    fn person(x1: i32, y1: i32, x2: i32, y2: i32, confidence: f64) -> DetectionCandidate {
        DetectionCandidate::new(BoundingBox::new(x1, y1, x2, y2).unwrap(), 0, confidence)
    }

    fn engine_with(candidates: Vec<DetectionCandidate>, policy: CropPolicy) -> CropEngine {
        let detector = StubDetector {
            candidates,
            calls: Arc::new(Mutex::new(0)),
        };
        let pool = DetectorPool::new(vec![Box::new(detector)]).unwrap();
        CropEngine::new(Arc::new(pool), policy)
    }

    /// White studio backdrop with a solid figure where the detector says.
    fn studio_photo(w: u32, h: u32, figure: (u32, u32, u32, u32)) -> Frame {
        let mut frame = Frame::filled(w, h, [255, 255, 255]);
        for y in figure.1..figure.3 {
            for x in figure.0..figure.2 {
                frame.set_pixel(x, y, [60, 40, 30]);
            }
        }
        frame
    }

    // ── Geometry ──

    #[test]
    fn test_full_focus_plan() {
        let candidates = vec![person(400, 300, 1200, 2600, 0.9)];
        let plan =
            plan_from_candidates(&candidates, 2000, 3000, FocusMode::Full, &CropPolicy::default())
                .unwrap();

        // Height 2300 → pad 460, clamped to the image on three sides
        assert_eq!(
            plan,
            CropPlan::Subject {
                detected: BoundingBox::new(400, 300, 1200, 2600).unwrap(),
                adjusted: BoundingBox::new(0, 0, 1660, 3000).unwrap(),
                corrected: BoundingBox::new(0, 0, 1660, 2213).unwrap(),
            }
        );
    }

    #[test]
    fn test_upper_focus_keeps_top_and_shortens() {
        let candidates = vec![person(400, 300, 1200, 2600, 0.9)];
        let policy = CropPolicy::default();
        let full = plan_from_candidates(&candidates, 2000, 3000, FocusMode::Full, &policy).unwrap();
        let upper =
            plan_from_candidates(&candidates, 2000, 3000, FocusMode::Upper, &policy).unwrap();

        let (
            CropPlan::Subject { adjusted: full_adj, .. },
            CropPlan::Subject {
                adjusted: upper_adj,
                corrected: upper_corr,
                ..
            },
        ) = (full, upper)
        else {
            panic!("expected subject plans");
        };
        assert_eq!(upper_adj.y1(), full_adj.y1());
        assert_eq!(upper_adj.height(), 2100);
        assert_eq!(upper_corr.as_tuple(), (43, 0, 1618, 2100));
    }

    #[test]
    fn test_no_subject_skips_by_default() {
        let candidates = vec![person(0, 0, 10, 10, 0.2)];
        let result =
            plan_from_candidates(&candidates, 100, 100, FocusMode::Full, &CropPolicy::default());
        assert_eq!(result, Err(Skipped::NoSubjectDetected));
    }

    #[test]
    fn test_no_subject_full_image_fallback() {
        let policy = CropPolicy {
            fallback: NoSubjectFallback::FullImage,
            ..CropPolicy::default()
        };
        let plan = plan_from_candidates(&[], 100, 100, FocusMode::Full, &policy).unwrap();
        assert_eq!(plan, CropPlan::FullImage);
        assert!(plan.crop_box().is_none());
    }

    #[test]
    fn test_largest_any_class_selection() {
        let policy = CropPolicy {
            selection: SelectionPolicy::LargestAnyClass,
            ..CropPolicy::default()
        };
        let candidates = vec![
            person(0, 0, 10, 10, 0.99),
            DetectionCandidate::new(BoundingBox::new(20, 20, 80, 90).unwrap(), 24, 0.1),
        ];
        let plan = plan_from_candidates(&candidates, 100, 100, FocusMode::Full, &policy).unwrap();
        match plan {
            CropPlan::Subject { detected, .. } => assert_eq!(detected.as_tuple(), (20, 20, 80, 90)),
            CropPlan::FullImage => panic!("expected subject"),
        }
    }

    // ── End to end ──

    #[test]
    fn test_process_yields_canonical_size() {
        let frame = studio_photo(2000, 3000, (400, 300, 1200, 2600));
        let engine = engine_with(
            vec![person(400, 300, 1200, 2600, 0.9)],
            CropPolicy::default(),
        );
        let out = engine.process(&frame, FocusMode::Full).unwrap();
        assert_eq!((out.width(), out.height()), (750, 900));
    }

    #[rstest::rstest]
    fn test_every_focus_yields_canonical_size(
        #[values(FocusMode::Full, FocusMode::Upper, FocusMode::Lower)] focus: FocusMode,
    ) {
        let frame = studio_photo(600, 800, (200, 100, 400, 700));
        let engine = engine_with(vec![person(200, 100, 400, 700, 0.8)], CropPolicy::default());
        let out = engine.process(&frame, focus).unwrap();
        assert_eq!((out.width(), out.height()), (750, 900));
    }

    #[test]
    fn test_process_fallback_resizes_whole_image() {
        let policy = CropPolicy {
            fallback: NoSubjectFallback::FullImage,
            output_width: 30,
            output_height: 40,
            ..CropPolicy::default()
        };
        let engine = engine_with(Vec::new(), policy);
        let out = engine
            .process(&Frame::filled(300, 200, [9, 9, 9]), FocusMode::Full)
            .unwrap();
        assert_eq!((out.width(), out.height()), (30, 40));
    }

    #[test]
    fn test_process_no_subject_is_skip() {
        let engine = engine_with(Vec::new(), CropPolicy::default());
        let err = engine
            .process(&Frame::filled(50, 50, [0, 0, 0]), FocusMode::Full)
            .unwrap_err();
        assert!(err.is_skip());
    }

    #[test]
    fn test_detector_failure_is_reported() {
        let pool = DetectorPool::new(vec![Box::new(FailingDetector)]).unwrap();
        let engine = CropEngine::new(Arc::new(pool), CropPolicy::default());
        let err = engine
            .plan(&Frame::filled(50, 50, [0, 0, 0]), FocusMode::Full)
            .unwrap_err();
        assert!(matches!(err, Skipped::DetectorFailed(ref m) if m.contains("session crashed")));
        assert!(!err.is_skip());
    }

    #[test]
    fn test_plan_calls_detector_once() {
        let calls = Arc::new(Mutex::new(0));
        let detector = StubDetector {
            candidates: vec![person(10, 10, 40, 90, 0.9)],
            calls: calls.clone(),
        };
        let pool = DetectorPool::new(vec![Box::new(detector)]).unwrap();
        let engine = CropEngine::new(Arc::new(pool), CropPolicy::default());
        engine
            .process(&studio_photo(100, 100, (10, 10, 40, 90)), FocusMode::Full)
            .unwrap();
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[test]
    fn test_render_trims_studio_margin() {
        // Figure occupies the middle of the crop; trimming must remove the
        // white margin so the figure color reaches the output corners.
        let frame = studio_photo(400, 400, (150, 100, 250, 300));
        let policy = CropPolicy {
            output_width: 30,
            output_height: 40,
            ..CropPolicy::default()
        };
        let engine = engine_with(vec![person(150, 100, 250, 300, 0.9)], policy);
        let out = engine.process(&frame, FocusMode::Full).unwrap();
        for (x, y) in [(0, 0), (29, 0), (0, 39), (29, 39)] {
            let px = out.pixel(x, y);
            for (got, want) in px.iter().zip([60u8, 40, 30]) {
                assert!(got.abs_diff(want) <= 1, "({x}, {y}) = {px:?}");
            }
        }
    }
}
