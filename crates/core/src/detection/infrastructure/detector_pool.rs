use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::detection::domain::detection_candidate::DetectionCandidate;
use crate::detection::domain::subject_detector::SubjectDetector;
use crate::shared::frame::Frame;

/// Shares a fixed set of detector instances between worker threads.
///
/// Each instance sits behind its own `Mutex` and calls are dispatched
/// round-robin, so at most `len()` inferences run at once. A pool of one is
/// the fully serialized variant.
pub struct DetectorPool {
    detectors: Vec<Mutex<Box<dyn SubjectDetector>>>,
    next: AtomicUsize,
}

impl DetectorPool {
    pub fn new(detectors: Vec<Box<dyn SubjectDetector>>) -> Result<Self, Box<dyn std::error::Error>> {
        if detectors.is_empty() {
            return Err("Detector pool needs at least one detector".into());
        }
        Ok(Self {
            detectors: detectors.into_iter().map(Mutex::new).collect(),
            next: AtomicUsize::new(0),
        })
    }

    /// Builds `size` detectors with `factory`, failing on the first error.
    pub fn build<F>(size: usize, mut factory: F) -> Result<Self, Box<dyn std::error::Error>>
    where
        F: FnMut() -> Result<Box<dyn SubjectDetector>, Box<dyn std::error::Error>>,
    {
        let detectors = (0..size.max(1))
            .map(|_| factory())
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(detectors)
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    /// Runs detection on the next instance in rotation.
    ///
    /// Errors are flattened to strings so the result can cross threads.
    pub fn detect(&self, frame: &Frame) -> Result<Vec<DetectionCandidate>, String> {
        let slot = self.next.fetch_add(1, Ordering::Relaxed) % self.detectors.len();
        let mut detector = self.detectors[slot]
            .lock()
            .map_err(|_| "Detector lock poisoned".to_string())?;
        detector.detect(frame).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex as StdMutex};

    use crate::shared::bounding_box::BoundingBox;

    /// Records which instance served each call.
    struct TaggedDetector {
        tag: usize,
        calls: Arc<StdMutex<Vec<usize>>>,
    }

    impl SubjectDetector for TaggedDetector {
        fn detect(
            &mut self,
            frame: &Frame,
        ) -> Result<Vec<DetectionCandidate>, Box<dyn std::error::Error>> {
            self.calls.lock().unwrap().push(self.tag);
            Ok(vec![DetectionCandidate::new(
                BoundingBox::full(frame.width(), frame.height()),
                0,
                0.9,
            )])
        }
    }

    struct FailingDetector;

    impl SubjectDetector for FailingDetector {
        fn detect(
            &mut self,
            _frame: &Frame,
        ) -> Result<Vec<DetectionCandidate>, Box<dyn std::error::Error>> {
            Err("inference failed".into())
        }
    }

    fn tagged_pool(size: usize) -> (DetectorPool, Arc<StdMutex<Vec<usize>>>) {
        let calls = Arc::new(StdMutex::new(Vec::new()));
        let mut tag = 0;
        let pool = DetectorPool::build(size, || {
            tag += 1;
            Ok(Box::new(TaggedDetector {
                tag,
                calls: calls.clone(),
            }) as Box<dyn SubjectDetector>)
        })
        .unwrap();
        (pool, calls)
    }

    #[test]
    fn test_empty_pool_is_rejected() {
        assert!(DetectorPool::new(Vec::new()).is_err());
    }

    #[test]
    fn test_build_zero_gives_single_instance() {
        let (pool, _) = tagged_pool(0);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_dispatch_is_round_robin() {
        let (pool, calls) = tagged_pool(3);
        let frame = Frame::filled(4, 4, [0, 0, 0]);
        for _ in 0..6 {
            pool.detect(&frame).unwrap();
        }
        assert_eq!(*calls.lock().unwrap(), vec![1, 2, 3, 1, 2, 3]);
    }

    #[test]
    fn test_detector_error_is_reported() {
        let pool = DetectorPool::new(vec![Box::new(FailingDetector)]).unwrap();
        let err = pool.detect(&Frame::filled(2, 2, [0, 0, 0])).unwrap_err();
        assert!(err.contains("inference failed"));
    }

    #[test]
    fn test_shared_across_threads() {
        let (pool, calls) = tagged_pool(2);
        let pool = Arc::new(pool);
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let pool = pool.clone();
                std::thread::spawn(move || {
                    let frame = Frame::filled(8, 8, [1, 2, 3]);
                    pool.detect(&frame).unwrap().len()
                })
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), 1);
        }
        assert_eq!(calls.lock().unwrap().len(), 4);
    }

    #[test]
    fn test_build_propagates_factory_error() {
        let result = DetectorPool::build(2, || Err("model missing".into()));
        assert!(result.is_err());
    }
}
