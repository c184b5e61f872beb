/// COCO object detector using a YOLOv8 ONNX model via `ort`.
///
/// Handles letterbox preprocessing, inference, per-row class selection and
/// class-aware NMS. Boxes are mapped back to source-frame pixels.
use std::path::Path;

use crate::detection::domain::detection_candidate::DetectionCandidate;
use crate::detection::domain::subject_detector::SubjectDetector;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

use super::execution_provider::preferred_execution_providers;

/// Fallback YOLO model input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 640;

/// Detector-level confidence floor. Subject selection applies its own,
/// usually stricter, threshold afterwards.
pub const DEFAULT_CONFIDENCE: f64 = 0.25;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f64 = 0.45;

/// Box geometry occupies the first four values of every prediction row.
const BOX_VALUES: usize = 4;

/// YOLO detector backed by an ONNX Runtime session.
pub struct OnnxYoloDetector {
    session: ort::session::Session,
    confidence: f64,
    input_size: u32,
}

impl OnnxYoloDetector {
    /// Load a YOLO ONNX model and prepare for inference.
    ///
    /// The input resolution is read from the model's input shape (expecting NCHW).
    /// Falls back to 640 if the shape is dynamic or unreadable.
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let session = ort::session::Session::builder()?
            .with_execution_providers(preferred_execution_providers())?
            .commit_from_file(model_path)?;

        let input_size = session
            .inputs()
            .first()
            .and_then(|input| {
                if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                    if shape.len() >= 4 && shape[2] > 0 {
                        Some(shape[2] as u32)
                    } else {
                        None
                    }
                } else {
                    None
                }
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);

        log::debug!(
            "Loaded detector {} (input {input_size}x{input_size})",
            model_path.display()
        );

        Ok(Self {
            session,
            confidence,
            input_size,
        })
    }
}

impl SubjectDetector for OnnxYoloDetector {
    fn detect(
        &mut self,
        frame: &Frame,
    ) -> Result<Vec<DetectionCandidate>, Box<dyn std::error::Error>> {
        if frame.is_empty() {
            return Ok(Vec::new());
        }

        // 1. Preprocess: letterbox + normalize → NCHW float32
        let (input_tensor, scale, pad_x, pad_y) = letterbox(frame, self.input_size);

        // 2. Inference
        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("YOLO model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let shape = tensor.shape();
        if shape.len() != 3 {
            return Err(format!("Unexpected YOLO output shape: {shape:?}").into());
        }
        let layout = OutputLayout::from_shape(shape[1], shape[2]);
        let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;

        // 3. Parse and suppress
        let mut raw = parse_predictions(data, layout, self.confidence);
        let kept = nms(&mut raw, NMS_IOU_THRESH);

        // 4. Map back to source pixels
        let transform = Letterbox {
            scale,
            pad_x: pad_x as f64,
            pad_y: pad_y as f64,
        };
        Ok(kept
            .iter()
            .map(|d| to_candidate(d, &transform, frame.width(), frame.height()))
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Letterbox-resize a frame to `target_size` × `target_size`.
///
/// Returns `(NCHW float32 tensor, scale, pad_x, pad_y)`.
fn letterbox(frame: &Frame, target_size: u32) -> (ndarray::Array4<f32>, f64, u32, u32) {
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).clamp(1, target_size);
    let new_h = ((fh * scale).round() as u32).clamp(1, target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    // Padding is 114/255 gray, the YOLO training convention
    let gray = 114.0f32 / 255.0;
    let mut tensor =
        ndarray::Array4::<f32>::from_elem((1, 3, target_size as usize, target_size as usize), gray);

    let src = frame.as_ndarray(); // [H, W, C] u8
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;

    // Nearest-neighbor resize + copy into padded region
    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    (tensor, scale, pad_x, pad_y)
}

// ---------------------------------------------------------------------------
// Postprocessing
// ---------------------------------------------------------------------------

/// Prediction tensor layout: `[1, features, detections]` (YOLOv8 export
/// default) or `[1, detections, features]`.
#[derive(Clone, Copy, Debug, PartialEq)]
struct OutputLayout {
    num_dets: usize,
    num_feats: usize,
    transposed: bool,
}

impl OutputLayout {
    fn from_shape(dim1: usize, dim2: usize) -> Self {
        if dim1 < dim2 {
            Self {
                num_dets: dim2,
                num_feats: dim1,
                transposed: true,
            }
        } else {
            Self {
                num_dets: dim1,
                num_feats: dim2,
                transposed: false,
            }
        }
    }

    fn value(&self, data: &[f32], det: usize, feat: usize) -> f32 {
        if self.transposed {
            data[feat * self.num_dets + det]
        } else {
            data[det * self.num_feats + feat]
        }
    }
}

/// Maps letterboxed model coordinates back to the source frame.
struct Letterbox {
    scale: f64,
    pad_x: f64,
    pad_y: f64,
}

#[derive(Clone, Debug)]
struct RawDetection {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    class_id: u32,
    confidence: f64,
}

/// Decodes rows of `[cx, cy, w, h, score_0, .., score_k]` in model space,
/// keeping the best-scoring class per row when it clears `confidence`.
fn parse_predictions(data: &[f32], layout: OutputLayout, confidence: f64) -> Vec<RawDetection> {
    if layout.num_feats <= BOX_VALUES {
        return Vec::new();
    }
    let mut dets = Vec::new();
    for i in 0..layout.num_dets {
        let mut best_class = 0usize;
        let mut best_score = f32::MIN;
        for c in 0..layout.num_feats - BOX_VALUES {
            let score = layout.value(data, i, BOX_VALUES + c);
            if score > best_score {
                best_score = score;
                best_class = c;
            }
        }
        let score = best_score as f64;
        if score < confidence {
            continue;
        }

        let cx = layout.value(data, i, 0) as f64;
        let cy = layout.value(data, i, 1) as f64;
        let w = layout.value(data, i, 2) as f64;
        let h = layout.value(data, i, 3) as f64;

        dets.push(RawDetection {
            x1: cx - w / 2.0,
            y1: cy - h / 2.0,
            x2: cx + w / 2.0,
            y2: cy + h / 2.0,
            class_id: best_class as u32,
            confidence: score,
        });
    }
    dets
}

fn to_candidate(d: &RawDetection, t: &Letterbox, fw: u32, fh: u32) -> DetectionCandidate {
    let bbox = BoundingBox::from_detection(
        (d.x1 - t.pad_x) / t.scale,
        (d.y1 - t.pad_y) / t.scale,
        (d.x2 - t.pad_x) / t.scale,
        (d.y2 - t.pad_y) / t.scale,
        fw,
        fh,
    );
    DetectionCandidate::new(bbox, d.class_id, d.confidence)
}

/// Class-aware greedy NMS: sort by confidence descending, suppress
/// overlapping boxes of the same class.
fn nms(dets: &mut [RawDetection], iou_thresh: f64) -> Vec<RawDetection> {
    dets.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep = Vec::new();
    let mut suppressed = vec![false; dets.len()];

    for i in 0..dets.len() {
        if suppressed[i] {
            continue;
        }
        keep.push(dets[i].clone());
        for j in (i + 1)..dets.len() {
            if suppressed[j] || dets[j].class_id != dets[i].class_id {
                continue;
            }
            let iou = bbox_iou(
                &[dets[i].x1, dets[i].y1, dets[i].x2, dets[i].y2],
                &[dets[j].x1, dets[j].y1, dets[j].x2, dets[j].y2],
            );
            if iou > iou_thresh {
                suppressed[j] = true;
            }
        }
    }
    keep
}

fn bbox_iou(a: &[f64; 4], b: &[f64; 4]) -> f64 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    if inter == 0.0 {
        return 0.0;
    }
    let area_a = (a[2] - a[0]) * (a[3] - a[1]);
    let area_b = (b[2] - b[0]) * (b[3] - b[1]);
    inter / (area_a + area_b - inter)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
