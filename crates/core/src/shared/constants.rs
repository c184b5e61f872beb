/// Default ONNX model file name looked up in the model cache.
pub const YOLO_MODEL_NAME: &str = "yolov8n.onnx";

/// COCO class index for "person".
pub const PERSON_CLASS_ID: u32 = 0;

pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp", "gif", "avif",
];

/// Prefix given to every cropped output file name.
pub const OUTPUT_PREFIX: &str = "trimmed_";

/// Extension of every cropped output file (lossless PNG).
pub const OUTPUT_EXTENSION: &str = "png";
