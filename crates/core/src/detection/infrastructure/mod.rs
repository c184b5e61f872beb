pub mod detector_pool;
pub mod execution_provider;
pub mod model_resolver;
pub mod onnx_yolo_detector;
