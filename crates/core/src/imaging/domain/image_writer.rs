use std::path::Path;

use crate::shared::frame::Frame;

/// Persists a finished frame.
pub trait ImageWriter: Send + Sync {
    /// Writes `frame` to `path`, replacing any existing file.
    fn write(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;
}
