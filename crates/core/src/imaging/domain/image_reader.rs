use std::path::Path;

use crate::shared::frame::Frame;

/// Decodes a still image into an 8-bit RGB frame.
///
/// Implementations are shared by batch workers, so they must be `Sync`.
pub trait ImageReader: Send + Sync {
    /// Reads and decodes the image at `path`.
    fn read(&self, path: &Path) -> Result<Frame, Box<dyn std::error::Error>>;
}
