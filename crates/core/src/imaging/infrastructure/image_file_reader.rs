use std::path::Path;

use image::{DynamicImage, ImageFormat};

use crate::imaging::domain::image_reader::ImageReader;
use crate::shared::frame::Frame;

/// Decodes image files with the `image` crate.
///
/// Every color type (grayscale, alpha, 16-bit) is normalized to 8-bit RGB.
/// Alpha is dropped rather than composited. Animated formats yield their
/// first frame. AVIF needs the `avif` feature, which links the system dav1d
/// decoder.
pub struct ImageFileReader;

const AVIF_ENABLED: bool = cfg!(feature = "avif");

impl ImageFileReader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileReader {
    fn default() -> Self {
        Self::new()
    }
}

fn to_frame(img: DynamicImage) -> Result<Frame, Box<dyn std::error::Error>> {
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    if width == 0 || height == 0 {
        return Err("Image has no pixels".into());
    }
    Ok(Frame::new(rgb.into_raw(), width, height))
}

impl ImageReader for ImageFileReader {
    fn read(&self, path: &Path) -> Result<Frame, Box<dyn std::error::Error>> {
        let reader = image::ImageReader::open(path)?.with_guessed_format()?;
        if reader.format() == Some(ImageFormat::Avif) && !AVIF_ENABLED {
            return Err("AVIF decoding is not enabled in this build (feature `avif`)".into());
        }
        to_frame(reader.decode()?)
    }
}
