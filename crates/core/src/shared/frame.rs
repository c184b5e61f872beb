use ndarray::ArrayView3;

use super::bounding_box::BoundingBox;

/// Number of interleaved color channels in every frame.
pub const CHANNELS: usize = 3;

/// A decoded image: contiguous 8-bit RGB bytes in row-major order.
///
/// Color-space normalization happens at I/O boundaries only; every crop
/// stage sees three-channel data and returns a new `Frame` rather than
/// aliasing its input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * CHANNELS,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
        }
    }

    /// A frame filled with one color.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * CHANNELS)
            .collect();
        Self::new(data, width, height)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let i = (y as usize * self.width as usize + x as usize) * CHANNELS;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        let i = (y as usize * self.width as usize + x as usize) * CHANNELS;
        self.data[i..i + CHANNELS].copy_from_slice(&rgb);
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Copies the pixels inside `bbox` into a new frame.
    ///
    /// The box is clamped to this frame first, so the result is never empty
    /// for a non-empty frame.
    pub fn crop(&self, bbox: &BoundingBox) -> Frame {
        let b = BoundingBox::clamped(
            bbox.x1(),
            bbox.y1(),
            bbox.x2(),
            bbox.y2(),
            self.width,
            self.height,
        );
        let (x1, y1, x2, y2) = (
            b.x1() as usize,
            b.y1() as usize,
            b.x2() as usize,
            b.y2() as usize,
        );
        let stride = self.width as usize * CHANNELS;
        let row_len = (x2 - x1) * CHANNELS;

        let mut data = Vec::with_capacity(row_len * (y2 - y1));
        for row in y1..y2 {
            let start = row * stride + x1 * CHANNELS;
            data.extend_from_slice(&self.data[start..start + row_len]);
        }

        Frame::new(data, b.width() as u32, b.height() as u32)
    }

    fn shape(&self) -> (usize, usize, usize) {
        (self.height as usize, self.width as usize, CHANNELS)
    }
}
