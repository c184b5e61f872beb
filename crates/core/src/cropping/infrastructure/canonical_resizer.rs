use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::shared::frame::Frame;

/// Scales and center-crops a frame to exactly `out_w` × `out_h`.
///
/// The source is first shrunk by `bleed` (a fraction of each dimension,
/// removed from both edges of that axis) and then cropped around its center to the output aspect
/// ratio before a Lanczos resample. The output dimensions are exact for any
/// non-empty input.
pub fn fit_to_canvas(frame: &Frame, out_w: u32, out_h: u32, bleed: f64) -> Frame {
    let (left, top, crop_w, crop_h) =
        centered_crop_window(frame.width(), frame.height(), out_w, out_h, bleed);

    let img = RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
        .expect("Frame data length must match dimensions");
    let window = imageops::crop_imm(&img, left, top, crop_w, crop_h).to_image();
    let resized = imageops::resize(&window, out_w, out_h, FilterType::Lanczos3);

    Frame::new(resized.into_raw(), out_w, out_h)
}

/// Source window `(left, top, width, height)` sampled by [`fit_to_canvas`].
///
/// The window is never empty and always lies inside the source.
pub fn centered_crop_window(
    src_w: u32,
    src_h: u32,
    out_w: u32,
    out_h: u32,
    bleed: f64,
) -> (u32, u32, u32, u32) {
    let (w, h) = (src_w as f64, src_h as f64);
    let bleed = bleed.clamp(0.0, 0.49);
    let bleed_x = bleed * w;
    let bleed_y = bleed * h;
    let live_w = w - 2.0 * bleed_x;
    let live_h = h - 2.0 * bleed_y;

    let live_ratio = live_w / live_h;
    let out_ratio = out_w as f64 / out_h as f64;

    let (crop_w, crop_h) = if (live_ratio - out_ratio).abs() < f64::EPSILON {
        (live_w, live_h)
    } else if live_ratio > out_ratio {
        (out_ratio * live_h, live_h)
    } else {
        (live_w, live_w / out_ratio)
    };

    let left = bleed_x + (live_w - crop_w) * 0.5;
    let top = bleed_y + (live_h - crop_h) * 0.5;

    let crop_w = (crop_w.round() as u32).clamp(1, src_w.max(1));
    let crop_h = (crop_h.round() as u32).clamp(1, src_h.max(1));
    let left = (left.round().max(0.0) as u32).min(src_w.saturating_sub(crop_w));
    let top = (top.round().max(0.0) as u32).min(src_h.saturating_sub(crop_h));

    (left, top, crop_w, crop_h)
}
