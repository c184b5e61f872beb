use crate::shared::bounding_box::BoundingBox;

use super::crop_policy::{round_px, CropPolicy};
use super::focus_mode::FocusMode;

/// Pads `bbox` on every side, then applies the focus bias to the padded box.
pub fn pad_and_focus(
    bbox: &BoundingBox,
    image_w: u32,
    image_h: u32,
    focus: FocusMode,
    policy: &CropPolicy,
) -> BoundingBox {
    let padded = pad(bbox, image_w, image_h, policy.padding_ratio);
    apply_focus(&padded, image_w, image_h, focus, policy)
}

/// Expands the box by `round(height * padding_ratio)` on all four sides,
/// clamped to the image.
pub fn pad(bbox: &BoundingBox, image_w: u32, image_h: u32, padding_ratio: f64) -> BoundingBox {
    let pad = round_px(bbox.height() as f64 * padding_ratio);
    BoundingBox::clamped(
        bbox.x1() - pad,
        bbox.y1() - pad,
        bbox.x2() + pad,
        bbox.y2() + pad,
        image_w,
        image_h,
    )
}

/// Biases the box vertically according to `focus`.
///
/// - `Upper` truncates the bottom, keeping `y1` fixed.
/// - `Lower` translates the whole box down, or leaves it alone when the
///   shifted box would leave the image.
/// - `Full` returns the box unchanged.
pub fn apply_focus(
    bbox: &BoundingBox,
    image_w: u32,
    image_h: u32,
    focus: FocusMode,
    policy: &CropPolicy,
) -> BoundingBox {
    let height = bbox.height() as f64;
    match focus {
        FocusMode::Full => *bbox,
        FocusMode::Upper => {
            let keep = round_px(height * policy.upper_fraction).max(1);
            let y2 = (bbox.y1() + keep).min(image_h as i32);
            BoundingBox::clamped(bbox.x1(), bbox.y1(), bbox.x2(), y2, image_w, image_h)
        }
        FocusMode::Lower => {
            let shift = round_px(height * policy.lower_shift_fraction);
            if bbox.y2() + shift <= image_h as i32 {
                BoundingBox::clamped(
                    bbox.x1(),
                    bbox.y1() + shift,
                    bbox.x2(),
                    bbox.y2() + shift,
                    image_w,
                    image_h,
                )
            } else {
                *bbox
            }
        }
    }
}
