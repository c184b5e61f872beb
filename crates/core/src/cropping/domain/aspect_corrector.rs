use crate::shared::bounding_box::BoundingBox;

use super::crop_policy::round_px;

/// Forces `bbox` to `target_aspect` (width over height).
///
/// A box that is too wide is narrowed symmetrically around its horizontal
/// center. Otherwise the height is set to `round(width / target_aspect)`
/// measured from `y1`, capped at the image bottom. `y1` never moves, which
/// keeps a head-and-shoulders subject anchored near the top.
pub fn correct_aspect(
    bbox: &BoundingBox,
    image_w: u32,
    image_h: u32,
    target_aspect: f64,
) -> BoundingBox {
    if bbox.aspect() > target_aspect {
        let new_w = round_px(bbox.height() as f64 * target_aspect).max(1);
        let x1 = bbox.center_x() - new_w / 2;
        BoundingBox::clamped(x1, bbox.y1(), x1 + new_w, bbox.y2(), image_w, image_h)
    } else {
        let new_h = round_px(bbox.width() as f64 / target_aspect).max(1);
        let y2 = (bbox.y1() + new_h).min(image_h as i32);
        BoundingBox::clamped(bbox.x1(), bbox.y1(), bbox.x2(), y2, image_w, image_h)
    }
}
