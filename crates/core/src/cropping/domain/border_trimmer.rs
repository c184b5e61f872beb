use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// Removes flat-color margins, using the top-left pixel as background.
///
/// Each pass crops to the bounding rectangle of pixels whose luminance
/// difference from the corner color exceeds `tolerance`. Passes repeat until
/// the rectangle stops shrinking, so trimming an already trimmed frame is a
/// no-op. A frame that is entirely background is returned unchanged.
pub fn trim_uniform_border(frame: &Frame, tolerance: u8) -> Frame {
    let mut current = frame.clone();
    while let Some(bounds) = content_bounds(&current, tolerance) {
        if bounds.width() as u32 == current.width() && bounds.height() as u32 == current.height()
        {
            break;
        }
        current = current.crop(&bounds);
    }
    current
}

/// Bounding rectangle of pixels differing from the top-left pixel by more
/// than `tolerance`, or `None` if every pixel is within tolerance.
pub fn content_bounds(frame: &Frame, tolerance: u8) -> Option<BoundingBox> {
    if frame.is_empty() {
        return None;
    }
    let background = frame.pixel(0, 0);
    let width = frame.width() as usize;

    let mut min_x = usize::MAX;
    let mut min_y = usize::MAX;
    let mut max_x = 0usize;
    let mut max_y = 0usize;

    for (i, px) in frame.data().chunks_exact(3).enumerate() {
        if difference_luma(px, &background) > tolerance {
            let (x, y) = (i % width, i / width);
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
    }

    if min_x == usize::MAX {
        return None;
    }
    BoundingBox::new(
        min_x as i32,
        min_y as i32,
        max_x as i32 + 1,
        max_y as i32 + 1,
    )
}

/// ITU-R 601-2 luma of the per-channel absolute difference, in fixed point.
fn difference_luma(px: &[u8], background: &[u8; 3]) -> u8 {
    let dr = px[0].abs_diff(background[0]) as u32;
    let dg = px[1].abs_diff(background[1]) as u32;
    let db = px[2].abs_diff(background[2]) as u32;
    ((dr * 19595 + dg * 38470 + db * 7471 + 0x8000) >> 16) as u8
}
