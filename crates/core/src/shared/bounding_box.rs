/// Axis-aligned box in pixel coordinates as `(x1, y1, x2, y2)`.
///
/// `x2`/`y2` are exclusive. Every constructor guarantees `x1 < x2` and
/// `y1 < y2`, so a box always has positive area. Values are immutable: each
/// crop stage returns a new box instead of mutating its input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    x1: i32,
    y1: i32,
    x2: i32,
    y2: i32,
}

impl BoundingBox {
    /// Returns `None` unless `x1 < x2` and `y1 < y2`.
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Option<Self> {
        (x1 < x2 && y1 < y2).then_some(Self { x1, y1, x2, y2 })
    }

    /// Builds a box clamped to `[0, image_w] × [0, image_h]`.
    ///
    /// Never degenerates: if clamping collapses an axis, that axis keeps a
    /// single pixel at the nearest valid position. Image dimensions of zero
    /// are treated as one.
    pub fn clamped(x1: i32, y1: i32, x2: i32, y2: i32, image_w: u32, image_h: u32) -> Self {
        let (x1, x2) = clamp_axis(x1, x2, image_w);
        let (y1, y2) = clamp_axis(y1, y2, image_h);
        Self { x1, y1, x2, y2 }
    }

    /// The box covering an entire image.
    pub fn full(image_w: u32, image_h: u32) -> Self {
        Self::clamped(0, 0, image_w as i32, image_h as i32, image_w, image_h)
    }

    /// Converts detector output (floating point, possibly out of frame) into
    /// a clamped integer box. Coordinates are truncated toward zero.
    pub fn from_detection(x1: f64, y1: f64, x2: f64, y2: f64, image_w: u32, image_h: u32) -> Self {
        Self::clamped(x1 as i32, y1 as i32, x2 as i32, y2 as i32, image_w, image_h)
    }

    pub fn x1(&self) -> i32 {
        self.x1
    }

    pub fn y1(&self) -> i32 {
        self.y1
    }

    pub fn x2(&self) -> i32 {
        self.x2
    }

    pub fn y2(&self) -> i32 {
        self.y2
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    /// Width over height.
    pub fn aspect(&self) -> f64 {
        self.width() as f64 / self.height() as f64
    }

    pub fn area(&self) -> i64 {
        self.width() as i64 * self.height() as i64
    }

    /// Integer horizontal center, rounded toward the left edge.
    pub fn center_x(&self) -> i32 {
        (self.x1 + self.x2).div_euclid(2)
    }

    /// True when the box lies inside `[0, image_w] × [0, image_h]`.
    pub fn fits_within(&self, image_w: u32, image_h: u32) -> bool {
        self.x1 >= 0 && self.y1 >= 0 && self.x2 <= image_w as i32 && self.y2 <= image_h as i32
    }

    pub fn as_tuple(&self) -> (i32, i32, i32, i32) {
        (self.x1, self.y1, self.x2, self.y2)
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {}, {})", self.x1, self.y1, self.x2, self.y2)
    }
}

fn clamp_axis(lo: i32, hi: i32, limit: u32) -> (i32, i32) {
    let limit = limit.max(1) as i32;
    let lo = lo.clamp(0, limit - 1);
    let hi = hi.clamp(lo + 1, limit);
    (lo, hi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn bbox(x1: i32, y1: i32, x2: i32, y2: i32) -> BoundingBox {
        BoundingBox::new(x1, y1, x2, y2).unwrap()
    }

    #[test]
    fn test_new_rejects_inverted_and_empty_boxes() {
        assert!(BoundingBox::new(10, 10, 10, 20).is_none());
        assert!(BoundingBox::new(10, 10, 20, 10).is_none());
        assert!(BoundingBox::new(20, 10, 10, 20).is_none());
        assert!(BoundingBox::new(0, 0, 1, 1).is_some());
    }

    #[test]
    fn test_derived_dimensions() {
        let b = bbox(400, 300, 1200, 2600);
        assert_eq!(b.width(), 800);
        assert_eq!(b.height(), 2300);
        assert_eq!(b.area(), 800 * 2300);
        assert_eq!(b.center_x(), 800);
        assert_relative_eq!(b.aspect(), 800.0 / 2300.0);
    }

    #[test]
    fn test_clamped_keeps_inside_box_unchanged() {
        let b = BoundingBox::clamped(10, 20, 30, 40, 100, 100);
        assert_eq!(b, bbox(10, 20, 30, 40));
    }

    #[test]
    fn test_clamped_limits_to_image_bounds() {
        let b = BoundingBox::clamped(-60, -160, 1660, 3060, 2000, 3000);
        assert_eq!(b.as_tuple(), (0, 0, 1660, 3000));
        assert!(b.fits_within(2000, 3000));
    }

    #[rstest]
    #[case::entirely_left(-50, 0, -10, 10)]
    #[case::entirely_right(150, 0, 200, 10)]
    #[case::entirely_below(0, 150, 10, 200)]
    #[case::inverted(50, 50, 40, 40)]
    #[case::zero_width(30, 30, 30, 60)]
    fn test_clamped_never_degenerates(
        #[case] x1: i32,
        #[case] y1: i32,
        #[case] x2: i32,
        #[case] y2: i32,
    ) {
        let b = BoundingBox::clamped(x1, y1, x2, y2, 100, 100);
        assert!(b.width() >= 1);
        assert!(b.height() >= 1);
        assert!(b.fits_within(100, 100));
    }

    #[test]
    fn test_full_covers_image() {
        let b = BoundingBox::full(640, 480);
        assert_eq!(b.as_tuple(), (0, 0, 640, 480));
    }

    #[test]
    fn test_from_detection_truncates_and_clamps() {
        let b = BoundingBox::from_detection(-3.7, 10.9, 99.9, 120.2, 100, 100);
        assert_eq!(b.as_tuple(), (0, 10, 99, 100));
    }

    #[test]
    fn test_center_x_rounds_toward_left() {
        assert_eq!(bbox(0, 0, 5, 1).center_x(), 2);
        assert_eq!(bbox(1, 0, 5, 1).center_x(), 3);
    }

    #[test]
    fn test_display() {
        assert_eq!(bbox(1, 2, 3, 4).to_string(), "(1, 2, 3, 4)");
    }
}
