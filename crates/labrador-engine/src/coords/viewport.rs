use super::AffineTransform;

/// Viewport size in pixels.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }

    /// Maps scene space (top-left origin, +Y down, pixels) to NDC
    /// (center origin, +Y up, `[-1, 1]`).
    ///
    /// `scale(2/w, -2/h)` followed by `translate(-1, 1)`.
    pub fn normalization(self) -> AffineTransform {
        AffineTransform::from_scale(2.0 / self.width, -2.0 / self.height)
            .concatenated(AffineTransform::from_translation(-1.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Vec2;

    fn close(p: Vec2, x: f32, y: f32) -> bool {
        (p.x - x).abs() < 1e-5 && (p.y - y).abs() < 1e-5
    }

    #[test]
    fn top_left_maps_to_upper_left_ndc() {
        let n = Viewport::new(400.0, 300.0).normalization();
        assert!(close(n.apply(Vec2::zero()), -1.0, 1.0));
    }

    #[test]
    fn bottom_right_maps_to_lower_right_ndc() {
        let n = Viewport::new(400.0, 300.0).normalization();
        assert!(close(n.apply(Vec2::new(400.0, 300.0)), 1.0, -1.0));
    }

    #[test]
    fn center_maps_to_origin() {
        let n = Viewport::new(400.0, 300.0).normalization();
        assert!(close(n.apply(Vec2::new(200.0, 150.0)), 0.0, 0.0));
    }

    #[test]
    fn validity() {
        assert!(Viewport::new(1.0, 1.0).is_valid());
        assert!(!Viewport::new(0.0, 10.0).is_valid());
        assert!(!Viewport::new(f32::NAN, 10.0).is_valid());
    }
}
