use super::Vec2;

/// 2D affine transform `(a, b, c, d, tx, ty)`.
///
/// Row-vector convention, matching CoreGraphics:
///
/// ```text
/// x' = a * x + c * y + tx
/// y' = b * x + d * y + ty
/// ```
///
/// Values are immutable; every operation returns a new transform.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AffineTransform {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub tx: f32,
    pub ty: f32,
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl AffineTransform {
    #[inline]
    pub const fn new(a: f32, b: f32, c: f32, d: f32, tx: f32, ty: f32) -> Self {
        Self { a, b, c, d, tx, ty }
    }

    #[inline]
    pub const fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    #[inline]
    pub const fn from_translation(dx: f32, dy: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, dx, dy)
    }

    #[inline]
    pub const fn from_scale(sx: f32, sy: f32) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Rotation by `radians`; positive angles turn +X towards +Y.
    #[inline]
    pub fn from_rotation(radians: f32) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self::new(cos, sin, -sin, cos, 0.0, 0.0)
    }

    /// Returns `self` followed by `other`: a point is mapped by `self` first.
    pub fn concatenated(self, other: AffineTransform) -> Self {
        Self {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            tx: self.tx * other.a + self.ty * other.c + other.tx,
            ty: self.tx * other.b + self.ty * other.d + other.ty,
        }
    }

    /// Translation applied in local space, before `self`.
    #[inline]
    pub fn translated(self, dx: f32, dy: f32) -> Self {
        Self::from_translation(dx, dy).concatenated(self)
    }

    /// Scale applied in local space, before `self`.
    #[inline]
    pub fn scaled(self, sx: f32, sy: f32) -> Self {
        Self::from_scale(sx, sy).concatenated(self)
    }

    /// Rotation applied in local space, before `self`.
    #[inline]
    pub fn rotated(self, radians: f32) -> Self {
        Self::from_rotation(radians).concatenated(self)
    }

    /// Maps a point.
    #[inline]
    pub fn apply(self, p: Vec2) -> Vec2 {
        Vec2::new(
            self.a * p.x + self.c * p.y + self.tx,
            self.b * p.x + self.d * p.y + self.ty,
        )
    }

    /// Coefficients in `(a, b, c, d, tx, ty)` order, ready for GPU upload.
    #[inline]
    pub fn to_coefficients(self) -> [f32; 6] {
        [self.a, self.b, self.c, self.d, self.tx, self.ty]
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.to_coefficients().iter().all(|v| v.is_finite())
    }

    pub fn approx_eq(self, other: AffineTransform, eps: f32) -> bool {
        self.to_coefficients()
            .iter()
            .zip(other.to_coefficients())
            .all(|(l, r)| (l - r).abs() <= eps)
    }

    /// Conversion for the CPU rasterizer (`sx, ky, kx, sy, tx, ty`).
    #[inline]
    pub fn to_skia(self) -> tiny_skia::Transform {
        tiny_skia::Transform::from_row(self.a, self.b, self.c, self.d, self.tx, self.ty)
    }
}
