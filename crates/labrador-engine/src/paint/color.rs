use std::fmt;

/// Straight-alpha RGBA fill color.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

/// Reason a set of color components could not be turned into a [`Color`].
#[derive(Debug, Clone, PartialEq)]
pub enum ColorError {
    /// More than four components were supplied.
    TooManyComponents(usize),
    /// A component was NaN or infinite.
    NonFinite { index: usize },
}

impl fmt::Display for ColorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorError::TooManyComponents(n) => {
                write!(f, "expected at most 4 color components, got {n}")
            }
            ColorError::NonFinite { index } => {
                write!(f, "color component {index} is not finite")
            }
        }
    }
}

impl std::error::Error for ColorError {}

impl Color {
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn black() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }

    #[inline]
    pub const fn white() -> Self {
        Self::new(1.0, 1.0, 1.0, 1.0)
    }

    /// Builds a color from up to four `R, G, B, A` components.
    ///
    /// Missing trailing components fall back positionally to `[0, 0, 0, 1]`,
    /// so `[0.5, 0.25]` yields `(0.5, 0.25, 0, 1)`. Components are clamped to
    /// `[0, 1]`; both backends consume the clamped value.
    pub fn from_components(components: &[f32]) -> Result<Self, ColorError> {
        if components.len() > 4 {
            return Err(ColorError::TooManyComponents(components.len()));
        }
        if let Some(index) = components.iter().position(|c| !c.is_finite()) {
            return Err(ColorError::NonFinite { index });
        }

        let mut rgba = Self::black().to_array();
        for (dst, src) in rgba.iter_mut().zip(components) {
            *dst = src.clamp(0.0, 1.0);
        }
        Ok(Self::from_array(rgba))
    }

    /// Like [`from_components`](Self::from_components), degrading to opaque
    /// black on malformed input.
    pub fn from_components_or_black(components: &[f32]) -> Self {
        Self::from_components(components).unwrap_or_else(|e| {
            log::warn!("malformed fill color ({e}); using opaque black");
            Self::black()
        })
    }

    #[inline]
    pub const fn from_array(c: [f32; 4]) -> Self {
        Self::new(c[0], c[1], c[2], c[3])
    }

    #[inline]
    pub const fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite() && self.a.is_finite()
    }

    /// Conversion for the CPU rasterizer. Channels are clamped to `[0, 1]`.
    pub fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba(
            self.r.clamp(0.0, 1.0),
            self.g.clamp(0.0, 1.0),
            self.b.clamp(0.0, 1.0),
            self.a.clamp(0.0, 1.0),
        )
        .unwrap_or(tiny_skia::Color::BLACK)
    }

    #[inline]
    pub fn to_wgpu(self) -> wgpu::Color {
        wgpu::Color {
            r: self.r as f64,
            g: self.g as f64,
            b: self.b as f64,
            a: self.a as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_components_fill_blue_and_alpha() {
        let c = Color::from_components(&[0.25, 0.75]).unwrap();
        assert_eq!(c.to_array(), [0.25, 0.75, 0.0, 1.0]);
    }

    #[test]
    fn no_components_is_opaque_black() {
        assert_eq!(Color::from_components(&[]).unwrap(), Color::black());
    }

    #[test]
    fn four_components_pass_through() {
        let c = Color::from_components(&[0.1, 0.2, 0.3, 0.4]).unwrap();
        assert_eq!(c, Color::new(0.1, 0.2, 0.3, 0.4));
    }

    #[test]
    fn out_of_range_components_are_clamped() {
        let c = Color::from_components(&[1.0, -0.5, 0.0, 1.5]).unwrap();
        assert_eq!(c, Color::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(c.to_skia().alpha(), c.a);
    }

    #[test]
    fn too_many_components_is_an_error() {
        assert_eq!(
            Color::from_components(&[0.0; 5]),
            Err(ColorError::TooManyComponents(5))
        );
    }

    #[test]
    fn non_finite_component_is_an_error() {
        assert_eq!(
            Color::from_components(&[1.0, f32::NAN]),
            Err(ColorError::NonFinite { index: 1 })
        );
    }

    #[test]
    fn malformed_degrades_to_black() {
        assert_eq!(Color::from_components_or_black(&[f32::INFINITY]), Color::black());
        assert_eq!(Color::from_components_or_black(&[0.0; 6]), Color::black());
    }
}
