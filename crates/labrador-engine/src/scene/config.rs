use std::borrow::Cow;

use crate::coords::Vec2;
use crate::paint::Color;

/// WGSL program used by the batched backend.
///
/// Entry points: `vs_main` (vertex) and `fs_main` (fragment).
pub const DEFAULT_SHADER_SOURCE: &str = include_str!("../render/shaders/instanced.wgsl");

/// How a shape's points are turned into pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ShapeStyle {
    /// Convex polygon fill.
    Fill,
    /// Line strip of the given width; `closed` joins the last point to the first.
    Stroke { width: f32, closed: bool },
}

/// Local-space outline of the debug shape, in scene pixels.
///
/// The same geometry is rasterized by the immediate backend and shared by every
/// instance in the batched backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeGeometry {
    pub points: Vec<Vec2>,
    pub style: ShapeStyle,
}

impl ShapeGeometry {
    pub fn new(points: Vec<Vec2>, style: ShapeStyle) -> Self {
        Self { points, style }
    }

    /// Triangle outline centered on the origin.
    pub fn debug_triangle() -> Self {
        Self::new(
            vec![Vec2::new(0.0, -10.0), Vec2::new(-10.0, 10.0), Vec2::new(10.0, 10.0)],
            ShapeStyle::Stroke { width: 1.0, closed: true },
        )
    }

    /// Filled 20x10 rectangle with its top-left corner at the origin.
    pub fn filled_rect() -> Self {
        Self::new(
            vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(20.0, 0.0),
                Vec2::new(20.0, 10.0),
                Vec2::new(0.0, 10.0),
            ],
            ShapeStyle::Fill,
        )
    }

    /// Open three-point polyline.
    pub fn polyline() -> Self {
        Self::new(
            vec![Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0), Vec2::new(20.0, 0.0)],
            ShapeStyle::Stroke { width: 2.0, closed: false },
        )
    }

    /// Triangle-list tessellation in local space.
    ///
    /// Fills are fanned from the first point (convex outlines only). Strokes
    /// emit one quad per segment with butt ends and no joins, so corners differ
    /// from the immediate backend, which strokes with tiny-skia's miter joins.
    pub fn triangles(&self) -> Vec<Vec2> {
        match self.style {
            ShapeStyle::Fill => {
                if self.points.len() < 3 {
                    return Vec::new();
                }
                let p0 = self.points[0];
                self.points[1..]
                    .windows(2)
                    .flat_map(|w| [p0, w[0], w[1]])
                    .collect()
            }
            ShapeStyle::Stroke { width, closed } => {
                let half = width * 0.5;
                self.segments(closed)
                    .flat_map(|(a, b)| {
                        let n = (b - a).unit_normal() * half;
                        let (v0, v1, v2, v3) = (a + n, b + n, b - n, a - n);
                        [v0, v1, v2, v0, v2, v3]
                    })
                    .collect()
            }
        }
    }

    fn segments(&self, closed: bool) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        let open = self.points.windows(2).map(|w| (w[0], w[1]));
        let closing = match (closed && self.points.len() > 2, self.points.first(), self.points.last()) {
            (true, Some(&first), Some(&last)) => Some((last, first)),
            _ => None,
        };
        open.chain(closing)
    }

    /// Outline as a rasterizer path. `None` for fewer than two points.
    pub fn to_skia_path(&self) -> Option<tiny_skia::Path> {
        let (first, rest) = self.points.split_first()?;
        if rest.is_empty() {
            return None;
        }

        let mut pb = tiny_skia::PathBuilder::new();
        pb.move_to(first.x, first.y);
        for p in rest {
            pb.line_to(p.x, p.y);
        }
        let close = match self.style {
            ShapeStyle::Fill => true,
            ShapeStyle::Stroke { closed, .. } => closed,
        };
        if close {
            pb.close();
        }
        pb.finish()
    }
}

/// Everything a scene run needs besides the context itself.
#[derive(Debug, Clone)]
pub struct SceneConfig {
    pub shape: ShapeGeometry,
    /// WGSL source for the batched backend; compiled on every flush.
    pub shader_source: Cow<'static, str>,
    pub clear_color: Color,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            shape: ShapeGeometry::debug_triangle(),
            shader_source: Cow::Borrowed(DEFAULT_SHADER_SOURCE),
            clear_color: Color::new(0.0, 1.0, 1.0, 1.0),
        }
    }
}

impl SceneConfig {
    pub fn with_shape(shape: ShapeGeometry) -> Self {
        Self { shape, ..Self::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filled_rect_fans_into_two_triangles() {
        let tris = ShapeGeometry::filled_rect().triangles();
        assert_eq!(tris.len(), 6);
        assert_eq!(tris[0], Vec2::new(0.0, 0.0));
        assert_eq!(tris[5], Vec2::new(0.0, 10.0));
    }

    #[test]
    fn closed_triangle_outline_has_three_quads() {
        assert_eq!(ShapeGeometry::debug_triangle().triangles().len(), 3 * 6);
    }

    #[test]
    fn open_polyline_has_one_quad_per_segment() {
        assert_eq!(ShapeGeometry::polyline().triangles().len(), 2 * 6);
    }

    #[test]
    fn stroke_quad_is_offset_by_half_width() {
        let line = ShapeGeometry::new(
            vec![Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0)],
            ShapeStyle::Stroke { width: 4.0, closed: false },
        );
        let tris = line.triangles();
        assert_eq!(tris[0], Vec2::new(0.0, 2.0));
        assert_eq!(tris[2], Vec2::new(10.0, -2.0));
    }

    #[test]
    fn degenerate_fill_yields_nothing() {
        let g = ShapeGeometry::new(vec![Vec2::zero(), Vec2::new(1.0, 1.0)], ShapeStyle::Fill);
        assert!(g.triangles().is_empty());
    }

    #[test]
    fn skia_path_needs_two_points() {
        let g = ShapeGeometry::new(vec![Vec2::zero()], ShapeStyle::Fill);
        assert!(g.to_skia_path().is_none());
        assert!(ShapeGeometry::polyline().to_skia_path().is_some());
    }

    #[test]
    fn default_config_uses_bundled_shader() {
        let cfg = SceneConfig::default();
        assert!(cfg.shader_source.contains("vs_main"));
        assert!(cfg.shader_source.contains("fs_main"));
    }
}
