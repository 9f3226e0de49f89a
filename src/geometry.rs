//! Outline types and the geometry primitives the feature extractor relies on.
//!
//! [`GeometryBackend`] is the narrow seam between scoring and whatever library
//! measures polygons. [`PolygonGeometry`] is the built-in implementation; the
//! `opencv` feature adds one backed by `imgproc`.

use serde::{Deserialize, Serialize};

use crate::Result;

/// Integer pixel coordinate on an outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Closed polygon boundary of one connected region, in traversal order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Outline {
    points: Vec<Point>,
}

impl Outline {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Consecutive point pairs, including the closing edge from last to first.
    fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let prev = self.points.iter().copied().cycle().skip(self.points.len().saturating_sub(1));
        prev.zip(self.points.iter().copied())
    }
}

impl From<Vec<(i32, i32)>> for Outline {
    fn from(points: Vec<(i32, i32)>) -> Self {
        Self::new(points.into_iter().map(|(x, y)| Point::new(x, y)).collect())
    }
}

/// Axis-aligned bounding rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    pub fn area(&self) -> f64 {
        f64::from(self.width) * f64::from(self.height)
    }
}

/// Spatial, central and normalized central moments up to second order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Moments {
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
    pub m20: f64,
    pub m11: f64,
    pub m02: f64,
    pub mu20: f64,
    pub mu11: f64,
    pub mu02: f64,
    pub nu20: f64,
    pub nu11: f64,
    pub nu02: f64,
}

impl Moments {
    /// Derive central and normalized moments from the spatial ones.
    pub fn from_spatial(m00: f64, m10: f64, m01: f64, m20: f64, m11: f64, m02: f64) -> Self {
        let inv_m00 = if m00.abs() > f64::EPSILON { 1.0 / m00 } else { 0.0 };
        let cx = m10 * inv_m00;
        let cy = m01 * inv_m00;

        let mu20 = m20 - m10 * cx;
        let mu11 = m11 - m10 * cy;
        let mu02 = m02 - m01 * cy;

        // nu_pq = mu_pq / m00^((p + q) / 2 + 1); every second-order term shares m00^2.
        let s2 = inv_m00 * inv_m00;

        Self {
            m00,
            m10,
            m01,
            m20,
            m11,
            m02,
            mu20,
            mu11,
            mu02,
            nu20: mu20 * s2,
            nu11: mu11 * s2,
            nu02: mu02 * s2,
        }
    }

    /// Spatial moments of the same shape moved by `(dx, dy)`. Central and
    /// normalized moments are unchanged.
    pub fn translated(self, dx: f64, dy: f64) -> Self {
        let Self { m00, m10, m01, m20, m11, m02, .. } = self;
        Self {
            m10: m10 + dx * m00,
            m01: m01 + dy * m00,
            m20: m20 + 2.0 * dx * m10 + dx * dx * m00,
            m11: m11 + dx * m01 + dy * m10 + dx * dy * m00,
            m02: m02 + 2.0 * dy * m01 + dy * dy * m00,
            ..self
        }
    }
}

/// Polygon measurements needed to score an outline.
///
/// Implementations must accept degenerate input (empty, one or two points,
/// collinear points) and report zero area for it rather than failing.
pub trait GeometryBackend {
    fn area(&self, outline: &Outline) -> Result<f64>;
    fn perimeter(&self, outline: &Outline) -> Result<f64>;
    fn bounding_box(&self, outline: &Outline) -> Result<BoundingBox>;
    fn moments(&self, outline: &Outline) -> Result<Moments>;
}

impl<T: GeometryBackend + ?Sized> GeometryBackend for &T {
    fn area(&self, outline: &Outline) -> Result<f64> {
        (**self).area(outline)
    }

    fn perimeter(&self, outline: &Outline) -> Result<f64> {
        (**self).perimeter(outline)
    }

    fn bounding_box(&self, outline: &Outline) -> Result<BoundingBox> {
        (**self).bounding_box(outline)
    }

    fn moments(&self, outline: &Outline) -> Result<Moments> {
        (**self).moments(outline)
    }
}

/// Pure-Rust polygon measurements.
///
/// Bounding boxes use the extent convention (`width = max_x - min_x`), so a
/// horizontal run of points has zero height. Extents too wide for `i32`
/// saturate.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolygonGeometry;

impl GeometryBackend for PolygonGeometry {
    fn area(&self, outline: &Outline) -> Result<f64> {
        if outline.len() < 3 {
            return Ok(0.0);
        }
        let twice: f64 = outline
            .edges()
            .map(|(a, b)| f64::from(a.x) * f64::from(b.y) - f64::from(b.x) * f64::from(a.y))
            .sum();
        Ok((twice * 0.5).abs())
    }

    fn perimeter(&self, outline: &Outline) -> Result<f64> {
        if outline.len() < 2 {
            return Ok(0.0);
        }
        Ok(outline
            .edges()
            .map(|(a, b)| {
                let dx = f64::from(b.x) - f64::from(a.x);
                let dy = f64::from(b.y) - f64::from(a.y);
                dx.hypot(dy)
            })
            .sum())
    }

    fn bounding_box(&self, outline: &Outline) -> Result<BoundingBox> {
        let Some(first) = outline.points().first() else {
            return Ok(BoundingBox::default());
        };
        let (mut x_min, mut y_min, mut x_max, mut y_max) = (first.x, first.y, first.x, first.y);
        for p in outline.points() {
            x_min = x_min.min(p.x);
            y_min = y_min.min(p.y);
            x_max = x_max.max(p.x);
            y_max = y_max.max(p.y);
        }
        Ok(BoundingBox {
            x: x_min,
            y: y_min,
            width: x_max.saturating_sub(x_min),
            height: y_max.saturating_sub(y_min),
        })
    }

    /// Green's theorem over the polygon edges, normalized so the result does
    /// not depend on traversal direction.
    ///
    /// Sums run on coordinates relative to the bounding-box corner so the
    /// central moments do not pick up cancellation error from the outline's
    /// position in the frame.
    fn moments(&self, outline: &Outline) -> Result<Moments> {
        if outline.len() < 3 {
            return Ok(Moments::default());
        }
        let bounds = self.bounding_box(outline)?;
        let (ox, oy) = (f64::from(bounds.x), f64::from(bounds.y));

        let (mut a00, mut a10, mut a01, mut a20, mut a11, mut a02) = (0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        for (prev, cur) in outline.edges() {
            let (xp, yp) = (f64::from(prev.x) - ox, f64::from(prev.y) - oy);
            let (xc, yc) = (f64::from(cur.x) - ox, f64::from(cur.y) - oy);

            let dxy = xp * yc - xc * yp;
            let xs = xp + xc;
            let ys = yp + yc;

            a00 += dxy;
            a10 += dxy * xs;
            a01 += dxy * ys;
            a20 += dxy * (xp * xs + xc * xc);
            a11 += dxy * (xp * (ys + yp) + xc * (ys + yc));
            a02 += dxy * (yp * ys + yc * yc);
        }

        if a00.abs() <= f64::from(f32::EPSILON) {
            return Ok(Moments::default());
        }

        let sign = a00.signum();
        let local = Moments::from_spatial(
            sign * a00 / 2.0,
            sign * a10 / 6.0,
            sign * a01 / 6.0,
            sign * a20 / 12.0,
            sign * a11 / 24.0,
            sign * a02 / 12.0,
        );
        Ok(local.translated(ox, oy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square(side: i32) -> Outline {
        vec![(0, 0), (side, 0), (side, side), (0, side)].into()
    }

    #[test]
    fn square_measurements() {
        let geo = PolygonGeometry;
        let sq = square(100);
        assert_relative_eq!(geo.area(&sq).unwrap(), 10_000.0);
        assert_relative_eq!(geo.perimeter(&sq).unwrap(), 400.0);
        assert_eq!(
            geo.bounding_box(&sq).unwrap(),
            BoundingBox { x: 0, y: 0, width: 100, height: 100 }
        );
    }

    #[test]
    fn area_ignores_traversal_direction() {
        let geo = PolygonGeometry;
        let cw: Outline = vec![(0, 0), (0, 40), (30, 40), (30, 0)].into();
        let ccw: Outline = vec![(0, 0), (30, 0), (30, 40), (0, 40)].into();
        assert_relative_eq!(geo.area(&cw).unwrap(), 1200.0);
        assert_relative_eq!(geo.area(&ccw).unwrap(), 1200.0);
        assert_eq!(geo.moments(&cw).unwrap(), geo.moments(&ccw).unwrap());
    }

    #[test]
    fn degenerate_outlines_have_zero_area() {
        let geo = PolygonGeometry;
        let single: Outline = vec![(5, 5)].into();
        let pair: Outline = vec![(0, 0), (10, 0)].into();
        let line: Outline = vec![(0, 0), (10, 0), (20, 0)].into();

        assert_eq!(geo.area(&Outline::empty()).unwrap(), 0.0);
        assert_eq!(geo.area(&single).unwrap(), 0.0);
        assert_eq!(geo.area(&pair).unwrap(), 0.0);
        assert_eq!(geo.area(&line).unwrap(), 0.0);
        assert_relative_eq!(geo.perimeter(&pair).unwrap(), 20.0);
        assert_eq!(geo.bounding_box(&line).unwrap().height, 0);
        assert_eq!(geo.moments(&line).unwrap(), Moments::default());
        assert_eq!(geo.bounding_box(&Outline::empty()).unwrap(), BoundingBox::default());
    }

    #[test]
    fn square_moments() {
        let m = PolygonGeometry.moments(&square(100)).unwrap();
        assert_relative_eq!(m.m00, 10_000.0);
        assert_relative_eq!(m.mu11, 0.0, epsilon = 1e-6);
        assert_relative_eq!(m.mu20, m.mu02, max_relative = 1e-9);
        assert_relative_eq!(m.nu02, 1.0 / 12.0, max_relative = 1e-9);
    }

    #[test]
    fn square_moments_do_not_depend_on_position() {
        let geo = PolygonGeometry;
        let reference = geo.moments(&square(100)).unwrap();
        for (x, y) in [(10, 10), (300, 40), (1234, 777), (3000, 2000), (-4000, 65_000)] {
            let shifted: Outline = vec![(x, y), (x + 100, y), (x + 100, y + 100), (x, y + 100)].into();
            let m = geo.moments(&shifted).unwrap();
            assert_eq!((m.mu20, m.mu11, m.mu02), (reference.mu20, reference.mu11, reference.mu02), "at ({x}, {y})");
            assert_relative_eq!(m.m10, 10_000.0 * (f64::from(x) + 50.0), max_relative = 1e-12);
            assert_relative_eq!(m.m11, 10_000.0 * (f64::from(x) + 50.0) * (f64::from(y) + 50.0), max_relative = 1e-9);
        }
    }

    #[test]
    fn far_apart_coordinates_do_not_overflow() {
        let geo = PolygonGeometry;
        let huge: Outline = vec![(i32::MIN, i32::MIN), (i32::MAX, i32::MIN), (i32::MAX, i32::MAX), (i32::MIN, i32::MAX)].into();
        let bounds = geo.bounding_box(&huge).unwrap();
        assert_eq!((bounds.width, bounds.height), (i32::MAX, i32::MAX));
        let perimeter = geo.perimeter(&huge).unwrap();
        assert_relative_eq!(perimeter, 4.0 * (f64::from(i32::MAX) - f64::from(i32::MIN)));
        assert!(geo.area(&huge).unwrap().is_finite());
    }

    #[test]
    fn moments_are_translation_and_scale_invariant() {
        let geo = PolygonGeometry;
        let small: Outline = vec![(0, 0), (20, 0), (20, 12), (0, 12)].into();
        let big_shifted: Outline = vec![(50, 70), (150, 70), (150, 130), (50, 130)].into();
        let a = geo.moments(&small).unwrap();
        let b = geo.moments(&big_shifted).unwrap();
        assert_relative_eq!(a.nu02, b.nu02, max_relative = 1e-9);
        assert_relative_eq!(a.nu20, b.nu20, max_relative = 1e-9);
    }
}
