//! Per-outline geometric features.

use serde::Serialize;

use crate::geometry::{BoundingBox, GeometryBackend, Outline};
use crate::Result;

/// Scalar shape descriptors of one outline.
///
/// Ratios are `None` when their denominator is zero; the selector treats that
/// as grounds for exclusion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeometricFeatures {
    pub area: f64,
    pub perimeter: f64,
    pub bounding_box: BoundingBox,
    pub aspect_ratio: Option<f64>,
    pub coverage_ratio: Option<f64>,
    pub nu02: f64,
    pub orientation_degrees: f64,
}

impl GeometricFeatures {
    pub fn extract<G: GeometryBackend + ?Sized>(geometry: &G, outline: &Outline) -> Result<Self> {
        let area = geometry.area(outline)?;
        Self::extract_with_area(geometry, outline, area)
    }

    /// Finish extraction when the area is already known from the area gate.
    pub(crate) fn extract_with_area<G: GeometryBackend + ?Sized>(
        geometry: &G,
        outline: &Outline,
        area: f64,
    ) -> Result<Self> {
        let perimeter = geometry.perimeter(outline)?;
        let bounding_box = geometry.bounding_box(outline)?;
        let moments = geometry.moments(outline)?;

        let aspect_ratio = (bounding_box.height != 0)
            .then(|| f64::from(bounding_box.width) / f64::from(bounding_box.height));
        let box_area = bounding_box.area();
        let coverage_ratio = (box_area > 0.0).then(|| area / box_area);

        Ok(Self {
            area,
            perimeter,
            bounding_box,
            aspect_ratio,
            coverage_ratio,
            nu02: moments.nu02,
            orientation_degrees: orientation_degrees(moments.mu11, moments.mu20, moments.mu02),
        })
    }
}

/// Terms smaller than this fraction of `mu20 + mu02` are rounding noise.
const ORIENTATION_RELATIVE_EPSILON: f64 = 1e-9;

/// Principal-axis angle in degrees, within `[-90, 90]`. A shape with no
/// preferred axis (square, disc) reports 0.
pub fn orientation_degrees(mu11: f64, mu20: f64, mu02: f64) -> f64 {
    let tolerance = (mu20 + mu02).abs() * ORIENTATION_RELATIVE_EPSILON;
    let snap = |v: f64| if v.abs() <= tolerance { 0.0 } else { v };
    (0.5 * snap(mu11).atan2(snap(mu20 - mu02))).to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PolygonGeometry;
    use crate::score::angle_score;
    use approx::assert_relative_eq;

    #[test]
    fn wide_rectangle_features() {
        let rect: Outline = vec![(10, 10), (210, 10), (210, 130), (10, 130)].into();
        let f = GeometricFeatures::extract(&PolygonGeometry, &rect).unwrap();
        assert_relative_eq!(f.area, 24_000.0);
        assert_relative_eq!(f.perimeter, 640.0);
        assert_relative_eq!(f.aspect_ratio.unwrap(), 200.0 / 120.0);
        assert_relative_eq!(f.coverage_ratio.unwrap(), 1.0);
        assert_relative_eq!(f.nu02, 0.05, max_relative = 1e-9);
        assert_relative_eq!(f.orientation_degrees, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn tall_rectangle_reports_vertical_axis() {
        let rect: Outline = vec![(10, 10), (40, 10), (40, 50), (10, 50)].into();
        let f = GeometricFeatures::extract(&PolygonGeometry, &rect).unwrap();
        assert_relative_eq!(f.orientation_degrees.abs(), 90.0, epsilon = 1e-9);
    }

    #[test]
    fn right_triangle_is_diagonal() {
        let tri: Outline = vec![(0, 0), (120, 0), (0, 120)].into();
        let f = GeometricFeatures::extract(&PolygonGeometry, &tri).unwrap();
        assert_relative_eq!(f.coverage_ratio.unwrap(), 0.5);
        assert_relative_eq!(f.orientation_degrees, -45.0, epsilon = 1e-9);
    }

    #[test]
    fn flat_outline_has_no_ratios() {
        let flat: Outline = vec![(0, 5), (30, 5), (60, 5)].into();
        let f = GeometricFeatures::extract(&PolygonGeometry, &flat).unwrap();
        assert_eq!(f.area, 0.0);
        assert_eq!(f.aspect_ratio, None);
        assert_eq!(f.coverage_ratio, None);
        assert!(f.orientation_degrees.is_finite());
    }

    #[test]
    fn square_orientation_is_the_same_anywhere_in_the_frame() {
        for (x, y) in [(0, 0), (10, 10), (300, 40), (1234, 777), (3000, 2000)] {
            let square: Outline = vec![(x, y), (x + 100, y), (x + 100, y + 100), (x, y + 100)].into();
            let f = GeometricFeatures::extract(&PolygonGeometry, &square).unwrap();
            assert_eq!(f.orientation_degrees, 0.0, "at ({x}, {y})");
            assert_eq!(angle_score(f.orientation_degrees), 100.0);
        }
    }

    #[test]
    fn near_isotropic_noise_snaps_to_zero() {
        assert_eq!(orientation_degrees(1e-7, 8.3e5, 8.3e5 - 2e-7), 0.0);
        assert_relative_eq!(orientation_degrees(0.0, 8.3e5, 4.0e5), 0.0);
        assert_relative_eq!(orientation_degrees(0.0, 4.0e5, 8.3e5).abs(), 90.0);
    }

    #[test]
    fn orientation_stays_in_range() {
        for &(mu11, mu20, mu02) in &[(1.0, 0.0, 5.0), (-1.0, 0.0, 5.0), (0.0, 0.0, 0.0), (3.0, 2.0, 1.0)] {
            let theta = orientation_degrees(mu11, mu20, mu02);
            assert!((-90.0..=90.0).contains(&theta), "{theta}");
        }
    }
}
