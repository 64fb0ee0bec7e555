//! Linear interpolation over a triangulated irregular network

use glam::DVec2;

use super::{collect_samples, FieldEstimator, Sample};
use crate::error::{Result, TessellationError};
use crate::feature::{Feature, FeatureCollection};
use crate::geometry::{Geometry, Position};
use crate::predicates::orient2d;
use crate::triangulation::{triangulate_points, CORNER_KEYS};

/// Barycentric weights of `p` in triangle `abc`, `None` when degenerate
fn barycentric(p: DVec2, a: DVec2, b: DVec2, c: DVec2) -> Option<[f64; 3]> {
    let area = orient2d(a, b, c);
    if area == 0.0 {
        return None;
    }
    let u = orient2d(p, b, c) / area;
    let v = orient2d(a, p, c) / area;
    Some([u, v, 1.0 - u - v])
}

/// Value of the plane through a TIN triangle at `point`
///
/// Corner values come from the `a`, `b`, `c` properties, falling back to
/// each vertex's z coordinate. The point does not need to lie inside the
/// triangle; outside it the plane is extrapolated.
///
/// # Errors
///
/// * `InvalidGeometry` - the feature is not a non-degenerate triangle
/// * `MissingValue` - a corner has neither a property nor a z coordinate
pub fn plane_point(point: DVec2, triangle: &Feature) -> Result<f64> {
    let ring = match &triangle.geometry {
        Some(Geometry::Polygon(rings)) if rings.first().map_or(0, Vec::len) >= 4 => &rings[0],
        _ => {
            return Err(TessellationError::InvalidGeometry(
                "plane_point needs a triangular polygon".into(),
            ))
        }
    };
    let corners: [Position; 3] = [ring[0], ring[1], ring[2]];
    let mut values = [0.0; 3];
    for (k, key) in CORNER_KEYS.iter().enumerate() {
        values[k] = triangle
            .number(key)
            .or(corners[k].z)
            .ok_or_else(|| TessellationError::MissingValue {
                index: k,
                property: key.to_string(),
            })?;
    }
    let weights = barycentric(point, corners[0].xy(), corners[1].xy(), corners[2].xy())
        .ok_or_else(|| TessellationError::InvalidGeometry("triangle has zero area".into()))?;
    Ok(weights[0] * values[0] + weights[1] * values[1] + weights[2] * values[2])
}

/// Piecewise-linear estimator over the Delaunay triangulation of the samples
///
/// Locations outside the convex hull of the samples estimate to `NaN`.
#[derive(Debug, Clone)]
pub struct TinEstimator {
    corners: Vec<[DVec2; 3]>,
    values: Vec<[f64; 3]>,
}

impl TinEstimator {
    /// Triangulate the samples
    ///
    /// # Errors
    ///
    /// Returns `DegenerateInput` for fewer than 3 distinct or collinear samples
    pub fn new(samples: &[Sample]) -> Result<Self> {
        let positions: Vec<DVec2> = samples.iter().map(|s| s.position).collect();
        let tin = triangulate_points(&positions)?;
        let corners = tin.triangles().iter().map(|t| tin.corners(t)).collect();
        let values = tin
            .triangles()
            .iter()
            .map(|t| [samples[t[0]].value, samples[t[1]].value, samples[t[2]].value])
            .collect();
        Ok(Self { corners, values })
    }

    /// Triangulate the vertices of `features`, reading `property` (or z)
    pub fn from_features(features: &FeatureCollection, property: &str) -> Result<Self> {
        Self::new(&collect_samples(features, property)?)
    }

    pub fn triangle_count(&self) -> usize {
        self.corners.len()
    }
}

impl FieldEstimator for TinEstimator {
    fn estimate(&self, at: DVec2) -> f64 {
        const SLACK: f64 = 1e-12;
        for (corners, values) in self.corners.iter().zip(&self.values) {
            let Some(w) = barycentric(at, corners[0], corners[1], corners[2]) else {
                continue;
            };
            if w.iter().all(|&wi| wi >= -SLACK) {
                return w[0] * values[0] + w[1] * values[1] + w[2] * values[2];
            }
        }
        f64::NAN
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::Properties;
    use serde_json::json;

    fn plane(p: DVec2) -> f64 {
        2.0 * p.x - 3.0 * p.y + 5.0
    }

    #[test]
    fn test_tin_reproduces_plane() {
        let positions = [
            DVec2::new(0.0, 0.0),
            DVec2::new(10.0, 0.0),
            DVec2::new(10.0, 10.0),
            DVec2::new(0.0, 10.0),
            DVec2::new(4.0, 6.0),
        ];
        let samples: Vec<Sample> = positions.iter().map(|&p| Sample::new(p, plane(p))).collect();
        let tin = TinEstimator::new(&samples).unwrap();
        assert_eq!(tin.triangle_count(), 4);
        for at in [DVec2::new(1.0, 1.0), DVec2::new(7.5, 2.5), DVec2::new(10.0, 5.0)] {
            assert!((tin.estimate(at) - plane(at)).abs() < 1e-9);
        }
        assert!(tin.estimate(DVec2::new(20.0, 5.0)).is_nan());
    }

    #[test]
    fn test_plane_point_from_properties() {
        let ring = vec![
            Position::new(0.0, 0.0),
            Position::new(4.0, 0.0),
            Position::new(0.0, 4.0),
        ];
        let mut properties = Properties::new();
        properties.insert("a".into(), json!(0.0));
        properties.insert("b".into(), json!(4.0));
        properties.insert("c".into(), json!(8.0));
        let triangle = Feature::with_properties(Geometry::polygon(vec![ring]).unwrap(), properties);

        assert_eq!(plane_point(DVec2::new(0.0, 0.0), &triangle).unwrap(), 0.0);
        assert!((plane_point(DVec2::new(1.0, 1.0), &triangle).unwrap() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_plane_point_falls_back_to_z() {
        let ring = vec![
            Position::with_z(0.0, 0.0, 1.0),
            Position::with_z(2.0, 0.0, 1.0),
            Position::with_z(0.0, 2.0, 1.0),
        ];
        let triangle = Feature::new(Geometry::polygon(vec![ring]).unwrap());
        assert_eq!(plane_point(DVec2::new(0.5, 0.5), &triangle).unwrap(), 1.0);

        let flat = Feature::new(
            Geometry::polygon(vec![vec![
                Position::new(0.0, 0.0),
                Position::new(2.0, 0.0),
                Position::new(0.0, 2.0),
            ]])
            .unwrap(),
        );
        assert!(matches!(
            plane_point(DVec2::new(0.5, 0.5), &flat),
            Err(TessellationError::MissingValue { .. })
        ));
    }
}
