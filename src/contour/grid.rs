//! Rectilinear scalar lattices for contouring

use glam::DVec2;
use tracing::trace;

use crate::config::Tolerance;
use crate::error::{Result, TessellationError};
use crate::feature::FeatureCollection;
use crate::field::vertex_value;
use crate::geometry::Geometry;

/// Values on the nodes of a rectilinear lattice
///
/// `values` is row-major with rows ascending in Y: the value at column `i`,
/// row `j` is `values[j * nx + i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarGrid {
    xs: Vec<f64>,
    ys: Vec<f64>,
    values: Vec<f64>,
}

impl ScalarGrid {
    /// Build a lattice from axis coordinates and row-major values
    ///
    /// # Errors
    ///
    /// Returns `IrregularGrid` if an axis has fewer than 2 coordinates or is
    /// not strictly ascending, or if the value count does not match, and
    /// `InvalidParameter` for non-finite values
    pub fn new(xs: Vec<f64>, ys: Vec<f64>, values: Vec<f64>) -> Result<Self> {
        for (axis, coords) in [("x", &xs), ("y", &ys)] {
            if coords.len() < 2 {
                return Err(TessellationError::IrregularGrid(format!(
                    "need at least 2 distinct {} coordinates (got {})",
                    axis,
                    coords.len()
                )));
            }
            let ascending = coords.iter().all(|c| c.is_finite())
                && coords.windows(2).all(|w| w[0] < w[1]);
            if !ascending {
                return Err(TessellationError::IrregularGrid(format!(
                    "{} coordinates must be finite and strictly ascending",
                    axis
                )));
            }
        }
        if values.len() != xs.len() * ys.len() {
            return Err(TessellationError::IrregularGrid(format!(
                "{} x {} lattice needs {} values (got {})",
                xs.len(),
                ys.len(),
                xs.len() * ys.len(),
                values.len()
            )));
        }
        if let Some(bad) = values.iter().position(|v| !v.is_finite()) {
            return Err(TessellationError::invalid_parameter(
                "values",
                format!("value {} is not finite", bad),
            ));
        }
        Ok(Self { xs, ys, values })
    }

    /// Infer the lattice from point features
    ///
    /// Coordinates within `tolerance` are treated as the same row or
    /// column. Every lattice node must be occupied by exactly one point.
    ///
    /// # Errors
    ///
    /// * `IrregularGrid` - non-point geometry, or the points do not fill a lattice
    /// * `MissingValue` - a point has neither `z_property` nor a z coordinate
    pub fn from_points(points: &FeatureCollection, z_property: &str, tolerance: &Tolerance) -> Result<Self> {
        let mut nodes: Vec<(DVec2, f64)> = Vec::with_capacity(points.len());
        for (index, feature) in points.iter().enumerate() {
            let position = match &feature.geometry {
                Some(Geometry::Point(p)) => *p,
                other => {
                    return Err(TessellationError::IrregularGrid(format!(
                        "feature {} is {}, expected a Point",
                        index,
                        other.as_ref().map_or("empty", |g| g.kind())
                    )))
                }
            };
            let value = vertex_value(feature, &position, index, z_property)?;
            nodes.push((position.xy(), value));
        }

        let xs = axis_coordinates(nodes.iter().map(|(p, _)| p.x), tolerance);
        let ys = axis_coordinates(nodes.iter().map(|(p, _)| p.y), tolerance);
        let (nx, ny) = (xs.len(), ys.len());
        if nx < 2 || ny < 2 || nx * ny != nodes.len() {
            return Err(TessellationError::IrregularGrid(format!(
                "{} points do not form a lattice ({} columns x {} rows)",
                nodes.len(),
                nx,
                ny
            )));
        }

        let mut slots: Vec<Option<f64>> = vec![None; nx * ny];
        for (p, value) in &nodes {
            let i = snap_index(&xs, p.x, tolerance);
            let j = snap_index(&ys, p.y, tolerance);
            let slot = match (i, j) {
                (Some(i), Some(j)) => &mut slots[j * nx + i],
                _ => {
                    return Err(TessellationError::IrregularGrid(format!(
                        "point ({}, {}) is off the lattice",
                        p.x, p.y
                    )))
                }
            };
            if slot.replace(*value).is_some() {
                return Err(TessellationError::IrregularGrid(format!(
                    "two points share lattice node ({}, {})",
                    p.x, p.y
                )));
            }
        }
        trace!(nx, ny, "lattice inferred from points");
        let values = slots.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect();
        Self::new(xs, ys, values)
    }

    #[inline]
    pub fn nx(&self) -> usize {
        self.xs.len()
    }

    #[inline]
    pub fn ny(&self) -> usize {
        self.ys.len()
    }

    #[inline]
    pub fn node(&self, i: usize, j: usize) -> DVec2 {
        DVec2::new(self.xs[i], self.ys[j])
    }

    #[inline]
    pub fn value(&self, i: usize, j: usize) -> f64 {
        self.values[j * self.nx() + i]
    }

    /// Where threshold `t` crosses the lattice edge between two adjacent nodes
    ///
    /// Always interpolated from the node with the lower flat index, so both
    /// cells sharing the edge get bit-identical points.
    pub(crate) fn crossing(&self, p: (usize, usize), q: (usize, usize), t: f64) -> DVec2 {
        let (from, to) = if (p.1, p.0) <= (q.1, q.0) { (p, q) } else { (q, p) };
        let (va, vb) = (self.value(from.0, from.1), self.value(to.0, to.1));
        let frac = if vb == va {
            0.5
        } else {
            ((t - va) / (vb - va)).clamp(0.0, 1.0)
        };
        let a = self.node(from.0, from.1);
        let b = self.node(to.0, to.1);
        a + (b - a) * frac
    }
}

/// Sorted distinct coordinates, merging values within tolerance
fn axis_coordinates(values: impl Iterator<Item = f64>, tolerance: &Tolerance) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.collect();
    sorted.sort_by(f64::total_cmp);
    let mut distinct: Vec<f64> = Vec::new();
    for v in sorted {
        match distinct.last() {
            Some(&last) if tolerance.eq(last, v) => {}
            _ => distinct.push(v),
        }
    }
    distinct
}

fn snap_index(axis: &[f64], v: f64, tolerance: &Tolerance) -> Option<usize> {
    let idx = axis.partition_point(|&c| c < v);
    [idx.checked_sub(1), Some(idx)]
        .into_iter()
        .flatten()
        .filter(|&i| i < axis.len())
        .find(|&i| tolerance.eq(axis[i], v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{Feature, Properties};
    use serde_json::json;

    fn lattice(nx: usize, ny: usize) -> FeatureCollection {
        let mut features = Vec::new();
        // Shuffled order: columns outer
        for i in 0..nx {
            for j in 0..ny {
                let mut properties = Properties::new();
                properties.insert("value".into(), json!((i * 10 + j) as f64));
                features.push(Feature::with_properties(
                    Geometry::point(i as f64 * 2.0, j as f64),
                    properties,
                ));
            }
        }
        FeatureCollection::new(features)
    }

    #[test]
    fn test_from_points_infers_lattice() {
        let grid = ScalarGrid::from_points(&lattice(3, 4), "value", &Tolerance::default()).unwrap();
        assert_eq!((grid.nx(), grid.ny()), (3, 4));
        assert_eq!(grid.node(2, 1), DVec2::new(4.0, 1.0));
        assert_eq!(grid.value(2, 1), 21.0);
    }

    #[test]
    fn test_missing_node_is_irregular() {
        let mut points = lattice(3, 3);
        points.features.pop();
        assert!(matches!(
            ScalarGrid::from_points(&points, "value", &Tolerance::default()),
            Err(TessellationError::IrregularGrid(_))
        ));
    }

    #[test]
    fn test_jittered_point_is_irregular() {
        let mut points = lattice(2, 2);
        points.features.push(Feature::with_properties(
            Geometry::point(1.0, 0.5),
            points.features[0].properties.clone(),
        ));
        points.features.push(Feature::with_properties(
            Geometry::point(0.0, 0.5),
            points.features[0].properties.clone(),
        ));
        assert!(ScalarGrid::from_points(&points, "value", &Tolerance::default()).is_err());
    }

    #[test]
    fn test_new_validates_shape() {
        assert!(ScalarGrid::new(vec![0.0, 1.0], vec![0.0, 1.0], vec![1.0; 4]).is_ok());
        assert!(ScalarGrid::new(vec![0.0], vec![0.0, 1.0], vec![1.0; 2]).is_err());
        assert!(ScalarGrid::new(vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0; 4]).is_err());
        assert!(ScalarGrid::new(vec![0.0, 1.0], vec![0.0, 1.0], vec![1.0; 3]).is_err());
        assert!(ScalarGrid::new(vec![0.0, 1.0], vec![0.0, 1.0], vec![1.0, f64::NAN, 1.0, 1.0]).is_err());
    }

    #[test]
    fn test_crossing_is_symmetric() {
        let grid = ScalarGrid::new(vec![0.0, 3.0], vec![0.0, 1.0], vec![0.0, 1.0, 2.0, 5.0]).unwrap();
        let forward = grid.crossing((0, 0), (1, 0), 0.3);
        let backward = grid.crossing((1, 0), (0, 0), 0.3);
        assert_eq!(forward, backward);
        assert!((forward.x - 0.9).abs() < 1e-12);
    }
}
