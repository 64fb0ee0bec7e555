//! Triangulated irregular networks
//!
//! [`triangulate`] turns a point collection into Delaunay triangle
//! features. When a value property is given, each triangle carries the
//! values of its corners under [`CORNER_KEYS`], in ring order.

mod delaunay;

pub use delaunay::{triangulate_points, Triangulation};
pub(crate) use delaunay::lexicographic;

use glam::DVec2;

use crate::error::Result;
use crate::feature::{number_value, Feature, FeatureCollection, Properties};
use crate::field::vertex_value;
use crate::geometry::{closed_positions, Geometry};

/// Property keys for the values at the three triangle corners
pub const CORNER_KEYS: [&str; 3] = ["a", "b", "c"];

/// Build a TIN over every vertex of `points`
///
/// Triangles are counter-clockwise, start at the corner with the lowest
/// input index and come out in a stable order. Exact duplicate vertices
/// are ignored after their first occurrence.
///
/// # Errors
///
/// * `DegenerateInput` - fewer than 3 distinct points, or all collinear
/// * `MissingValue` - `value_property` is set and a point has neither the
///   property nor a z coordinate
pub fn triangulate(points: &FeatureCollection, value_property: Option<&str>) -> Result<FeatureCollection> {
    let vertices = points.vertices();
    let positions: Vec<DVec2> = vertices.iter().map(|(_, p)| p.xy()).collect();
    let values: Option<Vec<f64>> = value_property
        .map(|property| {
            vertices
                .iter()
                .map(|(index, p)| vertex_value(&points.features[*index], p, *index, property))
                .collect::<Result<Vec<f64>>>()
        })
        .transpose()?;

    let tin = triangulate_points(&positions)?;
    let features = tin
        .triangles()
        .iter()
        .map(|tri| {
            let ring = tin.corners(tri);
            let mut properties = Properties::new();
            if let Some(values) = &values {
                for (key, &corner) in CORNER_KEYS.iter().zip(tri) {
                    properties.insert(key.to_string(), number_value(values[corner]));
                }
            }
            Feature::with_properties(Geometry::Polygon(vec![closed_positions(&ring)]), properties)
        })
        .collect();
    Ok(features)
}
