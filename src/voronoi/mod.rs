//! Voronoi tessellation clipped to a bounding box
//!
//! Cells are built from the Delaunay adjacency of the sites: each cell is
//! the bounding box cut down by the bisector half-planes of its Delaunay
//! neighbours.

pub mod cell;
mod clip;
mod diagram;
mod lloyd;

pub use cell::VoronoiCell;
pub use diagram::VoronoiDiagram;
pub use lloyd::{lloyd_relaxation, LloydOptions};

use glam::DVec2;
use serde_json::Value;

use crate::bbox::BoundingBox;
use crate::error::{Result, TessellationError};
use crate::feature::{Feature, FeatureCollection};
use crate::geometry::{closed_positions, Geometry};

/// Property holding the index of the generating point
pub const SITE_INDEX_PROPERTY: &str = "index";

/// One polygon per input point, clipped to `bbox`
///
/// Output feature `i` belongs to input feature `i`: it carries a copy of
/// that feature's properties plus [`SITE_INDEX_PROPERTY`]. A point whose
/// cell misses the box gets a feature with `null` geometry.
///
/// # Errors
///
/// * `DuplicatePoint` - two points share coordinates
/// * `InvalidGeometry` - an input feature is not a Point
pub fn build(points: &FeatureCollection, bbox: &BoundingBox) -> Result<FeatureCollection> {
    let sites = sites_of(points)?;
    let diagram = VoronoiDiagram::new(&sites, bbox)?;
    let features = diagram
        .cells()
        .iter()
        .zip(points.iter())
        .map(|(cell, source)| {
            let mut properties = source.properties.clone();
            properties.insert(SITE_INDEX_PROPERTY.to_string(), Value::from(cell.id));
            let geometry = (!cell.is_empty()).then(|| Geometry::Polygon(vec![closed_positions(&cell.vertices)]));
            Feature {
                id: source.id.clone(),
                geometry,
                properties,
            }
        })
        .collect();
    Ok(features)
}

/// Site coordinates of a point collection
pub(crate) fn sites_of(points: &FeatureCollection) -> Result<Vec<DVec2>> {
    points
        .iter()
        .enumerate()
        .map(|(index, feature)| match &feature.geometry {
            Some(Geometry::Point(p)) => Ok(p.xy()),
            other => Err(TessellationError::InvalidGeometry(format!(
                "voronoi input {} is {}, expected a Point",
                index,
                other.as_ref().map_or("empty", |g| g.kind())
            ))),
        })
        .collect()
}
