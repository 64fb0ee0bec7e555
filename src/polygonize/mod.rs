//! Polygons from a noded network of lines
//!
//! Edges are merged into a planar graph, dangles are pruned to a fixed
//! point, cut edges are set aside, and every minimal enclosed face becomes
//! one polygon. Faces nested inside other faces are not turned into holes.

mod graph;

use glam::DVec2;
use tracing::debug;

use self::graph::PlanarGraph;
use crate::config::Tolerance;
use crate::error::{Result, TessellationError};
use crate::feature::{Feature, FeatureCollection};
use crate::geometry::{closed_positions, Geometry, Position};
use crate::predicates::signed_area;
use crate::rings::normalize_ring_start;

/// Polygonize with the default tolerance
///
/// # Example
///
/// ```
/// use geo_tessellation::geometry::{Geometry, Position};
/// use geo_tessellation::{polygonize, Feature, FeatureCollection};
///
/// let edges = [[(0.0, 0.0), (4.0, 0.0)], [(4.0, 0.0), (0.0, 4.0)], [(0.0, 4.0), (0.0, 0.0)]];
/// let lines: FeatureCollection = edges
///     .iter()
///     .map(|[a, b]| {
///         let line = vec![Position::new(a.0, a.1), Position::new(b.0, b.1)];
///         Feature::new(Geometry::line_string(line).unwrap())
///     })
///     .collect();
/// let polygons = polygonize(&lines).unwrap();
/// assert_eq!(polygons.len(), 1);
/// ```
pub fn polygonize(lines: &FeatureCollection) -> Result<FeatureCollection> {
    polygonize_with_tolerance(lines, &Tolerance::default())
}

/// Polygonize, merging vertices closer than `tolerance`
///
/// Accepts LineString, MultiLineString, Polygon and MultiPolygon features
/// (polygons contribute their ring edges); features without geometry are
/// skipped. Output rings are counter-clockwise and start at their lowest
/// (x, then y) vertex.
///
/// # Errors
///
/// * `InvalidTopology` - two edges cross away from a shared vertex
/// * `InvalidGeometry` - a Point or MultiPoint feature
pub fn polygonize_with_tolerance(lines: &FeatureCollection, tolerance: &Tolerance) -> Result<FeatureCollection> {
    let mut graph = PlanarGraph::new(*tolerance);
    for (index, feature) in lines.iter().enumerate() {
        let Some(geometry) = &feature.geometry else {
            continue;
        };
        for path in paths(geometry, index)? {
            for pair in path.windows(2) {
                graph.add_segment(pair[0].xy(), pair[1].xy());
            }
        }
    }

    graph.check_noding()?;
    let dangles = graph.prune_dangles();
    let bridges = graph.mark_bridges();

    let mut rings: Vec<Vec<DVec2>> = graph
        .faces()
        .into_iter()
        .filter(|ring| signed_area(ring) > 0.0)
        .collect();
    for ring in &mut rings {
        normalize_ring_start(ring);
    }

    debug!(
        edges = graph.edge_count(),
        dangles,
        bridges,
        polygons = rings.len(),
        "polygonize done"
    );

    Ok(rings
        .iter()
        .map(|ring| Feature::new(Geometry::Polygon(vec![closed_positions(ring)])))
        .collect())
}

fn paths(geometry: &Geometry, index: usize) -> Result<Vec<&[Position]>> {
    Ok(match geometry {
        Geometry::LineString(line) => vec![line.as_slice()],
        Geometry::MultiLineString(lines) => lines.iter().map(Vec::as_slice).collect(),
        Geometry::Polygon(rings) => rings.iter().map(Vec::as_slice).collect(),
        Geometry::MultiPolygon(polygons) => polygons.iter().flatten().map(Vec::as_slice).collect(),
        Geometry::Point(_) | Geometry::MultiPoint(_) => {
            return Err(TessellationError::InvalidGeometry(format!(
                "polygonize input {} is a {}, expected lines or polygons",
                index,
                geometry.kind()
            )))
        }
    })
}
