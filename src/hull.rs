//! Convex and concave hulls of point sets

use glam::DVec2;
use tracing::debug;

use crate::config::{ConvexHullOptions, Tolerance};
use crate::error::{Result, TessellationError};
use crate::feature::{Feature, FeatureCollection};
use crate::geometry::{closed_positions, Geometry};
use crate::predicates::orient2d;
use crate::rings::{normalize_ring_start, RingAssembler};
use crate::triangulation::{lexicographic, triangulate_points, Triangulation};

/// Hull of every vertex in `features`
///
/// Without a concavity (or with an infinite one) this is the convex hull:
/// a counter-clockwise ring starting at the lowest (x, then y) vertex, with
/// collinear boundary points dropped. A finite concavity `c` carves a
/// concave hull whose longest kept edge is `c` times the mean Delaunay
/// edge length, falling back to the convex hull when carving leaves
/// nothing.
///
/// # Errors
///
/// * `InsufficientData` - fewer than 3 distinct vertices
/// * `DegenerateInput` - all vertices collinear
/// * `InvalidParameter` - concavity is NaN or not positive
pub fn convex_hull(features: &FeatureCollection, options: &ConvexHullOptions) -> Result<Feature> {
    let points = distinct_points(features);
    let ring = monotone_chain(&points)?;

    if let Some(concavity) = options.concavity {
        if concavity.is_nan() || concavity <= 0.0 {
            return Err(TessellationError::invalid_parameter(
                "concavity",
                format!("must be positive (got {})", concavity),
            ));
        }
        if concavity.is_finite() {
            let tin = triangulate_points(&points)?;
            let edges = tin.edges();
            let mean = edges
                .iter()
                .map(|&(a, b)| tin.points()[a].distance(tin.points()[b]))
                .sum::<f64>()
                / edges.len() as f64;
            if let Some(geometry) = carve(&tin, concavity * mean) {
                return Ok(Feature::new(geometry));
            }
            debug!(concavity, "concave hull empty, using convex hull");
        }
    }

    Ok(Feature::new(Geometry::Polygon(vec![closed_positions(&ring)])))
}

/// Concave hull from a Delaunay triangulation with long edges removed
///
/// Returns `Ok(None)` when no hull can be formed: too few or collinear
/// points, or every triangle has an edge longer than `max_edge`.
///
/// # Errors
///
/// Returns `InvalidParameter` when `max_edge` is not positive and finite
pub fn concave_hull(points: &FeatureCollection, max_edge: f64) -> Result<Option<Feature>> {
    if !max_edge.is_finite() || max_edge <= 0.0 {
        return Err(TessellationError::invalid_parameter(
            "max_edge",
            format!("must be positive and finite (got {})", max_edge),
        ));
    }
    let positions = distinct_points(points);
    let tin = match triangulate_points(&positions) {
        Ok(tin) => tin,
        Err(TessellationError::DegenerateInput(reason)) => {
            debug!(%reason, "no triangulation, concave hull is empty");
            return Ok(None);
        }
        Err(err) => return Err(err),
    };
    Ok(carve(&tin, max_edge).map(Feature::new))
}

/// Union of the triangles whose edges are all at most `max_edge`
fn carve(tin: &Triangulation, max_edge: f64) -> Option<Geometry> {
    let mut assembler = RingAssembler::new(Tolerance::default());
    let mut kept = 0usize;
    for triangle in tin.triangles() {
        let corners = tin.corners(triangle);
        let longest = (0..3)
            .map(|k| corners[k].distance(corners[(k + 1) % 3]))
            .fold(0.0, f64::max);
        if longest <= max_edge {
            assembler.add_ring(&corners);
            kept += 1;
        }
    }

    let polygons: Vec<Vec<Vec<DVec2>>> = assembler
        .assemble()
        .into_iter()
        .filter(|polygon| polygon.first().map_or(false, |exterior| exterior.len() >= 3))
        .collect();
    debug!(
        triangles = tin.triangles().len(),
        kept,
        polygons = polygons.len(),
        max_edge,
        "concave hull carved"
    );

    let mut rings: Vec<Vec<Vec<_>>> = polygons
        .into_iter()
        .map(|polygon| {
            polygon
                .into_iter()
                .map(|mut ring| {
                    normalize_ring_start(&mut ring);
                    closed_positions(&ring)
                })
                .collect()
        })
        .collect();
    match rings.len() {
        0 => None,
        1 => rings.pop().map(Geometry::Polygon),
        _ => Some(Geometry::MultiPolygon(rings)),
    }
}

fn distinct_points(features: &FeatureCollection) -> Vec<DVec2> {
    let mut points: Vec<DVec2> = features.vertices().iter().map(|(_, p)| p.xy()).collect();
    points.sort_by(|a, b| lexicographic(*a, *b));
    points.dedup();
    points
}

/// Andrew's monotone chain over sorted, distinct points
fn monotone_chain(points: &[DVec2]) -> Result<Vec<DVec2>> {
    if points.len() < 3 {
        return Err(TessellationError::InsufficientData(format!(
            "convex hull needs at least 3 distinct points, got {}",
            points.len()
        )));
    }

    let mut lower: Vec<DVec2> = Vec::with_capacity(points.len());
    for &p in points {
        while lower.len() >= 2 && orient2d(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(p);
    }
    let mut upper: Vec<DVec2> = Vec::with_capacity(points.len());
    for &p in points.iter().rev() {
        while upper.len() >= 2 && orient2d(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(p);
    }
    lower.pop();
    upper.pop();
    lower.extend(upper);

    if lower.len() < 3 {
        return Err(TessellationError::DegenerateInput(
            "convex hull of collinear points has no area".into(),
        ));
    }
    Ok(lower)
}
