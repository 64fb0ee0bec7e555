//! Isolines and isobands over a rectilinear scalar lattice
//!
//! Both modes run marching squares over the lattice cells. A node value
//! equal to a break counts as above it. Saddle cells are resolved by the
//! mean of the four corners: when the mean falls on the same side as the
//! bottom-left corner, that corner connects through the cell centre to
//! its opposite corner.
//!
//! ```
//! use geo_tessellation::contour::{isolines, ScalarGrid};
//! use geo_tessellation::ContourOptions;
//!
//! let grid = ScalarGrid::new(
//!     vec![0.0, 1.0, 2.0],
//!     vec![0.0, 1.0],
//!     vec![0.0, 1.0, 2.0, 0.0, 1.0, 2.0],
//! )
//! .unwrap();
//! let lines = isolines(&grid, &[0.5, 1.5], &ContourOptions::default()).unwrap();
//! assert_eq!(lines.len(), 2);
//! ```

mod grid;
mod isobands;
mod isolines;

pub use grid::ScalarGrid;

use serde_json::Value;
use tracing::debug;

use crate::config::ContourOptions;
use crate::error::{Result, TessellationError};
use crate::feature::{number_value, Feature, FeatureCollection, Properties};
use crate::geometry::Geometry;

/// Which contour product to extract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContourMode {
    /// One MultiLineString per break
    Lines,
    /// One MultiPolygon per pair of adjacent breaks
    Bands,
}

/// Extract contours from a lattice
///
/// # Errors
///
/// Returns `InvalidBreaks` for empty, non-finite or non-ascending breaks,
/// or fewer than 2 breaks in band mode
pub fn extract(
    grid: &ScalarGrid,
    breaks: &[f64],
    mode: ContourMode,
    options: &ContourOptions,
) -> Result<FeatureCollection> {
    match mode {
        ContourMode::Lines => isolines(grid, breaks, options),
        ContourMode::Bands => isobands(grid, breaks, options),
    }
}

/// Extract contours from point features laid out on a lattice
///
/// Node values come from `options.z_property`, falling back to z.
///
/// # Errors
///
/// In addition to [`extract`]'s errors, `IrregularGrid` when the points do
/// not fill a rectilinear lattice and `MissingValue` for valueless points
pub fn extract_from_points(
    points: &FeatureCollection,
    breaks: &[f64],
    mode: ContourMode,
    options: &ContourOptions,
) -> Result<FeatureCollection> {
    validate_breaks(breaks, mode)?;
    let grid = ScalarGrid::from_points(points, &options.z_property, &options.tolerance)?;
    extract(&grid, breaks, mode, options)
}

/// Isolines at each break, one MultiLineString feature per break
pub fn isolines(grid: &ScalarGrid, breaks: &[f64], options: &ContourOptions) -> Result<FeatureCollection> {
    validate_breaks(breaks, ContourMode::Lines)?;
    let features: Vec<Feature> = breaks
        .iter()
        .enumerate()
        .map(|(i, &threshold)| {
            let lines = isolines::trace(grid, threshold, &options.tolerance);
            let properties = contour_properties(options, i, number_value(threshold));
            Feature::with_properties(Geometry::MultiLineString(lines), properties)
        })
        .collect();
    debug!(breaks = breaks.len(), nx = grid.nx(), ny = grid.ny(), "isolines extracted");
    Ok(FeatureCollection::new(features))
}

/// Isobands between adjacent breaks, one MultiPolygon feature per band
///
/// Band `i` covers `breaks[i] <= v < breaks[i + 1]`.
pub fn isobands(grid: &ScalarGrid, breaks: &[f64], options: &ContourOptions) -> Result<FeatureCollection> {
    validate_breaks(breaks, ContourMode::Bands)?;
    let features: Vec<Feature> = breaks
        .windows(2)
        .enumerate()
        .map(|(i, pair)| {
            let polygons = isobands::trace(grid, pair[0], pair[1], &options.tolerance);
            let label = Value::String(format!("{}-{}", pair[0], pair[1]));
            let properties = contour_properties(options, i, label);
            Feature::with_properties(Geometry::MultiPolygon(polygons), properties)
        })
        .collect();
    debug!(bands = features.len(), nx = grid.nx(), ny = grid.ny(), "isobands extracted");
    Ok(FeatureCollection::new(features))
}

fn validate_breaks(breaks: &[f64], mode: ContourMode) -> Result<()> {
    let needed = match mode {
        ContourMode::Lines => 1,
        ContourMode::Bands => 2,
    };
    if breaks.len() < needed {
        return Err(TessellationError::InvalidBreaks(format!(
            "need at least {} break(s), got {}",
            needed,
            breaks.len()
        )));
    }
    if let Some(bad) = breaks.iter().find(|b| !b.is_finite()) {
        return Err(TessellationError::InvalidBreaks(format!("{} is not finite", bad)));
    }
    if let Some(w) = breaks.windows(2).find(|w| w[0] >= w[1]) {
        return Err(TessellationError::InvalidBreaks(format!(
            "breaks must be strictly ascending ({} then {})",
            w[0], w[1]
        )));
    }
    Ok(())
}

/// Common properties, then the z label, then the per-break properties
fn contour_properties(options: &ContourOptions, index: usize, z: Value) -> Properties {
    let mut properties = options.common_properties.clone();
    properties.insert(options.z_property.clone(), z);
    if let Some(extra) = options.breaks_properties.get(index) {
        for (key, value) in extra {
            properties.insert(key.clone(), value.clone());
        }
    }
    properties
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContourOptionsBuilder;
    use crate::geometry::Position;
    use serde_json::json;

    fn ramp() -> ScalarGrid {
        // v = x over a 4 x 3 lattice
        let xs = vec![0.0, 1.0, 2.0, 3.0];
        let ys = vec![0.0, 1.0, 2.0];
        let values = (0..3).flat_map(|_| xs.clone()).collect();
        ScalarGrid::new(xs, ys, values).unwrap()
    }

    #[test]
    fn test_breaks_validation() {
        let grid = ramp();
        let options = ContourOptions::default();
        for breaks in [&[][..], &[1.0, 1.0][..], &[2.0, 1.0][..], &[f64::NAN][..]] {
            assert!(matches!(
                isolines(&grid, breaks, &options),
                Err(TessellationError::InvalidBreaks(_))
            ));
        }
        assert!(matches!(
            isobands(&grid, &[1.0], &options),
            Err(TessellationError::InvalidBreaks(_))
        ));
    }

    #[test]
    fn test_isoline_on_ramp_is_straight() {
        let lines = isolines(&ramp(), &[1.5], &ContourOptions::default()).unwrap();
        assert_eq!(lines.len(), 1);
        let Some(Geometry::MultiLineString(parts)) = &lines.features[0].geometry else {
            panic!("expected a MultiLineString");
        };
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].len(), 3);
        assert!(parts[0].iter().all(|p| (p.x - 1.5).abs() < 1e-12));
        assert_eq!(lines.features[0].number("value"), Some(1.5));
    }

    #[test]
    fn test_break_outside_range_gives_empty_feature() {
        let lines = isolines(&ramp(), &[10.0], &ContourOptions::default()).unwrap();
        assert_eq!(lines.features[0].geometry, Some(Geometry::MultiLineString(vec![])));
    }

    #[test]
    fn test_isoband_on_ramp_is_rectangle() {
        let bands = isobands(&ramp(), &[0.5, 2.5], &ContourOptions::default()).unwrap();
        assert_eq!(bands.len(), 1);
        assert_eq!(bands.features[0].properties["value"], json!("0.5-2.5"));
        let Some(Geometry::MultiPolygon(polygons)) = &bands.features[0].geometry else {
            panic!("expected a MultiPolygon");
        };
        assert_eq!(polygons.len(), 1);
        assert_eq!(polygons[0].len(), 1);
        // Closed ring, collinear vertices removed
        assert_eq!(polygons[0][0].len(), 5);
        assert_eq!(polygons[0][0][0], Position::new(0.5, 0.0));
    }

    #[test]
    fn test_property_precedence() {
        let mut common = Properties::new();
        common.insert("stroke".into(), json!("black"));
        common.insert("source".into(), json!("survey"));
        let mut first = Properties::new();
        first.insert("stroke".into(), json!("red"));
        let options = ContourOptionsBuilder::new()
            .common_properties(common)
            .breaks_properties(vec![first])
            .build();

        let lines = isolines(&ramp(), &[1.0, 2.0], &options).unwrap();
        assert_eq!(lines.features[0].properties["stroke"], "red");
        assert_eq!(lines.features[1].properties["stroke"], "black");
        assert_eq!(lines.features[1].properties["source"], "survey");
    }

    #[test]
    fn test_extract_from_points() {
        let points: FeatureCollection = (0..3)
            .flat_map(|j| (0..3).map(move |i| (i, j)))
            .map(|(i, j)| {
                let mut properties = Properties::new();
                properties.insert("elevation".into(), json!((i + j) as f64));
                Feature::with_properties(Geometry::point(i as f64, j as f64), properties)
            })
            .collect();
        let options = ContourOptionsBuilder::new().z_property("elevation").unwrap().build();
        let bands = extract_from_points(&points, &[0.0, 2.0, 5.0], ContourMode::Bands, &options).unwrap();
        assert_eq!(bands.len(), 2);
        assert_eq!(bands.features[1].properties["elevation"], json!("2-5"));
    }
}
