//! Scalar field estimation from scattered samples
//!
//! A [`FieldEstimator`] turns a sample set into a value at any planar
//! location. [`idw::IdwEstimator`] weights every sample by inverse distance;
//! [`tin::TinEstimator`] interpolates linearly inside a Delaunay triangle.

pub mod idw;
pub mod tin;

pub use idw::{interpolate, interpolate_grid, IdwEstimator};
pub use tin::{plane_point, TinEstimator};

use glam::DVec2;

use crate::error::{Result, TessellationError};
use crate::feature::{Feature, FeatureCollection};
use crate::geometry::Position;

/// Something that can estimate a scalar value at a planar location
pub trait FieldEstimator {
    /// Estimated value at `at`; `NaN` when the location is not covered
    fn estimate(&self, at: DVec2) -> f64;
}

/// A located scalar value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub position: DVec2,
    pub value: f64,
}

impl Sample {
    pub fn new(position: DVec2, value: f64) -> Self {
        Self { position, value }
    }
}

/// Value for one vertex: the named property, else the vertex z coordinate
pub(crate) fn vertex_value(
    feature: &Feature,
    position: &Position,
    index: usize,
    property: &str,
) -> Result<f64> {
    feature
        .number(property)
        .or(position.z)
        .filter(|v| v.is_finite())
        .ok_or_else(|| TessellationError::MissingValue {
            index,
            property: property.to_string(),
        })
}

/// Samples from every vertex of every feature
///
/// # Errors
///
/// Returns `MissingValue` when a feature has neither the property nor a z
/// coordinate
pub fn collect_samples(features: &FeatureCollection, property: &str) -> Result<Vec<Sample>> {
    features
        .vertices()
        .into_iter()
        .map(|(index, position)| {
            let value = vertex_value(&features.features[index], &position, index, property)?;
            Ok(Sample::new(position.xy(), value))
        })
        .collect()
}

/// Copy `targets`, writing the estimate at each representative point
///
/// Existing properties are preserved. Features without geometry get a
/// `null` value.
pub fn apply_estimator<E: FieldEstimator + ?Sized>(
    estimator: &E,
    targets: &FeatureCollection,
    output_property: &str,
) -> FeatureCollection {
    targets
        .iter()
        .map(|target| {
            let mut feature = target.clone();
            let value = feature
                .geometry
                .as_ref()
                .and_then(|g| g.representative_point())
                .map_or(f64::NAN, |at| estimator.estimate(at));
            feature.set_number(output_property, value);
            feature
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::Properties;
    use crate::geometry::Geometry;
    use serde_json::json;

    struct Constant(f64);

    impl FieldEstimator for Constant {
        fn estimate(&self, _at: DVec2) -> f64 {
            self.0
        }
    }

    #[test]
    fn test_collect_samples_falls_back_to_z() {
        let mut properties = Properties::new();
        properties.insert("temp".into(), json!(12.5));
        let features = FeatureCollection::new(vec![
            Feature::with_properties(Geometry::point(0.0, 0.0), properties),
            Feature::new(Geometry::Point(Position::with_z(1.0, 1.0, 3.0))),
        ]);
        let samples = collect_samples(&features, "temp").unwrap();
        assert_eq!(samples[0].value, 12.5);
        assert_eq!(samples[1].value, 3.0);
    }

    #[test]
    fn test_collect_samples_missing_value() {
        let features = FeatureCollection::new(vec![
            Feature::new(Geometry::Point(Position::with_z(1.0, 1.0, 3.0))),
            Feature::new(Geometry::point(2.0, 2.0)),
        ]);
        assert_eq!(
            collect_samples(&features, "temp"),
            Err(TessellationError::MissingValue {
                index: 1,
                property: "temp".into()
            })
        );
    }

    #[test]
    fn test_apply_estimator_keeps_properties() {
        let mut properties = Properties::new();
        properties.insert("id".into(), json!("cell-1"));
        let targets = FeatureCollection::new(vec![Feature::with_properties(
            Geometry::point(5.0, 5.0),
            properties,
        )]);
        let out = apply_estimator(&Constant(4.0), &targets, "value");
        assert_eq!(out.features[0].properties["id"], "cell-1");
        assert_eq!(out.features[0].number("value"), Some(4.0));
        // Input untouched
        assert!(targets.features[0].properties.get("value").is_none());
    }
}
