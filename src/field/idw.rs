//! Inverse Distance Weighting (IDW) interpolation
//!
//! ```text
//! z(x) = Σ(zi / di^p) / Σ(1 / di^p)
//! ```
//!
//! Every sample takes part (global IDW). A target that coincides with a
//! sample returns that sample's value exactly.

use glam::DVec2;
use tracing::debug;

use super::{apply_estimator, collect_samples, FieldEstimator, Sample};
use crate::bbox::BoundingBox;
use crate::config::{GridOptions, IdwOptions};
use crate::error::{Result, TessellationError};
use crate::feature::FeatureCollection;
use crate::grid;

/// Global inverse-distance estimator
#[derive(Debug, Clone)]
pub struct IdwEstimator {
    samples: Vec<Sample>,
    exponent: f64,
}

impl IdwEstimator {
    /// Create an estimator over `samples` with distance exponent `exponent`
    ///
    /// # Errors
    ///
    /// Returns `InsufficientData` for an empty sample set and
    /// `InvalidParameter` for a negative or non-finite exponent
    pub fn new(samples: Vec<Sample>, exponent: f64) -> Result<Self> {
        if samples.is_empty() {
            return Err(TessellationError::InsufficientData(
                "IDW needs at least one sample".into(),
            ));
        }
        IdwOptions {
            weight_exponent: exponent,
            ..IdwOptions::default()
        }
        .validate()?;
        Ok(Self { samples, exponent })
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }
}

impl FieldEstimator for IdwEstimator {
    fn estimate(&self, at: DVec2) -> f64 {
        let mut nearest = f64::INFINITY;
        for sample in &self.samples {
            let d = sample.position.distance(at);
            if d == 0.0 {
                return sample.value;
            }
            nearest = nearest.min(d);
        }

        // Weights are scaled by the nearest distance so large exponents
        // cannot underflow every weight to zero
        let mut weighted = 0.0;
        let mut total = 0.0;
        for sample in &self.samples {
            let w = (nearest / sample.position.distance(at)).powf(self.exponent);
            weighted += w * sample.value;
            total += w;
        }
        weighted / total
    }
}

/// Interpolate sample values onto target features
///
/// Targets keep their properties and gain `options.output_property`.
/// Polygon targets are evaluated at their representative point.
///
/// # Errors
///
/// * `InsufficientData` - no samples
/// * `MissingValue` - a sample has neither the value property nor a z coordinate
/// * `InvalidParameter` - bad weight exponent
pub fn interpolate(
    samples: &FeatureCollection,
    targets: &FeatureCollection,
    options: &IdwOptions,
) -> Result<FeatureCollection> {
    options.validate()?;
    let estimator = IdwEstimator::new(
        collect_samples(samples, &options.value_property)?,
        options.weight_exponent,
    )?;
    let output = apply_estimator(&estimator, targets, &options.output_property);
    debug!(
        samples = estimator.samples.len(),
        targets = output.len(),
        exponent = options.weight_exponent,
        "idw interpolation done"
    );
    Ok(output)
}

/// Generate a grid over `bbox` and interpolate onto it
pub fn interpolate_grid(
    samples: &FeatureCollection,
    bbox: &BoundingBox,
    grid_options: &GridOptions,
    idw_options: &IdwOptions,
) -> Result<FeatureCollection> {
    let targets = grid::generate(bbox, grid_options)?;
    interpolate(samples, &targets, idw_options)
}
