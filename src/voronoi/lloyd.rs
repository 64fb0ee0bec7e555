//! Lloyd's Relaxation for uniform site distribution
//!
//! Each iteration moves every site to the area centroid of its clipped
//! Voronoi cell, which evens out cell sizes inside the bounding box.

use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

use super::diagram::VoronoiDiagram;
use crate::bbox::BoundingBox;
use crate::error::{Result, TessellationError};

/// Options for Lloyd's relaxation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LloydOptions {
    /// Maximum number of iterations to run
    pub max_iterations: usize,
    /// Stop when the largest site move is below this fraction of the bbox
    /// diagonal; 0.0 disables early termination
    pub convergence_threshold: f64,
}

impl Default for LloydOptions {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            convergence_threshold: 0.001,
        }
    }
}

impl LloydOptions {
    pub(crate) fn validate(&self) -> Result<()> {
        if !self.convergence_threshold.is_finite() || self.convergence_threshold < 0.0 {
            return Err(TessellationError::invalid_parameter(
                "convergence_threshold",
                format!("must be finite and >= 0 (got {})", self.convergence_threshold),
            ));
        }
        Ok(())
    }
}

/// Relax `sites` inside `bbox`
///
/// Sites whose cell is empty (outside the box) stay where they are.
///
/// # Errors
///
/// * `DuplicatePoint` - two sites share coordinates
/// * `InvalidParameter` - negative or non-finite convergence threshold
pub fn lloyd_relaxation(mut sites: Vec<DVec2>, bbox: &BoundingBox, options: &LloydOptions) -> Result<Vec<DVec2>> {
    options.validate()?;
    let diagonal = bbox.max().distance(bbox.min());
    let threshold = options.convergence_threshold * diagonal;
    let total_start = Instant::now();

    info!(
        sites = sites.len(),
        max_iterations = options.max_iterations,
        threshold,
        "lloyd relaxation starting"
    );

    let mut iterations_run = 0;
    let mut converged = false;
    for iteration in 0..options.max_iterations {
        let iter_start = Instant::now();
        let diagram = VoronoiDiagram::new(&sites, bbox)?;

        let mut max_displacement: f64 = 0.0;
        sites = diagram
            .cells()
            .iter()
            .map(|cell| {
                let moved = cell.centroid();
                max_displacement = max_displacement.max(moved.distance(cell.site));
                moved
            })
            .collect();
        iterations_run = iteration + 1;

        debug!(
            iteration = iterations_run,
            max_displacement,
            elapsed = ?iter_start.elapsed(),
            "lloyd iteration"
        );

        if threshold > 0.0 && max_displacement < threshold {
            converged = true;
            break;
        }
    }

    info!(
        iterations = iterations_run,
        converged,
        elapsed = ?total_start.elapsed(),
        "lloyd relaxation finished"
    );
    Ok(sites)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::random_points;

    fn cell_area_spread(sites: &[DVec2], bbox: &BoundingBox) -> f64 {
        let diagram = VoronoiDiagram::new(sites, bbox).unwrap();
        let areas: Vec<f64> = diagram.cells().iter().map(|c| c.area()).collect();
        let max = areas.iter().copied().fold(f64::MIN, f64::max);
        let min = areas.iter().copied().fold(f64::MAX, f64::min);
        max - min
    }

    #[test]
    fn test_lloyd_evens_out_cells() {
        let bbox = BoundingBox::new(0.0, 0.0, 100.0, 100.0).unwrap();
        let sites = random_points(&bbox, 40, 42);
        let before = cell_area_spread(&sites, &bbox);

        let options = LloydOptions {
            max_iterations: 10,
            convergence_threshold: 0.0,
        };
        let relaxed = lloyd_relaxation(sites, &bbox, &options).unwrap();
        assert_eq!(relaxed.len(), 40);
        assert!(relaxed.iter().all(|p| bbox.contains(*p)));
        assert!(cell_area_spread(&relaxed, &bbox) < before);
    }

    #[test]
    fn test_lloyd_determinism() {
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0).unwrap();
        let a = lloyd_relaxation(random_points(&bbox, 25, 7), &bbox, &LloydOptions::default()).unwrap();
        let b = lloyd_relaxation(random_points(&bbox, 25, 7), &bbox, &LloydOptions::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_iterations_is_identity() {
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0).unwrap();
        let sites = random_points(&bbox, 10, 1);
        let options = LloydOptions {
            max_iterations: 0,
            ..LloydOptions::default()
        };
        assert_eq!(lloyd_relaxation(sites.clone(), &bbox, &options).unwrap(), sites);
    }

    #[test]
    fn test_bad_threshold_rejected() {
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0).unwrap();
        let options = LloydOptions {
            max_iterations: 1,
            convergence_threshold: -1.0,
        };
        assert!(lloyd_relaxation(Vec::new(), &bbox, &options).is_err());
    }
}
