//! Regular lattice generation over a bounding box
//!
//! Point, square and triangle lattices step by `cell_size` from
//! `(minX, minY)`. Hex lattices use the flat-top odd-q layout in [`hex`].
//! Output is row-major: rows ascending in Y, columns ascending in X.

mod hex;

pub use hex::{hex_center, hex_vertices};

use glam::DVec2;
use tracing::debug;

use crate::bbox::BoundingBox;
use crate::config::{GridOptions, GridTopology, Tolerance};
use crate::error::Result;
use crate::feature::{Feature, FeatureCollection, Properties};
use crate::geometry::{closed_positions, Geometry, Position};
use crate::predicates;

/// Generate a lattice of points or cells over `bbox`
///
/// # Errors
///
/// Returns `InvalidParameter` if the cell size is not a positive finite number
///
/// # Example
///
/// ```rust
/// use geo_tessellation::*;
///
/// let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0).unwrap();
/// let options = GridOptions::new(5.0, GridTopology::Square).unwrap();
/// let cells = grid::generate(&bbox, &options).unwrap();
/// assert_eq!(cells.len(), 4);
/// ```
pub fn generate(bbox: &BoundingBox, options: &GridOptions) -> Result<FeatureCollection> {
    // Options may have been assembled by hand rather than through the builder
    GridOptions::new(options.cell_size, options.topology)?;

    let mut emitter = CellEmitter::new(options);
    match options.topology {
        GridTopology::Point => point_lattice(bbox, options.cell_size, &mut emitter),
        GridTopology::Square => square_lattice(bbox, options.cell_size, false, &mut emitter),
        GridTopology::Triangle => square_lattice(bbox, options.cell_size, true, &mut emitter),
        GridTopology::Hex => hex::hex_lattice(bbox, options.cell_size, options.hex_triangles, &mut emitter),
    }

    debug!(
        topology = options.topology.name(),
        cell_size = options.cell_size,
        kept = emitter.features.len(),
        masked = emitter.masked,
        "grid generated"
    );
    Ok(FeatureCollection::new(emitter.features))
}

/// Collects cells, applying the mask and copying the shared properties
pub(crate) struct CellEmitter<'a> {
    mask: Option<&'a Geometry>,
    properties: &'a Properties,
    tolerance: Tolerance,
    features: Vec<Feature>,
    masked: usize,
}

impl<'a> CellEmitter<'a> {
    fn new(options: &'a GridOptions) -> Self {
        Self {
            mask: options.mask.as_ref(),
            properties: &options.properties,
            tolerance: options.tolerance,
            features: Vec::new(),
            masked: 0,
        }
    }

    fn keeps(&mut self, representative: DVec2) -> bool {
        let keep = self
            .mask
            .map_or(true, |mask| mask.contains_point(representative, &self.tolerance));
        if !keep {
            self.masked += 1;
        }
        keep
    }

    pub(crate) fn point(&mut self, at: DVec2) {
        if self.keeps(at) {
            let geometry = Geometry::Point(Position::from(at));
            self.features
                .push(Feature::with_properties(geometry, self.properties.clone()));
        }
    }

    /// Emit an open counter-clockwise ring as a polygon cell
    pub(crate) fn polygon(&mut self, ring: &[DVec2], representative: DVec2) {
        if predicates::signed_area(ring) <= 0.0 || !self.keeps(representative) {
            return;
        }
        let geometry = Geometry::Polygon(vec![closed_positions(ring)]);
        self.features
            .push(Feature::with_properties(geometry, self.properties.clone()));
    }
}

/// Lattice coordinates `start + i * step` that satisfy `keep`
pub(crate) fn steps(start: f64, step: f64, keep: impl Fn(f64) -> bool) -> Vec<f64> {
    let mut values = Vec::new();
    let mut i = 0usize;
    loop {
        let v = start + i as f64 * step;
        if !keep(v) {
            break;
        }
        values.push(v);
        i += 1;
    }
    values
}

fn point_lattice(bbox: &BoundingBox, size: f64, emitter: &mut CellEmitter) {
    let eps = emitter.tolerance.epsilon();
    let xs = steps(bbox.min_x, size, |x| x <= bbox.max_x + eps);
    let ys = steps(bbox.min_y, size, |y| y <= bbox.max_y + eps);
    for &y in &ys {
        for &x in &xs {
            emitter.point(DVec2::new(x, y));
        }
    }
}

/// Square cells, or pairs of triangles per square when `split` is set
///
/// Cell origins must lie strictly inside the box; the last row and column
/// are clipped to the box edge.
fn square_lattice(bbox: &BoundingBox, size: f64, split: bool, emitter: &mut CellEmitter) {
    let eps = emitter.tolerance.epsilon();
    let xs = steps(bbox.min_x, size, |x| x < bbox.max_x - eps);
    let ys = steps(bbox.min_y, size, |y| y < bbox.max_y - eps);

    for (j, &y0) in ys.iter().enumerate() {
        let y1 = (y0 + size).min(bbox.max_y);
        for (i, &x0) in xs.iter().enumerate() {
            let x1 = (x0 + size).min(bbox.max_x);
            let sw = DVec2::new(x0, y0);
            let se = DVec2::new(x1, y0);
            let ne = DVec2::new(x1, y1);
            let nw = DVec2::new(x0, y1);

            if !split {
                emitter.polygon(&[sw, se, ne, nw], (sw + ne) / 2.0);
                continue;
            }
            // Alternate the diagonal so neighbouring squares mirror each other
            let halves = if (i + j) % 2 == 0 {
                [[sw, se, ne], [sw, ne, nw]]
            } else {
                [[sw, se, nw], [se, ne, nw]]
            };
            for tri in halves {
                let centroid = (tri[0] + tri[1] + tri[2]) / 3.0;
                emitter.polygon(&tri, centroid);
            }
        }
    }
}
