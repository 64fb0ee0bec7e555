//! Planar tessellation and field interpolation over GeoJSON-style features
//!
//! Turns scattered samples and bounding boxes into structured coverage:
//! regular grids, inverse-distance fields, Delaunay TINs, Voronoi
//! diagrams, isolines and isobands, hulls, and polygons recovered from
//! noded line networks.
//!
//! # Quick Start
//!
//! ```rust
//! use geo_tessellation::*;
//!
//! // Scatter some samples and give each a value
//! let bbox = BoundingBox::new(0.0, 0.0, 100.0, 100.0).unwrap();
//! let mut samples = random_point_features(&bbox, 25, 42);
//! for feature in &mut samples.features {
//!     let x = feature.geometry.as_ref().and_then(|g| g.representative_point()).unwrap().x;
//!     feature.set_number("value", x / 10.0);
//! }
//!
//! // Interpolate onto a point lattice, then contour it
//! let lattice = GridOptions::new(10.0, GridTopology::Point).unwrap();
//! let field = field::interpolate_grid(&samples, &bbox, &lattice, &IdwOptions::default()).unwrap();
//! let bands = contour::extract_from_points(
//!     &field,
//!     &[0.0, 2.5, 5.0, 7.5, 10.0],
//!     ContourMode::Bands,
//!     &ContourOptions::default(),
//! )
//! .unwrap();
//! assert_eq!(bands.len(), 4);
//!
//! // Voronoi cells of the samples
//! let cells = voronoi::build(&samples, &bbox).unwrap();
//! assert_eq!(cells.len(), samples.len());
//! ```
//!
//! # Features
//!
//! - `spatial-index` (default): O(log n) position-to-cell lookups on
//!   [`VoronoiDiagram`] using a KD-tree
//!
//! All distances and sizes are planar, in the units of the coordinates.
//! Coordinate equality goes through one [`Tolerance`] (default
//! [`DEFAULT_EPSILON`]).

// Modules
pub mod error;
pub mod config;
pub mod geometry;
pub mod feature;
pub mod bbox;
pub mod predicates;
pub mod rings;
pub mod grid;
pub mod field;
pub mod contour;
pub mod triangulation;
pub mod voronoi;
pub mod hull;
pub mod polygonize;
pub mod sampling;

#[cfg(feature = "spatial-index")]
pub mod spatial;

// Re-export core types for convenience
pub use error::{Result, TessellationError};
pub use config::{
    ContourOptions, ContourOptionsBuilder, ConvexHullOptions, GridOptions, GridOptionsBuilder,
    GridTopology, IdwOptions, Tolerance, DEFAULT_EPSILON, DEFAULT_VALUE_PROPERTY,
};
pub use geometry::{Geometry, Position};
pub use feature::{Feature, FeatureCollection, FeatureId, Properties};
pub use bbox::BoundingBox;
pub use field::{FieldEstimator, IdwEstimator, Sample, TinEstimator};
pub use contour::{ContourMode, ScalarGrid};
pub use triangulation::{triangulate, Triangulation, CORNER_KEYS};
pub use voronoi::{lloyd_relaxation, LloydOptions, VoronoiCell, VoronoiDiagram};
pub use hull::{concave_hull, convex_hull};
pub use polygonize::polygonize;
pub use sampling::{random_point_features, random_points};

#[cfg(feature = "spatial-index")]
pub use spatial::SpatialIndex;

// Re-export glam::DVec2 for convenience
pub use glam::DVec2;
