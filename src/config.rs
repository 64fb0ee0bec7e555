//! Tessellation options and builders
//!
//! Option structs for grids, interpolation and contouring, plus the shared
//! coordinate tolerance used by every component that merges vertices.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TessellationError};
use crate::feature::Properties;
use crate::geometry::Geometry;

/// Default coordinate-equality tolerance (degrees-equivalent)
pub const DEFAULT_EPSILON: f64 = 1e-9;

/// Default property name for scalar values read and written by the engine
pub const DEFAULT_VALUE_PROPERTY: &str = "value";

/// Coordinate-equality tolerance shared by grid masking, contour edge
/// merging and polygonize vertex merging
///
/// Two coordinates are the same when they differ by at most `epsilon` on
/// each axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    epsilon: f64,
}

impl Tolerance {
    /// Create a tolerance
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if epsilon is negative or not finite
    pub fn new(epsilon: f64) -> Result<Self> {
        if !epsilon.is_finite() || epsilon < 0.0 {
            return Err(TessellationError::invalid_parameter(
                "epsilon",
                format!("must be finite and >= 0 (got {})", epsilon),
            ));
        }
        Ok(Self { epsilon })
    }

    /// The raw epsilon value
    #[inline]
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Scalar comparison
    #[inline]
    pub fn eq(&self, a: f64, b: f64) -> bool {
        (a - b).abs() <= self.epsilon
    }

    /// Coordinate comparison (per axis)
    #[inline]
    pub fn same_point(&self, a: DVec2, b: DVec2) -> bool {
        self.eq(a.x, b.x) && self.eq(a.y, b.y)
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
        }
    }
}

/// Lattice shape produced by the spatial grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridTopology {
    /// Points on lattice nodes
    #[default]
    Point,
    /// Square polygon cells
    Square,
    /// Flat-top hexagons in odd-q offset layout
    Hex,
    /// Square cells split into two triangles each
    Triangle,
}

impl GridTopology {
    /// Human-readable name
    pub fn name(self) -> &'static str {
        match self {
            GridTopology::Point => "point",
            GridTopology::Square => "square",
            GridTopology::Hex => "hex",
            GridTopology::Triangle => "triangle",
        }
    }
}

/// Configuration for grid generation
///
/// `cell_size` is in meters (the planar unit of the input frame). For hex
/// grids it is the hexagon circumradius.
#[derive(Debug, Clone, PartialEq)]
pub struct GridOptions {
    /// Cell size (> 0)
    pub cell_size: f64,
    /// Lattice shape
    pub topology: GridTopology,
    /// Only cells whose representative point lies in this polygon are kept
    pub mask: Option<Geometry>,
    /// Split every hexagon into 6 triangles sharing the hex center
    pub hex_triangles: bool,
    /// Properties copied onto every generated feature
    pub properties: Properties,
    /// Tolerance for the mask boundary test
    pub tolerance: Tolerance,
}

impl GridOptions {
    /// Shortcut for an unmasked grid
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if `cell_size` is not a positive finite number
    pub fn new(cell_size: f64, topology: GridTopology) -> Result<Self> {
        GridOptionsBuilder::new()
            .cell_size(cell_size)?
            .topology(topology)
            .build()
    }
}

/// Builder for [`GridOptions`]
///
/// # Example
///
/// ```rust
/// use geo_tessellation::*;
///
/// let options = GridOptionsBuilder::new()
///     .cell_size(5.0)
///     .unwrap()
///     .topology(GridTopology::Square)
///     .build()
///     .unwrap();
/// assert_eq!(options.cell_size, 5.0);
/// ```
#[derive(Debug, Clone)]
pub struct GridOptionsBuilder {
    cell_size: Option<f64>,
    topology: GridTopology,
    mask: Option<Geometry>,
    hex_triangles: bool,
    properties: Properties,
    tolerance: Tolerance,
}

impl GridOptionsBuilder {
    /// Create a builder with no cell size set
    ///
    /// Defaults:
    /// - topology: Point
    /// - mask: None
    /// - hex_triangles: false
    /// - tolerance: [`DEFAULT_EPSILON`]
    pub fn new() -> Self {
        Self {
            cell_size: None,
            topology: GridTopology::default(),
            mask: None,
            hex_triangles: false,
            properties: Properties::new(),
            tolerance: Tolerance::default(),
        }
    }

    /// Set the cell size in meters
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if size <= 0 or not finite
    pub fn cell_size(mut self, size: f64) -> Result<Self> {
        if !size.is_finite() || size <= 0.0 {
            return Err(TessellationError::invalid_parameter(
                "cell_size",
                format!("must be > 0 (got {})", size),
            ));
        }
        self.cell_size = Some(size);
        Ok(self)
    }

    /// Set the lattice shape
    pub fn topology(mut self, topology: GridTopology) -> Self {
        self.topology = topology;
        self
    }

    /// Restrict output to cells inside a polygon or multi-polygon
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if the mask is not polygonal or is malformed
    pub fn mask(mut self, mask: Geometry) -> Result<Self> {
        if !matches!(mask, Geometry::Polygon(_) | Geometry::MultiPolygon(_)) {
            return Err(TessellationError::invalid_parameter(
                "mask",
                format!("must be a Polygon or MultiPolygon (got {})", mask.kind()),
            ));
        }
        mask.validate()
            .map_err(|e| TessellationError::invalid_parameter("mask", e.to_string()))?;
        self.mask = Some(mask);
        Ok(self)
    }

    /// Split hexagons into 6 triangles
    pub fn hex_triangles(mut self, enabled: bool) -> Self {
        self.hex_triangles = enabled;
        self
    }

    /// Properties attached to every generated cell
    pub fn properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    /// Override the mask boundary tolerance
    pub fn tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Build the options
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if no cell size was given
    pub fn build(self) -> Result<GridOptions> {
        let cell_size = self
            .cell_size
            .ok_or_else(|| TessellationError::invalid_parameter("cell_size", "not set"))?;
        Ok(GridOptions {
            cell_size,
            topology: self.topology,
            mask: self.mask,
            hex_triangles: self.hex_triangles,
            properties: self.properties,
            tolerance: self.tolerance,
        })
    }
}

impl Default for GridOptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Options for inverse-distance-weighted interpolation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdwOptions {
    /// Sample property holding the value (falls back to the z coordinate)
    pub value_property: String,
    /// Distance exponent `p` in `1 / d^p`
    pub weight_exponent: f64,
    /// Property written onto each output feature
    pub output_property: String,
}

impl IdwOptions {
    /// Options reading and writing `property` with the given exponent
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if the exponent is negative or not finite
    pub fn new(property: impl Into<String>, weight_exponent: f64) -> Result<Self> {
        let property = property.into();
        let options = Self {
            value_property: property.clone(),
            weight_exponent,
            output_property: property,
        };
        options.validate()?;
        Ok(options)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !self.weight_exponent.is_finite() || self.weight_exponent < 0.0 {
            return Err(TessellationError::invalid_parameter(
                "weight_exponent",
                format!("must be finite and >= 0 (got {})", self.weight_exponent),
            ));
        }
        Ok(())
    }
}

impl Default for IdwOptions {
    fn default() -> Self {
        Self {
            value_property: DEFAULT_VALUE_PROPERTY.to_string(),
            weight_exponent: 1.0,
            output_property: DEFAULT_VALUE_PROPERTY.to_string(),
        }
    }
}

/// Options for isoline / isoband extraction
#[derive(Debug, Clone, PartialEq)]
pub struct ContourOptions {
    /// Property read from grid points and written onto each contour feature
    pub z_property: String,
    /// Properties merged into every output feature
    pub common_properties: Properties,
    /// Per-break properties (index i belongs to the feature for break/band i)
    pub breaks_properties: Vec<Properties>,
    /// Edge-merge tolerance
    pub tolerance: Tolerance,
}

impl Default for ContourOptions {
    fn default() -> Self {
        Self {
            z_property: DEFAULT_VALUE_PROPERTY.to_string(),
            common_properties: Properties::new(),
            breaks_properties: Vec::new(),
            tolerance: Tolerance::default(),
        }
    }
}

/// Builder for [`ContourOptions`]
#[derive(Debug, Clone, Default)]
pub struct ContourOptionsBuilder {
    options: ContourOptions,
}

impl ContourOptionsBuilder {
    /// Create a builder with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Property holding grid values
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for an empty name
    pub fn z_property(mut self, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(TessellationError::invalid_parameter(
                "z_property",
                "must not be empty",
            ));
        }
        self.options.z_property = name;
        Ok(self)
    }

    /// Properties merged into every feature
    pub fn common_properties(mut self, properties: Properties) -> Self {
        self.options.common_properties = properties;
        self
    }

    /// Per-break properties; these win over common properties on key collision
    pub fn breaks_properties(mut self, properties: Vec<Properties>) -> Self {
        self.options.breaks_properties = properties;
        self
    }

    /// Override the edge-merge tolerance
    pub fn tolerance(mut self, tolerance: Tolerance) -> Self {
        self.options.tolerance = tolerance;
        self
    }

    /// Build the options
    pub fn build(self) -> ContourOptions {
        self.options
    }
}

/// Options for hull construction
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ConvexHullOptions {
    /// Relative concavity; `None` or infinity yields the convex hull,
    /// smaller values carve deeper (1.0 is already fairly detailed)
    pub concavity: Option<f64>,
}
