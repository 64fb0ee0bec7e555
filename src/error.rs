//! Error types for tessellation and interpolation

use thiserror::Error;

/// Errors that can occur while building grids, fields, or tessellations
///
/// Every failure is deterministic for a given input; nothing here is worth
/// retrying.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TessellationError {
    /// A numeric or structural parameter is out of range
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Parameter name as exposed by the API
        name: &'static str,
        /// What was wrong with it
        reason: String,
    },

    /// Contour breaks are empty, unsorted, duplicated, or non-finite
    #[error("invalid breaks: {0}")]
    InvalidBreaks(String),

    /// Too few samples or points to run the operation
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// Collinear (or otherwise degenerate) input where a 2-D spread is required
    #[error("degenerate input: {0}")]
    DegenerateInput(String),

    /// Two input points share coordinates where distinct sites are required
    #[error("duplicate point: inputs {first} and {second} share coordinates")]
    DuplicatePoint {
        /// Index of the first occurrence
        first: usize,
        /// Index of the repeated occurrence
        second: usize,
    },

    /// Contour input is not a rectilinear lattice
    #[error("irregular grid: {0}")]
    IrregularGrid(String),

    /// Polygonize input has edges crossing away from shared endpoints
    #[error("invalid topology: {0}")]
    InvalidTopology(String),

    /// A sample has neither the requested property nor a third coordinate
    #[error("feature {index} has no numeric `{property}` and no z coordinate")]
    MissingValue {
        /// Index of the offending feature
        index: usize,
        /// Property that was looked up
        property: String,
    },

    /// Geometry violates a model invariant (non-finite coordinate, open ring, ...)
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// GeoJSON text could not be decoded
    #[error("geojson parse error: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for TessellationError {
    fn from(err: serde_json::Error) -> Self {
        TessellationError::Parse(err.to_string())
    }
}

impl From<geojson::Error> for TessellationError {
    fn from(err: geojson::Error) -> Self {
        TessellationError::Parse(err.to_string())
    }
}

impl TessellationError {
    pub(crate) fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        TessellationError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Result type alias for tessellation operations
pub type Result<T> = std::result::Result<T, TessellationError>;
