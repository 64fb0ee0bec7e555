//! Axis-aligned bounding boxes

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TessellationError};
use crate::geometry::{Geometry, Position};

/// `[minX, minY, maxX, maxY]` box; zero-area boxes are legal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a box, checking ordering and finiteness
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if a bound is not finite or min > max
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Result<Self> {
        let values = [min_x, min_y, max_x, max_y];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(TessellationError::invalid_parameter(
                "bbox",
                format!("bounds must be finite (got {:?})", values),
            ));
        }
        if min_x > max_x || min_y > max_y {
            return Err(TessellationError::invalid_parameter(
                "bbox",
                format!("min must not exceed max (got {:?})", values),
            ));
        }
        Ok(Self {
            min_x,
            min_y,
            max_x,
            max_y,
        })
    }

    /// Smallest box covering the positions, `None` when empty
    pub fn from_positions<'a, I>(positions: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Position>,
    {
        positions.into_iter().fold(None, |acc, p| {
            Some(match acc {
                None => Self {
                    min_x: p.x,
                    min_y: p.y,
                    max_x: p.x,
                    max_y: p.y,
                },
                Some(b) => Self {
                    min_x: b.min_x.min(p.x),
                    min_y: b.min_y.min(p.y),
                    max_x: b.max_x.max(p.x),
                    max_y: b.max_y.max(p.y),
                },
            })
        })
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    #[inline]
    pub fn min(&self) -> DVec2 {
        DVec2::new(self.min_x, self.min_y)
    }

    #[inline]
    pub fn max(&self) -> DVec2 {
        DVec2::new(self.max_x, self.max_y)
    }

    /// Closed containment test
    pub fn contains(&self, p: DVec2) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    /// Corners counter-clockwise from (minX, minY), ring left open
    pub fn corners(&self) -> [DVec2; 4] {
        [
            DVec2::new(self.min_x, self.min_y),
            DVec2::new(self.max_x, self.min_y),
            DVec2::new(self.max_x, self.max_y),
            DVec2::new(self.min_x, self.max_y),
        ]
    }

    /// Box outline as a polygon
    ///
    /// # Errors
    ///
    /// Returns `InvalidGeometry` for zero-area boxes
    pub fn to_polygon(&self) -> Result<Geometry> {
        let ring = self.corners().iter().copied().map(Position::from).collect();
        Geometry::polygon(vec![ring])
    }
}

impl TryFrom<[f64; 4]> for BoundingBox {
    type Error = TessellationError;

    fn try_from(v: [f64; 4]) -> Result<Self> {
        BoundingBox::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.min_x, b.min_y, b.max_x, b.max_y]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_validates() {
        assert!(BoundingBox::new(0.0, 0.0, 10.0, 10.0).is_ok());
        assert!(BoundingBox::new(5.0, 5.0, 5.0, 5.0).is_ok());
        assert!(BoundingBox::new(10.0, 0.0, 0.0, 10.0).is_err());
        assert!(BoundingBox::new(0.0, f64::NAN, 1.0, 1.0).is_err());
    }

    #[test]
    fn test_wire_format() {
        let bbox = BoundingBox::new(-1.0, -2.0, 3.0, 4.0).unwrap();
        assert_eq!(serde_json::to_string(&bbox).unwrap(), "[-1.0,-2.0,3.0,4.0]");
        let parsed: BoundingBox = serde_json::from_str("[0, 0, 10, 5]").unwrap();
        assert_eq!(parsed.height(), 5.0);
        assert!(serde_json::from_str::<BoundingBox>("[10, 0, 0, 5]").is_err());
    }

    #[test]
    fn test_from_positions() {
        let positions = vec![Position::new(3.0, -1.0), Position::new(-2.0, 4.0)];
        let bbox = BoundingBox::from_positions(&positions).unwrap();
        assert_eq!(<[f64; 4]>::from(bbox), [-2.0, -1.0, 3.0, 4.0]);
        assert!(BoundingBox::from_positions(&Vec::new()).is_none());
    }

    #[test]
    fn test_degenerate_box_has_no_polygon() {
        let bbox = BoundingBox::new(1.0, 1.0, 1.0, 3.0).unwrap();
        assert!(bbox.to_polygon().is_err());
        assert!(bbox.contains(DVec2::new(1.0, 2.0)));
    }
}
