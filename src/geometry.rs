//! GeoJSON-style geometry values
//!
//! Positions are planar `[x, y]` pairs with an optional third value. The
//! core never range-checks longitude/latitude; it only requires finite
//! numbers and closed polygon rings. Conversions to and from the `geojson`
//! crate's geometry go through the same checks.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::config::Tolerance;
use crate::error::{Result, TessellationError};
use crate::predicates;

/// A single coordinate, serialized as `[x, y]` or `[x, y, z]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct Position {
    /// Easting / longitude
    pub x: f64,
    /// Northing / latitude
    pub y: f64,
    /// Optional elevation or attribute value
    pub z: Option<f64>,
}

impl Position {
    /// Create a 2-D position
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: None }
    }

    /// Create a position carrying a third value
    pub fn with_z(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z: Some(z) }
    }

    /// Planar part of the position
    #[inline]
    pub fn xy(&self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }

    /// Check that every component is finite
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.map_or(true, f64::is_finite)
    }
}

impl From<DVec2> for Position {
    fn from(v: DVec2) -> Self {
        Position::new(v.x, v.y)
    }
}

impl From<Position> for Vec<f64> {
    fn from(p: Position) -> Self {
        match p.z {
            Some(z) => vec![p.x, p.y, z],
            None => vec![p.x, p.y],
        }
    }
}

impl TryFrom<Vec<f64>> for Position {
    type Error = TessellationError;

    fn try_from(values: Vec<f64>) -> Result<Self> {
        let position = match values.as_slice() {
            [x, y] => Position::new(*x, *y),
            [x, y, z] => Position::with_z(*x, *y, *z),
            _ => {
                return Err(TessellationError::InvalidGeometry(format!(
                    "position needs 2 or 3 values (got {})",
                    values.len()
                )))
            }
        };
        if !position.is_finite() {
            return Err(TessellationError::InvalidGeometry(
                "position contains a non-finite value".into(),
            ));
        }
        Ok(position)
    }
}

/// Tagged geometry variant (GeoJSON `type` + `coordinates`)
///
/// Polygon rings are stored closed: the first position repeats as the last.
/// The first ring of a polygon is the exterior, later rings are holes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(Position),
    MultiPoint(Vec<Position>),
    LineString(Vec<Position>),
    MultiLineString(Vec<Vec<Position>>),
    Polygon(Vec<Vec<Position>>),
    MultiPolygon(Vec<Vec<Vec<Position>>>),
}

impl Geometry {
    /// Point geometry from planar coordinates
    pub fn point(x: f64, y: f64) -> Self {
        Geometry::Point(Position::new(x, y))
    }

    /// Line string with at least two positions
    pub fn line_string(positions: Vec<Position>) -> Result<Self> {
        if positions.len() < 2 {
            return Err(TessellationError::InvalidGeometry(format!(
                "line string needs at least 2 positions (got {})",
                positions.len()
            )));
        }
        Ok(Geometry::LineString(positions))
    }

    /// Polygon from rings, closing any ring that is left open
    pub fn polygon(rings: Vec<Vec<Position>>) -> Result<Self> {
        Ok(Geometry::Polygon(close_rings(rings)?))
    }

    /// Multi-polygon from polygons, closing every ring
    pub fn multi_polygon(polygons: Vec<Vec<Vec<Position>>>) -> Result<Self> {
        let polygons = polygons
            .into_iter()
            .map(close_rings)
            .collect::<Result<Vec<_>>>()?;
        Ok(Geometry::MultiPolygon(polygons))
    }

    /// GeoJSON type name
    pub fn kind(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::MultiPoint(_) => "MultiPoint",
            Geometry::LineString(_) => "LineString",
            Geometry::MultiLineString(_) => "MultiLineString",
            Geometry::Polygon(_) => "Polygon",
            Geometry::MultiPolygon(_) => "MultiPolygon",
        }
    }

    /// Check the model invariants: finite coordinates, closed rings with >= 4 positions
    pub fn validate(&self) -> Result<()> {
        if let Some(bad) = self.positions().into_iter().find(|p| !p.is_finite()) {
            return Err(TessellationError::InvalidGeometry(format!(
                "non-finite position {:?} in {}",
                bad,
                self.kind()
            )));
        }
        let check_rings = |rings: &[Vec<Position>]| -> Result<()> {
            for ring in rings {
                let closed = ring.len() >= 4 && ring.first() == ring.last();
                if !closed {
                    return Err(TessellationError::InvalidGeometry(
                        "polygon ring must be closed with at least 4 positions".into(),
                    ));
                }
            }
            Ok(())
        };
        match self {
            Geometry::Polygon(rings) => check_rings(rings),
            Geometry::MultiPolygon(polygons) => polygons.iter().try_for_each(|p| check_rings(p)),
            Geometry::LineString(line) if line.len() < 2 => Err(TessellationError::InvalidGeometry(
                "line string needs at least 2 positions".into(),
            )),
            _ => Ok(()),
        }
    }

    /// Every position of the geometry, closing ring positions included
    pub fn positions(&self) -> Vec<Position> {
        match self {
            Geometry::Point(p) => vec![*p],
            Geometry::MultiPoint(points) | Geometry::LineString(points) => points.clone(),
            Geometry::MultiLineString(lines) | Geometry::Polygon(lines) => {
                lines.iter().flatten().copied().collect()
            }
            Geometry::MultiPolygon(polygons) => polygons.iter().flatten().flatten().copied().collect(),
        }
    }

    /// Positions with the repeated closing position of each ring dropped
    pub fn distinct_vertices(&self) -> Vec<Position> {
        let open = |ring: &Vec<Position>| -> Vec<Position> {
            match ring.split_last() {
                Some((last, rest)) if rest.first() == Some(last) => rest.to_vec(),
                _ => ring.clone(),
            }
        };
        match self {
            Geometry::Polygon(rings) => rings.iter().flat_map(open).collect(),
            Geometry::MultiPolygon(polygons) => polygons.iter().flatten().flat_map(open).collect(),
            _ => self.positions(),
        }
    }

    /// Point used to stand in for the geometry (the point itself, else the vertex centroid)
    pub fn representative_point(&self) -> Option<DVec2> {
        if let Geometry::Point(p) = self {
            return Some(p.xy());
        }
        let vertices = self.distinct_vertices();
        if vertices.is_empty() {
            return None;
        }
        let sum: DVec2 = vertices.iter().map(Position::xy).sum();
        Some(sum / vertices.len() as f64)
    }

    /// Polygonal containment with boundary counted as inside
    ///
    /// Non-polygonal geometries contain nothing.
    pub fn contains_point(&self, point: DVec2, tolerance: &Tolerance) -> bool {
        match self {
            Geometry::Polygon(rings) => polygon_contains(rings, point, tolerance),
            Geometry::MultiPolygon(polygons) => polygons
                .iter()
                .any(|rings| polygon_contains(rings, point, tolerance)),
            _ => false,
        }
    }
}

fn polygon_contains(rings: &[Vec<Position>], point: DVec2, tolerance: &Tolerance) -> bool {
    let rings: Vec<Vec<DVec2>> = rings
        .iter()
        .map(|ring| ring.iter().map(Position::xy).collect())
        .collect();
    predicates::point_in_polygon(point, &rings, tolerance)
}

fn close_rings(rings: Vec<Vec<Position>>) -> Result<Vec<Vec<Position>>> {
    if rings.is_empty() {
        return Err(TessellationError::InvalidGeometry(
            "polygon needs an exterior ring".into(),
        ));
    }
    rings.into_iter().map(close_ring).collect()
}

/// Close a ring and check it has at least 3 distinct positions
fn close_ring(mut ring: Vec<Position>) -> Result<Vec<Position>> {
    let mut distinct = ring.clone();
    distinct.dedup();
    if distinct.len() > 1 && distinct.first() == distinct.last() {
        distinct.pop();
    }
    if distinct.len() < 3 {
        return Err(TessellationError::InvalidGeometry(format!(
            "ring needs at least 3 distinct positions (got {})",
            distinct.len()
        )));
    }
    if ring.first() != ring.last() {
        ring.push(ring[0]);
    }
    Ok(ring)
}

impl TryFrom<geojson::Geometry> for Geometry {
    type Error = TessellationError;

    /// Convert and validate; geometry collections are not part of the model
    fn try_from(geometry: geojson::Geometry) -> Result<Self> {
        use geojson::Value;

        let geometry = match geometry.value {
            Value::Point(p) => Geometry::Point(Position::try_from(p)?),
            Value::MultiPoint(points) => Geometry::MultiPoint(positions_from(points)?),
            Value::LineString(line) => Geometry::LineString(positions_from(line)?),
            Value::MultiLineString(lines) => Geometry::MultiLineString(rings_from(lines)?),
            Value::Polygon(rings) => Geometry::Polygon(rings_from(rings)?),
            Value::MultiPolygon(polygons) => Geometry::MultiPolygon(
                polygons
                    .into_iter()
                    .map(rings_from)
                    .collect::<Result<Vec<_>>>()?,
            ),
            Value::GeometryCollection(_) => {
                return Err(TessellationError::InvalidGeometry(
                    "GeometryCollection is not supported".into(),
                ))
            }
        };
        geometry.validate()?;
        Ok(geometry)
    }
}

impl From<&Geometry> for geojson::Geometry {
    fn from(geometry: &Geometry) -> Self {
        use geojson::Value;

        let value = match geometry {
            Geometry::Point(p) => Value::Point(Vec::from(*p)),
            Geometry::MultiPoint(points) => Value::MultiPoint(positions_to(points)),
            Geometry::LineString(line) => Value::LineString(positions_to(line)),
            Geometry::MultiLineString(lines) => Value::MultiLineString(rings_to(lines)),
            Geometry::Polygon(rings) => Value::Polygon(rings_to(rings)),
            Geometry::MultiPolygon(polygons) => {
                Value::MultiPolygon(polygons.iter().map(|p| rings_to(p)).collect())
            }
        };
        geojson::Geometry::new(value)
    }
}

fn positions_from(values: Vec<geojson::Position>) -> Result<Vec<Position>> {
    values.into_iter().map(Position::try_from).collect()
}

fn rings_from(rings: Vec<Vec<geojson::Position>>) -> Result<Vec<Vec<Position>>> {
    rings.into_iter().map(positions_from).collect()
}

fn positions_to(positions: &[Position]) -> Vec<geojson::Position> {
    positions.iter().map(|&p| Vec::from(p)).collect()
}

fn rings_to(rings: &[Vec<Position>]) -> Vec<Vec<geojson::Position>> {
    rings.iter().map(|ring| positions_to(ring)).collect()
}

/// Convert an open ring of planar points to closed positions
pub(crate) fn closed_positions(ring: &[DVec2]) -> Vec<Position> {
    let mut positions: Vec<Position> = ring.iter().copied().map(Position::from).collect();
    if let (Some(first), Some(last)) = (ring.first(), ring.last()) {
        if first != last {
            positions.push(Position::from(*first));
        }
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Position> {
        vec![
            Position::new(0.0, 0.0),
            Position::new(4.0, 0.0),
            Position::new(4.0, 4.0),
            Position::new(0.0, 4.0),
        ]
    }

    #[test]
    fn test_polygon_closes_ring() {
        let polygon = Geometry::polygon(vec![square()]).unwrap();
        match &polygon {
            Geometry::Polygon(rings) => {
                assert_eq!(rings[0].len(), 5);
                assert_eq!(rings[0][0], rings[0][4]);
            }
            other => panic!("expected polygon, got {}", other.kind()),
        }
        assert!(polygon.validate().is_ok());
    }

    #[test]
    fn test_polygon_rejects_degenerate_ring() {
        let ring = vec![Position::new(0.0, 0.0), Position::new(1.0, 1.0), Position::new(0.0, 0.0)];
        assert!(Geometry::polygon(vec![ring]).is_err());
    }

    #[test]
    fn test_validate_open_ring() {
        let geometry = Geometry::Polygon(vec![square()]);
        assert!(matches!(
            geometry.validate(),
            Err(TessellationError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn test_position_serde_shapes() {
        let json = serde_json::to_string(&Position::new(1.0, 2.0)).unwrap();
        assert_eq!(json, "[1.0,2.0]");
        let json = serde_json::to_string(&Position::with_z(1.0, 2.0, 3.5)).unwrap();
        assert_eq!(json, "[1.0,2.0,3.5]");

        let p: Position = serde_json::from_str("[5, 6, 7]").unwrap();
        assert_eq!(p, Position::with_z(5.0, 6.0, 7.0));
        assert!(serde_json::from_str::<Position>("[5]").is_err());
    }

    #[test]
    fn test_position_rejects_extra_values() {
        assert!(matches!(
            Position::try_from(vec![1.0, 2.0, 3.0, 4.0]),
            Err(TessellationError::InvalidGeometry(_))
        ));
        assert!(serde_json::from_str::<Position>("[1, 2, 3, 4]").is_err());
        assert!(Position::try_from(vec![1.0, f64::NAN]).is_err());
    }

    #[test]
    fn test_geojson_geometry_conversion() {
        let polygon = Geometry::polygon(vec![square()]).unwrap();
        let converted = geojson::Geometry::from(&polygon);
        match &converted.value {
            geojson::Value::Polygon(rings) => assert_eq!(rings[0][2], vec![4.0, 4.0]),
            other => panic!("expected polygon, got {:?}", other),
        }
        assert_eq!(Geometry::try_from(converted).unwrap(), polygon);

        let with_z = geojson::Geometry::new(geojson::Value::Point(vec![1.0, 2.0, 3.0]));
        assert_eq!(Geometry::try_from(with_z).unwrap(), Geometry::Point(Position::with_z(1.0, 2.0, 3.0)));

        let collection = geojson::Geometry::new(geojson::Value::GeometryCollection(vec![]));
        assert!(matches!(
            Geometry::try_from(collection),
            Err(TessellationError::InvalidGeometry(_))
        ));

        let open = geojson::Geometry::new(geojson::Value::Polygon(vec![vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
        ]]));
        assert!(Geometry::try_from(open).is_err());
    }

    #[test]
    fn test_geometry_serde_tagging() {
        let geometry = Geometry::point(1.0, 2.0);
        let value = serde_json::to_value(&geometry).unwrap();
        assert_eq!(value["type"], "Point");
        assert_eq!(value["coordinates"][1], 2.0);

        let parsed: Geometry =
            serde_json::from_str(r#"{"type":"LineString","coordinates":[[0,0],[1,1]]}"#).unwrap();
        assert_eq!(parsed.positions().len(), 2);
    }

    #[test]
    fn test_representative_point_skips_closing_vertex() {
        let polygon = Geometry::polygon(vec![square()]).unwrap();
        let center = polygon.representative_point().unwrap();
        assert_eq!(center, DVec2::new(2.0, 2.0));
    }

    #[test]
    fn test_contains_point_boundary_and_hole() {
        let hole = vec![
            Position::new(1.0, 1.0),
            Position::new(1.0, 2.0),
            Position::new(2.0, 2.0),
            Position::new(2.0, 1.0),
        ];
        let polygon = Geometry::polygon(vec![square(), hole]).unwrap();
        let tol = Tolerance::default();

        assert!(polygon.contains_point(DVec2::new(3.0, 3.0), &tol));
        assert!(polygon.contains_point(DVec2::new(4.0, 2.0), &tol)); // boundary
        assert!(!polygon.contains_point(DVec2::new(1.5, 1.5), &tol)); // in hole
        assert!(polygon.contains_point(DVec2::new(1.0, 1.5), &tol)); // hole boundary
        assert!(!polygon.contains_point(DVec2::new(5.0, 1.0), &tol));
    }
}
