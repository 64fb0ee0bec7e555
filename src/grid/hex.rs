//! Flat-top hexagons in odd-q offset layout
//!
//! Columns are `1.5 * r` apart and rows `sqrt(3) * r` apart, where `r` is
//! the circumradius. Odd columns are pushed up by half a row. A hexagon is
//! materialized when its center lies inside the bounding box.

use glam::DVec2;
use std::f64::consts::PI;

use super::{steps, CellEmitter};
use crate::bbox::BoundingBox;

/// Center of hexagon `(q, row)` for circumradius `radius`, relative to `origin`
pub fn hex_center(origin: DVec2, q: usize, row: usize, radius: f64) -> DVec2 {
    let height = 3f64.sqrt() * radius;
    let shift = if q % 2 == 1 { height / 2.0 } else { 0.0 };
    origin + DVec2::new(q as f64 * 1.5 * radius, row as f64 * height + shift)
}

/// Corners of a flat-top hexagon, counter-clockwise from the east vertex
pub fn hex_vertices(center: DVec2, radius: f64) -> [DVec2; 6] {
    let mut corners = [DVec2::ZERO; 6];
    for (k, corner) in corners.iter_mut().enumerate() {
        let angle = PI / 3.0 * k as f64;
        *corner = center + DVec2::new(angle.cos(), angle.sin()) * radius;
    }
    corners
}

pub(super) fn hex_lattice(bbox: &BoundingBox, radius: f64, split: bool, emitter: &mut CellEmitter) {
    let eps = emitter.tolerance.epsilon();
    let origin = bbox.min();
    let height = 3f64.sqrt() * radius;
    let columns = steps(bbox.min_x, 1.5 * radius, |x| x <= bbox.max_x + eps).len();
    let rows = steps(bbox.min_y, height, |y| y <= bbox.max_y + eps).len();

    let inside = |p: DVec2| {
        p.x >= bbox.min_x - eps
            && p.x <= bbox.max_x + eps
            && p.y >= bbox.min_y - eps
            && p.y <= bbox.max_y + eps
    };

    for row in 0..rows {
        for q in 0..columns {
            let center = hex_center(origin, q, row, radius);
            if !inside(center) {
                continue;
            }
            let corners = hex_vertices(center, radius);
            if !split {
                emitter.polygon(&corners, center);
                continue;
            }
            for k in 0..6 {
                let tri = [center, corners[k], corners[(k + 1) % 6]];
                emitter.polygon(&tri, (tri[0] + tri[1] + tri[2]) / 3.0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GridOptions, GridOptionsBuilder, GridTopology};
    use crate::geometry::Geometry;
    use crate::grid::generate;
    use crate::predicates;

    #[test]
    fn test_hex_vertices_are_regular() {
        let center = DVec2::new(3.0, -2.0);
        let corners = hex_vertices(center, 2.0);
        for k in 0..6 {
            assert!((corners[k].distance(center) - 2.0).abs() < 1e-12);
            let side = corners[k].distance(corners[(k + 1) % 6]);
            assert!((side - 2.0).abs() < 1e-12);
        }
        assert!(predicates::signed_area(&corners) > 0.0);
    }

    #[test]
    fn test_odd_columns_shift_up() {
        let origin = DVec2::ZERO;
        let even = hex_center(origin, 0, 0, 1.0);
        let odd = hex_center(origin, 1, 0, 1.0);
        assert_eq!(even, DVec2::ZERO);
        assert!((odd.x - 1.5).abs() < 1e-12);
        assert!((odd.y - 3f64.sqrt() / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_hex_grid_centers_inside_bbox() {
        let bbox = BoundingBox::new(0.0, 0.0, 6.0, 4.0).unwrap();
        let options = GridOptions::new(1.0, GridTopology::Hex).unwrap();
        let cells = generate(&bbox, &options).unwrap();
        assert!(!cells.is_empty());
        for cell in &cells {
            let center = cell.geometry.as_ref().unwrap().representative_point().unwrap();
            assert!(center.x > -1e-9 && center.x < 6.0 + 1e-9);
            assert!(center.y > -1e-9 && center.y < 4.0 + 1e-9);
        }
    }

    #[test]
    fn test_hex_mask_keeps_centers_on_its_edge() {
        let bbox = BoundingBox::new(0.0, 0.0, 6.0, 4.0).unwrap();
        let all = generate(&bbox, &GridOptions::new(1.0, GridTopology::Hex).unwrap()).unwrap();
        assert_eq!(all.len(), 13);

        // Column x = 3 sits exactly on the mask's right edge
        let mask = BoundingBox::new(0.0, 0.0, 3.0, 4.0).unwrap().to_polygon().unwrap();
        let options = GridOptionsBuilder::new()
            .cell_size(1.0)
            .unwrap()
            .topology(GridTopology::Hex)
            .mask(mask)
            .unwrap()
            .build()
            .unwrap();
        let kept = generate(&bbox, &options).unwrap();
        assert_eq!(kept.len(), 8);
        for cell in &kept {
            let center = cell.geometry.as_ref().unwrap().representative_point().unwrap();
            assert!(center.x <= 3.0 + 1e-9);
        }
    }

    #[test]
    fn test_hex_triangles_split_each_hex() {
        let bbox = BoundingBox::new(0.0, 0.0, 6.0, 4.0).unwrap();
        let hexes = generate(&bbox, &GridOptions::new(1.0, GridTopology::Hex).unwrap()).unwrap();
        let options = GridOptionsBuilder::new()
            .cell_size(1.0)
            .unwrap()
            .topology(GridTopology::Hex)
            .hex_triangles(true)
            .build()
            .unwrap();
        let triangles = generate(&bbox, &options).unwrap();
        assert_eq!(triangles.len(), hexes.len() * 6);
        match triangles.features[0].geometry.as_ref().unwrap() {
            Geometry::Polygon(rings) => assert_eq!(rings[0].len(), 4),
            other => panic!("unexpected {}", other.kind()),
        }
    }
}
