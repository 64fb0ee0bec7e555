//! Voronoi cell structure

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::predicates::{ring_centroid, signed_area};

/// A single Voronoi cell clipped to the diagram's bounding box
///
/// # Design Notes
///
/// Cell ids equal the index of the site in the input, so the same input
/// always produces the same ids in the same positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoronoiCell {
    /// Index of the generating site in the input
    pub id: usize,

    /// The generating site
    pub site: DVec2,

    /// IDs of adjacent cells
    ///
    /// Sites are neighbours when they share a Delaunay edge. When every
    /// site is collinear, neighbours are the adjacent sites along the line.
    pub neighbors: Vec<usize>,

    /// Open boundary ring, counter-clockwise
    ///
    /// Empty when the cell has no area inside the bounding box.
    pub vertices: Vec<DVec2>,
}

impl VoronoiCell {
    pub fn new(id: usize, site: DVec2, neighbors: Vec<usize>, vertices: Vec<DVec2>) -> Self {
        Self {
            id,
            site,
            neighbors,
            vertices,
        }
    }

    #[inline]
    pub fn neighbor_count(&self) -> usize {
        self.neighbors.len()
    }

    #[inline]
    pub fn is_neighbor_of(&self, other_cell_id: usize) -> bool {
        self.neighbors.contains(&other_cell_id)
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// True when nothing of the cell lies inside the bounding box
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.len() < 3
    }

    /// Area of the clipped cell
    pub fn area(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        signed_area(&self.vertices).abs()
    }

    /// Area centroid of the clipped cell, or the site for an empty cell
    pub fn centroid(&self) -> DVec2 {
        ring_centroid(&self.vertices).unwrap_or(self.site)
    }

    /// Planar distance between the two sites
    pub fn distance_to(&self, other: &VoronoiCell) -> f64 {
        self.site.distance(other.site)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_cell() -> VoronoiCell {
        VoronoiCell::new(
            0,
            DVec2::new(1.0, 1.0),
            vec![1, 2, 3],
            vec![
                DVec2::new(0.0, 0.0),
                DVec2::new(2.0, 0.0),
                DVec2::new(2.0, 2.0),
                DVec2::new(0.0, 2.0),
            ],
        )
    }

    #[test]
    fn test_cell_creation() {
        let cell = square_cell();
        assert_eq!(cell.id, 0);
        assert_eq!(cell.neighbor_count(), 3);
        assert_eq!(cell.vertex_count(), 4);
        assert!(cell.is_neighbor_of(1));
        assert!(!cell.is_neighbor_of(99));
    }

    #[test]
    fn test_area_and_centroid() {
        let cell = square_cell();
        assert!((cell.area() - 4.0).abs() < 1e-12);
        assert!(cell.centroid().distance(DVec2::new(1.0, 1.0)) < 1e-12);

        let empty = VoronoiCell::new(5, DVec2::new(9.0, 9.0), vec![], vec![]);
        assert!(empty.is_empty());
        assert_eq!(empty.area(), 0.0);
        assert_eq!(empty.centroid(), DVec2::new(9.0, 9.0));
    }

    #[test]
    fn test_distance_to() {
        let a = VoronoiCell::new(0, DVec2::new(0.0, 0.0), vec![], vec![]);
        let b = VoronoiCell::new(1, DVec2::new(3.0, 4.0), vec![], vec![]);
        assert!((a.distance_to(&b) - 5.0).abs() < 1e-12);
    }
}
