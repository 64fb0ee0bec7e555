//! VoronoiDiagram main structure

use glam::DVec2;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use super::cell::VoronoiCell;
use super::clip::clip_to_site;
use crate::bbox::BoundingBox;
use crate::config::DEFAULT_EPSILON;
use crate::error::{Result, TessellationError};
use crate::predicates::signed_area;
use crate::triangulation::{lexicographic, triangulate_points};

#[cfg(feature = "spatial-index")]
use crate::spatial::SpatialIndex;

/// A Voronoi partition of a bounding box
///
/// Cells are indexed by site: cell `i` belongs to `sites[i]`. The diagram
/// keeps the Delaunay adjacency so it can answer neighbourhood queries.
///
/// # Examples
///
/// ```
/// use geo_tessellation::{BoundingBox, VoronoiDiagram};
/// use glam::DVec2;
///
/// let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0).unwrap();
/// let sites = [DVec2::new(2.0, 2.0), DVec2::new(8.0, 3.0), DVec2::new(5.0, 8.0)];
/// let diagram = VoronoiDiagram::new(&sites, &bbox).unwrap();
///
/// assert_eq!(diagram.cell_count(), 3);
/// let total: f64 = diagram.cells().iter().map(|c| c.area()).sum();
/// assert!((total - 100.0).abs() < 1e-9);
/// ```
#[derive(Clone)]
pub struct VoronoiDiagram {
    bbox: BoundingBox,

    /// All cells (indexed by site)
    cells: Vec<VoronoiCell>,

    /// Nearest-site lookup (requires spatial-index feature)
    #[cfg(feature = "spatial-index")]
    spatial_index: SpatialIndex,
}

impl VoronoiDiagram {
    /// Build the diagram of `sites` clipped to `bbox`
    ///
    /// # Errors
    ///
    /// * `DuplicatePoint` - two sites share coordinates
    /// * `InvalidGeometry` - a site has a non-finite coordinate
    pub fn new(sites: &[DVec2], bbox: &BoundingBox) -> Result<Self> {
        check_sites(sites)?;
        let neighbors = site_neighbors(sites)?;
        let frame = bbox.corners().to_vec();

        let cells: Vec<VoronoiCell> = sites
            .iter()
            .zip(neighbors)
            .enumerate()
            .map(|(id, (&site, neighbors))| {
                let mut ring = frame.clone();
                for &other in &neighbors {
                    ring = clip_to_site(&ring, site, sites[other]);
                    if ring.is_empty() {
                        break;
                    }
                }
                // Slivers of a flat box are not cells
                if ring.len() < 3 || signed_area(&ring).abs() <= DEFAULT_EPSILON {
                    ring.clear();
                }
                VoronoiCell::new(id, site, neighbors, ring)
            })
            .collect();

        debug!(
            sites = sites.len(),
            empty = cells.iter().filter(|c| c.is_empty()).count(),
            "voronoi diagram built"
        );

        Ok(Self {
            bbox: *bbox,
            #[cfg(feature = "spatial-index")]
            spatial_index: SpatialIndex::new(sites),
            cells,
        })
    }

    #[inline]
    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Get a cell by ID, `None` if out of bounds
    #[inline]
    pub fn get_cell(&self, id: usize) -> Option<&VoronoiCell> {
        self.cells.get(id)
    }

    #[inline]
    pub fn cells(&self) -> &[VoronoiCell] {
        &self.cells
    }

    /// Neighbour IDs of a cell; empty for an invalid ID
    pub fn get_neighbors(&self, cell_id: usize) -> &[usize] {
        self.cells
            .get(cell_id)
            .map(|c| c.neighbors.as_slice())
            .unwrap_or(&[])
    }

    /// Cell whose site is nearest to `position` (requires spatial-index feature)
    ///
    /// `None` only for a diagram without sites.
    #[cfg(feature = "spatial-index")]
    pub fn find_cell_at(&self, position: DVec2) -> Option<usize> {
        self.spatial_index.find_nearest(position)
    }

    /// Cells reachable within `hops` neighbour steps of `center_id` (BFS)
    ///
    /// Includes the center cell. The result is sorted by ID; it is empty
    /// for an invalid `center_id`.
    pub fn find_cells_within_hops(&self, center_id: usize, hops: usize) -> Vec<usize> {
        if center_id >= self.cells.len() {
            return vec![];
        }

        let mut visited = HashSet::new();
        let mut current = vec![center_id];
        visited.insert(center_id);

        for _ in 0..hops {
            let mut next = Vec::new();
            for &cell_id in &current {
                for &neighbor in self.get_neighbors(cell_id) {
                    if visited.insert(neighbor) {
                        next.push(neighbor);
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            current = next;
        }

        let mut cells: Vec<usize> = visited.into_iter().collect();
        cells.sort_unstable();
        cells
    }
}

fn check_sites(sites: &[DVec2]) -> Result<()> {
    let mut seen: HashMap<(u64, u64), usize> = HashMap::with_capacity(sites.len());
    for (index, site) in sites.iter().enumerate() {
        if !site.is_finite() {
            return Err(TessellationError::InvalidGeometry(format!(
                "site {} has a non-finite coordinate",
                index
            )));
        }
        // Adding 0.0 folds -0.0 onto 0.0
        let key = ((site.x + 0.0).to_bits(), (site.y + 0.0).to_bits());
        if let Some(&first) = seen.get(&key) {
            return Err(TessellationError::DuplicatePoint { first, second: index });
        }
        seen.insert(key, index);
    }
    Ok(())
}

/// Delaunay adjacency, or neighbours along the line for collinear sites
fn site_neighbors(sites: &[DVec2]) -> Result<Vec<Vec<usize>>> {
    if sites.len() >= 3 {
        match triangulate_points(sites) {
            Ok(tin) => return Ok(tin.neighbors()),
            Err(TessellationError::DegenerateInput(_)) => {}
            Err(err) => return Err(err),
        }
    }

    let mut order: Vec<usize> = (0..sites.len()).collect();
    order.sort_by(|&a, &b| lexicographic(sites[a], sites[b]).then(a.cmp(&b)));
    let mut neighbors = vec![Vec::new(); sites.len()];
    for pair in order.windows(2) {
        neighbors[pair[0]].push(pair[1]);
        neighbors[pair[1]].push(pair[0]);
    }
    for list in &mut neighbors {
        list.sort_unstable();
    }
    Ok(neighbors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::random_points;

    fn square() -> BoundingBox {
        BoundingBox::new(0.0, 0.0, 10.0, 10.0).unwrap()
    }

    #[test]
    fn test_cells_tile_the_bbox() {
        let bbox = square();
        let sites = random_points(&bbox, 60, 11);
        let diagram = VoronoiDiagram::new(&sites, &bbox).unwrap();
        assert_eq!(diagram.cell_count(), 60);
        let total: f64 = diagram.cells().iter().map(|c| c.area()).sum();
        assert!((total - 100.0).abs() < 1e-6, "total area {}", total);
    }

    #[test]
    fn test_every_site_is_nearest_to_its_own_cell() {
        let bbox = square();
        let sites = random_points(&bbox, 40, 3);
        let diagram = VoronoiDiagram::new(&sites, &bbox).unwrap();
        for cell in diagram.cells() {
            let c = cell.centroid();
            let nearest = sites
                .iter()
                .map(|s| s.distance(c))
                .fold(f64::INFINITY, f64::min);
            assert!((cell.site.distance(c) - nearest).abs() < 1e-9);
        }
    }

    #[test]
    fn test_duplicate_sites_rejected() {
        let sites = [DVec2::new(1.0, 1.0), DVec2::new(2.0, 2.0), DVec2::new(1.0, 1.0)];
        assert_eq!(
            VoronoiDiagram::new(&sites, &square()).err(),
            Some(TessellationError::DuplicatePoint { first: 0, second: 2 })
        );
    }

    #[test]
    fn test_collinear_sites_make_strips() {
        let sites = [DVec2::new(5.0, 5.0), DVec2::new(1.0, 5.0), DVec2::new(9.0, 5.0)];
        let diagram = VoronoiDiagram::new(&sites, &square()).unwrap();
        assert_eq!(diagram.get_neighbors(0), &[1, 2]);
        assert_eq!(diagram.get_neighbors(1), &[0]);
        assert!((diagram.cells()[0].area() - 40.0).abs() < 1e-9);
        assert!((diagram.cells()[1].area() - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_site_owns_bbox() {
        let diagram = VoronoiDiagram::new(&[DVec2::new(3.0, 3.0)], &square()).unwrap();
        assert_eq!(diagram.cells()[0].vertex_count(), 4);
        assert!((diagram.cells()[0].area() - 100.0).abs() < 1e-12);
    }

    #[test]
    fn test_site_outside_bbox_has_empty_cell() {
        let sites = [DVec2::new(5.0, 5.0), DVec2::new(40.0, 5.0)];
        let diagram = VoronoiDiagram::new(&sites, &square()).unwrap();
        assert!(diagram.cells()[1].is_empty());
        assert!((diagram.cells()[0].area() - 100.0).abs() < 1e-12);
    }

    #[test]
    fn test_flat_bbox_has_no_cells() {
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 0.0).unwrap();
        let sites = [DVec2::new(2.0, 0.0), DVec2::new(8.0, 0.0), DVec2::new(5.0, 3.0)];
        let diagram = VoronoiDiagram::new(&sites, &bbox).unwrap();
        assert!(diagram.cells().iter().all(|c| c.is_empty()));
        assert_eq!(diagram.get_neighbors(0), &[1, 2]);
    }

    #[test]
    fn test_near_collinear_sites_tile_unit_box() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0).unwrap();
        let sites: Vec<DVec2> = [
            (0.15, 0.55),
            (0.2, 0.5),
            (0.2, 0.65),
            (0.3, 0.05),
            (0.3, 0.1),
            (0.3, 0.15),
            (0.3, 0.2),
            (0.3, 0.25),
            (0.3, 0.35),
            (0.3, 0.45),
            (0.3, 0.5),
            (0.3, 0.55),
            (0.3, 0.6),
        ]
        .iter()
        .map(|&(x, y)| DVec2::new(x, y))
        .collect();
        let diagram = VoronoiDiagram::new(&sites, &bbox).unwrap();
        assert!(diagram.cells().iter().all(|c| !c.is_empty()));
        let total: f64 = diagram.cells().iter().map(|c| c.area()).sum();
        assert!((total - 1.0).abs() < 1e-9, "total area {}", total);
    }

    #[test]
    fn test_find_cells_within_hops() {
        let bbox = square();
        let diagram = VoronoiDiagram::new(&random_points(&bbox, 50, 5), &bbox).unwrap();

        assert_eq!(diagram.find_cells_within_hops(0, 0), vec![0]);
        let one = diagram.find_cells_within_hops(0, 1);
        assert_eq!(one.len(), 1 + diagram.get_neighbors(0).len());
        let two = diagram.find_cells_within_hops(0, 2);
        assert!(two.len() > one.len());
        assert!(diagram.find_cells_within_hops(999, 3).is_empty());
    }

    #[cfg(feature = "spatial-index")]
    #[test]
    fn test_find_cell_at() {
        let bbox = square();
        let sites = random_points(&bbox, 30, 9);
        let diagram = VoronoiDiagram::new(&sites, &bbox).unwrap();
        for (id, site) in sites.iter().enumerate() {
            assert_eq!(diagram.find_cell_at(*site), Some(id));
        }
    }
}
