//! Spatial indexing for fast position-to-site lookups
//!
//! This module is only available with the `spatial-index` feature.

use glam::DVec2;
use kiddo::immutable::float::kdtree::ImmutableKdTree;
use kiddo::SquaredEuclidean;

/// Wrapper around a KD-tree of Voronoi sites
///
/// The nearest site to a position is the site whose Voronoi cell contains
/// it, so this answers point-location queries in O(log n).
#[derive(Clone)]
pub struct SpatialIndex {
    tree: Option<ImmutableKdTree<f64, usize, 2, 32>>,
    len: usize,
}

impl SpatialIndex {
    /// Build an index over `sites`; ids are slice positions
    ///
    /// # Example
    ///
    /// ```
    /// use geo_tessellation::SpatialIndex;
    /// use glam::DVec2;
    ///
    /// let sites = vec![DVec2::new(0.0, 0.0), DVec2::new(10.0, 0.0), DVec2::new(0.0, 10.0)];
    /// let index = SpatialIndex::new(&sites);
    /// assert_eq!(index.find_nearest(DVec2::new(8.0, 1.0)), Some(1));
    /// ```
    pub fn new(sites: &[DVec2]) -> Self {
        let points: Vec<[f64; 2]> = sites.iter().map(|s| [s.x, s.y]).collect();
        let tree = (!points.is_empty()).then(|| ImmutableKdTree::new_from_slice(&points));
        Self {
            tree,
            len: points.len(),
        }
    }

    /// Id of the site nearest to `position`, `None` for an empty index
    pub fn find_nearest(&self, position: DVec2) -> Option<usize> {
        let tree = self.tree.as_ref()?;
        let result = tree.nearest_one::<SquaredEuclidean>(&[position.x, position.y]);
        Some(result.item as usize)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
