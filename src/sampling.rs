//! Seeded random point clouds
//!
//! Uses `ChaCha8Rng` so the same seed produces the same cloud on every
//! platform.

use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::bbox::BoundingBox;
use crate::feature::{Feature, FeatureCollection};
use crate::geometry::Geometry;

/// `count` uniformly distributed points inside `bbox`
///
/// A flat box yields points on its degenerate extent.
///
/// # Example
///
/// ```
/// use geo_tessellation::{random_points, BoundingBox};
///
/// let bbox = BoundingBox::new(0.0, 0.0, 10.0, 5.0).unwrap();
/// let points = random_points(&bbox, 100, 42);
/// assert_eq!(points.len(), 100);
/// assert!(points.iter().all(|p| bbox.contains(*p)));
/// ```
pub fn random_points(bbox: &BoundingBox, count: usize, seed: u64) -> Vec<DVec2> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let (min, max) = (bbox.min(), bbox.max());
    (0..count)
        .map(|_| {
            let tx: f64 = rng.gen();
            let ty: f64 = rng.gen();
            DVec2::new(min.x + tx * (max.x - min.x), min.y + ty * (max.y - min.y))
        })
        .collect()
}

/// [`random_points`] as Point features with empty properties
pub fn random_point_features(bbox: &BoundingBox, count: usize, seed: u64) -> FeatureCollection {
    random_points(bbox, count, seed)
        .into_iter()
        .map(|p| Feature::new(Geometry::point(p.x, p.y)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox() -> BoundingBox {
        BoundingBox::new(-5.0, 10.0, 5.0, 30.0).unwrap()
    }

    #[test]
    fn test_point_count_and_bounds() {
        for count in [0, 1, 100, 1000] {
            let points = random_points(&bbox(), count, 42);
            assert_eq!(points.len(), count);
            assert!(points.iter().all(|p| bbox().contains(*p)));
        }
    }

    #[test]
    fn test_determinism() {
        assert_eq!(random_points(&bbox(), 50, 7), random_points(&bbox(), 50, 7));
    }

    #[test]
    fn test_different_seeds() {
        let a = random_points(&bbox(), 50, 12345);
        let b = random_points(&bbox(), 50, 67890);
        assert!(a.iter().zip(&b).any(|(p, q)| p.distance(*q) > 0.01));
    }

    #[test]
    fn test_features_are_points() {
        let features = random_point_features(&bbox(), 5, 1);
        assert_eq!(features.len(), 5);
        assert!(features
            .iter()
            .all(|f| matches!(f.geometry, Some(Geometry::Point(_)))));
    }
}
