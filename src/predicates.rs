//! Planar predicates and tolerance-aware vertex snapping
//!
//! Everything that decides "same point", "on the boundary" or "which side"
//! lives here so that grid masking, contour merging, hull dissolving and
//! polygonize vertex merging agree with each other.

use glam::DVec2;
use robust::Coord;
use std::collections::HashMap;

use crate::config::Tolerance;

#[inline]
fn coord(p: DVec2) -> Coord<f64> {
    Coord { x: p.x, y: p.y }
}

/// Twice the signed area of triangle `abc`; positive when counter-clockwise.
///
/// The sign is exact (adaptive precision), so Delaunay insertion and hull
/// chains never disagree about which side a point is on.
#[inline]
pub fn orient2d(a: DVec2, b: DVec2, c: DVec2) -> f64 {
    robust::orient2d(coord(a), coord(b), coord(c))
}

/// Positive when `d` lies strictly inside the circumcircle of the
/// counter-clockwise triangle `abc`, zero when co-circular. Exact sign.
#[inline]
pub fn in_circle(a: DVec2, b: DVec2, c: DVec2, d: DVec2) -> f64 {
    robust::incircle(coord(a), coord(b), coord(c), coord(d))
}

/// Signed area of a ring (open or closed); positive when counter-clockwise
pub fn signed_area(ring: &[DVec2]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mut area = 0.0;
    for i in 0..ring.len() {
        let j = (i + 1) % ring.len();
        area += ring[i].perp_dot(ring[j]);
    }
    area / 2.0
}

/// Area centroid of a ring, falling back to the vertex mean for zero area
pub fn ring_centroid(ring: &[DVec2]) -> Option<DVec2> {
    if ring.is_empty() {
        return None;
    }
    let area = signed_area(ring);
    if area.abs() <= f64::EPSILON {
        let sum: DVec2 = ring.iter().copied().sum();
        return Some(sum / ring.len() as f64);
    }
    let mut c = DVec2::ZERO;
    for i in 0..ring.len() {
        let p = ring[i];
        let q = ring[(i + 1) % ring.len()];
        c += (p + q) * p.perp_dot(q);
    }
    Some(c / (6.0 * area))
}

/// Distance from `p` to the segment `ab`
pub fn distance_to_segment(p: DVec2, a: DVec2, b: DVec2) -> f64 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Whether `b` lies on the straight line through `a` and `c` within tolerance
pub fn is_collinear(a: DVec2, b: DVec2, c: DVec2, tolerance: &Tolerance) -> bool {
    let len = a.distance(c);
    if len == 0.0 {
        return a.distance(b) <= tolerance.epsilon();
    }
    (orient2d(a, c, b) / len).abs() <= tolerance.epsilon()
}

/// Where a point sits relative to a ring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Inside,
    Boundary,
    Outside,
}

/// Locate a point against a single ring (open or closed)
pub fn locate_in_ring(p: DVec2, ring: &[DVec2], tolerance: &Tolerance) -> Location {
    let n = ring.len();
    if n < 3 {
        return Location::Outside;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let a = ring[j];
        let b = ring[i];
        if distance_to_segment(p, a, b) <= tolerance.epsilon() {
            return Location::Boundary;
        }
        if (b.y > p.y) != (a.y > p.y) && p.x < (a.x - b.x) * (p.y - b.y) / (a.y - b.y) + b.x {
            inside = !inside;
        }
        j = i;
    }
    if inside {
        Location::Inside
    } else {
        Location::Outside
    }
}

/// Polygon containment (first ring exterior, rest holes); boundaries count as inside
pub fn point_in_polygon(p: DVec2, rings: &[Vec<DVec2>], tolerance: &Tolerance) -> bool {
    let Some((exterior, holes)) = rings.split_first() else {
        return false;
    };
    match locate_in_ring(p, exterior, tolerance) {
        Location::Outside => false,
        Location::Boundary => true,
        Location::Inside => holes
            .iter()
            .all(|hole| locate_in_ring(p, hole, tolerance) != Location::Inside),
    }
}

/// Whether segments `ab` and `cd` touch anywhere other than a shared endpoint
///
/// Endpoints are compared with the tolerance, so segments meeting at a
/// common vertex are properly noded. Overlapping collinear segments and
/// a vertex resting on the other segment's interior both count as crossings.
pub fn segments_cross(a: DVec2, b: DVec2, c: DVec2, d: DVec2, tolerance: &Tolerance) -> bool {
    let eps = tolerance.epsilon();
    let shared = [(a, c), (a, d), (b, c), (b, d)]
        .iter()
        .filter(|(p, q)| tolerance.same_point(*p, *q))
        .count();

    // Interior contact of an endpoint with the other segment
    let touches = |p: DVec2, s0: DVec2, s1: DVec2| {
        !tolerance.same_point(p, s0)
            && !tolerance.same_point(p, s1)
            && distance_to_segment(p, s0, s1) <= eps
    };
    if touches(a, c, d) || touches(b, c, d) || touches(c, a, b) || touches(d, a, b) {
        return true;
    }
    if shared > 0 {
        // Sharing both endpoints is a duplicate edge; sharing one is a proper node
        return false;
    }

    let o1 = orient2d(a, b, c);
    let o2 = orient2d(a, b, d);
    let o3 = orient2d(c, d, a);
    let o4 = orient2d(c, d, b);
    (o1 > 0.0) != (o2 > 0.0) && (o3 > 0.0) != (o4 > 0.0) && o1 != 0.0 && o2 != 0.0 && o3 != 0.0
        && o4 != 0.0
}

/// Merges coordinates that agree within a tolerance onto shared vertex ids
///
/// Points are bucketed on a grid of `epsilon`-sized cells; a lookup checks
/// the 3x3 neighbourhood so matches across bucket seams are found. The
/// earliest inserted vertex wins when several are within tolerance.
#[derive(Debug, Clone)]
pub struct PointSnapper {
    tolerance: Tolerance,
    buckets: HashMap<(i64, i64), Vec<usize>>,
    points: Vec<DVec2>,
}

impl PointSnapper {
    pub fn new(tolerance: Tolerance) -> Self {
        Self {
            tolerance,
            buckets: HashMap::new(),
            points: Vec::new(),
        }
    }

    fn key(&self, p: DVec2) -> (i64, i64) {
        let eps = self.tolerance.epsilon();
        if eps > 0.0 {
            ((p.x / eps).floor() as i64, (p.y / eps).floor() as i64)
        } else {
            // Adding 0.0 folds -0.0 onto 0.0
            ((p.x + 0.0).to_bits() as i64, (p.y + 0.0).to_bits() as i64)
        }
    }

    /// Vertex id for `p`, if one is already known
    pub fn find(&self, p: DVec2) -> Option<usize> {
        let (kx, ky) = self.key(p);
        let span: i64 = if self.tolerance.epsilon() > 0.0 { 1 } else { 0 };
        let mut best: Option<usize> = None;
        for dx in -span..=span {
            for dy in -span..=span {
                let Some(ids) = self.buckets.get(&(kx.saturating_add(dx), ky.saturating_add(dy)))
                else {
                    continue;
                };
                for &id in ids {
                    if self.tolerance.same_point(self.points[id], p)
                        && best.map_or(true, |b| id < b)
                    {
                        best = Some(id);
                    }
                }
            }
        }
        best
    }

    /// Vertex id for `p`, registering a new vertex when none matches
    pub fn insert(&mut self, p: DVec2) -> usize {
        if let Some(id) = self.find(p) {
            return id;
        }
        let id = self.points.len();
        self.points.push(p);
        let key = self.key(p);
        self.buckets.entry(key).or_default().push(id);
        id
    }

    /// Canonical coordinate of a vertex id
    #[inline]
    pub fn point(&self, id: usize) -> DVec2 {
        self.points[id]
    }

    /// All registered vertices in id order
    pub fn points(&self) -> &[DVec2] {
        &self.points
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn tolerance(&self) -> &Tolerance {
        &self.tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f64, y: f64) -> DVec2 {
        DVec2::new(x, y)
    }

    #[test]
    fn test_orient_and_area() {
        assert!(orient2d(v(0.0, 0.0), v(1.0, 0.0), v(0.0, 1.0)) > 0.0);
        assert!(orient2d(v(0.0, 0.0), v(0.0, 1.0), v(1.0, 0.0)) < 0.0);
        let square = [v(0.0, 0.0), v(2.0, 0.0), v(2.0, 2.0), v(0.0, 2.0)];
        assert_eq!(signed_area(&square), 4.0);
        assert_eq!(ring_centroid(&square), Some(v(1.0, 1.0)));
    }

    #[test]
    fn test_in_circle() {
        let (a, b, c) = (v(0.0, 0.0), v(2.0, 0.0), v(0.0, 2.0));
        assert!(in_circle(a, b, c, v(1.0, 1.0)) > 0.0);
        assert_eq!(in_circle(a, b, c, v(2.0, 2.0)), 0.0); // co-circular
        assert!(in_circle(a, b, c, v(3.0, 3.0)) < 0.0);
    }

    #[test]
    fn test_locate_in_ring() {
        let tol = Tolerance::default();
        let ring = [v(0.0, 0.0), v(4.0, 0.0), v(4.0, 4.0), v(0.0, 4.0)];
        assert_eq!(locate_in_ring(v(2.0, 2.0), &ring, &tol), Location::Inside);
        assert_eq!(locate_in_ring(v(0.0, 2.0), &ring, &tol), Location::Boundary);
        assert_eq!(locate_in_ring(v(4.0, 4.0), &ring, &tol), Location::Boundary);
        assert_eq!(locate_in_ring(v(5.0, 2.0), &ring, &tol), Location::Outside);
    }

    #[test]
    fn test_segments_cross() {
        let tol = Tolerance::default();
        // X crossing
        assert!(segments_cross(v(0.0, 0.0), v(2.0, 2.0), v(0.0, 2.0), v(2.0, 0.0), &tol));
        // shared endpoint
        assert!(!segments_cross(v(0.0, 0.0), v(2.0, 0.0), v(2.0, 0.0), v(2.0, 2.0), &tol));
        // T junction: endpoint on the other's interior
        assert!(segments_cross(v(0.0, 0.0), v(4.0, 0.0), v(2.0, 0.0), v(2.0, 3.0), &tol));
        // disjoint
        assert!(!segments_cross(v(0.0, 0.0), v(1.0, 0.0), v(0.0, 1.0), v(1.0, 1.0), &tol));
        // collinear overlap
        assert!(segments_cross(v(0.0, 0.0), v(3.0, 0.0), v(1.0, 0.0), v(5.0, 0.0), &tol));
    }

    #[test]
    fn test_snapper_merges_within_tolerance() {
        let mut snapper = PointSnapper::new(Tolerance::new(1e-6).unwrap());
        let a = snapper.insert(v(1.0, 1.0));
        let b = snapper.insert(v(1.0 + 5e-7, 1.0 - 5e-7));
        let c = snapper.insert(v(1.0 + 5e-6, 1.0));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(snapper.len(), 2);
        assert_eq!(snapper.point(a), v(1.0, 1.0));
    }

    #[test]
    fn test_snapper_exact_mode() {
        let mut snapper = PointSnapper::new(Tolerance::new(0.0).unwrap());
        let a = snapper.insert(v(0.0, 0.0));
        let b = snapper.insert(v(-0.0, 0.0));
        let c = snapper.insert(v(1e-300, 0.0));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
