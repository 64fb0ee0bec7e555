//! Sutherland-Hodgman clipping of convex rings by bisector half-planes

use glam::DVec2;

/// Keep the part of a convex ring closer to `site` than to `other`
///
/// The ring stays counter-clockwise. Points on the bisector are kept.
pub(crate) fn clip_to_site(ring: &[DVec2], site: DVec2, other: DVec2) -> Vec<DVec2> {
    if ring.is_empty() {
        return Vec::new();
    }
    let normal = other - site;
    let mid = (site + other) * 0.5;
    let side = |p: DVec2| (p - mid).dot(normal);

    let mut output = Vec::with_capacity(ring.len() + 1);
    let n = ring.len();
    for i in 0..n {
        let current = ring[i];
        let next = ring[(i + 1) % n];
        let (sc, sn) = (side(current), side(next));
        match (sc <= 0.0, sn <= 0.0) {
            (true, true) => output.push(next),
            (true, false) => output.push(intersect(current, next, sc, sn)),
            (false, true) => {
                output.push(intersect(current, next, sc, sn));
                output.push(next);
            }
            (false, false) => {}
        }
    }
    output
}

fn intersect(a: DVec2, b: DVec2, sa: f64, sb: f64) -> DVec2 {
    let t = sa / (sa - sb);
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicates::signed_area;

    fn unit_square() -> Vec<DVec2> {
        vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(2.0, 0.0),
            DVec2::new(2.0, 2.0),
            DVec2::new(0.0, 2.0),
        ]
    }

    #[test]
    fn test_clip_halves_square() {
        let left = clip_to_site(&unit_square(), DVec2::new(0.5, 1.0), DVec2::new(1.5, 1.0));
        assert!((signed_area(&left) - 2.0).abs() < 1e-12);
        assert!(left.iter().all(|p| p.x <= 1.0 + 1e-12));
    }

    #[test]
    fn test_clip_far_bisector_keeps_ring() {
        let kept = clip_to_site(&unit_square(), DVec2::new(1.0, 1.0), DVec2::new(10.0, 1.0));
        assert_eq!(kept.len(), 4);
        assert!((signed_area(&kept) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_clip_everything_away() {
        let gone = clip_to_site(&unit_square(), DVec2::new(-10.0, 1.0), DVec2::new(-5.0, 1.0));
        assert!(gone.is_empty());
    }
}
