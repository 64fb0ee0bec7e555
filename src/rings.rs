//! Ring assembly from directed boundary edges
//!
//! Pieces (isoband cell fragments, concave-hull triangles) are fed in as
//! counter-clockwise rings. Edges shared by two neighbouring pieces run in
//! opposite directions and cancel; what survives is the boundary of the
//! union. The survivors are linked into rings, counter-clockwise rings
//! become exteriors and clockwise rings become holes of the smallest
//! exterior containing them.

use glam::DVec2;
use std::collections::HashMap;
use std::f64::consts::TAU;
use tracing::trace;

use crate::config::Tolerance;
use crate::predicates::{self, Location, PointSnapper};

/// A polygon as open rings: exterior first, then holes
pub type PolygonRings = Vec<Vec<DVec2>>;

/// Accumulates pieces and dissolves them into polygons
#[derive(Debug, Clone)]
pub struct RingAssembler {
    snapper: PointSnapper,
    edges: Vec<(usize, usize)>,
    alive: Vec<bool>,
    open: HashMap<(usize, usize), Vec<usize>>,
}

impl RingAssembler {
    pub fn new(tolerance: Tolerance) -> Self {
        Self {
            snapper: PointSnapper::new(tolerance),
            edges: Vec::new(),
            alive: Vec::new(),
            open: HashMap::new(),
        }
    }

    /// Add a counter-clockwise piece (open ring)
    pub fn add_ring(&mut self, ring: &[DVec2]) {
        if ring.len() < 3 {
            return;
        }
        let ids: Vec<usize> = ring.iter().map(|&p| self.snapper.insert(p)).collect();
        for i in 0..ids.len() {
            self.add_edge(ids[i], ids[(i + 1) % ids.len()]);
        }
    }

    fn add_edge(&mut self, from: usize, to: usize) {
        if from == to {
            return;
        }
        if let Some(twins) = self.open.get_mut(&(to, from)) {
            if let Some(twin) = twins.pop() {
                self.alive[twin] = false;
                return;
            }
        }
        let idx = self.edges.len();
        self.edges.push((from, to));
        self.alive.push(true);
        self.open.entry((from, to)).or_default().push(idx);
    }

    /// Number of boundary edges that survived cancellation
    pub fn boundary_edge_count(&self) -> usize {
        self.alive.iter().filter(|&&a| a).count()
    }

    /// Link the surviving edges into polygons
    ///
    /// Collinear vertices are dropped from the output rings.
    pub fn assemble(self) -> Vec<PolygonRings> {
        let tolerance = *self.snapper.tolerance();
        let rings = self.trace_rings();

        let mut exteriors: Vec<(Vec<DVec2>, f64)> = Vec::new();
        let mut holes: Vec<Vec<DVec2>> = Vec::new();
        for ring in rings {
            let ring = simplify_ring(ring, &tolerance);
            if ring.len() < 3 {
                continue;
            }
            let area = predicates::signed_area(&ring);
            if area > 0.0 {
                exteriors.push((ring, area));
            } else if area < 0.0 {
                holes.push(ring);
            }
        }

        let mut polygons: Vec<PolygonRings> =
            exteriors.iter().map(|(ring, _)| vec![ring.clone()]).collect();
        for hole in holes {
            let probe = hole_probe(&hole, &exteriors, &tolerance);
            let owner = exteriors
                .iter()
                .enumerate()
                .filter(|(_, (ring, _))| {
                    predicates::locate_in_ring(probe, ring, &tolerance) != Location::Outside
                })
                .min_by(|a, b| a.1 .1.total_cmp(&b.1 .1))
                .map(|(i, _)| i);
            match owner {
                Some(i) => polygons[i].push(hole),
                None => trace!("dropping hole without an enclosing exterior"),
            }
        }
        polygons
    }

    /// Walk surviving edges into closed vertex loops
    fn trace_rings(&self) -> Vec<Vec<DVec2>> {
        let mut outgoing: HashMap<usize, Vec<usize>> = HashMap::new();
        for (idx, &(from, _)) in self.edges.iter().enumerate() {
            if self.alive[idx] {
                outgoing.entry(from).or_default().push(idx);
            }
        }

        let mut used = vec![false; self.edges.len()];
        let mut rings = Vec::new();
        for start in 0..self.edges.len() {
            if !self.alive[start] || used[start] {
                continue;
            }
            let mut ring = Vec::new();
            let mut current = start;
            let closed = loop {
                used[current] = true;
                let (from, to) = self.edges[current];
                ring.push(self.snapper.point(from));

                let candidates: Vec<usize> = outgoing
                    .get(&to)
                    .map(|list| {
                        list.iter()
                            .copied()
                            .filter(|&e| !used[e] || e == start)
                            .collect()
                    })
                    .unwrap_or_default();
                let Some(next) = self.pick_clockwise_next(from, to, &candidates) else {
                    break false;
                };
                if next == start {
                    break true;
                }
                current = next;
            };
            if closed {
                rings.push(ring);
            } else {
                trace!(len = ring.len(), "discarding unclosed boundary chain");
            }
        }
        rings
    }

    /// First candidate clockwise from the reversed incoming edge
    fn pick_clockwise_next(&self, from: usize, at: usize, candidates: &[usize]) -> Option<usize> {
        let origin = self.snapper.point(at);
        let back = self.snapper.point(from) - origin;
        let back_angle = back.y.atan2(back.x);
        candidates
            .iter()
            .copied()
            .map(|e| {
                let dir = self.snapper.point(self.edges[e].1) - origin;
                (e, clockwise_sweep(back_angle, dir.y.atan2(dir.x)))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
            .map(|(e, _)| e)
    }
}

/// Clockwise angle from `from` to `to`, in `(0, 2π]`
pub(crate) fn clockwise_sweep(from: f64, to: f64) -> f64 {
    let mut sweep = (from - to).rem_euclid(TAU);
    if sweep <= 0.0 {
        sweep = TAU;
    }
    sweep
}

/// Drop repeated and collinear vertices from an open ring
pub fn simplify_ring(mut ring: Vec<DVec2>, tolerance: &Tolerance) -> Vec<DVec2> {
    ring.dedup_by(|a, b| tolerance.same_point(*a, *b));
    while ring.len() > 1 && tolerance.same_point(ring[0], ring[ring.len() - 1]) {
        ring.pop();
    }
    let mut changed = true;
    while changed && ring.len() >= 3 {
        changed = false;
        let n = ring.len();
        for i in 0..n {
            let prev = ring[(i + n - 1) % n];
            let cur = ring[i];
            let next = ring[(i + 1) % n];
            let straight = (cur - prev).dot(next - cur) > 0.0;
            if straight && predicates::is_collinear(prev, cur, next, tolerance) {
                ring.remove(i);
                changed = true;
                break;
            }
        }
    }
    ring
}

/// Rotate an open ring so it starts at its lowest (x, then y) vertex
pub fn normalize_ring_start(ring: &mut [DVec2]) {
    let start = ring
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.x.total_cmp(&b.1.x).then(a.1.y.total_cmp(&b.1.y)))
        .map(|(i, _)| i)
        .unwrap_or(0);
    ring.rotate_left(start);
}

/// A point of the hole that is not on any exterior boundary, if possible
fn hole_probe(hole: &[DVec2], exteriors: &[(Vec<DVec2>, f64)], tolerance: &Tolerance) -> DVec2 {
    hole.iter()
        .copied()
        .find(|&p| {
            exteriors
                .iter()
                .all(|(ring, _)| predicates::locate_in_ring(p, ring, tolerance) != Location::Boundary)
        })
        .or_else(|| predicates::ring_centroid(hole))
        .unwrap_or(DVec2::ZERO)
}
