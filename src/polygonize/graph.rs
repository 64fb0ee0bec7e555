//! Arena-backed planar graph for polygonization
//!
//! Vertices live in a [`PointSnapper`]; edges refer to them by index and
//! are never removed from the arena, only flagged. Incident edge lists are
//! kept per vertex so traversals never chase pointers.

use glam::DVec2;
use std::collections::{HashMap, HashSet};
use tracing::trace;

use crate::config::Tolerance;
use crate::error::{Result, TessellationError};
use crate::predicates::{segments_cross, PointSnapper};
use crate::rings::clockwise_sweep;

#[derive(Debug, Clone, Copy)]
struct Edge {
    a: usize,
    b: usize,
    /// Cleared when the edge is pruned as a dangle
    alive: bool,
    /// Set when the edge is a cut edge of what remains
    bridge: bool,
}

impl Edge {
    #[inline]
    fn other(&self, v: usize) -> usize {
        if self.a == v {
            self.b
        } else {
            self.a
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct PlanarGraph {
    vertices: PointSnapper,
    edges: Vec<Edge>,
    known: HashSet<(usize, usize)>,
    incident: Vec<Vec<usize>>,
}

impl PlanarGraph {
    pub(crate) fn new(tolerance: Tolerance) -> Self {
        Self {
            vertices: PointSnapper::new(tolerance),
            edges: Vec::new(),
            known: HashSet::new(),
            incident: Vec::new(),
        }
    }

    /// Add an undirected edge; zero-length and repeated edges are ignored
    pub(crate) fn add_segment(&mut self, p: DVec2, q: DVec2) {
        let a = self.vertex(p);
        let b = self.vertex(q);
        if a == b || !self.known.insert((a.min(b), a.max(b))) {
            return;
        }
        let id = self.edges.len();
        self.edges.push(Edge {
            a,
            b,
            alive: true,
            bridge: false,
        });
        self.incident[a].push(id);
        self.incident[b].push(id);
    }

    fn vertex(&mut self, p: DVec2) -> usize {
        let id = self.vertices.insert(p);
        if id == self.incident.len() {
            self.incident.push(Vec::new());
        }
        id
    }

    pub(crate) fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Fail when two edges meet anywhere but at a shared vertex
    pub(crate) fn check_noding(&self) -> Result<()> {
        let tolerance = *self.vertices.tolerance();
        let eps = tolerance.epsilon();
        let segment = |e: &Edge| (self.vertices.point(e.a), self.vertices.point(e.b));

        let mut order: Vec<usize> = (0..self.edges.len()).collect();
        let min_x = |id: usize| {
            let (p, q) = segment(&self.edges[id]);
            p.x.min(q.x)
        };
        order.sort_by(|&i, &j| min_x(i).total_cmp(&min_x(j)).then(i.cmp(&j)));

        for (k, &i) in order.iter().enumerate() {
            let (a, b) = segment(&self.edges[i]);
            let max_x = a.x.max(b.x) + eps;
            for &j in &order[k + 1..] {
                let (c, d) = segment(&self.edges[j]);
                if c.x.min(d.x) > max_x {
                    break;
                }
                if c.y.min(d.y) > a.y.max(b.y) + eps || a.y.min(b.y) > c.y.max(d.y) + eps {
                    continue;
                }
                if segments_cross(a, b, c, d, &tolerance) {
                    return Err(TessellationError::InvalidTopology(format!(
                        "edge ({}, {})-({}, {}) crosses edge ({}, {})-({}, {}) away from a shared vertex",
                        a.x, a.y, b.x, b.y, c.x, c.y, d.x, d.y
                    )));
                }
            }
        }
        Ok(())
    }

    /// Remove degree-1 edges until none remain; returns how many went
    pub(crate) fn prune_dangles(&mut self) -> usize {
        let mut degree: Vec<usize> = self.incident.iter().map(Vec::len).collect();
        let mut queue: Vec<usize> = (0..degree.len()).filter(|&v| degree[v] == 1).collect();
        let mut pruned = 0;

        while let Some(v) = queue.pop() {
            if degree[v] != 1 {
                continue;
            }
            let Some(&e) = self.incident[v].iter().find(|&&e| self.edges[e].alive) else {
                continue;
            };
            self.edges[e].alive = false;
            pruned += 1;
            degree[v] -= 1;
            let w = self.edges[e].other(v);
            degree[w] -= 1;
            if degree[w] == 1 {
                queue.push(w);
            }
        }
        pruned
    }

    /// Flag cut edges among the live edges (Tarjan); returns how many
    pub(crate) fn mark_bridges(&mut self) -> usize {
        const UNSEEN: usize = usize::MAX;
        let n = self.incident.len();
        let mut disc = vec![UNSEEN; n];
        let mut low = vec![0usize; n];
        let mut timer = 0usize;
        let mut bridges = 0;

        for root in 0..n {
            if disc[root] != UNSEEN {
                continue;
            }
            disc[root] = timer;
            low[root] = timer;
            timer += 1;
            // (vertex, edge we arrived by, next incident slot to try)
            let mut stack: Vec<(usize, Option<usize>, usize)> = vec![(root, None, 0)];

            while let Some(top) = stack.len().checked_sub(1) {
                let (v, arrived_by, slot) = stack[top];
                if slot < self.incident[v].len() {
                    stack[top].2 += 1;
                    let e = self.incident[v][slot];
                    if !self.edges[e].alive || Some(e) == arrived_by {
                        continue;
                    }
                    let w = self.edges[e].other(v);
                    if disc[w] == UNSEEN {
                        disc[w] = timer;
                        low[w] = timer;
                        timer += 1;
                        stack.push((w, Some(e), 0));
                    } else {
                        low[v] = low[v].min(disc[w]);
                    }
                } else {
                    stack.pop();
                    if let Some(e) = arrived_by {
                        let u = self.edges[e].other(v);
                        low[u] = low[u].min(low[v]);
                        if low[v] > disc[u] {
                            self.edges[e].bridge = true;
                            bridges += 1;
                        }
                    }
                }
            }
        }
        bridges
    }

    /// Simple rings bounding the faces formed by live, non-bridge edges
    ///
    /// Every usable edge is walked once in each direction. At each vertex
    /// the walk continues along the first edge clockwise from the edge it
    /// arrived on, which keeps each face on the left. A walk that passes
    /// through a vertex twice is split there into simple rings. The outer
    /// boundary of a bounded face comes out counter-clockwise; holes pinched
    /// onto it and the unbounded face of each component come out clockwise
    /// and are left to the caller to discard.
    pub(crate) fn faces(&self) -> Vec<Vec<DVec2>> {
        let usable = |e: usize| self.edges[e].alive && !self.edges[e].bridge;
        // Half-edge (from, to) -> visited
        let mut visited: HashMap<(usize, usize), bool> = HashMap::new();
        for (id, edge) in self.edges.iter().enumerate() {
            if usable(id) {
                visited.insert((edge.a, edge.b), false);
                visited.insert((edge.b, edge.a), false);
            }
        }

        let mut faces = Vec::new();
        for (id, edge) in self.edges.iter().enumerate() {
            if !usable(id) {
                continue;
            }
            for (from, to) in [(edge.a, edge.b), (edge.b, edge.a)] {
                if visited.get(&(from, to)).copied().unwrap_or(true) {
                    continue;
                }
                let mut walk = Vec::new();
                let (mut u, mut v) = (from, to);
                let closed = loop {
                    visited.insert((u, v), true);
                    walk.push(u);
                    let Some(w) = self.turn(u, v, &usable) else {
                        break false;
                    };
                    if (v, w) == (from, to) {
                        break true;
                    }
                    if visited.get(&(v, w)).copied().unwrap_or(true) {
                        break false;
                    }
                    (u, v) = (v, w);
                };
                if !closed {
                    trace!(len = walk.len(), "discarding unclosed face walk");
                    continue;
                }
                for cycle in split_at_repeats(&walk) {
                    faces.push(cycle.iter().map(|&id| self.vertices.point(id)).collect());
                }
            }
        }
        faces
    }

    /// Next vertex after arriving at `at` from `from`: first usable edge clockwise
    fn turn(&self, from: usize, at: usize, usable: &impl Fn(usize) -> bool) -> Option<usize> {
        let origin = self.vertices.point(at);
        let back = self.vertices.point(from) - origin;
        let back_angle = back.y.atan2(back.x);
        self.incident[at]
            .iter()
            .copied()
            .filter(|&e| usable(e))
            .map(|e| {
                let w = self.edges[e].other(at);
                let dir = self.vertices.point(w) - origin;
                (w, clockwise_sweep(back_angle, dir.y.atan2(dir.x)))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
            .map(|(w, _)| w)
    }
}

/// Split a closed vertex walk into simple cycles at every repeated vertex
///
/// Cycles shorter than three vertices are dropped.
fn split_at_repeats(walk: &[usize]) -> Vec<Vec<usize>> {
    let mut stack: Vec<usize> = Vec::with_capacity(walk.len());
    let mut position: HashMap<usize, usize> = HashMap::new();
    let mut cycles = Vec::new();
    for &v in walk {
        if let Some(&at) = position.get(&v) {
            let tail = stack.split_off(at + 1);
            for w in &tail {
                position.remove(w);
            }
            let mut cycle = Vec::with_capacity(tail.len() + 1);
            cycle.push(v);
            cycle.extend(tail);
            cycles.push(cycle);
        } else {
            position.insert(v, stack.len());
            stack.push(v);
        }
    }
    cycles.push(stack);
    cycles.retain(|cycle| cycle.len() >= 3);
    cycles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f64, y: f64) -> DVec2 {
        DVec2::new(x, y)
    }

    fn path(graph: &mut PlanarGraph, points: &[DVec2]) {
        for w in points.windows(2) {
            graph.add_segment(w[0], w[1]);
        }
    }

    #[test]
    fn test_duplicate_and_zero_length_edges_ignored() {
        let mut graph = PlanarGraph::new(Tolerance::default());
        graph.add_segment(v(0.0, 0.0), v(1.0, 0.0));
        graph.add_segment(v(1.0, 0.0), v(0.0, 0.0));
        graph.add_segment(v(1.0, 0.0), v(1.0, 0.0));
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_dangle_chain_pruned_to_fixed_point() {
        let mut graph = PlanarGraph::new(Tolerance::default());
        path(&mut graph, &[v(0.0, 0.0), v(1.0, 0.0), v(1.0, 1.0), v(0.0, 0.0)]);
        // Two-edge tail hanging off the triangle
        path(&mut graph, &[v(1.0, 1.0), v(2.0, 2.0), v(3.0, 2.0)]);
        assert_eq!(graph.prune_dangles(), 2);
        assert_eq!(graph.faces().len(), 2);
    }

    #[test]
    fn test_bridge_between_cycles() {
        let mut graph = PlanarGraph::new(Tolerance::default());
        path(&mut graph, &[v(0.0, 0.0), v(1.0, 0.0), v(1.0, 1.0), v(0.0, 1.0), v(0.0, 0.0)]);
        path(&mut graph, &[v(3.0, 0.0), v(4.0, 0.0), v(4.0, 1.0), v(3.0, 1.0), v(3.0, 0.0)]);
        graph.add_segment(v(1.0, 0.0), v(3.0, 0.0));
        assert_eq!(graph.prune_dangles(), 0);
        assert_eq!(graph.mark_bridges(), 1);
        // Each square yields its inside and its outside walk
        assert_eq!(graph.faces().len(), 4);
    }

    #[test]
    fn test_split_at_repeats() {
        assert_eq!(split_at_repeats(&[0, 1, 2, 3]), vec![vec![0, 1, 2, 3]]);
        assert_eq!(
            split_at_repeats(&[0, 1, 2, 3, 0, 4, 5]),
            vec![vec![0, 1, 2, 3], vec![0, 4, 5]]
        );
        assert_eq!(
            split_at_repeats(&[1, 2, 3, 0, 4, 5, 0]),
            vec![vec![0, 4, 5], vec![1, 2, 3, 0]]
        );
        // Out and back along a spur leaves nothing
        assert!(split_at_repeats(&[0, 1, 0]).is_empty());
    }

    #[test]
    fn test_pinched_face_is_split() {
        let mut graph = PlanarGraph::new(Tolerance::default());
        path(&mut graph, &[v(0.0, 0.0), v(10.0, 0.0), v(10.0, 10.0), v(0.0, 10.0), v(0.0, 0.0)]);
        path(&mut graph, &[v(0.0, 0.0), v(5.0, 2.0), v(2.0, 5.0), v(0.0, 0.0)]);
        assert_eq!(graph.prune_dangles(), 0);
        assert_eq!(graph.mark_bridges(), 0);

        let faces = graph.faces();
        let mut vertex_counts: Vec<usize> = faces.iter().map(Vec::len).collect();
        vertex_counts.sort_unstable();
        // Triangle twice (inside, and as the hole of the square), square twice
        assert_eq!(vertex_counts, vec![3, 3, 4, 4]);
        for face in &faces {
            let mut ids: Vec<(u64, u64)> = face.iter().map(|p| (p.x.to_bits(), p.y.to_bits())).collect();
            ids.sort_unstable();
            ids.dedup();
            assert_eq!(ids.len(), face.len(), "face {:?} repeats a vertex", face);
        }
    }

    #[test]
    fn test_crossing_edges_rejected() {
        let mut graph = PlanarGraph::new(Tolerance::default());
        graph.add_segment(v(0.0, 0.0), v(2.0, 2.0));
        graph.add_segment(v(0.0, 2.0), v(2.0, 0.0));
        assert!(matches!(
            graph.check_noding(),
            Err(TessellationError::InvalidTopology(_))
        ));

        let mut noded = PlanarGraph::new(Tolerance::default());
        noded.add_segment(v(0.0, 0.0), v(1.0, 1.0));
        noded.add_segment(v(1.0, 1.0), v(2.0, 2.0));
        noded.add_segment(v(0.0, 2.0), v(1.0, 1.0));
        assert!(noded.check_noding().is_ok());
    }
}
