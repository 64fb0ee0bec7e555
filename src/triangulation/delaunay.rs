//! Incremental Delaunay triangulation (Bowyer–Watson)
//!
//! Instead of an enclosing super-triangle, the convex hull is closed off
//! with "ghost" triangles that share a single vertex at infinity. A ghost
//! triangle `(s, t, ∞)` conflicts with a new point when the point lies
//! strictly left of the hull edge `s -> t` (outside the hull) or on the
//! open segment between them. Real triangles conflict when the point is
//! strictly inside their circumcircle, so co-circular points never
//! trigger retriangulation.
//!
//! Points are inserted in `(x, y, input index)` order, which makes the
//! result independent of input permutation apart from index labels.

use glam::DVec2;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, trace};

use crate::error::{Result, TessellationError};
use crate::predicates::{in_circle, orient2d};

/// Vertex id standing in for the point at infinity
const GHOST: usize = usize::MAX;

/// Triangles over a point set, referencing points by input index
#[derive(Debug, Clone)]
pub struct Triangulation {
    points: Vec<DVec2>,
    triangles: Vec<[usize; 3]>,
}

impl Triangulation {
    /// Input points, including any exact duplicates that were skipped
    pub fn points(&self) -> &[DVec2] {
        &self.points
    }

    /// Counter-clockwise triangles, each starting at its smallest index,
    /// sorted lexicographically
    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    /// Corner coordinates of a triangle
    pub fn corners(&self, triangle: &[usize; 3]) -> [DVec2; 3] {
        [
            self.points[triangle[0]],
            self.points[triangle[1]],
            self.points[triangle[2]],
        ]
    }

    /// Undirected edges `(low, high)` in ascending order
    pub fn edges(&self) -> Vec<(usize, usize)> {
        let mut edges: Vec<(usize, usize)> = self
            .triangles
            .iter()
            .flat_map(|t| [(t[0], t[1]), (t[1], t[2]), (t[2], t[0])])
            .map(|(a, b)| (a.min(b), a.max(b)))
            .collect();
        edges.sort_unstable();
        edges.dedup();
        edges
    }

    /// Sorted neighbour lists per input point (empty for skipped duplicates)
    pub fn neighbors(&self) -> Vec<Vec<usize>> {
        let mut neighbors = vec![Vec::new(); self.points.len()];
        for (a, b) in self.edges() {
            neighbors[a].push(b);
            neighbors[b].push(a);
        }
        for list in &mut neighbors {
            list.sort_unstable();
        }
        neighbors
    }
}

/// Triangulate a planar point set
///
/// Exact duplicate coordinates are kept in [`Triangulation::points`] but
/// only their first occurrence takes part in the triangulation.
///
/// # Errors
///
/// Returns `DegenerateInput` for fewer than 3 distinct points or when all
/// points are collinear
pub fn triangulate_points(points: &[DVec2]) -> Result<Triangulation> {
    if let Some(bad) = points.iter().position(|p| !p.is_finite()) {
        return Err(TessellationError::InvalidGeometry(format!(
            "point {} has a non-finite coordinate",
            bad
        )));
    }

    let order = insertion_order(points);
    if order.len() < 3 {
        return Err(TessellationError::DegenerateInput(format!(
            "triangulation needs at least 3 distinct points (got {})",
            order.len()
        )));
    }

    let (a, b) = (order[0], order[1]);
    let Some(k) = (2..order.len()).find(|&k| orient2d(points[a], points[b], points[order[k]]) != 0.0)
    else {
        return Err(TessellationError::DegenerateInput(
            "all points are collinear".into(),
        ));
    };

    let mut mesh = Mesh::new(points, a, b, order[k]);
    for (step, &p) in order.iter().enumerate() {
        if step == 0 || step == 1 || step == k {
            continue;
        }
        mesh.insert(p)?;
    }

    let triangles = mesh.finish();
    debug!(
        points = points.len(),
        distinct = order.len(),
        triangles = triangles.len(),
        "delaunay triangulation built"
    );
    Ok(Triangulation {
        points: points.to_vec(),
        triangles,
    })
}

/// Indices sorted by `(x, y, index)` with exact duplicates removed
fn insertion_order(points: &[DVec2]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by(|&i, &j| lexicographic(points[i], points[j]).then(i.cmp(&j)));
    order.dedup_by(|later, earlier| points[*later] == points[*earlier]);
    order
}

pub(crate) fn lexicographic(a: DVec2, b: DVec2) -> Ordering {
    a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y))
}

/// Triangle arena with a directed-edge index for adjacency
struct Mesh<'a> {
    points: &'a [DVec2],
    triangles: Vec<[usize; 3]>,
    alive: Vec<bool>,
    edges: HashMap<(usize, usize), usize>,
}

impl<'a> Mesh<'a> {
    fn new(points: &'a [DVec2], a: usize, b: usize, c: usize) -> Self {
        let (b, c) = if orient2d(points[a], points[b], points[c]) > 0.0 {
            (b, c)
        } else {
            (c, b)
        };
        let mut mesh = Self {
            points,
            triangles: Vec::new(),
            alive: Vec::new(),
            edges: HashMap::new(),
        };
        mesh.add([a, b, c]);
        mesh.add([b, a, GHOST]);
        mesh.add([c, b, GHOST]);
        mesh.add([a, c, GHOST]);
        mesh
    }

    fn add(&mut self, tri: [usize; 3]) {
        let idx = self.triangles.len();
        for e in directed_edges(&tri) {
            self.edges.insert(e, idx);
        }
        self.triangles.push(tri);
        self.alive.push(true);
    }

    fn remove(&mut self, idx: usize) {
        self.alive[idx] = false;
        for e in directed_edges(&self.triangles[idx]) {
            if self.edges.get(&e) == Some(&idx) {
                self.edges.remove(&e);
            }
        }
    }

    fn conflicts(&self, tri: &[usize; 3], p: DVec2) -> bool {
        let [a, b, c] = *tri;
        if c == GHOST {
            let (s, t) = (self.points[a], self.points[b]);
            let side = orient2d(s, t, p);
            if side != 0.0 {
                return side > 0.0;
            }
            // On the hull line: conflicting only strictly between s and t
            return (p - s).dot(t - s) > 0.0 && (p - t).dot(s - t) > 0.0;
        }
        in_circle(self.points[a], self.points[b], self.points[c], p) > 0.0
    }

    fn insert(&mut self, vertex: usize) -> Result<()> {
        let p = self.points[vertex];
        let seed = (0..self.triangles.len())
            .rev()
            .find(|&i| self.alive[i] && self.conflicts(&self.triangles[i], p))
            .ok_or_else(|| {
                TessellationError::DegenerateInput(format!(
                    "point {} could not be located in the triangulation",
                    vertex
                ))
            })?;

        // Flood the cavity of conflicting triangles
        let mut cavity = HashSet::from([seed]);
        let mut queue = VecDeque::from([seed]);
        let mut boundary: Vec<(usize, usize)> = Vec::new();
        while let Some(idx) = queue.pop_front() {
            for (u, v) in directed_edges(&self.triangles[idx]) {
                match self.edges.get(&(v, u)) {
                    Some(&nb) if cavity.contains(&nb) => {}
                    Some(&nb) if self.conflicts(&self.triangles[nb], p) => {
                        cavity.insert(nb);
                        queue.push_back(nb);
                    }
                    _ => boundary.push((u, v)),
                }
            }
        }

        trace!(vertex, cavity = cavity.len(), boundary = boundary.len(), "inserting");
        let mut removed: Vec<usize> = cavity.into_iter().collect();
        removed.sort_unstable();
        for idx in removed {
            self.remove(idx);
        }
        for (u, v) in boundary {
            let tri = if u == GHOST {
                [v, vertex, GHOST]
            } else if v == GHOST {
                [vertex, u, GHOST]
            } else {
                [u, v, vertex]
            };
            self.add(tri);
        }
        Ok(())
    }

    /// Real triangles, canonically rotated and sorted
    fn finish(self) -> Vec<[usize; 3]> {
        let mut triangles: Vec<[usize; 3]> = self
            .triangles
            .iter()
            .zip(&self.alive)
            .filter(|(t, &alive)| alive && !t.contains(&GHOST))
            .map(|(t, _)| {
                let start = (0..3).min_by_key(|&i| t[i]).unwrap_or(0);
                [t[start], t[(start + 1) % 3], t[(start + 2) % 3]]
            })
            .collect();
        triangles.sort_unstable();
        triangles
    }
}

fn directed_edges(tri: &[usize; 3]) -> [(usize, usize); 3] {
    [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])]
}
