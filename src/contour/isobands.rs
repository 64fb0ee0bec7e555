//! Marching-squares isobands
//!
//! Each cell contributes the counter-clockwise pieces of itself that lie in
//! the band. A piece follows the cell boundary while the boundary is in the
//! band and cuts across the cell along an isoline chord where it leaves.
//! Pieces are then dissolved by the [`RingAssembler`].

use glam::DVec2;
use tracing::trace;

use super::ScalarGrid;
use crate::config::Tolerance;
use crate::geometry::{closed_positions, Position};
use crate::rings::{normalize_ring_start, RingAssembler};

/// A point on the cell boundary, in walking order
#[derive(Debug, Clone, Copy)]
struct BoundaryPoint {
    at: DVec2,
    value: f64,
    /// For a crossing: the crossing it is joined to by an isoline chord
    chord: Option<usize>,
}

/// Polygons covering `lower <= v < upper`, as closed GeoJSON rings
pub(super) fn trace(grid: &ScalarGrid, lower: f64, upper: f64, tolerance: &Tolerance) -> Vec<Vec<Vec<Position>>> {
    let mut assembler = RingAssembler::new(*tolerance);
    let mut pieces = 0usize;
    for j in 0..grid.ny() - 1 {
        for i in 0..grid.nx() - 1 {
            for piece in cell_pieces(grid, i, j, lower, upper) {
                assembler.add_ring(&piece);
                pieces += 1;
            }
        }
    }
    trace!(lower, upper, pieces, edges = assembler.boundary_edge_count(), "band pieces collected");

    assembler
        .assemble()
        .into_iter()
        .map(|polygon| {
            polygon
                .into_iter()
                .map(|mut ring| {
                    normalize_ring_start(&mut ring);
                    closed_positions(&ring)
                })
                .collect()
        })
        .collect()
}

/// In-band pieces of one cell, each an open counter-clockwise ring
fn cell_pieces(grid: &ScalarGrid, i: usize, j: usize, lower: f64, upper: f64) -> Vec<Vec<DVec2>> {
    let nodes = [(i, j), (i + 1, j), (i + 1, j + 1), (i, j + 1)];
    let values = nodes.map(|(ni, nj)| grid.value(ni, nj));
    let in_band = |v: f64| lower <= v && v < upper;

    if values.iter().all(|&v| v < lower) || values.iter().all(|&v| v >= upper) {
        return Vec::new();
    }
    if values.iter().all(|&v| in_band(v)) {
        return vec![nodes.iter().map(|&(ni, nj)| grid.node(ni, nj)).collect()];
    }

    let mut points: Vec<BoundaryPoint> = Vec::with_capacity(12);
    // Crossing indices per threshold, tagged with the cell side they sit on
    let mut crossings: [Vec<(usize, usize)>; 2] = [Vec::new(), Vec::new()];
    for side in 0..4 {
        let (p, q) = (nodes[side], nodes[(side + 1) % 4]);
        let (vp, vq) = (values[side], values[(side + 1) % 4]);
        let origin = grid.node(p.0, p.1);
        points.push(BoundaryPoint {
            at: origin,
            value: vp,
            chord: None,
        });

        let mut on_side: Vec<(usize, DVec2, f64)> = [lower, upper]
            .iter()
            .enumerate()
            .filter(|&(_, &t)| (vp >= t) != (vq >= t))
            .map(|(k, &t)| (k, grid.crossing(p, q, t), t))
            .collect();
        on_side.sort_by(|a, b| a.1.distance(origin).total_cmp(&b.1.distance(origin)));
        for (k, at, t) in on_side {
            crossings[k].push((points.len(), side));
            points.push(BoundaryPoint {
                at,
                value: t,
                chord: None,
            });
        }
    }

    let centre = values.iter().sum::<f64>() / 4.0;
    for (k, threshold) in [lower, upper].into_iter().enumerate() {
        for (a, b) in chord_pairs(&crossings[k], values[1] >= threshold, centre >= threshold) {
            points[a].chord = Some(b);
            points[b].chord = Some(a);
        }
    }

    walk_pieces(&points, in_band)
}

/// Which crossings of one threshold are joined across the cell
///
/// With four crossings (a saddle) the sides are bottom, right, top, left in
/// order; the centre decides whether corner b joins d through the middle.
fn chord_pairs(crossings: &[(usize, usize)], b_above: bool, centre_above: bool) -> Vec<(usize, usize)> {
    match crossings {
        [(a, _), (b, _)] => vec![(*a, *b)],
        [(bottom, 0), (right, 1), (top, 2), (left, 3)] => {
            if b_above == centre_above {
                vec![(*left, *bottom), (*right, *top)]
            } else {
                vec![(*bottom, *right), (*top, *left)]
            }
        }
        _ => Vec::new(),
    }
}

/// Trace pieces: follow in-band boundary stretches, jump along chords when leaving
fn walk_pieces(points: &[BoundaryPoint], in_band: impl Fn(f64) -> bool) -> Vec<Vec<DVec2>> {
    let n = points.len();
    let inside: Vec<bool> = (0..n)
        .map(|s| in_band((points[s].value + points[(s + 1) % n].value) / 2.0))
        .collect();

    let mut visited = vec![false; n];
    let mut pieces = Vec::new();
    for start in 0..n {
        if !inside[start] || visited[start] {
            continue;
        }
        let mut ring = Vec::new();
        let mut s = start;
        let mut closed = false;
        for _ in 0..2 * n {
            visited[s] = true;
            ring.push(points[s].at);
            let mut next = (s + 1) % n;
            if !inside[next] {
                ring.push(points[next].at);
                match points[next].chord {
                    Some(other) => next = other,
                    None => break,
                }
            }
            if next == start {
                closed = true;
                break;
            }
            if visited[next] || !inside[next] {
                break;
            }
            s = next;
        }
        if closed {
            pieces.push(ring);
        } else {
            trace!(start, "abandoning unclosed band piece");
        }
    }
    pieces
}
