//! Marching-squares isolines

use glam::DVec2;
use std::collections::HashSet;

use super::ScalarGrid;
use crate::config::Tolerance;
use crate::geometry::Position;
use crate::predicates::PointSnapper;

/// All isoline parts for threshold `t`
///
/// Open chains come first, ordered by where their first end was met in
/// the lattice scan, followed by closed loops.
pub(super) fn trace(grid: &ScalarGrid, t: f64, tolerance: &Tolerance) -> Vec<Vec<Position>> {
    let mut segments = Vec::new();
    for j in 0..grid.ny() - 1 {
        for i in 0..grid.nx() - 1 {
            cell_segments(grid, i, j, t, &mut segments);
        }
    }
    merge(&segments, tolerance)
}

/// Segments for one cell, corners `a b c d` counter-clockwise from bottom-left
fn cell_segments(grid: &ScalarGrid, i: usize, j: usize, t: f64, out: &mut Vec<(DVec2, DVec2)>) {
    let nodes = [(i, j), (i + 1, j), (i + 1, j + 1), (i, j + 1)];
    let values = nodes.map(|(ni, nj)| grid.value(ni, nj));
    let above = values.map(|v| v >= t);

    // Crossing on the edge leaving corner k, in order bottom, right, top, left
    let crossings: [Option<DVec2>; 4] = std::array::from_fn(|k| {
        let next = (k + 1) % 4;
        (above[k] != above[next]).then(|| grid.crossing(nodes[k], nodes[next], t))
    });

    match crossings {
        [Some(bottom), Some(right), Some(top), Some(left)] => {
            let centre_above = values.iter().sum::<f64>() / 4.0 >= t;
            if centre_above == above[0] {
                // a and c joined through the centre: cut off b and d
                out.push((bottom, right));
                out.push((top, left));
            } else {
                out.push((left, bottom));
                out.push((right, top));
            }
        }
        _ => {
            let mut found = crossings.iter().flatten();
            if let (Some(&p), Some(&q)) = (found.next(), found.next()) {
                out.push((p, q));
            }
        }
    }
}

/// Join segments sharing endpoints into polylines
fn merge(segments: &[(DVec2, DVec2)], tolerance: &Tolerance) -> Vec<Vec<Position>> {
    let mut snapper = PointSnapper::new(*tolerance);
    let mut edges: Vec<(usize, usize)> = Vec::new();
    let mut seen = HashSet::new();
    for &(p, q) in segments {
        let (a, b) = (snapper.insert(p), snapper.insert(q));
        // Segments along a lattice edge are emitted by both neighbouring cells
        if a != b && seen.insert((a.min(b), a.max(b))) {
            edges.push((a, b));
        }
    }

    let mut incident: Vec<Vec<usize>> = vec![Vec::new(); snapper.len()];
    for (k, &(a, b)) in edges.iter().enumerate() {
        incident[a].push(k);
        incident[b].push(k);
    }

    let mut used = vec![false; edges.len()];
    let mut chains: Vec<Vec<usize>> = Vec::new();
    for start in 0..snapper.len() {
        if incident[start].len() == 2 {
            continue;
        }
        while let Some(&first) = incident[start].iter().find(|&&k| !used[k]) {
            chains.push(walk(start, first, &edges, &incident, &mut used));
        }
    }
    for k in 0..edges.len() {
        if !used[k] {
            chains.push(walk(edges[k].0, k, &edges, &incident, &mut used));
        }
    }

    chains
        .into_iter()
        .map(|chain| {
            chain
                .into_iter()
                .map(|id| {
                    let p = snapper.point(id);
                    Position::new(p.x, p.y)
                })
                .collect()
        })
        .collect()
}

/// Follow degree-2 vertices from `start` until a junction, an end, or back to `start`
fn walk(
    start: usize,
    first: usize,
    edges: &[(usize, usize)],
    incident: &[Vec<usize>],
    used: &mut [bool],
) -> Vec<usize> {
    let mut path = vec![start];
    let mut at = start;
    let mut edge = first;
    loop {
        used[edge] = true;
        let (a, b) = edges[edge];
        at = if a == at { b } else { a };
        path.push(at);
        if at == start || incident[at].len() != 2 {
            break;
        }
        match incident[at].iter().find(|&&k| !used[k]) {
            Some(&k) => edge = k,
            None => break,
        }
    }
    path
}
