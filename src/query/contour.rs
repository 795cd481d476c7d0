//! Boundary tracing with marching squares
//!
//! The membership field is treated as 1.0 (inside) / 0.0 (outside) and
//! contoured at level 0.5, so every crossing sits at the midpoint of a grid
//! edge. Corners of cell `(i, j)` are numbered
//!
//! ```text
//!  b3 (i, j+1) ---- e2 ---- b2 (i+1, j+1)
//!       |                        |
//!      e3                       e1
//!       |                        |
//!  b0 (i, j)   ---- e0 ---- b1 (i+1, j)
//! ```
//!
//! Saddle cells use the centre average, 0.5, which counts as inside: the two
//! inside corners are connected and each outside corner is cut off.
//!
//! Segments are chained into polylines through the grid edges they share.
//! Every interior edge is shared by exactly two segments, so a piece either
//! closes on itself or ends at the grid border.

use std::collections::HashMap;

use nalgebra::DMatrix;
use ndarray::{Array1, ArrayD, ArrayView2, Axis, Ix2};

use crate::errors::ModelError;

use super::output::Polyline;

/// Grid edge: `H(i, j)` joins nodes `(i, j)` and `(i+1, j)`, `V(i, j)`
/// joins `(i, j)` and `(i, j+1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Edge {
    H(usize, usize),
    V(usize, usize),
}

/// Trace the boundary of a 2D or 3D membership field.
///
/// 3D fields are traced slice by slice along the last axis; each piece then
/// carries its slice's z coordinate as third column.
pub fn trace_boundaries(
    field: &ArrayD<bool>,
    axes: &[Array1<f64>],
) -> Result<Vec<Polyline>, ModelError> {
    match field.ndim() {
        2 => {
            let plane = field
                .view()
                .into_dimensionality::<Ix2>()
                .map_err(|e| ModelError::query(format!("field is not 2D: {}", e)))?;
            Ok(trace_plane(plane, &axes[0], &axes[1])
                .into_iter()
                .map(|(points, closed)| to_polyline(&points, None, closed))
                .collect())
        }
        3 => {
            let mut pieces = Vec::new();
            for (k, slice) in field.axis_iter(Axis(2)).enumerate() {
                let plane = slice
                    .into_dimensionality::<Ix2>()
                    .map_err(|e| ModelError::query(format!("slice is not 2D: {}", e)))?;
                let z = axes[2][k];
                pieces.extend(
                    trace_plane(plane, &axes[0], &axes[1])
                        .into_iter()
                        .map(|(points, closed)| to_polyline(&points, Some(z), closed)),
                );
            }
            Ok(pieces)
        }
        n => Err(ModelError::query(format!(
            "boundaries can only be traced in 2D or 3D, got {}D",
            n
        ))),
    }
}

fn to_polyline(points: &[[f64; 2]], z: Option<f64>, closed: bool) -> Polyline {
    let columns = if z.is_some() { 3 } else { 2 };
    let points = DMatrix::from_fn(points.len(), columns, |r, c| match c {
        0 | 1 => points[r][c],
        _ => z.unwrap_or(0.0),
    });
    Polyline { points, closed }
}

/// Edges cut off the field's inside corners, per corner code.
fn cell_segments(code: u8) -> &'static [(usize, usize)] {
    match code {
        0 | 15 => &[],
        1 | 14 => &[(3, 0)],
        2 | 13 => &[(0, 1)],
        3 | 12 => &[(3, 1)],
        4 | 11 => &[(1, 2)],
        6 | 9 => &[(0, 2)],
        7 | 8 => &[(2, 3)],
        // Saddles: centre inside, outside corners isolated
        5 => &[(0, 1), (2, 3)],
        10 => &[(3, 0), (1, 2)],
        _ => &[],
    }
}

fn cell_edge(i: usize, j: usize, local: usize) -> Edge {
    match local {
        0 => Edge::H(i, j),
        1 => Edge::V(i + 1, j),
        2 => Edge::H(i, j + 1),
        _ => Edge::V(i, j),
    }
}

fn edge_point(edge: Edge, x: &Array1<f64>, y: &Array1<f64>) -> [f64; 2] {
    match edge {
        Edge::H(i, j) => [0.5 * (x[i] + x[i + 1]), y[j]],
        Edge::V(i, j) => [x[i], 0.5 * (y[j] + y[j + 1])],
    }
}

/// Marching squares over one plane; returns `(points, closed)` per piece.
fn trace_plane(field: ArrayView2<bool>, x: &Array1<f64>, y: &Array1<f64>) -> Vec<(Vec<[f64; 2]>, bool)> {
    let (nx, ny) = field.dim();
    if nx < 2 || ny < 2 {
        return Vec::new();
    }

    let mut segments: Vec<[Edge; 2]> = Vec::new();
    for i in 0..nx - 1 {
        for j in 0..ny - 1 {
            let code = field[[i, j]] as u8
                | (field[[i + 1, j]] as u8) << 1
                | (field[[i + 1, j + 1]] as u8) << 2
                | (field[[i, j + 1]] as u8) << 3;
            for &(a, b) in cell_segments(code) {
                segments.push([cell_edge(i, j, a), cell_edge(i, j, b)]);
            }
        }
    }

    let mut by_edge: HashMap<Edge, Vec<usize>> = HashMap::new();
    for (s, seg) in segments.iter().enumerate() {
        for &edge in seg {
            by_edge.entry(edge).or_default().push(s);
        }
    }

    let neighbour = |seg: usize, edge: Edge| -> Option<usize> {
        by_edge
            .get(&edge)
            .and_then(|list| list.iter().copied().find(|&other| other != seg))
    };
    let other_edge = |seg: usize, edge: Edge| -> Edge {
        let [a, b] = segments[seg];
        if a == edge {
            b
        } else {
            a
        }
    };

    let mut visited = vec![false; segments.len()];
    let mut pieces = Vec::new();

    for first in 0..segments.len() {
        if visited[first] {
            continue;
        }

        // Walk backwards to an open end, or around a loop
        let mut seg = first;
        let mut entry = segments[first][0];
        let mut closed = false;
        while let Some(prev) = neighbour(seg, entry) {
            if prev == first {
                closed = true;
                break;
            }
            entry = other_edge(prev, entry);
            seg = prev;
        }
        if closed {
            seg = first;
            entry = segments[first][0];
        }

        // Trace forwards from (seg, entry)
        let start = seg;
        let mut points = vec![edge_point(entry, x, y)];
        loop {
            visited[seg] = true;
            let exit = other_edge(seg, entry);
            points.push(edge_point(exit, x, y));
            match neighbour(seg, exit) {
                Some(next) if next != start && !visited[next] => {
                    seg = next;
                    entry = exit;
                }
                _ => break,
            }
        }

        pieces.push((points, closed));
    }

    pieces
}
