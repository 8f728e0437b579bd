//! Curvilinear sampling grid between the two domain edges.
//!
//! Along the path, boundary segment i is split into
//!   m_i = max(⌈|ΔL_i| / c⌉, ⌈|ΔR_i| / c⌉) + 1
//! points on both edges, so consecutive cross-sections are never more than
//! one source cell apart on either edge. Shared segment endpoints are kept
//! once, giving Σ(m_i − 1) + 1 rows.
//!
//! Across the path every row holds `n_total` points evenly spaced from the
//! left to the right edge, `n_total` being ⌈w / c⌉ bumped to the next odd
//! number so that column ⌊n_total / 2⌋ lies exactly on the path.

use crate::error::{AnalysisError, Result};
use crate::grid::Grid;

use super::domain::DomainBoundary;

pub struct SamplingGrid {
    /// Cross-path offsets (m), symmetric, exact 0 at the centre index.
    pub l_coord: Vec<f64>,
    pub grid_x: Grid<f64>,
    pub grid_y: Grid<f64>,
}

/// Number of cross-path samples for width `width` and cellsize `cellsize`. Always odd.
pub fn cross_path_count(width: f64, cellsize: f64) -> usize {
    let n = ((width / cellsize).ceil() as usize).max(1);
    if n % 2 == 0 { n + 1 } else { n }
}

/// `n` evenly spaced cross-path offsets in cellsize steps, centred on 0.
pub fn cross_path_offsets(n_total: usize, cellsize: f64) -> Vec<f64> {
    let half = (n_total / 2) as f64;
    (0..n_total).map(|k| (k as f64 - half) * cellsize).collect()
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Point `j` of `m` evenly spaced points from `a` to `b` (both ends included).
#[inline]
fn linspace_at(a: f64, b: f64, j: usize, m: usize) -> f64 {
    if m < 2 || j == 0 {
        a
    } else if j == m - 1 {
        b
    } else {
        lerp(a, b, j as f64 / (m - 1) as f64)
    }
}

fn segment_points(db: &DomainBoundary, i: usize, cellsize: f64) -> usize {
    let zl = (db.left.x[i + 1] - db.left.x[i]).hypot(db.left.y[i + 1] - db.left.y[i]) / cellsize;
    let zr =
        (db.right.x[i + 1] - db.right.x[i]).hypot(db.right.y[i + 1] - db.right.y[i]) / cellsize;
    zl.ceil().max(zr.ceil()) as usize + 1
}

/// Discretise `db` into a `(rows, n_total)` grid of world coordinates.
pub fn build_sampling_grid(db: &DomainBoundary, width: f64, cellsize: f64) -> Result<SamplingGrid> {
    if !(cellsize > 0.0) {
        return Err(AnalysisError::InvalidParameter { name: "cellsize", value: cellsize });
    }
    if db.len() < 2 || db.right.len() != db.len() {
        return Err(AnalysisError::shape(
            "domain boundary",
            format!("left has {} vertices, right has {}", db.left.len(), db.right.len()),
        ));
    }

    let n_total = cross_path_count(width, cellsize);
    let seg_points: Vec<usize> =
        (0..db.len() - 1).map(|i| segment_points(db, i, cellsize)).collect();
    let rows = seg_points.iter().map(|m| m - 1).sum::<usize>() + 1;

    let mut grid_x = Grid::filled(rows, n_total, 0.0);
    let mut grid_y = Grid::filled(rows, n_total, 0.0);
    let mut fill_row = |row: usize, (xl, yl): (f64, f64), (xr, yr): (f64, f64)| {
        for k in 0..n_total {
            grid_x.set(row, k, linspace_at(xl, xr, k, n_total));
            grid_y.set(row, k, linspace_at(yl, yr, k, n_total));
        }
    };

    let mut row = 0;
    for (i, &m) in seg_points.iter().enumerate() {
        for j in 0..m - 1 {
            let l = (
                linspace_at(db.left.x[i], db.left.x[i + 1], j, m),
                linspace_at(db.left.y[i], db.left.y[i + 1], j, m),
            );
            let r = (
                linspace_at(db.right.x[i], db.right.x[i + 1], j, m),
                linspace_at(db.right.y[i], db.right.y[i + 1], j, m),
            );
            fill_row(row, l, r);
            row += 1;
        }
    }
    let last = db.len() - 1;
    fill_row(row, (db.left.x[last], db.left.y[last]), (db.right.x[last], db.right.y[last]));

    tracing::debug!("Sampling grid: {rows} cross-sections × {n_total} samples");
    Ok(SamplingGrid { l_coord: cross_path_offsets(n_total, cellsize), grid_x, grid_y })
}
