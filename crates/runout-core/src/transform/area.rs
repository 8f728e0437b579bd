//! Cell areas and the along-path coordinate of the sampling grid.
//!
//! The grid is extended by one ghost column and one ghost row so that a
//! forward difference exists at every node. The ghost repeats the
//! second-to-last column/row, which mirrors the last edge instead of
//! collapsing it to zero length.
//!
//! ```text
//!   (dxl, dyl) = P[r][k+1] − P[r][k]      cross-path edge
//!   (dxs, dys) = P[r+1][k] − P[r][k]      along-path edge
//!   area       = |dxl·dys − dxs·dyl|
//! ```

use crate::grid::Grid;

pub struct CellAreas {
    pub cell_area: Grid<f64>,
    /// Along-path distance at the centre column, `s[0] = 0`.
    pub s_coord: Vec<f64>,
}

#[inline]
fn ghost(i: usize, n: usize) -> usize {
    if i + 1 < n { i + 1 } else { n.saturating_sub(2) }
}

pub fn compute_cell_areas(grid_x: &Grid<f64>, grid_y: &Grid<f64>) -> CellAreas {
    let (rows, cols) = grid_x.shape();
    let center = cols / 2;
    let mut cell_area = Grid::filled(rows, cols, 0.0);
    let mut ds = vec![0.0; rows];

    for r in 0..rows {
        let rn = ghost(r, rows);
        for k in 0..cols {
            let kn = ghost(k, cols);
            let (x, y) = (*grid_x.get(r, k), *grid_y.get(r, k));
            let dxl = grid_x.get(r, kn) - x;
            let dyl = grid_y.get(r, kn) - y;
            let dxs = grid_x.get(rn, k) - x;
            let dys = grid_y.get(rn, k) - y;
            cell_area.set(r, k, (dxl * dys - dxs * dyl).abs());
            if k == center {
                ds[r] = dxs.hypot(dys);
            }
        }
    }

    // Cumulative along-path edge length, shifted so the first entry is zero.
    let first = ds.first().copied().unwrap_or(0.0);
    let mut acc = 0.0;
    let s_coord = ds
        .iter()
        .map(|d| {
            acc += d;
            acc - first
        })
        .collect();

    CellAreas { cell_area, s_coord }
}
