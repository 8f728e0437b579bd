//! Projection of regular rasters onto the curvilinear sampling grid.
//!
//! A sample at fractional cell coordinate `(lx, ly)` is in bounds when
//! `0 ≤ lx < ncols−1` and `0 ≤ ly < nrows−1`, so the four surrounding nodes
//! always exist. Out-of-bounds samples resolve to `None` and are tallied.
//!
//! Interpolation over the cell `(x0, y0)`–`(x0+1, y0+1)`:
//! ```text
//!   v = f11·(1−dx)(1−dy) + f21·dx·(1−dy) + f12·(1−dx)·dy + f22·dx·dy
//! ```
//! `nearest` rounds `dx, dy` to 0 or 1 first (ties to even). A neighbour
//! with zero weight is never read, so a missing value only propagates when
//! it actually contributes.

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::grid::{Grid, ResampledField};
use crate::params::InterpMethod;
use crate::raster::RasterGrid;
use crate::transform::TransformContext;

/// Sample accounting for one resampled raster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpStats {
    pub total: usize,
    pub in_bounds: usize,
    pub out_of_bounds: usize,
}

/// Interpolate `raster` at world coordinate `(x, y)`.
/// Returns `Err(())` when the point is outside the raster extent.
fn sample(
    raster: &RasterGrid,
    x: f64,
    y: f64,
    method: InterpMethod,
) -> std::result::Result<Option<f64>, ()> {
    let h = &raster.header;
    let (lx, ly) = h.to_cell(x, y);
    let x_max = h.ncols as f64 - 1.0;
    let y_max = h.nrows as f64 - 1.0;
    // Negated comparisons also catch NaN coordinates.
    if !(lx >= 0.0 && lx < x_max && ly >= 0.0 && ly < y_max) {
        return Err(());
    }

    let x0 = lx.floor() as usize;
    let y0 = ly.floor() as usize;
    let (dx, dy) = match method {
        InterpMethod::Nearest => (
            (lx - x0 as f64).round_ties_even(),
            (ly - y0 as f64).round_ties_even(),
        ),
        InterpMethod::Bilinear => (lx - x0 as f64, ly - y0 as f64),
    };

    let corners = [
        (y0, x0, (1.0 - dx) * (1.0 - dy)),
        (y0, x0 + 1, dx * (1.0 - dy)),
        (y0 + 1, x0, (1.0 - dx) * dy),
        (y0 + 1, x0 + 1, dx * dy),
    ];
    let mut value = 0.0;
    for (row, col, weight) in corners {
        if weight == 0.0 {
            continue;
        }
        match raster.get(row, col) {
            Some(f) => value += f * weight,
            None => return Ok(None),
        }
    }
    Ok(Some(value))
}

/// Interpolate `raster` at every `(xs[i], ys[i])`.
pub fn resample_points(
    raster: &RasterGrid,
    xs: &[f64],
    ys: &[f64],
    method: InterpMethod,
) -> (Vec<Option<f64>>, InterpStats) {
    let mut stats = InterpStats { total: xs.len(), ..Default::default() };
    let values = xs
        .iter()
        .zip(ys)
        .map(|(&x, &y)| match sample(raster, x, y, method) {
            Ok(v) => {
                stats.in_bounds += 1;
                v
            }
            Err(()) => {
                stats.out_of_bounds += 1;
                None
            }
        })
        .collect();
    (values, stats)
}

/// Project one raster onto the sampling grid of `ctx`.
pub fn resample(
    raster: &RasterGrid,
    ctx: &TransformContext,
    method: InterpMethod,
) -> Result<(ResampledField, InterpStats)> {
    let (rows, cols) = ctx.grid_x.shape();
    let (values, stats) = resample_points(raster, &ctx.grid_x.data, &ctx.grid_y.data, method);
    let field = Grid::from_vec(rows, cols, values)
        .ok_or_else(|| AnalysisError::shape("sampling grid", "grid_x and grid_y differ in size"))?;
    Ok((field, stats))
}

/// Resample several rasters independently. Output order equals input order.
pub fn resample_batch(
    rasters: &[&RasterGrid],
    ctx: &TransformContext,
    method: InterpMethod,
) -> Result<Vec<(ResampledField, InterpStats)>> {
    tracing::debug!("Transferring data of {} raster(s) onto the path grid", rasters.len());

    #[cfg(feature = "threading")]
    let results: Vec<Result<(ResampledField, InterpStats)>> = {
        use rayon::prelude::*;
        rasters.par_iter().map(|r| resample(r, ctx, method)).collect()
    };
    #[cfg(not(feature = "threading"))]
    let results: Vec<Result<(ResampledField, InterpStats)>> =
        rasters.iter().map(|r| resample(r, ctx, method)).collect();

    let results = results.into_iter().collect::<Result<Vec<_>>>()?;
    for (i, (_, stats)) in results.iter().enumerate() {
        tracing::debug!(
            "Raster {i}: {} values transferred, {} out of raster bounds",
            stats.in_bounds,
            stats.out_of_bounds
        );
    }
    Ok(results)
}
