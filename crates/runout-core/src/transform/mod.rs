//! Path-following domain transformation.
//!
//! Stages, each a pure function returning a new value:
//!   1. orient the path downhill on the DEM
//!   2. offset it into a `DomainBoundary` of width w
//!   3. discretise the boundary into the curvilinear sampling grid
//!   4. compute cell areas and the along-path coordinate s
//!   5. build the centerline profile, project the split point and
//!      locate the runout (beta) point
pub mod area;
pub mod domain;
pub mod profile;
pub mod sampling;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::grid::Grid;
use crate::params::AnalysisParams;
use crate::raster::{Polyline, Profile, RasterGrid};
use crate::runout::find_runout_point;
use area::compute_cell_areas;
pub use domain::{path_to_domain, DomainBoundary};
use profile::{find_split_point, orient_downhill, project_on_raster};
use sampling::build_sampling_grid;

/// Everything downstream analysis needs about the sampling grid.
/// Built once per batch and shared read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformContext {
    pub boundary: DomainBoundary,
    /// Cross-path offsets (m), length `num_l`, exact 0 at `center_col()`.
    pub l_coord: Vec<f64>,
    /// Along-path distance (m), length `num_s`, `s[0] = 0`.
    pub s_coord: Vec<f64>,
    pub grid_x: Grid<f64>,
    pub grid_y: Grid<f64>,
    /// Real-world area (m²) of every grid cell.
    pub cell_area: Grid<f64>,
    /// Centre column of the grid with DEM elevations.
    pub centerline: Profile,
    pub ind_split: usize,
    pub ind_runout_point: usize,
}

impl TransformContext {
    pub fn num_s(&self) -> usize {
        self.s_coord.len()
    }

    pub fn num_l(&self) -> usize {
        self.l_coord.len()
    }

    pub fn center_col(&self) -> usize {
        self.l_coord.len() / 2
    }

    /// `s` of the runout reference point.
    pub fn s_beta(&self) -> f64 {
        self.s_coord[self.ind_runout_point]
    }
}

/// Build the transformation for one DEM, one path and one split-point set.
///
/// `cellsize` is the resolution of the simulation rasters that will be
/// resampled; it bounds the sampling step in both directions.
pub fn build_transform(
    dem: &RasterGrid,
    path: &Polyline,
    split_points: &Polyline,
    cellsize: f64,
    params: &AnalysisParams,
) -> Result<TransformContext> {
    params.validate()?;
    let w = params.domain_width;

    let path = orient_downhill(dem, path);
    let boundary = path_to_domain(&path, w)?;
    let grid = build_sampling_grid(&boundary, w, cellsize)?;
    let areas = compute_cell_areas(&grid.grid_x, &grid.grid_y);

    let (rows, cols) = grid.grid_x.shape();
    tracing::info!(
        "Path grid: {rows} cross-sections × {cols} samples (cellsize {cellsize} m, width {w} m)"
    );

    let center = cols / 2;
    let center_line = Polyline {
        x: (0..rows).map(|r| *grid.grid_x.get(r, center)).collect(),
        y: (0..rows).map(|r| *grid.grid_y.get(r, center)).collect(),
    };
    let z = project_on_raster(dem, &center_line);
    let centerline = Profile { x: center_line.x, y: center_line.y, z, s: areas.s_coord.clone() };

    let ind_split = find_split_point(&centerline, split_points)?;
    let ind_runout_point =
        find_runout_point(&centerline.s, &centerline.z, ind_split, params.runout_angle_deg)?;
    tracing::info!(
        "Split point at s = {:.1} m, runout point at s = {:.1} m",
        centerline.s[ind_split],
        centerline.s[ind_runout_point]
    );

    Ok(TransformContext {
        boundary,
        l_coord: grid.l_coord,
        s_coord: areas.s_coord,
        grid_x: grid.grid_x,
        grid_y: grid.grid_y,
        cell_area: areas.cell_area,
        centerline,
        ind_split,
        ind_runout_point,
    })
}
