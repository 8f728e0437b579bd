//! Input bundle and raster file decoding.
//!
//! A bundle is a JSON document listing the DEM, the path, the split
//! points and the simulation files. Relative file paths resolve against
//! the bundle's directory.
//!
//! ```json
//! {
//!   "dem": "dem.asc",
//!   "path": { "x": [100.0, 600.0], "y": [200.0, 200.0] },
//!   "split_points": { "x": [200.0], "y": [200.0] },
//!   "simulations": [
//!     {
//!       "name": "ref",
//!       "pressure": "ref_ppr.asc",
//!       "depth": "ref_pfd.asc",
//!       "mass": "ref_mass.csv"
//!     }
//!   ],
//!   "params": { "domain_width": 600.0 }
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use runout_core::{
    AnalysisParams, MassSeries, Polyline, RasterGrid, RasterHeader, SimulationInput,
};

#[derive(Debug, Deserialize)]
pub struct Bundle {
    pub dem: PathBuf,
    pub path: Polyline,
    pub split_points: Polyline,
    pub simulations: Vec<SimulationFiles>,
    #[serde(default)]
    pub params: AnalysisParams,
}

#[derive(Debug, Deserialize)]
pub struct SimulationFiles {
    pub name: String,
    pub pressure: PathBuf,
    pub depth: PathBuf,
    pub mass: PathBuf,
}

/// Fully decoded bundle, ready for `run_batch`.
pub struct Inputs {
    pub dem: RasterGrid,
    pub path: Polyline,
    pub split_points: Polyline,
    pub simulations: Vec<SimulationInput>,
    pub params: AnalysisParams,
}

pub fn load_bundle(path: &Path) -> Result<Inputs> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading bundle {}", path.display()))?;
    let bundle: Bundle = serde_json::from_str(&text)
        .with_context(|| format!("parsing bundle {}", path.display()))?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let resolve = |p: &Path| if p.is_absolute() { p.to_path_buf() } else { base.join(p) };

    // Re-validate the polylines: serde fills the fields without checking lengths.
    let polyline = |p: Polyline, what: &str| {
        Polyline::new(p.x, p.y).with_context(|| format!("bundle {what}"))
    };
    let flow_path = polyline(bundle.path, "path")?;
    let split_points = polyline(bundle.split_points, "split_points")?;

    let dem = read_ascii_grid(&resolve(&bundle.dem))?;
    let simulations = bundle
        .simulations
        .into_iter()
        .map(|sim| -> Result<SimulationInput> {
            let mass_path = resolve(&sim.mass);
            Ok(SimulationInput {
                pressure: read_ascii_grid(&resolve(&sim.pressure))?,
                depth: read_ascii_grid(&resolve(&sim.depth))?,
                mass: MassSeries::from_path(&mass_path)
                    .with_context(|| format!("reading mass series {}", mass_path.display()))?,
                name: sim.name,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Inputs { dem, path: flow_path, split_points, simulations, params: bundle.params })
}

pub fn read_ascii_grid(path: &Path) -> Result<RasterGrid> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading raster {}", path.display()))?;
    parse_ascii_grid(&text).with_context(|| format!("parsing raster {}", path.display()))
}

/// Parse an ESRI ASCII grid. The file lists the northern row first; the
/// returned grid has row 0 at `yllcorner`.
///
/// `xllcenter`/`yllcenter` headers are shifted by half a cell to the
/// corner form, so both header styles place the same grid at the same
/// world coordinates.
pub fn parse_ascii_grid(text: &str) -> Result<RasterGrid> {
    let mut ncols = None;
    let mut nrows = None;
    // (value, given as cell centre)
    let mut xll: Option<(f64, bool)> = None;
    let mut yll: Option<(f64, bool)> = None;
    let mut cellsize = None;
    let mut nodata = -9999.0;

    let mut lines = text.lines().filter(|l| !l.trim().is_empty()).peekable();
    while let Some(&line) = lines.peek() {
        let mut parts = line.split_whitespace();
        let (Some(key), Some(value)) = (parts.next(), parts.next()) else { break };
        if !key.starts_with(|c: char| c.is_ascii_alphabetic()) {
            break;
        }
        let number = |v: &str| v.parse::<f64>().with_context(|| format!("header {key}: {v:?}"));
        let count = |v: &str| v.parse::<usize>().with_context(|| format!("{v:?}"));
        match key.to_ascii_lowercase().as_str() {
            "ncols" => ncols = Some(count(value).context("ncols")?),
            "nrows" => nrows = Some(count(value).context("nrows")?),
            "xllcorner" => xll = Some((number(value)?, false)),
            "xllcenter" => xll = Some((number(value)?, true)),
            "yllcorner" => yll = Some((number(value)?, false)),
            "yllcenter" => yll = Some((number(value)?, true)),
            "cellsize" => cellsize = Some(number(value)?),
            "nodata_value" => nodata = number(value)?,
            other => bail!("unknown header field {other:?}"),
        }
        lines.next();
    }

    let (Some(ncols), Some(nrows), Some(xll), Some(yll), Some(cellsize)) =
        (ncols, nrows, xll, yll, cellsize)
    else {
        bail!("incomplete header, need ncols, nrows, xllcorner, yllcorner and cellsize");
    };
    let to_corner = |(v, centre): (f64, bool)| if centre { v - cellsize / 2.0 } else { v };
    let (xllcorner, yllcorner) = (to_corner(xll), to_corner(yll));

    let values: Vec<f64> = lines
        .flat_map(str::split_whitespace)
        .map(|t| t.parse::<f64>().with_context(|| format!("raster value {t:?}")))
        .collect::<Result<_>>()?;
    if values.len() != ncols * nrows {
        bail!("expected {} values, found {}", ncols * nrows, values.len());
    }
    let south_first: Vec<f64> = values.chunks(ncols.max(1)).rev().flatten().copied().collect();

    let header =
        RasterHeader { ncols, nrows, xllcorner, yllcorner, cellsize, nodata_value: nodata };
    Ok(RasterGrid::from_values(header, south_first)?)
}
