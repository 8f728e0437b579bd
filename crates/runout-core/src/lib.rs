//! Post-processing of gravitational mass-flow simulations along a path.
//!
//! Simulation rasters are transferred onto a curvilinear `(s, l)` grid that
//! follows a user path; runout, peak pressure/depth, mass growth and
//! footprint agreement are then measured on that grid.
pub mod analysis;
pub mod error;
pub mod grid;
pub mod params;
pub mod pipeline;
pub mod raster;
pub mod resample;
pub mod runout;
pub mod transform;

pub use analysis::{AnalysisWarning, ConfusionAreas, MassSeries, SimulationMetrics};
pub use error::{AnalysisError, Result};
pub use grid::{Grid, ResampledField};
pub use params::{AnalysisParams, InterpMethod};
pub use pipeline::{
    run_batch, AnalysisSink, BatchReport, SimulationInput, SimulationOutcome, SimulationResult,
};
pub use raster::{Polyline, Profile, RasterGrid, RasterHeader};
pub use transform::{build_transform, TransformContext};
