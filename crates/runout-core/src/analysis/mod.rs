//! Hazard metrics on resampled simulation fields.
pub mod area;
pub mod cross_section;
pub mod mass;
pub mod pressure_depth;

use serde::{Deserialize, Serialize};

pub use area::{analyze_area, AreaAnalysis, ConfusionAreas};
pub use mass::{MassMetrics, MassRecord, MassSeries};
pub use pressure_depth::{analyze_pressure_depth, PressureDepthMetrics};

/// Which cross-section profile a threshold was searched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdProfile {
    Max,
    Mean,
}

/// Recoverable conditions met while analysing one simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisWarning {
    /// No cross-section exceeded the pressure limit; extent fell back to row 0.
    ThresholdNotMet { profile: ThresholdProfile, limit: f64 },
    /// Release mass differs from the reference simulation's.
    MassMismatch { reference: f64, found: f64 },
}

/// Every metric of one simulation, flattened for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationMetrics {
    pub runout: f64,
    pub runout_mean: f64,
    pub ampp: Option<f64>,
    pub mmpp: Option<f64>,
    pub amd: Option<f64>,
    pub mmd: Option<f64>,
    pub elev_rel: Option<f64>,
    pub delta_h: Option<f64>,
    pub release_mass: f64,
    pub entrained_mass: f64,
    pub growth_index: f64,
    pub growth_grad: f64,
    pub c_upper: usize,
    pub c_lower: usize,
    /// Raw confusion areas (m²) against simulation 0.
    pub areas: ConfusionAreas,
    /// `areas` divided by the reference footprint area; `None` when it is empty.
    pub area_fractions: Option<ConfusionAreas>,
    pub peak_pressure_profile: Vec<Option<f64>>,
    pub warnings: Vec<AnalysisWarning>,
}

impl SimulationMetrics {
    pub fn assemble(pd: PressureDepthMetrics, mass: MassMetrics, areas: ConfusionAreas) -> Self {
        Self {
            runout: pd.runout,
            runout_mean: pd.runout_mean,
            ampp: pd.ampp,
            mmpp: pd.mmpp,
            amd: pd.amd,
            mmd: pd.mmd,
            elev_rel: pd.elev_rel,
            delta_h: pd.delta_h,
            release_mass: mass.release_mass,
            entrained_mass: mass.entrained_mass,
            growth_index: mass.growth_index,
            growth_grad: mass.growth_grad,
            c_upper: pd.c_upper,
            c_lower: pd.c_lower,
            area_fractions: areas.fractions(),
            areas,
            peak_pressure_profile: pd.peak_pressure_profile,
            warnings: pd.warnings,
        }
    }
}
