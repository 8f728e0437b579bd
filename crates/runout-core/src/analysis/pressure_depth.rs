//! Runout and peak pressure/depth metrics along the path.
//!
//! For every cross-section the max (and mean) over the valid samples is taken.
//! `c_upper`/`c_lower` are the first/last rows whose max pressure exceeds
//! `p_lim`; AMPP/MMPP and AMD/MMD are reduced over rows `c_upper..=c_lower`:
//!
//! ```text
//!   AMPP = Σ maxP_r · A_r / Σ A_r     (A_r: area of the argmax cell of row r)
//!   MMPP = max_r maxP_r
//! ```
//!
//! Rows without any valid sample are left out of both sums.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use super::cross_section::cross_section_stats;
use super::{AnalysisWarning, ThresholdProfile};
use crate::error::{AnalysisError, Result};
use crate::grid::ResampledField;
use crate::transform::TransformContext;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PressureDepthMetrics {
    /// First row with cross-section max pressure above the limit.
    pub c_upper: usize,
    /// Last row with cross-section max pressure above the limit.
    pub c_lower: usize,
    /// `s[c_lower] − s_beta`
    pub runout: f64,
    /// Same as `runout`, with `c_lower` taken from the cross-section mean pressure.
    pub runout_mean: f64,
    pub ampp: Option<f64>,
    pub mmpp: Option<f64>,
    pub amd: Option<f64>,
    pub mmd: Option<f64>,
    /// DEM elevation at `(c_upper, centre)`.
    pub elev_rel: Option<f64>,
    /// Elevation drop between `c_upper` and `c_lower` on the centerline.
    pub delta_h: Option<f64>,
    /// Cross-section max pressure for every row.
    pub peak_pressure_profile: Vec<Option<f64>>,
    pub warnings: Vec<AnalysisWarning>,
}

/// First and last index whose value exceeds `limit`.
pub fn threshold_extent(profile: &[Option<f64>], limit: f64) -> Option<(usize, usize)> {
    let above = |v: &Option<f64>| matches!(v, Some(v) if *v > limit);
    let first = profile.iter().position(above)?;
    let last = profile.iter().rposition(above)?;
    Some((first, last))
}

/// Area-weighted mean over `rows`, skipping rows where the value or weight is missing.
fn weighted_mean(
    values: &[Option<f64>],
    weights: &[Option<f64>],
    rows: RangeInclusive<usize>,
) -> Option<f64> {
    let (num, den) = values[rows.clone()]
        .iter()
        .zip(&weights[rows])
        .filter_map(|(v, w)| Some((v.as_ref()?, w.as_ref()?)))
        .fold((0.0, 0.0), |(n, d), (v, w)| (n + v * w, d + w));
    (den > 0.0).then(|| num / den)
}

fn range_max(values: &[Option<f64>], rows: RangeInclusive<usize>) -> Option<f64> {
    values[rows].iter().flatten().copied().reduce(f64::max)
}

fn check_shape(what: &'static str, field: &ResampledField, ctx: &TransformContext) -> Result<()> {
    let expected = (ctx.num_s(), ctx.num_l());
    if field.shape() != expected {
        return Err(AnalysisError::shape(
            what,
            format!("field is {:?}, sampling grid is {:?}", field.shape(), expected),
        ));
    }
    Ok(())
}

/// Pressure/depth metrics of one simulation.
pub fn analyze_pressure_depth(
    ctx: &TransformContext,
    pressure: &ResampledField,
    depth: &ResampledField,
    dem: &ResampledField,
    pressure_limit: f64,
) -> Result<PressureDepthMetrics> {
    check_shape("pressure field", pressure, ctx)?;
    check_shape("depth field", depth, ctx)?;
    check_shape("dem field", dem, ctx)?;

    let p = cross_section_stats(pressure, &ctx.cell_area);
    let d = cross_section_stats(depth, &ctx.cell_area);
    let mut warnings = Vec::new();

    let (c_upper, c_lower) = threshold_extent(&p.max, pressure_limit).unwrap_or_else(|| {
        tracing::warn!(
            "No cross-section max pressure above {pressure_limit:.4} kPa, limit too high?"
        );
        warnings.push(AnalysisWarning::ThresholdNotMet {
            profile: ThresholdProfile::Max,
            limit: pressure_limit,
        });
        (0, 0)
    });
    let (_, c_lower_mean) = threshold_extent(&p.mean, pressure_limit).unwrap_or_else(|| {
        tracing::warn!(
            "No cross-section mean pressure above {pressure_limit:.4} kPa, limit too high?"
        );
        warnings.push(AnalysisWarning::ThresholdNotMet {
            profile: ThresholdProfile::Mean,
            limit: pressure_limit,
        });
        (0, 0)
    });

    let rows = c_upper..=c_lower;
    let s_beta = ctx.s_beta();
    let center = ctx.center_col();
    let elev_upper = *dem.get(c_upper, center);
    let elev_lower = *dem.get(c_lower, center);

    Ok(PressureDepthMetrics {
        c_upper,
        c_lower,
        runout: ctx.s_coord[c_lower] - s_beta,
        runout_mean: ctx.s_coord[c_lower_mean] - s_beta,
        ampp: weighted_mean(&p.max, &p.max_area, rows.clone()),
        mmpp: range_max(&p.max, rows.clone()),
        amd: weighted_mean(&d.max, &d.max_area, rows.clone()),
        mmd: range_max(&d.max, rows),
        elev_rel: elev_upper,
        delta_h: elev_upper.zip(elev_lower).map(|(u, l)| u - l),
        peak_pressure_profile: p.max,
        warnings,
    })
}
