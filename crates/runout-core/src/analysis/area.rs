//! Spatial agreement of thresholded pressure footprints with a reference.
//!
//! Simulation 0 is the reference. Inside the runout zone (rows ≥
//! `ind_runout_point`) every cell is classified by comparing
//! `p ≥ p_lim` (missing counts as below) between reference and simulation:
//!
//! ```text
//!                 sim = 1   sim = 0
//!   ref = 1         TP        FN
//!   ref = 0         FP        TN
//! ```
//!
//! Each class accumulates cell area (m²), not cell count.

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::grid::{Grid, ResampledField};
use crate::transform::TransformContext;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfusionAreas {
    pub true_positive: f64,
    pub false_positive: f64,
    pub false_negative: f64,
    pub true_negative: f64,
}

impl ConfusionAreas {
    /// Reference footprint area, `TP + FN`.
    pub fn reference_area(&self) -> f64 {
        self.true_positive + self.false_negative
    }

    /// All four areas divided by the reference footprint area.
    /// `None` when the reference footprint is empty.
    pub fn fractions(&self) -> Option<ConfusionAreas> {
        let norm = self.reference_area();
        (norm > 0.0).then(|| ConfusionAreas {
            true_positive: self.true_positive / norm,
            false_positive: self.false_positive / norm,
            false_negative: self.false_negative / norm,
            true_negative: self.true_negative / norm,
        })
    }
}

pub struct AreaAnalysis {
    /// Thresholded reference footprint; rows above the runout zone are `false`.
    pub reference_mask: Grid<bool>,
    /// One entry per simulation, in input order.
    pub areas: Vec<ConfusionAreas>,
}

/// Binary footprint of `field` inside the runout zone.
pub fn threshold_mask(
    field: &ResampledField,
    start_row: usize,
    pressure_limit: f64,
) -> Grid<bool> {
    let mut mask = field.map(|v| matches!(v, Some(p) if *p >= pressure_limit));
    for r in 0..start_row.min(mask.rows) {
        for k in 0..mask.cols {
            mask.set(r, k, false);
        }
    }
    mask
}

/// Classify `field` against `reference` cell by cell, summing cell areas.
pub fn classify(
    reference: &Grid<bool>,
    field: &ResampledField,
    cell_area: &Grid<f64>,
    start_row: usize,
    pressure_limit: f64,
) -> ConfusionAreas {
    let sim = threshold_mask(field, start_row, pressure_limit);
    let mut out = ConfusionAreas::default();
    for r in start_row..reference.rows {
        for k in 0..reference.cols {
            let a = *cell_area.get(r, k);
            match (*reference.get(r, k), *sim.get(r, k)) {
                (true, true) => out.true_positive += a,
                (true, false) => out.false_negative += a,
                (false, true) => out.false_positive += a,
                (false, false) => out.true_negative += a,
            }
        }
    }
    out
}

/// Confusion areas of every pressure field against the first one.
pub fn analyze_area(
    ctx: &TransformContext,
    pressures: &[&ResampledField],
    pressure_limit: f64,
) -> Result<AreaAnalysis> {
    let expected = (ctx.num_s(), ctx.num_l());
    let Some(reference) = pressures.first() else {
        return Err(AnalysisError::shape(
            "pressure fields",
            "no simulation to use as reference",
        ));
    };
    if let Some(i) = pressures.iter().position(|f| f.shape() != expected) {
        return Err(AnalysisError::shape(
            "pressure fields",
            format!(
                "simulation {i} is {:?}, sampling grid is {:?}",
                pressures[i].shape(),
                expected
            ),
        ));
    }

    let start = ctx.ind_runout_point;
    // The reference mask must be complete before any simulation is classified.
    let reference_mask = threshold_mask(reference, start, pressure_limit);

    let classify_one = |field: &&ResampledField| {
        classify(&reference_mask, field, &ctx.cell_area, start, pressure_limit)
    };
    #[cfg(feature = "threading")]
    let areas: Vec<ConfusionAreas> = {
        use rayon::prelude::*;
        pressures.par_iter().map(classify_one).collect()
    };
    #[cfg(not(feature = "threading"))]
    let areas: Vec<ConfusionAreas> = pressures.iter().map(classify_one).collect();

    tracing::info!("{:<15} {:<15} {:<15} {:<15} {:<15}", "Sim number", "TP", "FN", "FP", "TN");
    for (i, a) in areas.iter().enumerate() {
        match a.fractions() {
            Some(f) => tracing::info!(
                "{:<15} {:<15.4} {:<15.4} {:<15.4} {:<15.4}",
                i + 1,
                f.true_positive,
                f.false_negative,
                f.false_positive,
                f.true_negative
            ),
            None => tracing::warn!(
                "Simulation {}: reference footprint is empty, fractions undefined",
                i + 1
            ),
        }
    }

    Ok(AreaAnalysis { reference_mask, areas })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{Polyline, Profile};
    use crate::transform::DomainBoundary;
    use approx::assert_relative_eq;

    fn context(rows: usize, cols: usize, runout_row: usize, area: f64) -> TransformContext {
        let s: Vec<f64> = (0..rows).map(|r| r as f64 * 5.0).collect();
        TransformContext {
            boundary: DomainBoundary { left: Polyline::default(), right: Polyline::default() },
            l_coord: (0..cols).map(|k| k as f64 - (cols / 2) as f64).collect(),
            s_coord: s.clone(),
            grid_x: Grid::filled(rows, cols, 0.0),
            grid_y: Grid::filled(rows, cols, 0.0),
            cell_area: Grid::filled(rows, cols, area),
            centerline: Profile { x: vec![0.0; rows], y: vec![0.0; rows], z: vec![None; rows], s },
            ind_split: 0,
            ind_runout_point: runout_row,
        }
    }

    /// Footprint covering rows `0..len` and columns `1..=3` of a 10 × 5 grid.
    fn footprint(len: usize) -> ResampledField {
        let data = (0..10)
            .flat_map(|r| {
                (0..5).map(move |k| Some(if r < len && (1..=3).contains(&k) { 4.0 } else { 0.0 }))
            })
            .collect();
        Grid::from_vec(10, 5, data).unwrap()
    }

    #[test]
    fn identical_simulation_has_no_false_cells() {
        let ctx = context(10, 5, 2, 25.0);
        let reference = footprint(8);
        let result = analyze_area(&ctx, &[&reference, &reference.clone()], 1.0).unwrap();
        for a in &result.areas {
            assert_eq!(a.false_positive, 0.0);
            assert_eq!(a.false_negative, 0.0);
            // Rows 2..8, three columns, 25 m² each.
            assert_relative_eq!(a.true_positive, 6.0 * 3.0 * 25.0, epsilon = 1e-9);
            // Rows 2..10 hold 40 cells in total.
            assert_relative_eq!(a.true_negative, (40.0 - 18.0) * 25.0, epsilon = 1e-9);
        }
        let masked: usize = result.reference_mask.data.iter().filter(|&&m| m).count();
        assert_eq!(masked, 18);
    }

    #[test]
    fn longer_and_shorter_runs_split_into_fp_and_fn() {
        let ctx = context(10, 5, 2, 1.0);
        let reference = footprint(6);
        let longer = footprint(9);
        let shorter = footprint(4);
        let result = analyze_area(&ctx, &[&reference, &longer, &shorter], 1.0).unwrap();

        let l = result.areas[1];
        assert_eq!((l.true_positive, l.false_positive, l.false_negative), (12.0, 9.0, 0.0));
        let s = result.areas[2];
        assert_eq!((s.true_positive, s.false_positive, s.false_negative), (6.0, 0.0, 6.0));

        let f = s.fractions().unwrap();
        assert_relative_eq!(f.true_positive, 0.5, epsilon = 1e-12);
        assert_relative_eq!(f.false_negative, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn missing_samples_count_as_below_limit() {
        let ctx = context(10, 5, 0, 1.0);
        let reference = footprint(10);
        let holed = reference.map(|v| v.filter(|p| *p < 1.0));
        let a = analyze_area(&ctx, &[&reference, &holed], 1.0).unwrap().areas[1];
        assert_eq!(a.true_positive, 0.0);
        assert_eq!(a.false_negative, 30.0);
    }

    #[test]
    fn empty_reference_has_no_fractions() {
        let ctx = context(10, 5, 0, 1.0);
        let quiet = footprint(0);
        let result = analyze_area(&ctx, &[&quiet], 1.0).unwrap();
        assert!(result.areas[0].fractions().is_none());
        assert_eq!(result.areas[0].true_negative, 50.0);
    }

    #[test]
    fn mismatched_grid_is_rejected() {
        let ctx = context(10, 5, 0, 1.0);
        let reference = footprint(5);
        let other = Grid::filled(9, 5, Some(0.0));
        assert!(analyze_area(&ctx, &[&reference, &other], 1.0).is_err());
        assert!(analyze_area(&ctx, &[], 1.0).is_err());
    }

    #[cfg(feature = "threading")]
    #[test]
    fn parallel_classification_matches_sequential_order() {
        let ctx = context(10, 5, 1, 2.0);
        let fields: Vec<ResampledField> = (0..=10).rev().map(footprint).collect();
        let refs: Vec<&ResampledField> = fields.iter().collect();
        let result = analyze_area(&ctx, &refs, 1.0).unwrap();

        let mask = threshold_mask(&fields[0], 1, 1.0);
        assert_eq!(result.reference_mask, mask);
        for (i, field) in fields.iter().enumerate() {
            let expected = classify(&mask, field, &ctx.cell_area, 1, 1.0);
            assert_eq!(result.areas[i], expected, "simulation {i}");
        }
    }
}
