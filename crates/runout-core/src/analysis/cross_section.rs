//! Per-row (cross-section) reductions over a resampled field.
//!
//! All reductions skip missing samples; a row with no valid sample yields `None`.

use crate::grid::{Grid, ResampledField};

pub struct CrossSectionStats {
    /// Mean over the valid samples of each row.
    pub mean: Vec<Option<f64>>,
    /// Max over the valid samples of each row.
    pub max: Vec<Option<f64>>,
    /// Cell area at the (first) argmax of each row.
    pub max_area: Vec<Option<f64>>,
}

pub fn cross_section_stats(field: &ResampledField, cell_area: &Grid<f64>) -> CrossSectionStats {
    let rows = field.rows;
    let mut stats = CrossSectionStats {
        mean: Vec::with_capacity(rows),
        max: Vec::with_capacity(rows),
        max_area: Vec::with_capacity(rows),
    };

    for r in 0..rows {
        let mut sum = 0.0;
        let mut count = 0usize;
        let mut best: Option<(usize, f64)> = None;
        for (k, v) in field.row(r).iter().enumerate() {
            let Some(v) = *v else { continue };
            sum += v;
            count += 1;
            if best.map_or(true, |(_, b)| v > b) {
                best = Some((k, v));
            }
        }
        stats.mean.push((count > 0).then(|| sum / count as f64));
        stats.max.push(best.map(|(_, v)| v));
        stats.max_area.push(best.map(|(k, _)| *cell_area.get(r, k)));
    }
    stats
}
