//! Runout (beta) point detection on an along-path elevation profile.
//!
//! The local slope angle at sample i is
//!   α_i = atan2(|z_i − z_{i−1}|, |s_i − s_{i−1}|)   (degrees, α_0 = 0)
//! Candidates are samples downstream of the split point with 0 ≤ α < β.
//! The runout point is the sample just before the first candidate that
//! starts a contiguous run of Δ + 1 candidates, where
//!   Δ = max(⌊30 m / step⌋, 1).
//! Short dips below β are skipped.

use crate::error::{AnalysisError, Result};
use crate::params::PERSISTENCE_DISTANCE_M;

/// Slope angle (degrees) at every sample; `None` where an elevation is missing.
pub fn angle_profile(s: &[f64], z: &[Option<f64>]) -> Vec<Option<f64>> {
    (0..s.len().min(z.len()))
        .map(|i| {
            if i == 0 {
                return Some(0.0);
            }
            let dz = (z[i]? - z[i - 1]?).abs();
            let ds = (s[i] - s[i - 1]).abs();
            Some(dz.atan2(ds).to_degrees())
        })
        .collect()
}

/// Number of further samples that must stay below β for a given sample step.
pub fn persistence_window(step: f64) -> usize {
    ((PERSISTENCE_DISTANCE_M / step).floor() as usize).max(1)
}

/// First candidate index followed by `delta` consecutive candidate indices.
///
/// `candidates` must be strictly increasing.
pub fn find_persistent_run(candidates: &[usize], delta: usize) -> Option<usize> {
    let mut i = 0;
    while i < candidates.len() {
        let start = candidates[i];
        let broken = (0..delta).find(|&j| candidates.get(i + j + 1) != Some(&(start + j + 1)));
        match broken {
            None => return Some(start),
            // Resume at the candidate that broke the run.
            Some(j) => i += j + 1,
        }
    }
    None
}

/// Locate the runout point on the profile `(s, z)` downstream of `split_index`.
pub fn find_runout_point(
    s: &[f64],
    z: &[Option<f64>],
    split_index: usize,
    beta_deg: f64,
) -> Result<usize> {
    let not_found = AnalysisError::RunoutNotFound { beta_deg, split_index };
    if s.len() < 2 || z.len() != s.len() || split_index >= s.len() {
        return Err(not_found);
    }
    let step = s[1] - s[0];
    if !(step > 0.0) {
        return Err(AnalysisError::geometry(format!("non-positive along-path step {step}")));
    }
    let delta = persistence_window(step);
    let s_split = s[split_index];

    let candidates: Vec<usize> = angle_profile(s, z)
        .iter()
        .enumerate()
        .filter(|&(i, a)| matches!(a, Some(a) if *a >= 0.0 && *a < beta_deg) && s[i] > s_split)
        .map(|(i, _)| i)
        .collect();

    let start = find_persistent_run(&candidates, delta).ok_or(not_found)?;
    let index = start
        .checked_sub(1)
        .ok_or(AnalysisError::RunoutNotFound { beta_deg, split_index })?;
    tracing::debug!("Runout point at profile index {index} (s = {:.1} m, Δ = {delta})", s[index]);
    Ok(index)
}
