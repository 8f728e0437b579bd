//! Mass balance time series of one simulation.
//!
//! # File Format
//!
//! ```text
//! time,totalMass,entrainedMass
//! 0.0,10000.0,0.0
//! 0.1,10012.5,12.5
//! ```
//!
//! The first row is a header and is skipped; blank lines are ignored.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MassRecord {
    pub time: f64,
    pub total_mass: f64,
    pub entrained_mass: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MassSeries {
    records: Vec<MassRecord>,
}

/// Release/entrainment summary of a mass series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MassMetrics {
    /// Total mass at the first time step.
    pub release_mass: f64,
    /// Entrained mass at the last time step.
    pub entrained_mass: f64,
    /// total[last] / total[0]
    pub growth_index: f64,
    /// (total[last] − total[0]) / (t[last] − t[0])
    pub growth_grad: f64,
}

fn mass_err(message: impl Into<String>) -> AnalysisError {
    AnalysisError::MassSeries { message: message.into() }
}

impl MassSeries {
    pub fn new(records: Vec<MassRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[MassRecord] {
        &self.records
    }

    /// Parse comma-separated `time,totalMass,entrainedMass` rows after one header row.
    pub fn from_csv_str(text: &str) -> Result<Self> {
        let mut records = Vec::new();
        for (idx, line) in text.lines().enumerate().skip(1) {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            if fields.len() < 3 {
                return Err(mass_err(format!(
                    "line {}: expected 3 columns, found {}",
                    idx + 1,
                    fields.len()
                )));
            }
            let parse = |col: usize| -> Result<f64> {
                fields[col]
                    .parse::<f64>()
                    .map_err(|e| mass_err(format!("line {}, column {}: {e}", idx + 1, col + 1)))
            };
            records.push(MassRecord {
                time: parse(0)?,
                total_mass: parse(1)?,
                entrained_mass: parse(2)?,
            });
        }
        Ok(Self { records })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_csv_str(&fs::read_to_string(path)?)
    }

    /// Release mass, final entrained mass and growth of the total mass.
    pub fn metrics(&self) -> Result<MassMetrics> {
        let (first, last) = match (self.records.first(), self.records.last()) {
            (Some(f), Some(l)) if self.records.len() >= 2 => (f, l),
            _ => {
                let n = self.records.len();
                return Err(mass_err(format!("{n} record(s), at least 2 required")));
            }
        };
        let span = last.time - first.time;
        if !(span > 0.0) {
            return Err(mass_err(format!("time span {span} is not positive")));
        }
        if !(first.total_mass > 0.0) {
            return Err(mass_err(format!("release mass {} is not positive", first.total_mass)));
        }
        Ok(MassMetrics {
            release_mass: first.total_mass,
            entrained_mass: last.entrained_mass,
            growth_index: last.total_mass / first.total_mass,
            growth_grad: (last.total_mass - first.total_mass) / span,
        })
    }
}
