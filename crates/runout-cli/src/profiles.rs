//! Sink writing each simulation's peak-pressure profile for plotting.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;

use runout_core::{AnalysisSink, SimulationMetrics, TransformContext};

#[derive(Serialize)]
struct PeakPressureProfile<'a> {
    name: &'a str,
    s: &'a [f64],
    s_beta: f64,
    peak_pressure: &'a [Option<f64>],
    c_upper: usize,
    c_lower: usize,
}

/// Writes `<dir>/<name>_peak_pressure.json`. Sink callbacks cannot fail,
/// so the first error is kept and reported by [`ProfileWriter::finish`].
pub struct ProfileWriter {
    dir: PathBuf,
    error: Option<anyhow::Error>,
}

impl ProfileWriter {
    pub fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
        Ok(Self { dir, error: None })
    }

    pub fn finish(self) -> Result<()> {
        self.error.map_or(Ok(()), Err)
    }

    fn write(&self, ctx: &TransformContext, name: &str, metrics: &SimulationMetrics) -> Result<()> {
        let file = self.dir.join(format!("{name}_peak_pressure.json"));
        let profile = PeakPressureProfile {
            name,
            s: &ctx.s_coord,
            s_beta: ctx.s_beta(),
            peak_pressure: &metrics.peak_pressure_profile,
            c_upper: metrics.c_upper,
            c_lower: metrics.c_lower,
        };
        let json = serde_json::to_string_pretty(&profile)?;
        fs::write(&file, json).with_context(|| format!("writing {}", file.display()))?;
        tracing::debug!("Wrote {}", file.display());
        Ok(())
    }
}

impl AnalysisSink for ProfileWriter {
    fn on_simulation(&mut self, ctx: &TransformContext, name: &str, metrics: &SimulationMetrics) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.write(ctx, name, metrics) {
            self.error = Some(e);
        }
    }
}
