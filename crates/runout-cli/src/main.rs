//! `runout`: path-based runout analysis of mass-flow simulation results.

mod input;
mod profiles;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use runout_core::{run_batch, AnalysisSink, InterpMethod, SimulationOutcome};

#[derive(Parser, Debug)]
#[command(name = "runout", version, about = "Runout and hazard metrics along a flow path")]
struct Args {
    /// Input bundle (JSON) naming the DEM, path, split points and simulations.
    input: PathBuf,

    /// Write the batch report here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Override the domain width (m).
    #[arg(long)]
    domain_width: Option<f64>,

    /// Override the pressure limit (kPa).
    #[arg(long)]
    pressure_limit: Option<f64>,

    /// Override the interpolation method.
    #[arg(long, value_parser = parse_interp)]
    interp: Option<InterpMethod>,

    /// Directory for per-simulation peak-pressure profiles.
    #[arg(long)]
    profiles: Option<PathBuf>,
}

fn parse_interp(s: &str) -> Result<InterpMethod, String> {
    match s.to_ascii_lowercase().as_str() {
        "nearest" => Ok(InterpMethod::Nearest),
        "bilinear" => Ok(InterpMethod::Bilinear),
        other => Err(format!("unknown interpolation method {other:?} (nearest|bilinear)")),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).with_target(false).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut inputs = input::load_bundle(&args.input)?;
    if let Some(w) = args.domain_width {
        inputs.params.domain_width = w;
    }
    if let Some(p) = args.pressure_limit {
        inputs.params.pressure_limit = p;
    }
    if let Some(m) = args.interp {
        inputs.params.interp_method = m;
    }

    let mut writer = args.profiles.map(profiles::ProfileWriter::new).transpose()?;
    let report = run_batch(
        &inputs.dem,
        &inputs.path,
        &inputs.split_points,
        &inputs.simulations,
        &inputs.params,
        writer.as_mut().map(|w| w as &mut dyn AnalysisSink),
    )
    .context("runout analysis failed")?;
    if let Some(w) = writer {
        w.finish()?;
    }

    let failed = report
        .simulations
        .iter()
        .filter(|s| matches!(s.outcome, SimulationOutcome::Failed { .. }))
        .count();
    if failed > 0 {
        tracing::warn!("{failed} of {} simulation(s) failed", report.simulations.len());
    }

    let json = serde_json::to_string_pretty(&report)?;
    match args.output {
        Some(path) => {
            fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?
        }
        None => println!("{json}"),
    }
    Ok(())
}
