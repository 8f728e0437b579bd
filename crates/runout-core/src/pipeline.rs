//! Batch orchestration: one DEM, one path, many simulations.
//!
//! ```text
//!   build_transform ─► resample DEM ─┬─► per simulation: resample p/h,
//!                                    │     pressure/depth + mass metrics
//!                                    └─► area classification vs simulation 0
//! ```
//!
//! Simulation 0 is the reference for the area classification and the
//! release-mass check, so a failure there aborts the batch. Any other
//! simulation that fails is reported as failed and the rest complete.

use serde::{Deserialize, Serialize};

use crate::analysis::{
    analyze_area, analyze_pressure_depth, AnalysisWarning, AreaAnalysis, MassMetrics, MassSeries,
    PressureDepthMetrics, SimulationMetrics,
};
use crate::error::{AnalysisError, Result};
use crate::grid::ResampledField;
use crate::params::AnalysisParams;
use crate::raster::{Polyline, RasterGrid, RasterHeader};
use crate::resample::{resample, resample_batch, InterpStats};
use crate::transform::{build_transform, TransformContext};

/// Decoded inputs of one simulation.
#[derive(Debug, Clone)]
pub struct SimulationInput {
    pub name: String,
    /// Peak pressure raster (kPa).
    pub pressure: RasterGrid,
    /// Peak flow depth raster (m).
    pub depth: RasterGrid,
    pub mass: MassSeries,
}

/// Optional observer of intermediate results, e.g. for plotting.
/// Every method defaults to doing nothing.
pub trait AnalysisSink {
    fn on_transform(&mut self, _ctx: &TransformContext, _dem: &ResampledField) {}
    fn on_simulation(
        &mut self,
        _ctx: &TransformContext,
        _name: &str,
        _metrics: &SimulationMetrics,
    ) {
    }
    fn on_area(&mut self, _ctx: &TransformContext, _area: &AreaAnalysis) {}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SimulationOutcome {
    Completed { metrics: SimulationMetrics },
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    pub name: String,
    pub pressure_stats: Option<InterpStats>,
    pub depth_stats: Option<InterpStats>,
    pub outcome: SimulationOutcome,
}

impl SimulationResult {
    pub fn metrics(&self) -> Option<&SimulationMetrics> {
        match &self.outcome {
            SimulationOutcome::Completed { metrics } => Some(metrics),
            SimulationOutcome::Failed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub params: AnalysisParams,
    pub context: TransformContext,
    pub dem_stats: InterpStats,
    /// Same order as the simulation inputs.
    pub simulations: Vec<SimulationResult>,
}

/// Everything computed for one simulation before the area classification.
struct SimulationStage {
    pressure: ResampledField,
    pressure_stats: InterpStats,
    depth_stats: InterpStats,
    pressure_depth: PressureDepthMetrics,
    mass: MassMetrics,
}

fn check_header(
    name: &str,
    what: &str,
    header: &RasterHeader,
    reference: &RasterHeader,
) -> Result<()> {
    if !header.same_geometry(reference) {
        return Err(AnalysisError::shape(
            "simulation rasters",
            format!(
                "{name}: {what} raster geometry {header:?} differs from the reference {reference:?}"
            ),
        ));
    }
    Ok(())
}

fn analyze_simulation(
    sim: &SimulationInput,
    reference: &RasterHeader,
    ctx: &TransformContext,
    dem: &ResampledField,
    params: &AnalysisParams,
) -> Result<SimulationStage> {
    check_header(&sim.name, "pressure", &sim.pressure.header, reference)?;
    check_header(&sim.name, "depth", &sim.depth.header, reference)?;

    let mut fields = resample_batch(&[&sim.pressure, &sim.depth], ctx, params.interp_method)?;
    let (Some((depth, depth_stats)), Some((pressure, pressure_stats))) =
        (fields.pop(), fields.pop())
    else {
        return Err(AnalysisError::shape(
            "simulation rasters",
            "expected pressure and depth fields",
        ));
    };
    tracing::debug!(
        "{}: {} pressure and {} depth samples out of raster bounds",
        sim.name,
        pressure_stats.out_of_bounds,
        depth_stats.out_of_bounds
    );

    let pressure_depth =
        analyze_pressure_depth(ctx, &pressure, &depth, dem, params.pressure_limit)?;
    let mass = sim.mass.metrics()?;
    Ok(SimulationStage { pressure, pressure_stats, depth_stats, pressure_depth, mass })
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map_or_else(|| "-".to_string(), |v| format!("{v:.4}"))
}

/// Run the complete analysis over `simulations`.
///
/// The sampling resolution is taken from the pressure raster of the first
/// simulation; every other simulation raster must share its header.
pub fn run_batch(
    dem: &RasterGrid,
    path: &Polyline,
    split_points: &Polyline,
    simulations: &[SimulationInput],
    params: &AnalysisParams,
    mut sink: Option<&mut dyn AnalysisSink>,
) -> Result<BatchReport> {
    let Some(first) = simulations.first() else {
        return Err(AnalysisError::shape("simulations", "at least one simulation is required"));
    };
    let reference_header = first.pressure.header;

    let ctx = build_transform(dem, path, split_points, reference_header.cellsize, params)?;
    let (dem_field, dem_stats) = resample(dem, &ctx, params.interp_method)?;
    if let Some(s) = sink.as_deref_mut() {
        s.on_transform(&ctx, &dem_field);
    }

    tracing::info!("Analyzing {} simulation(s)", simulations.len());
    let run = |sim: &SimulationInput| {
        analyze_simulation(sim, &reference_header, &ctx, &dem_field, params)
    };
    let reference = run(first)
        .inspect_err(|e| tracing::error!("Reference simulation {} failed: {e}", first.name))?;
    let reference_release = reference.mass.release_mass;

    #[cfg(feature = "threading")]
    let rest: Vec<Result<SimulationStage>> = {
        use rayon::prelude::*;
        simulations[1..].par_iter().map(run).collect()
    };
    #[cfg(not(feature = "threading"))]
    let rest: Vec<Result<SimulationStage>> = simulations[1..].iter().map(run).collect();
    let stages: Vec<Result<SimulationStage>> =
        std::iter::once(Ok(reference)).chain(rest).collect();

    // Area classification over every simulation that got this far.
    let fields: Vec<&ResampledField> =
        stages.iter().filter_map(|s| s.as_ref().ok()).map(|s| &s.pressure).collect();
    let area = analyze_area(&ctx, &fields, params.pressure_limit)?;
    let mut area_iter = area.areas.iter().copied();

    tracing::info!(
        "{:<15} {:<15} {:<15} {:<15} {:<15} {:<15}",
        "Sim number",
        "Runout",
        "AMPP",
        "MMPP",
        "AMD",
        "MMD"
    );
    let mut results = Vec::with_capacity(simulations.len());
    for (i, (sim, stage)) in simulations.iter().zip(stages).enumerate() {
        let stage = match stage {
            Ok(stage) => stage,
            Err(e) => {
                tracing::warn!("Simulation {} failed: {e}", sim.name);
                results.push(SimulationResult {
                    name: sim.name.clone(),
                    pressure_stats: None,
                    depth_stats: None,
                    outcome: SimulationOutcome::Failed { error: e.to_string() },
                });
                continue;
            }
        };

        let areas = area_iter.next().unwrap_or_default();
        let mut metrics = SimulationMetrics::assemble(stage.pressure_depth, stage.mass, areas);
        if metrics.release_mass != reference_release {
            tracing::warn!(
                "Release mass of {} is {} but {} in the reference simulation",
                sim.name,
                metrics.release_mass,
                reference_release
            );
            let found = metrics.release_mass;
            metrics
                .warnings
                .push(AnalysisWarning::MassMismatch { reference: reference_release, found });
        }

        tracing::info!(
            "{:<15} {:<15.4} {:<15} {:<15} {:<15} {:<15}",
            i + 1,
            metrics.runout,
            fmt_opt(metrics.ampp),
            fmt_opt(metrics.mmpp),
            fmt_opt(metrics.amd),
            fmt_opt(metrics.mmd)
        );
        if let Some(s) = sink.as_deref_mut() {
            s.on_simulation(&ctx, &sim.name, &metrics);
        }
        results.push(SimulationResult {
            name: sim.name.clone(),
            pressure_stats: Some(stage.pressure_stats),
            depth_stats: Some(stage.depth_stats),
            outcome: SimulationOutcome::Completed { metrics },
        });
    }

    if let Some(s) = sink.as_deref_mut() {
        s.on_area(&ctx, &area);
    }

    Ok(BatchReport { params: params.clone(), context: ctx, dem_stats, simulations: results })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ConfusionAreas;
    use approx::assert_relative_eq;

    fn header() -> RasterHeader {
        RasterHeader {
            ncols: 141,
            nrows: 81,
            xllcorner: 0.0,
            yllcorner: 0.0,
            cellsize: 5.0,
            nodata_value: -9999.0,
        }
    }

    fn mass(release: f64) -> MassSeries {
        let csv = format!("time,total,entrained\n0,{release},0\n10,{release},0\n");
        MassSeries::from_csv_str(&csv).unwrap()
    }

    fn simulation(name: &str, pressure: f64) -> SimulationInput {
        SimulationInput {
            name: name.to_string(),
            pressure: RasterGrid::constant(header(), pressure),
            depth: RasterGrid::constant(header(), 2.0),
            mass: mass(1000.0),
        }
    }

    /// Flat DEM at 1000 m, 500 m straight path, 20 m wide domain.
    fn setup() -> (RasterGrid, Polyline, Polyline, AnalysisParams) {
        let dem = RasterGrid::constant(header(), 1000.0);
        let path = Polyline::new(vec![100.0, 600.0], vec![200.0, 200.0]).unwrap();
        let split = Polyline::new(vec![200.0], vec![200.0]).unwrap();
        let params =
            AnalysisParams { domain_width: 20.0, pressure_limit: 1.0, ..Default::default() };
        (dem, path, split, params)
    }

    fn run(sims: &[SimulationInput]) -> Result<BatchReport> {
        let (dem, path, split, params) = setup();
        run_batch(&dem, &path, &split, sims, &params, None)
    }

    #[derive(Default)]
    struct Recorder {
        transforms: usize,
        simulations: Vec<String>,
        areas: Vec<ConfusionAreas>,
    }

    impl AnalysisSink for Recorder {
        fn on_transform(&mut self, _ctx: &TransformContext, _dem: &ResampledField) {
            self.transforms += 1;
        }

        fn on_simulation(
            &mut self,
            _ctx: &TransformContext,
            name: &str,
            _metrics: &SimulationMetrics,
        ) {
            self.simulations.push(name.to_string());
        }

        fn on_area(&mut self, _ctx: &TransformContext, area: &AreaAnalysis) {
            self.areas = area.areas.clone();
        }
    }

    #[test]
    fn constant_pressure_on_flat_plane() {
        let report = run(&[simulation("sim", 5.0)]).unwrap();
        let ctx = &report.context;
        let m = report.simulations[0].metrics().expect("simulation completed");
        let last = ctx.num_s() - 1;

        assert_eq!(m.c_upper, 0);
        assert_eq!(m.c_lower, last);
        assert_relative_eq!(m.ampp.unwrap(), 5.0, epsilon = 1e-9);
        assert_relative_eq!(m.mmpp.unwrap(), 5.0, epsilon = 1e-9);
        assert_relative_eq!(m.amd.unwrap(), 2.0, epsilon = 1e-9);
        let expected_runout = ctx.s_coord[last] - ctx.s_coord[ctx.ind_runout_point];
        assert_relative_eq!(m.runout, expected_runout, epsilon = 1e-9);
        assert_relative_eq!(m.delta_h.unwrap(), 0.0, epsilon = 1e-9);
        assert_eq!(m.growth_index, 1.0);
        assert_eq!(m.areas.false_positive, 0.0);
        assert_eq!(m.areas.false_negative, 0.0);
        assert!(m.areas.true_positive > 0.0);
        assert!(m.warnings.is_empty(), "{:?}", m.warnings);
        assert_eq!(report.dem_stats.out_of_bounds, 0);
        let stats = report.simulations[0].pressure_stats.expect("pressure stats");
        assert_eq!(stats.total, ctx.num_s() * ctx.num_l());
    }

    #[test]
    fn report_carries_normalised_area_fractions() {
        let report = run(&[simulation("ref", 5.0), simulation("quiet", 0.5)]).unwrap();
        let reference = report.simulations[0].metrics().unwrap();
        let f = reference.area_fractions.expect("reference footprint is not empty");
        assert_relative_eq!(f.true_positive, 1.0, epsilon = 1e-12);
        assert_eq!(f.false_negative, 0.0);

        let quiet = report.simulations[1].metrics().unwrap();
        let f = quiet.area_fractions.expect("fractions use the reference area");
        assert_relative_eq!(f.false_negative, 1.0, epsilon = 1e-12);

        let json = serde_json::to_value(&report).unwrap();
        let tp = &json["simulations"][0]["outcome"]["metrics"]["area_fractions"]["true_positive"];
        assert_eq!(tp.as_f64(), Some(1.0));
    }

    #[test]
    fn sink_sees_every_stage() {
        let (dem, path, split, params) = setup();
        let sims = [simulation("a", 5.0), simulation("b", 0.5)];
        let mut recorder = Recorder::default();
        run_batch(&dem, &path, &split, &sims, &params, Some(&mut recorder)).unwrap();

        assert_eq!(recorder.transforms, 1);
        assert_eq!(recorder.simulations, vec!["a", "b"]);
        // "b" stays below the limit everywhere, so all of the reference footprint is missed.
        assert_eq!(recorder.areas[1].true_positive, 0.0);
        let reference_area = recorder.areas[0].true_positive;
        assert_relative_eq!(recorder.areas[1].false_negative, reference_area, epsilon = 1e-9);
    }

    #[test]
    fn results_follow_input_order() {
        // Alternating above/below the limit, so each slot is identifiable by its peak.
        let sims: Vec<SimulationInput> = (0..8)
            .map(|i| simulation(&format!("sim{i}"), if i % 2 == 0 { 5.0 + i as f64 } else { 0.5 }))
            .collect();
        let report = run(&sims).unwrap();

        assert_eq!(report.simulations.len(), sims.len());
        for (i, result) in report.simulations.iter().enumerate() {
            assert_eq!(result.name, format!("sim{i}"));
            let m = result.metrics().expect("completed");
            let peak = if i % 2 == 0 { 5.0 + i as f64 } else { 0.5 };
            assert_relative_eq!(m.mmpp.unwrap(), peak, epsilon = 1e-9);
            let hit = m.areas.true_positive > 0.0;
            assert_eq!(hit, i % 2 == 0, "sim{i}: {:?}", m.areas);
        }
    }

    #[test]
    fn failing_simulation_does_not_abort_the_batch() {
        let mut broken = simulation("broken", 5.0);
        broken.mass = MassSeries::from_csv_str("time,total,entrained\n0,1000,0\n").unwrap();
        let report = run(&[simulation("ok", 5.0), broken, simulation("also ok", 5.0)]).unwrap();

        assert!(report.simulations[0].metrics().is_some());
        match &report.simulations[1].outcome {
            SimulationOutcome::Failed { error } => {
                assert!(error.contains("mass series"), "{error}")
            }
            other => panic!("expected failure, got {other:?}"),
        }
        let last = report.simulations[2].metrics().expect("third simulation completed");
        assert_eq!(last.areas.false_negative, 0.0);
    }

    #[test]
    fn mismatched_raster_geometry_fails_only_that_simulation() {
        let mut coarse = simulation("coarse", 5.0);
        coarse.depth = RasterGrid::constant(RasterHeader { cellsize: 10.0, ..header() }, 2.0);
        let report = run(&[simulation("ref", 5.0), coarse]).unwrap();
        assert!(report.simulations[1].metrics().is_none());
        assert!(report.simulations[1].pressure_stats.is_none());
    }

    #[test]
    fn different_nodata_sentinel_is_accepted() {
        let mut other = simulation("other", 5.0);
        other.depth = RasterGrid::constant(RasterHeader { nodata_value: -1.0, ..header() }, 2.0);
        let report = run(&[simulation("ref", 5.0), other]).unwrap();
        let m = report.simulations[1].metrics().expect("same geometry, different sentinel");
        assert_relative_eq!(m.amd.unwrap(), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn differing_release_mass_is_a_warning() {
        let mut heavier = simulation("heavier", 5.0);
        heavier.mass = mass(1200.0);
        let report = run(&[simulation("ref", 5.0), heavier]).unwrap();
        let m = report.simulations[1].metrics().unwrap();
        let expected = AnalysisWarning::MassMismatch { reference: 1000.0, found: 1200.0 };
        assert_eq!(m.warnings, vec![expected]);
    }

    #[test]
    fn failing_reference_or_empty_batch_is_fatal() {
        assert!(run(&[]).is_err());

        let mut broken = simulation("ref", 5.0);
        broken.mass = MassSeries::new(Vec::new());
        let err = run(&[broken, simulation("b", 5.0)]).unwrap_err();
        assert!(matches!(err, AnalysisError::MassSeries { .. }), "got {err:?}");
    }
}
