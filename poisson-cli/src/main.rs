mod config;
mod export;
mod presets;

use anyhow::{Context, bail};
use clap::Parser;
use config::RunConfig;
use export::{DiagnosticsCsv, write_grid_csv};
use log::LevelFilter;
use poisson_core::{DivergenceReason, Outcome, Solver};
use presets::{PresetKind, PresetParams};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// JSON run config ({"geometry": ..., "solver": ...}); replaces --preset
    #[arg(long, conflicts_with = "preset")]
    config: Option<PathBuf>,

    /// Built-in geometry when no --config is given
    #[arg(long, value_enum, default_value_t = PresetKind::Venetian)]
    preset: PresetKind,

    /// Grid rows for point/scatter presets
    #[arg(long, conflicts_with = "config")]
    height: Option<usize>,

    /// Grid columns for point/scatter presets
    #[arg(long, conflicts_with = "config")]
    width: Option<usize>,

    /// Uniform grid spacing (hx = hy) for presets
    #[arg(long, conflicts_with = "config")]
    resolution: Option<f64>,

    /// Number of electrodes placed by the scatter preset
    #[arg(long, default_value_t = 12, conflicts_with = "config")]
    sources: usize,

    /// RNG seed for the scatter preset
    #[arg(long, default_value_t = 123, conflicts_with = "config")]
    seed: u64,

    /// Over-relaxation factor, overrides the config
    #[arg(long)]
    omega: Option<f64>,

    /// Convergence tolerance on the sum-of-squares change, overrides the config
    #[arg(long)]
    tolerance: Option<f64>,

    /// Sweep cap before the run is declared diverged, overrides the config
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Output directory
    #[arg(long, default_value = "output")]
    out: PathBuf,

    /// Constant added to every exported potential value
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    shift: f64,

    /// Append to convergence.csv instead of truncating it
    #[arg(long)]
    append_diagnostics: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Serialize)]
struct RunSummary {
    input: String,

    height: usize,
    width: usize,
    hx: f64,
    hy: f64,
    source_cells: usize,

    omega: f64,
    tolerance: f64,
    max_iterations: usize,

    outcome: &'static str,
    divergence_reason: Option<&'static str>,
    iterations: usize,
    final_metric: f64,

    potential_min: Option<f64>,
    potential_max: Option<f64>,
    shift: f64,

    elapsed_s: f64,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);
    run(&args)?;
    Ok(())
}

/// Builds, solves and exports one run. A diverged run still leaves
/// `config.json`, `convergence.csv` and `summary.json` behind, then errors.
fn run(args: &Args) -> anyhow::Result<Outcome> {
    let (mut job, input) = match &args.config {
        Some(path) => (RunConfig::load(path)?, path.display().to_string()),
        None => {
            let params = PresetParams {
                height: args.height,
                width: args.width,
                resolution: args.resolution,
                sources: args.sources,
                seed: args.seed,
            };
            (presets::build(args.preset, &params), args.preset.as_str().to_string())
        }
    };
    if let Some(omega) = args.omega {
        job.solver.omega = omega;
    }
    if let Some(tol) = args.tolerance {
        job.solver.tolerance = tol;
    }
    if let Some(max) = args.max_iterations {
        job.solver.max_iterations = max;
    }

    let solver = Solver::new(&job.geometry, job.solver).context("invalid run configuration")?;

    fs::create_dir_all(&args.out)
        .with_context(|| format!("creating output directory {}", args.out.display()))?;
    job.save(&args.out.join("config.json"))?;

    log::info!(
        "solving {} ({}x{}, {} sources, omega={}, tol={:e})",
        input,
        job.geometry.height,
        job.geometry.width,
        job.geometry.sources.len(),
        job.solver.omega,
        job.solver.tolerance
    );

    let mut diagnostics =
        DiagnosticsCsv::open_or_disabled(args.out.join("convergence.csv"), args.append_diagnostics);

    let started = Instant::now();
    let outcome = solver.run(&mut diagnostics);
    let elapsed = started.elapsed();

    if diagnostics.is_enabled() {
        log::info!(
            "{} convergence rows written to {}",
            diagnostics.rows(),
            diagnostics.path().display()
        );
    }
    diagnostics.finish();

    let mut summary = RunSummary {
        input,
        height: job.geometry.height,
        width: job.geometry.width,
        hx: job.geometry.spacing.hx,
        hy: job.geometry.spacing.hy,
        source_cells: job.geometry.sources.len(),
        omega: job.solver.omega,
        tolerance: job.solver.tolerance,
        max_iterations: job.solver.max_iterations,
        outcome: "converged",
        divergence_reason: None,
        iterations: outcome.iterations(),
        final_metric: outcome.metric(),
        potential_min: None,
        potential_max: None,
        shift: args.shift,
        elapsed_s: elapsed.as_secs_f64(),
    };

    match &outcome {
        Outcome::Converged { grid, iterations, .. } => {
            log::info!("iterations for electric field = {iterations} ({:.2?})", elapsed);

            let potential_path = args.out.join("potential.csv");
            write_grid_csv(&potential_path, grid, args.shift)
                .with_context(|| format!("writing {}", potential_path.display()))?;
            log::info!("potential saved to {}", potential_path.display());

            let (lo, hi) = grid
                .as_slice()
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                    (lo.min(v), hi.max(v))
                });
            summary.potential_min = Some(lo + args.shift);
            summary.potential_max = Some(hi + args.shift);
        }
        Outcome::Diverged { reason, .. } => {
            summary.outcome = "diverged";
            summary.divergence_reason = Some(match reason {
                DivergenceReason::IterationLimit => "iteration_limit",
                DivergenceReason::NonFinite => "non_finite",
            });
        }
    }

    let summary_path = args.out.join("summary.json");
    fs::write(&summary_path, serde_json::to_string_pretty(&summary)?)
        .with_context(|| format!("writing {}", summary_path.display()))?;

    if !outcome.is_converged() {
        bail!(
            "no convergence after {} sweeps (last metric {:e}); no potential written (summary in {})",
            outcome.iterations(),
            outcome.metric(),
            summary_path.display()
        );
    }
    Ok(outcome)
}

fn init_logging(level: &str) {
    let filter = match level.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        "off" => LevelFilter::Off,
        _ => LevelFilter::Info,
    };
    env_logger::Builder::new()
        .filter_level(filter)
        .format_target(false)
        .parse_default_env()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("poisson-cli-{}-{name}", std::process::id()));
        fs::remove_dir_all(&dir).ok();
        dir
    }

    fn args(extra: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("poisson").chain(extra.iter().copied())).unwrap()
    }

    fn summary(out: &Path) -> serde_json::Value {
        serde_json::from_str(&fs::read_to_string(out.join("summary.json")).unwrap()).unwrap()
    }

    #[test]
    fn capped_run_writes_everything_but_the_potential() {
        let out = scratch("capped");
        let out_arg = out.to_str().unwrap();
        let result = run(&args(&["--preset", "point", "--max-iterations", "3", "--out", out_arg]));

        assert!(result.is_err());
        assert!(out.join("config.json").exists());
        assert!(!out.join("potential.csv").exists());

        let rows = fs::read_to_string(out.join("convergence.csv")).unwrap();
        assert_eq!(rows.lines().count(), 3);

        let s = summary(&out);
        assert_eq!(s["outcome"], "diverged");
        assert_eq!(s["divergence_reason"], "iteration_limit");
        assert_eq!(s["iterations"], 3);
        assert!(s["potential_max"].is_null());

        fs::remove_dir_all(&out).ok();
    }

    #[test]
    fn converged_run_writes_all_outputs() {
        let out = scratch("converged");
        let outcome = run(&args(&["--preset", "point", "--out", out.to_str().unwrap()])).unwrap();

        assert!(outcome.is_converged());
        for name in ["config.json", "convergence.csv", "potential.csv", "summary.json"] {
            assert!(out.join(name).exists(), "{name} missing");
        }

        let s = summary(&out);
        assert_eq!(s["outcome"], "converged");
        assert_eq!(s["iterations"], outcome.iterations());
        let rows = fs::read_to_string(out.join("convergence.csv")).unwrap();
        assert_eq!(rows.lines().count(), outcome.iterations());
        let potential = fs::read_to_string(out.join("potential.csv")).unwrap();
        assert_eq!(potential.lines().count(), 33);

        fs::remove_dir_all(&out).ok();
    }

    #[test]
    fn saved_config_replays_the_same_potential() {
        let first = scratch("replay-a");
        let second = scratch("replay-b");
        run(&args(&[
            "--preset",
            "scatter",
            "--height",
            "24",
            "--width",
            "20",
            "--sources",
            "5",
            "--seed",
            "9",
            "--tolerance",
            "0.5",
            "--out",
            first.to_str().unwrap(),
        ]))
        .unwrap();

        let config = first.join("config.json");
        run(&args(&[
            "--config",
            config.to_str().unwrap(),
            "--out",
            second.to_str().unwrap(),
        ]))
        .unwrap();

        assert_eq!(
            fs::read(first.join("potential.csv")).unwrap(),
            fs::read(second.join("potential.csv")).unwrap()
        );
        assert_eq!(summary(&second)["tolerance"], 0.5);

        fs::remove_dir_all(&first).ok();
        fs::remove_dir_all(&second).ok();
    }

    #[test]
    fn preset_flags_conflict_with_config() {
        for flag in [
            ["--height", "5"],
            ["--width", "5"],
            ["--resolution", "0.5"],
            ["--sources", "3"],
            ["--seed", "1"],
        ] {
            let parsed = Args::try_parse_from(["poisson", "--config", "x.json", flag[0], flag[1]]);
            assert!(parsed.is_err(), "{} accepted alongside --config", flag[0]);
        }
        assert!(Args::try_parse_from(["poisson", "--config", "x.json", "--omega", "1.5"]).is_ok());
    }
}
