//! Scorecast CLI — forecast, stats, and export commands.
//!
//! Commands:
//! - `forecast` — run the Monte Carlo goal forecast over a subjects file
//! - `stats` — print per-subject statistics (mean, sd, trend)
//! - `export` — write per-subject statistics to CSV

mod export;
mod input;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use scorecast_core::{
    Forecast, ForecastReadiness, Forecaster, ProjectionStrategy, SubjectMap, Trend,
};

use crate::input::Settings;

#[derive(Parser)]
#[command(
    name = "scorecast",
    about = "Scorecast CLI — study-score forecasting engine"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the Monte Carlo goal forecast.
    Forecast {
        /// Path to the subjects JSON file.
        #[arg(long)]
        input: PathBuf,

        /// Target score (0-100).
        #[arg(long)]
        target: f64,

        /// Projection horizon in days.
        #[arg(long, default_value_t = 30.0)]
        days: f64,

        /// RNG seed. Defaults to the settings file, then 42.
        #[arg(long)]
        seed: Option<u64>,

        /// Number of simulated outcomes.
        #[arg(long)]
        simulations: Option<usize>,

        /// Projection strategy: regression (default) or weighted.
        #[arg(long, default_value = "regression")]
        strategy: String,

        /// Optional TOML settings file (simulation parameters, weights).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the full forecast as JSON to this path.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Also run one simulation per subject.
        #[arg(long, default_value_t = false)]
        per_subject: bool,
    },
    /// Print per-subject statistics.
    Stats {
        /// Path to the subjects JSON file.
        #[arg(long)]
        input: PathBuf,

        /// Optional TOML settings file (weights overrides).
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Write per-subject statistics to CSV.
    Export {
        /// Path to the subjects JSON file.
        #[arg(long)]
        input: PathBuf,

        /// Output CSV path.
        #[arg(long)]
        out: PathBuf,

        /// Optional TOML settings file (weights overrides).
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Forecast {
            input,
            target,
            days,
            seed,
            simulations,
            strategy,
            config,
            output,
            per_subject,
        } => run_forecast(
            input,
            target,
            days,
            seed,
            simulations,
            strategy,
            config,
            output,
            per_subject,
        ),
        Commands::Stats { input, config } => run_stats(input, config),
        Commands::Export { input, out, config } => run_export(input, out, config),
    }
}

/// Load subjects and settings, applying weight overrides.
fn load_inputs(input: &Path, config: Option<&Path>) -> Result<(SubjectMap, Settings)> {
    let mut subjects = input::load_subjects(input)?;
    let settings = match config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    settings.apply_weights(&mut subjects);
    Ok((subjects, settings))
}

fn parse_strategy(name: &str) -> Result<ProjectionStrategy> {
    match name {
        "regression" => Ok(ProjectionStrategy::Regression),
        "weighted" => Ok(ProjectionStrategy::Weighted),
        other => bail!("unknown strategy '{other}' (expected: regression, weighted)"),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_forecast(
    input: PathBuf,
    target: f64,
    days: f64,
    seed: Option<u64>,
    simulations: Option<usize>,
    strategy: String,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    per_subject: bool,
) -> Result<()> {
    let strategy = parse_strategy(&strategy)?;
    let (subjects, settings) = load_inputs(&input, config.as_deref())?;
    let sim_config = settings.simulation_config(seed, simulations);

    let forecaster = Forecaster::new();
    let forecast = forecaster.forecast_with_strategy(&subjects, target, days, &sim_config, strategy);

    match &forecast {
        Forecast::Waiting { readiness } => match readiness {
            ForecastReadiness::NeedMorePoints { missing } => {
                println!("Waiting for data: log {missing} more result(s) to unlock forecasting.");
            }
            ForecastReadiness::NeedMoreDays { missing } => {
                println!("Waiting for data: results span too few days ({missing} more needed).");
            }
            ForecastReadiness::Ready => unreachable!("waiting forecast cannot be ready"),
        },
        Forecast::Ready(report) => {
            let s = report.outcome.summary();
            println!("Probability of reaching {target:.0}: {}%", s.probability);
            println!(
                "Simulated distribution: mean {} / sd {} (95% CI {} - {})",
                s.mean, s.sd, s.ci95_low, s.ci95_high
            );
            if let (Some(pm), Some(psd)) =
                (report.outcome.projected_mean, report.outcome.projected_sd)
            {
                println!("Projection at +{days:.0} days: mean {pm:.1}, sd {psd:.1}");
            }
            println!(
                "Pooled estimate: weighted mean {:.1}, pooled sd {:.1} over weight {:.1}",
                report.pooled.weighted_mean, report.pooled.pooled_sd, report.pooled.total_weight
            );

            if per_subject {
                println!();
                println!("Per-subject simulations:");
                let outcomes = forecaster.simulate_subjects(&subjects, target, days, &sim_config);
                for (name, outcome) in &outcomes {
                    println!("  {name}: {:.1}%", outcome.probability);
                }
            }
        }
    }

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&forecast)?;
        std::fs::write(&path, json)
            .with_context(|| format!("cannot write forecast to {}", path.display()))?;
        println!("Forecast written to {}", path.display());
    }

    Ok(())
}

fn run_stats(input: PathBuf, config: Option<PathBuf>) -> Result<()> {
    let (subjects, _) = load_inputs(&input, config.as_deref())?;
    let stats = Forecaster::new().subject_stats(&subjects);

    if stats.is_empty() {
        println!("No usable records in {}.", input.display());
        return Ok(());
    }

    println!(
        "{:<16} {:>6} {:>4} {:>7} {:>6} {:>8} {:>7}",
        "subject", "weight", "n", "mean", "sd", "trend", "slope"
    );
    for (name, s) in &stats {
        let trend = match s.trend {
            Trend::Up => "up",
            Trend::Down => "down",
            Trend::Stable => "stable",
        };
        println!(
            "{:<16} {:>6.1} {:>4} {:>7.1} {:>6.1} {:>8} {:>7.1}",
            name, s.weight, s.n, s.mean, s.sd, trend, s.trend_value
        );
    }
    Ok(())
}

fn run_export(input: PathBuf, out: PathBuf, config: Option<PathBuf>) -> Result<()> {
    let (subjects, _) = load_inputs(&input, config.as_deref())?;
    let stats = Forecaster::new().subject_stats(&subjects);
    export::write_stats_csv(&out, &stats)?;
    println!("Wrote {} subject(s) to {}", stats.len(), out.display());
    Ok(())
}
