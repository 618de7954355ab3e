//! Monte Carlo simulation of goal attainment.
//!
//! Draws simulated exam outcomes from a normal distribution around a
//! projected mean and reports the empirical probability of reaching a
//! target, plus a 95% confidence interval. Deterministic per seed; the
//! history form delegates to the regression projection first.

use serde::{Deserialize, Serialize};

use crate::domain::ScoreHistory;
use crate::projection::{clamp_score, confidence_factor, damped_horizon, regression};
use crate::rng::GeneratorKind;
use crate::stats::time_uncertainty;

/// Default number of simulated outcomes per run.
pub const DEFAULT_SIMULATIONS: usize = 2000;

/// Sampling sd is floored here so a degenerate history still produces a
/// non-degenerate distribution.
const SD_FLOOR: f64 = 0.1;

const CI95_Z: f64 = 1.96;

// ─── Configuration ───────────────────────────────────────────────────

/// Configuration for one simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// RNG seed. `None` draws a fresh seed from OS entropy.
    pub seed: Option<u64>,
    /// Number of simulated outcomes (floored at 1).
    pub simulations: usize,
    /// Generator algorithm.
    pub generator: GeneratorKind,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: Some(42), // fixed seed for reproducibility
            simulations: DEFAULT_SIMULATIONS,
            generator: GeneratorKind::Lcg,
        }
    }
}

impl SimulationConfig {
    fn resolve_seed(&self) -> u64 {
        self.seed.unwrap_or_else(rand::random)
    }
}

// ─── Result type ─────────────────────────────────────────────────────

/// Outcome of a Monte Carlo run. The canonical, numeric result shape.
///
/// `mean`/`sd` are the empirical moments of the simulated distribution,
/// not the inputs echoed back. `probability` is a percentage (0-100).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutcome {
    /// Probability of reaching the target, in percent.
    pub probability: f64,
    pub mean: f64,
    pub sd: f64,
    pub ci95_low: f64,
    pub ci95_high: f64,
    /// Regression-projected mean, when the history form was used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projected_mean: Option<f64>,
    /// Sampling sd fed into the draw, when the history form was used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projected_sd: Option<f64>,
    /// Recency-weighted residual volatility of the history fit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volatility: Option<f64>,
}

impl SimulationOutcome {
    /// One-decimal display rendering for UI call sites.
    pub fn summary(&self) -> OutcomeSummary {
        OutcomeSummary {
            probability: format!("{:.1}", self.probability),
            mean: format!("{:.1}", self.mean),
            sd: format!("{:.1}", self.sd),
            ci95_low: format!("{:.1}", self.ci95_low),
            ci95_high: format!("{:.1}", self.ci95_high),
        }
    }
}

/// String-formatted outcome fields, one decimal place each.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutcomeSummary {
    pub probability: String,
    pub mean: String,
    pub sd: String,
    pub ci95_low: String,
    pub ci95_high: String,
}

// ─── Simulation ──────────────────────────────────────────────────────

/// Simulate goal attainment from a projected mean and sd.
///
/// Each trial draws `clamp(mean + z·sd, 0, 100)`; a trial succeeds when
/// the sample reaches `target`. Non-finite inputs are replaced with safe
/// defaults and the sd is floored — this function never panics and never
/// returns non-finite fields.
pub fn simulate_normal(
    mean: f64,
    sd: f64,
    target: f64,
    config: &SimulationConfig,
) -> SimulationOutcome {
    let mean = if mean.is_finite() { mean } else { 0.0 };
    let sd = if sd.is_finite() { sd.abs().max(SD_FLOOR) } else { SD_FLOOR };
    let target = if target.is_finite() { target } else { 100.0 };
    let simulations = config.simulations.max(1);

    let mut rng = config.generator.source(config.resolve_seed());
    let mut samples = Vec::with_capacity(simulations);
    let mut successes = 0usize;

    for _ in 0..simulations {
        let sample = clamp_score(mean + rng.next_normal() * sd);
        if sample >= target {
            successes += 1;
        }
        samples.push(sample);
    }

    let empirical_mean = samples.iter().sum::<f64>() / simulations as f64;
    let empirical_sd = if simulations < 2 {
        0.0
    } else {
        (samples
            .iter()
            .map(|s| (s - empirical_mean).powi(2))
            .sum::<f64>()
            / (simulations - 1) as f64)
            .sqrt()
    };

    SimulationOutcome {
        probability: successes as f64 / simulations as f64 * 100.0,
        mean: empirical_mean,
        sd: empirical_sd,
        ci95_low: clamp_score(empirical_mean - CI95_Z * empirical_sd),
        ci95_high: clamp_score(empirical_mean + CI95_Z * empirical_sd),
        projected_mean: None,
        projected_sd: None,
        volatility: None,
    }
}

/// Simulate goal attainment from a score history.
///
/// Projects the mean `projection_days` forward via the recency-weighted
/// regression, combines residual volatility with time-decay uncertainty
/// into the sampling sd, then simulates.
pub fn simulate_history(
    history: &ScoreHistory,
    target: f64,
    projection_days: f64,
    config: &SimulationConfig,
) -> SimulationOutcome {
    let series = history.dated_scores();
    let fit = regression::adaptive_fit(&series);

    let projected = if fit.n == 0 {
        0.0
    } else {
        let confidence = confidence_factor(fit.n, fit.volatility);
        clamp_score(fit.level + fit.slope * confidence * damped_horizon(projection_days))
    };

    let tu = time_uncertainty(projection_days);
    let sampling_sd = (fit.volatility * fit.volatility + tu * tu).sqrt().max(SD_FLOOR);

    let mut outcome = simulate_normal(projected, sampling_sd, target, config);
    outcome.projected_mean = Some(projected);
    outcome.projected_sd = Some(sampling_sd);
    outcome.volatility = Some(fit.volatility);
    outcome
}
