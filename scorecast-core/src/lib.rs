//! Scorecast Core — statistical forecasting over study-score histories.
//!
//! This crate contains the whole engine:
//! - Domain types (score records, per-subject histories)
//! - Seeded random sources (Lehmer LCG, mulberry32) with BLAKE3 sub-seeds
//! - Descriptive statistics with Bayesian shrinkage and significance-gated
//!   trends
//! - Pooled uncertainty (cross-subject variance + forward-time decay)
//! - Projection strategies (weighted mean, recency-weighted regression)
//! - Monte Carlo goal-attainment simulation
//! - Weighted aggregation and the top-level forecaster
//!
//! The engine is pure and stateless between calls: plain data in, plain
//! results out, and it never panics on degenerate input — a low-confidence
//! number is always preferred over an error.

pub mod aggregate;
pub mod domain;
pub mod projection;
pub mod rng;
pub mod simulation;
pub mod stats;

pub use aggregate::{
    global_history, readiness, Forecast, ForecastReadiness, ForecastReport, Forecaster,
    PooledEstimate, SubjectHistory, SubjectMap,
};
pub use domain::{ScoreHistory, ScoreRecord};
pub use projection::{
    calculate_slope, project_score, ProjectionModel, ProjectionStrategy, RegressionFit,
};
pub use rng::{GeneratorKind, Lcg, Mulberry32, RandomSource, SeedHierarchy};
pub use simulation::{
    simulate_history, simulate_normal, OutcomeSummary, SimulationConfig, SimulationOutcome,
    DEFAULT_SIMULATIONS,
};
pub use stats::{
    calculate_trend, mean, pooled_sd, standard_deviation, time_uncertainty, weighted_variance,
    SubjectStats, Trend,
};
