//! Pooled uncertainty — cross-subject variance plus forward-time decay.
//!
//! The pooled standard deviation combines two independent sources:
//! disagreement between subjects (variance of a weighted sum) and the
//! uncertainty added by projecting forward in time.

use crate::stats::descriptive::SubjectStats;

/// Per-day scale of forecast-horizon uncertainty.
const DAILY_UNCERTAINTY: f64 = 0.5;

/// Variance of the weighted sum of independent subject scores.
///
/// `Var(Σ wᵢXᵢ) = Σ (wᵢ/W)² · Var(Xᵢ)` — each normalized weight is squared
/// before multiplying its subject's variance. Returns 0.0 when
/// `total_weight` is 0.
pub fn weighted_variance(stats: &[SubjectStats], total_weight: f64) -> f64 {
    if total_weight <= 0.0 {
        return 0.0;
    }
    stats
        .iter()
        .map(|s| {
            let w = s.weight / total_weight;
            w * w * s.sd * s.sd
        })
        .sum()
}

/// Uncertainty added by a forecast horizon of `days`.
///
/// `sqrt(days) · 0.5`: zero at zero days, strictly increasing, sub-linear.
pub fn time_uncertainty(days: f64) -> f64 {
    if days <= 0.0 {
        return 0.0;
    }
    days.sqrt() * DAILY_UNCERTAINTY
}

/// Pooled standard deviation: cross-subject variance and time decay
/// combined as independent variance sources.
///
/// This is the single sd fed into the Monte Carlo simulator.
pub fn pooled_sd(stats: &[SubjectStats], total_weight: f64, days: f64) -> f64 {
    let tu = time_uncertainty(days);
    (weighted_variance(stats, total_weight) + tu * tu).sqrt()
}
