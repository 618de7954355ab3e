//! Weighted projection — combine subjects' means by syllabus weight.
//!
//! The "today" estimate ignores time entirely; the days-forward estimate
//! nudges each subject's mean along its significant trend slope, using the
//! same confidence, damping, and clamping as the regression strategy.

use super::{clamp_score, confidence_factor, damped_horizon};
use crate::stats::SubjectStats;

/// Weighted mean of subject means. Returns 0.0 when total weight is 0.
pub fn current_weighted_mean(stats: &[SubjectStats]) -> f64 {
    let total_weight: f64 = stats.iter().map(|s| s.weight).sum();
    if total_weight <= 0.0 {
        return 0.0;
    }
    stats.iter().map(|s| s.weight * s.mean).sum::<f64>() / total_weight
}

/// Weighted mean `days` forward, each subject nudged by its trend.
///
/// `trend_value` is points per ten exams; the per-exam slope is applied
/// over the damped horizon, discounted by the subject's sample-count
/// confidence, and clamped per subject before weighting.
pub fn projected_weighted_mean(stats: &[SubjectStats], days: f64) -> f64 {
    let total_weight: f64 = stats.iter().map(|s| s.weight).sum();
    if total_weight <= 0.0 {
        return 0.0;
    }
    let horizon = damped_horizon(days);
    stats
        .iter()
        .map(|s| {
            let drift = (s.trend_value / 10.0) * confidence_factor(s.n, 0.0) * horizon;
            s.weight * clamp_score(s.mean + drift)
        })
        .sum::<f64>()
        / total_weight
}
