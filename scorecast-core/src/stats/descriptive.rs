//! Descriptive statistics for a single score series.
//!
//! Every function is pure: scores in, scalar out. Small-sample standard
//! deviations are stabilized with Bayesian shrinkage toward a population
//! prior, and trend slopes are gated on statistical significance so noise
//! is never reported as a trend.

use serde::{Deserialize, Serialize};

use crate::domain::ScoreHistory;

/// Population-typical exam volatility, in percentage points.
pub const POPULATION_SD: f64 = 12.0;

/// Shrinkage strength: three phantom exams at population-typical volatility.
pub const PHANTOM_EXAMS: f64 = 3.0;

/// Trend regression looks at the most recent scores only.
const TREND_WINDOW: usize = 10;

/// Rescaled slopes within this band classify as `Stable`.
const TREND_DEADZONE: f64 = 0.5;

/// SubjectStats floors sd at this fraction of the mean.
const SD_MEAN_FLOOR: f64 = 0.02;

/// Two-sided 95% Student's-t critical values, indexed by df - 1 (df 1..=10).
const T_CRITICAL_95: [f64; 10] = [
    12.71, 4.30, 3.18, 2.78, 2.57, 2.45, 2.36, 2.31, 2.26, 2.23,
];

fn t_critical(df: usize) -> f64 {
    if df == 0 {
        return f64::INFINITY;
    }
    T_CRITICAL_95.get(df - 1).copied().unwrap_or(2.0)
}

// ─── Core statistics ─────────────────────────────────────────────────

/// Arithmetic mean. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Standard deviation with Bayesian shrinkage toward the population prior.
///
/// Bessel-corrected sample variance blended with `PHANTOM_EXAMS` phantom
/// observations at `POPULATION_SD`:
///
/// `adjusted = ((n-1)·sampleVar + κ·popSD²) / ((n-1) + κ)`
///
/// Two identical scores therefore never report zero volatility, and a
/// single outlier cannot blow the estimate past the prior's pull.
/// Returns 0.0 for fewer than 2 values.
pub fn standard_deviation(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let m = mean(values);
    let sample_var =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1) as f64;

    let df = (n - 1) as f64;
    let adjusted_var = (df * sample_var + PHANTOM_EXAMS * POPULATION_SD * POPULATION_SD)
        / (df + PHANTOM_EXAMS);
    adjusted_var.sqrt()
}

/// Significance-gated trend slope over the last `TREND_WINDOW` scores.
///
/// Fits index-vs-score OLS, then zeroes the slope unless its t-statistic
/// clears the two-sided 95% critical value for the residual degrees of
/// freedom. The returned slope is rescaled ×10: points per ten exams.
/// Requires at least 3 scores; returns 0.0 otherwise.
pub fn calculate_trend(scores: &[f64]) -> f64 {
    let window = if scores.len() > TREND_WINDOW {
        &scores[scores.len() - TREND_WINDOW..]
    } else {
        scores
    };
    let n = window.len();
    if n < 3 {
        return 0.0;
    }

    let n_f = n as f64;
    let mean_x = (n_f - 1.0) / 2.0;
    let mean_y = mean(window);

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (i, &y) in window.iter().enumerate() {
        let dx = i as f64 - mean_x;
        sxx += dx * dx;
        sxy += dx * (y - mean_y);
    }
    let slope = sxy / sxx;

    let ss_residual: f64 = window
        .iter()
        .enumerate()
        .map(|(i, &y)| {
            let fitted = mean_y + slope * (i as f64 - mean_x);
            (y - fitted).powi(2)
        })
        .sum();

    let df = n - 2;
    let residual_var = ss_residual / df as f64;
    let std_err = (residual_var / sxx).sqrt();

    let t_stat = if std_err < 1e-12 {
        // Zero residuals: a perfect line is infinitely significant,
        // a perfectly flat one is not significant at all.
        if slope.abs() > 1e-12 {
            f64::INFINITY
        } else {
            0.0
        }
    } else {
        slope / std_err
    };

    if t_stat.abs() < t_critical(df) {
        return 0.0;
    }
    slope * 10.0
}

// ─── Per-subject aggregate ───────────────────────────────────────────

/// Direction of a subject's significant trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

/// Derived statistics for one subject's score history.
///
/// Recomputed on demand; never persisted independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectStats {
    pub mean: f64,
    pub sd: f64,
    pub n: usize,
    pub weight: f64,
    pub trend: Trend,
    /// Significant slope in points per ten exams (0.0 when gated out).
    pub trend_value: f64,
}

impl SubjectStats {
    /// Compute mean, shrunk sd, and gated trend from a subject's history.
    ///
    /// Records without any usable score are skipped. The sd is floored at
    /// 2% of the mean so a run of identical scores cannot report a
    /// near-zero risk estimate. Returns `None` for a history with no
    /// usable records.
    pub fn compute(history: &ScoreHistory, weight: f64) -> Option<Self> {
        let scores = history.sorted_scores();
        if scores.is_empty() {
            return None;
        }

        let mean_score = mean(&scores);
        let sd = standard_deviation(&scores).max(SD_MEAN_FLOOR * mean_score);
        let trend_value = calculate_trend(&scores);

        let trend = if trend_value > TREND_DEADZONE {
            Trend::Up
        } else if trend_value < -TREND_DEADZONE {
            Trend::Down
        } else {
            Trend::Stable
        };

        Some(Self {
            mean: mean_score,
            sd,
            n: scores.len(),
            weight,
            trend,
            trend_value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ScoreRecord;
    use crate::stats::assert_approx;
    use chrono::NaiveDate;

    fn history(scores: &[f64]) -> ScoreHistory {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        ScoreHistory::from_records(
            scores
                .iter()
                .enumerate()
                .map(|(i, &s)| ScoreRecord {
                    date: base + chrono::Duration::days(i as i64),
                    score: Some(s),
                    total: None,
                    correct: None,
                })
                .collect(),
        )
    }

    // ── mean ──

    #[test]
    fn mean_basic() {
        assert_approx(mean(&[70.0, 80.0, 90.0]), 80.0, 1e-12);
    }

    #[test]
    fn mean_empty_is_zero() {
        assert_eq!(mean(&[]), 0.0);
    }

    // ── standard_deviation ──

    #[test]
    fn sd_fewer_than_two_is_zero() {
        assert_eq!(standard_deviation(&[]), 0.0);
        assert_eq!(standard_deviation(&[75.0]), 0.0);
    }

    #[test]
    fn sd_identical_values_shrinks_above_zero() {
        for n in 2..12 {
            let values = vec![75.0; n];
            let sd = standard_deviation(&values);
            assert!(sd > 0.0, "n={n}: shrinkage must prevent exact zero");
            assert!(sd < POPULATION_SD, "n={n}: sd {sd} must stay below the prior");
        }
    }

    #[test]
    fn sd_identical_pair_known_value() {
        // (1·0 + 3·144) / (1 + 3) = 108
        assert_approx(standard_deviation(&[75.0, 75.0]), 108.0_f64.sqrt(), 1e-12);
    }

    #[test]
    fn sd_shrinks_toward_sample_with_more_data() {
        // As n grows with zero variance, the prior's pull fades.
        let sd_small = standard_deviation(&[75.0; 3]);
        let sd_large = standard_deviation(&[75.0; 30]);
        assert!(sd_large < sd_small);
    }

    #[test]
    fn sd_outlier_is_tempered() {
        let raw: Vec<f64> = vec![70.0, 70.0, 70.0, 10.0];
        let m = mean(&raw);
        let sample_sd = (raw.iter().map(|v| (v - m).powi(2)).sum::<f64>() / 3.0).sqrt();
        let shrunk = standard_deviation(&raw);
        assert!(shrunk < sample_sd, "shrinkage should pull the outlier in");
    }

    // ── calculate_trend ──

    #[test]
    fn trend_requires_three_scores() {
        assert_eq!(calculate_trend(&[]), 0.0);
        assert_eq!(calculate_trend(&[70.0]), 0.0);
        assert_eq!(calculate_trend(&[70.0, 80.0]), 0.0);
    }

    #[test]
    fn trend_noise_is_gated_to_zero() {
        let noisy = [70.0, 75.0, 68.0, 74.0, 71.0, 69.0, 73.0, 70.0, 72.0, 71.0];
        assert_eq!(calculate_trend(&noisy), 0.0);
    }

    #[test]
    fn trend_clear_rise_passes_the_gate() {
        let rising = [50.0, 55.0, 60.0, 65.0, 70.0, 75.0, 80.0, 85.0, 90.0, 95.0];
        assert_approx(calculate_trend(&rising), 50.0, 1e-9);
    }

    #[test]
    fn trend_clear_fall_is_negative() {
        let falling = [95.0, 90.0, 85.0, 80.0, 75.0, 70.0, 65.0, 60.0, 55.0, 50.0];
        assert_approx(calculate_trend(&falling), -50.0, 1e-9);
    }

    #[test]
    fn trend_flat_is_zero() {
        assert_eq!(calculate_trend(&[70.0; 10]), 0.0);
    }

    #[test]
    fn trend_uses_last_ten_only() {
        // Ancient decline followed by ten flat scores: no trend.
        let mut scores = vec![95.0, 85.0, 75.0, 65.0, 55.0];
        scores.extend_from_slice(&[70.0; 10]);
        assert_eq!(calculate_trend(&scores), 0.0);
    }

    // ── SubjectStats::compute ──

    #[test]
    fn compute_empty_history_is_none() {
        assert!(SubjectStats::compute(&ScoreHistory::new(), 1.0).is_none());
    }

    #[test]
    fn compute_basic_stats() {
        let stats = SubjectStats::compute(&history(&[70.0, 80.0, 90.0]), 2.0).unwrap();
        assert_approx(stats.mean, 80.0, 1e-12);
        assert_eq!(stats.n, 3);
        assert_eq!(stats.weight, 2.0);
        assert!(stats.sd > 0.0);
    }

    #[test]
    fn compute_floors_sd_at_two_percent_of_mean() {
        let stats = SubjectStats::compute(&history(&[90.0, 90.0, 90.0]), 1.0).unwrap();
        assert!(stats.sd >= 0.02 * stats.mean);
    }

    #[test]
    fn compute_classifies_trends() {
        let up = SubjectStats::compute(
            &history(&[50.0, 55.0, 60.0, 65.0, 70.0, 75.0, 80.0, 85.0, 90.0, 95.0]),
            1.0,
        )
        .unwrap();
        assert_eq!(up.trend, Trend::Up);

        let stable = SubjectStats::compute(&history(&[70.0, 70.0, 70.0, 70.0]), 1.0).unwrap();
        assert_eq!(stable.trend, Trend::Stable);
        assert_eq!(stable.trend_value, 0.0);

        let down = SubjectStats::compute(
            &history(&[95.0, 90.0, 85.0, 80.0, 75.0, 70.0, 65.0, 60.0, 55.0, 50.0]),
            1.0,
        )
        .unwrap();
        assert_eq!(down.trend, Trend::Down);
    }

    #[test]
    fn compute_skips_malformed_records() {
        let mut h = history(&[70.0, 80.0]);
        h.push(ScoreRecord {
            date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            score: None,
            total: None,
            correct: None,
        });
        let stats = SubjectStats::compute(&h, 1.0).unwrap();
        assert_eq!(stats.n, 2);
        assert_approx(stats.mean, 75.0, 1e-12);
    }
}
