//! History regression — day-indexed linear fit with recency weighting.
//!
//! Fits a line through a date-stamped score series, weighting recent
//! observations more heavily. Volatility is the recency-weighted residual
//! standard deviation, so a genuine regime shift (old plateau, new plateau)
//! reads as a trend rather than as noise.

use chrono::NaiveDate;

use super::{clamp_score, confidence_factor, damped_horizon};

/// Per-day recency decay applied to regression weights.
const RECENCY_DECAY: f64 = 0.85;

/// Result of a recency-weighted fit over one series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionFit {
    /// Points per day. Exactly 0.0 when the fit is degenerate.
    pub slope: f64,
    /// Fitted score at the last observed day.
    pub level: f64,
    /// Recency-weighted residual standard deviation.
    pub volatility: f64,
    /// Number of points used.
    pub n: usize,
}

impl RegressionFit {
    fn flat(level: f64, n: usize) -> Self {
        Self {
            slope: 0.0,
            level,
            volatility: 0.0,
            n,
        }
    }
}

/// Plain OLS slope over `(day, score)` pairs.
///
/// A single point, or points that all share one day (zero x-spread),
/// yields exactly 0.0 — never NaN or infinity.
pub fn calculate_slope(points: &[(f64, f64)]) -> f64 {
    let n = points.len();
    if n < 2 {
        return 0.0;
    }
    let n_f = n as f64;
    let mean_x = points.iter().map(|&(x, _)| x).sum::<f64>() / n_f;
    let mean_y = points.iter().map(|&(_, y)| y).sum::<f64>() / n_f;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for &(x, y) in points {
        let dx = x - mean_x;
        sxx += dx * dx;
        sxy += dx * (y - mean_y);
    }
    if sxx < 1e-12 {
        return 0.0;
    }
    sxy / sxx
}

/// Recency-weighted linear fit over a date-stamped series.
///
/// The series is sorted by date internally; callers may pass records in
/// any order. Weight for a point observed `age` days before the newest
/// point is `0.85^age`.
pub fn adaptive_fit(series: &[(NaiveDate, f64)]) -> RegressionFit {
    if series.is_empty() {
        return RegressionFit::flat(0.0, 0);
    }

    let mut sorted = series.to_vec();
    sorted.sort_by_key(|&(date, _)| date);

    let n = sorted.len();
    let first = sorted[0].0;
    let last = sorted[n - 1].0;
    let points: Vec<(f64, f64)> = sorted
        .iter()
        .map(|&(date, score)| ((date - first).num_days() as f64, score))
        .collect();
    let last_day = (last - first).num_days() as f64;

    if n == 1 {
        return RegressionFit::flat(points[0].1, 1);
    }

    let weights: Vec<f64> = points
        .iter()
        .map(|&(day, _)| RECENCY_DECAY.powf(last_day - day))
        .collect();
    let total_w: f64 = weights.iter().sum();

    let mean_x = points
        .iter()
        .zip(&weights)
        .map(|(&(x, _), w)| w * x)
        .sum::<f64>()
        / total_w;
    let mean_y = points
        .iter()
        .zip(&weights)
        .map(|(&(_, y), w)| w * y)
        .sum::<f64>()
        / total_w;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (&(x, y), w) in points.iter().zip(&weights) {
        let dx = x - mean_x;
        sxx += w * dx * dx;
        sxy += w * dx * (y - mean_y);
    }

    if sxx < 1e-12 {
        // All points share one day: no slope, spread is the volatility.
        let var = points
            .iter()
            .zip(&weights)
            .map(|(&(_, y), w)| w * (y - mean_y).powi(2))
            .sum::<f64>()
            / total_w;
        return RegressionFit {
            slope: 0.0,
            level: mean_y,
            volatility: var.sqrt(),
            n,
        };
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;

    let residual_var = points
        .iter()
        .zip(&weights)
        .map(|(&(x, y), w)| {
            let fitted = intercept + slope * x;
            w * (y - fitted).powi(2)
        })
        .sum::<f64>()
        / total_w;

    RegressionFit {
        slope,
        level: intercept + slope * last_day,
        volatility: residual_var.sqrt(),
        n,
    }
}

/// Project a score `days` forward from a date-stamped series.
///
/// The fitted slope is discounted by the confidence factor and applied
/// over the damped horizon; the result is clamped to [0, 100].
pub fn project_score(series: &[(NaiveDate, f64)], days: f64) -> f64 {
    let fit = adaptive_fit(series);
    if fit.n == 0 {
        return 0.0;
    }
    let confidence = confidence_factor(fit.n, fit.volatility);
    clamp_score(fit.level + fit.slope * confidence * damped_horizon(days))
}
