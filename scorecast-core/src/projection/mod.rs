//! Score projection — two selectable strategies behind one interface.
//!
//! - `Weighted`: combine subjects' means by weight, nudged by each
//!   subject's significant trend.
//! - `Regression`: recency-weighted linear fit over one date-stamped
//!   series.
//!
//! Both strategies share the confidence penalty, the logarithmic horizon
//! damping, and the [0, 100] clamp.

pub mod regression;
pub mod weighted;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::stats::SubjectStats;

pub use regression::{adaptive_fit, calculate_slope, project_score, RegressionFit};
pub use weighted::{current_weighted_mean, projected_weighted_mean};

pub const SCORE_MIN: f64 = 0.0;
pub const SCORE_MAX: f64 = 100.0;

/// Horizon damping scale in days.
const HORIZON_DAMP: f64 = 45.0;

/// Volatility scale in the confidence penalty.
const VOLATILITY_SCALE: f64 = 25.0;

/// Clamp a projected score into the valid [0, 100] range.
pub fn clamp_score(value: f64) -> f64 {
    if !value.is_finite() {
        return SCORE_MIN;
    }
    value.clamp(SCORE_MIN, SCORE_MAX)
}

/// Damped projection horizon: `45 · ln(1 + days/45)`.
///
/// Grows like `days` for short horizons and logarithmically beyond, so a
/// 400-day projection cannot linearly extrapolate a noisy 5-day slope.
pub fn damped_horizon(days: f64) -> f64 {
    if days <= 0.0 {
        return 0.0;
    }
    HORIZON_DAMP * (1.0 + days / HORIZON_DAMP).ln()
}

/// Slope confidence: grows with sample count, shrinks with volatility.
///
/// `min(1, 0.9 + n/15) / (1 + volatility/25)`.
pub fn confidence_factor(n: usize, volatility: f64) -> f64 {
    let base = (0.9 + n as f64 / 15.0).min(1.0);
    base / (1.0 + volatility.max(0.0) / VOLATILITY_SCALE)
}

/// Tagged projection strategy carrying its input.
#[derive(Debug, Clone, Copy)]
pub enum ProjectionModel<'a> {
    /// Weighted combination of per-subject statistics.
    Weighted(&'a [SubjectStats]),
    /// Regression over one date-stamped score series.
    Regression(&'a [(NaiveDate, f64)]),
}

impl ProjectionModel<'_> {
    /// The "today" estimate, independent of any horizon.
    pub fn current(&self) -> f64 {
        match self {
            ProjectionModel::Weighted(stats) => current_weighted_mean(stats),
            ProjectionModel::Regression(series) => clamp_score(adaptive_fit(series).level),
        }
    }

    /// The estimate `days` forward.
    pub fn project(&self, days: f64) -> f64 {
        match self {
            ProjectionModel::Weighted(stats) => projected_weighted_mean(stats, days),
            ProjectionModel::Regression(series) => project_score(series, days),
        }
    }
}

/// Strategy selector for configuration surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectionStrategy {
    Weighted,
    #[default]
    Regression,
}

impl ProjectionStrategy {
    /// Bind this strategy to its input.
    pub fn model<'a>(
        self,
        subjects: &'a [SubjectStats],
        series: &'a [(NaiveDate, f64)],
    ) -> ProjectionModel<'a> {
        match self {
            ProjectionStrategy::Weighted => ProjectionModel::Weighted(subjects),
            ProjectionStrategy::Regression => ProjectionModel::Regression(series),
        }
    }
}
