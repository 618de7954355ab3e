//! Weighted aggregation across subjects and the top-level forecaster.
//!
//! Builds a day-indexed global history (running cumulative weighted
//! average over all subjects seen so far), gates on data sufficiency, and
//! wires projection, pooled variance, and the Monte Carlo simulator into
//! one forecast call.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::ScoreHistory;
use crate::projection::{regression, weighted, ProjectionStrategy};
use crate::rng::SeedHierarchy;
use crate::simulation::{simulate_history, simulate_normal, SimulationConfig, SimulationOutcome};
use crate::stats::{pooled_sd, SubjectStats};

/// Minimum usable data points across all subjects before forecasting.
const MIN_POINTS: usize = 5;

/// Minimum distinct dates before a trend regression is attempted.
const MIN_DISTINCT_DAYS: usize = 2;

/// One subject's weight and score history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubjectHistory {
    pub weight: f64,
    pub history: ScoreHistory,
}

/// All subjects, keyed by name. BTreeMap keeps iteration deterministic.
pub type SubjectMap = BTreeMap<String, SubjectHistory>;

// ─── Readiness ───────────────────────────────────────────────────────

/// Whether enough data exists for a forecast. Re-evaluated fresh on every
/// call; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ForecastReadiness {
    /// Fewer than the minimum total data points.
    NeedMorePoints { missing: usize },
    /// Enough points, but not enough distinct dates for a regression.
    NeedMoreDays { missing: usize },
    Ready,
}

/// Classify data sufficiency: points first, then date spread.
pub fn readiness(subjects: &SubjectMap) -> ForecastReadiness {
    let mut total_points = 0usize;
    let mut dates: Vec<NaiveDate> = Vec::new();
    for subject in subjects.values() {
        for record in subject.history.usable() {
            total_points += 1;
            dates.push(record.date);
        }
    }

    if total_points < MIN_POINTS {
        return ForecastReadiness::NeedMorePoints {
            missing: MIN_POINTS - total_points,
        };
    }

    dates.sort_unstable();
    dates.dedup();
    if dates.len() < MIN_DISTINCT_DAYS {
        return ForecastReadiness::NeedMoreDays {
            missing: MIN_DISTINCT_DAYS - dates.len(),
        };
    }

    ForecastReadiness::Ready
}

// ─── Global history ──────────────────────────────────────────────────

/// Day-indexed global history: for each date any subject reported, the
/// cumulative weighted average across all subjects studied so far, each
/// contributing its most recently known score.
///
/// The series only ever gains information, which makes it suitable for
/// trend regression even when subjects are sparsely and unevenly sampled.
pub fn global_history(subjects: &SubjectMap) -> Vec<(NaiveDate, f64)> {
    // (date, subject index, score), sorted by date; BTreeMap order breaks
    // same-date ties deterministically.
    let mut events: Vec<(NaiveDate, usize, f64)> = Vec::new();
    let mut weights: Vec<f64> = Vec::new();
    for (idx, subject) in subjects.values().enumerate() {
        weights.push(subject.weight);
        for record in subject.history.usable() {
            events.push((record.date, idx, record.safe_score()));
        }
    }
    events.sort_by_key(|&(date, idx, _)| (date, idx));

    let mut latest: BTreeMap<usize, f64> = BTreeMap::new();
    let mut series: Vec<(NaiveDate, f64)> = Vec::new();

    let mut i = 0;
    while i < events.len() {
        let date = events[i].0;
        while i < events.len() && events[i].0 == date {
            let (_, idx, score) = events[i];
            latest.insert(idx, score);
            i += 1;
        }

        let total_weight: f64 = latest.keys().map(|&idx| weights[idx]).sum();
        if total_weight > 0.0 {
            let avg = latest
                .iter()
                .map(|(&idx, &score)| weights[idx] * score)
                .sum::<f64>()
                / total_weight;
            series.push((date, avg));
        }
    }

    series
}

// ─── Forecast ────────────────────────────────────────────────────────

/// Pooled cross-subject estimate for one simulation request. Ephemeral.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PooledEstimate {
    pub weighted_mean: f64,
    pub pooled_sd: f64,
    pub total_weight: f64,
}

/// Result of a top-level forecast call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Forecast {
    /// Not enough data yet; the UI renders a "need more data" state.
    Waiting { readiness: ForecastReadiness },
    Ready(ForecastReport),
}

/// A complete forecast: simulation outcome plus the intermediates the UI
/// displays (gauges, per-subject chips).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastReport {
    pub outcome: SimulationOutcome,
    pub pooled: PooledEstimate,
    pub per_subject: BTreeMap<String, SubjectStats>,
}

/// Stateless forecasting service: every call receives its own inputs and
/// RNG, so concurrent calls never interfere.
#[derive(Debug, Clone, Copy, Default)]
pub struct Forecaster;

impl Forecaster {
    pub fn new() -> Self {
        Self
    }

    /// Per-subject statistics, computed in parallel across subjects.
    ///
    /// Subjects with no usable records are skipped.
    pub fn subject_stats(&self, subjects: &SubjectMap) -> BTreeMap<String, SubjectStats> {
        subjects
            .par_iter()
            .filter_map(|(name, subject)| {
                SubjectStats::compute(&subject.history, subject.weight)
                    .map(|stats| (name.clone(), stats))
            })
            .collect()
    }

    /// Pooled estimate across subjects for a given horizon.
    pub fn pooled_estimate(&self, stats: &[SubjectStats], days: f64) -> PooledEstimate {
        let total_weight: f64 = stats.iter().map(|s| s.weight).sum();
        PooledEstimate {
            weighted_mean: weighted::current_weighted_mean(stats),
            pooled_sd: pooled_sd(stats, total_weight, days),
            total_weight,
        }
    }

    /// Top-level forecast with the default (regression) projection.
    pub fn forecast(
        &self,
        subjects: &SubjectMap,
        target: f64,
        days: f64,
        config: &SimulationConfig,
    ) -> Forecast {
        self.forecast_with_strategy(subjects, target, days, config, ProjectionStrategy::default())
    }

    /// Top-level forecast: readiness gate, projection over the global
    /// history, pooled sd, Monte Carlo.
    pub fn forecast_with_strategy(
        &self,
        subjects: &SubjectMap,
        target: f64,
        days: f64,
        config: &SimulationConfig,
        strategy: ProjectionStrategy,
    ) -> Forecast {
        let readiness = readiness(subjects);
        if readiness != ForecastReadiness::Ready {
            return Forecast::Waiting { readiness };
        }

        let per_subject = self.subject_stats(subjects);
        let stats: Vec<SubjectStats> = per_subject.values().cloned().collect();
        let pooled = self.pooled_estimate(&stats, days);

        let series = global_history(subjects);
        let projected = strategy.model(&stats, &series).project(days);
        let volatility = match strategy {
            ProjectionStrategy::Regression => Some(regression::adaptive_fit(&series).volatility),
            ProjectionStrategy::Weighted => None,
        };

        let mut outcome = simulate_normal(projected, pooled.pooled_sd, target, config);
        outcome.projected_mean = Some(projected);
        outcome.projected_sd = Some(pooled.pooled_sd);
        outcome.volatility = volatility;

        Forecast::Ready(ForecastReport {
            outcome,
            pooled,
            per_subject,
        })
    }

    /// One simulation per subject, in parallel.
    ///
    /// Sub-seeds are derived per subject name from the master seed, so the
    /// result is identical however rayon schedules the work.
    pub fn simulate_subjects(
        &self,
        subjects: &SubjectMap,
        target: f64,
        days: f64,
        config: &SimulationConfig,
    ) -> BTreeMap<String, SimulationOutcome> {
        let hierarchy = SeedHierarchy::new(config.seed.unwrap_or_else(rand::random));
        subjects
            .par_iter()
            .filter(|(_, subject)| !subject.history.is_empty())
            .map(|(name, subject)| {
                let sub_config = SimulationConfig {
                    seed: Some(hierarchy.sub_seed(name)),
                    ..config.clone()
                };
                let outcome = simulate_history(&subject.history, target, days, &sub_config);
                (name.clone(), outcome)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ScoreRecord;
    use crate::stats::assert_approx;

    fn day(d: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap() + chrono::Duration::days(d)
    }

    fn subject(weight: f64, points: &[(i64, f64)]) -> SubjectHistory {
        SubjectHistory {
            weight,
            history: ScoreHistory::from_records(
                points
                    .iter()
                    .map(|&(d, s)| ScoreRecord {
                        date: day(d),
                        score: Some(s),
                        total: None,
                        correct: None,
                    })
                    .collect(),
            ),
        }
    }

    fn two_subject_map() -> SubjectMap {
        let mut subjects = SubjectMap::new();
        subjects.insert(
            "algebra".into(),
            subject(2.0, &[(0, 60.0), (3, 65.0), (6, 70.0)]),
        );
        subjects.insert(
            "biology".into(),
            subject(1.0, &[(1, 80.0), (4, 82.0), (7, 84.0)]),
        );
        subjects
    }

    // ── readiness ──

    #[test]
    fn readiness_counts_missing_points() {
        let mut subjects = SubjectMap::new();
        subjects.insert("algebra".into(), subject(1.0, &[(0, 70.0), (1, 75.0)]));
        assert_eq!(
            readiness(&subjects),
            ForecastReadiness::NeedMorePoints { missing: 3 }
        );
    }

    #[test]
    fn readiness_requires_distinct_dates() {
        let mut subjects = SubjectMap::new();
        subjects.insert(
            "algebra".into(),
            subject(1.0, &[(0, 70.0), (0, 72.0), (0, 68.0), (0, 74.0), (0, 71.0)]),
        );
        assert_eq!(
            readiness(&subjects),
            ForecastReadiness::NeedMoreDays { missing: 1 }
        );
    }

    #[test]
    fn readiness_ready() {
        assert_eq!(readiness(&two_subject_map()), ForecastReadiness::Ready);
    }

    #[test]
    fn readiness_ignores_malformed_records() {
        let mut subjects = SubjectMap::new();
        let mut s = subject(1.0, &[]);
        for d in 0..5 {
            s.history.push(ScoreRecord {
                date: day(d),
                score: None,
                total: None,
                correct: None,
            });
        }
        subjects.insert("algebra".into(), s);
        assert_eq!(
            readiness(&subjects),
            ForecastReadiness::NeedMorePoints { missing: 5 }
        );
    }

    // ── global_history ──

    #[test]
    fn global_history_single_subject_tracks_scores() {
        let mut subjects = SubjectMap::new();
        subjects.insert("algebra".into(), subject(2.0, &[(0, 60.0), (5, 70.0)]));
        let series = global_history(&subjects);
        assert_eq!(series, vec![(day(0), 60.0), (day(5), 70.0)]);
    }

    #[test]
    fn global_history_uses_subjects_seen_so_far() {
        let mut subjects = SubjectMap::new();
        subjects.insert("algebra".into(), subject(1.0, &[(0, 60.0)]));
        subjects.insert("biology".into(), subject(1.0, &[(2, 90.0)]));
        let series = global_history(&subjects);

        // Day 0: only algebra known. Day 2: both, equal weights.
        assert_eq!(series.len(), 2);
        assert_approx(series[0].1, 60.0, 1e-12);
        assert_approx(series[1].1, 75.0, 1e-12);
    }

    #[test]
    fn global_history_carries_latest_score_forward() {
        let mut subjects = SubjectMap::new();
        subjects.insert("algebra".into(), subject(1.0, &[(0, 60.0), (4, 80.0)]));
        subjects.insert("biology".into(), subject(3.0, &[(2, 40.0)]));
        let series = global_history(&subjects);

        assert_eq!(series.len(), 3);
        // Day 2: algebra 60 (w1) + biology 40 (w3) → 45.
        assert_approx(series[1].1, 45.0, 1e-12);
        // Day 4: algebra updates to 80; biology still 40 → 50.
        assert_approx(series[2].1, 50.0, 1e-12);
    }

    #[test]
    fn global_history_one_point_per_distinct_date() {
        let series = global_history(&two_subject_map());
        let mut dates: Vec<NaiveDate> = series.iter().map(|&(d, _)| d).collect();
        let before = dates.len();
        dates.dedup();
        assert_eq!(before, dates.len());
        assert!(series.windows(2).all(|w| w[0].0 < w[1].0));
    }

    // ── Forecaster ──

    #[test]
    fn forecast_waits_without_data() {
        let forecaster = Forecaster::new();
        let forecast = forecaster.forecast(
            &SubjectMap::new(),
            80.0,
            30.0,
            &SimulationConfig::default(),
        );
        assert_eq!(
            forecast,
            Forecast::Waiting {
                readiness: ForecastReadiness::NeedMorePoints { missing: 5 }
            }
        );
    }

    #[test]
    fn forecast_ready_end_to_end() {
        let forecaster = Forecaster::new();
        let forecast = forecaster.forecast(
            &two_subject_map(),
            60.0,
            30.0,
            &SimulationConfig::default(),
        );
        let report = match forecast {
            Forecast::Ready(report) => report,
            other => panic!("expected ready forecast, got {other:?}"),
        };
        assert_eq!(report.per_subject.len(), 2);
        assert!(report.pooled.total_weight > 0.0);
        assert!(report.pooled.pooled_sd > 0.0);
        assert!(report.outcome.probability > 1.0);
        assert!(report.outcome.projected_mean.is_some());
    }

    #[test]
    fn forecast_is_deterministic() {
        let forecaster = Forecaster::new();
        let subjects = two_subject_map();
        let config = SimulationConfig::default();
        let a = forecaster.forecast(&subjects, 70.0, 30.0, &config);
        let b = forecaster.forecast(&subjects, 70.0, 30.0, &config);
        assert_eq!(a, b);
    }

    #[test]
    fn weighted_strategy_projects_from_subject_means() {
        let forecaster = Forecaster::new();
        let subjects = two_subject_map();
        let config = SimulationConfig::default();

        let forecast = forecaster.forecast_with_strategy(
            &subjects,
            60.0,
            30.0,
            &config,
            ProjectionStrategy::Weighted,
        );
        let report = match forecast {
            Forecast::Ready(report) => report,
            other => panic!("expected ready forecast, got {other:?}"),
        };
        // The weighted path reports no regression volatility.
        assert_eq!(report.outcome.volatility, None);
        let projected = report.outcome.projected_mean.unwrap();
        assert!(projected > 0.0 && projected <= 100.0);
    }

    #[test]
    fn subject_stats_skips_empty_histories() {
        let forecaster = Forecaster::new();
        let mut subjects = two_subject_map();
        subjects.insert("chemistry".into(), subject(1.0, &[]));
        let stats = forecaster.subject_stats(&subjects);
        assert_eq!(stats.len(), 2);
        assert!(!stats.contains_key("chemistry"));
    }

    #[test]
    fn simulate_subjects_is_deterministic_and_per_subject() {
        let forecaster = Forecaster::new();
        let subjects = two_subject_map();
        let config = SimulationConfig::default();

        let a = forecaster.simulate_subjects(&subjects, 70.0, 30.0, &config);
        let b = forecaster.simulate_subjects(&subjects, 70.0, 30.0, &config);
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);

        // Different subjects get different sub-seeds, so their outcomes
        // are not copies of each other.
        assert_ne!(a["algebra"], a["biology"]);
    }
}
