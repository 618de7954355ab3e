//! Score records — the fundamental study-history data unit.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// One logged quiz or exam result for a single subject on a single day.
///
/// Either `score` is given directly (0-100), or it is derived from
/// `correct` / `total`. Records are immutable once stored; the only removal
/// operation is [`ScoreHistory::purge_date`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub date: NaiveDate,
    /// Percentage score. Accepts JSON numbers and numeric strings; anything
    /// unparseable deserializes as absent.
    #[serde(default, deserialize_with = "flexible_score")]
    pub score: Option<f64>,
    #[serde(default)]
    pub total: Option<u32>,
    #[serde(default)]
    pub correct: Option<u32>,
}

impl ScoreRecord {
    /// The usable percentage score: explicit `score`, else
    /// `correct / total * 100`, else 0.0 when `total` is missing or zero.
    /// Never panics.
    pub fn safe_score(&self) -> f64 {
        if let Some(score) = self.score {
            if score.is_finite() {
                return score;
            }
        }
        match (self.correct, self.total) {
            (Some(correct), Some(total)) if total > 0 => {
                correct as f64 / total as f64 * 100.0
            }
            _ => 0.0,
        }
    }

    /// Whether this record carries any usable score at all.
    ///
    /// Malformed entries (no score, no counts) are skipped by the
    /// statistics rather than dragged in as zeros.
    pub fn is_usable(&self) -> bool {
        matches!(self.score, Some(s) if s.is_finite())
            || matches!((self.correct, self.total), (Some(_), Some(t)) if t > 0)
    }
}

/// Accept a score as a JSON number or a numeric string.
///
/// Unparseable strings map to `None` (the record is treated as having no
/// explicit score) rather than failing the whole input.
fn flexible_score<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        None => None,
        Some(Raw::Number(value)) => Some(value),
        Some(Raw::Text(text)) => text.trim().parse::<f64>().ok(),
    })
}

/// Append-only sequence of score records for one subject.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreHistory {
    records: Vec<ScoreRecord>,
}

impl ScoreHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<ScoreRecord>) -> Self {
        Self { records }
    }

    pub fn push(&mut self, record: ScoreRecord) {
        self.records.push(record);
    }

    /// Remove every record logged on `date`. The only supported deletion.
    pub fn purge_date(&mut self, date: NaiveDate) {
        self.records.retain(|r| r.date != date);
    }

    pub fn records(&self) -> &[ScoreRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Usable records only, in caller insertion order.
    pub fn usable(&self) -> impl Iterator<Item = &ScoreRecord> {
        self.records.iter().filter(|r| r.is_usable())
    }

    /// Usable `(date, score)` pairs sorted by date.
    ///
    /// Callers may log results out of order; every trend and regression
    /// consumer works on this sorted view.
    pub fn dated_scores(&self) -> Vec<(NaiveDate, f64)> {
        let mut points: Vec<(NaiveDate, f64)> =
            self.usable().map(|r| (r.date, r.safe_score())).collect();
        points.sort_by_key(|&(date, _)| date);
        points
    }

    /// Usable scores sorted by date.
    pub fn sorted_scores(&self) -> Vec<f64> {
        self.dated_scores().into_iter().map(|(_, s)| s).collect()
    }
}
