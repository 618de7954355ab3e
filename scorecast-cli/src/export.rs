//! CSV export of per-subject statistics.

use std::collections::BTreeMap;
use std::path::Path;

use thiserror::Error;

use scorecast_core::{SubjectStats, Trend};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("cannot write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("csv error for {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
}

fn trend_label(trend: Trend) -> &'static str {
    match trend {
        Trend::Up => "up",
        Trend::Down => "down",
        Trend::Stable => "stable",
    }
}

/// Write one row per subject: name, weight, n, mean, sd, trend, trend_value.
pub fn write_stats_csv(
    path: &Path,
    stats: &BTreeMap<String, SubjectStats>,
) -> Result<(), ExportError> {
    let display = path.display().to_string();
    let mut writer = csv::Writer::from_path(path).map_err(|source| ExportError::Csv {
        path: display.clone(),
        source,
    })?;

    writer
        .write_record(["subject", "weight", "n", "mean", "sd", "trend", "trend_value"])
        .map_err(|source| ExportError::Csv {
            path: display.clone(),
            source,
        })?;

    for (name, s) in stats {
        writer
            .write_record([
                name.as_str(),
                &format!("{}", s.weight),
                &format!("{}", s.n),
                &format!("{:.2}", s.mean),
                &format!("{:.2}", s.sd),
                trend_label(s.trend),
                &format!("{:.2}", s.trend_value),
            ])
            .map_err(|source| ExportError::Csv {
                path: display.clone(),
                source,
            })?;
    }

    writer.flush().map_err(|source| ExportError::Io {
        path: display,
        source,
    })
}
