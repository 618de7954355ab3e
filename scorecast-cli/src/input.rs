//! Input files: subjects JSON and optional TOML settings.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use scorecast_core::{
    GeneratorKind, ScoreHistory, ScoreRecord, SimulationConfig, SubjectHistory, SubjectMap,
};

/// Errors from loading input files.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid TOML in {path}: {source}")]
    Toml {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("{path} contains no subjects")]
    NoSubjects { path: String },
    #[error("subject '{name}' has invalid weight {weight}")]
    InvalidWeight { name: String, weight: f64 },
}

// ─── Subjects file ───────────────────────────────────────────────────

/// On-disk subjects schema:
/// `{ "subjects": { name: { "weight": 2.0, "records": [...] } } }`
#[derive(Debug, Deserialize)]
struct SubjectsFile {
    subjects: BTreeMap<String, SubjectEntry>,
}

#[derive(Debug, Deserialize)]
struct SubjectEntry {
    #[serde(default = "default_weight")]
    weight: f64,
    #[serde(default)]
    records: Vec<ScoreRecord>,
}

fn default_weight() -> f64 {
    1.0
}

/// Load and validate a subjects JSON file.
pub fn load_subjects(path: &Path) -> Result<SubjectMap, InputError> {
    let display = path.display().to_string();
    let text = std::fs::read_to_string(path).map_err(|source| InputError::Io {
        path: display.clone(),
        source,
    })?;
    let file: SubjectsFile = serde_json::from_str(&text).map_err(|source| InputError::Json {
        path: display.clone(),
        source,
    })?;

    if file.subjects.is_empty() {
        return Err(InputError::NoSubjects { path: display });
    }

    let mut subjects = SubjectMap::new();
    for (name, entry) in file.subjects {
        if !entry.weight.is_finite() || entry.weight < 0.0 {
            return Err(InputError::InvalidWeight {
                name,
                weight: entry.weight,
            });
        }
        subjects.insert(
            name,
            SubjectHistory {
                weight: entry.weight,
                history: ScoreHistory::from_records(entry.records),
            },
        );
    }
    Ok(subjects)
}

// ─── Settings file ───────────────────────────────────────────────────

/// Optional TOML settings: simulation parameters and weight overrides.
///
/// ```toml
/// [simulation]
/// seed = 42
/// simulations = 2000
/// generator = "LCG"
///
/// [weights]
/// algebra = 3.0
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub simulation: SimulationSettings,
    #[serde(default)]
    pub weights: BTreeMap<String, f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SimulationSettings {
    pub seed: Option<u64>,
    pub simulations: Option<usize>,
    pub generator: Option<GeneratorKind>,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, InputError> {
        let display = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| InputError::Io {
            path: display.clone(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| InputError::Toml {
            path: display,
            source,
        })
    }

    /// Build a simulation config, with CLI flags taking precedence over
    /// the settings file, and the settings file over defaults.
    pub fn simulation_config(
        &self,
        seed_flag: Option<u64>,
        simulations_flag: Option<usize>,
    ) -> SimulationConfig {
        let defaults = SimulationConfig::default();
        SimulationConfig {
            seed: seed_flag.or(self.simulation.seed).or(defaults.seed),
            simulations: simulations_flag
                .or(self.simulation.simulations)
                .unwrap_or(defaults.simulations),
            generator: self.simulation.generator.unwrap_or(defaults.generator),
        }
    }

    /// Apply `[weights]` overrides to loaded subjects. Unknown subject
    /// names are ignored.
    pub fn apply_weights(&self, subjects: &mut SubjectMap) {
        for (name, &weight) in &self.weights {
            if let Some(subject) = subjects.get_mut(name) {
                if weight.is_finite() && weight >= 0.0 {
                    subject.weight = weight;
                }
            }
        }
    }
}
