//! Error types for loading pedigrees and running inference.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HeredityError>;

/// Everything that can stop a run.
///
/// Inference is all-or-nothing: any of these aborts the whole run and no
/// partial distributions are returned.
#[derive(Debug, Error)]
pub enum HeredityError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV header is missing the `{0}` column")]
    MissingColumn(String),

    #[error("individual `{0}` is listed more than once")]
    DuplicateIndividual(String),

    #[error("individual `{name}` has a {known} but no {missing}; give both parents or neither")]
    HalfKnownParents {
        name: String,
        known: &'static str,
        missing: &'static str,
    },

    #[error("individual `{name}` references unknown parent `{parent}`")]
    UnknownParent { name: String, parent: String },

    #[error("pedigree contains a cycle through `{0}`")]
    CyclicPedigree(String),

    #[error("individual `{name}` has trait value `{value}`; expected 0, 1 or blank")]
    InvalidTrait { name: String, value: String },

    #[error("unknown individual `{0}`")]
    UnknownIndividual(String),

    #[error("individual `{0}` cannot have both one and two gene copies")]
    OverlappingGeneSets(String),

    #[error("population of {found} individuals exceeds the limit of {max}")]
    PopulationTooLarge { found: usize, max: usize },

    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("failed to parse model file {path}: {source}")]
    ModelParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("no consistent world found: evidence leaves zero probability for `{individual}`")]
    NoConsistentWorld { individual: String },

    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}
