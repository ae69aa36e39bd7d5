//! Error taxonomy for the analysis pipeline.
//!
//! Every error is fatal: the run aborts with a diagnostic, there is no
//! retry or partial-result path.

use std::path::PathBuf;
use thiserror::Error;

/// Failures surfaced by the loading, evaluation, and testing stages.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// No run directory under the output root matches `<dataset>-*`.
    #[error("no run directories for dataset '{dataset}' under {root:?}")]
    NoRuns { dataset: String, root: PathBuf },

    /// A run directory name could not be split into dataset and algorithm.
    #[error("run directory name '{name}' does not match <dataset>-<algorithm>")]
    BadRunName { name: String },

    /// A run directory holds no files for the requested category.
    #[error("run directory {dir:?} has no files matching '{pattern}*'")]
    NoDataFiles { dir: PathBuf, pattern: &'static str },

    /// No test split files exist for the dataset.
    #[error("no test split files for dataset '{dataset}' under {root:?}")]
    NoSplitFiles { dataset: String, root: PathBuf },

    #[error("failed to read {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file exists but does not parse as the expected tabular schema.
    #[error("failed to parse {path:?}")]
    Parse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A file parsed but lacks a required column combination.
    #[error("{path:?} is missing required columns ({required})")]
    Schema {
        path: PathBuf,
        required: &'static str,
    },

    /// A user carries recommendations but no ground-truth items, so no
    /// metric is defined for the pair.
    #[error("user {user} has recommendations from '{algorithm}' but no ground-truth items")]
    MissingGroundTruth { user: u64, algorithm: String },

    /// The omnibus test needs more algorithms than were evaluated.
    #[error("omnibus test requires at least {required} algorithms, found {found}")]
    InsufficientGroups { found: usize, required: usize },

    /// Per-algorithm score vectors do not line up over the same users.
    #[error("score vectors are misaligned: {details}")]
    MisalignedGroups { details: String },
}
