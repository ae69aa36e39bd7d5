//! Input loading for evaluation runs
//!
//! Discovers per-algorithm run directories for a dataset, reads their
//! recommendation and prediction files, and reads the held-out test split.
//!
//! ## Filesystem layout consumed
//!
//! ```text
//! <runs-root>/<dataset>-<algorithm>[-suffix]/recs-*.csv
//! <runs-root>/<dataset>-<algorithm>[-suffix]/pred-*.csv
//! <splits-root>/<dataset>/test-*.csv
//! ```

pub mod loader;

pub use loader::{
    data_files, discover_runs, load_ground_truth, load_predictions, load_recommendations,
    GroundTruthRecord, PredictionRecord, RecommendationRecord, RunDir, RunId, PRED_FILE_PREFIX,
    REC_FILE_PREFIX, SPLIT_FILE_PREFIX,
};
