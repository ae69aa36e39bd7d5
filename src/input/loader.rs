//! Run discovery and CSV table loading.
//!
//! Everything here is purely functional given the filesystem contents:
//! identical inputs yield identical tables (ignoring row order). Any
//! unreadable or schema-invalid file aborts the load for its category;
//! partial results are never returned.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AnalysisError;

/// File-name prefix for recommendation list files inside a run directory
pub const REC_FILE_PREFIX: &str = "recs";

/// File-name prefix for rating prediction files inside a run directory
pub const PRED_FILE_PREFIX: &str = "pred";

/// File-name prefix for held-out test split files
pub const SPLIT_FILE_PREFIX: &str = "test";

/// Identity of one algorithm run, parsed once from the directory name and
/// carried as structured fields from then on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunId {
    pub dataset: String,
    pub algorithm: String,
}

impl RunId {
    /// Parse a run directory name of the form `<dataset>-<algorithm>[-suffix]`.
    ///
    /// The caller supplies the dataset it filtered on, so the algorithm is
    /// the first `-`-separated segment after the `<dataset>-` prefix. This
    /// stays well-defined when the dataset id itself contains the delimiter.
    pub fn parse(name: &str, dataset: &str) -> Result<Self, AnalysisError> {
        let prefix = format!("{dataset}-");
        let rest = name
            .strip_prefix(&prefix)
            .ok_or_else(|| AnalysisError::BadRunName {
                name: name.to_string(),
            })?;
        let algorithm = rest.split('-').next().unwrap_or_default();
        if algorithm.is_empty() {
            return Err(AnalysisError::BadRunName {
                name: name.to_string(),
            });
        }
        Ok(Self {
            dataset: dataset.to_string(),
            algorithm: algorithm.to_string(),
        })
    }
}

/// A discovered run directory
#[derive(Debug, Clone)]
pub struct RunDir {
    pub id: RunId,
    pub path: PathBuf,
}

/// One row of a top-N recommendation list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationRecord {
    pub dataset: String,
    pub algorithm: String,
    pub user: u64,
    pub item: u64,
    /// 1-indexed position in the list
    pub rank: u32,
    pub score: Option<f64>,
}

/// One row of a rating prediction file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRecord {
    pub dataset: String,
    pub algorithm: String,
    pub user: u64,
    pub item: u64,
    pub prediction: f64,
}

/// One row of the held-out test split
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundTruthRecord {
    pub user: u64,
    pub item: u64,
    pub rating: f64,
}

/// Raw recommendation row as it appears on disk. Either `rank` or `score`
/// must be present; ranks are derived from scores when absent.
#[derive(Debug, Deserialize)]
struct RawRecRow {
    user: u64,
    item: u64,
    #[serde(default)]
    rank: Option<u32>,
    #[serde(default)]
    score: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawPredRow {
    user: u64,
    item: u64,
    prediction: f64,
}

/// Enumerate every run directory for a dataset under the runs root.
///
/// Directories are matched on the `<dataset>-` name prefix and returned
/// sorted by algorithm so downstream output is deterministic.
pub fn discover_runs(runs_root: &Path, dataset: &str) -> Result<Vec<RunDir>, AnalysisError> {
    let prefix = format!("{dataset}-");
    let entries = fs::read_dir(runs_root).map_err(|e| AnalysisError::Io {
        path: runs_root.to_path_buf(),
        source: e,
    })?;

    let mut runs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| AnalysisError::Io {
            path: runs_root.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(n) => n.to_string(),
            None => continue,
        };
        if !name.starts_with(&prefix) {
            continue;
        }
        let id = RunId::parse(&name, dataset)?;
        runs.push(RunDir { id, path });
    }

    if runs.is_empty() {
        return Err(AnalysisError::NoRuns {
            dataset: dataset.to_string(),
            root: runs_root.to_path_buf(),
        });
    }
    runs.sort_by(|a, b| a.id.algorithm.cmp(&b.id.algorithm));
    Ok(runs)
}

/// List the files in a run directory matching a name prefix, sorted by name.
///
/// Zero matches is a load failure, not an empty table.
pub fn data_files(dir: &Path, prefix: &'static str) -> Result<Vec<PathBuf>, AnalysisError> {
    let entries = fs::read_dir(dir).map_err(|e| AnalysisError::Io {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| AnalysisError::Io {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with(prefix))
            .unwrap_or(false);
        if matches {
            files.push(path);
        }
    }

    if files.is_empty() {
        return Err(AnalysisError::NoDataFiles {
            dir: dir.to_path_buf(),
            pattern: prefix,
        });
    }
    files.sort();
    Ok(files)
}

/// Read all recommendation list files for the given runs into one table.
pub fn load_recommendations(runs: &[RunDir]) -> Result<Vec<RecommendationRecord>, AnalysisError> {
    let mut records = Vec::new();
    for run in runs {
        for path in data_files(&run.path, REC_FILE_PREFIX)? {
            let rows: Vec<RawRecRow> = read_rows(&path)?;
            records.extend(rank_rows(rows, &run.id, &path)?);
        }
    }
    Ok(records)
}

/// Read all rating prediction files for the given runs into one table.
pub fn load_predictions(runs: &[RunDir]) -> Result<Vec<PredictionRecord>, AnalysisError> {
    let mut records = Vec::new();
    for run in runs {
        for path in data_files(&run.path, PRED_FILE_PREFIX)? {
            let rows: Vec<RawPredRow> = read_rows(&path)?;
            records.extend(rows.into_iter().map(|r| PredictionRecord {
                dataset: run.id.dataset.clone(),
                algorithm: run.id.algorithm.clone(),
                user: r.user,
                item: r.item,
                prediction: r.prediction,
            }));
        }
    }
    Ok(records)
}

/// Read every test split file for a dataset and concatenate into one table.
pub fn load_ground_truth(
    splits_root: &Path,
    dataset: &str,
) -> Result<Vec<GroundTruthRecord>, AnalysisError> {
    let dir = splits_root.join(dataset);
    if !dir.is_dir() {
        return Err(AnalysisError::NoSplitFiles {
            dataset: dataset.to_string(),
            root: splits_root.to_path_buf(),
        });
    }

    let files = match data_files(&dir, SPLIT_FILE_PREFIX) {
        Ok(files) => files,
        Err(AnalysisError::NoDataFiles { .. }) => {
            return Err(AnalysisError::NoSplitFiles {
                dataset: dataset.to_string(),
                root: splits_root.to_path_buf(),
            })
        }
        Err(e) => return Err(e),
    };

    let mut records = Vec::new();
    for path in files {
        let rows: Vec<GroundTruthRecord> = read_rows(&path)?;
        records.extend(rows);
    }
    Ok(records)
}

/// Deserialize every row of a headed CSV file.
fn read_rows<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>, AnalysisError> {
    let file = fs::File::open(path).map_err(|e| AnalysisError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut rows = Vec::new();
    for row in reader.deserialize() {
        let row: T = row.map_err(|e| AnalysisError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        rows.push(row);
    }
    Ok(rows)
}

/// Turn raw recommendation rows into records with definite ranks.
///
/// A file where every row carries a rank is taken as-is. Otherwise every
/// row must carry a score, and ranks are assigned per user by descending
/// score with ties broken by file order.
fn rank_rows(
    rows: Vec<RawRecRow>,
    id: &RunId,
    path: &Path,
) -> Result<Vec<RecommendationRecord>, AnalysisError> {
    let all_ranked = rows.iter().all(|r| r.rank.is_some());

    if all_ranked {
        return Ok(rows
            .into_iter()
            .map(|r| RecommendationRecord {
                dataset: id.dataset.clone(),
                algorithm: id.algorithm.clone(),
                user: r.user,
                item: r.item,
                rank: r.rank.unwrap_or(0),
                score: r.score,
            })
            .collect());
    }

    if rows.iter().any(|r| r.score.is_none()) {
        return Err(AnalysisError::Schema {
            path: path.to_path_buf(),
            required: "user, item, and rank or score",
        });
    }

    // Rank by descending score within each user, stable over file order
    let mut by_user: HashMap<u64, Vec<usize>> = HashMap::new();
    for (idx, row) in rows.iter().enumerate() {
        by_user.entry(row.user).or_default().push(idx);
    }

    let mut ranks = vec![0u32; rows.len()];
    for indices in by_user.values_mut() {
        indices.sort_by(|&a, &b| {
            rows[b]
                .score
                .partial_cmp(&rows[a].score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        for (pos, &idx) in indices.iter().enumerate() {
            ranks[idx] = pos as u32 + 1;
        }
    }

    Ok(rows
        .into_iter()
        .enumerate()
        .map(|(idx, r)| RecommendationRecord {
            dataset: id.dataset.clone(),
            algorithm: id.algorithm.clone(),
            user: r.user,
            item: r.item,
            rank: ranks[idx],
            score: r.score,
        })
        .collect())
}
