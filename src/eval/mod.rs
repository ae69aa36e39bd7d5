//! Metric evaluation
//!
//! Computes one score per (algorithm, user) pair for every registered
//! metric. The result table covers the union of recommendation users and
//! ground-truth users: a user an algorithm produced nothing for still gets
//! a row with every metric at 0.0, which keeps the per-algorithm score
//! vectors aligned for the significance tests.

pub mod metrics;

pub use metrics::{default_metrics, MetricFn, NamedMetric, TruthRatings};

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::AnalysisError;
use crate::input::{GroundTruthRecord, PredictionRecord, RecommendationRecord};

/// Metric scores for one (algorithm, user) pair
#[derive(Debug, Clone, serde::Serialize)]
pub struct UserScores {
    pub algorithm: String,
    pub user: u64,
    /// One value per registered metric, in registry order
    pub values: Vec<f64>,
    /// Number of items the algorithm recommended for this user
    pub rec_count: usize,
    /// Number of ground-truth items held out for this user
    pub truth_count: usize,
}

/// The full metric result table
#[derive(Debug, Clone)]
pub struct MetricReport {
    pub metric_names: Vec<String>,
    pub rows: Vec<UserScores>,
}

/// Long-form row for charting: one (algorithm, user, metric) observation
#[derive(Debug, Clone, serde::Serialize)]
pub struct LongScore {
    pub algorithm: String,
    pub user: u64,
    pub metric: String,
    pub value: f64,
}

/// Per-user prediction error for one algorithm
#[derive(Debug, Clone, serde::Serialize)]
pub struct RmseScore {
    pub algorithm: String,
    pub user: u64,
    pub rmse: f64,
    /// Predictions that matched a ground-truth item
    pub prediction_count: usize,
}

/// Compute every registered metric for every (algorithm, user) pair.
///
/// A user present in ground truth but absent from an algorithm's lists gets
/// an explicit all-zero row. A user holding recommendations but no
/// ground-truth items is malformed input and aborts the run.
pub fn evaluate(
    recs: &[RecommendationRecord],
    truth: &[GroundTruthRecord],
    metrics: &[NamedMetric],
) -> Result<MetricReport, AnalysisError> {
    // Ranked item list per (algorithm, user)
    let mut lists: HashMap<&str, HashMap<u64, Vec<(u32, u64)>>> = HashMap::new();
    for rec in recs {
        lists
            .entry(rec.algorithm.as_str())
            .or_default()
            .entry(rec.user)
            .or_default()
            .push((rec.rank, rec.item));
    }
    for users in lists.values_mut() {
        for ranked in users.values_mut() {
            ranked.sort_by_key(|&(rank, _)| rank);
        }
    }

    let mut truth_by_user: HashMap<u64, TruthRatings> = HashMap::new();
    for row in truth {
        truth_by_user
            .entry(row.user)
            .or_default()
            .insert(row.item, row.rating);
    }

    let algorithms: BTreeSet<&str> = lists.keys().copied().collect();
    let mut users: BTreeSet<u64> = truth_by_user.keys().copied().collect();
    users.extend(lists.values().flat_map(|m| m.keys().copied()));

    let empty_truth = TruthRatings::new();
    let mut rows = Vec::with_capacity(algorithms.len() * users.len());

    for &algorithm in &algorithms {
        let user_lists = &lists[algorithm];
        for &user in &users {
            let items: Vec<u64> = user_lists
                .get(&user)
                .map(|ranked| ranked.iter().map(|&(_, item)| item).collect())
                .unwrap_or_default();
            let user_truth = truth_by_user.get(&user);

            if !items.is_empty() && user_truth.is_none() {
                return Err(AnalysisError::MissingGroundTruth {
                    user,
                    algorithm: algorithm.to_string(),
                });
            }
            let user_truth = user_truth.unwrap_or(&empty_truth);

            let values: Vec<f64> = if items.is_empty() {
                vec![0.0; metrics.len()]
            } else {
                metrics.iter().map(|m| (m.func)(&items, user_truth)).collect()
            };

            rows.push(UserScores {
                algorithm: algorithm.to_string(),
                user,
                values,
                rec_count: items.len(),
                truth_count: user_truth.len(),
            });
        }
    }

    Ok(MetricReport {
        metric_names: metrics.iter().map(|m| m.name.to_string()).collect(),
        rows,
    })
}

impl MetricReport {
    /// Distinct algorithm labels, sorted
    pub fn algorithms(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self.rows.iter().map(|r| r.algorithm.as_str()).collect();
        set.into_iter().map(str::to_string).collect()
    }

    fn metric_index(&self, metric: &str) -> Option<usize> {
        self.metric_names.iter().position(|n| n == metric)
    }

    /// Per-algorithm score vectors for one metric, aligned over the same
    /// ordered user set.
    ///
    /// Users are ordered ascending within each algorithm, so index i refers
    /// to the same user in every vector.
    pub fn aligned_scores(
        &self,
        metric: &str,
    ) -> Result<BTreeMap<String, Vec<f64>>, AnalysisError> {
        let idx = self
            .metric_index(metric)
            .ok_or_else(|| AnalysisError::MisalignedGroups {
                details: format!("unknown metric '{metric}'"),
            })?;

        let mut grouped: BTreeMap<String, Vec<(u64, f64)>> = BTreeMap::new();
        for row in &self.rows {
            grouped
                .entry(row.algorithm.clone())
                .or_default()
                .push((row.user, row.values[idx]));
        }

        let mut aligned = BTreeMap::new();
        let mut expected_len = None;
        for (algorithm, mut scores) in grouped {
            scores.sort_by_key(|&(user, _)| user);
            let vector: Vec<f64> = scores.into_iter().map(|(_, v)| v).collect();
            if let Some(len) = expected_len {
                if vector.len() != len {
                    return Err(AnalysisError::MisalignedGroups {
                        details: format!(
                            "'{algorithm}' covers {} users, expected {len}",
                            vector.len()
                        ),
                    });
                }
            } else {
                expected_len = Some(vector.len());
            }
            aligned.insert(algorithm, vector);
        }
        Ok(aligned)
    }

    /// Mean metric value per algorithm, sorted by algorithm
    pub fn mean_by_algorithm(&self, metric: &str) -> Vec<(String, f64)> {
        let idx = match self.metric_index(metric) {
            Some(idx) => idx,
            None => return Vec::new(),
        };
        let mut sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
        for row in &self.rows {
            let entry = sums.entry(row.algorithm.as_str()).or_default();
            entry.0 += row.values[idx];
            entry.1 += 1;
        }
        sums.into_iter()
            .map(|(alg, (sum, n))| (alg.to_string(), sum / n as f64))
            .collect()
    }

    /// Reshape into long form for charting
    pub fn to_long(&self) -> Vec<LongScore> {
        let mut long = Vec::with_capacity(self.rows.len() * self.metric_names.len());
        for row in &self.rows {
            for (idx, name) in self.metric_names.iter().enumerate() {
                long.push(LongScore {
                    algorithm: row.algorithm.clone(),
                    user: row.user,
                    metric: name.clone(),
                    value: row.values[idx],
                });
            }
        }
        long
    }
}

/// Per-user RMSE from predictions joined against ground truth.
///
/// Only predictions whose item appears in the user's ground truth
/// contribute; users with no overlap produce no row.
pub fn rmse_by_user(preds: &[PredictionRecord], truth: &[GroundTruthRecord]) -> Vec<RmseScore> {
    let mut truth_by_user: HashMap<u64, TruthRatings> = HashMap::new();
    for row in truth {
        truth_by_user
            .entry(row.user)
            .or_default()
            .insert(row.item, row.rating);
    }

    let mut squares: BTreeMap<(String, u64), (f64, usize)> = BTreeMap::new();
    for pred in preds {
        let rating = truth_by_user
            .get(&pred.user)
            .and_then(|items| items.get(&pred.item));
        if let Some(&rating) = rating {
            let entry = squares
                .entry((pred.algorithm.clone(), pred.user))
                .or_default();
            entry.0 += (pred.prediction - rating).powi(2);
            entry.1 += 1;
        }
    }

    squares
        .into_iter()
        .map(|((algorithm, user), (sum, n))| RmseScore {
            algorithm,
            user,
            rmse: (sum / n as f64).sqrt(),
            prediction_count: n,
        })
        .collect()
}

/// Mean of the per-user RMSE values per algorithm, sorted by algorithm
pub fn mean_rmse_by_algorithm(rows: &[RmseScore]) -> Vec<(String, f64)> {
    let mut sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for row in rows {
        let entry = sums.entry(row.algorithm.as_str()).or_default();
        entry.0 += row.rmse;
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(alg, (sum, n))| (alg.to_string(), sum / n as f64))
        .collect()
}
