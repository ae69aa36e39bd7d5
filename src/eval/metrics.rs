//! Top-N accuracy metrics
//!
//! Each metric is a pure function from one user's ranked item list and that
//! user's ground-truth ratings to a single score.
//!
//! ## Metrics Overview
//!
//! - **precision**: fraction of the recommended items that are relevant
//! - **recip_rank**: 1/rank of the first relevant item (0 if none present)
//! - **ndcg**: normalized discounted cumulative gain over binary relevance

use std::collections::HashMap;

/// Ground-truth ratings for one user, keyed by item
pub type TruthRatings = HashMap<u64, f64>;

/// A pure metric over (ranked items, ground-truth ratings)
pub type MetricFn = fn(&[u64], &TruthRatings) -> f64;

/// A metric function with the name it is reported under
#[derive(Debug, Clone, Copy)]
pub struct NamedMetric {
    pub name: &'static str,
    pub func: MetricFn,
}

/// The registered metrics, in report order.
pub fn default_metrics() -> Vec<NamedMetric> {
    vec![
        NamedMetric {
            name: "precision",
            func: precision,
        },
        NamedMetric {
            name: "recip_rank",
            func: reciprocal_rank,
        },
        NamedMetric {
            name: "ndcg",
            func: ndcg,
        },
    ]
}

/// Fraction of recommended items present in the ground truth.
///
/// The denominator is the list length, so a relevant item at rank 1 in a
/// list of N contributes 1/N.
pub fn precision(items: &[u64], truth: &TruthRatings) -> f64 {
    if items.is_empty() {
        return 0.0;
    }
    let hits = items.iter().filter(|item| truth.contains_key(*item)).count();
    hits as f64 / items.len() as f64
}

/// 1/rank of the first relevant item. Returns 0 if none is present.
pub fn reciprocal_rank(items: &[u64], truth: &TruthRatings) -> f64 {
    items
        .iter()
        .position(|i| truth.contains_key(i))
        .map(|pos| 1.0 / (pos as f64 + 1.0))
        .unwrap_or(0.0)
}

/// Normalized DCG over binary relevance.
///
/// DCG sums `1/log2(rank+1)` for relevant items; the ideal DCG places all
/// `min(|truth|, list length)` relevant items at the top.
pub fn ndcg(items: &[u64], truth: &TruthRatings) -> f64 {
    if items.is_empty() || truth.is_empty() {
        return 0.0;
    }

    let dcg: f64 = items
        .iter()
        .enumerate()
        .filter(|(_, item)| truth.contains_key(*item))
        .map(|(pos, _)| 1.0 / (pos as f64 + 2.0).log2())
        .sum();

    let ideal_hits = truth.len().min(items.len());
    let idcg: f64 = (0..ideal_hits).map(|i| 1.0 / (i as f64 + 2.0).log2()).sum();

    if idcg == 0.0 {
        0.0
    } else {
        dcg / idcg
    }
}
