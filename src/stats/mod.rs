//! Statistical comparison of algorithms
//!
//! For one metric's aligned per-algorithm score vectors: a Friedman
//! omnibus test decides whether any algorithms differ at all; only when it
//! rejects are all pairwise Wilcoxon signed-rank tests run, with the
//! significance threshold Bonferroni-adjusted for the number of pairs.
//!
//! Raw pairwise p-values are reported next to the adjusted threshold;
//! p-values are never multiplied by the comparison count.

pub mod rank_tests;

pub use rank_tests::{
    average_ranks, friedman_test, wilcoxon_signed_rank, FriedmanResult, WilcoxonResult,
};

use std::collections::BTreeMap;

use crate::error::AnalysisError;

/// Hypothesis-test verdict for one pair of algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Fail to reject the null hypothesis
    Same,
    /// Reject the null hypothesis
    Different,
}

impl Decision {
    pub fn text(&self) -> &'static str {
        match self {
            Self::Same => "Same distributions (fail to reject H0)",
            Self::Different => "Different distributions (reject H0)",
        }
    }
}

/// One pairwise post-hoc comparison
#[derive(Debug, Clone)]
pub struct PairwiseComparison {
    pub first: String,
    pub second: String,
    pub statistic: f64,
    /// Raw (unadjusted) p-value
    pub p_value: f64,
    pub decision: Decision,
}

/// Outcome of the full comparison workflow for one metric
#[derive(Debug, Clone)]
pub enum SignificanceReport {
    /// Fewer than two algorithms present, nothing to compare
    NotComparable { algorithms: usize },
    /// The omnibus test did not reject; no post-hoc tests were run
    NoDifference { omnibus: FriedmanResult },
    /// The omnibus test rejected; every pair was tested post hoc
    PairwiseBreakdown {
        omnibus: FriedmanResult,
        adjusted_alpha: f64,
        comparisons: Vec<PairwiseComparison>,
    },
}

/// Bonferroni-adjusted significance threshold for m comparisons.
pub fn bonferroni_alpha(alpha: f64, comparisons: usize) -> f64 {
    alpha / comparisons as f64
}

/// Run the omnibus-then-post-hoc comparison over aligned score vectors.
///
/// Pairs are enumerated in lexicographic key order; each comparison keeps
/// its raw p-value and the decision against the adjusted threshold.
pub fn compare_algorithms(
    scores: &BTreeMap<String, Vec<f64>>,
    alpha: f64,
) -> Result<SignificanceReport, AnalysisError> {
    if scores.len() < 2 {
        return Ok(SignificanceReport::NotComparable {
            algorithms: scores.len(),
        });
    }

    let groups: Vec<&[f64]> = scores.values().map(|v| v.as_slice()).collect();
    let omnibus = friedman_test(&groups)?;

    if omnibus.p_value >= alpha {
        return Ok(SignificanceReport::NoDifference { omnibus });
    }

    let names: Vec<&String> = scores.keys().collect();
    let pair_count = names.len() * (names.len() - 1) / 2;
    let adjusted_alpha = bonferroni_alpha(alpha, pair_count);

    let mut comparisons = Vec::with_capacity(pair_count);
    for i in 0..names.len() {
        for j in (i + 1)..names.len() {
            let result = wilcoxon_signed_rank(&scores[names[i]], &scores[names[j]])?;
            let decision = if result.p_value < adjusted_alpha {
                Decision::Different
            } else {
                Decision::Same
            };
            comparisons.push(PairwiseComparison {
                first: names[i].clone(),
                second: names[j].clone(),
                statistic: result.statistic,
                p_value: result.p_value,
                decision,
            });
        }
    }

    Ok(SignificanceReport::PairwiseBreakdown {
        omnibus,
        adjusted_alpha,
        comparisons,
    })
}
