//! Non-parametric rank tests
//!
//! Friedman's test for k related samples and the Wilcoxon signed-rank test
//! for paired samples. Both rank with midranks for ties and apply the
//! standard tie corrections; p-values come from the statrs chi-square and
//! normal distributions.

use statrs::distribution::{ChiSquared, ContinuousCDF, Normal};
use std::cmp::Ordering;

use crate::error::AnalysisError;

/// Outcome of the Friedman omnibus test
#[derive(Debug, Clone, Copy)]
pub struct FriedmanResult {
    pub statistic: f64,
    pub p_value: f64,
}

/// Outcome of a Wilcoxon signed-rank test
#[derive(Debug, Clone, Copy)]
pub struct WilcoxonResult {
    /// min(W+, W-) over the nonzero differences
    pub statistic: f64,
    /// Two-sided p-value from the normal approximation
    pub p_value: f64,
    /// Pairs remaining after zero differences are dropped
    pub pairs_used: usize,
}

/// Rank a slice ascending, assigning tied values their average rank.
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| {
        values[a]
            .partial_cmp(&values[b])
            .unwrap_or(Ordering::Equal)
    });

    let mut ranks = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        let average = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = average;
        }
        i = j + 1;
    }
    ranks
}

/// Sum of t^3 - t over the tie groups of a slice.
fn tie_term(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let mut term = 0.0;
    let mut i = 0;
    while i < sorted.len() {
        let mut j = i;
        while j + 1 < sorted.len() && sorted[j + 1] == sorted[i] {
            j += 1;
        }
        let t = (j - i + 1) as f64;
        term += t * t * t - t;
        i = j + 1;
    }
    term
}

/// Friedman test over k related samples of equal length.
///
/// The null hypothesis is that all groups' score distributions are
/// identical. Requires k >= 3 groups; vectors must be aligned over the
/// same ordered observation set. When every observation in every block is
/// tied the test is degenerate and reported as statistic 0, p-value 1.
pub fn friedman_test(groups: &[&[f64]]) -> Result<FriedmanResult, AnalysisError> {
    let k = groups.len();
    if k < 3 {
        return Err(AnalysisError::InsufficientGroups {
            found: k,
            required: 3,
        });
    }
    let n = groups[0].len();
    for group in groups {
        if group.len() != n {
            return Err(AnalysisError::MisalignedGroups {
                details: format!("group lengths {} and {n} differ", group.len()),
            });
        }
    }
    if n == 0 {
        return Err(AnalysisError::MisalignedGroups {
            details: "score vectors are empty".to_string(),
        });
    }

    let kf = k as f64;
    let nf = n as f64;

    let mut rank_sums = vec![0.0; k];
    let mut ties = 0.0;
    for block_idx in 0..n {
        let block: Vec<f64> = groups.iter().map(|g| g[block_idx]).collect();
        let ranks = average_ranks(&block);
        for (group_idx, rank) in ranks.iter().enumerate() {
            rank_sums[group_idx] += rank;
        }
        ties += tie_term(&block);
    }

    let correction = 1.0 - ties / (nf * kf * (kf * kf - 1.0));
    if correction <= 0.0 {
        return Ok(FriedmanResult {
            statistic: 0.0,
            p_value: 1.0,
        });
    }

    let ssbn: f64 = rank_sums.iter().map(|r| r * r).sum();
    let statistic =
        ((12.0 / (nf * kf * (kf + 1.0))) * ssbn - 3.0 * nf * (kf + 1.0)) / correction;
    let statistic = statistic.max(0.0);

    let p_value = match ChiSquared::new(kf - 1.0) {
        Ok(dist) => dist.sf(statistic).clamp(0.0, 1.0),
        Err(_) => 1.0,
    };

    Ok(FriedmanResult { statistic, p_value })
}

/// Wilcoxon signed-rank test over two paired samples.
///
/// Zero differences are dropped per the standard definition; remaining
/// absolute differences are midranked, and the statistic is min(W+, W-).
/// With no nonzero differences the samples are indistinguishable and the
/// result is statistic 0, p-value 1.
pub fn wilcoxon_signed_rank(x: &[f64], y: &[f64]) -> Result<WilcoxonResult, AnalysisError> {
    if x.len() != y.len() {
        return Err(AnalysisError::MisalignedGroups {
            details: format!("paired samples of length {} and {}", x.len(), y.len()),
        });
    }

    let diffs: Vec<f64> = x
        .iter()
        .zip(y)
        .map(|(a, b)| a - b)
        .filter(|d| *d != 0.0)
        .collect();
    let n = diffs.len();
    if n == 0 {
        return Ok(WilcoxonResult {
            statistic: 0.0,
            p_value: 1.0,
            pairs_used: 0,
        });
    }

    let magnitudes: Vec<f64> = diffs.iter().map(|d| d.abs()).collect();
    let ranks = average_ranks(&magnitudes);

    let w_plus: f64 = diffs
        .iter()
        .zip(&ranks)
        .filter(|(d, _)| **d > 0.0)
        .map(|(_, r)| r)
        .sum();
    let nf = n as f64;
    let total = nf * (nf + 1.0) / 2.0;
    let w_minus = total - w_plus;
    let statistic = w_plus.min(w_minus);

    let mean = total / 2.0;
    let variance = nf * (nf + 1.0) * (2.0 * nf + 1.0) / 24.0 - tie_term(&magnitudes) / 48.0;
    if variance <= 0.0 {
        return Ok(WilcoxonResult {
            statistic,
            p_value: 1.0,
            pairs_used: n,
        });
    }

    let z = (statistic - mean) / variance.sqrt();
    let p_value = match Normal::new(0.0, 1.0) {
        Ok(dist) => (2.0 * dist.cdf(z)).clamp(0.0, 1.0),
        Err(_) => 1.0,
    };

    Ok(WilcoxonResult {
        statistic,
        p_value,
        pairs_used: n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_ranks_no_ties() {
        let ranks = average_ranks(&[0.3, 0.1, 0.2]);
        assert_eq!(ranks, vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn test_average_ranks_with_ties() {
        let ranks = average_ranks(&[1.0, 2.0, 2.0, 3.0]);
        assert_eq!(ranks, vec![1.0, 2.5, 2.5, 4.0]);
    }

    #[test]
    fn test_friedman_requires_three_groups() {
        let a = [1.0, 2.0];
        let b = [2.0, 1.0];
        let err = friedman_test(&[&a, &b]).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::InsufficientGroups {
                found: 2,
                required: 3
            }
        ));
    }

    #[test]
    fn test_friedman_rejects_mismatched_lengths() {
        let a = [1.0, 2.0];
        let b = [2.0, 1.0];
        let c = [1.0];
        let err = friedman_test(&[&a, &b, &c]).unwrap_err();
        assert!(matches!(err, AnalysisError::MisalignedGroups { .. }));
    }

    #[test]
    fn test_friedman_identical_groups() {
        let scores = [0.4, 0.6, 0.5, 0.7];
        let result = friedman_test(&[&scores, &scores, &scores]).unwrap();
        assert_eq!(result.statistic, 0.0);
        assert_eq!(result.p_value, 1.0);
    }

    #[test]
    fn test_friedman_separated_groups() {
        let high = [1.0; 8];
        let low = [0.0; 8];
        let mid = [0.5; 8];
        let result = friedman_test(&[&high, &low, &mid]).unwrap();
        // Constant rank order in every block: statistic is 2n
        assert!((result.statistic - 16.0).abs() < 1e-9);
        assert!(result.p_value < 0.05);
    }

    #[test]
    fn test_wilcoxon_identical_samples() {
        let scores = [0.1, 0.2, 0.3];
        let result = wilcoxon_signed_rank(&scores, &scores).unwrap();
        assert_eq!(result.pairs_used, 0);
        assert_eq!(result.statistic, 0.0);
        assert_eq!(result.p_value, 1.0);
    }

    #[test]
    fn test_wilcoxon_symmetric_differences() {
        let x = [1.0, 2.0, 3.0];
        let y = [3.0, 1.0, 2.0];
        // Differences -2, +1, +1: W+ equals W-, no evidence either way
        let result = wilcoxon_signed_rank(&x, &y).unwrap();
        assert_eq!(result.pairs_used, 3);
        assert!((result.p_value - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_wilcoxon_one_sided_dominance() {
        let x: Vec<f64> = (1..=20).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| v - 1.0).collect();
        let result = wilcoxon_signed_rank(&x, &y).unwrap();
        assert_eq!(result.statistic, 0.0);
        assert_eq!(result.pairs_used, 20);
        assert!(result.p_value < 0.05);
    }

    #[test]
    fn test_wilcoxon_drops_zero_differences() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [1.0, 2.0, 1.0, 2.0, 3.0];
        let result = wilcoxon_signed_rank(&x, &y).unwrap();
        assert_eq!(result.pairs_used, 3);
    }

    #[test]
    fn test_wilcoxon_rejects_mismatched_lengths() {
        let err = wilcoxon_signed_rank(&[1.0], &[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, AnalysisError::MisalignedGroups { .. }));
    }
}
