//! Per-feature QC metrics.

use super::{fold_columns, validate_indices};
use crate::data::{ExpressionMatrix, IntoValue, Value};
use crate::error::QcResult;
use crate::runtime::QcConfig;

/// Per-feature metrics computed over one cell set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureSetStats {
    /// Total count per feature.
    pub sum: Vec<f64>,
    /// Number of cells above the detection limit per feature.
    pub detected: Vec<i32>,
}

impl FeatureSetStats {
    fn zeros(nfeatures: usize) -> Self {
        Self {
            sum: vec![0.0; nfeatures],
            detected: vec![0; nfeatures],
        }
    }

    /// Add one column, counted `weight` times.
    fn accumulate(&mut self, matrix: &ExpressionMatrix, col: usize, limit: f64, weight: i32) {
        let column = matrix.column(col);
        let zero_detected = 0.0 > limit;

        if zero_detected {
            // Every row starts detected; stored values at or below the limit undo it.
            for d in self.detected.iter_mut() {
                *d += weight;
            }
            for r in 0..column.len() {
                let v = column.get(r);
                self.sum[r] += v * weight as f64;
                if v <= limit {
                    self.detected[r] -= weight;
                }
            }
            return;
        }

        for (r, v) in column.nonzeros() {
            self.sum[r] += v * weight as f64;
            if v > limit {
                self.detected[r] += weight;
            }
        }
    }

    fn merge(mut self, other: Self) -> Self {
        for (a, b) in self.sum.iter_mut().zip(other.sum) {
            *a += b;
        }
        for (a, b) in self.detected.iter_mut().zip(other.detected) {
            *a += b;
        }
        self
    }
}

impl IntoValue for FeatureSetStats {
    fn into_value(self) -> Value {
        Value::named_list([
            ("sum", self.sum.into_value()),
            ("detected", self.detected.into_value()),
        ])
    }
}

/// Per-feature metrics for all cells and for each cell subset.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureQc {
    pub total: FeatureSetStats,
    pub subsets: Vec<FeatureSetStats>,
}

impl IntoValue for FeatureQc {
    fn into_value(self) -> Value {
        let subsets = Value::List(
            self.subsets
                .into_iter()
                .map(|s| (None, s.into_value()))
                .collect(),
        );
        Value::named_list([("total", self.total.into_value()), ("subsets", subsets)])
    }
}

/// Compute per-feature QC metrics.
///
/// `cell_subsets` hold 0-based column indices; a repeated index counts the
/// cell once per occurrence.
pub fn per_feature_qc(
    matrix: &ExpressionMatrix,
    cell_subsets: &[Vec<i32>],
    limit: Option<f64>,
    config: &QcConfig,
) -> QcResult<FeatureQc> {
    let limit = limit.unwrap_or(0.0);
    let (nfeatures, ncells) = (matrix.nrows(), matrix.ncols());
    let subsets = cell_subsets
        .iter()
        .map(|s| validate_indices(s, ncells, "cell subset"))
        .collect::<QcResult<Vec<_>>>()?;

    // Multiplicity of each cell in each subset, so one pass per column suffices.
    let mut weights = vec![vec![0i32; subsets.len()]; ncells];
    for (s, cells) in subsets.iter().enumerate() {
        for &c in cells {
            weights[c][s] += 1;
        }
    }

    let empty = || -> Vec<FeatureSetStats> {
        (0..=subsets.len())
            .map(|_| FeatureSetStats::zeros(nfeatures))
            .collect()
    };
    let mut sets = fold_columns(
        ncells,
        config,
        empty,
        |mut sets, c| {
            sets[0].accumulate(matrix, c, limit, 1);
            for (stats, &w) in sets[1..].iter_mut().zip(&weights[c]) {
                if w > 0 {
                    stats.accumulate(matrix, c, limit, w);
                }
            }
            sets
        },
        |a, b| a.into_iter().zip(b).map(|(x, y)| x.merge(y)).collect(),
    );

    let total = sets.remove(0);
    Ok(FeatureQc {
        total,
        subsets: sets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::CscMatrix;
    use ndarray::{array, Array2};

    fn counts() -> Array2<f64> {
        // 3 features x 4 cells
        array![
            [1.0, 0.0, 2.0, 0.0],
            [0.0, 0.0, 0.0, 0.0],
            [3.0, 1.0, 1.0, 5.0]
        ]
    }

    #[test]
    fn test_totals() {
        let m = ExpressionMatrix::from(counts());
        let qc = per_feature_qc(&m, &[], None, &QcConfig::default()).unwrap();
        assert_eq!(qc.total.sum, vec![3.0, 0.0, 10.0]);
        assert_eq!(qc.total.detected, vec![2, 0, 4]);
    }

    #[test]
    fn test_cell_subsets() {
        let m = ExpressionMatrix::from(CscMatrix::from_dense(&counts()));
        let qc = per_feature_qc(&m, &[vec![0, 3], vec![2, 2]], Some(1.0), &QcConfig::default()).unwrap();

        assert_eq!(qc.subsets[0].sum, vec![1.0, 0.0, 8.0]);
        assert_eq!(qc.subsets[0].detected, vec![0, 0, 2]);
        assert_eq!(qc.subsets[1].sum, vec![4.0, 0.0, 2.0]);
        assert_eq!(qc.subsets[1].detected, vec![2, 0, 0]);
    }

    #[test]
    fn test_negative_limit_counts_zeros() {
        let dense = ExpressionMatrix::from(counts());
        let sparse = ExpressionMatrix::from(CscMatrix::from_dense(&counts()));
        let a = per_feature_qc(&dense, &[], Some(-1.0), &QcConfig::default()).unwrap();
        let b = per_feature_qc(&sparse, &[], Some(-1.0), &QcConfig::default()).unwrap();
        assert_eq!(a.total.detected, vec![4, 4, 4]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_parallel_fold_matches_serial() {
        // Whole-number counts keep the sums exact in any order.
        let dense = Array2::from_shape_fn((40, 300), |(r, c)| ((r * 7 + c * 3) % 5) as f64);
        let sparse = ExpressionMatrix::from(CscMatrix::from_dense(&dense));
        let subsets = vec![vec![0, 5, 5, 299], (0..300).step_by(3).collect(), vec![7, 7, 7]];

        let serial = QcConfig {
            worker_count: 1,
            parallel_threshold: usize::MAX,
        };
        let parallel = QcConfig {
            worker_count: 4,
            parallel_threshold: 1,
        };
        let a = per_feature_qc(&sparse, &subsets, Some(1.0), &serial).unwrap();
        let b = per_feature_qc(&sparse, &subsets, Some(1.0), &parallel).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.subsets[2].sum[0], 3.0 * dense[[0, 7]]);
    }

    #[test]
    fn test_rejects_out_of_range_cells() {
        let m = ExpressionMatrix::from(counts());
        assert!(per_feature_qc(&m, &[vec![4]], None, &QcConfig::default()).is_err());
    }
}
