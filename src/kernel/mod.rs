//! Numeric QC kernels over expression matrices.
//!
//! Kernels take typed inputs and return typed outputs. Conversion from and
//! to [`Value`](crate::data::Value) happens in the routine layer.

pub mod cell_qc;
pub mod cumprop;
pub mod feature_qc;
pub mod row_sums;

pub use cell_qc::{per_cell_qc, CellQc, CellSetStats};
pub use cumprop::top_cumprop;
pub use feature_qc::{per_feature_qc, FeatureQc, FeatureSetStats};
pub use row_sums::{sum_counts_across_features, sum_row_counts};

use crate::data::Column;
use crate::error::{QcError, QcResult};
use crate::runtime::QcConfig;
use rayon::prelude::*;

/// Evaluate `f` for every column, in parallel once the column count
/// reaches the configured threshold. Output order follows column order.
pub(crate) fn map_columns<T, F>(ncols: usize, config: &QcConfig, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync + Send,
{
    if ncols >= config.parallel_threshold {
        (0..ncols).into_par_iter().map(f).collect()
    } else {
        (0..ncols).map(f).collect()
    }
}

/// Fold every column into an accumulator, splitting the work across the
/// pool once the column count reaches the configured threshold.
pub(crate) fn fold_columns<T, I, F, R>(ncols: usize, config: &QcConfig, init: I, fold: F, reduce: R) -> T
where
    T: Send,
    I: Fn() -> T + Sync + Send,
    F: Fn(T, usize) -> T + Sync + Send,
    R: Fn(T, T) -> T + Sync + Send,
{
    if ncols >= config.parallel_threshold {
        (0..ncols)
            .into_par_iter()
            .fold(&init, &fold)
            .reduce(&init, &reduce)
    } else {
        (0..ncols).fold(init(), fold)
    }
}

/// Validate top-N cutoffs: positive and strictly increasing.
pub fn validate_top(top: &[i32]) -> QcResult<Vec<usize>> {
    if let Some(&bad) = top.iter().find(|&&t| t <= 0) {
        return Err(QcError::invalid(format!("top values must be positive, got {}", bad)));
    }
    if top.windows(2).any(|w| w[0] >= w[1]) {
        return Err(QcError::invalid("top values must be strictly increasing"));
    }
    Ok(top.iter().map(|&t| t as usize).collect())
}

/// Validate 0-based indices against a dimension of length `len`.
pub fn validate_indices(indices: &[i32], len: usize, what: &'static str) -> QcResult<Vec<usize>> {
    indices
        .iter()
        .map(|&i| {
            if i < 0 || i as usize >= len {
                Err(QcError::IndexOutOfBounds {
                    what,
                    index: i as i64,
                    len,
                })
            } else {
                Ok(i as usize)
            }
        })
        .collect()
}

/// Values of one column restricted to a feature set.
///
/// Implicit zeros of sparse columns are counted rather than stored.
#[derive(Debug, Clone, Default)]
pub(crate) struct SetValues {
    pub explicit: Vec<f64>,
    pub implicit_zeros: usize,
}

impl SetValues {
    /// Every row of the column.
    pub fn full(column: &Column<'_>) -> Self {
        Self {
            explicit: column.stored_values(),
            implicit_zeros: column.implicit_zeros(),
        }
    }

    /// Only the listed rows (duplicates are kept).
    pub fn subset(column: &Column<'_>, rows: &[usize]) -> Self {
        Self {
            explicit: rows.iter().map(|&r| column.get(r)).collect(),
            implicit_zeros: 0,
        }
    }

    pub fn sum(&self) -> f64 {
        self.explicit.iter().sum()
    }

    pub fn detected(&self, limit: f64) -> usize {
        let stored = self.explicit.iter().filter(|&&x| x > limit).count();
        if 0.0 > limit {
            stored + self.implicit_zeros
        } else {
            stored
        }
    }

    /// Proportion of the set total held by its `top[k]` largest values.
    ///
    /// Cutoffs beyond the set size are clamped; a zero total yields NaN.
    pub fn top_proportions(mut self, top: &[usize]) -> Vec<f64> {
        let total = self.sum();
        self.explicit
            .sort_unstable_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

        // Implicit zeros slot in between positive and negative values.
        let split = self.explicit.partition_point(|&x| x > 0.0);
        let (positive, rest) = self.explicit.split_at(split);
        let ordered = positive
            .iter()
            .copied()
            .chain(std::iter::repeat(0.0).take(self.implicit_zeros))
            .chain(rest.iter().copied());

        let mut out = Vec::with_capacity(top.len());
        let mut acc = 0.0;
        let mut taken = 0usize;
        let mut cutoffs = top.iter().peekable();

        for value in ordered {
            while let Some(&&t) = cutoffs.peek() {
                if taken < t {
                    break;
                }
                out.push(acc / total);
                cutoffs.next();
            }
            if cutoffs.peek().is_none() {
                break;
            }
            acc += value;
            taken += 1;
        }
        // Remaining cutoffs are at or beyond the set size.
        while cutoffs.next().is_some() {
            out.push(acc / total);
        }
        out
    }
}
