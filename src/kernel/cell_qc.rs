//! Per-cell QC metrics.

use super::{map_columns, validate_indices, validate_top, SetValues};
use crate::data::{ExpressionMatrix, IntoValue, Value};
use crate::error::QcResult;
use crate::runtime::QcConfig;
use ndarray::Array2;

/// Per-cell metrics computed over one feature set.
#[derive(Debug, Clone, PartialEq)]
pub struct CellSetStats {
    /// Total count per cell.
    pub sum: Vec<f64>,
    /// Number of features above the detection limit per cell.
    pub detected: Vec<i32>,
    /// Cumulative top-N proportions, `ntop x ncells`.
    pub top: Array2<f64>,
}

impl CellSetStats {
    fn with_shape(ntop: usize, ncells: usize) -> Self {
        Self {
            sum: vec![0.0; ncells],
            detected: vec![0; ncells],
            top: Array2::zeros((ntop, ncells)),
        }
    }
}

impl IntoValue for CellSetStats {
    fn into_value(self) -> Value {
        Value::named_list([
            ("sum", self.sum.into_value()),
            ("detected", self.detected.into_value()),
            ("top", self.top.into_value()),
        ])
    }
}

/// Per-cell metrics for all features and for each feature subset.
#[derive(Debug, Clone, PartialEq)]
pub struct CellQc {
    pub total: CellSetStats,
    pub subsets: Vec<CellSetStats>,
}

impl IntoValue for CellQc {
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

struct ColumnStats {
    sum: f64,
    detected: usize,
    top: Vec<f64>,
}

fn column_stats(values: SetValues, limit: f64, top: &[usize]) -> ColumnStats {
    ColumnStats {
        sum: values.sum(),
        detected: values.detected(limit),
        top: values.top_proportions(top),
    }
}

/// Compute per-cell QC metrics.
///
/// # Arguments
/// * `matrix` - Features x cells count matrix
/// * `feature_subsets` - 0-based row indices per subset
/// * `top` - Positive, strictly increasing top-N cutoffs
/// * `limit` - Detection limit; counts must exceed it (defaults to 0)
pub fn per_cell_qc(
    matrix: &ExpressionMatrix,
    feature_subsets: &[Vec<i32>],
    top: &[i32],
    limit: Option<f64>,
    config: &QcConfig,
) -> QcResult<CellQc> {
    let top = validate_top(top)?;
    let limit = limit.unwrap_or(0.0);
    let nrows = matrix.nrows();
    let subsets = feature_subsets
        .iter()
        .map(|s| validate_indices(s, nrows, "feature subset"))
        .collect::<QcResult<Vec<_>>>()?;

    let ncells = matrix.ncols();
    let per_column: Vec<Vec<ColumnStats>> = map_columns(ncells, config, |c| {
        let column = matrix.column(c);
        let mut stats = Vec::with_capacity(subsets.len() + 1);
        stats.push(column_stats(SetValues::full(&column), limit, &top));
        for rows in &subsets {
            stats.push(column_stats(SetValues::subset(&column, rows), limit, &top));
        }
        stats
    });

    let mut sets: Vec<CellSetStats> = (0..=subsets.len())
        .map(|_| CellSetStats::with_shape(top.len(), ncells))
        .collect();
    for (c, column) in per_column.into_iter().enumerate() {
        for (set, stats) in sets.iter_mut().zip(column) {
            set.sum[c] = stats.sum;
            set.detected[c] = stats.detected as i32;
            for (k, p) in stats.top.into_iter().enumerate() {
                set.top[[k, c]] = p;
            }
        }
    }

    let total = sets.remove(0);
    Ok(CellQc {
        total,
        subsets: sets,
    })
}
