//! Grouped row sums.

use super::map_columns;
use crate::data::ExpressionMatrix;
use crate::error::{QcError, QcResult};
use crate::runtime::QcConfig;
use ndarray::Array2;
use std::collections::BTreeMap;

/// Sum feature rows group by group.
///
/// `genes` holds 0-based row indices laid out one group after another and
/// `runs[g]` is how many consecutive entries of `genes` belong to group `g`.
/// Returns an `ngroups x ncells` matrix.
pub fn sum_row_counts(
    matrix: &ExpressionMatrix,
    genes: &[i32],
    runs: &[i32],
    config: &QcConfig,
) -> QcResult<Array2<f64>> {
    let nrows = matrix.nrows();
    if let Some(&bad) = runs.iter().find(|&&r| r < 0) {
        return Err(QcError::invalid(format!("run lengths must be non-negative, got {}", bad)));
    }
    let covered: usize = runs.iter().map(|&r| r as usize).sum();
    if covered != genes.len() {
        return Err(QcError::LengthMismatch {
            what: "genes (sum of runs)",
            expected: covered,
            got: genes.len(),
        });
    }
    let genes = super::validate_indices(genes, nrows, "genes")?;

    let mut groups = Vec::with_capacity(runs.len());
    let mut offset = 0usize;
    for &r in runs {
        let end = offset + r as usize;
        groups.push(&genes[offset..end]);
        offset = end;
    }

    let ncells = matrix.ncols();
    let columns = map_columns(ncells, config, |c| {
        let column = matrix.column(c);
        groups
            .iter()
            .map(|rows| rows.iter().map(|&r| column.get(r)).sum::<f64>())
            .collect::<Vec<f64>>()
    });

    let mut out = Array2::zeros((groups.len(), ncells));
    for (c, sums) in columns.into_iter().enumerate() {
        for (g, s) in sums.into_iter().enumerate() {
            out[[g, c]] = s;
        }
    }
    Ok(out)
}

/// Sum rows sharing the same group id.
///
/// `ids` carries one entry per feature; `None` drops the feature. Groups are
/// returned in increasing id order alongside the summed matrix.
pub fn sum_counts_across_features(
    matrix: &ExpressionMatrix,
    ids: &[Option<i32>],
    config: &QcConfig,
) -> QcResult<(Vec<i32>, Array2<f64>)> {
    if ids.len() != matrix.nrows() {
        return Err(QcError::LengthMismatch {
            what: "feature ids",
            expected: matrix.nrows(),
            got: ids.len(),
        });
    }

    let mut by_group: BTreeMap<i32, Vec<i32>> = BTreeMap::new();
    for (row, id) in ids.iter().enumerate() {
        if let Some(id) = id {
            by_group.entry(*id).or_default().push(row as i32);
        }
    }

    let labels: Vec<i32> = by_group.keys().copied().collect();
    let runs: Vec<i32> = by_group.values().map(|rows| rows.len() as i32).collect();
    let genes: Vec<i32> = by_group.into_values().flatten().collect();

    let sums = sum_row_counts(matrix, &genes, &runs, config)?;
    Ok((labels, sums))
}
