//! Cumulative proportion of library size held by the most expressed features.

use super::{map_columns, validate_top, SetValues};
use crate::data::ExpressionMatrix;
use crate::error::QcResult;
use crate::runtime::QcConfig;
use ndarray::Array2;

/// For each cell, the fraction of its total count held by its `top[k]`
/// largest features.
///
/// Returns an `ncells x ntop` matrix. Cutoffs larger than the number of
/// features are clamped; cells with a zero total yield NaN.
pub fn top_cumprop(matrix: &ExpressionMatrix, top: &[i32], config: &QcConfig) -> QcResult<Array2<f64>> {
    let top = validate_top(top)?;
    let ncells = matrix.ncols();

    let rows = map_columns(ncells, config, |c| {
        SetValues::full(&matrix.column(c)).top_proportions(&top)
    });

    let mut out = Array2::zeros((ncells, top.len()));
    for (c, props) in rows.into_iter().enumerate() {
        for (k, p) in props.into_iter().enumerate() {
            out[[c, k]] = p;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::CscMatrix;
    use ndarray::array;

    #[test]
    fn test_cumulative_proportions() {
        let counts = array![[6.0, 0.0], [2.0, 0.0], [0.0, 0.0], [2.0, 0.0]];
        let m = ExpressionMatrix::from(CscMatrix::from_dense(&counts));
        let out = top_cumprop(&m, &[1, 2, 100], &QcConfig::default()).unwrap();

        assert_eq!(out.dim(), (2, 3));
        assert_eq!(out[[0, 0]], 0.6);
        assert_eq!(out[[0, 1]], 0.8);
        assert_eq!(out[[0, 2]], 1.0);
        assert!(out[[1, 0]].is_nan());
    }

    #[test]
    fn test_parallel_matches_serial() {
        let counts = Array2::from_shape_fn((20, 40), |(r, c)| ((r * 7 + c * 3) % 5) as f64);
        let m = ExpressionMatrix::from(counts);
        let serial = QcConfig {
            parallel_threshold: usize::MAX,
            ..QcConfig::default()
        };
        let parallel = QcConfig {
            parallel_threshold: 1,
            ..QcConfig::default()
        };

        let a = top_cumprop(&m, &[1, 5, 10], &serial).unwrap();
        let b = top_cumprop(&m, &[1, 5, 10], &parallel).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rejects_unsorted_top() {
        let m = ExpressionMatrix::from(array![[1.0]]);
        assert!(top_cumprop(&m, &[5, 2], &QcConfig::default()).is_err());
    }
}
