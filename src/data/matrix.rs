//! Expression matrices: features in rows, cells in columns.

use crate::error::{QcError, QcResult};
use ndarray::{Array2, ArrayView1};
use std::convert::TryFrom;

/// Storage class tag passed across the routine boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(C)]
pub enum MatrixClass {
    Dense = 0,
    Sparse = 1,
}

impl MatrixClass {
    pub fn name(&self) -> &'static str {
        match self {
            MatrixClass::Dense => "dense",
            MatrixClass::Sparse => "sparse",
        }
    }
}

impl TryFrom<i32> for MatrixClass {
    type Error = QcError;

    fn try_from(tag: i32) -> QcResult<Self> {
        match tag {
            0 => Ok(MatrixClass::Dense),
            1 => Ok(MatrixClass::Sparse),
            other => Err(QcError::invalid(format!("unknown matrix class tag {}", other))),
        }
    }
}

/// CSC (Compressed Sparse Column) count matrix.
///
/// Memory layout:
/// - `col_ptrs`: `[cols + 1]` offsets into `row_indices`/`values`
/// - `row_indices`: `[nnz]` row of each stored entry, increasing within a column
/// - `values`: `[nnz]` stored entries
#[derive(Debug, Clone, PartialEq)]
pub struct CscMatrix {
    rows: usize,
    cols: usize,
    col_ptrs: Vec<usize>,
    row_indices: Vec<usize>,
    values: Vec<f64>,
}

impl CscMatrix {
    /// Create a CSC matrix, validating the compressed layout.
    pub fn new(
        rows: usize,
        cols: usize,
        col_ptrs: Vec<usize>,
        row_indices: Vec<usize>,
        values: Vec<f64>,
    ) -> QcResult<Self> {
        let ptr_len = cols
            .checked_add(1)
            .ok_or_else(|| QcError::invalid("column count overflows"))?;
        if col_ptrs.len() != ptr_len {
            return Err(QcError::LengthMismatch {
                what: "col_ptrs",
                expected: ptr_len,
                got: col_ptrs.len(),
            });
        }
        if row_indices.len() != values.len() {
            return Err(QcError::LengthMismatch {
                what: "row_indices",
                expected: values.len(),
                got: row_indices.len(),
            });
        }
        if col_ptrs[0] != 0 || col_ptrs[cols] != values.len() {
            return Err(QcError::invalid("column pointers must span [0, nnz]"));
        }
        if col_ptrs.windows(2).any(|w| w[0] > w[1]) {
            return Err(QcError::invalid("column pointers must be non-decreasing"));
        }
        for c in 0..cols {
            let rows_in_col = &row_indices[col_ptrs[c]..col_ptrs[c + 1]];
            if let Some(&bad) = rows_in_col.iter().find(|&&r| r >= rows) {
                return Err(QcError::IndexOutOfBounds {
                    what: "row_indices",
                    index: bad as i64,
                    len: rows,
                });
            }
            if rows_in_col.windows(2).any(|w| w[0] >= w[1]) {
                return Err(QcError::invalid(
                    "row indices must be strictly increasing within a column",
                ));
            }
        }

        Ok(Self {
            rows,
            cols,
            col_ptrs,
            row_indices,
            values,
        })
    }

    /// Build from a dense matrix, keeping non-zero entries only.
    pub fn from_dense(dense: &Array2<f64>) -> Self {
        let (rows, cols) = dense.dim();
        let mut col_ptrs = Vec::with_capacity(cols + 1);
        let mut row_indices = Vec::new();
        let mut values = Vec::new();

        col_ptrs.push(0);
        for c in 0..cols {
            for (r, &v) in dense.column(c).iter().enumerate() {
                if v != 0.0 {
                    row_indices.push(r);
                    values.push(v);
                }
            }
            col_ptrs.push(values.len());
        }

        Self {
            rows,
            cols,
            col_ptrs,
            row_indices,
            values,
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Stored rows and values of one column.
    #[inline]
    pub fn column(&self, col: usize) -> (&[usize], &[f64]) {
        let (start, end) = (self.col_ptrs[col], self.col_ptrs[col + 1]);
        (&self.row_indices[start..end], &self.values[start..end])
    }
}

/// A count matrix in either storage class.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionMatrix {
    Dense(Array2<f64>),
    Sparse(CscMatrix),
}

impl ExpressionMatrix {
    #[inline]
    pub fn nrows(&self) -> usize {
        match self {
            ExpressionMatrix::Dense(m) => m.nrows(),
            ExpressionMatrix::Sparse(m) => m.rows(),
        }
    }

    #[inline]
    pub fn ncols(&self) -> usize {
        match self {
            ExpressionMatrix::Dense(m) => m.ncols(),
            ExpressionMatrix::Sparse(m) => m.cols(),
        }
    }

    pub fn class(&self) -> MatrixClass {
        match self {
            ExpressionMatrix::Dense(_) => MatrixClass::Dense,
            ExpressionMatrix::Sparse(_) => MatrixClass::Sparse,
        }
    }

    /// Borrow one column. Panics if `col >= ncols()`.
    pub fn column(&self, col: usize) -> Column<'_> {
        match self {
            ExpressionMatrix::Dense(m) => Column::Dense(m.column(col)),
            ExpressionMatrix::Sparse(m) => {
                let (rows, values) = m.column(col);
                Column::Sparse {
                    rows,
                    values,
                    len: m.rows(),
                }
            }
        }
    }

    /// Single entry lookup. Panics when out of range.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.column(col).get(row)
    }
}

impl From<Array2<f64>> for ExpressionMatrix {
    fn from(m: Array2<f64>) -> Self {
        ExpressionMatrix::Dense(m)
    }
}

impl From<CscMatrix> for ExpressionMatrix {
    fn from(m: CscMatrix) -> Self {
        ExpressionMatrix::Sparse(m)
    }
}

/// Borrowed view of a single matrix column.
#[derive(Debug, Clone, Copy)]
pub enum Column<'a> {
    Dense(ArrayView1<'a, f64>),
    Sparse {
        rows: &'a [usize],
        values: &'a [f64],
        len: usize,
    },
}

impl<'a> Column<'a> {
    #[inline]
    pub fn len(&self) -> usize {
        match self {
            Column::Dense(v) => v.len(),
            Column::Sparse { len, .. } => *len,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value at `row`; implicit sparse entries read as zero.
    pub fn get(&self, row: usize) -> f64 {
        match self {
            Column::Dense(v) => v[row],
            Column::Sparse { rows, values, len } => {
                assert!(row < *len, "row {} out of bounds for column of length {}", row, len);
                match rows.binary_search(&row) {
                    Ok(pos) => values[pos],
                    Err(_) => 0.0,
                }
            }
        }
    }

    /// Non-zero `(row, value)` pairs in row order.
    pub fn nonzeros(&self) -> Box<dyn Iterator<Item = (usize, f64)> + 'a> {
        match *self {
            Column::Dense(v) => Box::new(
                v.into_iter()
                    .copied()
                    .enumerate()
                    .filter(|&(_, x)| x != 0.0),
            ),
            Column::Sparse { rows, values, .. } => Box::new(
                rows.iter()
                    .copied()
                    .zip(values.iter().copied())
                    .filter(|&(_, x)| x != 0.0),
            ),
        }
    }

    /// Number of entries that are not physically stored.
    #[inline]
    pub fn implicit_zeros(&self) -> usize {
        match self {
            Column::Dense(_) => 0,
            Column::Sparse { rows, len, .. } => len - rows.len(),
        }
    }

    /// Stored values (every entry for dense columns).
    pub fn stored_values(&self) -> Vec<f64> {
        match self {
            Column::Dense(v) => v.to_vec(),
            Column::Sparse { values, .. } => values.to_vec(),
        }
    }

    /// Copy `out.len()` consecutive rows starting at `start` into `out`.
    pub fn fill_region(&self, start: usize, out: &mut [f64]) {
        match self {
            Column::Dense(v) => {
                for (dst, src) in out.iter_mut().zip(v.iter().skip(start)) {
                    *dst = *src;
                }
            }
            Column::Sparse { rows, values, .. } => {
                out.iter_mut().for_each(|x| *x = 0.0);
                let end = start + out.len();
                let first = rows.partition_point(|&r| r < start);
                for (&r, &v) in rows[first..].iter().zip(&values[first..]) {
                    if r >= end {
                        break;
                    }
                    out[r - start] = v;
                }
            }
        }
    }

    pub fn to_dense(&self) -> Vec<f64> {
        let mut out = vec![0.0; self.len()];
        self.fill_region(0, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sample_dense() -> Array2<f64> {
        array![[1.0, 0.0, 3.0], [0.0, 0.0, 4.0], [2.0, 5.0, 0.0]]
    }

    #[test]
    fn test_from_dense_layout() {
        let csc = CscMatrix::from_dense(&sample_dense());
        assert_eq!(csc.nnz(), 5);
        assert_eq!(csc.column(0), (&[0usize, 2][..], &[1.0, 2.0][..]));
        assert_eq!(csc.column(1), (&[2usize][..], &[5.0][..]));
        assert_eq!(csc.column(2), (&[0usize, 1][..], &[3.0, 4.0][..]));
    }

    #[test]
    fn test_csc_validation() {
        let bad_ptrs = CscMatrix::new(2, 2, vec![0, 1], vec![0], vec![1.0]);
        assert!(matches!(bad_ptrs, Err(QcError::LengthMismatch { .. })));

        let bad_row = CscMatrix::new(2, 1, vec![0, 1], vec![5], vec![1.0]);
        assert!(matches!(bad_row, Err(QcError::IndexOutOfBounds { index: 5, .. })));

        let unsorted = CscMatrix::new(3, 1, vec![0, 2], vec![2, 0], vec![1.0, 1.0]);
        assert!(matches!(unsorted, Err(QcError::InvalidArgument(_))));
    }

    #[test]
    fn test_csc_rejects_decreasing_pointers() {
        let decreasing = CscMatrix::new(3, 2, vec![0, 5, 1], vec![0], vec![1.0]);
        assert!(matches!(decreasing, Err(QcError::InvalidArgument(_))));

        let overflow = CscMatrix::new(3, usize::MAX, vec![0], vec![], vec![]);
        assert!(matches!(overflow, Err(QcError::InvalidArgument(_))));
    }

    #[test]
    fn test_column_access_agrees() {
        let dense = ExpressionMatrix::from(sample_dense());
        let sparse = ExpressionMatrix::from(CscMatrix::from_dense(&sample_dense()));

        for c in 0..3 {
            assert_eq!(dense.column(c).to_dense(), sparse.column(c).to_dense());
            for r in 0..3 {
                assert_eq!(dense.get(r, c), sparse.get(r, c));
            }
        }
        assert_eq!(sparse.column(1).implicit_zeros(), 2);
        assert_eq!(dense.column(1).nonzeros().collect::<Vec<_>>(), vec![(2, 5.0)]);
    }

    #[test]
    fn test_fill_region() {
        let sparse = ExpressionMatrix::from(CscMatrix::from_dense(&sample_dense()));
        let mut buf = [9.0; 2];
        sparse.column(2).fill_region(1, &mut buf);
        assert_eq!(buf, [4.0, 0.0]);
    }

    #[test]
    fn test_class_tags() {
        assert_eq!(MatrixClass::try_from(1).unwrap(), MatrixClass::Sparse);
        assert!(MatrixClass::try_from(7).is_err());
    }
}
