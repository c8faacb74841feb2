//! Lazy row/column vectors over a shared expression matrix.
//!
//! A [`LazyVector`] answers element and region reads directly from the
//! underlying matrix and only builds a full vector when it is materialized.
//! The materialized copy is computed at most once per vector and shared
//! between clones.

use super::matrix::{ExpressionMatrix, MatrixClass};
use super::value::{ElementType, Scalar, Value};
use crate::error::{QcError, QcResult};
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Which matrix axis a lazy vector walks along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// A full column (one cell); length is the number of rows.
    Column,
    /// A full row (one feature); length is the number of columns.
    Row,
}

/// Class descriptor installed once at module load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LazyVectorClass {
    pub name: &'static str,
    pub package: &'static str,
}

impl LazyVectorClass {
    pub const NAME: &'static str = "lazy_vector";

    pub fn new(package: &'static str) -> Self {
        Self {
            name: Self::NAME,
            package,
        }
    }

    /// Create a vector of this class after validating every argument.
    pub fn create(
        &self,
        matrix: Arc<ExpressionMatrix>,
        dims: &[i32],
        index: i32,
        get_column: bool,
        class: MatrixClass,
        element_type: ElementType,
    ) -> QcResult<LazyVector> {
        if dims.len() != 2 {
            return Err(QcError::LengthMismatch {
                what: "dims",
                expected: 2,
                got: dims.len(),
            });
        }
        let (nrow, ncol) = (matrix.nrows(), matrix.ncols());
        if dims[0] < 0 || dims[1] < 0 || dims[0] as usize != nrow || dims[1] as usize != ncol {
            return Err(QcError::invalid(format!(
                "dims [{}, {}] do not match matrix shape [{}, {}]",
                dims[0], dims[1], nrow, ncol
            )));
        }
        if matrix.class() != class {
            return Err(QcError::invalid(format!(
                "matrix class tag '{}' does not match a {} matrix",
                class.name(),
                matrix.class().name()
            )));
        }

        let (axis, extent) = if get_column {
            (Axis::Column, ncol)
        } else {
            (Axis::Row, nrow)
        };
        if index < 0 || index as usize >= extent {
            return Err(QcError::IndexOutOfBounds {
                what: "lazy vector index",
                index: index as i64,
                len: extent,
            });
        }

        Ok(LazyVector {
            inner: Arc::new(LazyInner {
                matrix,
                axis,
                index: index as usize,
                element_type,
                materialized: OnceLock::new(),
            }),
        })
    }
}

struct LazyInner {
    matrix: Arc<ExpressionMatrix>,
    axis: Axis,
    index: usize,
    element_type: ElementType,
    materialized: OnceLock<Vec<f64>>,
}

/// A matrix row or column that is read on demand.
#[derive(Clone)]
pub struct LazyVector {
    inner: Arc<LazyInner>,
}

impl fmt::Debug for LazyVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyVector")
            .field("axis", &self.inner.axis)
            .field("index", &self.inner.index)
            .field("element_type", &self.inner.element_type)
            .field("len", &self.len())
            .field("materialized", &self.is_materialized())
            .finish()
    }
}

impl LazyVector {
    pub fn len(&self) -> usize {
        match self.inner.axis {
            Axis::Column => self.inner.matrix.nrows(),
            Axis::Row => self.inner.matrix.ncols(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn axis(&self) -> Axis {
        self.inner.axis
    }

    pub fn index(&self) -> usize {
        self.inner.index
    }

    pub fn element_type(&self) -> ElementType {
        self.inner.element_type
    }

    pub fn is_materialized(&self) -> bool {
        self.inner.materialized.get().is_some()
    }

    fn raw(&self, i: usize) -> f64 {
        if let Some(cached) = self.inner.materialized.get() {
            return cached[i];
        }
        match self.inner.axis {
            Axis::Column => self.inner.matrix.get(i, self.inner.index),
            Axis::Row => self.inner.matrix.get(self.inner.index, i),
        }
    }

    /// Element `i`, or `None` past the end.
    pub fn elt(&self, i: usize) -> Option<Scalar> {
        if i >= self.len() {
            return None;
        }
        Some(Scalar::coerce(self.raw(i), self.inner.element_type))
    }

    /// Copy up to `out.len()` raw values starting at `start`.
    ///
    /// Returns the number of values written.
    pub fn get_region(&self, start: usize, out: &mut [f64]) -> usize {
        let len = self.len();
        if start >= len {
            return 0;
        }
        let n = out.len().min(len - start);
        let out = &mut out[..n];

        if let Some(cached) = self.inner.materialized.get() {
            out.copy_from_slice(&cached[start..start + n]);
            return n;
        }
        match self.inner.axis {
            Axis::Column => self
                .inner
                .matrix
                .column(self.inner.index)
                .fill_region(start, out),
            Axis::Row => {
                for (k, dst) in out.iter_mut().enumerate() {
                    *dst = self.inner.matrix.get(self.inner.index, start + k);
                }
            }
        }
        n
    }

    fn dense_values(&self) -> &[f64] {
        self.inner.materialized.get_or_init(|| {
            let mut buf = vec![0.0; self.len()];
            self.get_region(0, &mut buf);
            buf
        })
    }

    /// Build the full vector, typed according to the element type.
    pub fn materialize(&self) -> Value {
        let values = self.dense_values();
        match self.inner.element_type {
            ElementType::Double => Value::Real(values.to_vec()),
            ElementType::Integer => Value::Integer(values.iter().map(|x| x.trunc() as i32).collect()),
            ElementType::Logical => Value::Logical(values.iter().map(|&x| x != 0.0).collect()),
        }
    }
}
