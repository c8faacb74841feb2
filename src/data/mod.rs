//! Data structures exchanged with QC routines.

pub mod lazy;
pub mod matrix;
pub mod value;

pub use lazy::{Axis, LazyVector, LazyVectorClass};
pub use matrix::{Column, CscMatrix, ExpressionMatrix, MatrixClass};
pub use value::{ElementType, FromValue, IntoValue, Scalar, Value};
