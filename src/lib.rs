//! scaterrs - Single-cell quality-control kernels.
//!
//! This crate computes QC metrics over features x cells count matrices and
//! exposes them through a fixed routine table:
//!
//! - Per-cell totals, detected features and top-N library proportions
//! - Per-feature totals and detected cells
//! - Grouped row sums
//! - Lazy row/column vectors over a shared matrix
//! - FFI layer for C and any language with a C FFI
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │     FFI Layer (scaterrs.h)          │
//! │  qc_module_init / qc_call / values  │
//! └─────────────────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────┐
//! │   Module (routine table, dispatch)  │
//! │  arity check → catch_unwind → call  │
//! └─────────────────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────┐
//! │  ┌───────────┐  ┌───────────────┐  │
//! │  │  Kernels  │  │ Matrix / Lazy │  │
//! │  │  (rayon)  │  │    vectors    │  │
//! │  └───────────┘  └───────────────┘  │
//! └─────────────────────────────────────┘
//! ```
//!
//! # FFI Usage
//!
//! ```c
//! qc_module_init(NULL);
//!
//! ValueHandle args[2];
//! qc_value_dense_matrix(counts, nrow, ncol, &args[0]);
//! qc_value_integer(top, ntop, &args[1]);
//!
//! ValueHandle out;
//! if (qc_call("_scaterrs_top_cumprop", args, 2, &out) != QcStatus_Ok) {
//!     qc_last_error_message(buf, sizeof buf, &len);
//! }
//! qc_value_free(out);
//! ```
//!
//! # Rust Usage
//!
//! ```
//! use scaterrs::{module, Value};
//! use ndarray::array;
//!
//! let counts = Value::matrix(array![[1.0, 0.0], [3.0, 2.0]]);
//! let props = module()
//!     .call("_scaterrs_top_cumprop", &[counts, Value::Integer(vec![1])])
//!     .unwrap();
//! assert!(matches!(props, Value::NumericMatrix(_)));
//! ```

pub mod data;
pub mod error;
pub mod ffi;
pub mod kernel;
pub mod runtime;

// Re-export commonly used items
pub use data::{
    CscMatrix, ElementType, ExpressionMatrix, FromValue, IntoValue, LazyVector, MatrixClass, Scalar, Value,
};
pub use error::{QcError, QcResult};
pub use kernel::{per_cell_qc, per_feature_qc, sum_counts_across_features, sum_row_counts, top_cumprop};
pub use runtime::{init_with_config, module, Module, QcConfig};

// Re-export FFI types for cbindgen
pub use ffi::error::qc_last_error_message;
pub use ffi::module::*;
pub use ffi::types::*;
pub use ffi::value::*;
