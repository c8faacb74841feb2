//! C-compatible type definitions for FFI.

use crate::data::Value;
use crate::error::QcError;
use crate::runtime::QcConfig;

/// Result status codes for FFI functions.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QcStatus {
    /// Operation succeeded.
    Ok = 0,
    /// Null pointer was passed.
    NullPointer = 1,
    /// Invalid argument.
    InvalidArgument = 2,
    /// Array length mismatch.
    LengthMismatch = 3,
    /// Invalid UTF-8 string.
    InvalidUtf8 = 4,
    /// No routine registered under that name.
    UnknownRoutine = 5,
    /// Wrong number of arguments for the routine.
    ArityMismatch = 6,
    /// Argument has the wrong value kind.
    TypeMismatch = 7,
    /// Index outside the addressed dimension.
    IndexOutOfBounds = 8,
    /// Subsystem used before module initialization.
    Uninitialized = 9,
    /// A panic was caught at the call boundary.
    Panic = 10,
}

impl From<&QcError> for QcStatus {
    fn from(e: &QcError) -> Self {
        match e {
            QcError::UnknownRoutine(_) => QcStatus::UnknownRoutine,
            QcError::ArityMismatch { .. } => QcStatus::ArityMismatch,
            QcError::TypeMismatch { .. } => QcStatus::TypeMismatch,
            QcError::LengthMismatch { .. } => QcStatus::LengthMismatch,
            QcError::IndexOutOfBounds { .. } => QcStatus::IndexOutOfBounds,
            QcError::InvalidArgument(_) => QcStatus::InvalidArgument,
            QcError::Uninitialized(_) => QcStatus::Uninitialized,
            QcError::Panic { .. } => QcStatus::Panic,
        }
    }
}

/// Kind of value behind a handle.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QcValueKind {
    Null = 0,
    Logical = 1,
    Integer = 2,
    Real = 3,
    Matrix = 4,
    NumericMatrix = 5,
    List = 6,
    LazyVector = 7,
}

impl From<&Value> for QcValueKind {
    fn from(v: &Value) -> Self {
        match v {
            Value::Null => QcValueKind::Null,
            Value::Logical(_) => QcValueKind::Logical,
            Value::Integer(_) => QcValueKind::Integer,
            Value::Real(_) => QcValueKind::Real,
            Value::Matrix(_) => QcValueKind::Matrix,
            Value::NumericMatrix(_) => QcValueKind::NumericMatrix,
            Value::List(_) => QcValueKind::List,
            Value::LazyVector(_) => QcValueKind::LazyVector,
        }
    }
}

/// C-compatible array view (pointer + length).
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CArrayView {
    pub data: *const f64,
    pub len: usize,
}

impl CArrayView {
    pub fn empty() -> Self {
        Self {
            data: std::ptr::null(),
            len: 0,
        }
    }
}

/// C-compatible integer array view.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CIntArrayView {
    pub data: *const i32,
    pub len: usize,
}

impl CIntArrayView {
    pub fn empty() -> Self {
        Self {
            data: std::ptr::null(),
            len: 0,
        }
    }
}

/// Configuration for loading the module.
#[repr(C)]
#[derive(Debug, Clone, Default)]
pub struct CQcConfig {
    /// Number of worker threads (0 = auto-detect).
    pub worker_count: usize,
    /// Cell count at which kernels go parallel (0 = default).
    pub parallel_threshold: usize,
}

impl From<CQcConfig> for QcConfig {
    fn from(c: CQcConfig) -> Self {
        let defaults = QcConfig::default();
        QcConfig {
            worker_count: if c.worker_count == 0 {
                defaults.worker_count
            } else {
                c.worker_count
            },
            parallel_threshold: if c.parallel_threshold == 0 {
                defaults.parallel_threshold
            } else {
                c.parallel_threshold
            },
        }
    }
}
