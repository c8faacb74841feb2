//! Error type shared by kernels, conversions and the dispatch boundary.

use thiserror::Error;

/// Errors raised while converting arguments or running a QC routine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QcError {
    /// Name is not present in the routine table.
    #[error("no registered routine named '{0}'")]
    UnknownRoutine(String),

    /// Argument count does not match the registered arity.
    #[error("routine '{name}' expects {expected} arguments, got {got}")]
    ArityMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    /// An argument has the wrong value kind.
    #[error("argument '{arg}': expected {expected}, got {got}")]
    TypeMismatch {
        arg: &'static str,
        expected: &'static str,
        got: &'static str,
    },

    /// Two lengths that must agree do not.
    #[error("{what}: length {got} does not match expected {expected}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    /// Index outside of the addressed dimension.
    #[error("{what}: index {index} out of bounds for length {len}")]
    IndexOutOfBounds {
        what: &'static str,
        index: i64,
        len: usize,
    },

    /// Argument is well-typed but its value is not acceptable.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A subsystem was used before module initialization installed it.
    #[error("{0} is not initialized")]
    Uninitialized(&'static str),

    /// A panic was caught at the call boundary.
    #[error("routine '{routine}' panicked: {message}")]
    Panic { routine: String, message: String },
}

impl QcError {
    #[inline]
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

pub type QcResult<T> = Result<T, QcError>;
