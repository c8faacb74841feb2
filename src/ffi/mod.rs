//! FFI (Foreign Function Interface) layer for C bindings.
//!
//! Host environments load the library, call `qc_module_init` once, build
//! argument values with the `qc_value_*` constructors and invoke routines by
//! their registered names through `qc_call`.

pub mod error;
pub mod module;
pub mod types;
pub mod value;

pub use error::*;
pub use module::*;
pub use types::*;
pub use value::*;
