//! Module loading, routine registration and dispatch.

pub mod config;
pub mod module;
pub mod registry;
pub mod routines;

pub use config::QcConfig;
pub use module::{init_with_config, module, Module, PACKAGE};
pub use registry::{ModuleInfo, RoutineDef, RoutineFn, RoutineTable};
pub use routines::CALL_ENTRIES;
