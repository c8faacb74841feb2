//! Loaded module and the call boundary.
//!
//! Every call goes through [`Module::call`], which resolves the routine,
//! checks its arity and runs it under `catch_unwind` so that a panic in
//! argument conversion or in a kernel comes back as [`QcError::Panic`]
//! instead of unwinding into the caller.

use super::config::QcConfig;
use super::registry::{ModuleInfo, RoutineDef};
use super::routines;
use crate::data::{LazyVectorClass, Value};
use crate::error::{QcError, QcResult};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::OnceLock;
use tracing::{debug, error, info, warn};

/// Package name used to prefix registered routine names.
pub const PACKAGE: &str = "scaterrs";

/// Registered library state plus the pool kernels run in.
pub struct Module {
    info: ModuleInfo,
    config: QcConfig,
    pool: Option<rayon::ThreadPool>,
}

impl Module {
    /// Register the routine table, turn off dynamic lookup and install the
    /// lazy vector class.
    ///
    /// A failure to register is fatal and aborts the process.
    pub fn load(config: QcConfig) -> Self {
        let mut info = ModuleInfo::new(PACKAGE);
        if let Err(e) = info.register_routines(&routines::CALL_ENTRIES) {
            error!(error = %e, "routine registration failed");
            std::process::abort();
        }
        info.use_dynamic_symbols(false);
        routines::init_lazy_vector(&mut info);

        info!(
            package = PACKAGE,
            routines = info.routines().len(),
            workers = config.worker_count,
            "module loaded"
        );
        Self::from_info(info, config)
    }

    /// Wrap an already populated [`ModuleInfo`].
    pub fn from_info(info: ModuleInfo, config: QcConfig) -> Self {
        let pool = match config.build_pool() {
            Ok(pool) => Some(pool),
            Err(e) => {
                warn!(error = %e, "falling back to the global rayon pool");
                None
            }
        };
        Self { info, config, pool }
    }

    pub fn info(&self) -> &ModuleInfo {
        &self.info
    }

    pub fn config(&self) -> &QcConfig {
        &self.config
    }

    pub fn resolve(&self, name: &str) -> QcResult<&RoutineDef> {
        self.info
            .resolve(name)
            .ok_or_else(|| QcError::UnknownRoutine(name.to_string()))
    }

    /// Lazy vector class installed at load.
    pub fn lazy_class(&self) -> QcResult<&LazyVectorClass> {
        self.info
            .lazy_class()
            .ok_or(QcError::Uninitialized("lazy vector class"))
    }

    /// Invoke a registered routine by name.
    pub fn call(&self, name: &str, args: &[Value]) -> QcResult<Value> {
        let def = *self.resolve(name)?;
        if args.len() != def.arity {
            return Err(QcError::ArityMismatch {
                name: def.name.to_string(),
                expected: def.arity,
                got: args.len(),
            });
        }
        debug!(routine = def.name, arity = def.arity, "dispatch");

        let invoke = || (def.func)(self, args);
        let outcome = catch_unwind(AssertUnwindSafe(|| match &self.pool {
            Some(pool) => pool.install(invoke),
            None => invoke(),
        }));

        let result = match outcome {
            Ok(result) => result,
            Err(payload) => Err(QcError::Panic {
                routine: def.name.to_string(),
                message: panic_message(payload.as_ref()),
            }),
        };
        if let Err(e) = &result {
            warn!(routine = def.name, error = %e, "routine failed");
        }
        result
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

static MODULE: OnceLock<Module> = OnceLock::new();

/// Load the module with `config` unless it is already loaded.
///
/// Returns the process-wide module; the first configuration wins.
pub fn init_with_config(config: QcConfig) -> &'static Module {
    MODULE.get_or_init(|| Module::load(config))
}

/// The process-wide module, loaded with the default configuration on first use.
pub fn module() -> &'static Module {
    MODULE.get_or_init(|| Module::load(QcConfig::default()))
}
