//! Routine table and module registration state.

use super::module::Module;
use crate::data::{LazyVectorClass, Value};
use crate::error::{QcError, QcResult};
use std::collections::HashMap;

/// Signature shared by every registered routine.
pub type RoutineFn = fn(&Module, &[Value]) -> QcResult<Value>;

/// One entry of the routine table.
#[derive(Clone, Copy)]
pub struct RoutineDef {
    /// Registered (prefixed) symbol name.
    pub name: &'static str,
    pub func: RoutineFn,
    /// Exact number of arguments accepted.
    pub arity: usize,
}

impl std::fmt::Debug for RoutineDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutineDef")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

/// Registry of routines keyed by symbol name.
#[derive(Debug, Default)]
pub struct RoutineTable {
    routines: HashMap<&'static str, RoutineDef>,
}

impl RoutineTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a routine. Names must be unique.
    pub fn register(&mut self, def: RoutineDef) -> QcResult<()> {
        if self.routines.contains_key(def.name) {
            return Err(QcError::invalid(format!("routine {} already registered", def.name)));
        }
        self.routines.insert(def.name, def);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&RoutineDef> {
        self.routines.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.routines.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.routines.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.routines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routines.is_empty()
    }
}

/// Load-time state of the library: its routines, symbol lookup mode and
/// installed classes.
#[derive(Debug)]
pub struct ModuleInfo {
    package: &'static str,
    routines: RoutineTable,
    dynamic_lookup: bool,
    lazy_class: Option<LazyVectorClass>,
}

impl ModuleInfo {
    /// A fresh module allows dynamic lookup until told otherwise.
    pub fn new(package: &'static str) -> Self {
        Self {
            package,
            routines: RoutineTable::new(),
            dynamic_lookup: true,
            lazy_class: None,
        }
    }

    pub fn package(&self) -> &'static str {
        self.package
    }

    pub fn register_routines(&mut self, defs: &[RoutineDef]) -> QcResult<()> {
        for def in defs {
            self.routines.register(*def)?;
        }
        Ok(())
    }

    pub fn use_dynamic_symbols(&mut self, enabled: bool) {
        self.dynamic_lookup = enabled;
    }

    pub fn dynamic_lookup(&self) -> bool {
        self.dynamic_lookup
    }

    pub fn install_lazy_class(&mut self, class: LazyVectorClass) {
        self.lazy_class = Some(class);
    }

    pub fn lazy_class(&self) -> Option<&LazyVectorClass> {
        self.lazy_class.as_ref()
    }

    pub fn routines(&self) -> &RoutineTable {
        &self.routines
    }

    /// Resolve a symbol. Registered names always resolve; bare names
    /// (without the `_<package>_` prefix) only while dynamic lookup is on.
    pub fn resolve(&self, name: &str) -> Option<&RoutineDef> {
        if let Some(def) = self.routines.get(name) {
            return Some(def);
        }
        if !self.dynamic_lookup {
            return None;
        }
        self.routines.get(&format!("_{}_{}", self.package, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &Module, _: &[Value]) -> QcResult<Value> {
        Ok(Value::Null)
    }

    fn def(name: &'static str, arity: usize) -> RoutineDef {
        RoutineDef {
            name,
            func: noop,
            arity,
        }
    }

    #[test]
    fn test_duplicate_registration() {
        let mut table = RoutineTable::new();
        table.register(def("_pkg_a", 1)).unwrap();
        assert!(table.register(def("_pkg_a", 2)).is_err());
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("_pkg_a").unwrap().arity, 1);
    }

    #[test]
    fn test_resolve_with_dynamic_lookup() {
        let mut info = ModuleInfo::new("pkg");
        info.register_routines(&[def("_pkg_a", 1), def("_pkg_b", 0)]).unwrap();

        assert!(info.resolve("_pkg_a").is_some());
        assert!(info.resolve("a").is_some());

        info.use_dynamic_symbols(false);
        assert!(info.resolve("_pkg_a").is_some());
        assert!(info.resolve("a").is_none());
        assert!(info.resolve("_pkg_c").is_none());
        assert_eq!(info.routines().names(), vec!["_pkg_a", "_pkg_b"]);
    }
}
