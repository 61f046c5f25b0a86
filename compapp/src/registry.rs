//! Class registry used to resolve dynamic-class paths.
//!
//! Classes built with a module are registered under `module.Name`. Class
//! definitions are `Rc`-shared and therefore per thread; so is the
//! registry.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::model::Class;

thread_local! {
    static CLASSES: RefCell<BTreeMap<String, Rc<Class>>> = RefCell::new(BTreeMap::new());
}

/// Registers `class` under its qualified name, replacing any previous
/// class of that name.
pub fn register(class: &Rc<Class>) {
    CLASSES.with(|classes| {
        classes
            .borrow_mut()
            .insert(class.qualified_name(), Rc::clone(class));
    });
}

/// Looks up the class registered under `path`.
///
/// # Errors
///
/// Returns [`Error::Import`] if no class has that path.
pub fn import_class(path: &str) -> Result<Rc<Class>> {
    CLASSES
        .with(|classes| classes.borrow().get(path).cloned())
        .ok_or_else(|| Error::Import(format!("No class named '{path}' is registered")))
}

/// Whether a class is registered under `path`.
#[must_use]
pub fn is_registered(path: &str) -> bool {
    CLASSES.with(|classes| classes.borrow().contains_key(path))
}

/// Paths of all registered classes, sorted.
#[must_use]
pub fn registered() -> Vec<String> {
    CLASSES.with(|classes| classes.borrow().keys().cloned().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ClassBuilder;

    #[test]
    fn build_registers_classes_with_a_module() {
        let class = ClassBuilder::parametric("Registered")
            .module("registry_tests")
            .build()
            .unwrap();
        assert!(is_registered("registry_tests.Registered"));
        let found = import_class("registry_tests.Registered").unwrap();
        assert!(Rc::ptr_eq(&found, &class));
        assert!(registered().contains(&"registry_tests.Registered".to_string()));
    }

    #[test]
    fn unknown_paths_fail_to_import() {
        let err = import_class("registry_tests.Missing").unwrap_err();
        assert_eq!(err.to_string(), "No class named 'registry_tests.Missing' is registered");
    }
}
