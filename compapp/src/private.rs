//! Hidden per-instance context.
//!
//! Every instance owns one [`Private`]: the values of its declared
//! attributes keyed by [`FieldKey`], plus a weak reference to its owner
//! and the name it is stored under there. The owner reference is weak, so
//! an owner and its nested instances do not keep each other alive; a
//! nested instance is only reachable through its owner, which therefore
//! outlives it.

use std::collections::HashMap;

use crate::descriptors::FieldKey;
use crate::instance::{Instance, WeakInstance};
use crate::value::Value;

/// Declared-attribute storage and owner bookkeeping of one instance.
#[derive(Debug, Default)]
pub struct Private {
    data: HashMap<FieldKey, Value>,
    owner: Option<WeakInstance>,
    name: Option<String>,
}

impl Private {
    /// The value stored under `key`.
    #[must_use]
    pub fn get(&self, key: FieldKey) -> Option<&Value> {
        self.data.get(&key)
    }

    /// Stores `value` under `key`.
    pub fn insert(&mut self, key: FieldKey, value: Value) {
        self.data.insert(key, value);
    }

    /// Removes the value under `key`.
    pub fn remove(&mut self, key: FieldKey) -> Option<Value> {
        self.data.remove(&key)
    }

    /// Records the owner and the name this instance has in it.
    pub fn set_context(&mut self, owner: &Instance, name: &str) {
        self.owner = Some(owner.downgrade());
        self.name = Some(name.to_string());
    }

    /// The owner, if any and still alive.
    #[must_use]
    pub fn owner(&self) -> Option<Instance> {
        self.owner.as_ref().and_then(WeakInstance::upgrade)
    }

    /// The name under which the owner stores this instance.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}
