//! Instances of declarative classes.
//!
//! An [`Instance`] is a shared handle to one node of a parameter tree.
//! Cloning the handle does not copy the node. Trees are single-threaded:
//! handles are neither `Send` nor `Sync`.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use crate::casts;
use crate::descriptors::FieldKey;
use crate::error::{Error, Result};
use crate::model::{Attr, Class};
use crate::private::Private;
use crate::value::Value;

pub(crate) struct Node {
    class: Rc<Class>,
    vars: IndexMap<String, Value>,
    private: Private,
}

/// Handle to an instance of a [`Class`].
#[derive(Clone)]
pub struct Instance {
    node: Rc<RefCell<Node>>,
}

/// Non-owning handle to an instance.
#[derive(Clone)]
pub struct WeakInstance {
    node: Weak<RefCell<Node>>,
}

impl WeakInstance {
    /// The instance, if it is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<Instance> {
        self.node.upgrade().map(|node| Instance { node })
    }
}

impl fmt::Debug for WeakInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(instance) => write!(f, "Weak({instance:?})"),
            None => f.write_str("Weak(<dropped>)"),
        }
    }
}

impl Instance {
    /// An instance with nothing assigned and no nested instances.
    pub(crate) fn alloc(class: &Rc<Class>) -> Self {
        Self {
            node: Rc::new(RefCell::new(Node {
                class: Rc::clone(class),
                vars: IndexMap::new(),
                private: Private::default(),
            })),
        }
    }

    /// The class of the instance.
    #[must_use]
    pub fn class(&self) -> Rc<Class> {
        Rc::clone(&self.node.borrow().class)
    }

    /// Whether the instance's class is `class` or derives from it.
    #[must_use]
    pub fn is_instance_of(&self, class: &Rc<Class>) -> bool {
        self.class().is_subclass_of(class)
    }

    /// Whether both handles point at the same instance.
    #[must_use]
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }

    /// A non-owning handle.
    #[must_use]
    pub fn downgrade(&self) -> WeakInstance {
        WeakInstance {
            node: Rc::downgrade(&self.node),
        }
    }

    /// Reads attribute `name`.
    ///
    /// Declared attributes go through their `get`; other names read the
    /// assigned value, falling back to the class literal.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Attribute`] for names with no value and no default.
    /// Declared attributes may return other errors (e.g. a stale
    /// dynamic-class placeholder).
    pub fn get(&self, name: &str) -> Result<Value> {
        let class = self.class();
        let attr = class.lookup(name);
        if let Some(Attr::Field(desc)) = attr {
            return desc.get(self);
        }
        let assigned = self.node.borrow().vars.get(name).cloned();
        match (assigned, attr) {
            (Some(value), _) => Ok(value),
            (None, Some(Attr::Literal(default))) => Ok(default.clone()),
            _ => Err(Error::attribute(class.name(), name)),
        }
    }

    /// Reads a dotted path of attributes, e.g. `"nest.x"`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Attribute`] when a step is missing or is not an
    /// object.
    pub fn get_path(&self, path: &str) -> Result<Value> {
        let mut parts = path.split('.');
        let first = parts.next().unwrap_or_default();
        let mut value = self.get(first)?;
        for part in parts {
            value = match value {
                Value::Object(instance) => instance.get(part)?,
                other => return Err(Error::attribute(other.type_name(), part)),
            };
        }
        Ok(value)
    }

    /// The nested instance stored under `name`.
    ///
    /// # Errors
    ///
    /// Returns the [`get`](Instance::get) errors, or [`Error::Value`] if
    /// the attribute is not an instance.
    pub fn child(&self, name: &str) -> Result<Instance> {
        match self.get(name)? {
            Value::Object(instance) => Ok(instance),
            other => Err(Error::Value(format!(
                "{}.{} is not an object: got {} of type {}",
                self.class().name(),
                name,
                other.repr(),
                other.type_name()
            ))),
        }
    }

    /// Whether `name` currently reads without error.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_ok()
    }

    /// Assigns attribute `name`.
    ///
    /// Declared attributes verify the value; literal fields with a simple
    /// default accept only that type or a type that widens to it. Nested
    /// slots accept an instance of the slot's parametric class, or a dict
    /// applied recursively to the current nested instance.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Value`] for rejected values, [`Error::ReadOnly`]
    /// for constants and links, and [`Error::Attribute`] for undeclared
    /// names on strict classes.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let class = self.class();
        match class.lookup(name) {
            Some(Attr::Field(desc)) => desc.set(self, value),
            Some(Attr::Literal(default)) => {
                let value = if default.kind().is_simple() {
                    simple_type_check(&class, name, default, value)?
                } else {
                    value
                };
                self.assign(name, value);
                Ok(())
            }
            Some(Attr::Class(nested)) => match value {
                Value::Object(child) => {
                    crate::mixin::check_nested_object(&class, name, &child)?;
                    self.assign(name, Value::Object(child.clone()));
                    child.set_context(self, name);
                    Ok(())
                }
                Value::Dict(_) if nested.is_mixable() => {
                    self.child(name)?.rec_set_attrs(&value.to_params()?)
                }
                other => Err(Error::Value(format!(
                    "{}.{} only accepts an object or a dict of parameters: got {} of type {}",
                    class.name(),
                    name,
                    other.repr(),
                    other.type_name()
                ))),
            },
            None if class.is_strict() && !name.starts_with('_') => {
                Err(Error::attribute(class.name(), name))
            }
            None => {
                self.assign(name, value);
                Ok(())
            }
        }
    }

    pub(crate) fn assign(&self, name: &str, value: Value) {
        self.node.borrow_mut().vars.insert(name.to_string(), value);
    }

    /// The instance holding this one as a nested field.
    #[must_use]
    pub fn owner(&self) -> Option<Instance> {
        self.node.borrow().private.owner()
    }

    /// The name this instance is stored under in its owner.
    #[must_use]
    pub fn name_in_owner(&self) -> Option<String> {
        self.node.borrow().private.name().map(str::to_string)
    }

    /// The top of the tree: the first instance up the owner chain without
    /// an owner.
    #[must_use]
    pub fn root(&self) -> Instance {
        let mut current = self.clone();
        while let Some(owner) = current.owner() {
            current = owner;
        }
        current
    }

    /// Dotted path from the root to this instance; empty at the root.
    #[must_use]
    pub fn path_from_root(&self) -> String {
        let mut names = Vec::new();
        let mut current = self.clone();
        while let (Some(owner), Some(name)) = (current.owner(), current.name_in_owner()) {
            names.push(name);
            current = owner;
        }
        names.reverse();
        names.join(".")
    }

    /// Records `owner` and this instance's name in it.
    pub fn set_context(&self, owner: &Instance, name: &str) {
        self.node.borrow_mut().private.set_context(owner, name);
    }

    /// The value a declared attribute stored under `key`.
    #[must_use]
    pub fn stored(&self, key: FieldKey) -> Option<Value> {
        self.node.borrow().private.get(key).cloned()
    }

    /// Stores a declared attribute's value, bypassing verification.
    pub fn store(&self, key: FieldKey, value: Value) {
        self.node.borrow_mut().private.insert(key, value);
    }

    /// Removes a declared attribute's value so that it reads as unset.
    pub fn unset(&self, key: FieldKey) -> Option<Value> {
        self.node.borrow_mut().private.remove(key)
    }
}

/// Checks a value assigned to a literal field with a simple default.
fn simple_type_check(class: &Class, name: &str, default: &Value, value: Value) -> Result<Value> {
    let target = default.kind();
    if value.kind() == target {
        return Ok(value);
    }
    if let Some(cast) = casts::cast(target, &value) {
        return Ok(cast);
    }
    let castables: Vec<&str> = std::iter::once(target)
        .chain(casts::castables(target))
        .map(|kind| kind.as_str())
        .collect();
    Err(Error::Value(format!(
        "Value {} (type: {}) cannot be assigned to the variable {}.{} (default: {}) \
         which only accepts one of the following types: {}.",
        value.repr(),
        value.type_name(),
        class.name(),
        name,
        default,
        castables.join(", ")
    )))
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node.try_borrow() {
            Ok(node) => write!(f, "<{} object>", node.class.qualified_name()),
            Err(_) => f.write_str("<object>"),
        }
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}
