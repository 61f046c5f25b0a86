//! Declared attributes: class-level field declarations.
//!
//! A declared attribute controls the default, validation and storage of
//! one field. It is shared by every instance of the class that declares
//! it and never holds per-instance state; values live in the instance's
//! private context, keyed by the attribute's [`FieldKey`].
//!
//! Attributes are created unbound and receive their field name and key
//! when added to a [`ClassBuilder`](crate::ClassBuilder). Composite
//! attributes ([`Or`], [`List`], [`Dict`], [`Required`]) forward the
//! binding to their components, so a component reads and writes the same
//! storage slot and reports the same field name as its parent.

use std::any::Any;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{Error, Result};
use crate::instance::Instance;
use crate::value::{Value, ValueKind};

/// Implements the three accessor methods of [`Descriptor`] for a type
/// with a `core: FieldCore` field.
macro_rules! descriptor_core {
    () => {
        fn core(&self) -> &$crate::descriptors::FieldCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut $crate::descriptors::FieldCore {
            &mut self.core
        }

        fn as_any(&self) -> &dyn ::std::any::Any {
            self
        }
    };
}
pub(crate) use descriptor_core;

pub mod dynamic_class;
pub mod links;
pub mod misc;
pub mod traits;

pub use dynamic_class::{ClassPath, ClassPlaceholder, DynamicClass};
pub use links::Link;
pub use misc::{Constant, DataField};
pub use traits::{Choice, Dict, List, OfType, Optional, Or, Required, TypeSpec};

/// Identity of a storage slot in an instance's private context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldKey(u64);

impl FieldKey {
    /// A key never handed out before in this process.
    #[must_use]
    pub fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        FieldKey(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Name and storage key given to an attribute when it joins a class.
#[derive(Debug, Clone)]
pub struct FieldBinding {
    /// Storage key.
    pub key: FieldKey,
    /// Field name within the declaring class.
    pub name: Rc<str>,
}

impl FieldBinding {
    /// A binding for `name` with a fresh key.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            key: FieldKey::fresh(),
            name: Rc::from(name),
        }
    }
}

impl Default for FieldBinding {
    fn default() -> Self {
        Self::new("<unknown>")
    }
}

/// State common to every declared attribute.
#[derive(Debug, Clone, Default)]
pub struct FieldCore {
    /// Name and key, set when the attribute is bound.
    pub binding: FieldBinding,
    /// Default value; `None` means reading before assignment is an error.
    pub default: Option<Value>,
    /// Whether the field counts as a parameter.
    pub is_param: bool,
}

impl FieldCore {
    /// A parameter core with the given default.
    #[must_use]
    pub fn param(default: Option<Value>) -> Self {
        Self {
            binding: FieldBinding::default(),
            default,
            is_param: true,
        }
    }

    /// A non-parameter core with the given default.
    #[must_use]
    pub fn hidden(default: Option<Value>) -> Self {
        Self {
            is_param: false,
            ..Self::param(default)
        }
    }
}

/// A class-level field declaration.
///
/// Implementors provide [`core`](Descriptor::core) access and override
/// [`verify`](Descriptor::verify), [`get`](Descriptor::get) or
/// [`set`](Descriptor::set) where they differ from a plain stored value.
pub trait Descriptor: Any + fmt::Debug {
    /// Shared state.
    fn core(&self) -> &FieldCore;

    /// Shared state, mutably. Only used before the class is built.
    fn core_mut(&mut self) -> &mut FieldCore;

    /// Upcast for downcasting to the concrete attribute type.
    fn as_any(&self) -> &dyn Any;

    /// Gives the attribute its field name and storage key.
    fn bind(&mut self, binding: &FieldBinding) {
        self.core_mut().binding = binding.clone();
    }

    /// Field name, or `<unknown>` before binding.
    fn name(&self) -> &str {
        &self.core().binding.name
    }

    /// Storage key.
    fn key(&self) -> FieldKey {
        self.core().binding.key
    }

    /// Whether the field counts as a parameter.
    fn is_param(&self) -> bool {
        self.core().is_param
    }

    /// Whether the field stores values. Non-data fields only observe.
    fn is_data(&self) -> bool {
        true
    }

    /// The declared default, if any.
    fn default_value(&self) -> Option<Value> {
        self.core().default.clone()
    }

    /// Kinds of value the field can hold, for type-filtered introspection.
    /// Empty when unknown.
    fn value_kinds(&self) -> Vec<ValueKind> {
        self.default_value()
            .map(|value| vec![value.kind()])
            .unwrap_or_default()
    }

    /// Reads the field from `obj`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Attribute`] when nothing is stored and there is no
    /// default.
    fn get(&self, obj: &Instance) -> Result<Value> {
        obj.stored(self.key())
            .or_else(|| self.default_value())
            .ok_or_else(|| missing(obj, self.name()))
    }

    /// Checks (and possibly converts) a candidate value. `name` overrides
    /// the field name in error messages, e.g. `intlist[2]`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Value`] when the value is rejected.
    fn verify(&self, obj: &Instance, value: Value, name: Option<&str>) -> Result<Value> {
        let _ = (obj, name);
        Ok(value)
    }

    /// Verifies `value` and stores it on `obj`.
    ///
    /// # Errors
    ///
    /// Propagates [`verify`](Descriptor::verify) errors.
    fn set(&self, obj: &Instance, value: Value) -> Result<()> {
        let value = self.verify(obj, value, None)?;
        obj.store(self.key(), value);
        Ok(())
    }

    /// Turns command-line text into a value for this field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] when the text does not fit the field.
    fn parse(&self, text: &str) -> Result<Value> {
        Ok(Value::Str(text.to_string()))
    }
}

impl dyn Descriptor {
    /// Downcasts to a concrete attribute type.
    #[must_use]
    pub fn downcast_ref<T: Descriptor>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Returns true if the attribute is a `T`.
    #[must_use]
    pub fn is<T: Descriptor>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

/// Shared descriptors, as stored in a class's field table.
pub type SharedDescriptor = Rc<dyn Descriptor>;

/// The "no attribute" error for field `name` of `obj`.
pub(crate) fn missing(obj: &Instance, name: &str) -> Error {
    Error::attribute(obj.class().name(), name)
}

/// `Class.field` as shown in error messages.
pub(crate) fn field_label(obj: &Instance, name: &str) -> String {
    format!("{}.{}", obj.class().name(), name)
}
