//! Late-bound sub-components: a class path and the instance it names.
//!
//! [`ClassPath`] stores a dotted class path; [`ClassPlaceholder`] imports
//! that class from the [registry](crate::registry) on first read and
//! instantiates it with the dict stored in the placeholder (or with no
//! parameters). Assigning an instance to the placeholder writes its class
//! path back. Reading a placeholder whose instance no longer matches the
//! class path is an error rather than a silent re-instantiation.
//!
//! ```
//! use compapp::descriptors::DynamicClass;
//! use compapp::{ClassBuilder, Instance, Value};
//!
//! # fn main() -> compapp::Result<()> {
//! ClassBuilder::parametric("ClassA").module("mymodule").literal("a", 1).build()?;
//! let class_b = ClassBuilder::parametric("ClassB").module("mymodule").literal("b", 2).build()?;
//! let app = ClassBuilder::parametric("MyApp")
//!     .dynamic_class("obj", "path", DynamicClass::new(".ClassA").prefix("mymodule"))
//!     .build()?;
//!
//! let app = Instance::new(&app, compapp::params! {})?;
//! assert_eq!(app.get_path("obj.a")?, Value::Int(1));
//!
//! app.set("obj", Instance::new(&class_b, compapp::params! {})?)?;
//! assert_eq!(app.get("path")?, Value::from("mymodule.ClassB"));
//!
//! app.set("path", "mymodule.ClassA")?;
//! assert!(app.get("obj").is_err());
//! # Ok(())
//! # }
//! ```

use std::rc::Rc;

use tracing::debug;

use crate::descriptors::{descriptor_core, field_label, Descriptor, FieldCore};
use crate::error::{Error, Result};
use crate::instance::Instance;
use crate::model::Class;
use crate::registry;
use crate::value::{Params, Value, ValueKind};

/// A dotted class path, optionally relative to a prefix.
#[derive(Debug, Clone)]
pub struct ClassPath {
    core: FieldCore,
    prefix: Option<String>,
}

impl ClassPath {
    /// A class path defaulting to `default`.
    pub fn new(default: impl Into<String>, prefix: Option<String>) -> Self {
        Self {
            core: FieldCore::param(Some(Value::Str(default.into()))),
            prefix,
        }
    }

    /// The path currently stored on `obj`, as written.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Value`] if the stored value is not a string.
    pub fn current(&self, obj: &Instance) -> Result<String> {
        match self.get(obj)? {
            Value::Str(path) => Ok(path),
            other => Err(Error::Value(format!(
                "{} must be a class path string: got {}",
                field_label(obj, self.name()),
                other.repr()
            ))),
        }
    }

    /// Expands a relative path (one starting with `.`) with the prefix.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Value`] for a relative path without a prefix.
    pub fn full_path(&self, path: &str) -> Result<String> {
        if !path.starts_with('.') {
            return Ok(path.to_string());
        }
        match &self.prefix {
            Some(prefix) => Ok(format!("{prefix}{path}")),
            None => Err(Error::Value(
                "relative import path is specified but no prefix is defined.".to_string(),
            )),
        }
    }

    /// Imports the class currently named on `obj`.
    ///
    /// # Errors
    ///
    /// Returns the [`full_path`](ClassPath::full_path) errors, or
    /// [`Error::Import`] when the path names no registered class.
    pub fn class_for(&self, obj: &Instance) -> Result<Rc<Class>> {
        registry::import_class(&self.full_path(&self.current(obj)?)?)
    }

    fn store_raw(&self, obj: &Instance, path: String) {
        obj.store(self.key(), Value::Str(path));
    }
}

impl Descriptor for ClassPath {
    descriptor_core!();

    fn value_kinds(&self) -> Vec<ValueKind> {
        vec![ValueKind::Str]
    }

    fn verify(&self, obj: &Instance, value: Value, name: Option<&str>) -> Result<Value> {
        let Value::Str(path) = &value else {
            return Err(Error::Value(format!(
                "{} only accepts type of str: got {} of type {}",
                field_label(obj, name.unwrap_or(self.name())),
                value.repr(),
                value.type_name()
            )));
        };
        registry::import_class(&self.full_path(path)?)?;
        Ok(value)
    }
}

/// The instance of the class named by a [`ClassPath`].
#[derive(Debug)]
pub struct ClassPlaceholder {
    core: FieldCore,
    path: Rc<ClassPath>,
}

impl ClassPlaceholder {
    /// A placeholder realized from `path`; `default` is the parameter dict
    /// used when nothing was assigned.
    #[must_use]
    pub fn new(path: Rc<ClassPath>, default: Option<Value>, is_param: bool) -> Self {
        Self {
            core: FieldCore {
                is_param,
                ..FieldCore::param(default)
            },
            path,
        }
    }

    /// The paired class path.
    #[must_use]
    pub fn class_path(&self) -> &ClassPath {
        &self.path
    }

    /// Whether the stored instance (if any) matches the current class path.
    ///
    /// # Errors
    ///
    /// Propagates class path resolution errors.
    pub fn is_consistent(&self, obj: &Instance) -> Result<bool> {
        match obj.stored(self.key()) {
            Some(Value::Object(instance)) => {
                let full = self.path.full_path(&self.path.current(obj)?)?;
                if instance.class().qualified_name() == full {
                    return Ok(true);
                }
                let class = registry::import_class(&full)?;
                Ok(instance.is_instance_of(&class))
            }
            _ => Ok(true),
        }
    }

    fn stale(&self, obj: &Instance, value: &Value) -> Result<Error> {
        let classpath = self.path.current(obj)?;
        let (vname, pname) = (self.name(), self.path.name());
        Ok(Error::Value(format!(
            "Trying to get obj.{vname}={} but it does not match with class path \
             obj.{pname}={classpath}.\n\
             The class path obj.{pname} might be changed after the first access of \
             obj.{vname}.\n\
             Note: obj={obj:?}.",
            value.repr()
        )))
    }
}

impl Descriptor for ClassPlaceholder {
    descriptor_core!();

    fn value_kinds(&self) -> Vec<ValueKind> {
        vec![ValueKind::Object]
    }

    fn get(&self, obj: &Instance) -> Result<Value> {
        let stored = obj.stored(self.key()).or_else(|| self.default_value());
        let full = self.path.full_path(&self.path.current(obj)?)?;
        if let Some(Value::Object(instance)) = &stored {
            if instance.class().qualified_name() == full {
                return Ok(Value::Object(instance.clone()));
            }
        }

        let class = registry::import_class(&full)?;
        let params = match stored {
            Some(Value::Object(instance)) if instance.is_instance_of(&class) => {
                return Ok(Value::Object(instance));
            }
            None => Params::new(),
            Some(value @ Value::Dict(_)) => value.to_params()?,
            Some(value) => return Err(self.stale(obj, &value)?),
        };

        let instance = Instance::new(&class, params)?;
        obj.store(self.key(), Value::Object(instance.clone()));
        instance.set_context(obj, self.name());
        debug!(field = self.name(), class = %full, "realized dynamic class");
        Ok(Value::Object(instance))
    }

    fn verify(&self, obj: &Instance, value: Value, name: Option<&str>) -> Result<Value> {
        match value {
            Value::Dict(_) | Value::Object(_) => Ok(value),
            other => Err(Error::Value(format!(
                "{} only accepts type of dict or object: got {} of type {}",
                field_label(obj, name.unwrap_or(self.name())),
                other.repr(),
                other.type_name()
            ))),
        }
    }

    fn set(&self, obj: &Instance, value: Value) -> Result<()> {
        let value = self.verify(obj, value, None)?;
        obj.store(self.key(), value.clone());
        if let Value::Object(instance) = value {
            self.path.store_raw(obj, instance.class().qualified_name());
            instance.set_context(obj, self.name());
        }
        Ok(())
    }

    fn parse(&self, text: &str) -> Result<Value> {
        crate::parse::parse_as(ValueKind::Dict, text).ok_or_else(|| {
            Error::Parse(format!(
                "cannot parse {} as dict",
                Value::from(text).repr()
            ))
        })
    }
}

/// Declaration of a dynamic-class pair, added with
/// [`ClassBuilder::dynamic_class`](crate::ClassBuilder::dynamic_class).
#[derive(Debug, Clone)]
pub struct DynamicClass {
    path: String,
    prefix: Option<String>,
    default: Option<Params>,
    is_param: bool,
}

impl DynamicClass {
    /// Defaults to the class at `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            prefix: None,
            default: None,
            is_param: true,
        }
    }

    /// Defaults to `class`, which must be registered under a module.
    #[must_use]
    pub fn of(class: &Class) -> Self {
        Self::new(class.qualified_name())
    }

    /// Module path that relative paths are resolved against.
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Parameters passed to the class when the placeholder is realized
    /// without an assigned dict.
    #[must_use]
    pub fn with_default(mut self, params: Params) -> Self {
        self.default = Some(params);
        self
    }

    /// Excludes the instance from the parameter set.
    #[must_use]
    pub fn not_param(mut self) -> Self {
        self.is_param = false;
        self
    }

    pub(crate) fn into_parts(self) -> (ClassPath, bool, Option<Value>) {
        (
            ClassPath::new(self.path, self.prefix),
            self.is_param,
            self.default.map(Value::from),
        )
    }
}
