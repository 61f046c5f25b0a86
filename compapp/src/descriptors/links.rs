//! Read-only indirection to values elsewhere in the instance tree.
//!
//! A path with `n` leading dots goes up `n - 1` owners and resolves the
//! rest from there; a path without leading dots resolves from the root.
//! `''` is the root itself, `'.'` the instance itself, `'..'` its owner.
//!
//! ```
//! use compapp::descriptors::Link;
//! use compapp::{ClassBuilder, Instance, Value};
//!
//! # fn main() -> compapp::Result<()> {
//! let inner = ClassBuilder::parametric("nest")
//!     .literal("x", 2)
//!     .field("up", Link::new("..x"))
//!     .field("broken", Link::new("...x").with_default(-1))
//!     .build()?;
//! let class = ClassBuilder::parametric("MyParametric")
//!     .literal("x", 1)
//!     .nested("nest", &inner)
//!     .build()?;
//! let par = Instance::new(&class, compapp::params! {})?;
//! assert_eq!(par.get_path("nest.up")?, Value::Int(1));
//! assert_eq!(par.get_path("nest.broken")?, Value::Int(-1));
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::descriptors::{descriptor_core, missing, Descriptor, FieldBinding, FieldCore};
use crate::error::{Error, Result};
use crate::instance::Instance;
use crate::value::Value;

/// Function applied to a resolved link value.
pub type Adapter = Rc<dyn Fn(Value) -> Result<Value>>;

/// Path-based, read-only view of another field.
///
/// A missing hop or attribute yields the link's default, or an
/// attribute error when it has none. Links are not parameters.
#[derive(Clone)]
pub struct Link {
    core: FieldCore,
    path: String,
    delegate: bool,
    adapter: Option<Adapter>,
}

impl Link {
    /// A link following `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            core: FieldCore::hidden(None),
            path: path.into(),
            delegate: false,
            adapter: None,
        }
    }

    /// The owner's field of the same name, i.e. `Link::new("..<name>")`.
    #[must_use]
    pub fn delegate() -> Self {
        Self {
            delegate: true,
            ..Self::new("..")
        }
    }

    /// The root of the tree.
    #[must_use]
    pub fn root() -> Self {
        Self::new("")
    }

    /// The owner of the instance.
    #[must_use]
    pub fn owner() -> Self {
        Self::new("..")
    }

    /// Value returned when the path does not resolve.
    #[must_use]
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.core.default = Some(default.into());
        self
    }

    /// Transforms the resolved value before it is returned.
    #[must_use]
    pub fn adapter(mut self, adapter: impl Fn(Value) -> Result<Value> + 'static) -> Self {
        self.adapter = Some(Rc::new(adapter));
        self
    }

    /// The path this link follows.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Follows the path from `obj`. `Ok(None)` means some hop is missing.
    ///
    /// # Errors
    ///
    /// Errors other than a missing attribute are propagated, as are
    /// adapter errors.
    pub fn resolve(&self, obj: &Instance) -> Result<Option<Value>> {
        let (start, rest) = if self.path.starts_with('.') {
            let rest = self.path.trim_start_matches('.');
            let dots = self.path.len() - rest.len();
            let mut start = Some(obj.clone());
            for _ in 1..dots {
                start = start.and_then(|s| s.owner());
            }
            match start {
                Some(start) => (start, rest),
                None => return Ok(None),
            }
        } else {
            (obj.root(), self.path.as_str())
        };

        let mut value = Value::Object(start);
        if !rest.is_empty() {
            for part in rest.split('.') {
                let Value::Object(current) = &value else {
                    return Ok(None);
                };
                value = match current.get(part) {
                    Ok(next) => next,
                    Err(err) if err.is_attribute() => return Ok(None),
                    Err(err) => return Err(err),
                };
            }
        }

        match &self.adapter {
            Some(adapter) => adapter(value).map(Some),
            None => Ok(Some(value)),
        }
    }
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link")
            .field("name", &self.name())
            .field("path", &self.path)
            .field("default", &self.core.default)
            .field("adapter", &self.adapter.is_some())
            .finish()
    }
}

impl Descriptor for Link {
    descriptor_core!();

    fn bind(&mut self, binding: &FieldBinding) {
        self.core.binding = binding.clone();
        if self.delegate {
            self.path = format!("..{}", binding.name);
        }
    }

    fn is_data(&self) -> bool {
        false
    }

    fn get(&self, obj: &Instance) -> Result<Value> {
        if let Some(value) = self.resolve(obj)? {
            return Ok(value);
        }
        trace!(field = self.name(), path = %self.path, "link did not resolve");
        self.default_value().ok_or_else(|| missing(obj, self.name()))
    }

    fn set(&self, obj: &Instance, _value: Value) -> Result<()> {
        Err(Error::ReadOnly {
            class: obj.class().name().to_string(),
            name: self.name().to_string(),
        })
    }
}
