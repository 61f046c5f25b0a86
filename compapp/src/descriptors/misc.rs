//! Plain stored fields and constants.

use crate::descriptors::{descriptor_core, Descriptor, FieldCore};
use crate::error::{Error, Result};
use crate::instance::Instance;
use crate::value::Value;

/// A stored field without verification.
#[derive(Debug, Clone)]
pub struct DataField {
    core: FieldCore,
}

impl DataField {
    /// A parameter without default.
    #[must_use]
    pub fn new() -> Self {
        Self {
            core: FieldCore::param(None),
        }
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.core.default = Some(default.into());
        self
    }

    /// Excludes the field from the parameter set.
    #[must_use]
    pub fn not_param(mut self) -> Self {
        self.core.is_param = false;
        self
    }
}

impl Default for DataField {
    fn default() -> Self {
        Self::new()
    }
}

impl Descriptor for DataField {
    descriptor_core!();
}

/// A read-only value that is not a parameter.
#[derive(Debug, Clone)]
pub struct Constant {
    core: FieldCore,
}

impl Constant {
    /// A constant holding `value`.
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            core: FieldCore::hidden(Some(value.into())),
        }
    }
}

impl Descriptor for Constant {
    descriptor_core!();

    fn is_data(&self) -> bool {
        false
    }

    fn set(&self, obj: &Instance, _value: Value) -> Result<()> {
        Err(Error::ReadOnly {
            class: obj.class().name().to_string(),
            name: self.name().to_string(),
        })
    }
}
