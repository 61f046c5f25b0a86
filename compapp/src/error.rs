//! Error taxonomy shared by every part of the parameter tree.
//!
//! Configuration, structural and consistency problems are all
//! [`Error::Value`]; reading an unset field without a default is
//! [`Error::Attribute`]. Nothing in the core catches or retries these,
//! except that [`Instance::params`](crate::Instance::params) and link
//! resolution treat an attribute error as "not currently determined".

use std::fmt;

/// Errors raised while declaring, constructing, reading or writing a
/// parameter tree.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A value was rejected by a field: wrong type, not one of the
    /// choices, matched by no `Or` component, a nested override for a
    /// name that is not a nested class, or a stale dynamic-class
    /// placeholder.
    #[error("{0}")]
    Value(String),

    /// Reading a field that has no default and was never assigned.
    #[error("'{class}' object has no attribute '{name}'")]
    Attribute {
        /// Name of the class of the object being read.
        class: String,
        /// Name of the missing attribute.
        name: String,
    },

    /// Writing a field that only observes values (`Constant`, `Link`).
    #[error("can't set attribute {class}.{name}")]
    ReadOnly {
        /// Name of the class of the object being written.
        class: String,
        /// Name of the read-only attribute.
        name: String,
    },

    /// A dynamic-class path that names no registered class.
    #[error("{0}")]
    Import(String),

    /// A string that a field cannot turn into a value.
    #[error("{0}")]
    Parse(String),

    /// Several errors collected from one pass over a tree.
    #[error("{0}")]
    Multiple(MultiError),
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Builds an [`Error::Attribute`].
    pub fn attribute(class: impl Into<String>, name: impl Into<String>) -> Self {
        Error::Attribute {
            class: class.into(),
            name: name.into(),
        }
    }

    /// Returns true for [`Error::Attribute`], the "value not determined"
    /// outcome that readers are allowed to tolerate.
    #[must_use]
    pub fn is_attribute(&self) -> bool {
        matches!(self, Error::Attribute { .. })
    }

    /// Short name of the error category, as shown in aggregated reports.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Error::Value(_) => "ValueError",
            Error::Attribute { .. } => "AttributeError",
            Error::ReadOnly { .. } => "TypeError",
            Error::Import(_) => "ImportError",
            Error::Parse(_) => "ParseError",
            Error::Multiple(_) => "MultiError",
        }
    }
}

/// An ordered collection of errors reported together.
#[derive(Debug)]
pub struct MultiError {
    /// Headline printed before the individual errors.
    pub message: String,
    /// The collected errors, in the order they were found.
    pub errors: Vec<Error>,
}

impl MultiError {
    /// Creates an empty collection with the default headline.
    pub fn new() -> Self {
        Self {
            message: "Multiple exceptions are raised:".to_string(),
            errors: Vec::new(),
        }
    }

    /// Records the error of `result`, if any, and passes the value through.
    pub fn record<T>(&mut self, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.errors.push(err);
                None
            }
        }
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Turns the collection into `Ok(())` when empty, or [`Error::Multiple`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Multiple`] when at least one error was recorded.
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Multiple(self))
        }
    }
}

impl Default for MultiError {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MultiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        for err in &self.errors {
            write!(f, "\n* {}: {}", err.type_name(), err)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_message_names_class_and_field() {
        let err = Error::attribute("MyParametric", "i");
        assert_eq!(err.to_string(), "'MyParametric' object has no attribute 'i'");
        assert!(err.is_attribute());
    }

    #[test]
    fn multi_error_lists_each_error() {
        let mut multi = MultiError::new();
        assert!(multi.record::<()>(Err(Error::Value("1".into()))).is_none());
        assert_eq!(multi.record(Ok(3)), Some(3));
        multi.record::<()>(Err(Error::attribute("A", "b")));
        assert_eq!(
            multi.to_string(),
            "Multiple exceptions are raised:\n\
             * ValueError: 1\n\
             * AttributeError: 'A' object has no attribute 'b'"
        );
        assert!(multi.into_result().is_err());
    }

    #[test]
    fn empty_multi_error_is_ok() {
        assert!(MultiError::new().into_result().is_ok());
    }
}
