//! Process-wide widening table used by type-checked fields.
//!
//! A field that accepts kind `T` also accepts any kind `S` registered
//! under `T`, converting the value on assignment. The table starts with
//! `float <- int`; narrowing conversions are never registered by default.
//!
//! ```
//! use compapp::{casts, Value, ValueKind};
//!
//! assert_eq!(casts::cast(ValueKind::Float, &Value::Int(2)), Some(Value::Float(2.0)));
//! assert_eq!(casts::cast(ValueKind::Int, &Value::Float(2.0)), None);
//! ```

use std::sync::{OnceLock, PoisonError, RwLock};

use crate::value::{Value, ValueKind};

/// Converts a value of a registered source kind into the target kind.
///
/// Returning `None` rejects the value.
pub type Converter = fn(&Value) -> Option<Value>;

struct Entry {
    target: ValueKind,
    source: ValueKind,
    convert: Converter,
}

fn table() -> &'static RwLock<Vec<Entry>> {
    static TABLE: OnceLock<RwLock<Vec<Entry>>> = OnceLock::new();
    TABLE.get_or_init(|| {
        RwLock::new(vec![Entry {
            target: ValueKind::Float,
            source: ValueKind::Int,
            convert: int_to_float,
        }])
    })
}

#[allow(clippy::cast_precision_loss)]
fn int_to_float(value: &Value) -> Option<Value> {
    value.as_int().map(|i| Value::Float(i as f64))
}

/// Registers (or replaces) the converter from `source` to `target`.
pub fn register(target: ValueKind, source: ValueKind, convert: Converter) {
    let mut table = table().write().unwrap_or_else(PoisonError::into_inner);
    if let Some(entry) = table
        .iter_mut()
        .find(|e| e.target == target && e.source == source)
    {
        entry.convert = convert;
    } else {
        table.push(Entry {
            target,
            source,
            convert,
        });
    }
}

/// Kinds that can be converted into `target`, in registration order.
#[must_use]
pub fn castables(target: ValueKind) -> Vec<ValueKind> {
    table()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .iter()
        .filter(|e| e.target == target)
        .map(|e| e.source)
        .collect()
}

/// Converts `value` into `target` through the table.
///
/// Returns `None` if no converter is registered for the value's kind or
/// the converter rejects it. A value already of kind `target` is not
/// passed through the table.
#[must_use]
pub fn cast(target: ValueKind, value: &Value) -> Option<Value> {
    let source = value.kind();
    let convert = table()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .iter()
        .find(|e| e.target == target && e.source == source)
        .map(|e| e.convert)?;
    convert(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_widens_to_float() {
        assert_eq!(castables(ValueKind::Float), vec![ValueKind::Int]);
        assert_eq!(cast(ValueKind::Float, &Value::Int(3)), Some(Value::Float(3.0)));
    }

    #[test]
    fn no_narrowing() {
        assert!(castables(ValueKind::Int).is_empty());
        assert_eq!(cast(ValueKind::Int, &Value::Float(3.0)), None);
    }

    #[test]
    fn user_converters_extend_the_table() {
        fn empty_str_to_none(value: &Value) -> Option<Value> {
            (value.as_str() == Some("")).then_some(Value::None)
        }
        register(ValueKind::None, ValueKind::Str, empty_str_to_none);
        assert_eq!(cast(ValueKind::None, &Value::from("")), Some(Value::None));
        assert_eq!(cast(ValueKind::None, &Value::from("x")), None);
    }
}
