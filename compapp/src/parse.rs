//! Parsing command-line text into typed values.

use crate::error::{Error, Result};
use crate::serializer::json;
use crate::value::{Value, ValueKind};

/// Parses `true/yes/on/1` and `false/no/off/0`, ignoring case.
///
/// ```
/// assert_eq!(compapp::parse::parse_bool("Yes"), Some(true));
/// assert_eq!(compapp::parse::parse_bool("off"), Some(false));
/// assert_eq!(compapp::parse::parse_bool("maybe"), None);
/// ```
#[must_use]
pub fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Parses `text` as a value of `kind`.
///
/// Containers are read as JSON and must have the requested shape; a JSON
/// array is accepted for both lists and tuples. Objects cannot be parsed.
#[must_use]
pub fn parse_as(kind: ValueKind, text: &str) -> Option<Value> {
    match kind {
        ValueKind::None => matches!(text.trim(), "None" | "null").then_some(Value::None),
        ValueKind::Bool => parse_bool(text).map(Value::Bool),
        ValueKind::Int => text.trim().parse().ok().map(Value::Int),
        ValueKind::Float => text.trim().parse().ok().map(Value::Float),
        ValueKind::Str => Some(Value::Str(text.to_string())),
        ValueKind::List => match parse_json(text).ok()? {
            Value::List(items) => Some(Value::List(items)),
            _ => None,
        },
        ValueKind::Tuple => match parse_json(text).ok()? {
            Value::List(items) => Some(Value::Tuple(items)),
            _ => None,
        },
        ValueKind::Dict => parse_json(text).ok().filter(|v| v.kind() == ValueKind::Dict),
        ValueKind::Object => None,
    }
}

/// Parses `text` as the first of `kinds` that accepts it.
///
/// # Errors
///
/// Returns [`Error::Parse`] when no kind accepts the text.
pub fn parse_first(kinds: &[ValueKind], text: &str) -> Result<Value> {
    kinds
        .iter()
        .find_map(|kind| parse_as(*kind, text))
        .ok_or_else(|| {
            let names: Vec<&str> = kinds.iter().map(|k| k.as_str()).collect();
            Error::Parse(format!(
                "cannot parse {} as any of ({})",
                Value::from(text).repr(),
                names.join(", ")
            ))
        })
}

/// Parses a JSON document into a value.
///
/// # Errors
///
/// Returns [`Error::Parse`] for malformed JSON.
pub fn parse_json(text: &str) -> Result<Value> {
    let parsed: serde_json::Value = serde_json::from_str(text)
        .map_err(|err| Error::Parse(format!("invalid JSON {}: {err}", Value::from(text).repr())))?;
    Ok(json::value_from_json(&parsed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars() {
        assert_eq!(parse_as(ValueKind::Int, "42"), Some(Value::Int(42)));
        assert_eq!(parse_as(ValueKind::Int, "4.2"), None);
        assert_eq!(parse_as(ValueKind::Float, "4"), Some(Value::Float(4.0)));
        assert_eq!(parse_as(ValueKind::Str, " a "), Some(Value::from(" a ")));
        assert_eq!(parse_as(ValueKind::Bool, "ON"), Some(Value::Bool(true)));
    }

    #[test]
    fn containers_are_json() {
        assert_eq!(parse_as(ValueKind::List, "[1, 2]"), Some(Value::list([1, 2])));
        assert_eq!(parse_as(ValueKind::Tuple, "[1]"), Some(Value::tuple([1])));
        assert_eq!(parse_as(ValueKind::Dict, "[1]"), None);
        assert!(parse_json("{").is_err());
    }

    #[test]
    fn first_matching_kind_wins() {
        let kinds = [ValueKind::Int, ValueKind::Str];
        assert_eq!(parse_first(&kinds, "1").ok(), Some(Value::Int(1)));
        assert_eq!(parse_first(&kinds, "x").ok(), Some(Value::from("x")));
        let err = parse_first(&[ValueKind::Int], "x");
        assert!(matches!(err, Err(Error::Parse(msg)) if msg == "cannot parse 'x' as any of (int)"));
    }
}
