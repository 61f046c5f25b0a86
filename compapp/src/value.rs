//! Dynamic values stored in parameter fields.
//!
//! [`Value`] covers the primitive and container types a parameter may
//! hold, plus [`Value::Object`] for nested instances. Parameter dumps use
//! [`Params`], an insertion-ordered map from field name to value.

use std::fmt;

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::instance::Instance;

/// Field name to value, in declaration order.
pub type Params = IndexMap<String, Value>;

/// Contents of a [`Value::Dict`].
pub type Dict = IndexMap<Key, Value>;

/// Type tag of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// `None`.
    None,
    /// Booleans.
    Bool,
    /// 64-bit signed integers.
    Int,
    /// 64-bit floats.
    Float,
    /// Strings.
    Str,
    /// Lists.
    List,
    /// Tuples.
    Tuple,
    /// Dictionaries.
    Dict,
    /// Nested instances.
    Object,
}

impl ValueKind {
    /// The type name used in error messages.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "NoneType",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
            Self::List => "list",
            Self::Tuple => "tuple",
            Self::Dict => "dict",
            Self::Object => "object",
        }
    }

    /// Simple kinds are type-checked when assigned to a literal field.
    #[must_use]
    pub fn is_simple(self) -> bool {
        matches!(self, Self::Bool | Self::Int | Self::Float | Self::Str)
    }

    /// Basic kinds make a literal class attribute count as a parameter.
    #[must_use]
    pub fn is_basic(self) -> bool {
        self.is_simple() || matches!(self, Self::List | Self::Tuple | Self::Dict)
    }

    /// A fresh "empty" value of this kind, if the kind has one.
    #[must_use]
    pub fn zero(self) -> Option<Value> {
        match self {
            Self::None => Some(Value::None),
            Self::Bool => Some(Value::Bool(false)),
            Self::Int => Some(Value::Int(0)),
            Self::Float => Some(Value::Float(0.0)),
            Self::Str => Some(Value::Str(String::new())),
            Self::List => Some(Value::List(Vec::new())),
            Self::Tuple => Some(Value::Tuple(Vec::new())),
            Self::Dict => Some(Value::Dict(Dict::new())),
            Self::Object => None,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hashable dictionary key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// Boolean key.
    Bool(bool),
    /// Integer key.
    Int(i64),
    /// String key.
    Str(String),
}

impl Key {
    /// Converts a value into a key, if its kind is hashable.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(Key::Bool(*b)),
            Value::Int(i) => Some(Key::Int(*i)),
            Value::Str(s) => Some(Key::Str(s.clone())),
            _ => None,
        }
    }

    /// The key as a value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Key::Bool(b) => Value::Bool(*b),
            Key::Int(i) => Value::Int(*i),
            Key::Str(s) => Value::Str(s.clone()),
        }
    }

    /// Quoted form used in error messages, e.g. `'a'` or `1`.
    #[must_use]
    pub fn repr(&self) -> String {
        self.to_value().repr()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Str(s) => f.write_str(s),
            other => f.write_str(&other.repr()),
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Str(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Str(s)
    }
}

impl From<i64> for Key {
    fn from(i: i64) -> Self {
        Key::Int(i)
    }
}

/// A parameter value.
#[derive(Debug, Clone)]
pub enum Value {
    /// Absence of a value.
    None,
    /// A boolean.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// A float.
    Float(f64),
    /// A string.
    Str(String),
    /// A list.
    List(Vec<Value>),
    /// A tuple.
    Tuple(Vec<Value>),
    /// A dictionary.
    Dict(Dict),
    /// A nested instance.
    Object(Instance),
}

impl Value {
    /// Builds a [`Value::List`].
    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    /// Builds a [`Value::Tuple`].
    pub fn tuple<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::Tuple(items.into_iter().map(Into::into).collect())
    }

    /// The kind of this value.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::None => ValueKind::None,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Str(_) => ValueKind::Str,
            Value::List(_) => ValueKind::List,
            Value::Tuple(_) => ValueKind::Tuple,
            Value::Dict(_) => ValueKind::Dict,
            Value::Object(_) => ValueKind::Object,
        }
    }

    /// Type name used in error messages; the class name for objects.
    #[must_use]
    pub fn type_name(&self) -> String {
        match self {
            Value::Object(instance) => instance.class().name().to_string(),
            other => other.kind().as_str().to_string(),
        }
    }

    /// Returns true for [`Value::None`].
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// The boolean, if this is a [`Value::Bool`].
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The integer, if this is a [`Value::Int`].
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// The float, if this is a [`Value::Float`].
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    /// The string, if this is a [`Value::Str`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The items of a list or a tuple.
    #[must_use]
    pub fn as_items(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) | Value::Tuple(items) => Some(items),
            _ => None,
        }
    }

    /// The map, if this is a [`Value::Dict`].
    #[must_use]
    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Value::Dict(map) => Some(map),
            _ => None,
        }
    }

    /// The instance, if this is a [`Value::Object`].
    #[must_use]
    pub fn as_object(&self) -> Option<&Instance> {
        match self {
            Value::Object(instance) => Some(instance),
            _ => None,
        }
    }

    /// Consumes the value and returns the instance, if any.
    #[must_use]
    pub fn into_object(self) -> Option<Instance> {
        match self {
            Value::Object(instance) => Some(instance),
            _ => None,
        }
    }

    /// Reads a string-keyed [`Value::Dict`] as a parameter map.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Value`] if this is not a dict or a key is not a string.
    pub fn to_params(&self) -> Result<Params> {
        let Value::Dict(map) = self else {
            return Err(Error::Value(format!(
                "expected a dict of parameters: got {} of type {}",
                self.repr(),
                self.kind()
            )));
        };
        map.iter()
            .map(|(key, value)| match key {
                Key::Str(name) => Ok((name.clone(), value.clone())),
                other => Err(Error::Value(format!(
                    "parameter names must be strings: got {}",
                    other.repr()
                ))),
            })
            .collect()
    }

    /// The quoted form used in error messages: `'a'`, `1`, `2.0`, `[1, 2]`,
    /// `(1,)`, `{'a': 1}`, `None`, `True`.
    #[must_use]
    pub fn repr(&self) -> String {
        match self {
            Value::None => "None".to_string(),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(x) => format!("{x:?}"),
            Value::Str(s) => repr_str(s),
            Value::List(items) => format!("[{}]", join_repr(items)),
            Value::Tuple(items) if items.len() == 1 => format!("({},)", items[0].repr()),
            Value::Tuple(items) => format!("({})", join_repr(items)),
            Value::Dict(map) => {
                let entries: Vec<String> = map
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k.repr(), v.repr()))
                    .collect();
                format!("{{{}}}", entries.join(", "))
            }
            Value::Object(instance) => format!("{instance:?}"),
        }
    }
}

fn join_repr(items: &[Value]) -> String {
    items.iter().map(Value::repr).collect::<Vec<_>>().join(", ")
}

fn repr_str(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            other => f.write_str(&other.repr()),
        }
    }
}

// Integers and floats compare by numeric value, so `1 == 1.0`.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Dict(a), Value::Dict(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<Dict> for Value {
    fn from(map: Dict) -> Self {
        Value::Dict(map)
    }
}

impl From<Params> for Value {
    fn from(params: Params) -> Self {
        Value::Dict(
            params
                .into_iter()
                .map(|(name, value)| (Key::Str(name), value))
                .collect(),
        )
    }
}

impl From<Instance> for Value {
    fn from(instance: Instance) -> Self {
        Value::Object(instance)
    }
}

impl serde::Serialize for Value {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::{SerializeMap, SerializeSeq};

        match self {
            Value::None => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(x) => serializer.serialize_f64(*x),
            Value::Str(s) => serializer.serialize_str(s),
            Value::List(items) | Value::Tuple(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Dict(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map {
                    out.serialize_entry(&key.to_string(), value)?;
                }
                out.end()
            }
            // Nested instances serialize as their nested parameter dict.
            Value::Object(instance) => {
                let params = instance
                    .params(true, None)
                    .map_err(<S::Error as serde::ser::Error>::custom)?;
                let mut out = serializer.serialize_map(Some(params.len()))?;
                for (name, value) in &params {
                    out.serialize_entry(name, value)?;
                }
                out.end()
            }
        }
    }
}

/// Builds a [`Params`] map, converting each value with [`Value::from`].
///
/// ```
/// let p = compapp::params! { "i" => 30, "nested" => compapp::params! { "a" => 0 } };
/// assert_eq!(p["i"], compapp::Value::Int(30));
/// ```
#[macro_export]
macro_rules! params {
    () => {
        $crate::Params::new()
    };
    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut params = $crate::Params::new();
        $(
            params.insert(::std::string::String::from($name), $crate::Value::from($value));
        )+
        params
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repr_matches_error_message_conventions() {
        assert_eq!(Value::from("a").repr(), "'a'");
        assert_eq!(Value::from("it's").repr(), "\"it's\"");
        assert_eq!(Value::Int(2).repr(), "2");
        assert_eq!(Value::Float(2.0).repr(), "2.0");
        assert_eq!(Value::Bool(true).repr(), "True");
        assert_eq!(Value::None.repr(), "None");
        assert_eq!(Value::tuple([1]).repr(), "(1,)");
        assert_eq!(Value::tuple([Value::from(1), Value::from("a")]).repr(), "(1, 'a')");
        assert_eq!(Value::list([1, 2]).repr(), "[1, 2]");
        let dict = Value::from(params! { "a" => 1 });
        assert_eq!(dict.repr(), "{'a': 1}");
    }

    #[test]
    fn numbers_compare_across_kinds() {
        assert_eq!(Value::Int(1), Value::Float(1.0));
        assert_ne!(Value::Int(1), Value::Bool(true));
        assert_ne!(Value::list([1]), Value::tuple([1]));
    }

    #[test]
    fn to_params_requires_string_keys() {
        let mut map = Dict::new();
        map.insert(Key::Int(1), Value::Int(1));
        assert!(Value::Dict(map).to_params().is_err());
        assert!(Value::Int(1).to_params().is_err());
        let params = Value::from(params! { "x" => 1.5 }).to_params();
        assert!(matches!(params, Ok(p) if p["x"] == Value::Float(1.5)));
    }

    #[test]
    fn zero_values() {
        assert_eq!(ValueKind::Dict.zero(), Some(Value::Dict(Dict::new())));
        assert!(ValueKind::Object.zero().is_none());
        assert!(ValueKind::Float.is_simple());
        assert!(ValueKind::Tuple.is_basic());
        assert!(!ValueKind::None.is_basic());
    }

    #[test]
    fn serializes_to_json() {
        let value = Value::from(params! { "a" => 1, "b" => Value::list([1.5]) });
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json, serde_json::json!({ "a": 1, "b": [1.5] }));
    }
}
