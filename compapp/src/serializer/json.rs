//! Conversion between parameter values and `serde_json` documents.
//!
//! Lists and tuples both become JSON arrays; reading back always gives a
//! list. Integers that fit `i64` stay integers, other numbers become
//! floats. Dict keys are written with their display form. Non-finite
//! floats have no JSON form and are written as `null`.

use serde_json::Map;

use crate::error::{Error, Result};
use crate::value::{Dict, Key, Params, Value};

/// Converts a value to JSON through its [`serde::Serialize`] impl. Nested
/// instances become their nested parameter dict.
///
/// # Errors
///
/// Returns [`Error::Value`] when reading the parameters of a nested
/// instance fails.
pub fn value_to_json(value: &Value) -> Result<serde_json::Value> {
    serde_json::to_value(value).map_err(|err| Error::Value(err.to_string()))
}

/// Converts a JSON document to a value.
#[must_use]
pub fn value_from_json(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::None,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        serde_json::Value::String(s) => Value::Str(s.clone()),
        serde_json::Value::Array(items) => Value::List(items.iter().map(value_from_json).collect()),
        serde_json::Value::Object(map) => Value::Dict(
            map.iter()
                .map(|(key, value)| (Key::Str(key.clone()), value_from_json(value)))
                .collect::<Dict>(),
        ),
    }
}

/// Writes a parameter dict as a JSON object.
///
/// ```
/// use compapp::params;
/// use compapp::serializer::to_json;
///
/// # fn main() -> compapp::Result<()> {
/// let json = to_json(&params! { "x" => 1.5, "sub" => params! { "n" => 2 } })?;
/// assert_eq!(json, serde_json::json!({ "x": 1.5, "sub": { "n": 2 } }));
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// See [`value_to_json`].
pub fn to_json(params: &Params) -> Result<serde_json::Value> {
    let mut out = Map::new();
    for (name, value) in params {
        out.insert(name.clone(), value_to_json(value)?);
    }
    Ok(serde_json::Value::Object(out))
}

/// Reads a parameter dict from a JSON object.
///
/// # Errors
///
/// Returns [`Error::Parse`] if the document is not a JSON object.
pub fn from_json(json: &serde_json::Value) -> Result<Params> {
    let serde_json::Value::Object(map) = json else {
        return Err(Error::Parse(format!(
            "expected a JSON object of parameters: got {json}"
        )));
    };
    Ok(map
        .iter()
        .map(|(name, value)| (name.clone(), value_from_json(value)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params;
    use serde_json::json;

    #[test]
    fn numbers_keep_their_kind() {
        let params = from_json(&json!({ "i": 1, "x": 1.0, "big": 1e300 })).unwrap();
        assert_eq!(params["i"].kind(), crate::ValueKind::Int);
        assert_eq!(params["x"].kind(), crate::ValueKind::Float);
        assert_eq!(params["big"], Value::Float(1e300));
    }

    #[test]
    fn tuples_are_arrays() {
        let json = to_json(&params! { "t" => Value::tuple([1, 2]) }).unwrap();
        assert_eq!(json, json!({ "t": [1, 2] }));
    }

    #[test]
    fn non_finite_floats_are_null() {
        assert_eq!(value_to_json(&Value::Float(f64::NAN)).unwrap(), json!(null));
    }

    #[test]
    fn objects_serialize_as_their_nested_params() {
        let sub = crate::ClassBuilder::parametric("sub").literal("n", 2).build().unwrap();
        let class = crate::ClassBuilder::parametric("App").nested("sub", &sub).build().unwrap();
        let app = crate::Instance::new(&class, params! {}).unwrap();
        let json = value_to_json(&Value::Object(app)).unwrap();
        assert_eq!(json, json!({ "sub": { "n": 2 } }));
    }

    #[test]
    fn only_objects_are_parameter_dicts() {
        let err = from_json(&json!([1])).unwrap_err();
        assert_eq!(err.to_string(), "expected a JSON object of parameters: got [1]");
    }

    #[test]
    fn nested_dicts_round_trip() {
        let params = params! { "a" => params! { "b" => Value::list(["x", "y"]) }, "n" => Value::None };
        assert_eq!(from_json(&to_json(&params).unwrap()).unwrap(), params);
    }
}
