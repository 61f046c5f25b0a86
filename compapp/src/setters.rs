//! Helpers for nested parameter dicts and recursive assignment.

use crate::descriptors::{ClassPlaceholder, Optional, Required};
use crate::error::Result;
use crate::instance::Instance;
use crate::model::Attr;
use crate::value::{Dict, Key, Params, Value};

/// Merges dicts shallowly; for a key present in several dicts the last
/// one wins.
#[must_use]
pub fn mix_dicts(dicts: Vec<Params>) -> Params {
    let mut mixed = Params::new();
    for dict in dicts {
        mixed.extend(dict);
    }
    mixed
}

/// Merges dicts recursively: nested dicts under the same key are merged
/// rather than replaced.
///
/// ```
/// use compapp::params;
/// use compapp::setters::deep_mix_dicts;
///
/// let mixed = deep_mix_dicts(vec![
///     params! { "a" => 1, "b" => 2, "sub" => params! { "x" => 1, "y" => 2 } },
///     params! { "a" => 2, "c" => 3, "sub" => params! { "x" => 2, "z" => 3 } },
/// ]);
/// assert_eq!(
///     mixed,
///     params! { "a" => 2, "b" => 2, "sub" => params! { "x" => 2, "y" => 2, "z" => 3 }, "c" => 3 }
/// );
/// ```
#[must_use]
pub fn deep_mix_dicts(dicts: Vec<Params>) -> Params {
    let mut mixed = Params::new();
    for dict in dicts {
        for (key, value) in dict {
            let value = match (mixed.get(&key), value) {
                (Some(Value::Dict(old)), Value::Dict(new)) => Value::Dict(deep_mix(old.clone(), new)),
                (_, value) => value,
            };
            mixed.insert(key, value);
        }
    }
    mixed
}

fn deep_mix(mut old: Dict, new: Dict) -> Dict {
    for (key, value) in new {
        let value = match (old.get(&key), value) {
            (Some(Value::Dict(prev)), Value::Dict(next)) => Value::Dict(deep_mix(prev.clone(), next)),
            (_, value) => value,
        };
        old.insert(key, value);
    }
    old
}

/// Leaf `(path, value)` pairs of a nested dict, depth first.
///
/// Empty dicts are descended into (and so produce nothing) unless
/// `empty_dict` is set, in which case they are reported as leaves.
///
/// ```
/// use compapp::{params, Value};
/// use compapp::setters::nested_items;
///
/// let nested = params! { "a" => params! {}, "b" => params! { "c" => 1 } };
/// assert_eq!(nested_items(&nested, false), vec![(vec!["b".to_string(), "c".to_string()], Value::Int(1))]);
/// assert_eq!(nested_items(&nested, true).len(), 2);
/// ```
#[must_use]
pub fn nested_items(dict: &Params, empty_dict: bool) -> Vec<(Vec<String>, Value)> {
    let mut items = Vec::new();
    for (key, value) in dict {
        collect_items(vec![key.clone()], value, empty_dict, &mut items);
    }
    items
}

fn collect_items(path: Vec<String>, value: &Value, empty_dict: bool, out: &mut Vec<(Vec<String>, Value)>) {
    match value {
        Value::Dict(map) if !empty_dict || !map.is_empty() => {
            for (key, value) in map {
                let mut sub = path.clone();
                sub.push(key.to_string());
                collect_items(sub, value, empty_dict, out);
            }
        }
        _ => out.push((path, value.clone())),
    }
}

/// Expands dotted keys into nested dicts: `{"a.b.c": 1}` becomes
/// `{"a": {"b": {"c": 1}}}`.
#[must_use]
pub fn dotted_to_nested(dotted: &Params) -> Params {
    let mut nested = Dict::new();
    for (path, value) in dotted {
        let keys: Vec<&str> = path.split('.').collect();
        insert_path(&mut nested, &keys, value.clone());
    }
    nested
        .into_iter()
        .filter_map(|(key, value)| match key {
            Key::Str(name) => Some((name, value)),
            _ => None,
        })
        .collect()
}

fn insert_path(holder: &mut Dict, keys: &[&str], value: Value) {
    let Some((last, parents)) = keys.split_last() else {
        return;
    };
    let mut holder = holder;
    for key in parents {
        let slot = holder
            .entry(Key::from(*key))
            .or_insert_with(|| Value::Dict(Dict::new()));
        if !matches!(slot, Value::Dict(_)) {
            *slot = Value::Dict(Dict::new());
        }
        let Value::Dict(next) = slot else {
            return;
        };
        holder = next;
    }
    holder.insert(Key::from(*last), value);
}

impl Instance {
    /// Assigns a nested dict of values to this instance.
    ///
    /// A dict value descends into the nested instance currently stored
    /// under its key, except for fields that hold dicts themselves
    /// ([`Required`], [`Optional`], or a field whose current value is a
    /// dict), which receive the dict as is. Dynamic-class placeholders are
    /// assigned after every other key, so a class path changed in the same
    /// dict is honoured.
    ///
    /// ```
    /// use compapp::{params, ClassBuilder, Instance, Value};
    ///
    /// # fn main() -> compapp::Result<()> {
    /// let inner = ClassBuilder::parametric("inner").literal("d", 0).build()?;
    /// let class = ClassBuilder::parametric("Outer")
    ///     .literal("f", 0)
    ///     .nested("inner", &inner)
    ///     .build()?;
    /// let obj = Instance::new(&class, params! {})?;
    /// obj.rec_set_attrs(&params! { "inner" => params! { "d" => 1 }, "f" => 3 })?;
    /// assert_eq!(obj.get_path("inner.d")?, Value::Int(1));
    /// assert_eq!(obj.get("f")?, Value::Int(3));
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Propagates the first assignment error; earlier keys stay assigned.
    pub fn rec_set_attrs(&self, dict: &Params) -> Result<()> {
        let class = self.class();
        let mut placeholders = Vec::new();
        for (name, value) in dict {
            match class.lookup(name) {
                Some(Attr::Field(desc)) if desc.is::<ClassPlaceholder>() => {
                    placeholders.push((name, value));
                }
                _ => self.rec_set_attr(name, value)?,
            }
        }
        for (name, value) in placeholders {
            self.rec_set_placeholder(name, value)?;
        }
        Ok(())
    }

    fn rec_set_attr(&self, name: &str, value: &Value) -> Result<()> {
        let Value::Dict(_) = value else {
            return self.set(name, value.clone());
        };
        let class = self.class();
        if let Some(Attr::Field(desc)) = class.lookup(name) {
            if desc.is::<Required>() || desc.is::<Optional>() {
                return self.set(name, value.clone());
            }
        }
        match self.get(name) {
            Ok(Value::Object(child)) => child.rec_set_attrs(&value.to_params()?),
            _ => self.set(name, value.clone()),
        }
    }

    fn rec_set_placeholder(&self, name: &str, value: &Value) -> Result<()> {
        let class = self.class();
        let consistent = match class.descriptor(name) {
            Some(desc) => match desc.downcast_ref::<ClassPlaceholder>() {
                Some(placeholder) => placeholder.is_consistent(self)?,
                None => false,
            },
            None => false,
        };
        if let (true, Value::Dict(_)) = (consistent, value) {
            if let Ok(Value::Object(child)) = self.get(name) {
                return child.rec_set_attrs(&value.to_params()?);
            }
        }
        self.set(name, value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptors::{DynamicClass, OfType};
    use crate::model::ClassBuilder;
    use crate::params;
    use crate::value::ValueKind;

    #[test]
    fn mix_is_shallow_and_last_wins() {
        let mixed = mix_dicts(vec![
            params! { "a" => 1, "sub" => params! { "x" => 1 } },
            params! { "sub" => params! { "y" => 2 } },
        ]);
        assert_eq!(mixed, params! { "a" => 1, "sub" => params! { "y" => 2 } });
    }

    #[test]
    fn dotted_keys_become_nested() {
        let nested = dotted_to_nested(&params! { "a.b.c" => 1, "a.d" => 2, "e" => 3 });
        assert_eq!(
            nested,
            params! { "a" => params! { "b" => params! { "c" => 1 }, "d" => 2 }, "e" => 3 }
        );
    }

    #[test]
    fn nested_items_round_trip_through_dotted() {
        let nested = params! { "a" => params! { "b" => params! { "c" => 1 }, "d" => 2 } };
        let dotted: Params = nested_items(&nested, false)
            .into_iter()
            .map(|(path, value)| (path.join("."), value))
            .collect();
        assert_eq!(dotted, params! { "a.b.c" => 1, "a.d" => 2 });
        assert_eq!(dotted_to_nested(&dotted), nested);
    }

    #[test]
    fn dict_fields_take_dicts_whole() {
        let class = ClassBuilder::parametric("Holder")
            .field("table", OfType::new([ValueKind::Dict]).init(ValueKind::Dict))
            .field("opt", Optional::new([ValueKind::Dict]))
            .build()
            .unwrap();
        let obj = Instance::new(&class, params! {}).unwrap();
        obj.rec_set_attrs(&params! { "table" => params! { "k" => 1 }, "opt" => params! { "v" => 2 } })
            .unwrap();
        assert_eq!(obj.get("table").unwrap(), Value::from(params! { "k" => 1 }));
        assert_eq!(obj.get("opt").unwrap(), Value::from(params! { "v" => 2 }));
    }

    #[test]
    fn placeholders_follow_a_path_change_in_the_same_dict() {
        ClassBuilder::parametric("SetterA").module("setters_tests").literal("a", 1).build().unwrap();
        ClassBuilder::parametric("SetterB").module("setters_tests").literal("b", 2).build().unwrap();
        let app = ClassBuilder::parametric("App")
            .dynamic_class("obj", "path", DynamicClass::new(".SetterA").prefix("setters_tests"))
            .build()
            .unwrap();
        let app = Instance::new(&app, params! {}).unwrap();
        // Realize the default before the path changes.
        assert_eq!(app.get_path("obj.a").unwrap(), Value::Int(1));
        app.rec_set_attrs(&params! { "obj" => params! { "b" => 5 }, "path" => ".SetterB" })
            .unwrap();
        assert_eq!(app.get_path("obj.b").unwrap(), Value::Int(5));
    }
}
