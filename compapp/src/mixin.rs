//! Construction: leaf assignment and automatic mix-in of nested classes.
//!
//! Constructing an instance of `C` from parameter dicts:
//!
//! 1. merges the dicts, later keys winning;
//! 2. assigns every key that does not name a mixable nested class;
//! 3. for every mixable nested class visible on `C`, walks the
//!    linearization of `C`. Plain classes met under that name contribute
//!    their defaults as overrides; the first parametric class met is
//!    instantiated with those overrides (least specific first) followed by
//!    the supplied nested parameters;
//! 4. stores the nested instance and records `C`'s instance as its owner.
//!
//! Nested parameters for a name that resolves to no parametric class are
//! an error, so a misspelled section is never silently kept.

use std::rc::Rc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::instance::Instance;
use crate::model::{Attr, Class};
use crate::setters::mix_dicts;
use crate::value::{Params, Value};

impl Instance {
    /// Constructs an instance of `class` from `params`.
    ///
    /// ```
    /// use compapp::{ClassBuilder, Instance, Value};
    ///
    /// # fn main() -> compapp::Result<()> {
    /// let class = ClassBuilder::parametric("MyParametric")
    ///     .literal("i", 1)
    ///     .literal("x", 2.0)
    ///     .nested("param", &ClassBuilder::parametric("param").literal("a", 100).literal("b", 200).build()?)
    ///     .build()?;
    /// let mp = Instance::new(&class, compapp::params! { "i" => 30, "param" => compapp::params! { "a" => 0 } })?;
    /// assert_eq!(mp.get("x")?, Value::Float(2.0));
    /// assert_eq!(mp.get("i")?, Value::Int(30));
    /// assert_eq!(mp.get_path("param.a")?, Value::Int(0));
    /// assert_eq!(mp.get_path("param.b")?, Value::Int(200));
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns assignment errors of the leaf values, and [`Error::Value`]
    /// for nested parameters that match no parametric nested class.
    pub fn new(class: &Rc<Class>, params: Params) -> Result<Instance> {
        Self::from_dicts(class, vec![params])
    }

    /// Constructs an instance from several parameter dicts, merged
    /// shallowly with later dicts winning.
    ///
    /// # Errors
    ///
    /// See [`Instance::new`].
    pub fn from_dicts(class: &Rc<Class>, dicts: Vec<Params>) -> Result<Instance> {
        let params = mix_dicts(dicts);
        let instance = Instance::alloc(class);

        let mut nested = Params::new();
        for (key, value) in params {
            match class.lookup(&key) {
                Some(Attr::Class(slot)) if slot.is_mixable() => {
                    nested.insert(key, value);
                }
                None if matches!(value, Value::Dict(_)) => {
                    return Err(non_parametric(&key));
                }
                _ => instance.set(&key, value)?,
            }
        }

        for (name, attr) in class.fields() {
            let Attr::Class(slot) = attr else { continue };
            if !slot.is_mixable() {
                continue;
            }
            let supplied = match nested.shift_remove(name) {
                None => None,
                Some(Value::Object(child)) => {
                    check_nested_object(class, name, &child)?;
                    instance.assign(name, Value::Object(child.clone()));
                    child.set_context(&instance, name);
                    continue;
                }
                Some(value @ Value::Dict(_)) => Some(value.to_params()?),
                Some(other) => {
                    return Err(Error::Value(format!(
                        "{}.{} only accepts an object or a dict of parameters: got {} of type {}",
                        class.name(),
                        name,
                        other.repr(),
                        other.type_name()
                    )))
                }
            };
            let had_params = supplied.is_some();
            match automixin(class, name, supplied)? {
                Some(child) => {
                    let child_class = child.class();
                    debug!(
                        owner = class.name(),
                        field = name.as_str(),
                        class = child_class.name(),
                        "mixed in nested instance"
                    );
                    instance.assign(name, Value::Object(child.clone()));
                    child.set_context(&instance, name);
                }
                None if had_params => return Err(non_parametric(name)),
                None => {}
            }
        }
        Ok(instance)
    }
}

fn non_parametric(name: &str) -> Error {
    Error::Value(format!("Setting non-Parametric property {name}"))
}

/// The parametric class that instances stored under the nested slot
/// `name` of `owner` must derive from.
pub(crate) fn nested_base(owner: &Rc<Class>, name: &str) -> Option<Rc<Class>> {
    for class in owner.linearization() {
        match class.lookup(name) {
            None => continue,
            Some(Attr::Class(nested)) if nested.is_parametric() => return Some(Rc::clone(nested)),
            Some(Attr::Class(_)) => continue,
            Some(_) => return None,
        }
    }
    None
}

/// Rejects an instance supplied for a nested slot unless its class derives
/// from the slot's parametric class.
pub(crate) fn check_nested_object(owner: &Rc<Class>, name: &str, child: &Instance) -> Result<()> {
    let Some(base) = nested_base(owner, name) else {
        return Ok(());
    };
    if child.is_instance_of(&base) {
        return Ok(());
    }
    let value = Value::Object(child.clone());
    Err(Error::Value(format!(
        "{}.{} only accepts type of {}: got {} of type {}",
        owner.name(),
        name,
        base.name(),
        value.repr(),
        value.type_name()
    )))
}

/// Instantiates the nested class `name` of `owner`, mixing in the defaults
/// of plain classes that override it along the linearization.
///
/// Returns `None` when no parametric class is found under `name`.
fn automixin(owner: &Rc<Class>, name: &str, supplied: Option<Params>) -> Result<Option<Instance>> {
    let mut overrides: Vec<Params> = Vec::new();
    for class in owner.linearization() {
        let Some(attr) = class.lookup(name) else {
            continue;
        };
        let Attr::Class(nested) = attr else {
            return Ok(None);
        };
        if nested.is_parametric() {
            let mut dicts: Vec<Params> = overrides.into_iter().rev().collect();
            dicts.extend(supplied);
            return Instance::from_dicts(nested, dicts).map(Some);
        }
        overrides.push(nested.override_params());
    }
    Ok(None)
}
