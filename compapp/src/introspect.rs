//! Parameter introspection: `paramnames`, `params`, `defaultparams`.
//!
//! Two kinds of attribute are parameters: nested mixable classes (parametric
//! classes and the plain classes overriding them), and leaves. A leaf is a declared attribute flagged as a parameter, or a
//! literal whose default is a basic value (number, string, bool, list,
//! tuple or dict). With a type filter, literals of the listed kinds and
//! declared attributes that can hold one of them are selected instead.

use std::rc::Rc;

use crate::descriptors::Required;
use crate::error::Result;
use crate::instance::Instance;
use crate::model::{Attr, Class};
use crate::value::{Params, Value, ValueKind};

fn is_param(attr: &Attr, types: Option<&[ValueKind]>) -> bool {
    match attr {
        Attr::Class(class) if class.is_mixable() => {
            types.map_or(true, |types| types.contains(&ValueKind::Object))
        }
        Attr::Field(desc) if desc.is_param() => types.map_or(true, |types| {
            desc.value_kinds().iter().any(|kind| types.contains(kind))
        }),
        Attr::Literal(value) => match types {
            Some(types) => types.contains(&value.kind()),
            None => value.kind().is_basic(),
        },
        _ => false,
    }
}

impl Class {
    /// Names of the parameters of this class, in field order.
    ///
    /// Names starting with `_` are never parameters.
    ///
    /// ```
    /// use compapp::{ClassBuilder, ValueKind};
    ///
    /// # fn main() -> compapp::Result<()> {
    /// let class = ClassBuilder::parametric("MyParametric")
    ///     .literal("x", 1.0)
    ///     .literal("i", 1)
    ///     .literal("s", "string")
    ///     .nested("ps", &ClassBuilder::parametric("ps").build()?)
    ///     .build()?;
    /// assert_eq!(class.paramnames(None), ["x", "i", "s", "ps"]);
    /// assert_eq!(class.paramnames(Some(&[ValueKind::Float])), ["x"]);
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn paramnames(&self, types: Option<&[ValueKind]>) -> Vec<String> {
        self.fields()
            .iter()
            .filter(|(name, attr)| !name.starts_with('_') && is_param(attr, types))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Parameters of a freshly constructed default instance.
    ///
    /// Every call builds a new instance, so mutable defaults are never
    /// shared between calls or with other instances.
    ///
    /// # Errors
    ///
    /// Returns construction errors and non-attribute read errors.
    pub fn defaultparams(
        self: &Rc<Self>,
        nested: bool,
        types: Option<&[ValueKind]>,
    ) -> Result<Params> {
        Instance::new(self, Params::new())?.params(nested, types)
    }
}

impl Instance {
    /// Current parameter values.
    ///
    /// Nested instances are included as objects, or as nested dicts when
    /// `nested` is set. A type filter selects leaves; nested slots are
    /// always walked. Parameters that currently read as missing (an
    /// unset optional field, a link that does not resolve) are omitted.
    ///
    /// ```
    /// use compapp::{params, ClassBuilder, Instance, Value, ValueKind};
    ///
    /// # fn main() -> compapp::Result<()> {
    /// let class = ClassBuilder::parametric("MyParametric")
    ///     .literal("x", 1.0)
    ///     .literal("i", 1)
    ///     .nested("ps", &ClassBuilder::parametric("ps").literal("y", 2.0).literal("j", 2).build()?)
    ///     .build()?;
    /// let mp = Instance::new(&class, params! {})?;
    /// assert_eq!(
    ///     mp.params(true, Some(&[ValueKind::Int]))?,
    ///     params! { "i" => 1, "ps" => params! { "j" => 2 } }
    /// );
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Propagates read errors other than [`Error::Attribute`](crate::Error::Attribute).
    pub fn params(&self, nested: bool, types: Option<&[ValueKind]>) -> Result<Params> {
        let class = self.class();
        let names = class.fields().iter().filter(|(name, attr)| {
            !name.starts_with('_')
                && (is_param(attr, types) || matches!(attr, Attr::Class(c) if c.is_mixable()))
        });
        let mut params = Params::new();
        for (name, _) in names {
            let value = match self.get(name) {
                Ok(value) => value,
                Err(err) if err.is_attribute() => continue,
                Err(err) => return Err(err),
            };
            let value = match value {
                Value::Object(child) if nested => Value::from(child.params(true, types)?),
                other => other,
            };
            params.insert(String::clone(name), value);
        }
        Ok(params)
    }

    /// Nested parameters whose values differ from the class defaults.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`params`](Instance::params) and
    /// [`defaultparams`](Class::defaultparams).
    pub fn changed_params(&self) -> Result<Params> {
        let current = self.params(true, None)?;
        let defaults = self.class().defaultparams(true, None)?;
        Ok(diff_params(&current, &defaults))
    }

    /// Whether every [`Required`] field of this instance is set.
    #[must_use]
    pub fn has_required_attributes(&self) -> bool {
        let class = self.class();
        class.fields().iter().all(|(name, attr)| match attr {
            Attr::Field(desc) if desc.is::<Required>() => self.has(name),
            _ => true,
        })
    }
}

fn diff_params(current: &Params, defaults: &Params) -> Params {
    let mut changed = Params::new();
    for (name, value) in current {
        let default = defaults.get(name);
        match (value, default) {
            (Value::Dict(_), Some(default @ Value::Dict(_))) => {
                if let (Ok(value), Ok(default)) = (value.to_params(), default.to_params()) {
                    let sub = diff_params(&value, &default);
                    if !sub.is_empty() {
                        changed.insert(name.clone(), Value::from(sub));
                    }
                    continue;
                }
                if Some(value) != Some(default) {
                    changed.insert(name.clone(), value.clone());
                }
            }
            (value, default) if default != Some(value) => {
                changed.insert(name.clone(), value.clone());
            }
            _ => {}
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptors::{Link, OfType, Optional};
    use crate::model::ClassBuilder;
    use crate::params;

    fn sample() -> Rc<Class> {
        ClassBuilder::parametric("MyParametric")
            .literal("x", 1.0)
            .literal("i", 1)
            .literal("s", "A")
            .literal("_hidden", 3)
            .literal("nothing", Value::None)
            .field("opt", Optional::new([ValueKind::Int]))
            .field("link", Link::new("x"))
            .nested(
                "ps",
                &ClassBuilder::parametric("ps")
                    .literal("y", 2.0)
                    .literal("j", 2)
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn paramnames_skip_private_none_and_links() {
        assert_eq!(sample().paramnames(None), ["x", "i", "s", "opt", "ps"]);
    }

    #[test]
    fn shallow_params_hold_nested_objects() {
        let mp = Instance::new(&sample(), params! {}).unwrap();
        let shallow = mp.params(false, None).unwrap();
        assert_eq!(shallow.keys().collect::<Vec<_>>(), ["x", "i", "s", "ps"]);
        assert!(shallow["ps"].as_object().unwrap().ptr_eq(&mp.child("ps").unwrap()));
    }

    #[test]
    fn nested_defaultparams() {
        let defaults = sample().defaultparams(true, None).unwrap();
        assert_eq!(
            defaults,
            params! { "x" => 1.0, "i" => 1, "s" => "A", "ps" => params! { "y" => 2.0, "j" => 2 } }
        );
    }

    #[test]
    fn optional_appears_once_set() {
        let mp = Instance::new(&sample(), params! { "opt" => 3 }).unwrap();
        assert_eq!(mp.params(false, Some(&[ValueKind::Int])).unwrap()["opt"], Value::Int(3));
    }

    #[test]
    fn changed_params_are_nested_differences() {
        let mp = Instance::new(&sample(), params! { "i" => 5, "ps" => params! { "j" => 3 } }).unwrap();
        assert_eq!(
            mp.changed_params().unwrap(),
            params! { "i" => 5, "ps" => params! { "j" => 3 } }
        );
        let fresh = Instance::new(&sample(), params! {}).unwrap();
        assert!(fresh.changed_params().unwrap().is_empty());
    }

    #[test]
    fn required_attributes() {
        let class = ClassBuilder::parametric("Job")
            .field("n", crate::descriptors::Required::of([ValueKind::Int]))
            .field("x", OfType::new([ValueKind::Float]).with_default(0.0))
            .build()
            .unwrap();
        let job = Instance::new(&class, params! {}).unwrap();
        assert!(!job.has_required_attributes());
        job.set("n", 1).unwrap();
        assert!(job.has_required_attributes());
    }
}
