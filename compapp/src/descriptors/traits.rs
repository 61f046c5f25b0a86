//! Type-checking attributes: `OfType`, `Optional`, `Required`, `List`,
//! `Dict`, `Choice` and the union `Or`.
//!
//! ```
//! use compapp::descriptors::{Choice, OfType, Or};
//! use compapp::{ClassBuilder, Instance, Value, ValueKind};
//!
//! # fn main() -> compapp::Result<()> {
//! let class = ClassBuilder::parametric("MyParametric")
//!     .field("attr", Or::new().or(Choice::new(["a", "b", "c"]).no_default()).or(OfType::new([ValueKind::Int])))
//!     .build()?;
//! let mp = Instance::new(&class, compapp::params! {})?;
//! mp.set("attr", "a")?;
//! mp.set("attr", 1)?;
//! let err = mp.set("attr", 1.0).unwrap_err();
//! assert_eq!(err.to_string(), "None of the traits of MyParametric.attr are matched to: 1.0");
//! # Ok(())
//! # }
//! ```

use std::rc::Rc;

use crate::casts;
use crate::descriptors::{descriptor_core, field_label, missing, Descriptor, FieldBinding, FieldCore};
use crate::error::{Error, Result};
use crate::instance::Instance;
use crate::model::Class;
use crate::parse::{parse_as, parse_bool, parse_first};
use crate::value::{Dict as DictValue, Key, Value, ValueKind};

/// One accepted type of an [`OfType`]: a value kind or a class.
#[derive(Debug, Clone)]
pub enum TypeSpec {
    /// Values of this kind.
    Kind(ValueKind),
    /// Instances of this class or of its subclasses.
    Class(Rc<Class>),
}

impl TypeSpec {
    fn name(&self) -> String {
        match self {
            TypeSpec::Kind(kind) => kind.as_str().to_string(),
            TypeSpec::Class(class) => class.name().to_string(),
        }
    }

    fn kind(&self) -> ValueKind {
        match self {
            TypeSpec::Kind(kind) => *kind,
            TypeSpec::Class(_) => ValueKind::Object,
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (TypeSpec::Kind(kind), value) => value.kind() == *kind,
            (TypeSpec::Class(class), Value::Object(obj)) => obj.is_instance_of(class),
            (TypeSpec::Class(_), _) => false,
        }
    }
}

impl From<ValueKind> for TypeSpec {
    fn from(kind: ValueKind) -> Self {
        TypeSpec::Kind(kind)
    }
}

impl From<Rc<Class>> for TypeSpec {
    fn from(class: Rc<Class>) -> Self {
        TypeSpec::Class(class)
    }
}

impl From<&Rc<Class>> for TypeSpec {
    fn from(class: &Rc<Class>) -> Self {
        TypeSpec::Class(Rc::clone(class))
    }
}

/// Joins names as `a`, `a or b`, `a, b or c`.
fn join_names(names: &[String]) -> String {
    match names {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} or {}", init.join(", "), last),
    }
}

fn type_error(obj: &Instance, name: &str, accepted: &str, value: &Value) -> Error {
    Error::Value(format!(
        "{} only accepts type of {}: got {} of type {}",
        field_label(obj, name),
        accepted,
        value.repr(),
        value.type_name()
    ))
}

/// Accepts values of the listed kinds or classes, widening through the
/// cast table.
///
/// Without accepted types any value is allowed. An unset field with an
/// `init` kind materializes a fresh empty value of that kind on first read.
#[derive(Debug, Clone)]
pub struct OfType {
    core: FieldCore,
    allowed: Vec<TypeSpec>,
    init: Option<ValueKind>,
}

impl OfType {
    /// Accepts the given kinds or classes; no default.
    pub fn new<I, T>(allowed: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TypeSpec>,
    {
        Self {
            core: FieldCore::param(None),
            allowed: allowed.into_iter().map(Into::into).collect(),
            init: None,
        }
    }

    /// Accepts any value; no default.
    #[must_use]
    pub fn any() -> Self {
        Self::new(Vec::<TypeSpec>::new())
    }

    /// Accepts instances of `class`.
    #[must_use]
    pub fn class(class: &Rc<Class>) -> Self {
        Self::new([class])
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.core.default = Some(default.into());
        self
    }

    /// Materializes an empty value of `kind` when read unset.
    #[must_use]
    pub fn init(mut self, kind: ValueKind) -> Self {
        if !self.allowed.iter().any(|spec| spec.kind() == kind) {
            self.allowed.insert(0, TypeSpec::Kind(kind));
        }
        self.init = Some(kind);
        self
    }

    /// Excludes the field from the parameter set.
    #[must_use]
    pub fn not_param(mut self) -> Self {
        self.core.is_param = false;
        self
    }

    /// The accepted kinds and classes.
    #[must_use]
    pub fn allowed(&self) -> &[TypeSpec] {
        &self.allowed
    }

    fn check(&self, obj: &Instance, value: Value, name: Option<&str>) -> Result<Value> {
        if self.allowed.is_empty() {
            return Ok(value);
        }
        for spec in &self.allowed {
            if spec.matches(&value) {
                return Ok(value);
            }
            if let TypeSpec::Kind(kind) = spec {
                if let Some(cast) = casts::cast(*kind, &value) {
                    return Ok(cast);
                }
            }
        }
        let names: Vec<String> = self.allowed.iter().map(TypeSpec::name).collect();
        Err(type_error(
            obj,
            name.unwrap_or(self.name()),
            &join_names(&names),
            &value,
        ))
    }

    fn kinds(&self) -> Vec<ValueKind> {
        self.allowed.iter().map(TypeSpec::kind).collect()
    }
}

impl Descriptor for OfType {
    descriptor_core!();

    fn value_kinds(&self) -> Vec<ValueKind> {
        if self.allowed.is_empty() {
            self.default_value().map(|v| vec![v.kind()]).unwrap_or_default()
        } else {
            self.kinds()
        }
    }

    fn get(&self, obj: &Instance) -> Result<Value> {
        if let Some(value) = obj.stored(self.key()) {
            return Ok(value);
        }
        let value = match (&self.core.default, self.init) {
            (Some(default), _) => default.clone(),
            (None, Some(kind)) => kind.zero().ok_or_else(|| missing(obj, self.name()))?,
            (None, None) => return Err(missing(obj, self.name())),
        };
        // Store the copy so later reads see the same value as mutations.
        obj.store(self.key(), value.clone());
        Ok(value)
    }

    fn verify(&self, obj: &Instance, value: Value, name: Option<&str>) -> Result<Value> {
        self.check(obj, value, name)
    }

    fn parse(&self, text: &str) -> Result<Value> {
        if self.allowed.is_empty() {
            return Ok(Value::Str(text.to_string()));
        }
        parse_first(&self.kinds(), text)
    }
}

/// An [`OfType`] without default, left out of `params()` until set.
#[derive(Debug, Clone)]
pub struct Optional {
    inner: OfType,
}

impl Optional {
    /// Accepts the given kinds or classes.
    pub fn new<I, T>(allowed: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TypeSpec>,
    {
        Self {
            inner: OfType::new(allowed),
        }
    }
}

impl Descriptor for Optional {
    fn core(&self) -> &FieldCore {
        self.inner.core()
    }

    fn core_mut(&mut self) -> &mut FieldCore {
        self.inner.core_mut()
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn value_kinds(&self) -> Vec<ValueKind> {
        self.inner.value_kinds()
    }

    fn verify(&self, obj: &Instance, value: Value, name: Option<&str>) -> Result<Value> {
        self.inner.verify(obj, value, name)
    }

    fn parse(&self, text: &str) -> Result<Value> {
        self.inner.parse(text)
    }
}

/// A field that must be assigned before the tree is ready to run.
///
/// An inner attribute, if given, does the verification and parsing.
#[derive(Debug)]
pub struct Required {
    core: FieldCore,
    inner: Option<Box<dyn Descriptor>>,
}

impl Required {
    /// Accepts anything.
    #[must_use]
    pub fn any() -> Self {
        Self {
            core: FieldCore::param(None),
            inner: None,
        }
    }

    /// Verifies values with `inner`.
    pub fn new(inner: impl Descriptor) -> Self {
        Self {
            core: FieldCore::param(None),
            inner: Some(Box::new(inner)),
        }
    }

    /// Shorthand for `Required::new(OfType::new(allowed))`.
    pub fn of<I, T>(allowed: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TypeSpec>,
    {
        Self::new(OfType::new(allowed))
    }
}

impl Descriptor for Required {
    descriptor_core!();

    fn bind(&mut self, binding: &FieldBinding) {
        self.core.binding = binding.clone();
        if let Some(inner) = &mut self.inner {
            inner.bind(binding);
        }
    }

    fn value_kinds(&self) -> Vec<ValueKind> {
        self.inner
            .as_ref()
            .map(|inner| inner.value_kinds())
            .unwrap_or_default()
    }

    fn get(&self, obj: &Instance) -> Result<Value> {
        obj.stored(self.key())
            .ok_or_else(|| missing(obj, self.name()))
    }

    fn verify(&self, obj: &Instance, value: Value, name: Option<&str>) -> Result<Value> {
        match &self.inner {
            Some(inner) => inner.verify(obj, value, name),
            None => Ok(value),
        }
    }

    fn parse(&self, text: &str) -> Result<Value> {
        match &self.inner {
            Some(inner) => inner.parse(text),
            None => Ok(Value::Str(text.to_string())),
        }
    }
}

/// Accepts a list (or tuple) whose elements pass an element attribute.
///
/// Errors on elements are reported as `Class.field[i]`.
#[derive(Debug)]
pub struct List {
    core: FieldCore,
    element: Option<Box<dyn Descriptor>>,
    target: ValueKind,
    cast: Vec<ValueKind>,
}

impl List {
    /// A list of anything.
    #[must_use]
    pub fn new() -> Self {
        Self {
            core: FieldCore::param(None),
            element: None,
            target: ValueKind::List,
            cast: Vec::new(),
        }
    }

    /// A list whose elements are of the given kinds.
    pub fn of<I, T>(allowed: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TypeSpec>,
    {
        Self::of_trait(OfType::new(allowed))
    }

    /// A list whose elements pass `element`.
    pub fn of_trait(element: impl Descriptor) -> Self {
        Self {
            element: Some(Box::new(element)),
            ..Self::new()
        }
    }

    /// Stores tuples instead of lists.
    #[must_use]
    pub fn tuple(mut self) -> Self {
        self.target = ValueKind::Tuple;
        self
    }

    /// Also accepts `kind`, converting it to the target container.
    #[must_use]
    pub fn cast(mut self, kind: ValueKind) -> Self {
        self.cast.push(kind);
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.core.default = Some(default.into());
        self
    }
}

impl Default for List {
    fn default() -> Self {
        Self::new()
    }
}

impl Descriptor for List {
    descriptor_core!();

    fn bind(&mut self, binding: &FieldBinding) {
        self.core.binding = binding.clone();
        if let Some(element) = &mut self.element {
            element.bind(binding);
        }
    }

    fn value_kinds(&self) -> Vec<ValueKind> {
        vec![self.target]
    }

    fn verify(&self, obj: &Instance, value: Value, name: Option<&str>) -> Result<Value> {
        let name = name.unwrap_or(self.name());
        let items = match value.as_items() {
            Some(items) if value.kind() == self.target || self.cast.contains(&value.kind()) => {
                items.to_vec()
            }
            _ => {
                let names: Vec<String> = std::iter::once(self.target)
                    .chain(self.cast.iter().copied())
                    .map(|kind| kind.as_str().to_string())
                    .collect();
                return Err(type_error(obj, name, &join_names(&names), &value));
            }
        };
        let items = match &self.element {
            None => items,
            Some(element) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| element.verify(obj, item, Some(&format!("{name}[{i}]"))))
                .collect::<Result<Vec<_>>>()?,
        };
        Ok(match self.target {
            ValueKind::Tuple => Value::Tuple(items),
            _ => Value::List(items),
        })
    }

    fn parse(&self, text: &str) -> Result<Value> {
        parse_as(self.target, text).ok_or_else(|| {
            Error::Parse(format!(
                "cannot parse {} as {}",
                Value::from(text).repr(),
                self.target
            ))
        })
    }
}

/// Accepts a dict whose keys and values pass their attributes.
///
/// Key errors are reported as `Class.field[...]`, value errors as
/// `Class.field['key']`.
#[derive(Debug)]
pub struct Dict {
    core: FieldCore,
    key: Option<Box<dyn Descriptor>>,
    value: Option<Box<dyn Descriptor>>,
    cast: Vec<ValueKind>,
}

impl Dict {
    /// A dict of anything.
    #[must_use]
    pub fn new() -> Self {
        Self {
            core: FieldCore::param(None),
            key: None,
            value: None,
            cast: Vec::new(),
        }
    }

    /// A dict with keys of kind `key` and values of kind `value`.
    #[must_use]
    pub fn of(key: ValueKind, value: ValueKind) -> Self {
        Self::new().keys(OfType::new([key])).values(OfType::new([value]))
    }

    /// Verifies keys with `key`.
    #[must_use]
    pub fn keys(mut self, key: impl Descriptor) -> Self {
        self.key = Some(Box::new(key));
        self
    }

    /// Verifies values with `value`.
    #[must_use]
    pub fn values(mut self, value: impl Descriptor) -> Self {
        self.value = Some(Box::new(value));
        self
    }

    /// Also accepts a list or tuple of `(key, value)` pairs.
    #[must_use]
    pub fn cast(mut self, kind: ValueKind) -> Self {
        self.cast.push(kind);
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.core.default = Some(default.into());
        self
    }

    fn from_pairs(obj: &Instance, name: &str, value: &Value) -> Result<DictValue> {
        let bad = || {
            Error::Value(format!(
                "{} cannot convert {} to dict",
                field_label(obj, name),
                value.repr()
            ))
        };
        let items = value.as_items().ok_or_else(bad)?;
        items
            .iter()
            .map(|pair| match pair.as_items() {
                Some([k, v]) => Key::from_value(k)
                    .map(|k| (k, v.clone()))
                    .ok_or_else(bad),
                _ => Err(bad()),
            })
            .collect()
    }
}

impl Default for Dict {
    fn default() -> Self {
        Self::new()
    }
}

impl Descriptor for Dict {
    descriptor_core!();

    fn bind(&mut self, binding: &FieldBinding) {
        self.core.binding = binding.clone();
        for trait_ in [&mut self.key, &mut self.value].into_iter().flatten() {
            trait_.bind(binding);
        }
    }

    fn value_kinds(&self) -> Vec<ValueKind> {
        vec![ValueKind::Dict]
    }

    fn verify(&self, obj: &Instance, value: Value, name: Option<&str>) -> Result<Value> {
        let name = name.unwrap_or(self.name());
        let map = match value {
            Value::Dict(map) => map,
            other if self.cast.contains(&other.kind()) => Self::from_pairs(obj, name, &other)?,
            other => {
                let names: Vec<String> = std::iter::once(ValueKind::Dict)
                    .chain(self.cast.iter().copied())
                    .map(|kind| kind.as_str().to_string())
                    .collect();
                return Err(type_error(obj, name, &join_names(&names), &other));
            }
        };
        let mut checked = DictValue::with_capacity(map.len());
        for (key, item) in map {
            let key = match &self.key {
                None => key,
                Some(trait_) => {
                    let verified = trait_.verify(obj, key.to_value(), Some(&format!("{name}[...]")))?;
                    Key::from_value(&verified).ok_or_else(|| {
                        Error::Value(format!(
                            "{}[...] got unhashable key {}",
                            field_label(obj, name),
                            verified.repr()
                        ))
                    })?
                }
            };
            let item = match &self.value {
                None => item,
                Some(trait_) => {
                    trait_.verify(obj, item, Some(&format!("{name}[{}]", key.repr())))?
                }
            };
            checked.insert(key, item);
        }
        Ok(Value::Dict(checked))
    }

    fn parse(&self, text: &str) -> Result<Value> {
        parse_as(ValueKind::Dict, text).ok_or_else(|| {
            Error::Parse(format!("cannot parse {} as dict", Value::from(text).repr()))
        })
    }
}

/// Accepts only one of a fixed set of values, compared by equality.
///
/// The first choice is the default unless [`no_default`](Choice::no_default)
/// is used.
#[derive(Debug, Clone)]
pub struct Choice {
    core: FieldCore,
    choices: Vec<Value>,
}

impl Choice {
    /// Accepts one of `choices`.
    pub fn new<I, V>(choices: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let choices: Vec<Value> = choices.into_iter().map(Into::into).collect();
        Self {
            core: FieldCore::param(choices.first().cloned()),
            choices,
        }
    }

    /// Treats the first choice as just an alternative.
    #[must_use]
    pub fn no_default(mut self) -> Self {
        self.core.default = None;
        self
    }

    /// The accepted values.
    #[must_use]
    pub fn choices(&self) -> &[Value] {
        &self.choices
    }
}

impl Descriptor for Choice {
    descriptor_core!();

    fn value_kinds(&self) -> Vec<ValueKind> {
        let mut kinds: Vec<ValueKind> = Vec::new();
        for choice in &self.choices {
            if !kinds.contains(&choice.kind()) {
                kinds.push(choice.kind());
            }
        }
        kinds
    }

    fn verify(&self, obj: &Instance, value: Value, name: Option<&str>) -> Result<Value> {
        if self.choices.contains(&value) {
            return Ok(value);
        }
        Err(Error::Value(format!(
            "{} only accepts one of {}: got {}",
            field_label(obj, name.unwrap_or(self.name())),
            Value::Tuple(self.choices.clone()).repr(),
            value.repr()
        )))
    }

    fn parse(&self, text: &str) -> Result<Value> {
        self.choices
            .iter()
            .find(|choice| {
                let parsed = match choice {
                    Value::Bool(_) => parse_bool(text).map(Value::Bool),
                    other => parse_as(other.kind(), text),
                };
                parsed.as_ref() == Some(*choice)
            })
            .cloned()
            .ok_or_else(|| {
                Error::Parse(format!(
                    "cannot parse {}: expected one of {}",
                    Value::from(text).repr(),
                    Value::Tuple(self.choices.clone()).repr()
                ))
            })
    }
}

/// Uses the first of several attributes that accepts a value.
///
/// Reads try each component's `get` in order and return the first value
/// found, then this field's own default (or else the first component
/// default). Writes try each data component's `verify` in order and skip
/// observers such as [`Link`](crate::descriptors::Link). All components
/// share this field's name and storage key.
#[derive(Debug)]
pub struct Or {
    core: FieldCore,
    traits: Vec<Box<dyn Descriptor>>,
}

impl Or {
    /// An empty union; add components with [`or`](Or::or).
    #[must_use]
    pub fn new() -> Self {
        Self {
            core: FieldCore::param(None),
            traits: Vec::new(),
        }
    }

    /// Appends a component.
    #[must_use]
    pub fn or(mut self, component: impl Descriptor) -> Self {
        self.traits.push(Box::new(component));
        self
    }

    /// Sets the union's own default.
    #[must_use]
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.core.default = Some(default.into());
        self
    }

    /// The components, in order.
    #[must_use]
    pub fn components(&self) -> &[Box<dyn Descriptor>] {
        &self.traits
    }
}

impl Default for Or {
    fn default() -> Self {
        Self::new()
    }
}

impl Descriptor for Or {
    descriptor_core!();

    fn bind(&mut self, binding: &FieldBinding) {
        self.core.binding = binding.clone();
        for component in &mut self.traits {
            component.bind(binding);
        }
    }

    fn default_value(&self) -> Option<Value> {
        self.core
            .default
            .clone()
            .or_else(|| self.traits.iter().find_map(|t| t.default_value()))
    }

    fn value_kinds(&self) -> Vec<ValueKind> {
        let mut kinds = Vec::new();
        for kind in self.traits.iter().flat_map(|t| t.value_kinds()) {
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        kinds
    }

    fn get(&self, obj: &Instance) -> Result<Value> {
        for component in &self.traits {
            match component.get(obj) {
                Ok(value) => return Ok(value),
                Err(err) if err.is_attribute() => continue,
                Err(err) => return Err(err),
            }
        }
        self.default_value().ok_or_else(|| missing(obj, self.name()))
    }

    fn verify(&self, obj: &Instance, value: Value, name: Option<&str>) -> Result<Value> {
        let name = name.unwrap_or(self.name());
        for component in self.traits.iter().filter(|t| t.is_data()) {
            match component.verify(obj, value.clone(), Some(name)) {
                Ok(accepted) => return Ok(accepted),
                Err(Error::Value(_)) => continue,
                Err(err) => return Err(err),
            }
        }
        Err(Error::Value(format!(
            "None of the traits of {} are matched to: {}",
            field_label(obj, name),
            value.repr()
        )))
    }

    fn parse(&self, text: &str) -> Result<Value> {
        for component in self.traits.iter().filter(|t| t.is_data()) {
            match component.parse(text) {
                Ok(value) => return Ok(value),
                Err(Error::Parse(_)) => continue,
                Err(err) => return Err(err),
            }
        }
        Err(Error::Parse(format!(
            "none of the traits can parse {}",
            Value::from(text).repr()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_joined_with_or() {
        let names = |xs: &[&str]| xs.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(join_names(&names(&["int"])), "int");
        assert_eq!(join_names(&names(&["int", "float"])), "int or float");
        assert_eq!(join_names(&names(&["int", "float", "str"])), "int, float or str");
    }

    #[test]
    fn init_kind_is_accepted() {
        let field = OfType::new([ValueKind::Int]).init(ValueKind::Dict);
        assert_eq!(field.value_kinds(), vec![ValueKind::Dict, ValueKind::Int]);
    }

    #[test]
    fn or_default_falls_back_to_components() {
        let field = Or::new()
            .or(OfType::new([ValueKind::Int]))
            .or(OfType::new([ValueKind::Str]).with_default("x"));
        assert_eq!(field.default_value(), Some(Value::from("x")));
        let field = field.with_default(1);
        assert_eq!(field.default_value(), Some(Value::Int(1)));
    }

    #[test]
    fn or_binds_components() {
        let mut field = Or::new()
            .or(OfType::new([ValueKind::Int]))
            .or(Or::new().or(Choice::new(["a"])));
        let binding = FieldBinding::new("attr");
        field.bind(&binding);
        for component in field.components() {
            assert_eq!(component.name(), "attr");
            assert_eq!(component.key(), binding.key);
        }
        let inner = field.components()[1]
            .downcast_ref::<Or>()
            .map(|or| or.components()[0].key());
        assert_eq!(inner, Some(binding.key));
    }

    #[test]
    fn choice_parses_by_choice_type() {
        let field = Choice::new([Value::Int(1), Value::Float(2.5), Value::from("a"), Value::Bool(true)]);
        assert_eq!(field.parse("1").ok(), Some(Value::Int(1)));
        assert_eq!(field.parse("2.5").ok(), Some(Value::Float(2.5)));
        assert_eq!(field.parse("a").ok(), Some(Value::from("a")));
        assert_eq!(field.parse("yes").ok(), Some(Value::Bool(true)));
        assert!(field.parse("b").is_err());
    }

    #[test]
    fn of_type_parses_in_order() {
        let field = OfType::new([ValueKind::Bool, ValueKind::Int]);
        assert_eq!(field.parse("1").ok(), Some(Value::Bool(true)));
        assert_eq!(field.parse("2").ok(), Some(Value::Int(2)));
    }
}
