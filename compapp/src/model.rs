//! Class definitions: the field table of a declarative class.
//!
//! A [`Class`] is built once with a [`ClassBuilder`] and shared through
//! `Rc`. Building computes the C3 linearization of the bases and a
//! resolved field table mapping every visible name to an [`Attr`], so
//! construction and introspection are table lookups rather than walks.
//!
//! ```
//! use compapp::{ClassBuilder, Instance, Value};
//!
//! # fn main() -> compapp::Result<()> {
//! let base = ClassBuilder::parametric("Base")
//!     .nested("x", &ClassBuilder::parametric("x").literal("i", 0).literal("j", 1).build()?)
//!     .build()?;
//! // `x` here is a plain class: it only overrides defaults of `Base.x`.
//! let another = ClassBuilder::parametric("Another")
//!     .extends(&base)
//!     .nested("x", &ClassBuilder::plain("x").literal("i", -1).build()?)
//!     .build()?;
//! let par = Instance::new(&another, compapp::params! {})?;
//! assert_eq!(par.get_path("x.i")?, Value::Int(-1));
//! assert_eq!(par.get_path("x.j")?, Value::Int(1));
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::descriptors::{ClassPlaceholder, Descriptor, DynamicClass, FieldBinding, SharedDescriptor};
use crate::error::{Error, Result};
use crate::registry;
use crate::value::{Params, Value};

/// What a class attribute holds.
#[derive(Debug, Clone)]
pub enum Attr {
    /// A plain literal default, type checked on assignment when simple.
    Literal(Value),
    /// A declared attribute.
    Field(SharedDescriptor),
    /// A nested class, instantiated per instance when mixable.
    Class(Rc<Class>),
}

/// A declarative class.
pub struct Class {
    name: String,
    module: Option<String>,
    bases: Vec<Rc<Class>>,
    ancestors: Vec<Rc<Class>>,
    attrs: IndexMap<String, Attr>,
    fields: IndexMap<String, Attr>,
    parametric: bool,
    strict: bool,
}

thread_local! {
    static PARAMETRIC: Rc<Class> = Rc::new(Class {
        name: "Parametric".to_string(),
        module: Some("compapp".to_string()),
        bases: Vec::new(),
        ancestors: Vec::new(),
        attrs: IndexMap::new(),
        fields: IndexMap::new(),
        parametric: true,
        strict: false,
    });
}

impl Class {
    /// The root of every parametric class.
    #[must_use]
    pub fn parametric_base() -> Rc<Class> {
        PARAMETRIC.with(Rc::clone)
    }

    /// Class name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Module the class is registered under, if any.
    #[must_use]
    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    /// `module.Name`, or just the name for classes without a module.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        match &self.module {
            Some(module) => format!("{module}.{}", self.name),
            None => self.name.clone(),
        }
    }

    /// Direct bases, in declaration order.
    #[must_use]
    pub fn bases(&self) -> &[Rc<Class>] {
        &self.bases
    }

    /// Linearized ancestors, nearest first, excluding the class itself.
    #[must_use]
    pub fn ancestors(&self) -> &[Rc<Class>] {
        &self.ancestors
    }

    /// The class followed by its ancestors in C3 order.
    #[must_use]
    pub fn linearization(self: &Rc<Self>) -> Vec<Rc<Class>> {
        std::iter::once(Rc::clone(self))
            .chain(self.ancestors.iter().cloned())
            .collect()
    }

    /// Attributes declared on this class itself.
    #[must_use]
    pub fn own_attrs(&self) -> &IndexMap<String, Attr> {
        &self.attrs
    }

    /// Every visible attribute, inherited ones included, in base-first
    /// declaration order. An override keeps the position of the name it
    /// overrides.
    #[must_use]
    pub fn fields(&self) -> &IndexMap<String, Attr> {
        &self.fields
    }

    /// The attribute visible under `name`.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&Attr> {
        self.fields.get(name)
    }

    /// The declared attribute visible under `name`, if it is one.
    #[must_use]
    pub fn descriptor(&self, name: &str) -> Option<&SharedDescriptor> {
        match self.lookup(name) {
            Some(Attr::Field(desc)) => Some(desc),
            _ => None,
        }
    }

    /// Whether the class derives from the parametric base.
    #[must_use]
    pub fn is_parametric(&self) -> bool {
        self.parametric
    }

    /// Whether a nested class of this kind takes part in mix-in: it is
    /// parametric or has no bases at all.
    #[must_use]
    pub fn is_mixable(&self) -> bool {
        self.parametric || self.bases.is_empty()
    }

    /// Whether assignment to undeclared names is rejected.
    #[must_use]
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Whether `self` is `other` or derives from it.
    #[must_use]
    pub fn is_subclass_of(self: &Rc<Self>, other: &Rc<Class>) -> bool {
        Rc::ptr_eq(self, other) || self.ancestors.iter().any(|a| Rc::ptr_eq(a, other))
    }

    /// Defaults declared directly on a plain class, used as overrides when
    /// it stands in for a parametric nested class of a base.
    ///
    /// Literals and declared-attribute defaults are taken as is; nested
    /// plain classes become nested dicts. Names starting with `_` and
    /// nested parametric classes are skipped.
    #[must_use]
    pub fn override_params(&self) -> Params {
        let mut params = Params::new();
        for (name, attr) in self.attrs.iter().filter(|(n, _)| !n.starts_with('_')) {
            let value = match attr {
                Attr::Literal(value) => Some(value.clone()),
                Attr::Field(desc) => desc.default_value(),
                Attr::Class(class) if !class.parametric && class.is_mixable() => {
                    Some(Value::from(class.override_params()))
                }
                Attr::Class(_) => None,
            };
            if let Some(value) = value {
                params.insert(name.clone(), value);
            }
        }
        params
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bases: Vec<&str> = self.bases.iter().map(|b| b.name()).collect();
        let fields: Vec<&str> = self.fields.keys().map(String::as_str).collect();
        f.debug_struct("Class")
            .field("name", &self.qualified_name())
            .field("bases", &bases)
            .field("fields", &fields)
            .field("parametric", &self.parametric)
            .finish()
    }
}

/// Builds a [`Class`].
///
/// Attributes are added in declaration order. Declared attributes are
/// bound to their field name when added.
#[derive(Debug)]
pub struct ClassBuilder {
    name: String,
    module: Option<String>,
    bases: Vec<Rc<Class>>,
    implicit_base: bool,
    attrs: IndexMap<String, Attr>,
    strict: bool,
}

impl ClassBuilder {
    /// A class deriving from the parametric base, unless
    /// [`extends`](ClassBuilder::extends) names other bases.
    pub fn parametric(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module: None,
            bases: vec![Class::parametric_base()],
            implicit_base: true,
            attrs: IndexMap::new(),
            strict: false,
        }
    }

    /// A class without bases. Nested inside a parametric class it acts as
    /// a set of default overrides for the same-named nested class of a
    /// base.
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            implicit_base: false,
            bases: Vec::new(),
            ..Self::parametric(name)
        }
    }

    /// Registers the class under `module.Name` when built.
    #[must_use]
    pub fn module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    /// Adds a base class. The first call replaces the implicit parametric
    /// base.
    #[must_use]
    pub fn extends(mut self, base: &Rc<Class>) -> Self {
        if self.implicit_base {
            self.bases.clear();
            self.implicit_base = false;
        }
        self.bases.push(Rc::clone(base));
        self
    }

    /// Declares a literal default.
    #[must_use]
    pub fn literal(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.attrs.insert(name.to_string(), Attr::Literal(value.into()));
        self
    }

    /// Declares a field backed by a declared attribute.
    #[must_use]
    pub fn field(mut self, name: &str, mut desc: impl Descriptor) -> Self {
        desc.bind(&FieldBinding::new(name));
        self.attrs.insert(name.to_string(), Attr::Field(Rc::new(desc)));
        self
    }

    /// Declares a nested class.
    #[must_use]
    pub fn nested(mut self, name: &str, class: &Rc<Class>) -> Self {
        self.attrs.insert(name.to_string(), Attr::Class(Rc::clone(class)));
        self
    }

    /// Declares a dynamic-class pair: the instance under `obj_name` and its
    /// class path under `path_name`.
    #[must_use]
    pub fn dynamic_class(mut self, obj_name: &str, path_name: &str, decl: DynamicClass) -> Self {
        let (mut path, is_param, default) = decl.into_parts();
        path.bind(&FieldBinding::new(path_name));
        let path = Rc::new(path);
        let mut placeholder = ClassPlaceholder::new(Rc::clone(&path), default, is_param);
        placeholder.bind(&FieldBinding::new(obj_name));
        self.attrs.insert(path_name.to_string(), Attr::Field(path));
        self.attrs
            .insert(obj_name.to_string(), Attr::Field(Rc::new(placeholder)));
        self
    }

    /// Rejects assignment to names that are not declared on the class.
    #[must_use]
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Linearizes the bases, resolves the field table and registers the
    /// class if it has a module.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Value`] when the bases admit no consistent
    /// linearization.
    pub fn build(self) -> Result<Rc<Class>> {
        let ancestors = linearize(&self.bases).map_err(|()| {
            let names: Vec<&str> = self.bases.iter().map(|b| b.name()).collect();
            Error::Value(format!(
                "Cannot create a consistent method resolution order (MRO) for bases {}",
                names.join(", ")
            ))
        })?;

        let mut fields: IndexMap<String, Attr> = IndexMap::new();
        for ancestor in ancestors.iter().rev() {
            for (name, attr) in &ancestor.attrs {
                fields.insert(name.clone(), attr.clone());
            }
        }
        for (name, attr) in &self.attrs {
            fields.insert(name.clone(), attr.clone());
        }

        let parametric = self.bases.iter().any(|b| b.parametric);
        let class = Rc::new(Class {
            name: self.name,
            module: self.module,
            bases: self.bases,
            ancestors,
            attrs: self.attrs,
            fields,
            parametric,
            strict: self.strict,
        });
        if class.module.is_some() {
            registry::register(&class);
        }
        Ok(class)
    }
}

/// C3 merge of the bases' linearizations followed by the bases.
fn linearize(bases: &[Rc<Class>]) -> std::result::Result<Vec<Rc<Class>>, ()> {
    let mut seqs: Vec<Vec<Rc<Class>>> = bases.iter().map(Class::linearization).collect();
    seqs.push(bases.to_vec());
    let mut out = Vec::new();
    loop {
        seqs.retain(|seq| !seq.is_empty());
        if seqs.is_empty() {
            return Ok(out);
        }
        let head = seqs
            .iter()
            .map(|seq| &seq[0])
            .find(|head| {
                !seqs
                    .iter()
                    .any(|seq| seq[1..].iter().any(|c| Rc::ptr_eq(c, head)))
            })
            .cloned()
            .ok_or(())?;
        for seq in &mut seqs {
            if Rc::ptr_eq(&seq[0], &head) {
                seq.remove(0);
            }
        }
        out.push(head);
    }
}
