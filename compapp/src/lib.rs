//! Declarative parameter trees for computational applications.
//!
//! A [`Class`] declares its parameters as class-level fields: literal
//! defaults, typed declared attributes ([`descriptors`]), and nested
//! classes. Constructing an [`Instance`] from a dict of parameters assigns
//! the leaves, instantiates every nested parametric class automatically,
//! and wires each nested instance to its owner so that [links] can look
//! values up elsewhere in the tree.
//!
//! [links]: descriptors::Link
//!
//! # Entry Point
//!
//! ```
//! use compapp::descriptors::{Choice, Link};
//! use compapp::{params, ClassBuilder, Instance, Value};
//!
//! # fn main() -> compapp::Result<()> {
//! let solver = ClassBuilder::parametric("solver")
//!     .field("method", Choice::new(["euler", "rk4"]))
//!     .literal("dt", 0.1)
//!     .field("steps", Link::new("..steps"))
//!     .build()?;
//! let app = ClassBuilder::parametric("SimulationApp")
//!     .literal("steps", 100)
//!     .nested("solver", &solver)
//!     .build()?;
//!
//! let app = Instance::new(&app, params! { "solver" => params! { "method" => "rk4" } })?;
//! assert_eq!(app.get_path("solver.method")?, Value::from("rk4"));
//! assert_eq!(app.get_path("solver.steps")?, Value::Int(100));
//! assert_eq!(
//!     app.params(true, None)?,
//!     params! { "steps" => 100, "solver" => params! { "method" => "rk4", "dt" => 0.1 } }
//! );
//! # Ok(())
//! # }
//! ```
//!
//! # Serialization
//!
//! ```
//! use compapp::{params, ClassBuilder, Instance};
//!
//! # fn main() -> compapp::Result<()> {
//! let class = ClassBuilder::parametric("Plotter").literal("dpi", 72).build()?;
//! let plotter = Instance::new(&class, params! {})?;
//! let json = compapp::serializer::to_json(&plotter.params(true, None)?)?;
//! assert_eq!(json, serde_json::json!({ "dpi": 72 }));
//! # Ok(())
//! # }
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod casts;
pub mod descriptors;
pub mod error;
pub mod instance;
pub mod model;
pub mod options;
pub mod parse;
pub mod private;
pub mod registry;
pub mod report;
pub mod serializer;
pub mod setters;
pub mod value;

mod introspect;
mod mixin;

pub use error::{Error, MultiError, Result};
pub use instance::{Instance, WeakInstance};
pub use model::{Attr, Class, ClassBuilder};
pub use value::{Dict, Key, Params, Value, ValueKind};
