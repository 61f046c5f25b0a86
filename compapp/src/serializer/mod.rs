//! Serializers for parameter trees.
//!
//! Two output formats are supported:
//! - **JSON** ([`json`]) for dumping and loading nested parameter dicts
//! - **Dotted** ([`dotted`]) for one `path.to.leaf = value` line per leaf

pub mod dotted;
pub mod json;

pub use json::{from_json, to_json};
