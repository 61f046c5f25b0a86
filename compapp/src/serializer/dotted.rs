//! Flat `path.to.leaf = value` listing of nested parameters.

use crate::setters::nested_items;
use crate::value::{Params, Value};

/// One line per leaf, in tree order. Values are shown the way error
/// messages quote them, so strings keep their quotes; nested instances
/// must already be expanded to dicts.
///
/// ```
/// use compapp::params;
/// use compapp::serializer::dotted::to_dotted;
///
/// let params = params! { "x" => 1.0, "sub" => params! { "s" => "a" } };
/// assert_eq!(to_dotted(&params), "x = 1.0\nsub.s = 'a'\n");
/// ```
#[must_use]
pub fn to_dotted(params: &Params) -> String {
    let mut out = String::new();
    for (path, value) in nested_items(params, true) {
        out.push_str(&path.join("."));
        out.push_str(" = ");
        out.push_str(&Value::repr(&value));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params;

    #[test]
    fn empty_dicts_are_listed() {
        let params = params! { "table" => params! {}, "n" => 1 };
        assert_eq!(to_dotted(&params), "table = {}\nn = 1\n");
    }
}
