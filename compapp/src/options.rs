//! Command-line assignment options.
//!
//! Arguments of the form `--path.to.field=value` or `--path.to.field value`
//! assign a field of a parameter tree. The text is parsed by the target
//! field, so `--x=1` sets a float field to `1.0` and a string field to
//! `"1"`. A modifier after a colon changes how the text is read:
//!
//! - `--a.b:json=[1, 2]` parses the text as JSON;
//! - `--a.b:file=params.json` loads the JSON file at the given path.
//!
//! A bare `--` ends option processing; everything after it is positional.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::instance::Instance;
use crate::model::Attr;
use crate::parse::{parse_first, parse_json};
use crate::serializer::json::value_from_json;
use crate::value::{Key, Value, ValueKind};

/// How the text of an option is turned into a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    /// Parse the text as a JSON document.
    Json,
    /// Load the JSON file named by the text.
    File,
}

impl FromStr for Modifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "json" => Ok(Modifier::Json),
            "file" => Ok(Modifier::File),
            other => Err(Error::Parse(format!("Unsupported modifier: {other}"))),
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Modifier::Json => "json",
            Modifier::File => "file",
        })
    }
}

/// One `--path=value` assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignOption {
    /// Dotted path of the field, relative to the root instance.
    pub path: String,
    /// The raw text of the value.
    pub value: String,
    /// How to read `value`; `None` lets the target field parse it.
    pub modifier: Option<Modifier>,
}

fn is_option(arg: &str) -> bool {
    arg.strip_prefix("--")
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
}

/// Splits raw arguments into assignment options and positional arguments.
///
/// ```
/// use compapp::options::{parse_assignment_options, Modifier};
///
/// # fn main() -> compapp::Result<()> {
/// let args = ["in.txt", "--a.b=1", "--c", "x", "--d:json", "[1]", "--", "--e"];
/// let (opts, positional) = parse_assignment_options(args.iter().map(|s| s.to_string()))?;
/// assert_eq!(opts.len(), 3);
/// assert_eq!((opts[0].path.as_str(), opts[0].value.as_str()), ("a.b", "1"));
/// assert_eq!((opts[1].path.as_str(), opts[1].value.as_str()), ("c", "x"));
/// assert_eq!(opts[2].modifier, Some(Modifier::Json));
/// assert_eq!(positional, ["in.txt", "--e"]);
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns [`Error::Parse`] for an unknown modifier or an option missing
/// its value.
pub fn parse_assignment_options<I>(args: I) -> Result<(Vec<AssignOption>, Vec<String>)>
where
    I: IntoIterator<Item = String>,
{
    let mut options = Vec::new();
    let mut positional = Vec::new();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "--" {
            positional.extend(args.by_ref());
            break;
        }
        if !is_option(&arg) {
            positional.push(arg);
            continue;
        }
        let body = &arg[2..];
        let (key, inline) = match body.split_once('=') {
            Some((key, value)) => (key, Some(value.to_string())),
            None => (body, None),
        };
        let (path, modifier) = match key.split_once(':') {
            Some((path, modifier)) => (path, Some(modifier.parse::<Modifier>()?)),
            None => (key, None),
        };
        let value = match inline {
            Some(value) => value,
            None => args
                .next()
                .ok_or_else(|| Error::Parse(format!("option --{key} requires a value")))?,
        };
        options.push(AssignOption {
            path: path.to_string(),
            value,
            modifier,
        });
    }
    Ok((options, positional))
}

/// Parses an option's text for field `name` of `holder`.
fn parse_for(holder: &Instance, name: &str, text: &str) -> Result<Value> {
    let class = holder.class();
    match class.lookup(name) {
        Some(Attr::Field(desc)) => desc.parse(text),
        Some(Attr::Literal(default)) => match default.kind() {
            ValueKind::Str | ValueKind::None => Ok(Value::Str(text.to_string())),
            kind => parse_first(&[kind], text),
        },
        Some(Attr::Class(_)) => parse_first(&[ValueKind::Dict], text),
        None => match holder.get(name) {
            Ok(Value::Dict(_)) => parse_json(text),
            _ => Ok(Value::Str(text.to_string())),
        },
    }
}

fn load_file(path: &str) -> Result<Value> {
    let text = std::fs::read_to_string(path)
        .map_err(|err| Error::Parse(format!("cannot read {path}: {err}")))?;
    let json: serde_json::Value = serde_json::from_str(&text)
        .map_err(|err| Error::Parse(format!("invalid JSON in {path}: {err}")))?;
    Ok(value_from_json(&json))
}

/// Assigns one option to the tree rooted at `root`.
///
/// Every path segment but the last must name a nested instance, except
/// that the last segment may be a key of a dict-valued field.
///
/// # Errors
///
/// Returns parse errors of the value, access errors of the path, and
/// assignment errors of the target field.
pub fn assign_option(root: &Instance, option: &AssignOption) -> Result<()> {
    let segments: Vec<&str> = option.path.split('.').collect();
    let Some((last, parents)) = segments.split_last() else {
        return Err(Error::Parse("empty option path".to_string()));
    };

    let mut holder = root.clone();
    for (i, segment) in parents.iter().enumerate() {
        match holder.get(segment)? {
            Value::Object(child) => holder = child,
            Value::Dict(mut dict) if i + 1 == parents.len() => {
                let value = read_value(option, || {
                    Ok(parse_json(&option.value).unwrap_or_else(|_| Value::Str(option.value.clone())))
                })?;
                dict.insert(Key::from(*last), value);
                return holder.set(segment, Value::Dict(dict));
            }
            other => {
                return Err(Error::Value(format!(
                    "cannot assign --{}: {} is {} of type {}",
                    option.path,
                    segment,
                    other.repr(),
                    other.type_name()
                )))
            }
        }
    }
    let value = read_value(option, || parse_for(&holder, last, &option.value))?;
    holder.set(last, value)
}

fn read_value(option: &AssignOption, default: impl FnOnce() -> Result<Value>) -> Result<Value> {
    match option.modifier {
        Some(Modifier::Json) => parse_json(&option.value),
        Some(Modifier::File) => load_file(&option.value),
        None => default(),
    }
}

/// Assigns every option in order, stopping at the first error.
///
/// # Errors
///
/// See [`assign_option`].
pub fn assign_options(root: &Instance, options: &[AssignOption]) -> Result<()> {
    options.iter().try_for_each(|option| assign_option(root, option))
}
