//! Tree check: findings, severity levels, and report aggregation.
//!
//! [`check_tree`] walks a constructed parameter tree without realizing
//! anything lazily built and reports what would fail later: required
//! fields never set, dynamic-class placeholders whose instance no longer
//! matches the class path, and links that do not resolve.

use crate::descriptors::{ClassPlaceholder, Link, Required};
use crate::error::{Error, MultiError, Result};
use crate::instance::Instance;
use crate::model::Attr;
use crate::value::Value;

/// Severity level of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Worth knowing, but the tree is usable.
    Warning,
    /// The tree is not ready to run.
    Failure,
}

/// A single finding of the tree check.
#[derive(Debug)]
pub struct Finding {
    /// Dotted path of the field from the root of the tree.
    pub path: String,
    /// Severity of the finding.
    pub severity: Severity,
    /// The error reading the field would raise.
    pub error: Error,
}

impl Finding {
    /// Creates a failure.
    pub fn fail(path: impl Into<String>, error: Error) -> Self {
        Self {
            path: path.into(),
            severity: Severity::Failure,
            error,
        }
    }

    /// Creates a warning.
    pub fn warn(path: impl Into<String>, error: Error) -> Self {
        Self {
            path: path.into(),
            severity: Severity::Warning,
            error,
        }
    }

    /// Returns true if this finding is a failure.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.severity == Severity::Failure
    }
}

/// Aggregated findings of one tree check.
#[derive(Debug, Default)]
pub struct CheckReport {
    /// All findings, in tree order.
    pub findings: Vec<Finding>,
}

impl CheckReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a finding.
    pub fn push(&mut self, finding: Finding) {
        self.findings.push(finding);
    }

    /// Appends the findings of another report.
    pub fn extend(&mut self, other: CheckReport) {
        self.findings.extend(other.findings);
    }

    /// Number of failures.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.findings.iter().filter(|f| f.is_failure()).count()
    }

    /// Returns true if nothing failed; warnings are allowed.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failure_count() == 0
    }

    /// Turns failures into one [`Error::Multiple`]; warnings are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Multiple`] when at least one finding is a failure.
    pub fn into_result(self) -> Result<()> {
        let mut errors = MultiError::new();
        for finding in self.findings.into_iter().filter(Finding::is_failure) {
            errors.record::<()>(Err(finding.error));
        }
        errors.into_result()
    }
}

/// Checks `root` and every nested instance already stored under it.
///
/// ```
/// use compapp::descriptors::Required;
/// use compapp::report::check_tree;
/// use compapp::{params, ClassBuilder, Instance, ValueKind};
///
/// # fn main() -> compapp::Result<()> {
/// let job = ClassBuilder::parametric("job").field("n", Required::of([ValueKind::Int])).build()?;
/// let app = ClassBuilder::parametric("App").nested("job", &job).build()?;
/// let app = Instance::new(&app, params! {})?;
///
/// let report = check_tree(&app);
/// assert_eq!(report.failure_count(), 1);
/// assert_eq!(report.findings[0].path, "job.n");
///
/// app.set("job", params! { "n" => 3 })?;
/// assert!(check_tree(&app).into_result().is_ok());
/// # Ok(())
/// # }
/// ```
#[must_use]
pub fn check_tree(root: &Instance) -> CheckReport {
    let mut report = CheckReport::new();
    check_node(root, &root.path_from_root(), &mut report);
    report
}

fn check_node(obj: &Instance, prefix: &str, report: &mut CheckReport) {
    let class = obj.class();
    for (name, attr) in class.fields() {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}.{name}")
        };
        match attr {
            Attr::Field(desc) if desc.is::<Required>() => {
                if let Err(err) = obj.get(name) {
                    report.push(Finding::fail(path, err));
                }
            }
            Attr::Field(desc) if desc.is::<Link>() => {
                if let Err(err) = obj.get(name) {
                    report.push(Finding::warn(path, err));
                }
            }
            Attr::Field(desc) => {
                let Some(placeholder) = desc.downcast_ref::<ClassPlaceholder>() else {
                    continue;
                };
                match placeholder.is_consistent(obj) {
                    Ok(true) => {
                        if let Some(Value::Object(child)) = obj.stored(desc.key()) {
                            check_node(&child, &path, report);
                        }
                    }
                    Ok(false) => {
                        if let Err(err) = obj.get(name) {
                            report.push(Finding::fail(path, err));
                        }
                    }
                    Err(err) => report.push(Finding::fail(path, err)),
                }
            }
            Attr::Class(_) => {
                if let Ok(Value::Object(child)) = obj.get(name) {
                    check_node(&child, &path, report);
                }
            }
            Attr::Literal(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptors::DynamicClass;
    use crate::model::ClassBuilder;
    use crate::params;
    use crate::value::ValueKind;

    #[test]
    fn missing_required_fields_fail() {
        let class = ClassBuilder::parametric("Job")
            .field("a", Required::of([ValueKind::Int]))
            .field("b", Required::any())
            .build()
            .unwrap();
        let job = Instance::new(&class, params! { "b" => "x" }).unwrap();
        let report = check_tree(&job);
        assert_eq!(report.failure_count(), 1);
        assert_eq!(report.findings[0].path, "a");
        let err = report.into_result().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Multiple exceptions are raised:\n* AttributeError: 'Job' object has no attribute 'a'"
        );
    }

    #[test]
    fn dangling_links_only_warn() {
        let class = ClassBuilder::parametric("Viewer")
            .field("data", Link::new("..data"))
            .build()
            .unwrap();
        let viewer = Instance::new(&class, params! {}).unwrap();
        let report = check_tree(&viewer);
        assert_eq!(report.findings.len(), 1);
        assert!(report.all_passed());
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn stale_placeholders_fail() {
        ClassBuilder::parametric("CheckA").module("report_tests").build().unwrap();
        ClassBuilder::parametric("CheckB").module("report_tests").build().unwrap();
        let app = ClassBuilder::parametric("App")
            .dynamic_class("obj", "path", DynamicClass::new("report_tests.CheckA"))
            .build()
            .unwrap();
        let app = Instance::new(&app, params! {}).unwrap();
        assert!(check_tree(&app).all_passed());
        app.get("obj").unwrap();
        app.set("path", "report_tests.CheckB").unwrap();
        let report = check_tree(&app);
        assert_eq!(report.failure_count(), 1);
        assert_eq!(report.findings[0].path, "obj");
        assert!(report.findings[0]
            .error
            .to_string()
            .starts_with("Trying to get obj.obj="));
    }
}
