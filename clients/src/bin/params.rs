//! `compapp-params`: instantiates a registered sample parameter tree,
//! applies command-line assignment options and prints the result.
//!
//! **Outputs:** the nested parameters of the tree as pretty JSON, or as
//! dotted `path = value` lines with `--dotted`. With `--diff` only the
//! parameters that differ from the class defaults are printed.
//!
//! **Usage:**
//! ```
//! compapp-params <class-path> [--json <file>] [--diff] [--dotted] [--check] [-- --a.b=1 ...]
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use compapp::options::{assign_options, parse_assignment_options};
use compapp::report::check_tree;
use compapp::serializer::{dotted, from_json, to_json};
use compapp::{params, registry, Instance};
use compapp_clients::samples;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// Print the parameters of a sample parameter tree.
#[derive(Parser)]
#[command(name = "compapp-params", about = "Print the parameters of a sample parameter tree")]
struct Args {
    /// Registered class path, e.g. `samples.SimulationApp`.
    class_path: String,

    /// JSON file of constructor parameters.
    #[arg(long)]
    json: Option<PathBuf>,

    /// Print only the parameters that differ from the defaults.
    #[arg(long)]
    diff: bool,

    /// Print dotted `path = value` lines instead of JSON.
    #[arg(long)]
    dotted: bool,

    /// Fail if the tree check reports failures.
    #[arg(long)]
    check: bool,

    /// Assignment options such as `--sim.samples=10` or `--sim:json={...}`.
    #[arg(last = true)]
    opts: Vec<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    samples::register().context("Failed to register sample classes")?;
    let class = registry::import_class(&args.class_path)
        .with_context(|| {
            format!(
                "Unknown class path: {} (registered: {})",
                args.class_path,
                registry::registered().join(", ")
            )
        })?;

    let initial = match &args.json {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let json: serde_json::Value = serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            from_json(&json).with_context(|| format!("Invalid parameters in {}", path.display()))?
        }
        None => params! {},
    };
    let app = Instance::new(&class, initial)
        .with_context(|| format!("Failed to construct {}", args.class_path))?;

    let (options, positional) =
        parse_assignment_options(args.opts.iter().cloned()).context("Invalid options")?;
    for arg in &positional {
        warn!(arg = %arg, "ignoring positional argument");
    }
    debug!(count = options.len(), "assigning options");
    assign_options(&app, &options).context("Failed to assign options")?;

    let report = check_tree(&app);
    for finding in &report.findings {
        warn!(path = %finding.path, severity = ?finding.severity, "{}", finding.error);
    }
    if args.check && !report.all_passed() {
        bail!("{} check failure(s) in {}", report.failure_count(), args.class_path);
    }

    let params = if args.diff {
        app.changed_params()
    } else {
        app.params(true, None)
    }
    .context("Failed to collect parameters")?;

    if args.dotted {
        print!("{}", dotted::to_dotted(&params));
    } else {
        let json = to_json(&params).context("Failed to convert parameters to JSON")?;
        let text =
            serde_json::to_string_pretty(&json).context("Failed to serialize parameters")?;
        println!("{text}");
    }
    Ok(())
}
