//! Builds a small simulation tree, overrides a few parameters from the
//! command line and prints the result.
//!
//! ```text
//! cargo run --example dump_params -- --sim.samples=10 --density:json='{"bins": 20}'
//! ```

use compapp::descriptors::{Choice, Link, Optional};
use compapp::options::{assign_options, parse_assignment_options};
use compapp::report::check_tree;
use compapp::serializer::dotted::to_dotted;
use compapp::{params, ClassBuilder, Instance, ValueKind};

fn main() -> compapp::Result<()> {
    let sim = ClassBuilder::parametric("sim")
        .literal("samples", 1000)
        .field("seed", Optional::new([ValueKind::Int]))
        .field("distribution", Choice::new(["normal", "uniform"]))
        .build()?;
    let density = ClassBuilder::parametric("density")
        .literal("bins", 100)
        .field("samples", Link::new("..sim.samples"))
        .build()?;
    let app = ClassBuilder::parametric("App")
        .nested("sim", &sim)
        .nested("density", &density)
        .build()?;

    let app = Instance::new(&app, params! {})?;
    let (options, _) = parse_assignment_options(std::env::args().skip(1))?;
    assign_options(&app, &options)?;
    check_tree(&app).into_result()?;

    print!("{}", to_dotted(&app.params(true, None)?));
    println!("# changed");
    print!("{}", to_dotted(&app.changed_params()?));
    Ok(())
}
