//! Sample parameter trees, registered under the `samples` module.
//!
//! | Path | Contents |
//! |------|----------|
//! | `samples.SimulationApp` | a simulator, two histogram plotters and a swappable solver |
//! | `samples.Plotter` | figure settings |
//! | `samples.MySimulator` | sample count, seed and distribution |
//! | `samples.HistPlotter`, `samples.CumHistPlotter` | histogram settings linked to the simulator |
//! | `samples.Euler`, `samples.RungeKutta` | solvers selectable through `solver_class` |

use std::rc::Rc;

use compapp::descriptors::{Choice, DynamicClass, Link, List, OfType, Optional};
use compapp::{Class, ClassBuilder, Result, Value, ValueKind};

/// Module name the samples are registered under.
pub const MODULE: &str = "samples";

/// Builds and registers every sample class; returns `samples.SimulationApp`.
///
/// Building again replaces the registered classes.
///
/// # Errors
///
/// Returns class construction errors.
pub fn register() -> Result<Rc<Class>> {
    let plotter = ClassBuilder::parametric("Plotter")
        .module(MODULE)
        .field(
            "figsize",
            List::of([ValueKind::Float]).tuple().cast(ValueKind::List).with_default(Value::tuple([6.4, 4.8])),
        )
        .literal("dpi", 72)
        .field("style", Choice::new(["default", "ggplot", "bmh"]))
        .build()?;

    let simulator = ClassBuilder::parametric("MySimulator")
        .module(MODULE)
        .literal("samples", 1000)
        .field("seed", Optional::new([ValueKind::Int]))
        .field("distribution", Choice::new(["normal", "uniform"]))
        .build()?;

    let hist = ClassBuilder::parametric("HistPlotter")
        .module(MODULE)
        .extends(&plotter)
        .literal("bins", 100)
        .field("samples", Link::new("..sim.samples"))
        .build()?;

    let cumhist = ClassBuilder::parametric("CumHistPlotter")
        .module(MODULE)
        .extends(&hist)
        .literal("cumulative", true)
        .build()?;

    ClassBuilder::parametric("Euler")
        .module(MODULE)
        .literal("dt", 0.01)
        .build()?;

    ClassBuilder::parametric("RungeKutta")
        .module(MODULE)
        .literal("dt", 0.1)
        .field("order", Choice::new([4, 2]))
        .field("tolerance", OfType::new([ValueKind::Float]).with_default(1e-6))
        .build()?;

    ClassBuilder::parametric("SimulationApp")
        .module(MODULE)
        .literal("name", "simulation")
        .nested("sim", &simulator)
        .nested("density", &hist)
        .nested("cumdist", &cumhist)
        .dynamic_class("solver", "solver_class", DynamicClass::new(".Euler").prefix(MODULE))
        .build()
}
