//! Command-line assignment options applied to whole trees.

use std::rc::Rc;

use compapp::descriptors::{DynamicClass, Required};
use compapp::options::{assign_options, parse_assignment_options};
use compapp::report::check_tree;
use compapp::{params, Class, ClassBuilder, Instance, Value, ValueKind};

fn app_class() -> Rc<Class> {
    ClassBuilder::parametric("Integrator")
        .module("options_tests")
        .literal("dt", 0.1)
        .build()
        .unwrap();
    let model = ClassBuilder::parametric("model")
        .literal("n", 10)
        .literal("labels", Value::list(["a"]))
        .build()
        .unwrap();
    ClassBuilder::parametric("App")
        .field("seed", Required::of([ValueKind::Int]))
        .nested("model", &model)
        .dynamic_class("solver", "solver_class", DynamicClass::new("options_tests.Integrator"))
        .build()
        .unwrap()
}

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn options_fill_in_a_tree() {
    let app = Instance::new(&app_class(), params! {}).unwrap();
    assert_eq!(check_tree(&app).failure_count(), 1);

    let (opts, positional) = parse_assignment_options(args(&[
        "--seed=7",
        "--model.n",
        "20",
        "--model.labels:json=[\"x\", \"y\"]",
        "--solver.dt=0.5",
        "input.txt",
    ]))
    .unwrap();
    assert_eq!(positional, ["input.txt"]);
    assign_options(&app, &opts).unwrap();

    assert!(check_tree(&app).into_result().is_ok());
    assert_eq!(
        app.changed_params().unwrap(),
        params! {
            "seed" => 7,
            "model" => params! { "n" => 20, "labels" => Value::list(["x", "y"]) },
            "solver" => params! { "dt" => 0.5 },
        }
    );
}

#[test]
fn file_modifier_loads_json() {
    let path = std::env::temp_dir().join(format!("compapp-options-{}.json", std::process::id()));
    std::fs::write(&path, r#"{ "n": 3 }"#).unwrap();
    let app = Instance::new(&app_class(), params! {}).unwrap();
    let arg = format!("--model:file={}", path.display());
    let (opts, _) = parse_assignment_options(vec![arg]).unwrap();
    assign_options(&app, &opts).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(app.get_path("model.n").unwrap(), Value::Int(3));
}

#[test]
fn a_failing_option_reports_its_error() {
    let app = Instance::new(&app_class(), params! {}).unwrap();
    let (opts, _) = parse_assignment_options(args(&["--model.n=ten"])).unwrap();
    let err = assign_options(&app, &opts).unwrap_err();
    assert_eq!(err.to_string(), "cannot parse 'ten' as any of (int)");
}
