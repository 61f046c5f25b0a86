//! Late-bound sub-components selected by class path.

use std::rc::Rc;

use compapp::descriptors::{DynamicClass, Link};
use compapp::{params, registry, Class, ClassBuilder, Error, Instance, Value, ValueKind};

const MODULE: &str = "dynamic_class_tests";

fn dynamic_param() -> Rc<Class> {
    ClassBuilder::parametric("SubparamA")
        .module(MODULE)
        .field("x", Link::delegate())
        .build()
        .unwrap();
    ClassBuilder::parametric("SubparamB")
        .module(MODULE)
        .field("x", Link::delegate())
        .literal("y", 0)
        .build()
        .unwrap();
    ClassBuilder::parametric("DynamicParam")
        .dynamic_class("sub", "sub_class", DynamicClass::new(".SubparamA").prefix(MODULE))
        .literal("x", 1.0)
        .build()
        .unwrap()
}

fn class_name(value: Value) -> String {
    value.into_object().unwrap().class().qualified_name()
}

#[test]
fn default_class_is_instantiated_lazily() {
    let par = Instance::new(&dynamic_param(), params! {}).unwrap();
    assert_eq!(class_name(par.get("sub").unwrap()), "dynamic_class_tests.SubparamA");
}

#[test]
fn class_path_selects_the_class() {
    let par = Instance::new(&dynamic_param(), params! { "sub_class" => ".SubparamB" }).unwrap();
    assert_eq!(class_name(par.get("sub").unwrap()), "dynamic_class_tests.SubparamB");
}

#[test]
fn realized_instances_are_wired_to_their_owner() {
    let par = Instance::new(&dynamic_param(), params! {}).unwrap();
    assert_eq!(par.get_path("sub.x").unwrap(), Value::Float(1.0));
    par.set("x", 2.0).unwrap();
    assert_eq!(par.get_path("sub.x").unwrap(), Value::Float(2.0));
}

#[test]
fn dict_values_become_constructor_params() {
    let par = Instance::new(
        &dynamic_param(),
        params! { "sub" => params! { "y" => 3 }, "sub_class" => ".SubparamB" },
    )
    .unwrap();
    assert_eq!(par.get_path("sub.y").unwrap(), Value::Int(3));
}

#[test]
fn assigning_an_instance_writes_the_path_back() {
    let class = dynamic_param();
    let b = registry::import_class("dynamic_class_tests.SubparamB").unwrap();
    let par = Instance::new(&class, params! {}).unwrap();
    par.set("sub", Instance::new(&b, params! {}).unwrap()).unwrap();
    assert_eq!(par.get("sub_class").unwrap(), Value::from("dynamic_class_tests.SubparamB"));
    assert_eq!(par.get_path("sub.x").unwrap(), Value::Float(1.0));
}

#[test]
fn changing_the_path_after_access_is_an_error() {
    let par = Instance::new(&dynamic_param(), params! {}).unwrap();
    par.get("sub").unwrap();
    par.set("sub_class", ".SubparamB").unwrap();
    let err = par.get("sub").unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with(
        "Trying to get obj.sub=<dynamic_class_tests.SubparamA object> but it does not match \
         with class path obj.sub_class=.SubparamB."
    ));
    assert!(message.contains("The class path obj.sub_class might be changed after the first access of obj.sub."));
}

#[test]
fn unknown_class_paths_are_rejected() {
    let par = Instance::new(&dynamic_param(), params! {}).unwrap();
    let err = par.set("sub_class", ".Missing").unwrap_err();
    assert!(matches!(err, Error::Import(_)));
    assert_eq!(err.to_string(), "No class named 'dynamic_class_tests.Missing' is registered");
}

#[test]
fn relative_paths_need_a_prefix() {
    let class = ClassBuilder::parametric("NoPrefix")
        .dynamic_class("obj", "path", DynamicClass::new(".Anything"))
        .build()
        .unwrap();
    let obj = Instance::new(&class, params! {}).unwrap();
    let err = obj.get("obj").unwrap_err();
    assert_eq!(
        err.to_string(),
        "relative import path is specified but no prefix is defined."
    );
}

#[test]
fn relative_paths_without_prefix_are_rejected_on_write() {
    let class = ClassBuilder::parametric("NoPrefix")
        .dynamic_class("obj", "path", DynamicClass::new(".Anything"))
        .build()
        .unwrap();
    let obj = Instance::new(&class, params! {}).unwrap();
    let err = obj.set("path", ".Other").unwrap_err();
    assert!(matches!(err, Error::Value(_)));
    assert_eq!(
        err.to_string(),
        "relative import path is specified but no prefix is defined."
    );
    assert_eq!(obj.get("path").unwrap(), Value::from(".Anything"));
}

#[test]
fn placeholders_are_object_params() {
    let class = dynamic_param();
    assert_eq!(class.paramnames(None), ["sub_class", "sub", "x"]);
    assert_eq!(class.paramnames(Some(&[ValueKind::Str])), ["sub_class"]);
    let defaults = class.defaultparams(true, None).unwrap();
    assert_eq!(
        defaults,
        params! { "sub_class" => ".SubparamA", "sub" => params! {}, "x" => 1.0 }
    );
}
