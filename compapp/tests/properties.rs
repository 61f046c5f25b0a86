//! Property-based tests for parameter trees.
//!
//! Uses proptest to check isolation, widening, choice enforcement and the
//! construct-from-own-params round trip over generated inputs, including
//! trees whose nested class is overridden by a plain class.

use std::rc::Rc;

use compapp::descriptors::{Choice, OfType};
use compapp::{params, Class, ClassBuilder, Instance, Params, Value, ValueKind};
use proptest::prelude::*;

fn leaf_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::Int),
        (-1.0e9f64..1.0e9).prop_map(Value::Float),
        "[a-z ]{0,8}".prop_map(Value::Str),
        any::<bool>().prop_map(Value::Bool),
        prop::collection::vec(any::<i32>(), 0..4).prop_map(|items| Value::list(items)),
    ]
}

/// A class with the given literal leaves plus a nested class holding the
/// same leaves.
fn class_with_leaves(leaves: &[Value]) -> Rc<Class> {
    let mut nested = ClassBuilder::parametric("nested");
    let mut outer = ClassBuilder::parametric("Generated");
    for (i, value) in leaves.iter().enumerate() {
        nested = nested.literal(&format!("n{i}"), value.clone());
        outer = outer.literal(&format!("f{i}"), value.clone());
    }
    outer.nested("nested", &nested.build().unwrap()).build().unwrap()
}

fn holder() -> Rc<Class> {
    let inner = ClassBuilder::parametric("inner")
        .field("d", OfType::new([ValueKind::Dict]).init(ValueKind::Dict))
        .build()
        .unwrap();
    ClassBuilder::parametric("Holder").nested("inner", &inner).build().unwrap()
}

proptest! {
    /// Mutating one instance's mutable default never leaks into another
    /// instance or into the class defaults.
    #[test]
    fn prop_default_isolation(entries in prop::collection::vec(("[a-z]{1,4}", any::<i64>()), 1..6)) {
        let class = holder();
        let first = Instance::new(&class, params! {}).unwrap();
        let second = Instance::new(&class, params! {}).unwrap();
        let table: Params = entries.into_iter().map(|(k, v)| (k, Value::Int(v))).collect();
        first.child("inner").unwrap().set("d", table.clone()).unwrap();

        prop_assert_eq!(first.get_path("inner.d").unwrap(), Value::from(table));
        prop_assert_eq!(second.get_path("inner.d").unwrap(), Value::from(params! {}));
        prop_assert_eq!(
            class.defaultparams(true, None).unwrap(),
            params! { "inner" => params! { "d" => params! {} } }
        );
    }

    /// Integers widen into float fields; floats never narrow into int fields.
    #[test]
    fn prop_widening_not_narrowing(i in any::<i32>(), x in -1.0e6f64..1.0e6) {
        let class = ClassBuilder::parametric("Numbers")
            .literal("x", 0.0)
            .literal("i", 0)
            .build()
            .unwrap();
        let obj = Instance::new(&class, params! {}).unwrap();
        obj.set("x", i).unwrap();
        prop_assert_eq!(obj.get("x").unwrap().kind(), ValueKind::Float);
        prop_assert_eq!(obj.get("x").unwrap(), Value::Float(f64::from(i)));
        prop_assert!(obj.set("i", x).is_err());
        prop_assert_eq!(obj.get("i").unwrap(), Value::Int(0));
    }

    /// Constructing from an instance's own nested params reproduces them.
    #[test]
    fn prop_params_round_trip(leaves in prop::collection::vec(leaf_value(), 0..6)) {
        let class = class_with_leaves(&leaves);
        let defaults = Instance::new(&class, params! {}).unwrap().params(true, None).unwrap();
        let rebuilt = Instance::new(&class, defaults.clone()).unwrap();
        prop_assert_eq!(rebuilt.params(true, None).unwrap(), defaults);
    }

    /// A subclass overriding the nested class with a plain class keeps the
    /// nested values through a dump and reload.
    #[test]
    fn prop_plain_override_round_trip(
        leaves in prop::collection::vec(any::<i64>(), 1..6),
        overridden in any::<i64>(),
        supplied in any::<i64>(),
    ) {
        let leaves: Vec<Value> = leaves.into_iter().map(Value::Int).collect();
        let base = class_with_leaves(&leaves);
        let derived = ClassBuilder::parametric("Derived")
            .extends(&base)
            .nested("nested", &ClassBuilder::plain("nested").literal("n0", overridden).build().unwrap())
            .build()
            .unwrap();
        prop_assert_eq!(
            Instance::new(&derived, params! {}).unwrap().get_path("nested.n0").unwrap(),
            Value::Int(overridden)
        );

        let obj = Instance::new(&derived, params! { "nested" => params! { "n0" => supplied } }).unwrap();
        let dumped = obj.params(true, None).unwrap();
        let rebuilt = Instance::new(&derived, dumped.clone()).unwrap();
        prop_assert_eq!(rebuilt.get_path("nested.n0").unwrap(), Value::Int(supplied));
        prop_assert_eq!(rebuilt.params(true, None).unwrap(), dumped);
    }

    /// Values outside a choice set are rejected with the full set named.
    #[test]
    fn prop_choice_enforcement(value in "[a-z]{1,6}") {
        prop_assume!(!["fast", "slow"].contains(&value.as_str()));
        let class = ClassBuilder::parametric("Solver")
            .field("mode", Choice::new(["fast", "slow"]))
            .build()
            .unwrap();
        let obj = Instance::new(&class, params! {}).unwrap();
        let err = obj.set("mode", value.as_str()).unwrap_err();
        prop_assert_eq!(
            err.to_string(),
            format!("Solver.mode only accepts one of ('fast', 'slow'): got '{value}'")
        );
        prop_assert_eq!(obj.get("mode").unwrap(), Value::from("fast"));
    }
}
