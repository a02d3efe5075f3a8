use nova_bindings::{
    greater_lower_bound, intersection_parts, lower_upper_bound, BindingKind, Declarer, Environment, TypeId,
    TypeVariableBounds, WellKnown, WildcardKind,
};
use pretty_assertions::assert_eq;

use super::jdk_env;

#[test]
fn recursive_lub_of_string_and_integer_terminates() {
    let mut env = jdk_env();
    let string = env.well_known(WellKnown::String);
    let integer = env.well_known(WellKnown::Integer);
    let comparable = env.get_type("java.lang.Comparable").unwrap();
    let serializable = env.well_known(WellKnown::Serializable);

    let lub = lower_upper_bound(&mut env, &[string, integer]).expect("lub exists");
    assert_eq!(env.kind(lub), BindingKind::Intersection);
    let parts = intersection_parts(&env, lub);
    assert!(parts.contains(&serializable));

    let comparable_part = parts
        .iter()
        .copied()
        .find(|&part| env.generic_of(part) == Some(comparable))
        .expect("Comparable<?> part");
    let argument = env.parameterized(comparable_part).unwrap().arguments[0];
    assert_eq!(env.wildcard(argument).unwrap().kind, WildcardKind::Unbound);
}

#[test]
fn lub_is_order_independent() {
    let mut env = jdk_env();
    let string = env.well_known(WellKnown::String);
    let integer = env.well_known(WellKnown::Integer);
    let a = lower_upper_bound(&mut env, &[string, integer]).unwrap();
    let b = lower_upper_bound(&mut env, &[integer, string]).unwrap();
    let mut pa = intersection_parts(&env, a);
    let mut pb = intersection_parts(&env, b);
    pa.sort();
    pb.sort();
    assert_eq!(pa, pb);
}

#[test]
fn lub_of_parameterizations_uses_containing_wildcards() {
    let mut env = jdk_env();
    let list = env.get_type("java.util.List").unwrap();
    let integer = env.well_known(WellKnown::Integer);
    let long = env.well_known(WellKnown::Long);
    let list_of_integer = env.create_parameterized_type(list, vec![integer], None);
    let list_of_long = env.create_parameterized_type(list, vec![long], None);

    let lub = lower_upper_bound(&mut env, &[list_of_integer, list_of_long]).unwrap();
    assert_eq!(env.generic_of(lub), Some(list));
    let argument = env.parameterized(lub).unwrap().arguments[0];
    let wildcard = env.wildcard(argument).unwrap().clone();
    assert_eq!(wildcard.kind, WildcardKind::Extends);
    let bound = wildcard.bound.unwrap();
    let number = env.get_type("java.lang.Number").unwrap();
    assert_eq!(intersection_parts(&env, bound)[0], number);
}

/// A class type variable named `name` bounded by `bound` (`Object` if `None`).
fn type_variable(env: &mut Environment, name: &str, rank: u32, bound: Option<TypeId>) -> TypeId {
    let object = env.object();
    let var = env.create_type_variable(name, rank, Declarer::Type(object));
    env.set_type_variable_bounds(
        var,
        TypeVariableBounds {
            superclass: bound,
            superinterfaces: Vec::new(),
            first_bound: bound,
        },
    );
    var
}

#[test]
fn glb_keeps_the_most_specific_types_class_first() {
    let mut env = jdk_env();
    let integer = env.well_known(WellKnown::Integer);
    let number = env.get_type("java.lang.Number").unwrap();
    let comparable = env.get_type("java.lang.Comparable").unwrap();
    let runnable = env.get_type("java.lang.Runnable").unwrap();

    assert_eq!(greater_lower_bound(&mut env, &[number, integer]), Some(vec![integer]));
    assert_eq!(greater_lower_bound(&mut env, &[runnable, number]), Some(vec![number, runnable]));
    assert_eq!(greater_lower_bound(&mut env, &[comparable, comparable]), Some(vec![comparable]));
}

#[test]
fn glb_of_unrelated_type_variables_is_malformed() {
    let mut env = jdk_env();
    let number = env.get_type("java.lang.Number").unwrap();
    let t = type_variable(&mut env, "T", 0, Some(number));
    let u = type_variable(&mut env, "U", 1, None);
    assert_eq!(greater_lower_bound(&mut env, &[t, u]), None);

    // `V extends T`: the subtype wins.
    let v = type_variable(&mut env, "V", 2, Some(t));
    assert_eq!(greater_lower_bound(&mut env, &[t, v]), Some(vec![v]));
}

#[test]
fn glb_of_a_type_variable_and_an_unrelated_class_is_malformed() {
    let mut env = jdk_env();
    let number = env.get_type("java.lang.Number").unwrap();
    let string = env.well_known(WellKnown::String);
    let serializable = env.well_known(WellKnown::Serializable);
    let object = env.object();
    let t = type_variable(&mut env, "T", 0, Some(number));

    assert_eq!(greater_lower_bound(&mut env, &[t, string]), None);
    assert!(greater_lower_bound(&mut env, &[t, serializable]).is_some());
    assert_eq!(greater_lower_bound(&mut env, &[t, object]), Some(vec![t]));

    // Without a bound only `Object` combines with the variable.
    let u = type_variable(&mut env, "U", 1, None);
    assert_eq!(greater_lower_bound(&mut env, &[u, string]), None);
}
