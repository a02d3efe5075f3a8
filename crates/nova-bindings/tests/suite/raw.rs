use nova_bindings::{find_super_type_originating_from, BindingKind, WellKnown};
use pretty_assertions::assert_eq;

use super::{jdk_env, outer_inner_env};

#[test]
fn member_types_of_raw_types_are_raw() {
    let mut env = outer_inner_env();
    let outer = env.get_type("p.Outer").unwrap();
    let raw_outer = env.create_raw_type(outer, None);

    let inner_method = env.get_methods(raw_outer, "inner")[0];
    let return_type = env.method(inner_method).return_type;
    assert_eq!(env.kind(return_type), BindingKind::Raw);
    let enclosing = env.parameterized(return_type).unwrap().enclosing;
    assert_eq!(enclosing, Some(raw_outer));
}

#[test]
fn members_of_parameterized_member_types_see_outer_arguments() {
    let mut env = outer_inner_env();
    let outer = env.get_type("p.Outer").unwrap();
    let string = env.well_known(WellKnown::String);
    let outer_of_string = env.create_parameterized_type(outer, vec![string], None);

    let inner_method = env.get_methods(outer_of_string, "inner")[0];
    let inner = env.method(inner_method).return_type;
    assert_eq!(env.kind(inner), BindingKind::Parameterized);
    assert_eq!(env.parameterized(inner).unwrap().enclosing, Some(outer_of_string));

    let value = env.get_field(inner, "value").unwrap();
    assert_eq!(env.field(value).ty, string);
}

#[test]
fn raw_members_lose_generic_parameter_types() {
    let mut env = outer_inner_env();
    let outer = env.get_type("p.Outer").unwrap();
    let raw_outer = env.create_raw_type(outer, None);
    let first = env.get_methods(raw_outer, "first")[0];
    let params = env.method(first).parameters.clone();
    assert_eq!(env.kind(params[0]), BindingKind::Raw);
    let object = env.object();
    assert_eq!(env.method(first).return_type, object);
}

#[test]
fn raw_subtypes_find_raw_supertypes() {
    let mut env = jdk_env();
    let array_list = env.get_type("java.util.ArrayList").unwrap();
    let collection = env.get_type("java.util.Collection").unwrap();
    let raw = env.create_raw_type(array_list, None);
    let found = find_super_type_originating_from(&mut env, raw, collection).unwrap();
    assert_eq!(env.kind(found), BindingKind::Raw);
}
