use nova_bindings::{generic_signature, method_key, method_signature, type_key, WellKnown};
use nova_decl::signature::{parse_field_signature, parse_method_signature, JavaTypeSignature};
use pretty_assertions::assert_eq;

use super::{jdk_env, outer_inner_env};

#[test]
fn keys_are_stable_across_environments() {
    let keys = |mut env: nova_bindings::Environment| {
        let map = env.get_type("java.util.HashMap").unwrap();
        let string = env.well_known(WellKnown::String);
        let integer = env.well_known(WellKnown::Integer);
        let ty = env.create_parameterized_type(map, vec![string, integer], None);
        let methods = env.methods(ty);
        let mut keys: Vec<String> = methods.into_iter().map(|m| method_key(&mut env, m)).collect();
        keys.push(type_key(&mut env, ty));
        keys
    };
    assert_eq!(keys(jdk_env()), keys(jdk_env()));
}

#[test]
fn member_type_signature_round_trips() {
    let mut env = outer_inner_env();
    let outer = env.get_type("p.Outer").unwrap();
    let string = env.well_known(WellKnown::String);
    let outer_of_string = env.create_parameterized_type(outer, vec![string], None);
    let inner_method = env.get_methods(outer_of_string, "inner")[0];
    let inner = env.method(inner_method).return_type;

    let signature = generic_signature(&mut env, inner);
    assert_eq!(signature, "Lp/Outer<Ljava/lang/String;>.Inner;");
    match parse_field_signature(&signature).expect("parses") {
        JavaTypeSignature::Class(class) => assert_eq!(class.binary_name(), "p.Outer$Inner"),
        other => panic!("unexpected signature {other:?}"),
    }
}

#[test]
fn method_signatures_parse_back() {
    let mut env = jdk_env();
    let list = env.get_type("java.util.List").unwrap();
    let of = env.get_methods(list, "of")[0];
    let signature = method_signature(&mut env, of);
    assert_eq!(signature, "<E:Ljava/lang/Object;>([TE;)Ljava/util/List<TE;>;");
    let parsed = parse_method_signature(&signature).expect("parses");
    assert_eq!(parsed.type_parameters[0].name, "E");
}
