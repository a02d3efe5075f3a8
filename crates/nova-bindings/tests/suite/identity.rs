use nova_bindings::{
    erasure, substitute, BaseType, BindingKind, MapSubstitution, TypeSubstitution, WellKnown,
    WildcardKind,
};
use pretty_assertions::assert_eq;

use super::jdk_env;

#[test]
fn substitution_without_matching_variables_preserves_identity() {
    let mut env = jdk_env();
    let map = env.get_type("java.util.Map").unwrap();
    let list = env.get_type("java.util.List").unwrap();
    let string = env.well_known(WellKnown::String);
    let vars = env.class(map).unwrap().type_variables.clone();
    let e = env.class(list).unwrap().type_variables[0];

    let wildcard = env.create_wildcard(Some(map), 1, WildcardKind::Extends, Some(e), vec![]);
    let ty = env.create_parameterized_type(map, vec![e, wildcard], None);
    let unrelated = MapSubstitution::new(&vars, &[string, string]);
    assert_eq!(substitute(&mut env, &unrelated, ty), ty);

    let list_subst = MapSubstitution::new(&[e], &[string]);
    let substituted = substitute(&mut env, &list_subst, ty);
    assert_ne!(substituted, ty);
    let args = env.parameterized(substituted).unwrap().arguments.clone();
    assert_eq!(args[0], string);
    assert_eq!(env.wildcard(args[1]).unwrap().bound, Some(string));
}

#[test]
fn structurally_equal_types_share_an_id() {
    let mut env = jdk_env();
    let map = env.get_type("java.util.Map").unwrap();
    let string = env.well_known(WellKnown::String);
    let integer = env.well_known(WellKnown::Integer);

    let a = env.create_parameterized_type(map, vec![string, integer], None);
    let b = env.create_parameterized_type(map, vec![string, integer], None);
    let c = env.create_parameterized_type(map, vec![integer, string], None);
    assert_eq!(a, b);
    assert_ne!(a, c);

    let w1 = env.create_wildcard(Some(map), 0, WildcardKind::Super, Some(string), vec![]);
    let w2 = env.create_wildcard(Some(map), 0, WildcardKind::Super, Some(string), vec![]);
    assert_eq!(w1, w2);
    let u1 = env.create_wildcard(Some(map), 0, WildcardKind::Unbound, Some(string), vec![]);
    let u2 = env.create_wildcard(Some(map), 0, WildcardKind::Unbound, None, vec![]);
    assert_eq!(u1, u2);
}

#[test]
fn erasure_is_idempotent_for_every_kind() {
    let mut env = jdk_env();
    let list = env.get_type("java.util.List").unwrap();
    let enum_ = env.well_known(WellKnown::Enum);
    let e = env.class(enum_).unwrap().type_variables[0];
    let string = env.well_known(WellKnown::String);
    let int = env.base(BaseType::Int);
    let wildcard = env.create_wildcard(Some(list), 0, WildcardKind::Extends, Some(string), vec![]);
    let list_of_wildcard = env.create_parameterized_type(list, vec![wildcard], None);
    let raw = env.create_raw_type(list, None);
    let ints = env.create_array(int, 3);

    for ty in [list, e, string, int, wildcard, list_of_wildcard, raw, ints] {
        let once = erasure(&mut env, ty);
        assert_eq!(erasure(&mut env, once), once, "{:?}", env.kind(ty));
    }
    assert_eq!(erasure(&mut env, list_of_wildcard), list);
    assert_eq!(erasure(&mut env, wildcard), string);
}

#[test]
fn parameterized_supertypes_follow_the_substitution() {
    let mut env = jdk_env();
    let array_list = env.get_type("java.util.ArrayList").unwrap();
    let string = env.well_known(WellKnown::String);
    let owner = env.create_parameterized_type(array_list, vec![string], None);

    let hierarchy = env.hierarchy(owner);
    let superclass = hierarchy.superclass.unwrap();
    assert_eq!(env.kind(superclass), BindingKind::Parameterized);
    assert_eq!(env.parameterized(superclass).unwrap().arguments, vec![string]);

    let subst = TypeSubstitution::new(&env, owner).unwrap();
    let e = env.class(array_list).unwrap().type_variables[0];
    assert_eq!(substitute(&mut env, &subst, e), string);
}
