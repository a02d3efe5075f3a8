use nova_bindings::{readable_name, BaseType, BindingKind, ProblemReason, WellKnown};
use nova_decl::{CompilationUnit, MethodDecl, Modifiers, RecordComponentDecl, TypeDecl};
use nova_lookup::{
    applicability, find_exact_method, find_method, get_constructor, get_implicit_method, AccessContext,
    Applicability, InvocationSite,
};
use pretty_assertions::assert_eq;

use super::{compile, ty, Fixture};

fn overloads() -> Fixture {
    let void = || ty("void");
    let unit = CompilationUnit::new("p/Calls.java", Some("p")).with_type(
        TypeDecl::class("Calls")
            .method(MethodDecl::new("box", void()).param("value", ty("int")))
            .method(MethodDecl::new("box", void()).param("value", ty("Integer")))
            .method(MethodDecl::new("widen", void()).param("value", ty("long")))
            .method(MethodDecl::new("widen", void()).param("value", ty("Integer")))
            .method(MethodDecl::new("pick", void()).param("value", ty("Object")))
            .method(MethodDecl::new("pick", void()).param("value", ty("String")))
            .method(MethodDecl::new("pair", void()).param("a", ty("Object")).param("b", ty("String")))
            .method(MethodDecl::new("pair", void()).param("a", ty("String")).param("b", ty("Object")))
            .method(MethodDecl::new("hidden", void()).with_modifiers(Modifiers::PRIVATE)),
    );
    compile(vec![unit])
}

#[test]
fn strict_invocations_beat_boxing() {
    let mut fixture = overloads();
    let calls = fixture.type_named("p.Calls");
    let ctx = AccessContext::in_package("p");
    let env = fixture.lookup.env_mut();
    let int = env.base(BaseType::Int);
    let long = env.base(BaseType::Long);
    let integer = env.well_known(WellKnown::Integer);

    let method = find_method(env, calls, "box", &InvocationSite::new(vec![int]), &ctx);
    assert_eq!(env.method(method).parameters, vec![int]);

    let method = find_method(env, calls, "box", &InvocationSite::new(vec![integer]), &ctx);
    assert_eq!(env.method(method).parameters, vec![integer]);

    // Widening `int` to `long` happens before boxing is tried.
    let method = find_method(env, calls, "widen", &InvocationSite::new(vec![int]), &ctx);
    assert_eq!(env.method(method).parameters, vec![long]);
    assert_eq!(applicability(env, method, &[int]), Some(Applicability::Strict));
}

#[test]
fn most_specific_method_wins() {
    let mut fixture = overloads();
    let calls = fixture.type_named("p.Calls");
    let ctx = AccessContext::in_package("p");
    let env = fixture.lookup.env_mut();
    let string = env.well_known(WellKnown::String);

    let method = find_method(env, calls, "pick", &InvocationSite::new(vec![string]), &ctx);
    assert_eq!(env.method(method).parameters, vec![string]);

    let object = env.object();
    let method = find_method(env, calls, "pick", &InvocationSite::new(vec![object]), &ctx);
    assert_eq!(env.method(method).parameters, vec![object]);

    let method = find_method(env, calls, "pair", &InvocationSite::new(vec![string, string]), &ctx);
    assert_eq!(env.method(method).problem_reason(), Some(ProblemReason::Ambiguous));
}

#[test]
fn private_methods_are_not_visible_from_other_types() {
    let mut fixture = overloads();
    let calls = fixture.type_named("p.Calls");
    let env = fixture.lookup.env_mut();

    let outside = AccessContext::in_package("p");
    let method = find_method(env, calls, "hidden", &InvocationSite::default(), &outside);
    assert_eq!(env.method(method).problem_reason(), Some(ProblemReason::NotVisible));

    let inside = AccessContext::in_type(env, calls);
    let method = find_method(env, calls, "hidden", &InvocationSite::default(), &inside);
    assert!(env.method(method).is_valid());
}

#[test]
fn varargs_is_the_last_phase() {
    let mut fixture = compile(Vec::new());
    let env = fixture.lookup.env_mut();
    let ctx = AccessContext::in_package("p");
    let string = env.well_known(WellKnown::String);
    let integer = env.well_known(WellKnown::Integer);

    let site = InvocationSite::new(vec![string, integer, integer]);
    let method = find_method(env, string, "format", &site, &ctx);
    assert!(env.method(method).is_varargs());
    assert_eq!(applicability(env, method, &site.arguments), Some(Applicability::Varargs));

    let missing = find_method(env, string, "format", &InvocationSite::default(), &ctx);
    assert_eq!(env.method(missing).problem_reason(), Some(ProblemReason::NotFound));
}

#[test]
fn generic_methods_are_inferred_from_arguments() {
    let mut fixture = compile(Vec::new());
    let env = fixture.lookup.env_mut();
    let ctx = AccessContext::in_package("p");
    let list = env.get_type("java.util.List").unwrap();
    let string = env.well_known(WellKnown::String);

    let method = find_method(env, list, "of", &InvocationSite::new(vec![string, string]), &ctx);
    let data = env.method(method);
    assert!(data.is_valid());
    let return_type = data.return_type;
    assert_eq!(env.kind(return_type), BindingKind::Parameterized);
    assert_eq!(readable_name(env, return_type), "java.util.List<java.lang.String>");

    let integer = env.well_known(WellKnown::Integer);
    let site = InvocationSite::new(vec![string]).with_type_arguments(vec![string, integer]);
    let method = find_method(env, list, "of", &site, &ctx);
    assert_eq!(
        env.method(method).problem_reason(),
        Some(ProblemReason::TypeParameterArityMismatch)
    );
}

#[test]
fn exact_methods_need_a_single_plain_candidate() {
    let mut fixture = compile(Vec::new());
    let env = fixture.lookup.env_mut();
    let ctx = AccessContext::in_package("p");
    let string = env.well_known(WellKnown::String);

    let length = find_exact_method(env, string, "length", &ctx).unwrap();
    assert_eq!(env.method(length).selector, "length");
    assert_eq!(find_exact_method(env, string, "valueOf", &ctx), None);
    assert_eq!(find_exact_method(env, string, "format", &ctx), None);
}

#[test]
fn constructors_resolve_like_methods() {
    let unit = CompilationUnit::new("p/Point.java", Some("p")).with_type(
        TypeDecl::record("Point")
            .with_modifiers(Modifiers::PUBLIC)
            .component(RecordComponentDecl::new("x", ty("int")))
            .component(RecordComponentDecl::new("y", ty("int"))),
    );
    let mut fixture = compile(vec![unit]);
    let point = fixture.type_named("p.Point");
    let ctx = AccessContext::in_package("q");
    let env = fixture.lookup.env_mut();
    let int = env.base(BaseType::Int);

    let constructor = get_constructor(env, point, &InvocationSite::new(vec![int, int]), &ctx);
    assert!(env.method(constructor).is_constructor());
    assert_eq!(env.method(constructor).parameters, vec![int, int]);

    let wrong = get_constructor(env, point, &InvocationSite::new(vec![int]), &ctx);
    let data = env.method(wrong);
    assert_eq!(data.problem_reason(), Some(ProblemReason::NotFound));
}

/// `p.Outer` with an instance method `run`, a member class and a static
/// nested class.
fn outer() -> Fixture {
    let unit = CompilationUnit::new("p/Outer.java", Some("p")).with_type(
        TypeDecl::class("Outer")
            .method(MethodDecl::new("run", ty("void")))
            .member(TypeDecl::class("Inner").method(MethodDecl::new("go", ty("void"))))
            .member(TypeDecl::class("Nested").with_modifiers(Modifiers::STATIC)),
    );
    compile(vec![unit])
}

#[test]
fn unqualified_calls_search_enclosing_classes() {
    let mut fixture = outer();
    let inner = fixture.type_named("p.Outer$Inner");

    let resolution = fixture
        .lookup
        .with_type_scope(inner, |env, scope| {
            get_implicit_method(env, scope, "run", &InvocationSite::default())
        })
        .unwrap();
    assert_eq!(resolution.depth, 1);
    let env = fixture.lookup.env();
    let method = env.method(resolution.method);
    assert!(method.is_valid());
    assert_eq!(readable_name(env, method.declaring_class), "p.Outer");
}

#[test]
fn the_innermost_class_declaring_the_name_is_the_only_one_searched() {
    let mut fixture = outer();
    let inner = fixture.type_named("p.Outer$Inner");
    let int = fixture.lookup.env().base(BaseType::Int);

    // `Inner.go()` takes no argument; the outer classes are not consulted.
    let resolution = fixture
        .lookup
        .with_type_scope(inner, |env, scope| {
            get_implicit_method(env, scope, "go", &InvocationSite::new(vec![int]))
        })
        .unwrap();
    let env = fixture.lookup.env();
    assert_eq!(resolution.depth, 0);
    assert_eq!(env.method(resolution.method).problem_reason(), Some(ProblemReason::NotFound));
}

#[test]
fn static_nested_classes_cannot_call_outer_instance_methods() {
    let mut fixture = outer();
    let nested = fixture.type_named("p.Outer$Nested");

    let resolution = fixture
        .lookup
        .with_type_scope(nested, |env, scope| {
            get_implicit_method(env, scope, "run", &InvocationSite::default())
        })
        .unwrap();
    let env = fixture.lookup.env();
    let method = env.method(resolution.method);
    assert_eq!(
        method.problem_reason(),
        Some(ProblemReason::NonStaticReferenceInStaticContext)
    );
}
