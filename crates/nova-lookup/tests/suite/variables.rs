use nova_bindings::{readable_name, BaseType, CompilerOptions, JavaVersion, ProblemId, ProblemReason, TypeId};
use nova_decl::{CompilationUnit, FieldDecl, MinimalJdk, Modifiers, TypeDecl};
use nova_bindings::FieldKind;
use nova_lookup::{find_field, get_variable, AccessContext, LocalVariable, MethodScope, Scope, VariableBinding};
use pretty_assertions::assert_eq;

use super::{compile, compile_with, ty, Fixture};

/// `p.Outer` with an instance field `count`, a member class and a static
/// nested class.
fn outer() -> Fixture {
    let unit = CompilationUnit::new("p/Outer.java", Some("p")).with_type(
        TypeDecl::class("Outer")
            .field(FieldDecl::new("count", ty("int")))
            .field(FieldDecl::new("LIMIT", ty("int")).with_modifiers(Modifiers::STATIC | Modifiers::FINAL))
            .member(TypeDecl::class("Inner"))
            .member(TypeDecl::class("Nested").with_modifiers(Modifiers::STATIC)),
    );
    compile(vec![unit])
}

fn lookup_in(fixture: &mut Fixture, ty: &str, name: &str) -> VariableBinding {
    let ty: TypeId = fixture.type_named(ty);
    fixture
        .lookup
        .with_type_scope(ty, |env, scope| get_variable(env, scope, name))
        .expect("source type")
}

#[test]
fn locals_shadow_fields() {
    let mut fixture = outer();
    let outer = fixture.type_named("p.Outer");
    let long = fixture.lookup.env().base(BaseType::Long);

    let binding = fixture
        .lookup
        .with_type_scope(outer, |env, scope| {
            let block = Scope::block(scope).with_local(LocalVariable::new("count", long));
            get_variable(env, &block, "count")
        })
        .unwrap();

    let VariableBinding::Local { local, depth } = binding else {
        panic!("expected a local, got {binding:?}");
    };
    assert_eq!(depth, 0);
    assert_eq!(local.ty, long);
}

#[test]
fn fields_of_enclosing_classes_count_their_depth() {
    let mut fixture = outer();

    let binding = lookup_in(&mut fixture, "p.Outer", "count");
    assert!(matches!(binding, VariableBinding::Field { depth: 0, .. }));

    let binding = lookup_in(&mut fixture, "p.Outer$Inner", "count");
    let VariableBinding::Field { field, depth } = binding else {
        panic!("expected a field, got {binding:?}");
    };
    assert_eq!(depth, 1);
    let env = fixture.lookup.env();
    let declaring = env.field(field).declaring_class.unwrap();
    assert_eq!(readable_name(env, declaring), "p.Outer");
}

#[test]
fn instance_fields_are_rejected_in_static_contexts() {
    let mut fixture = outer();

    let from_nested = lookup_in(&mut fixture, "p.Outer$Nested", "count");
    assert_eq!(from_nested.reason(), Some(ProblemReason::NonStaticReferenceInStaticContext));

    let limit = lookup_in(&mut fixture, "p.Outer$Nested", "LIMIT");
    assert!(limit.is_valid());

    let outer = fixture.type_named("p.Outer");
    let from_static_method = fixture
        .lookup
        .with_type_scope(outer, |env, scope| {
            let method = Scope::method(
                scope,
                MethodScope {
                    is_static: true,
                    ..MethodScope::default()
                },
            );
            get_variable(env, &method, "count")
        })
        .unwrap();
    assert_eq!(
        from_static_method.reason(),
        Some(ProblemReason::NonStaticReferenceInStaticContext)
    );
}

#[test]
fn instance_fields_are_rejected_in_explicit_constructor_calls() {
    let mut fixture = outer();
    let outer = fixture.type_named("p.Outer");

    let binding = fixture
        .lookup
        .with_type_scope(outer, |env, scope| {
            let prologue = Scope::constructor_call(scope);
            get_variable(env, &prologue, "count")
        })
        .unwrap();
    assert_eq!(
        binding.reason(),
        Some(ProblemReason::NonStaticReferenceInConstructorInvocation)
    );
}

#[test]
fn private_fields_of_other_types_are_not_visible() {
    let unit = CompilationUnit::new("p/Base.java", Some("p"))
        .with_type(TypeDecl::class("Base").field(FieldDecl::new("secret", ty("int")).with_modifiers(Modifiers::PRIVATE)))
        .with_type(TypeDecl::class("Derived").extends(ty("Base")));
    let mut fixture = compile(vec![unit]);

    let binding = lookup_in(&mut fixture, "p.Derived", "secret");
    let VariableBinding::Problem {
        reason, closest_match, ..
    } = binding
    else {
        panic!("expected a problem, got {binding:?}");
    };
    assert_eq!(reason, ProblemReason::NotVisible);
    let closest = closest_match.unwrap();
    assert_eq!(fixture.lookup.env().field(closest).name, "secret");

    let missing = lookup_in(&mut fixture, "p.Derived", "nothing");
    assert_eq!(missing.reason(), Some(ProblemReason::NotFound));
}

/// `Outer.x` and `Base.x`, with `Outer.Inner extends Base`.
fn shadowing_unit() -> CompilationUnit {
    CompilationUnit::new("p/Outer.java", Some("p"))
        .with_type(TypeDecl::class("Base").field(FieldDecl::new("x", ty("int"))))
        .with_type(
            TypeDecl::class("Outer")
                .field(FieldDecl::new("x", ty("int")))
                .member(TypeDecl::class("Inner").extends(ty("Base"))),
        )
}

#[test]
fn inherited_fields_shadow_enclosing_ones() {
    let mut fixture = compile(vec![shadowing_unit()]);

    let binding = lookup_in(&mut fixture, "p.Outer$Inner", "x");
    let VariableBinding::Field { field, depth } = binding else {
        panic!("expected a field, got {binding:?}");
    };
    assert_eq!(depth, 0);
    let env = fixture.lookup.env();
    assert_eq!(readable_name(env, env.field(field).declaring_class.unwrap()), "p.Base");
    assert!(!fixture.reported(ProblemId::InheritedFieldHidesEnclosingName));
}

#[test]
fn inherited_fields_hiding_enclosing_ones_are_reported_before_1_4() {
    let options = CompilerOptions::default().with_source_level(JavaVersion::JAVA_1_3);
    let mut fixture = compile_with(options, MinimalJdk::new(), vec![shadowing_unit()]);

    let binding = lookup_in(&mut fixture, "p.Outer$Inner", "x");
    assert_eq!(binding.reason(), Some(ProblemReason::InheritedNameHidesEnclosingName));
    assert!(fixture.reported(ProblemId::InheritedFieldHidesEnclosingName));
}

#[test]
fn fields_declared_in_an_enclosing_class_beat_its_inherited_ones() {
    let unit = CompilationUnit::new("p/Outer.java", Some("p"))
        .with_type(TypeDecl::class("Grand").field(FieldDecl::new("x", ty("String"))))
        .with_type(
            TypeDecl::class("Outer")
                .extends(ty("Grand"))
                .field(FieldDecl::new("x", ty("int")))
                .member(TypeDecl::class("Inner")),
        );
    let mut fixture = compile(vec![unit]);

    let binding = lookup_in(&mut fixture, "p.Outer$Inner", "x");
    let VariableBinding::Field { field, depth } = binding else {
        panic!("expected a field, got {binding:?}");
    };
    assert_eq!(depth, 1);
    let env = fixture.lookup.env();
    assert_eq!(readable_name(env, env.field(field).declaring_class.unwrap()), "p.Outer");
}

#[test]
fn class_fields_hide_interface_fields() {
    let unit = CompilationUnit::new("p/C.java", Some("p"))
        .with_type(TypeDecl::interface("I").field(FieldDecl::new("x", ty("int"))))
        .with_type(TypeDecl::class("C").implements(ty("I")).field(FieldDecl::new("x", ty("int"))))
        .with_type(TypeDecl::class("D").extends(ty("C")));
    let mut fixture = compile(vec![unit]);

    for receiver in ["p.C", "p.D"] {
        let binding = lookup_in(&mut fixture, receiver, "x");
        let VariableBinding::Field { field, .. } = binding else {
            panic!("expected a field from {receiver}, got {binding:?}");
        };
        let env = fixture.lookup.env();
        assert_eq!(readable_name(env, env.field(field).declaring_class.unwrap()), "p.C");
    }
}

#[test]
fn fields_inherited_from_two_interfaces_are_ambiguous() {
    let unit = CompilationUnit::new("p/C.java", Some("p"))
        .with_type(TypeDecl::interface("I").field(FieldDecl::new("x", ty("int"))))
        .with_type(TypeDecl::interface("J").field(FieldDecl::new("x", ty("int"))))
        .with_type(TypeDecl::interface("K").extends(ty("I")))
        .with_type(TypeDecl::class("C").implements(ty("I")).implements(ty("J")))
        .with_type(TypeDecl::class("E").implements(ty("I")).implements(ty("K")));
    let mut fixture = compile(vec![unit]);

    let binding = lookup_in(&mut fixture, "p.C", "x");
    assert_eq!(binding.reason(), Some(ProblemReason::Ambiguous));

    // The same declaration reached twice is not ambiguous.
    let binding = lookup_in(&mut fixture, "p.E", "x");
    assert!(binding.is_valid());
}

#[test]
fn an_invisible_field_of_the_receiver_is_not_skipped() {
    let unit = CompilationUnit::new("p/Base.java", Some("p"))
        .with_type(
            TypeDecl::class("Base")
                .with_modifiers(Modifiers::PUBLIC)
                .field(FieldDecl::new("x", ty("int")).with_modifiers(Modifiers::PUBLIC)),
        )
        .with_type(
            TypeDecl::class("Derived")
                .with_modifiers(Modifiers::PUBLIC)
                .extends(ty("Base"))
                .field(FieldDecl::new("x", ty("String")).with_modifiers(Modifiers::PRIVATE)),
        );
    let mut fixture = compile(vec![unit]);
    let derived = fixture.type_named("p.Derived");
    let env = fixture.lookup.env_mut();

    let field = find_field(env, derived, "x", &AccessContext::in_package("q")).unwrap();
    let FieldKind::Problem {
        reason, closest_match, ..
    } = env.field(field).kind.clone()
    else {
        panic!("expected a problem field");
    };
    assert_eq!(reason, ProblemReason::NotVisible);
    let closest = closest_match.unwrap();
    assert_eq!(readable_name(env, env.field(closest).declaring_class.unwrap()), "p.Derived");
}
