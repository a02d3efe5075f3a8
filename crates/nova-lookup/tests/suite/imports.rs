use nova_bindings::{readable_name, BaseType, CompilerOptions, ProblemId, ProblemReason, TypeId};
use nova_decl::{CompilationUnit, ImportDecl, MinimalJdk, Modifiers, TypeDecl, TypeDefStub};
use nova_lookup::{get_implicit_method, get_type, get_variable, InvocationSite, VariableBinding};
use pretty_assertions::assert_eq;

use super::{compile, compile_with, Fixture};

fn jdk_with_awt_list() -> MinimalJdk {
    MinimalJdk::new().with(TypeDefStub::new("java.awt.List", 0x0001))
}

fn resolve_in(fixture: &mut Fixture, ty: &str, name: &str) -> TypeId {
    let ty = fixture.type_named(ty);
    fixture
        .lookup
        .with_type_scope(ty, |env, scope| get_type(env, scope, name))
        .expect("source type")
}

#[test]
fn on_demand_imports_of_one_name_are_ambiguous() {
    let unit = CompilationUnit::new("p/A.java", Some("p"))
        .import(ImportDecl::on_demand("java.util"))
        .import(ImportDecl::on_demand("java.awt"))
        .with_type(TypeDecl::class("A"));
    let mut fixture = compile_with(CompilerOptions::default(), jdk_with_awt_list(), vec![unit]);

    let list = resolve_in(&mut fixture, "p.A", "List");
    let reason = fixture.lookup.env().problem(list).map(|problem| problem.reason);
    assert_eq!(reason, Some(ProblemReason::Ambiguous));
}

#[test]
fn single_type_import_beats_on_demand() {
    let unit = CompilationUnit::new("p/A.java", Some("p"))
        .import(ImportDecl::on_demand("java.util"))
        .import(ImportDecl::single("java.awt.List"))
        .with_type(TypeDecl::class("A"));
    let mut fixture = compile_with(CompilerOptions::default(), jdk_with_awt_list(), vec![unit]);

    let list = resolve_in(&mut fixture, "p.A", "List");
    assert_eq!(readable_name(fixture.lookup.env(), list), "java.awt.List");
}

#[test]
fn same_package_beats_on_demand() {
    let own = CompilationUnit::new("p/List.java", Some("p")).with_type(TypeDecl::class("List"));
    let user = CompilationUnit::new("p/B.java", Some("p"))
        .import(ImportDecl::on_demand("java.util"))
        .with_type(TypeDecl::class("B"));
    let mut fixture = compile(vec![own, user]);

    let list = resolve_in(&mut fixture, "p.B", "List");
    let expected = fixture.type_named("p.List");
    assert_eq!(list, expected);
}

#[test]
fn unit_types_shadow_java_lang() {
    let unit = CompilationUnit::new("p/A.java", Some("p"))
        .with_type(TypeDecl::class("A"))
        .with_type(TypeDecl::class("String"));
    let mut fixture = compile(vec![unit]);

    let string = resolve_in(&mut fixture, "p.A", "String");
    assert_eq!(readable_name(fixture.lookup.env(), string), "p.String");

    let integer = resolve_in(&mut fixture, "p.A", "Integer");
    assert_eq!(readable_name(fixture.lookup.env(), integer), "java.lang.Integer");
}

#[test]
fn unresolved_imports_are_reported_against_their_unit() {
    let unit = CompilationUnit::new("p/A.java", Some("p"))
        .import(ImportDecl::single("java.util.Missing"))
        .import(ImportDecl::on_demand("java.util"))
        .with_type(TypeDecl::class("A"));
    let fixture = compile(vec![unit]);

    let problems = fixture.problems.problems();
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].id, ProblemId::ImportNotFound);
    assert_eq!(problems[0].arguments, vec!["java.util.Missing".to_string()]);
    assert_eq!(problems[0].unit.as_deref(), Some("p/A.java"));
}

#[test]
fn inherited_member_types_are_found() {
    let unit = CompilationUnit::new("p/A.java", Some("p"))
        .with_type(TypeDecl::class("Base").member(TypeDecl::class("Node")))
        .with_type(TypeDecl::class("Derived").extends(super::ty("Base")));
    let mut fixture = compile(vec![unit]);

    let node = resolve_in(&mut fixture, "p.Derived", "Node");
    let expected = fixture.type_named("p.Base$Node");
    assert_eq!(node, expected);
}

#[test]
fn class_type_variables_are_not_visible_from_static_members() {
    let unit = CompilationUnit::new("p/Box.java", Some("p")).with_type(
        TypeDecl::class("Box")
            .type_param(nova_decl::TypeParameterDecl::new("T"))
            .member(TypeDecl::class("Nested").with_modifiers(Modifiers::STATIC))
            .member(TypeDecl::class("Inner")),
    );
    let mut fixture = compile(vec![unit]);

    let from_nested = resolve_in(&mut fixture, "p.Box$Nested", "T");
    let reason = fixture.lookup.env().problem(from_nested).map(|problem| problem.reason);
    assert_eq!(reason, Some(ProblemReason::NonStaticReferenceInStaticContext));

    let from_inner = resolve_in(&mut fixture, "p.Box$Inner", "T");
    assert!(fixture.lookup.env().type_variable(from_inner).is_some());
}

#[test]
fn static_single_imports_supply_methods_and_fields() {
    let unit = CompilationUnit::new("p/A.java", Some("p"))
        .import(ImportDecl::static_single("java.lang.String", "valueOf"))
        .import(ImportDecl::static_single("java.lang.Integer", "MAX_VALUE"))
        .with_type(TypeDecl::class("A"));
    let mut fixture = compile(vec![unit]);
    let a = fixture.type_named("p.A");
    let int = fixture.lookup.env().base(BaseType::Int);

    let (resolution, max) = fixture
        .lookup
        .with_type_scope(a, |env, scope| {
            let resolution = get_implicit_method(env, scope, "valueOf", &InvocationSite::new(vec![int]));
            (resolution, get_variable(env, scope, "MAX_VALUE"))
        })
        .unwrap();

    let env = fixture.lookup.env();
    let method = env.method(resolution.method);
    assert!(method.is_valid());
    assert_eq!(resolution.depth, 0);
    assert_eq!(method.parameters, vec![int]);
    assert_eq!(readable_name(env, method.declaring_class), "java.lang.String");

    let VariableBinding::Field { field, depth } = max else {
        panic!("expected a field, got {max:?}");
    };
    assert_eq!(depth, 0);
    assert_eq!(env.field(field).name, "MAX_VALUE");
}
