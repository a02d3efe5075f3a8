use nova_bindings::{erasure, BaseType, FieldKind, MethodKind, SyntheticKind};
use nova_decl::{CompilationUnit, FieldDecl, MethodDecl, Modifiers, TypeDecl};
use nova_lookup::{AccessTarget, LocalVariable};
use pretty_assertions::assert_eq;

use super::{compile, ty, Fixture};

fn nested() -> Fixture {
    let unit = CompilationUnit::new("p/Outer.java", Some("p"))
        .with_type(
            TypeDecl::class("Outer")
                .field(FieldDecl::new("secret", ty("int")).with_modifiers(Modifiers::PRIVATE))
                .field(FieldDecl::new("shared", ty("String")).with_modifiers(Modifiers::PRIVATE | Modifiers::STATIC))
                .method(MethodDecl::new("hidden", ty("String")).param("n", ty("int")).with_modifiers(Modifiers::PRIVATE))
                .method(MethodDecl::constructor().param("n", ty("int")).with_modifiers(Modifiers::PRIVATE))
                .member(
                    TypeDecl::class("Inner")
                        .field(FieldDecl::new("val$x", ty("int")))
                        .member(TypeDecl::class("Deep").field(FieldDecl::new("this$1", ty("Object")))),
                ),
        )
        .with_type(TypeDecl::enumeration("Color").field(FieldDecl::enum_constant("RED")));
    compile(vec![unit])
}

fn field_name(fixture: &Fixture, field: nova_bindings::FieldId) -> String {
    fixture.lookup.env().field(field).name.clone()
}

fn method_name(fixture: &Fixture, method: nova_bindings::MethodId) -> String {
    fixture.lookup.env().method(method).selector.clone()
}

#[test]
fn captured_locals_get_val_fields() {
    let mut fixture = nested();
    let outer = fixture.type_named("p.Outer");
    let inner = fixture.type_named("p.Outer$Inner");
    let int = fixture.lookup.env().base(BaseType::Int);
    let long = fixture.lookup.env().base(BaseType::Long);
    let x = LocalVariable::new("x", int);
    let other_x = LocalVariable::new("x", long);

    let (env, synthetics) = fixture.lookup.synthetics();
    let in_outer = synthetics.outer_local_field(env, outer, &x);
    let again = synthetics.outer_local_field(env, outer, &x);
    let other = synthetics.outer_local_field(env, outer, &other_x);
    let clashing = synthetics.outer_local_field(env, inner, &x);

    assert_eq!(in_outer, again);
    assert_eq!(field_name(&fixture, in_outer), "val$x");
    assert_eq!(field_name(&fixture, other), "val$x$1");
    // `Inner` declares its own `val$x`.
    assert_eq!(field_name(&fixture, clashing), "val$x$1");

    let env = fixture.lookup.env();
    let data = env.field(in_outer);
    assert_eq!(data.kind, FieldKind::Synthetic(SyntheticKind::OuterLocalField));
    assert!(data.modifiers.contains(Modifiers::PRIVATE | Modifiers::FINAL | Modifiers::SYNTHETIC));
}

#[test]
fn enclosing_instances_are_named_after_their_depth() {
    let mut fixture = nested();
    let outer = fixture.type_named("p.Outer");
    let inner = fixture.type_named("p.Outer$Inner");
    let deep = fixture.type_named("p.Outer$Inner$Deep");

    let (env, synthetics) = fixture.lookup.synthetics();
    let outer_of_inner = synthetics.enclosing_instance_field(env, inner, outer);
    let inner_of_deep = synthetics.enclosing_instance_field(env, deep, inner);

    assert_eq!(field_name(&fixture, outer_of_inner), "this$0");
    // `Deep` declares its own `this$1`.
    assert_eq!(field_name(&fixture, inner_of_deep), "this$1$");
    assert_eq!(fixture.lookup.env().field(inner_of_deep).ty, inner);
}

#[test]
fn private_access_goes_through_numbered_accessors() {
    let mut fixture = nested();
    let outer = fixture.type_named("p.Outer");
    let env = fixture.lookup.env_mut();
    let secret = env.get_field(outer, "secret").unwrap();
    let shared = env.get_field(outer, "shared").unwrap();
    let hidden = env.get_methods(outer, "hidden")[0];
    let constructor = env
        .get_methods(outer, "<init>")
        .into_iter()
        .find(|&m| !env.method(m).parameters.is_empty())
        .unwrap();
    let int = env.base(BaseType::Int);
    let receiver = erasure(env, outer);

    let (env, synthetics) = fixture.lookup.synthetics();
    let read = synthetics.access_method(env, AccessTarget::FieldRead(secret)).unwrap();
    let write = synthetics.access_method(env, AccessTarget::FieldWrite(secret)).unwrap();
    let read_again = synthetics.access_method(env, AccessTarget::FieldRead(secret)).unwrap();
    let static_read = synthetics.access_method(env, AccessTarget::FieldRead(shared)).unwrap();
    let call = synthetics.access_method(env, AccessTarget::Method(hidden)).unwrap();
    let factory = synthetics.access_method(env, AccessTarget::Method(constructor)).unwrap();
    assert_eq!(read, read_again);
    assert_eq!(synthetics.methods(outer).len(), 5);

    let names: Vec<String> = [read, write, static_read, call, factory]
        .into_iter()
        .map(|method| method_name(&fixture, method))
        .collect();
    assert_eq!(names, ["access$0", "access$1", "access$2", "access$3", "access$4"]);

    let env = fixture.lookup.env();
    assert_eq!(env.method(read).parameters, vec![receiver]);
    assert_eq!(env.method(read).return_type, int);
    assert_eq!(env.method(write).parameters, vec![receiver, int]);
    assert!(env.method(static_read).parameters.is_empty());
    assert_eq!(env.method(call).parameters, vec![receiver, int]);
    assert_eq!(env.method(factory).parameters, vec![int]);
    assert_eq!(env.method(factory).return_type, receiver);
    assert!(env.method(factory).is_static());
}

#[test]
fn synthetic_members_stay_out_of_declared_members() {
    let mut fixture = nested();
    let outer = fixture.type_named("p.Outer");
    let int = fixture.lookup.env().base(BaseType::Int);
    let declared = fixture.lookup.env_mut().fields(outer);

    let (env, synthetics) = fixture.lookup.synthetics();
    let field = synthetics.outer_local_field(env, outer, &LocalVariable::new("y", int));
    assert_eq!(synthetics.fields(outer), [field]);

    let fields = fixture.lookup.env_mut().fields(outer);
    assert_eq!(fields, declared);
    assert_eq!(fixture.lookup.env_mut().get_field(outer, "val$y"), None);
}

#[test]
fn switch_tables_are_named_after_the_enum() {
    let mut fixture = nested();
    let outer = fixture.type_named("p.Outer");
    let color = fixture.type_named("p.Color");

    let (env, synthetics) = fixture.lookup.synthetics();
    let (field, method) = synthetics.switch_table(env, outer, color);
    let again = synthetics.switch_table(env, outer, color);
    assert_eq!(again, (field, method));

    assert_eq!(field_name(&fixture, field), "$SWITCH_TABLE$p$Color");
    assert_eq!(method_name(&fixture, method), "$SWITCH_TABLE$p$Color");
    let env = fixture.lookup.env_mut();
    let int = env.base(BaseType::Int);
    let table = env.create_array(int, 1);
    assert_eq!(env.field(field).ty, table);
    assert_eq!(env.method(method).return_type, table);
    assert!(env.method(method).is_static());
}

#[test]
fn lambdas_are_numbered_per_type() {
    let mut fixture = nested();
    let outer = fixture.type_named("p.Outer");
    let void = fixture.lookup.env().base(BaseType::Void);
    let int = fixture.lookup.env().base(BaseType::Int);

    let (env, synthetics) = fixture.lookup.synthetics();
    let first = synthetics.lambda_method(env, outer, "run", Vec::new(), void, false);
    let second = synthetics.lambda_method(env, outer, "run", vec![int], int, true);
    let in_constructor = synthetics.lambda_method(env, outer, "<init>", Vec::new(), void, false);

    assert_eq!(method_name(&fixture, first), "lambda$run$0");
    assert_eq!(method_name(&fixture, second), "lambda$run$1");
    assert_eq!(method_name(&fixture, in_constructor), "lambda$new$2");
    let env = fixture.lookup.env();
    assert!(env.method(second).is_static());
    assert!(env.method(first).is_private());
    assert_eq!(env.method(first).kind, MethodKind::Synthetic(SyntheticKind::LambdaMethod));
}

#[test]
fn bridges_forward_erased_signatures() {
    let unit = CompilationUnit::new("p/Name.java", Some("p"))
        .with_type(
            TypeDecl::class("Name").implements(ty("Comparable<Name>")).method(
                MethodDecl::new("compareTo", ty("int"))
                    .param("other", ty("Name"))
                    .with_modifiers(Modifiers::PUBLIC),
            ),
        )
        .with_type(
            TypeDecl::class("Job")
                .implements(ty("Runnable"))
                .method(MethodDecl::new("run", ty("void")).with_modifiers(Modifiers::PUBLIC)),
        );
    let mut fixture = compile(vec![unit]);
    let name = fixture.type_named("p.Name");
    let job = fixture.type_named("p.Job");
    let comparable = fixture.type_named("java.lang.Comparable");
    let runnable = fixture.type_named("java.lang.Runnable");
    let env = fixture.lookup.env_mut();
    let compare_to = env.get_methods(comparable, "compareTo")[0];
    let implementation = env.get_methods(name, "compareTo")[0];
    let run = env.get_methods(runnable, "run")[0];
    let job_run = env.get_methods(job, "run")[0];
    let object = env.object();
    let int = env.base(BaseType::Int);

    let (env, synthetics) = fixture.lookup.synthetics();
    let bridge = synthetics.bridge_method(env, name, compare_to, implementation).unwrap();
    assert_eq!(synthetics.bridge_method(env, name, compare_to, implementation), Some(bridge));
    assert_eq!(synthetics.bridge_method(env, job, run, job_run), None);

    let env = fixture.lookup.env();
    let data = env.method(bridge);
    assert_eq!(data.selector, "compareTo");
    assert_eq!(data.parameters, vec![object]);
    assert_eq!(data.return_type, int);
    assert!(data.is_bridge());
    assert!(data.modifiers.contains(Modifiers::PUBLIC | Modifiers::SYNTHETIC));
}
