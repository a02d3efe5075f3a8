use nova_bindings::CompilerOptions;
use nova_decl::{CompilationUnit, FieldDecl, MapTypeProvider, MinimalJdk, TypeDecl, TypeDefStub};
use nova_lookup::LookupEnvironment;
use pretty_assertions::assert_eq;

use super::init_tracing;

fn object_only() -> MapTypeProvider {
    let mut object = TypeDefStub::new("java.lang.Object", 0x0001);
    object.super_binary_name = None;
    MapTypeProvider::new().with(object)
}

#[test]
fn missing_object_aborts_before_anything_is_built() {
    init_tracing();
    let abort = LookupEnvironment::new(CompilerOptions::default(), MapTypeProvider::new()).unwrap_err();
    assert_eq!(abort.missing_type.as_deref(), Some("java.lang.Object"));
}

#[test]
fn missing_well_known_types_abort_the_compilation() {
    init_tracing();
    let unit = CompilationUnit::new("p/Color.java", Some("p"))
        .with_type(TypeDecl::enumeration("Color").field(FieldDecl::enum_constant("RED")));

    let result = LookupEnvironment::compile(CompilerOptions::default(), object_only(), &[unit], |_| ());
    let abort = result.unwrap_err();
    assert_eq!(abort.missing_type.as_deref(), Some("java.lang.Enum"));
}

#[test]
fn compile_hands_out_a_completed_environment() {
    init_tracing();
    let unit = CompilationUnit::new("p/A.java", Some("p")).with_type(TypeDecl::class("A"));

    let methods = LookupEnvironment::compile(CompilerOptions::default(), MinimalJdk::new(), &[unit], |lookup| {
        let a = lookup.get_type("p.A").unwrap();
        lookup.env_mut().methods(a).len()
    })
    .unwrap();
    assert_eq!(methods, 1);
}
