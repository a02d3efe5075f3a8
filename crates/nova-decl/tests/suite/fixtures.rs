use nova_decl::{
    CompilationUnit, DeclKind, FieldDecl, ImportDecl, MethodDecl, Modifiers, RecordComponentDecl,
    TypeDecl, TypeParameterDecl, TypeRef,
};
use pretty_assertions::assert_eq;

fn ty(text: &str) -> TypeRef {
    TypeRef::parse(text).expect("fixture type reference should parse")
}

#[test]
fn builds_a_generic_unit() {
    let unit = CompilationUnit::new("p/Box.java", Some("p"))
        .import(ImportDecl::single("java.util.List"))
        .import(ImportDecl::on_demand("java.util"))
        .with_type(
            TypeDecl::class("Box")
                .with_modifiers(Modifiers::PUBLIC)
                .type_param(TypeParameterDecl::new("T").bound(ty("Comparable<T>")))
                .field(FieldDecl::new("value", ty("T")))
                .method(
                    MethodDecl::new("all", ty("List<? extends T>"))
                        .param("items", ty("T[]"))
                        .varargs(),
                ),
        );

    assert_eq!(unit.package_name(), "p");
    let decl = &unit.types[0];
    assert_eq!(decl.kind, DeclKind::Class);
    assert_eq!(decl.type_parameters[0].bounds[0].to_string(), "Comparable<T>");
    let method = &decl.methods[0];
    assert!(method.is_varargs);
    assert_eq!(method.params[0].ty.to_string(), "T[]");
}

#[test]
fn records_and_enums_keep_their_shape() {
    let record = TypeDecl::record("Point")
        .component(RecordComponentDecl::new("x", ty("int")))
        .component(RecordComponentDecl::new("y", ty("int")));
    assert_eq!(record.components.len(), 2);
    assert_eq!(record.components[0].ty, TypeRef::named("int"));

    let color = TypeDecl::enumeration("Color")
        .field(FieldDecl::enum_constant("RED"))
        .field(FieldDecl::enum_constant("GREEN"));
    assert!(color.fields.iter().all(|f| f.is_enum_constant));
    assert!(color.fields[0].modifiers.contains(Modifiers::STATIC | Modifiers::FINAL));
}
