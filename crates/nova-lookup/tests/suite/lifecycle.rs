use nova_bindings::{
    readable_name, BaseType, CompilerOptions, FieldKind, JavaVersion, MethodKind, ProblemId, SyntheticKind, TagBits,
    WellKnown,
};
use nova_decl::{
    CompilationUnit, FieldDecl, MethodDecl, MinimalJdk, Modifiers, RecordComponentDecl, TypeDecl, TypeParameterDecl,
};
use pretty_assertions::assert_eq;

use super::{compile, compile_with, ty};

fn unit(types: Vec<TypeDecl>) -> CompilationUnit {
    types
        .into_iter()
        .fold(CompilationUnit::new("p/Types.java", Some("p")), CompilationUnit::with_type)
}

#[test]
fn classes_get_a_default_constructor() {
    let mut fixture = compile(vec![unit(vec![TypeDecl::class("Plain").with_modifiers(Modifiers::PUBLIC)])]);
    let plain = fixture.type_named("p.Plain");
    let env = fixture.lookup.env_mut();

    let constructors = env.get_methods(plain, "<init>");
    assert_eq!(constructors.len(), 1);
    let data = env.method(constructors[0]);
    assert!(data.parameters.is_empty());
    assert!(data.modifiers.contains(Modifiers::PUBLIC));
    assert_eq!(data.kind, MethodKind::Synthetic(SyntheticKind::DefaultConstructor));
    let superclass = env.hierarchy(plain).superclass;
    assert_eq!(superclass, Some(env.object()));
}

#[test]
fn enums_get_values_and_value_of() {
    let color = TypeDecl::enumeration("Color")
        .field(FieldDecl::enum_constant("RED"))
        .field(FieldDecl::enum_constant("GREEN"));
    let mut fixture = compile(vec![unit(vec![color])]);
    let color = fixture.type_named("p.Color");
    let env = fixture.lookup.env_mut();

    assert!(env.class(color).unwrap().modifiers.contains(Modifiers::FINAL));
    let superclass = env.hierarchy(color).superclass.unwrap();
    assert_eq!(readable_name(env, superclass), "java.lang.Enum<p.Color>");

    let values = env.get_methods(color, "values");
    assert_eq!(values.len(), 1);
    let array = env.create_array(color, 1);
    assert_eq!(env.method(values[0]).return_type, array);
    assert!(env.method(values[0]).is_static());

    let value_of = env.get_methods(color, "valueOf");
    let string = env.well_known(WellKnown::String);
    assert_eq!(env.method(value_of[0]).parameters, vec![string]);

    let red = env.get_field(color, "RED").unwrap();
    let red = env.field(red);
    assert_eq!(red.kind, FieldKind::EnumConstant);
    assert_eq!(red.ty, color);
    assert!(red.is_static());

    let constructors = env.get_methods(color, "<init>");
    assert!(env.method(constructors[0]).is_private());
}

#[test]
fn enums_cannot_declare_values() {
    let color = TypeDecl::enumeration("Color").method(
        MethodDecl::new("values", ty("Color[]"))
            .with_modifiers(Modifiers::PUBLIC | Modifiers::STATIC),
    );
    let mut fixture = compile(vec![unit(vec![color])]);
    assert!(fixture.reported(ProblemId::CannotDeclareEnumSpecialMethod));

    let color = fixture.type_named("p.Color");
    let env = fixture.lookup.env_mut();
    let values = env.get_methods(color, "values");
    assert_eq!(values.len(), 1);
    assert_eq!(env.method(values[0]).kind, MethodKind::Synthetic(SyntheticKind::EnumValues));
}

#[test]
fn records_get_canonical_members() {
    let point = TypeDecl::record("Point")
        .with_modifiers(Modifiers::PUBLIC)
        .component(RecordComponentDecl::new("x", ty("int")))
        .component(RecordComponentDecl::new("label", ty("String")));
    let mut fixture = compile(vec![unit(vec![point])]);
    assert!(!fixture.problems.has_errors());
    let point = fixture.type_named("p.Point");
    let env = fixture.lookup.env_mut();
    let int = env.base(BaseType::Int);
    let string = env.well_known(WellKnown::String);

    let components: Vec<String> = env
        .components(point)
        .into_iter()
        .map(|component| env.field(component).name.clone())
        .collect();
    assert_eq!(components, vec!["x".to_string(), "label".to_string()]);

    let x = env.get_field(point, "x").unwrap();
    assert_eq!(env.field(x).kind, FieldKind::RecordComponent);
    assert!(env.field(x).modifiers.contains(Modifiers::PRIVATE | Modifiers::FINAL));

    let constructor = env.get_methods(point, "<init>")[0];
    assert_eq!(env.method(constructor).parameters, vec![int, string]);
    assert_eq!(env.method(constructor).parameter_names, vec!["x".to_string(), "label".to_string()]);

    let accessor = env.get_methods(point, "label")[0];
    assert_eq!(env.method(accessor).return_type, string);
    assert_eq!(env.method(accessor).kind, MethodKind::Synthetic(SyntheticKind::RecordAccessor));

    for selector in ["toString", "hashCode", "equals"] {
        assert_eq!(env.get_methods(point, selector).len(), 1, "{selector}");
    }
    let superclass = env.hierarchy(point).superclass.unwrap();
    assert_eq!(readable_name(env, superclass), "java.lang.Record");
}

#[test]
fn record_accessors_must_be_public() {
    let point = TypeDecl::record("Point")
        .component(RecordComponentDecl::new("x", ty("int")))
        .method(MethodDecl::new("x", ty("int")));
    let fixture = compile(vec![unit(vec![point])]);
    assert_eq!(fixture.problems.ids(), vec![ProblemId::InvalidRecordAccessor]);
}

#[test]
fn duplicate_methods_are_reported_and_dropped() {
    let dup = TypeDecl::class("Dup")
        .method(MethodDecl::new("f", ty("void")).param("s", ty("String")))
        .method(MethodDecl::new("f", ty("void")).param("t", ty("String")))
        .method(MethodDecl::new("g", ty("void")).param("l", ty("java.util.List<String>")))
        .method(MethodDecl::new("g", ty("void")).param("l", ty("java.util.List<Integer>")));
    let mut fixture = compile(vec![unit(vec![dup])]);
    assert_eq!(
        fixture.problems.ids(),
        vec![ProblemId::DuplicateMethod, ProblemId::DuplicateMethodErasure]
    );

    let dup = fixture.type_named("p.Dup");
    let env = fixture.lookup.env_mut();
    assert_eq!(env.get_methods(dup, "f").len(), 1);
    assert_eq!(env.get_methods(dup, "g").len(), 1);
    assert!(env.tag_bits(dup).contains(TagBits::HAS_DUPLICATES));
}

#[test]
fn java_6_tolerates_erasure_clashes_with_distinct_returns() {
    let dup = TypeDecl::class("Dup")
        .method(MethodDecl::new("g", ty("String")).param("l", ty("java.util.List<String>")))
        .method(MethodDecl::new("g", ty("Integer")).param("l", ty("java.util.List<Integer>")));
    let options = CompilerOptions::default().with_source_level(JavaVersion::JAVA_6);
    let mut fixture = compile_with(options, MinimalJdk::new(), vec![unit(vec![dup])]);
    assert_eq!(fixture.problems.ids(), Vec::new());

    let dup = fixture.type_named("p.Dup");
    assert_eq!(fixture.lookup.env_mut().get_methods(dup, "g").len(), 2);
}

#[test]
fn duplicate_fields_keep_the_first() {
    let dup = TypeDecl::class("Dup")
        .field(FieldDecl::new("a", ty("int")))
        .field(FieldDecl::new("a", ty("String")));
    let mut fixture = compile(vec![unit(vec![dup])]);
    assert_eq!(fixture.problems.ids(), vec![ProblemId::DuplicateField]);

    let dup = fixture.type_named("p.Dup");
    let env = fixture.lookup.env_mut();
    let int = env.base(BaseType::Int);
    let a = env.get_field(dup, "a").unwrap();
    assert_eq!(env.field(a).ty, int);
}

#[test]
fn members_with_unresolved_types_are_excised() {
    let broken = TypeDecl::class("Broken")
        .field(FieldDecl::new("missing", ty("Missing")))
        .field(FieldDecl::new("kept", ty("int")));
    let mut fixture = compile(vec![unit(vec![broken])]);
    assert!(fixture.reported(ProblemId::UnresolvedType));
    assert!(fixture.reported(ProblemId::ExcisedMember));

    let broken = fixture.type_named("p.Broken");
    let env = fixture.lookup.env_mut();
    let names: Vec<String> = env
        .fields(broken)
        .into_iter()
        .map(|field| env.field(field).name.clone())
        .collect();
    assert_eq!(names, vec!["kept".to_string()]);
}

#[test]
fn hierarchy_cycles_are_broken_at_object() {
    let a = TypeDecl::class("A").extends(ty("B"));
    let b = TypeDecl::class("B").extends(ty("A"));
    let mut fixture = compile(vec![unit(vec![a, b])]);
    let cycles = fixture
        .problems
        .ids()
        .into_iter()
        .filter(|&id| id == ProblemId::HierarchyCircularity)
        .count();
    assert_eq!(cycles, 1);

    let a = fixture.type_named("p.A");
    let b = fixture.type_named("p.B");
    let env = fixture.lookup.env_mut();
    let object = env.object();
    let supers = [env.hierarchy(a).superclass, env.hierarchy(b).superclass];
    assert!(supers.contains(&Some(object)));
    assert!(env.tag_bits(a).contains(TagBits::HIERARCHY_CHECKED));
}

#[test]
fn superclasses_must_be_extensible_classes() {
    let types = vec![
        TypeDecl::class("Task").extends(ty("Runnable")),
        TypeDecl::class("Last").with_modifiers(Modifiers::FINAL),
        TypeDecl::class("After").extends(ty("Last")),
        TypeDecl::class("Both").implements(ty("Last")),
    ];
    let mut fixture = compile(vec![unit(types)]);
    assert_eq!(
        fixture.problems.ids(),
        vec![
            ProblemId::SuperclassMustBeAClass,
            ProblemId::CannotExtendFinalClass,
            ProblemId::SuperInterfaceMustBeAnInterface,
        ]
    );

    let task = fixture.type_named("p.Task");
    let env = fixture.lookup.env_mut();
    let object = env.object();
    assert_eq!(env.hierarchy(task).superclass, Some(object));
    assert!(env.tag_bits(task).contains(TagBits::HIERARCHY_HAS_PROBLEMS));
}

#[test]
fn supertype_arguments_are_checked_against_bounds() {
    let types = vec![
        TypeDecl::class("Box").type_param(TypeParameterDecl::new("T").bound(ty("Number"))),
        TypeDecl::class("Good").extends(ty("Box<Integer>")),
        TypeDecl::class("Bad").extends(ty("Box<String>")),
    ];
    let fixture = compile(vec![unit(types)]);
    let problems = fixture.problems.problems();
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].id, ProblemId::TypeArgumentMismatch);
    assert_eq!(
        problems[0].arguments,
        vec!["java.lang.String".to_string(), "p.Box<java.lang.String>".to_string()]
    );
}

#[test]
fn sealed_types_admit_only_permitted_subtypes() {
    let types = vec![
        TypeDecl::interface("Shape")
            .with_modifiers(Modifiers::SEALED)
            .permits(ty("Circle")),
        TypeDecl::class("Circle").with_modifiers(Modifiers::FINAL).implements(ty("Shape")),
        TypeDecl::class("Square").with_modifiers(Modifiers::FINAL).implements(ty("Shape")),
    ];
    let fixture = compile(vec![unit(types)]);
    let problems = fixture.problems.problems();
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].id, ProblemId::SealedTypeNotPermitted);
    assert_eq!(problems[0].arguments, vec!["p.Square".to_string(), "p.Shape".to_string()]);
}

#[test]
fn sealed_types_without_permits_admit_their_unit() {
    let types = vec![
        TypeDecl::class("Shape").with_modifiers(Modifiers::SEALED | Modifiers::ABSTRACT),
        TypeDecl::class("Circle").with_modifiers(Modifiers::FINAL).extends(ty("Shape")),
    ];
    let fixture = compile(vec![unit(types)]);
    assert_eq!(fixture.problems.ids(), Vec::new());
}

#[test]
fn duplicate_types_are_reported() {
    let first = CompilationUnit::new("p/A.java", Some("p")).with_type(TypeDecl::class("A"));
    let second = CompilationUnit::new("p/A2.java", Some("p")).with_type(TypeDecl::class("A"));
    let fixture = compile(vec![first, second]);
    assert_eq!(fixture.problems.ids(), vec![ProblemId::DuplicateType]);
    assert_eq!(fixture.lookup.units()[1].types.len(), 0);
}
