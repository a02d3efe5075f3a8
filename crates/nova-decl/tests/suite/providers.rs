use nova_decl::signature::{parse_class_signature, JavaTypeSignature, TypeArgument};
use nova_decl::{ChainTypeProvider, MinimalJdk, TypeDefStub, TypeProvider};

#[test]
fn minimal_jdk_serves_generic_collections() {
    let jdk = MinimalJdk::new();
    let list = jdk.lookup_type("java.util.ArrayList").expect("ArrayList stub");
    let sig = parse_class_signature(list.signature.as_deref().expect("generic signature"))
        .expect("signature parses");
    assert_eq!(sig.type_parameters[0].name, "E");
    assert_eq!(sig.superclass.binary_name(), "java.util.AbstractList");
    assert_eq!(
        sig.superclass.segments[0].arguments,
        vec![TypeArgument::Exact(JavaTypeSignature::TypeVariable(
            "E".to_string()
        ))]
    );

    let entry = jdk.lookup_type("java.util.Map$Entry").expect("Map.Entry stub");
    assert_eq!(entry.enclosing_binary_name.as_deref(), Some("java.util.Map"));
    assert_ne!(entry.access_flags & 0x0008, 0, "member types are static");
}

#[test]
fn library_stubs_layer_over_the_jdk() {
    let jdk = MinimalJdk::new();
    let library = MinimalJdk::new().with(TypeDefStub::new("com.acme.Widget", 0x0001));
    let chain = ChainTypeProvider::new(vec![&library, &jdk]);
    assert!(chain.lookup_type("com.acme.Widget").is_some());
    assert!(chain.lookup_type("java.lang.Object").is_some());
    assert!(chain.package_exists("com.acme"));
    assert!(!chain.package_exists("org.nowhere"));
}
