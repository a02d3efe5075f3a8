//! A tiny, hand-written subset of the JDK.
//!
//! Enough of `java.lang`, `java.io` and `java.util` to exercise generics,
//! boxing, enums and records without a real class path.

use crate::{FieldStub, MapTypeProvider, MethodStub, TypeDefStub, TypeProvider};

const PUBLIC: u16 = 0x0001;
const PROTECTED: u16 = 0x0004;
const STATIC: u16 = 0x0008;
const FINAL: u16 = 0x0010;
const VARARGS: u16 = 0x0080;
const INTERFACE: u16 = 0x0200;
const ABSTRACT: u16 = 0x0400;

#[derive(Debug, Clone)]
pub struct MinimalJdk {
    types: MapTypeProvider,
}

impl Default for MinimalJdk {
    fn default() -> Self {
        Self::new()
    }
}

impl MinimalJdk {
    pub fn new() -> Self {
        let mut types = MapTypeProvider::new();
        for stub in jdk_stubs() {
            types.insert(stub);
        }
        Self { types }
    }

    /// Adds (or replaces) a stub, e.g. a test-only library type.
    pub fn insert(&mut self, stub: TypeDefStub) {
        self.types.insert(stub);
    }

    pub fn with(mut self, stub: TypeDefStub) -> Self {
        self.insert(stub);
        self
    }
}

impl TypeProvider for MinimalJdk {
    fn lookup_type(&self, binary_name: &str) -> Option<TypeDefStub> {
        self.types.lookup_type(binary_name)
    }

    fn package_exists(&self, package: &str) -> bool {
        self.types.package_exists(package)
    }
}

struct StubBuilder(TypeDefStub);

impl StubBuilder {
    fn class(name: &str, flags: u16) -> Self {
        StubBuilder(TypeDefStub::new(name, PUBLIC | flags))
    }

    fn interface(name: &str) -> Self {
        let mut stub = TypeDefStub::new(name, PUBLIC | INTERFACE | ABSTRACT);
        stub.super_binary_name = Some("java.lang.Object".to_string());
        StubBuilder(stub)
    }

    fn extends(mut self, name: &str) -> Self {
        self.0.super_binary_name = Some(name.to_string());
        self
    }

    fn implements(mut self, names: &[&str]) -> Self {
        self.0.interfaces = names.iter().map(|n| n.to_string()).collect();
        self
    }

    fn signature(mut self, sig: &str) -> Self {
        self.0.signature = Some(sig.to_string());
        self
    }

    fn enclosed_by(mut self, outer: &str) -> Self {
        self.0.enclosing_binary_name = Some(outer.to_string());
        self
    }

    fn method(mut self, name: &str, flags: u16, descriptor: &str, signature: Option<&str>) -> Self {
        self.0.methods.push(MethodStub {
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            signature: signature.map(str::to_string),
            access_flags: flags,
        });
        self
    }

    fn abstract_method(self, name: &str, descriptor: &str, signature: Option<&str>) -> Self {
        self.method(name, PUBLIC | ABSTRACT, descriptor, signature)
    }

    fn field(mut self, name: &str, flags: u16, descriptor: &str) -> Self {
        self.0.fields.push(FieldStub {
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            signature: None,
            access_flags: flags,
        });
        self
    }

    fn build(self) -> TypeDefStub {
        self.0
    }
}

fn boxed(name: &str, primitive: &str, number: bool) -> TypeDefStub {
    let internal = format!("java/lang/{name}");
    let binary = format!("java.lang.{name}");
    let superclass = if number {
        "java.lang.Number"
    } else {
        "java.lang.Object"
    };
    let signature = format!(
        "L{};Ljava/lang/Comparable<L{internal};>;Ljava/io/Serializable;",
        superclass.replace('.', "/")
    );
    StubBuilder::class(&binary, FINAL)
        .extends(superclass)
        .implements(&["java.lang.Comparable", "java.io.Serializable"])
        .signature(&signature)
        .method("<init>", PUBLIC, &format!("({primitive})V"), None)
        .method(
            "valueOf",
            PUBLIC | STATIC,
            &format!("({primitive})L{internal};"),
            None,
        )
        .method(
            "compareTo",
            PUBLIC,
            &format!("(L{internal};)I"),
            None,
        )
        .field("MAX_VALUE", PUBLIC | STATIC | FINAL, primitive)
        .build()
}

fn jdk_stubs() -> Vec<TypeDefStub> {
    let mut object = StubBuilder::class("java.lang.Object", 0)
        .method("<init>", PUBLIC, "()V", None)
        .method("equals", PUBLIC, "(Ljava/lang/Object;)Z", None)
        .method("hashCode", PUBLIC, "()I", None)
        .method("toString", PUBLIC, "()Ljava/lang/String;", None)
        .method(
            "getClass",
            PUBLIC | FINAL,
            "()Ljava/lang/Class;",
            Some("()Ljava/lang/Class<*>;"),
        )
        .method("clone", PROTECTED, "()Ljava/lang/Object;", None)
        .build();
    object.super_binary_name = None;

    let mut stubs = vec![
        object,
        StubBuilder::interface("java.io.Serializable").build(),
        StubBuilder::interface("java.lang.Cloneable").build(),
        StubBuilder::interface("java.util.RandomAccess").build(),
        StubBuilder::interface("java.lang.annotation.Annotation").build(),
        StubBuilder::interface("java.lang.Runnable")
            .abstract_method("run", "()V", None)
            .build(),
        StubBuilder::interface("java.lang.Comparable")
            .signature("<T:Ljava/lang/Object;>Ljava/lang/Object;")
            .abstract_method("compareTo", "(Ljava/lang/Object;)I", Some("(TT;)I"))
            .build(),
        StubBuilder::interface("java.lang.CharSequence")
            .abstract_method("length", "()I", None)
            .abstract_method("charAt", "(I)C", None)
            .build(),
        StubBuilder::class("java.lang.String", FINAL)
            .implements(&[
                "java.io.Serializable",
                "java.lang.Comparable",
                "java.lang.CharSequence",
            ])
            .signature(
                "Ljava/lang/Object;Ljava/io/Serializable;Ljava/lang/Comparable<Ljava/lang/String;>;Ljava/lang/CharSequence;",
            )
            .method("<init>", PUBLIC, "()V", None)
            .method("length", PUBLIC, "()I", None)
            .method("charAt", PUBLIC, "(I)C", None)
            .method("compareTo", PUBLIC, "(Ljava/lang/String;)I", None)
            .method(
                "valueOf",
                PUBLIC | STATIC,
                "(Ljava/lang/Object;)Ljava/lang/String;",
                None,
            )
            .method("valueOf", PUBLIC | STATIC, "(I)Ljava/lang/String;", None)
            .method(
                "format",
                PUBLIC | STATIC | VARARGS,
                "(Ljava/lang/String;[Ljava/lang/Object;)Ljava/lang/String;",
                None,
            )
            .build(),
        StubBuilder::class("java.lang.Number", ABSTRACT)
            .implements(&["java.io.Serializable"])
            .method("<init>", PUBLIC, "()V", None)
            .abstract_method("intValue", "()I", None)
            .build(),
        boxed("Integer", "I", true),
        boxed("Long", "J", true),
        boxed("Short", "S", true),
        boxed("Byte", "B", true),
        boxed("Double", "D", true),
        boxed("Float", "F", true),
        boxed("Character", "C", false),
        boxed("Boolean", "Z", false),
        StubBuilder::class("java.lang.Void", FINAL).build(),
        StubBuilder::class("java.lang.Class", FINAL)
            .implements(&["java.io.Serializable"])
            .signature("<T:Ljava/lang/Object;>Ljava/lang/Object;Ljava/io/Serializable;")
            .method("getName", PUBLIC, "()Ljava/lang/String;", None)
            .build(),
        StubBuilder::class("java.lang.Enum", ABSTRACT)
            .implements(&["java.lang.Comparable", "java.io.Serializable"])
            .signature(
                "<E:Ljava/lang/Enum<TE;>;>Ljava/lang/Object;Ljava/lang/Comparable<TE;>;Ljava/io/Serializable;",
            )
            .method("<init>", PROTECTED, "(Ljava/lang/String;I)V", None)
            .method("name", PUBLIC | FINAL, "()Ljava/lang/String;", None)
            .method("ordinal", PUBLIC | FINAL, "()I", None)
            .method("compareTo", PUBLIC | FINAL, "(Ljava/lang/Enum;)I", Some("(TE;)I"))
            .method(
                "valueOf",
                PUBLIC | STATIC,
                "(Ljava/lang/Class;Ljava/lang/String;)Ljava/lang/Enum;",
                Some("<T:Ljava/lang/Enum<TT;>;>(Ljava/lang/Class<TT;>;Ljava/lang/String;)TT;"),
            )
            .build(),
        StubBuilder::class("java.lang.Record", ABSTRACT)
            .method("<init>", PROTECTED, "()V", None)
            .abstract_method("equals", "(Ljava/lang/Object;)Z", None)
            .abstract_method("hashCode", "()I", None)
            .abstract_method("toString", "()Ljava/lang/String;", None)
            .build(),
        StubBuilder::class("java.lang.Throwable", 0)
            .implements(&["java.io.Serializable"])
            .method("<init>", PUBLIC, "()V", None)
            .method("getMessage", PUBLIC, "()Ljava/lang/String;", None)
            .build(),
        StubBuilder::class("java.lang.Exception", 0)
            .extends("java.lang.Throwable")
            .method("<init>", PUBLIC, "()V", None)
            .build(),
        StubBuilder::class("java.lang.RuntimeException", 0)
            .extends("java.lang.Exception")
            .method("<init>", PUBLIC, "()V", None)
            .build(),
        StubBuilder::class("java.lang.IllegalArgumentException", 0)
            .extends("java.lang.RuntimeException")
            .method("<init>", PUBLIC, "()V", None)
            .build(),
        StubBuilder::class("java.io.IOException", 0)
            .extends("java.lang.Exception")
            .method("<init>", PUBLIC, "()V", None)
            .build(),
        StubBuilder::interface("java.lang.Iterable")
            .signature("<T:Ljava/lang/Object;>Ljava/lang/Object;")
            .abstract_method(
                "iterator",
                "()Ljava/util/Iterator;",
                Some("()Ljava/util/Iterator<TT;>;"),
            )
            .build(),
        StubBuilder::interface("java.util.Iterator")
            .signature("<E:Ljava/lang/Object;>Ljava/lang/Object;")
            .abstract_method("hasNext", "()Z", None)
            .abstract_method("next", "()Ljava/lang/Object;", Some("()TE;"))
            .build(),
        StubBuilder::interface("java.util.Collection")
            .implements(&["java.lang.Iterable"])
            .signature("<E:Ljava/lang/Object;>Ljava/lang/Object;Ljava/lang/Iterable<TE;>;")
            .abstract_method("size", "()I", None)
            .abstract_method("isEmpty", "()Z", None)
            .abstract_method("contains", "(Ljava/lang/Object;)Z", None)
            .abstract_method("add", "(Ljava/lang/Object;)Z", Some("(TE;)Z"))
            .build(),
        StubBuilder::interface("java.util.List")
            .implements(&["java.util.Collection"])
            .signature("<E:Ljava/lang/Object;>Ljava/lang/Object;Ljava/util/Collection<TE;>;")
            .abstract_method("get", "(I)Ljava/lang/Object;", Some("(I)TE;"))
            .abstract_method(
                "set",
                "(ILjava/lang/Object;)Ljava/lang/Object;",
                Some("(ITE;)TE;"),
            )
            .method(
                "of",
                PUBLIC | STATIC | VARARGS,
                "([Ljava/lang/Object;)Ljava/util/List;",
                Some("<E:Ljava/lang/Object;>([TE;)Ljava/util/List<TE;>;"),
            )
            .build(),
        StubBuilder::class("java.util.AbstractCollection", ABSTRACT)
            .implements(&["java.util.Collection"])
            .signature("<E:Ljava/lang/Object;>Ljava/lang/Object;Ljava/util/Collection<TE;>;")
            .method("<init>", PROTECTED, "()V", None)
            .build(),
        StubBuilder::class("java.util.AbstractList", ABSTRACT)
            .extends("java.util.AbstractCollection")
            .implements(&["java.util.List"])
            .signature(
                "<E:Ljava/lang/Object;>Ljava/util/AbstractCollection<TE;>;Ljava/util/List<TE;>;",
            )
            .method("<init>", PROTECTED, "()V", None)
            .build(),
        StubBuilder::class("java.util.ArrayList", 0)
            .extends("java.util.AbstractList")
            .implements(&[
                "java.util.List",
                "java.util.RandomAccess",
                "java.lang.Cloneable",
                "java.io.Serializable",
            ])
            .signature(
                "<E:Ljava/lang/Object;>Ljava/util/AbstractList<TE;>;Ljava/util/List<TE;>;Ljava/util/RandomAccess;Ljava/lang/Cloneable;Ljava/io/Serializable;",
            )
            .method("<init>", PUBLIC, "()V", None)
            .method("get", PUBLIC, "(I)Ljava/lang/Object;", Some("(I)TE;"))
            .method("add", PUBLIC, "(Ljava/lang/Object;)Z", Some("(TE;)Z"))
            .method("size", PUBLIC, "()I", None)
            .build(),
        StubBuilder::interface("java.util.Map")
            .signature("<K:Ljava/lang/Object;V:Ljava/lang/Object;>Ljava/lang/Object;")
            .abstract_method("get", "(Ljava/lang/Object;)Ljava/lang/Object;", Some("(Ljava/lang/Object;)TV;"))
            .abstract_method(
                "put",
                "(Ljava/lang/Object;Ljava/lang/Object;)Ljava/lang/Object;",
                Some("(TK;TV;)TV;"),
            )
            .build(),
        StubBuilder::interface("java.util.Map$Entry")
            .enclosed_by("java.util.Map")
            .signature("<K:Ljava/lang/Object;V:Ljava/lang/Object;>Ljava/lang/Object;")
            .abstract_method("getKey", "()Ljava/lang/Object;", Some("()TK;"))
            .abstract_method("getValue", "()Ljava/lang/Object;", Some("()TV;"))
            .build(),
        StubBuilder::class("java.util.HashMap", 0)
            .implements(&["java.util.Map", "java.lang.Cloneable", "java.io.Serializable"])
            .signature(
                "<K:Ljava/lang/Object;V:Ljava/lang/Object;>Ljava/lang/Object;Ljava/util/Map<TK;TV;>;Ljava/lang/Cloneable;Ljava/io/Serializable;",
            )
            .method("<init>", PUBLIC, "()V", None)
            .build(),
        StubBuilder::interface("java.util.function.Function")
            .signature("<T:Ljava/lang/Object;R:Ljava/lang/Object;>Ljava/lang/Object;")
            .abstract_method(
                "apply",
                "(Ljava/lang/Object;)Ljava/lang/Object;",
                Some("(TT;)TR;"),
            )
            .build(),
    ];

    // Member types are static in the class file; mirror the inner-class flag.
    for stub in &mut stubs {
        if stub.enclosing_binary_name.is_some() {
            stub.access_flags |= STATIC;
        }
    }
    stubs
}
