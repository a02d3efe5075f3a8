mod completer;
mod identity;
mod lattice;
mod raw;
mod signatures;

use nova_bindings::{CompilerOptions, Environment};
use nova_decl::{FieldStub, MethodStub, MinimalJdk, TypeDefStub};

pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub(crate) fn jdk_env() -> Environment {
    init_tracing();
    Environment::new(CompilerOptions::default(), MinimalJdk::new()).expect("java.lang.Object")
}

/// `p.Outer<T>` with a non-static member `p.Outer.Inner` holding a `T`.
pub(crate) fn outer_inner_env() -> Environment {
    init_tracing();
    let mut outer = TypeDefStub::new("p.Outer", 0x0001);
    outer.signature = Some("<T:Ljava/lang/Object;>Ljava/lang/Object;".to_string());
    outer.methods.push(MethodStub {
        name: "inner".to_string(),
        descriptor: "()Lp/Outer$Inner;".to_string(),
        signature: Some("()Lp/Outer<TT;>.Inner;".to_string()),
        access_flags: 0x0001,
    });
    outer.methods.push(MethodStub {
        name: "first".to_string(),
        descriptor: "(Ljava/util/List;)Ljava/lang/Object;".to_string(),
        signature: Some("(Ljava/util/List<TT;>;)TT;".to_string()),
        access_flags: 0x0001,
    });

    let mut inner = TypeDefStub::new("p.Outer$Inner", 0x0001);
    inner.enclosing_binary_name = Some("p.Outer".to_string());
    inner.fields.push(FieldStub {
        name: "value".to_string(),
        descriptor: "Ljava/lang/Object;".to_string(),
        signature: Some("TT;".to_string()),
        access_flags: 0x0001,
    });

    let jdk = MinimalJdk::new().with(outer).with(inner);
    Environment::new(CompilerOptions::default(), jdk).expect("java.lang.Object")
}
