mod abort;
mod imports;
mod lifecycle;
mod methods;
mod synthetics;
mod variables;

use nova_bindings::{CompilerOptions, ProblemCollector, ProblemId, TypeId};
use nova_decl::{CompilationUnit, MinimalJdk, TypeProvider, TypeRef};
use nova_lookup::LookupEnvironment;

pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub(crate) fn ty(text: &str) -> TypeRef {
    TypeRef::parse(text).expect("valid type reference")
}

/// A completed lookup environment and everything it reported.
pub(crate) struct Fixture {
    pub(crate) lookup: LookupEnvironment,
    pub(crate) problems: ProblemCollector,
}

impl Fixture {
    pub(crate) fn type_named(&mut self, binary_name: &str) -> TypeId {
        self.lookup
            .get_type(binary_name)
            .unwrap_or_else(|| panic!("{binary_name} should be loaded"))
    }

    pub(crate) fn reported(&self, id: ProblemId) -> bool {
        self.problems.ids().contains(&id)
    }
}

pub(crate) fn compile_with(
    options: CompilerOptions,
    provider: impl TypeProvider + 'static,
    units: Vec<CompilationUnit>,
) -> Fixture {
    init_tracing();
    let problems = ProblemCollector::new();
    let mut lookup = LookupEnvironment::new(options, provider).expect("java.lang.Object");
    lookup.set_reporter(Box::new(problems.clone()));
    for unit in &units {
        lookup.add_compilation_unit(unit);
    }
    lookup.complete_types();
    Fixture { lookup, problems }
}

pub(crate) fn compile(units: Vec<CompilationUnit>) -> Fixture {
    compile_with(CompilerOptions::default(), MinimalJdk::new(), units)
}
