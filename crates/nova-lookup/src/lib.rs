//! Name lookup over Java bindings.
//!
//! Given the [`nova_bindings::Environment`], this crate answers what a name
//! means at a point in source: which type a type reference denotes, which
//! local or field a simple name refers to, and which method an invocation
//! selects. Names are resolved against a [`Scope`] chain (module, unit,
//! classes, methods, blocks). Failures come back as problem bindings
//! carrying a [`nova_bindings::ProblemReason`], never as Rust errors.
//!
//! Source types are completed lazily by the [`SourceCompleter`]; the
//! [`LookupEnvironment`] drives it over a set of compilation units.

mod import_map;
mod infer;
mod lookup_env;
mod method_lookup;
mod overload;
mod scope;
mod source;
mod synthetic;
mod type_lookup;
mod variable_lookup;
mod visibility;

pub use import_map::{ImportMap, StaticSingleImport, StaticStarImport, TypeSingleImport, TypeStarImport};
pub use lookup_env::LookupEnvironment;
pub use method_lookup::{
    create_problem_method, find_exact_method, find_method, get_constructor, get_implicit_method,
    InvocationSite, MethodResolution,
};
pub use overload::{applicability, Applicability};
pub use scope::{LocalVariable, MethodScope, Scope, ScopeKind, UnitContext};
pub use source::SourceCompleter;
pub use synthetic::{AccessTarget, SyntheticRegistry};
pub use type_lookup::{
    check_type_arguments, find_member_type, find_qualified_type, get_type, get_type_or_package,
    report_type_problem, resolve_type_ref, resolve_type_ref_with, ResolveOptions, TypeOrPackage,
};
pub use variable_lookup::{create_problem_field, find_field, get_variable, VariableBinding};
pub use visibility::{can_field_be_seen_by, can_method_be_seen_by, can_type_be_seen_by, AccessContext};
