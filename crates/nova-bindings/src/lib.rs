//! Java type bindings: the environment that owns every type, method and
//! field binding, plus the operations of the type system over them
//! (substitution, erasure, capture, subtyping, lub/glb).
//!
//! Bindings are addressed by opaque ids ([`TypeId`], [`MethodId`],
//! [`FieldId`]) into arenas owned by the [`Environment`]. Structurally equal
//! types are interned, so id equality is type identity.
//!
//! Derived data (supertypes, members, type variable bounds) is built lazily
//! in stages; see [`Lazy`]. Source types are completed through a
//! [`TypeCompleter`] installed by the name-lookup layer, binary types are
//! read from [`nova_decl::TypeProvider`] stubs.

mod binary;
mod binding;
mod capture;
mod env;
mod flags;
mod hierarchy;
mod ids;
mod key;
mod lattice;
mod lazy;
mod members;
pub mod nullness;
mod options;
mod problem;
mod subst;

pub use binding::{
    AnnotatedData, BaseType, BindingKind, CaptureBounds, CaptureData, ClassData, ClassSort,
    Declarer, FieldData, FieldKind, Hierarchy, InferenceVariableData, MethodData, MethodKind,
    ParameterizedData, ProblemTypeData, SourceKey, SyntheticKind, TypeData, TypeKind, TypeOrigin,
    TypeVariableBounds, TypeVariableData, WildcardData, WildcardKind, CONSTRUCTOR_NAME,
};
pub use capture::{capture, uncapture};
pub use env::{Environment, TypeCompleter, WellKnown};
pub use flags::TagBits;
pub use hierarchy::{
    boxed, convert_to_raw, direct_supertypes, erasure, find_super_type_originating_from,
    intersection_parts, is_boxing_compatible_with, is_compatible_with, is_equivalent_to,
    is_reifiable, is_subtype_of, superclass, superinterfaces, type_argument_contains, unboxed,
};
pub use ids::{FieldId, MethodId, TypeId};
pub use key::{
    descriptor, field_key, generic_signature, method_descriptor, method_key,
    method_readable_name, method_signature, readable_name, short_readable_name, type_key,
};
pub use lattice::{greater_lower_bound, lower_upper_bound};
pub use lazy::Lazy;
pub use members::{
    create_most_specific_exceptions_method, create_parameterized_generic_method, is_raw_method,
    original_field, original_method,
};
pub use options::{CompilerOptions, JavaVersion, OptionsError};
pub use problem::{
    AbortCompilation, Problem, ProblemCollector, ProblemId, ProblemReason, ProblemReporter,
    Severity,
};
pub use subst::{
    substitute, substitute_all, ChainedSubstitution, MapSubstitution, Substitution,
    TypeSubstitution,
};
