//! Optional null-annotation overlay.
//!
//! An annotated type is an interned wrapper around an unannotated type. Only
//! substitution looks at the overlay, and only when
//! [`crate::CompilerOptions::null_type_annotations`] is set. Erasure,
//! equivalence and subtyping see through it.

use serde::{Deserialize, Serialize};

use crate::binding::{AnnotatedData, TypeKind};
use crate::env::Environment;
use crate::ids::TypeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NullAnnotation {
    NonNull,
    Nullable,
}

impl NullAnnotation {
    pub fn as_str(self) -> &'static str {
        match self {
            NullAnnotation::NonNull => "@NonNull",
            NullAnnotation::Nullable => "@Nullable",
        }
    }
}

/// Returns `ty` annotated with `annotation`, replacing any annotation it
/// already carries. Primitive types are returned unchanged.
pub fn annotate(env: &mut Environment, ty: TypeId, annotation: NullAnnotation) -> TypeId {
    let base = unannotated(env, ty);
    if matches!(env.ty(base).kind, TypeKind::Base(_)) {
        return base;
    }
    env.intern_annotated(AnnotatedData {
        unannotated: base,
        annotation,
    })
}

pub fn null_annotation(env: &Environment, ty: TypeId) -> Option<NullAnnotation> {
    match &env.ty(ty).kind {
        TypeKind::Annotated(data) => Some(data.annotation),
        _ => None,
    }
}

pub fn unannotated(env: &Environment, ty: TypeId) -> TypeId {
    match &env.ty(ty).kind {
        TypeKind::Annotated(data) => data.unannotated,
        _ => ty,
    }
}

/// Result of substituting the annotated type variable `var_annotation T`
/// with `replacement`.
///
/// With null type annotations active, the variable's annotation carries over
/// to a replacement that has none of its own. Otherwise the overlay is
/// dropped.
pub(crate) fn transfer(
    env: &mut Environment,
    annotation: NullAnnotation,
    replacement: TypeId,
) -> TypeId {
    if !env.options().null_type_annotations {
        return replacement;
    }
    if null_annotation(env, replacement).is_some() {
        return replacement;
    }
    annotate(env, replacement, annotation)
}
