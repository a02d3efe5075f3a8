//! Declaration-level inputs of the binding engine.
//!
//! This crate holds the read-only data the engine consumes:
//! - source declarations (`CompilationUnit`, `TypeDecl`, ...) as produced by a parser,
//! - textual type references (`TypeRef`) found in those declarations,
//! - binary type stubs served by a [`TypeProvider`] (class-file metadata),
//! - descriptor / generic signature parsing for those stubs.
//!
//! Nothing here resolves names; that is the job of `nova-lookup`.

mod decl;
mod jdk;
mod modifiers;
pub mod signature;
mod stub;
mod type_ref;

pub use decl::{
    CompilationUnit, DeclKind, FieldDecl, ImportDecl, MethodDecl, ModuleDecl, ParamDecl,
    RecordComponentDecl, TypeDecl, TypeParameterDecl,
};
pub use jdk::MinimalJdk;
pub use modifiers::Modifiers;
pub use stub::{
    ChainTypeProvider, FieldStub, MapTypeProvider, MethodStub, TypeDefStub, TypeProvider,
};
pub use type_ref::{PrimitiveKind, TypeRef, TypeRefParseError, TypeRefSegment, WildcardRef};

use serde::{Deserialize, Serialize};

/// Half-open byte range into the source text of a compilation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// Splits a dotted binary name (`java.util.Map$Entry`) into package and the
/// `$`-joined type part.
pub fn split_binary_name(binary_name: &str) -> (&str, &str) {
    match binary_name.rfind('.') {
        Some(idx) => (&binary_name[..idx], &binary_name[idx + 1..]),
        None => ("", binary_name),
    }
}
