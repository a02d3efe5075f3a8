//! Failure reporting.
//!
//! Lookups never fail with a Rust error: they answer a *problem binding*
//! carrying a [`ProblemReason`]. Diagnostics worth showing to a user go to
//! the environment's [`ProblemReporter`]. The only unwinding path is
//! [`AbortCompilation`].

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use nova_decl::Span;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a lookup produced a problem binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProblemReason {
    NotFound,
    NotVisible,
    NotAccessible,
    Ambiguous,
    InheritedNameHidesEnclosingName,
    NonStaticReferenceInStaticContext,
    NonStaticReferenceInConstructorInvocation,
    ReceiverTypeNotVisible,
    VarargsElementTypeNotVisible,
    ParameterizedMethodTypeMismatch,
    TypeParameterArityMismatch,
    NotAWellFormedParameterizedType,
    MissingTypeInSignature,
    HierarchyHasProblems,
}

impl ProblemReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ProblemReason::NotFound => "not-found",
            ProblemReason::NotVisible => "not-visible",
            ProblemReason::NotAccessible => "not-accessible",
            ProblemReason::Ambiguous => "ambiguous",
            ProblemReason::InheritedNameHidesEnclosingName => "inherited-name-hides-enclosing-name",
            ProblemReason::NonStaticReferenceInStaticContext => {
                "non-static-reference-in-static-context"
            }
            ProblemReason::NonStaticReferenceInConstructorInvocation => {
                "non-static-reference-in-constructor-invocation"
            }
            ProblemReason::ReceiverTypeNotVisible => "receiver-type-not-visible",
            ProblemReason::VarargsElementTypeNotVisible => "varargs-element-type-not-visible",
            ProblemReason::ParameterizedMethodTypeMismatch => "parameterized-method-type-mismatch",
            ProblemReason::TypeParameterArityMismatch => "type-parameter-arity-mismatch",
            ProblemReason::NotAWellFormedParameterizedType => {
                "not-a-well-formed-parameterized-type"
            }
            ProblemReason::MissingTypeInSignature => "missing-type-in-signature",
            ProblemReason::HierarchyHasProblems => "hierarchy-has-problems",
        }
    }
}

impl fmt::Display for ProblemReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
}

/// Diagnostics raised while building bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProblemId {
    /// A type reference did not resolve; argument 0 is the name.
    UnresolvedType,
    AmbiguousType,
    NotVisibleType,
    IncorrectArityForParameterizedType,
    TypeArgumentMismatch,
    HierarchyCircularity,
    SuperclassMustBeAClass,
    SuperInterfaceMustBeAnInterface,
    CannotExtendFinalClass,
    SealedTypeNotPermitted,
    InterfaceInheritedWithDifferentArguments,
    DuplicateType,
    DuplicateField,
    DuplicateMethod,
    DuplicateMethodErasure,
    CannotDeclareEnumSpecialMethod,
    InvalidRecordAccessor,
    BoundMustBeAnInterface,
    RawTypeReference,
    ExcisedMember,
    InheritedFieldHidesEnclosingName,
    AmbiguousStaticImport,
    ImportNotFound,
    NonStaticTypeVariableReference,
    ParameterizedMethodTypeMismatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    pub id: ProblemId,
    pub severity: Severity,
    /// Compilation unit name, when known.
    pub unit: Option<String>,
    pub span: Span,
    pub arguments: Vec<String>,
}

impl Problem {
    pub fn error(id: ProblemId, span: Span, arguments: Vec<String>) -> Self {
        Self {
            id,
            severity: Severity::Error,
            unit: None,
            span,
            arguments,
        }
    }

    pub fn warning(id: ProblemId, span: Span, arguments: Vec<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(id, span, arguments)
        }
    }

    pub fn in_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }
}

/// Side-effect sink for diagnostics.
pub trait ProblemReporter {
    fn report(&mut self, problem: Problem);
}

/// Reporter that keeps every problem in order. Clones share storage, so a
/// test can keep one handle and give another to the environment.
#[derive(Debug, Clone, Default)]
pub struct ProblemCollector {
    problems: Rc<RefCell<Vec<Problem>>>,
}

impl ProblemCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn problems(&self) -> Vec<Problem> {
        self.problems.borrow().clone()
    }

    pub fn ids(&self) -> Vec<ProblemId> {
        self.problems.borrow().iter().map(|p| p.id).collect()
    }

    pub fn has_errors(&self) -> bool {
        self.problems
            .borrow()
            .iter()
            .any(|p| p.severity == Severity::Error)
    }

    pub fn clear(&self) {
        self.problems.borrow_mut().clear();
    }
}

impl ProblemReporter for ProblemCollector {
    fn report(&mut self, problem: Problem) {
        tracing::debug!(
            target: "nova.bindings",
            id = ?problem.id,
            severity = ?problem.severity,
            arguments = ?problem.arguments,
            "problem reported"
        );
        self.problems.borrow_mut().push(problem);
    }
}

/// Unrecoverable failure (e.g. `java.lang.Object` is not on the class path).
///
/// Raised with [`AbortCompilation::raise`] from any depth and caught only by
/// the driver through [`AbortCompilation::catch`]. Nothing in between may
/// catch it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("compilation aborted: {message}")]
pub struct AbortCompilation {
    pub message: String,
    /// Binary name of the missing type that caused the abort, if any.
    pub missing_type: Option<String>,
}

impl AbortCompilation {
    pub fn missing_type(binary_name: &str) -> Self {
        Self {
            message: format!("required type {binary_name} cannot be found"),
            missing_type: Some(binary_name.to_string()),
        }
    }

    /// Unwinds to the nearest [`AbortCompilation::catch`].
    pub fn raise(self) -> ! {
        tracing::warn!(target: "nova.bindings", message = %self.message, "aborting compilation");
        panic::resume_unwind(Box::new(self))
    }

    /// Runs `f`, turning an abort raised inside it into `Err`. Other panics
    /// keep unwinding.
    pub fn catch<F, T>(f: F) -> Result<T, AbortCompilation>
    where
        F: FnOnce() -> T,
    {
        // Bindings hold no invariants that an abort could break half-way: the
        // environment is discarded after an abort.
        match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(value) => Ok(value),
            Err(payload) => match payload.downcast::<AbortCompilation>() {
                Ok(abort) => Err(*abort),
                Err(other) => resume(other),
            },
        }
    }
}

fn resume(payload: Box<dyn Any + Send>) -> ! {
    panic::resume_unwind(payload)
}
