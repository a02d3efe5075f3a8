//! Method and constructor lookup.
//!
//! Every entry point answers a method binding: the selected method, or a
//! problem method ([`MethodKind::Problem`]) carrying the reason and the
//! closest candidate for diagnostics.

use std::collections::VecDeque;

use nova_bindings::{
    erasure, original_method, superclass, superinterfaces, BindingKind, Environment, MethodData,
    MethodId, MethodKind, Problem, ProblemId, ProblemReason, TagBits, TypeId, CONSTRUCTOR_NAME,
};
use nova_decl::{Modifiers, Span};
use rustc_hash::FxHashSet;

use crate::overload::{resolve_overload, Overload};
use crate::scope::{Scope, ScopeKind, UnitContext};
use crate::type_lookup::find_qualified_type;
use crate::visibility::{can_method_be_seen_by, can_type_be_seen_by, AccessContext};

/// What an invocation supplies to overload resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationSite {
    pub arguments: Vec<TypeId>,
    /// Explicit method type arguments (`this.<String>m()`).
    pub type_arguments: Vec<TypeId>,
    pub span: Span,
    /// Type the invocation's value is assigned to, when known.
    pub expected_type: Option<TypeId>,
}

impl InvocationSite {
    pub fn new(arguments: Vec<TypeId>) -> Self {
        Self {
            arguments,
            ..Self::default()
        }
    }

    pub fn with_type_arguments(mut self, type_arguments: Vec<TypeId>) -> Self {
        self.type_arguments = type_arguments;
        self
    }

    pub fn expecting(mut self, expected: TypeId) -> Self {
        self.expected_type = Some(expected);
        self
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

/// An unqualified invocation resolved in a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodResolution {
    pub method: MethodId,
    /// Class boundaries between the invocation and the class the method
    /// was found in; non-zero means an enclosing instance is used.
    pub depth: u32,
}

/// A problem method named `selector` standing in for a failed lookup.
pub fn create_problem_method(
    env: &mut Environment,
    selector: &str,
    declaring_class: TypeId,
    arguments: &[TypeId],
    reason: ProblemReason,
    closest_match: Option<MethodId>,
) -> MethodId {
    let (declaring_class, return_type, modifiers) = match closest_match {
        Some(closest) => {
            let data = env.method(closest);
            (data.declaring_class, data.return_type, data.modifiers)
        }
        None => (
            declaring_class,
            env.create_problem_type(selector, ProblemReason::NotFound, None),
            Modifiers::empty(),
        ),
    };
    tracing::debug!(target: "nova.lookup", selector = %selector, reason = %reason, "method lookup failed");
    env.create_method(MethodData {
        selector: selector.to_string(),
        modifiers,
        declaring_class,
        type_variables: Vec::new(),
        parameters: arguments.to_vec(),
        parameter_names: Vec::new(),
        return_type,
        thrown: Vec::new(),
        kind: MethodKind::Problem {
            reason,
            closest_match,
        },
        tag_bits: TagBits::empty(),
        span: Span::default(),
    })
}

/// `overrider` has the same signature as `method`, or the signature of
/// its erasure.
fn is_subsignature(env: &mut Environment, overrider: MethodId, method: MethodId) -> bool {
    let first = env.method(overrider).parameters.clone();
    let second = env.method(method).parameters.clone();
    if first.len() != second.len() {
        return false;
    }
    if first == second {
        return true;
    }
    first.iter().zip(&second).all(|(&a, &b)| {
        let a = erasure(env, a);
        let b = erasure(env, b);
        a == b
    })
}

/// Adds `methods` to `found` unless an already collected method overrides
/// them. Inherited private methods go to `private`.
fn add_candidates(
    env: &mut Environment,
    found: &mut Vec<MethodId>,
    private: &mut Vec<MethodId>,
    methods: Vec<MethodId>,
    inherited: bool,
) {
    let existing = found.len();
    for method in methods {
        if inherited && env.method(method).is_private() {
            private.push(method);
            continue;
        }
        let overridden = found[..existing]
            .iter()
            .any(|&collected| is_subsignature(env, collected, method));
        if !overridden {
            found.push(method);
        }
    }
}

fn is_interface_like(env: &Environment, ty: TypeId) -> bool {
    env.is_interface(ty)
        || env.declaration(ty).is_some_and(|class| class.modifiers.contains(Modifiers::ABSTRACT))
        || env.kind(ty).is_type_variable_like()
        || env.kind(ty) == BindingKind::Intersection
}

/// Methods named `selector` visible through `receiver`'s hierarchy: the
/// superclass chain, then superinterfaces when the receiver may leave
/// interface methods unimplemented (or when `with_defaults`).
fn collect_candidates(env: &mut Environment, receiver: TypeId, selector: &str, with_defaults: bool) -> Candidates {
    let mut found = Vec::new();
    let mut private = Vec::new();
    let mut interfaces: VecDeque<TypeId> = VecDeque::new();
    let mut seen = FxHashSet::default();

    let start = if env.kind(receiver) == BindingKind::Array {
        env.object()
    } else {
        receiver
    };
    let search_interfaces = with_defaults || is_interface_like(env, start);
    let mut current = Some(start);
    let mut inherited = false;
    while let Some(ty) = current {
        if let Some(generic) = env.generic_of(ty) {
            if !seen.insert(generic) {
                break;
            }
        }
        if env.kind(ty).is_declared_type() {
            let methods = env.get_methods(ty, selector);
            add_candidates(env, &mut found, &mut private, methods, inherited);
        }
        interfaces.extend(superinterfaces(env, ty));
        current = superclass(env, ty);
        inherited = true;
    }

    if search_interfaces {
        while let Some(ty) = interfaces.pop_front() {
            let Some(generic) = env.generic_of(ty) else {
                continue;
            };
            if !seen.insert(generic) {
                continue;
            }
            let methods: Vec<MethodId> = env
                .get_methods(ty, selector)
                .into_iter()
                .filter(|&m| !env.method(m).is_static())
                .filter(|&m| !with_defaults || env.method(m).is_default())
                .collect();
            add_candidates(env, &mut found, &mut private, methods, true);
            interfaces.extend(superinterfaces(env, ty));
        }
    }

    // Interfaces have Object's public methods as members (JLS 9.2).
    if env.is_interface(start) {
        let object = env.object();
        let methods: Vec<MethodId> = env
            .get_methods(object, selector)
            .into_iter()
            .filter(|&m| env.method(m).modifiers.contains(Modifiers::PUBLIC))
            .collect();
        add_candidates(env, &mut found, &mut private, methods, true);
    }
    Candidates { found, private }
}

struct Candidates {
    found: Vec<MethodId>,
    private: Vec<MethodId>,
}

fn lookup(env: &mut Environment, receiver: TypeId, selector: &str, site: &InvocationSite, ctx: &AccessContext) -> Overload {
    let candidates = collect_candidates(env, receiver, selector, false);
    let result = if candidates.found.is_empty() {
        Overload::Problem {
            reason: ProblemReason::NotFound,
            closest_match: candidates.private.first().copied(),
        }
    } else {
        resolve_overload(env, &candidates.found, receiver, site, ctx)
    };

    // Defaults of a concrete class's interfaces are not collected above.
    match result {
        Overload::Problem {
            reason: ProblemReason::NotFound,
            closest_match,
        } if !is_interface_like(env, receiver) => {
            let defaults = collect_candidates(env, receiver, selector, true);
            let extra: Vec<MethodId> = defaults
                .found
                .into_iter()
                .filter(|&m| env.method(m).is_default())
                .collect();
            if extra.is_empty() {
                return Overload::Problem {
                    reason: ProblemReason::NotFound,
                    closest_match,
                };
            }
            tracing::trace!(target: "nova.lookup", selector = %selector, "falling back to default methods");
            match resolve_overload(env, &extra, receiver, site, ctx) {
                Overload::Problem {
                    reason: ProblemReason::NotFound,
                    closest_match: None,
                } => Overload::Problem {
                    reason: ProblemReason::NotFound,
                    closest_match,
                },
                other => other,
            }
        }
        other => other,
    }
}

fn into_method(
    env: &mut Environment,
    overload: Overload,
    selector: &str,
    receiver: TypeId,
    site: &InvocationSite,
) -> MethodId {
    match overload {
        Overload::Found(method) => method,
        Overload::Problem {
            reason,
            closest_match,
        } => create_problem_method(env, selector, receiver, &site.arguments, reason, closest_match),
    }
}

/// Resolves `receiver.selector(arguments)`.
pub fn find_method(
    env: &mut Environment,
    receiver: TypeId,
    selector: &str,
    site: &InvocationSite,
    ctx: &AccessContext,
) -> MethodId {
    if matches!(env.kind(receiver), BindingKind::Base | BindingKind::Problem) {
        return create_problem_method(env, selector, receiver, &site.arguments, ProblemReason::NotFound, None);
    }
    if env.kind(receiver).is_declared_type() && !can_type_be_seen_by(env, receiver, ctx) {
        return create_problem_method(
            env,
            selector,
            receiver,
            &site.arguments,
            ProblemReason::ReceiverTypeNotVisible,
            None,
        );
    }
    let overload = lookup(env, receiver, selector, site, ctx);
    into_method(env, overload, selector, receiver, site)
}

/// Resolves `new ty(arguments)`.
pub fn get_constructor(env: &mut Environment, ty: TypeId, site: &InvocationSite, ctx: &AccessContext) -> MethodId {
    let constructors = env.get_methods(ty, CONSTRUCTOR_NAME);
    let overload = if constructors.is_empty() {
        Overload::Problem {
            reason: ProblemReason::NotFound,
            closest_match: None,
        }
    } else {
        resolve_overload(env, &constructors, ty, site, ctx)
    };
    into_method(env, overload, CONSTRUCTOR_NAME, ty, site)
}

/// Resolves an unqualified `selector(arguments)` in `scope`. The innermost
/// enclosing class with a method of that name is the only one searched
/// (JLS 15.12.1); static imports are consulted when no class has one.
pub fn get_implicit_method(
    env: &mut Environment,
    scope: &Scope<'_>,
    selector: &str,
    site: &InvocationSite,
) -> MethodResolution {
    let ctx = AccessContext::from_scope(scope);
    let mut depth = 0u32;
    let mut in_static = false;
    let mut in_constructor_call = false;
    let mut first_class = None;

    for current in scope.ancestors() {
        match current.kind() {
            ScopeKind::Block {
                in_constructor_call: prologue,
                ..
            } => in_constructor_call |= *prologue,
            ScopeKind::Method(method) => in_static |= method.is_static,
            ScopeKind::Class(ty) => {
                let ty = *ty;
                first_class.get_or_insert(ty);
                let candidates = collect_candidates(env, ty, selector, false);
                let has_defaults = !is_interface_like(env, ty)
                    && collect_candidates(env, ty, selector, true)
                        .found
                        .iter()
                        .any(|&m| env.method(m).is_default());
                if !candidates.found.is_empty() || has_defaults {
                    let overload = lookup(env, ty, selector, site, &ctx);
                    let method = into_method(env, overload, selector, ty, site);
                    let data = env.method(method);
                    let needs_instance = data.is_valid() && !data.is_static();
                    let reason = if needs_instance && in_static {
                        Some(ProblemReason::NonStaticReferenceInStaticContext)
                    } else if needs_instance && in_constructor_call {
                        Some(ProblemReason::NonStaticReferenceInConstructorInvocation)
                    } else {
                        None
                    };
                    let method = match reason {
                        Some(reason) => {
                            create_problem_method(env, selector, ty, &site.arguments, reason, Some(method))
                        }
                        None => method,
                    };
                    return MethodResolution { method, depth };
                }
                in_static |= env.class(ty).is_some_and(|class| class.is_static());
                in_constructor_call = false;
                depth += 1;
            }
            ScopeKind::CompilationUnit(unit) => {
                if let Some(method) = static_import_method(env, unit, selector, site) {
                    return MethodResolution { method, depth: 0 };
                }
            }
            ScopeKind::Module(_) => {}
        }
    }

    let declaring = match first_class {
        Some(ty) => ty,
        None => env.object(),
    };
    let method = create_problem_method(env, selector, declaring, &site.arguments, ProblemReason::NotFound, None);
    MethodResolution { method, depth: 0 }
}

fn static_methods_of(env: &mut Environment, container: &str, selector: &str) -> Vec<MethodId> {
    let Some(ty) = find_qualified_type(env, container) else {
        return Vec::new();
    };
    collect_candidates(env, ty, selector, false)
        .found
        .into_iter()
        .filter(|&m| env.method(m).is_static())
        .collect()
}

/// Statically imported methods: single imports shadow on-demand ones.
fn static_import_method(
    env: &mut Environment,
    unit: &UnitContext,
    selector: &str,
    site: &InvocationSite,
) -> Option<MethodId> {
    let ctx = AccessContext::in_package(unit.package.clone());
    let mut candidates: Vec<MethodId> = Vec::new();
    for import in &unit.imports.static_single {
        if import.member == selector {
            for method in static_methods_of(env, &import.ty, selector) {
                if !candidates.contains(&method) {
                    candidates.push(method);
                }
            }
        }
    }
    let on_demand = candidates.is_empty();
    if on_demand {
        for import in &unit.imports.static_star {
            for method in static_methods_of(env, &import.ty, selector) {
                if !candidates.contains(&method) {
                    candidates.push(method);
                }
            }
        }
    }
    let first = *candidates.first()?;
    let receiver = env.method(first).declaring_class;
    let overload = resolve_overload(env, &candidates, receiver, site, &ctx);
    if on_demand {
        if let Overload::Problem {
            reason: ProblemReason::Ambiguous,
            ..
        } = overload
        {
            env.report(Problem::error(
                ProblemId::AmbiguousStaticImport,
                site.span,
                vec![selector.to_string()],
            ));
        }
    }
    Some(into_method(env, overload, selector, receiver, site))
}

/// Marker for an early exit from [`exact_method`].
struct Ambiguous;

fn exact_method(
    env: &mut Environment,
    receiver: TypeId,
    selector: &str,
    ctx: &AccessContext,
) -> Result<Option<MethodId>, Ambiguous> {
    let mut candidates = collect_candidates(env, receiver, selector, false).found;
    if !is_interface_like(env, receiver) {
        let defaults = collect_candidates(env, receiver, selector, true).found;
        for method in defaults {
            let hidden = candidates.iter().any(|&c| is_subsignature(env, c, method));
            if !hidden && !candidates.contains(&method) {
                candidates.push(method);
            }
        }
    }

    let mut exact = None;
    for method in candidates {
        if !can_method_be_seen_by(env, method, receiver, ctx) {
            continue;
        }
        match exact {
            None => exact = Some(method),
            Some(previous) if original_method(env, previous) == original_method(env, method) => {}
            Some(_) => return Err(Ambiguous),
        }
    }
    let Some(method) = exact else {
        return Ok(None);
    };
    let data = env.method(method);
    if data.is_generic() || data.is_varargs() {
        return Ok(None);
    }
    Ok(Some(method))
}

/// The single method named `selector` of `receiver`, as needed to type a
/// method reference without overload resolution. `None` when there are
/// several, or the one there is generic or varargs.
pub fn find_exact_method(
    env: &mut Environment,
    receiver: TypeId,
    selector: &str,
    ctx: &AccessContext,
) -> Option<MethodId> {
    exact_method(env, receiver, selector, ctx).unwrap_or(None)
}
