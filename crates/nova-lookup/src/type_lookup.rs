//! Type name resolution.
//!
//! A simple type name is looked up outward from the innermost scope:
//! method type variables, then per enclosing class its type variables and
//! member types (declared before inherited), then the compilation unit
//! (own types, single-type imports, same package, on-demand imports with
//! the implicit `java.lang.*`), then packages readable from the module.
//! Failures are problem types, never `None`.

use std::collections::VecDeque;

use nova_bindings::{
    direct_supertypes, is_compatible_with, readable_name, substitute, BaseType, BindingKind,
    Environment, Problem, ProblemId, ProblemReason, TypeId, TypeSubstitution, WildcardKind,
};
use nova_decl::{Span, TypeRef, TypeRefSegment, WildcardRef};
use rustc_hash::FxHashSet;

use crate::scope::{Scope, ScopeKind, UnitContext};
use crate::visibility::{can_type_be_seen_by, AccessContext};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeOrPackage {
    Type(TypeId),
    Package(String),
}

/// What one level of the lookup found.
enum Lookup {
    Found(TypeId),
    NotVisible(TypeId),
    Problem(TypeId),
    NotFound,
}

fn visible_or_problem(env: &mut Environment, ty: TypeId, name: &str, ctx: &AccessContext) -> Lookup {
    if can_type_be_seen_by(env, ty, ctx) {
        Lookup::Found(ty)
    } else {
        Lookup::NotVisible(env.create_problem_type(name, ProblemReason::NotVisible, Some(ty)))
    }
}

/// Resolves a dotted source name (`java.util.Map.Entry`) by trying each
/// package/type split, longest package first.
pub fn find_qualified_type(env: &mut Environment, dotted: &str) -> Option<TypeId> {
    let segments: Vec<&str> = dotted.split('.').filter(|s| !s.is_empty()).collect();
    for split in (0..segments.len()).rev() {
        let (package, types) = segments.split_at(split);
        let types = types.join("$");
        let binary = if package.is_empty() {
            types
        } else {
            format!("{}.{types}", package.join("."))
        };
        if let Some(ty) = env.get_type(&binary) {
            return Some(ty);
        }
    }
    None
}

/// The member type `member` as seen through `owner`: a non-static member
/// of a parameterized type is parameterized by it, of a raw type is raw.
fn member_in(env: &mut Environment, owner: TypeId, member: TypeId) -> TypeId {
    if env.class(member).is_some_and(|class| class.is_static()) {
        return member;
    }
    match env.kind(owner) {
        BindingKind::Parameterized => env.create_parameterized_type(member, Vec::new(), Some(owner)),
        BindingKind::Raw => env.create_raw_type(member, Some(owner)),
        _ => member,
    }
}

fn member_type_lookup(env: &mut Environment, ty: TypeId, name: &str, ctx: &AccessContext) -> Lookup {
    let Some(declaration) = env.generic_of(ty) else {
        return Lookup::NotFound;
    };
    if let Some(member) = env.member_type(declaration, name) {
        let member = member_in(env, ty, member);
        return visible_or_problem(env, member, name, ctx);
    }

    let mut found: Vec<TypeId> = Vec::new();
    let mut seen = FxHashSet::default();
    seen.insert(declaration);
    let mut queue: VecDeque<TypeId> = direct_supertypes(env, ty).into();
    while let Some(supertype) = queue.pop_front() {
        let Some(decl) = env.generic_of(supertype) else {
            continue;
        };
        if !seen.insert(decl) {
            continue;
        }
        if let Some(member) = env.member_type(decl, name) {
            let member = member_in(env, supertype, member);
            if !found.iter().any(|&f| env.generic_of(f) == env.generic_of(member)) {
                found.push(member);
            }
            continue;
        }
        queue.extend(direct_supertypes(env, supertype));
    }
    match found.as_slice() {
        [] => Lookup::NotFound,
        [single] => visible_or_problem(env, *single, name, ctx),
        [first, ..] => Lookup::Problem(env.create_problem_type(name, ProblemReason::Ambiguous, Some(*first))),
    }
}

/// The member type `name` of `ty`, declared or inherited. Problem type when
/// missing, ambiguous or not visible.
pub fn find_member_type(env: &mut Environment, ty: TypeId, name: &str, ctx: &AccessContext) -> TypeId {
    match member_type_lookup(env, ty, name, ctx) {
        Lookup::Found(found) | Lookup::NotVisible(found) | Lookup::Problem(found) => found,
        Lookup::NotFound => env.create_problem_type(name, ProblemReason::NotFound, None),
    }
}

fn find_type_variable(env: &Environment, type_variables: &[TypeId], name: &str) -> Option<TypeId> {
    type_variables
        .iter()
        .copied()
        .find(|&var| env.type_variable(var).is_some_and(|data| data.name == name))
}

fn single_or_ambiguous(env: &mut Environment, candidates: &[TypeId], name: &str) -> Lookup {
    match candidates {
        [] => Lookup::NotFound,
        [single] => Lookup::Found(*single),
        [first, ..] => Lookup::Problem(env.create_problem_type(name, ProblemReason::Ambiguous, Some(*first))),
    }
}

fn unit_type_lookup(env: &mut Environment, unit: &UnitContext, name: &str, ctx: &AccessContext) -> Lookup {
    for &ty in &unit.types {
        if env.class(ty).is_some_and(|class| class.simple_name == name) {
            return Lookup::Found(ty);
        }
    }

    let mut candidates = Vec::new();
    for import in &unit.imports.type_single {
        if import.imported != name {
            continue;
        }
        if let Some(ty) = find_qualified_type(env, &import.path) {
            if !candidates.contains(&ty) {
                candidates.push(ty);
            }
        }
    }
    match candidates.as_slice() {
        [] => {}
        [single] => return visible_or_problem(env, *single, name, ctx),
        _ => return single_or_ambiguous(env, &candidates, name),
    }

    if let Some(ty) = env.get_type(&unit.qualify(name)) {
        return Lookup::Found(ty);
    }

    // `java.lang.*` takes part in the on-demand set, so it can clash too.
    let mut candidates = Vec::new();
    let mut invisible = None;
    let mut containers: Vec<String> = unit
        .imports
        .type_star
        .iter()
        .map(|import| import.path.clone())
        .collect();
    containers.push("java.lang".to_string());
    for container in containers {
        let found = match find_qualified_type(env, &container) {
            Some(ty) => env.member_type(ty, name),
            None => env.get_type(&format!("{container}.{name}")),
        };
        let Some(ty) = found else {
            continue;
        };
        if !can_type_be_seen_by(env, ty, ctx) {
            invisible.get_or_insert(ty);
        } else if !candidates.contains(&ty) {
            candidates.push(ty);
        }
    }
    match (single_or_ambiguous(env, &candidates, name), invisible) {
        (Lookup::NotFound, Some(ty)) => {
            Lookup::NotVisible(env.create_problem_type(name, ProblemReason::NotVisible, Some(ty)))
        }
        (lookup, _) => lookup,
    }
}

fn module_type_lookup(env: &mut Environment, readable: &[String], name: &str, ctx: &AccessContext) -> Lookup {
    let mut candidates = Vec::new();
    for package in readable {
        if let Some(ty) = env.get_type(&format!("{package}.{name}")) {
            if can_type_be_seen_by(env, ty, ctx) && !candidates.contains(&ty) {
                candidates.push(ty);
            }
        }
    }
    single_or_ambiguous(env, &candidates, name)
}

/// Resolves the simple type name `name` in `scope`.
pub fn get_type(env: &mut Environment, scope: &Scope<'_>, name: &str) -> TypeId {
    let ctx = AccessContext::from_scope(scope);
    let mut in_static = false;
    let mut not_visible = None;

    for current in scope.ancestors() {
        let lookup = match current.kind() {
            ScopeKind::Block { .. } => Lookup::NotFound,
            ScopeKind::Method(method) => {
                in_static |= method.is_static;
                match find_type_variable(env, &method.type_variables, name) {
                    Some(var) => Lookup::Found(var),
                    None => Lookup::NotFound,
                }
            }
            ScopeKind::Class(ty) => {
                let ty = *ty;
                let type_variables = env
                    .class(ty)
                    .map(|class| class.type_variables.clone())
                    .unwrap_or_default();
                let lookup = match find_type_variable(env, &type_variables, name) {
                    Some(var) if in_static => Lookup::Problem(env.create_problem_type(
                        name,
                        ProblemReason::NonStaticReferenceInStaticContext,
                        Some(var),
                    )),
                    Some(var) => Lookup::Found(var),
                    None => member_type_lookup(env, ty, name, &ctx),
                };
                in_static |= env.class(ty).is_some_and(|class| class.is_static());
                lookup
            }
            ScopeKind::CompilationUnit(unit) => unit_type_lookup(env, unit, name, &ctx),
            ScopeKind::Module(module) => module_type_lookup(env, &module.readable_packages, name, &ctx),
        };
        match lookup {
            Lookup::Found(ty) | Lookup::Problem(ty) => return ty,
            Lookup::NotVisible(problem) => {
                not_visible.get_or_insert(problem);
            }
            Lookup::NotFound => {}
        }
    }
    not_visible.unwrap_or_else(|| env.create_problem_type(name, ProblemReason::NotFound, None))
}

/// A simple name read as a type, or as a package when no type matches.
pub fn get_type_or_package(env: &mut Environment, scope: &Scope<'_>, name: &str) -> TypeOrPackage {
    let ty = get_type(env, scope, name);
    let not_found = env
        .problem(ty)
        .is_some_and(|problem| problem.reason == ProblemReason::NotFound);
    if not_found && env.package_exists(name) {
        TypeOrPackage::Package(name.to_string())
    } else {
        TypeOrPackage::Type(ty)
    }
}

/// Checks the arguments of a parameterized type against the bounds of its
/// type variables. Returns the rank of the first violating argument.
pub fn check_type_arguments(env: &mut Environment, ty: TypeId) -> Result<(), usize> {
    if env.kind(ty) != BindingKind::Parameterized {
        return Ok(());
    }
    let (Some(generic), Some(substitution)) = (env.generic_of(ty), TypeSubstitution::new(env, ty)) else {
        return Ok(());
    };
    let arguments = env
        .parameterized(ty)
        .map(|data| data.arguments.clone())
        .unwrap_or_default();
    let type_variables = env
        .class(generic)
        .map(|class| class.type_variables.clone())
        .unwrap_or_default();

    for (rank, (&var, &argument)) in type_variables.iter().zip(&arguments).enumerate() {
        let checked = match env.wildcard(argument) {
            Some(wildcard) if wildcard.kind == WildcardKind::Super => wildcard.bound,
            Some(_) => None,
            None => Some(argument),
        };
        let Some(checked) = checked else {
            continue;
        };
        for bound in env.type_variable_bounds(var).all() {
            let bound = substitute(env, &substitution, bound);
            if env.is_object(bound) || env.kind(bound) == BindingKind::Wildcard {
                continue;
            }
            if !is_compatible_with(env, checked, bound) {
                return Err(rank);
            }
        }
    }
    Ok(())
}

/// How [`resolve_type_ref_with`] treats parameterized references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Check type arguments against bounds. Off while hierarchies are
    /// being connected, where bounds may not be known yet.
    pub check_bounds: bool,
    /// Warn about raw references to generic types.
    pub report_raw: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            check_bounds: true,
            report_raw: true,
        }
    }
}

impl ResolveOptions {
    pub const HEADER: ResolveOptions = ResolveOptions {
        check_bounds: false,
        report_raw: true,
    };
}

/// Resolves a source type reference, reporting failures.
pub fn resolve_type_ref(env: &mut Environment, scope: &Scope<'_>, type_ref: &TypeRef) -> TypeId {
    resolve_type_ref_with(env, scope, type_ref, ResolveOptions::default())
}

pub fn resolve_type_ref_with(
    env: &mut Environment,
    scope: &Scope<'_>,
    type_ref: &TypeRef,
    options: ResolveOptions,
) -> TypeId {
    let resolver = TypeRefResolver {
        scope,
        options,
        ctx: AccessContext::from_scope(scope),
    };
    resolver.resolve(env, type_ref)
}

/// Reports the diagnostic matching a problem type at `span`.
pub fn report_type_problem(env: &mut Environment, ty: TypeId, span: Span) {
    let Some(problem) = env.problem(ty).cloned() else {
        return;
    };
    let id = match problem.reason {
        ProblemReason::NotFound => ProblemId::UnresolvedType,
        ProblemReason::Ambiguous => ProblemId::AmbiguousType,
        ProblemReason::NotVisible => ProblemId::NotVisibleType,
        ProblemReason::NonStaticReferenceInStaticContext => ProblemId::NonStaticTypeVariableReference,
        ProblemReason::TypeParameterArityMismatch | ProblemReason::NotAWellFormedParameterizedType => {
            ProblemId::IncorrectArityForParameterizedType
        }
        _ => ProblemId::UnresolvedType,
    };
    env.report(Problem::error(id, span, vec![problem.name]));
}

struct TypeRefResolver<'s, 'a> {
    scope: &'s Scope<'a>,
    options: ResolveOptions,
    ctx: AccessContext,
}

impl TypeRefResolver<'_, '_> {
    fn resolve(&self, env: &mut Environment, type_ref: &TypeRef) -> TypeId {
        match type_ref {
            TypeRef::Primitive(kind) => env.base(BaseType::from_primitive(*kind)),
            TypeRef::Array { element, dimensions } => {
                let leaf = self.resolve(env, element);
                if !env.is_valid(leaf) {
                    return leaf;
                }
                env.create_array(leaf, *dimensions)
            }
            TypeRef::Wildcard(wildcard) => self.wildcard(env, wildcard, None, 0),
            TypeRef::Named { segments, span } => self.named(env, segments, *span),
        }
    }

    fn fail(&self, env: &mut Environment, problem: TypeId, span: Span) -> TypeId {
        report_type_problem(env, problem, span);
        problem
    }

    fn named(&self, env: &mut Environment, segments: &[TypeRefSegment], span: Span) -> TypeId {
        let Some(first) = segments.first() else {
            let problem = env.create_problem_type("", ProblemReason::NotFound, None);
            return self.fail(env, problem, span);
        };

        // Find the leftmost segment naming a type.
        let (start, declaration) = match get_type_or_package(env, self.scope, &first.name) {
            TypeOrPackage::Type(ty) => (0, ty),
            TypeOrPackage::Package(mut package) => {
                let mut found = None;
                for (idx, segment) in segments.iter().enumerate().skip(1) {
                    let qualified = format!("{package}.{}", segment.name);
                    if let Some(ty) = env.get_type(&qualified) {
                        found = Some((idx, ty));
                        break;
                    }
                    package = qualified;
                }
                match found {
                    Some((idx, ty)) if can_type_be_seen_by(env, ty, &self.ctx) => (idx, ty),
                    Some((idx, ty)) => {
                        let name = dotted(&segments[..=idx]);
                        let problem = env.create_problem_type(&name, ProblemReason::NotVisible, Some(ty));
                        return self.fail(env, problem, span);
                    }
                    None => {
                        let problem = env.create_problem_type(&dotted(segments), ProblemReason::NotFound, None);
                        return self.fail(env, problem, span);
                    }
                }
            }
        };
        if !env.is_valid(declaration) {
            return self.fail(env, declaration, span);
        }
        if env.kind(declaration).is_type_variable_like() {
            if segments.len() > 1 || !first.arguments.is_empty() {
                let problem = env.create_problem_type(&dotted(segments), ProblemReason::NotFound, None);
                return self.fail(env, problem, span);
            }
            return declaration;
        }

        let enclosing = env.parameterized(declaration).and_then(|data| data.enclosing);
        let Some(generic) = env.generic_of(declaration) else {
            return declaration;
        };
        let mut current = self.apply(env, generic, &segments[start].arguments, enclosing, span);
        for (idx, segment) in segments.iter().enumerate().skip(start + 1) {
            if !env.is_valid(current) {
                return current;
            }
            let member = match member_type_lookup(env, current, &segment.name, &self.ctx) {
                Lookup::Found(member) => member,
                Lookup::NotVisible(problem) | Lookup::Problem(problem) => return self.fail(env, problem, span),
                Lookup::NotFound => {
                    let problem =
                        env.create_problem_type(&dotted(&segments[..=idx]), ProblemReason::NotFound, None);
                    return self.fail(env, problem, span);
                }
            };
            let enclosing = env.parameterized(member).and_then(|data| data.enclosing);
            let Some(generic) = env.generic_of(member) else {
                return member;
            };
            current = self.apply(env, generic, &segment.arguments, enclosing, span);
        }
        current
    }

    /// `declaration<arguments>` as a member of `enclosing`.
    fn apply(
        &self,
        env: &mut Environment,
        declaration: TypeId,
        arguments: &[TypeRef],
        enclosing: Option<TypeId>,
        span: Span,
    ) -> TypeId {
        let type_variables = env
            .class(declaration)
            .map(|class| class.type_variables.clone())
            .unwrap_or_default();
        let name = env
            .class(declaration)
            .map(|class| class.qualified_name.clone())
            .unwrap_or_default();

        if arguments.is_empty() {
            if type_variables.is_empty() {
                return match enclosing.map(|outer| (outer, env.kind(outer))) {
                    Some((outer, BindingKind::Raw)) => env.create_raw_type(declaration, Some(outer)),
                    Some((outer, BindingKind::Parameterized)) => {
                        env.create_parameterized_type(declaration, Vec::new(), Some(outer))
                    }
                    _ => declaration,
                };
            }
            if self.options.report_raw && env.options().source_level.supports_generics() {
                let readable = readable_name(env, declaration);
                env.report(Problem::warning(ProblemId::RawTypeReference, span, vec![readable]));
            }
            return env.create_raw_type(declaration, enclosing);
        }

        if type_variables.is_empty() {
            let problem = env.create_problem_type(
                &name,
                ProblemReason::NotAWellFormedParameterizedType,
                Some(declaration),
            );
            return self.fail(env, problem, span);
        }
        if type_variables.len() != arguments.len() {
            let problem =
                env.create_problem_type(&name, ProblemReason::TypeParameterArityMismatch, Some(declaration));
            return self.fail(env, problem, span);
        }

        let mut resolved = Vec::with_capacity(arguments.len());
        for (rank, argument) in arguments.iter().enumerate() {
            let ty = match argument {
                TypeRef::Wildcard(wildcard) => self.wildcard(env, wildcard, Some(declaration), rank as u32),
                TypeRef::Primitive(_) => {
                    env.report(Problem::error(
                        ProblemId::TypeArgumentMismatch,
                        span,
                        vec![argument.to_string(), name.clone()],
                    ));
                    env.create_problem_type(&name, ProblemReason::NotAWellFormedParameterizedType, Some(declaration))
                }
                other => self.resolve(env, other),
            };
            if !env.is_valid(ty) {
                return ty;
            }
            resolved.push(ty);
        }

        let enclosing = enclosing.filter(|&outer| env.kind(outer) == BindingKind::Parameterized);
        let ty = env.create_parameterized_type(declaration, resolved, enclosing);
        if self.options.check_bounds {
            if let Err(rank) = check_type_arguments(env, ty) {
                let argument = arguments
                    .get(rank)
                    .map(ToString::to_string)
                    .unwrap_or_default();
                env.report(Problem::error(ProblemId::TypeArgumentMismatch, span, vec![argument, name]));
            }
        }
        ty
    }

    fn wildcard(&self, env: &mut Environment, wildcard: &WildcardRef, generic: Option<TypeId>, rank: u32) -> TypeId {
        let (kind, bound) = match wildcard {
            WildcardRef::Unbound => (WildcardKind::Unbound, None),
            WildcardRef::Extends(bound) => (WildcardKind::Extends, Some(bound)),
            WildcardRef::Super(bound) => (WildcardKind::Super, Some(bound)),
        };
        let bound = match bound {
            Some(bound) => {
                let ty = self.resolve(env, bound);
                if !env.is_valid(ty) {
                    return ty;
                }
                Some(ty)
            }
            None => None,
        };
        env.create_wildcard(generic, rank, kind, bound, Vec::new())
    }
}

fn dotted(segments: &[TypeRefSegment]) -> String {
    segments
        .iter()
        .map(|segment| segment.name.as_str())
        .collect::<Vec<_>>()
        .join(".")
}
