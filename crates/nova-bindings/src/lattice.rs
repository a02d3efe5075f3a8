//! Least upper bound (JLS 4.10.4) and greatest lower bound (JLS 5.1.10).

use rustc_hash::FxHashSet;

use crate::binding::{BaseType, BindingKind, TypeKind, WildcardKind};
use crate::env::{Environment, WellKnown};
use crate::hierarchy::{
    direct_supertypes, erasure, find_super_type_originating_from, is_compatible_with, is_subtype_of,
};
use crate::ids::TypeId;
use crate::nullness;

/// Greatest lower bound of `types`: the types that are not supertypes of
/// another one, class (if any) first. `None` when two of them cannot have
/// a common subtype, e.g. two unrelated classes.
pub fn greater_lower_bound(env: &mut Environment, types: &[TypeId]) -> Option<Vec<TypeId>> {
    let mut distinct: Vec<TypeId> = Vec::with_capacity(types.len());
    for &ty in types {
        let ty = nullness::unannotated(env, ty);
        if !distinct.contains(&ty) {
            distinct.push(ty);
        }
    }
    if distinct.len() <= 1 {
        return Some(distinct);
    }

    let mut kept = Vec::with_capacity(distinct.len());
    for (i, &candidate) in distinct.iter().enumerate() {
        let redundant = distinct
            .iter()
            .enumerate()
            .any(|(j, &other)| i != j && is_subtype_of(env, other, candidate));
        if !redundant {
            kept.push(candidate);
        }
    }
    // Mutual subtypes (raw vs. generic declaration) would all be dropped.
    if kept.is_empty() {
        kept.push(distinct[0]);
    }

    for (i, &a) in kept.iter().enumerate() {
        for &b in &kept[i + 1..] {
            if is_malformed_pair(env, a, b) {
                return None;
            }
        }
    }
    let (classes, interfaces): (Vec<TypeId>, Vec<TypeId>) =
        kept.into_iter().partition(|&ty| !env.is_interface(ty));
    Some(classes.into_iter().chain(interfaces).collect())
}

/// Two unrelated class types, or two different parameterizations of the
/// same declaration. A type variable conflicts with another type variable
/// unless one is a subtype of the other, and with a class (other than
/// `Object`) its first bound cannot be converted to.
fn is_malformed_pair(env: &mut Environment, a: TypeId, b: TypeId) -> bool {
    let (va, from_inference_a) = variable_of(env, a);
    let (vb, from_inference_b) = variable_of(env, b);
    match (va, vb) {
        (Some(va), Some(vb)) if !from_inference_a && !from_inference_b => {
            return !is_subtype_of(env, va, vb) && !is_subtype_of(env, vb, va);
        }
        (Some(va), _) => return is_variable_class_conflict(env, va, from_inference_a, b),
        (None, Some(vb)) => return is_variable_class_conflict(env, vb, from_inference_b, a),
        (None, None) => {}
    }

    let both_declared = env.kind(a).is_declared_type() && env.kind(b).is_declared_type();
    if !both_declared {
        return false;
    }
    if env.generic_of(a) == env.generic_of(b) {
        return env.kind(a) == BindingKind::Parameterized
            && env.kind(b) == BindingKind::Parameterized
            && a != b;
    }
    !env.is_interface(a) && !env.is_interface(b)
}

/// The type variable `ty` is, or stands for when it is an inference
/// variable. Captures are not type variables here.
fn variable_of(env: &Environment, ty: TypeId) -> (Option<TypeId>, bool) {
    match env.type_kind(ty) {
        TypeKind::TypeVariable(_) => (Some(ty), false),
        TypeKind::InferenceVariable(data) => match env.type_kind(data.type_parameter) {
            TypeKind::TypeVariable(_) => (Some(data.type_parameter), true),
            _ => (None, true),
        },
        _ => (None, false),
    }
}

fn is_variable_class_conflict(env: &mut Environment, variable: TypeId, from_inference: bool, other: TypeId) -> bool {
    if !env.kind(other).is_declared_type() || env.is_interface(other) {
        return false;
    }
    let class = erasure(env, other);
    if env.is_object(class) {
        return false;
    }
    match env.type_variable_bounds(variable).first_bound {
        None => !from_inference,
        Some(bound) => {
            let bound = erasure(env, bound);
            !is_compatible_with(env, bound, class)
        }
    }
}

/// Outcome of a nested lub computation.
enum Lub {
    Type(TypeId),
    /// The same lub is already being computed further up: recursion such as
    /// `lub(Integer, String)` through `Comparable<..>` is cut here.
    Cycle,
    None,
}

#[derive(Default)]
struct LubStack {
    frames: Vec<Vec<TypeId>>,
}

/// `lub(types)`. `null` types are ignored; a lub of primitives exists only
/// when they are all the same. Several candidates combine into an
/// intersection type, class first.
pub fn lower_upper_bound(env: &mut Environment, types: &[TypeId]) -> Option<TypeId> {
    match lub(env, types, &mut LubStack::default()) {
        Lub::Type(ty) => Some(ty),
        Lub::Cycle | Lub::None => None,
    }
}

fn lub(env: &mut Environment, types: &[TypeId], stack: &mut LubStack) -> Lub {
    let null = env.base(BaseType::Null);
    let mut distinct: Vec<TypeId> = Vec::new();
    for &ty in types {
        let ty = nullness::unannotated(env, ty);
        if ty != null && !distinct.contains(&ty) {
            distinct.push(ty);
        }
    }
    match distinct.as_slice() {
        [] if types.is_empty() => return Lub::None,
        [] => return Lub::Type(null),
        [single] => return Lub::Type(*single),
        _ => {}
    }
    if distinct.iter().any(|&ty| env.kind(ty) == BindingKind::Base) {
        return Lub::None;
    }
    if let Some(&ty) = distinct
        .iter()
        .find(|&&ty| distinct.iter().all(|&other| is_subtype_of(env, other, ty)))
    {
        return Lub::Type(ty);
    }

    let mut frame = distinct.clone();
    frame.sort();
    if stack.frames.contains(&frame) {
        return Lub::Cycle;
    }
    stack.frames.push(frame);
    let result = lub_uncached(env, &distinct, stack);
    stack.frames.pop();
    result
}

fn lub_uncached(env: &mut Environment, types: &[TypeId], stack: &mut LubStack) -> Lub {
    if let Some(result) = array_lub(env, types, stack) {
        return result;
    }

    // Erased candidate set: erased supertypes common to every type.
    let mut supertype_sets: Vec<Vec<TypeId>> = Vec::with_capacity(types.len());
    for &ty in types {
        supertype_sets.push(erased_supertypes(env, ty));
    }
    let Some((first, rest)) = supertype_sets.split_first() else {
        return Lub::None;
    };
    let common: Vec<TypeId> = first
        .iter()
        .copied()
        .filter(|candidate| rest.iter().all(|set| set.contains(candidate)))
        .collect();

    // Minimal erased candidates.
    let mut minimal = Vec::new();
    for &candidate in &common {
        let dominated = common
            .iter()
            .any(|&other| other != candidate && is_subtype_of(env, other, candidate));
        if !dominated {
            minimal.push(candidate);
        }
    }

    let mut candidates = Vec::with_capacity(minimal.len());
    for &declaration in &minimal {
        let generic = env.class(declaration).is_some_and(|c| c.is_generic());
        if !generic {
            candidates.push(declaration);
            continue;
        }
        let mut invocations = Vec::with_capacity(types.len());
        for &ty in types {
            if let Some(found) = find_super_type_originating_from(env, ty, declaration) {
                if !invocations.contains(&found) {
                    invocations.push(found);
                }
            }
        }
        match least_containing_invocation(env, declaration, &invocations, stack) {
            Some(candidate) => candidates.push(candidate),
            None => candidates.push(env.create_raw_type(declaration, None)),
        }
    }

    let object = env.object();
    if candidates.len() == 2 && candidates.contains(&object) {
        candidates.retain(|&c| c != object);
    }
    match candidates.len() {
        0 => Lub::Type(object),
        1 => Lub::Type(candidates[0]),
        _ => {
            let parts = greater_lower_bound(env, &candidates).unwrap_or(candidates);
            Lub::Type(env.create_intersection(parts))
        }
    }
}

/// Arrays of equal dimensions whose leaves are references: the lub of the
/// leaves as an array. Other arrays take part through their supertypes.
fn array_lub(env: &mut Environment, types: &[TypeId], stack: &mut LubStack) -> Option<Lub> {
    let mut leaves = Vec::with_capacity(types.len());
    let mut dims = None;
    for &ty in types {
        let TypeKind::Array { leaf, dimensions } = *env.type_kind(ty) else {
            return None;
        };
        if dims.is_some_and(|d| d != dimensions) || env.kind(leaf) == BindingKind::Base {
            return None;
        }
        dims = Some(dimensions);
        leaves.push(leaf);
    }
    let dims = dims?;
    Some(match lub(env, &leaves, stack) {
        Lub::Type(leaf) => Lub::Type(env.create_array(leaf, dims)),
        other => other,
    })
}

/// All supertypes of `ty`, itself included, erased. Type variables
/// contribute their bounds, not themselves.
fn erased_supertypes(env: &mut Environment, ty: TypeId) -> Vec<TypeId> {
    let mut result = Vec::new();
    let mut seen = FxHashSet::default();
    let mut worklist = vec![ty];
    while let Some(current) = worklist.pop() {
        if !seen.insert(current) {
            continue;
        }
        if !env.kind(current).is_type_variable_like()
            && env.kind(current) != BindingKind::Intersection
        {
            let erased = erasure(env, current);
            if !result.contains(&erased) {
                result.push(erased);
            }
        }
        if env.kind(current) == BindingKind::Array {
            for which in [WellKnown::Object, WellKnown::Cloneable, WellKnown::Serializable] {
                let known = env.well_known(which);
                if !result.contains(&known) {
                    result.push(known);
                }
            }
            continue;
        }
        worklist.extend(direct_supertypes(env, current));
    }
    result
}

/// `lci` of the invocations of one generic declaration.
fn least_containing_invocation(
    env: &mut Environment,
    declaration: TypeId,
    invocations: &[TypeId],
    stack: &mut LubStack,
) -> Option<TypeId> {
    let (&first, rest) = invocations.split_first()?;
    if invocations
        .iter()
        .any(|&inv| env.kind(inv) != BindingKind::Parameterized)
    {
        return Some(env.create_raw_type(declaration, None));
    }
    let data = env.parameterized(first)?;
    let mut arguments = data.arguments.clone();
    let enclosing = data.enclosing;
    for &other in rest {
        let other_arguments = env.parameterized(other)?.arguments.clone();
        let mut merged = Vec::with_capacity(arguments.len());
        for (rank, (&a, &b)) in arguments.iter().zip(&other_arguments).enumerate() {
            merged.push(least_containing_argument(env, declaration, rank as u32, a, b, stack));
        }
        arguments = merged;
    }
    Some(env.create_parameterized_type(declaration, arguments, enclosing))
}

/// `lcta(a, b)`.
fn least_containing_argument(
    env: &mut Environment,
    declaration: TypeId,
    rank: u32,
    a: TypeId,
    b: TypeId,
    stack: &mut LubStack,
) -> TypeId {
    if a == b {
        return a;
    }
    let generic = Some(declaration);
    let unbound = env.create_wildcard(generic, rank, WildcardKind::Unbound, None, Vec::new());
    let wa = env.wildcard(a).map(|w| (w.kind, w.bound));
    let wb = env.wildcard(b).map(|w| (w.kind, w.bound));

    let extends = |env: &mut Environment, x: TypeId, y: TypeId, stack: &mut LubStack| -> TypeId {
        match lub(env, &[x, y], stack) {
            Lub::Type(bound) if !env.is_object(bound) => {
                env.create_wildcard(generic, rank, WildcardKind::Extends, Some(bound), Vec::new())
            }
            _ => unbound,
        }
    };
    let super_ = |env: &mut Environment, x: TypeId, y: TypeId| -> TypeId {
        match greater_lower_bound(env, &[x, y]).and_then(|parts| parts.first().copied()) {
            Some(bound) => env.create_wildcard(generic, rank, WildcardKind::Super, Some(bound), Vec::new()),
            None => unbound,
        }
    };

    match (wa, wb) {
        (None, None) => extends(env, a, b, stack),
        (None, Some((WildcardKind::Extends, Some(bound))))
        | (Some((WildcardKind::Extends, Some(bound))), None) => {
            let plain = if wa.is_none() { a } else { b };
            extends(env, plain, bound, stack)
        }
        (None, Some((WildcardKind::Super, Some(bound))))
        | (Some((WildcardKind::Super, Some(bound))), None) => {
            let plain = if wa.is_none() { a } else { b };
            super_(env, plain, bound)
        }
        (Some((WildcardKind::Extends, Some(x))), Some((WildcardKind::Extends, Some(y)))) => {
            extends(env, x, y, stack)
        }
        (Some((WildcardKind::Super, Some(x))), Some((WildcardKind::Super, Some(y)))) => {
            super_(env, x, y)
        }
        (Some((WildcardKind::Extends, Some(x))), Some((WildcardKind::Super, Some(y))))
        | (Some((WildcardKind::Super, Some(y))), Some((WildcardKind::Extends, Some(x)))) => {
            if x == y {
                x
            } else {
                unbound
            }
        }
        _ => unbound,
    }
}
