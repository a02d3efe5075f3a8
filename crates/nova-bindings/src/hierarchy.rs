//! Erasure, supertypes and the subtype relation.

use std::collections::VecDeque;

use rustc_hash::FxHashSet;

use crate::binding::{BaseType, BindingKind, TypeKind, WildcardKind};
use crate::env::{Environment, WellKnown};
use crate::flags::TagBits;
use crate::ids::TypeId;
use crate::nullness;

/// Bound on nested type-variable/capture traversal. Cyclic bounds are
/// reported by the hierarchy connector; this only stops runaway recursion
/// on the ones that slip through.
const MAX_DEPTH: u32 = 32;

/// JLS 4.6 erasure. Cached per type; `erasure(erasure(t)) == erasure(t)`.
pub fn erasure(env: &mut Environment, ty: TypeId) -> TypeId {
    erasure_guarded(env, ty, &mut FxHashSet::default())
}

fn erasure_guarded(env: &mut Environment, ty: TypeId, visiting: &mut FxHashSet<TypeId>) -> TypeId {
    if let Some(cached) = env.ty(ty).erasure {
        return cached;
    }
    if !visiting.insert(ty) {
        return env.object();
    }
    let erased = match shallow(&env.ty(ty).kind) {
        Shallow::Annotated(inner) => erasure_guarded(env, inner, visiting),
        Shallow::Itself => ty,
        Shallow::Generic(generic) => generic,
        Shallow::Array { leaf, dimensions } => {
            let leaf_erasure = erasure_guarded(env, leaf, visiting);
            env.create_array(leaf_erasure, dimensions)
        }
        Shallow::TypeVariable => {
            let bounds = env.type_variable_bounds(ty);
            match bounds.first_bound {
                Some(first) => erasure_guarded(env, first, visiting),
                None => env.object(),
            }
        }
        Shallow::Wildcard {
            kind,
            bound,
            generic,
            rank,
        } => match (kind, bound) {
            (WildcardKind::Extends, Some(bound)) => erasure_guarded(env, bound, visiting),
            _ => match declared_type_variable(env, generic, rank) {
                Some(var) => erasure_guarded(env, var, visiting),
                None => env.object(),
            },
        },
        Shallow::Intersection(first) => erasure_guarded(env, first, visiting),
        Shallow::Capture(wildcard) => {
            let bounds = env.capture_bounds(ty);
            match bounds.first_bound {
                Some(first) => erasure_guarded(env, first, visiting),
                None => erasure_guarded(env, wildcard, visiting),
            }
        }
        Shallow::InferenceVariable(parameter) => erasure_guarded(env, parameter, visiting),
    };
    // Variables read as `Object` until their bounds are connected.
    let settled = match &env.ty(ty).kind {
        TypeKind::TypeVariable(data) => data.bounds.is_built(),
        TypeKind::Capture(data) => data.bounds.is_built(),
        _ => true,
    };
    if settled {
        env.ty_mut(ty).erasure = Some(erased);
    }
    erased
}

/// The type variable a wildcard stands in for.
fn declared_type_variable(env: &Environment, generic: Option<TypeId>, rank: u32) -> Option<TypeId> {
    env.class(generic?)?
        .type_variables
        .get(rank as usize)
        .copied()
}

enum Shallow {
    Annotated(TypeId),
    Itself,
    Generic(TypeId),
    Array {
        leaf: TypeId,
        dimensions: u32,
    },
    TypeVariable,
    Wildcard {
        kind: WildcardKind,
        bound: Option<TypeId>,
        generic: Option<TypeId>,
        rank: u32,
    },
    Intersection(TypeId),
    Capture(TypeId),
    InferenceVariable(TypeId),
}

fn shallow(kind: &TypeKind) -> Shallow {
    match kind {
        TypeKind::Annotated(data) => Shallow::Annotated(data.unannotated),
        TypeKind::Base(_) | TypeKind::Class(_) | TypeKind::Problem(_) => Shallow::Itself,
        TypeKind::Parameterized(data) | TypeKind::Raw(data) => Shallow::Generic(data.generic),
        TypeKind::Array { leaf, dimensions } => Shallow::Array {
            leaf: *leaf,
            dimensions: *dimensions,
        },
        TypeKind::TypeVariable(_) => Shallow::TypeVariable,
        TypeKind::Wildcard(data) => Shallow::Wildcard {
            kind: data.kind,
            bound: data.bound,
            generic: data.generic,
            rank: data.rank,
        },
        TypeKind::Intersection(parts) => match parts.first() {
            Some(&first) => Shallow::Intersection(first),
            None => Shallow::Itself,
        },
        TypeKind::Capture(data) => Shallow::Capture(data.wildcard),
        TypeKind::InferenceVariable(data) => Shallow::InferenceVariable(data.type_parameter),
    }
}

/// Converts generic declarations (and non-static members of them) used as
/// types into raw types. Arrays convert their leaf; anything else is
/// returned unchanged.
pub fn convert_to_raw(env: &mut Environment, ty: TypeId) -> TypeId {
    let ty = nullness::unannotated(env, ty);
    match env.type_kind(ty) {
        TypeKind::Array { leaf, dimensions } => {
            let (leaf, dimensions) = (*leaf, *dimensions);
            let converted = convert_to_raw(env, leaf);
            if converted == leaf {
                ty
            } else {
                env.create_array(converted, dimensions)
            }
        }
        TypeKind::Class(class) => {
            let generic = class.is_generic();
            let outer = class.enclosing.filter(|_| !class.is_static());
            let raw_outer = match outer {
                Some(outer) if env.tag_bits(outer).contains(TagBits::HAS_TYPE_VARIABLE) => {
                    Some(convert_to_raw(env, outer))
                }
                _ => None,
            }
            .filter(|&outer| env.kind(outer) == BindingKind::Raw);
            if generic || raw_outer.is_some() {
                env.create_raw_type(ty, raw_outer)
            } else {
                ty
            }
        }
        _ => ty,
    }
}

/// Direct superclass. `None` for `Object`, interfaces, primitives and
/// problem types.
pub fn superclass(env: &mut Environment, ty: TypeId) -> Option<TypeId> {
    let ty = nullness::unannotated(env, ty);
    match env.kind(ty) {
        BindingKind::Class
        | BindingKind::Generic
        | BindingKind::Parameterized
        | BindingKind::Raw => env.hierarchy(ty).superclass,
        BindingKind::Array => Some(env.object()),
        BindingKind::TypeVariable => {
            let bounds = env.type_variable_bounds(ty);
            Some(bounds.superclass.unwrap_or_else(|| env.object()))
        }
        BindingKind::Capture => {
            let bounds = env.capture_bounds(ty);
            Some(bounds.superclass.unwrap_or_else(|| env.object()))
        }
        BindingKind::Intersection => {
            let parts = intersection_parts(env, ty);
            parts.into_iter().find(|&part| !env.is_interface(part))
        }
        BindingKind::InferenceVariable | BindingKind::Wildcard => Some(env.object()),
        BindingKind::Base | BindingKind::Problem => None,
    }
}

pub fn superinterfaces(env: &mut Environment, ty: TypeId) -> Vec<TypeId> {
    let ty = nullness::unannotated(env, ty);
    match env.kind(ty) {
        BindingKind::Class
        | BindingKind::Generic
        | BindingKind::Parameterized
        | BindingKind::Raw => env.hierarchy(ty).superinterfaces,
        BindingKind::Array => vec![
            env.well_known(WellKnown::Cloneable),
            env.well_known(WellKnown::Serializable),
        ],
        BindingKind::TypeVariable => env.type_variable_bounds(ty).superinterfaces,
        BindingKind::Capture => env.capture_bounds(ty).superinterfaces,
        BindingKind::Intersection => {
            let parts = intersection_parts(env, ty);
            parts.into_iter().filter(|&part| env.is_interface(part)).collect()
        }
        _ => Vec::new(),
    }
}

pub fn intersection_parts(env: &Environment, ty: TypeId) -> Vec<TypeId> {
    match env.type_kind(ty) {
        TypeKind::Intersection(parts) => parts.clone(),
        _ => vec![ty],
    }
}

/// Superclass followed by superinterfaces.
pub fn direct_supertypes(env: &mut Environment, ty: TypeId) -> Vec<TypeId> {
    if env.kind(ty) == BindingKind::Intersection {
        return intersection_parts(env, ty);
    }
    let mut supers: Vec<TypeId> = superclass(env, ty).into_iter().collect();
    supers.extend(superinterfaces(env, ty));
    supers
}

/// The supertype of `ty` (possibly `ty` itself) whose declaration is
/// `declaration`, e.g. `Collection<String>` for `ArrayList<String>` and
/// `Collection`. Breadth-first, so the nearest occurrence wins.
pub fn find_super_type_originating_from(
    env: &mut Environment,
    ty: TypeId,
    declaration: TypeId,
) -> Option<TypeId> {
    let declaration = env.generic_of(declaration).unwrap_or(declaration);
    let ty = nullness::unannotated(env, ty);
    let mut queue = VecDeque::from([ty]);
    let mut seen = FxHashSet::default();
    while let Some(current) = queue.pop_front() {
        if !seen.insert(current) {
            continue;
        }
        if env.generic_of(current) == Some(declaration) {
            return Some(current);
        }
        if env.kind(current) == BindingKind::Base {
            continue;
        }
        queue.extend(direct_supertypes(env, current));
    }
    None
}

/// Subtyping without unchecked conversion (JLS 4.10).
pub fn is_subtype_of(env: &mut Environment, sub: TypeId, sup: TypeId) -> bool {
    subtype(env, sub, sup, false, 0)
}

/// Assignment compatibility without boxing: subtyping, unchecked
/// conversion from raw types and primitive widening.
pub fn is_compatible_with(env: &mut Environment, from: TypeId, to: TypeId) -> bool {
    if let (Some(a), Some(b)) = (env.base_type(from), env.base_type(to)) {
        return a.widens_to(b);
    }
    subtype(env, from, to, true, 0)
}

/// Compatibility through boxing or unboxing followed by widening
/// (JLS 5.3, loose invocation context).
pub fn is_boxing_compatible_with(env: &mut Environment, from: TypeId, to: TypeId) -> bool {
    if is_compatible_with(env, from, to) {
        return true;
    }
    match (env.base_type(from), env.base_type(to)) {
        (Some(BaseType::Null | BaseType::Void), _) => false,
        (Some(_), None) => {
            let boxed = boxed(env, from);
            boxed != from && subtype(env, boxed, to, true, 0)
        }
        (None, Some(target)) => unboxed(env, from).is_some_and(|base| base.widens_to(target)),
        _ => false,
    }
}

/// The box class of a primitive type; other types are returned unchanged.
pub fn boxed(env: &mut Environment, ty: TypeId) -> TypeId {
    match env.base_type(ty).and_then(WellKnown::boxing) {
        Some(which) => env.well_known(which),
        None => ty,
    }
}

/// The primitive type boxed by `ty`, looking through type variable bounds.
pub fn unboxed(env: &mut Environment, ty: TypeId) -> Option<BaseType> {
    if let Some(base) = env.base_type(ty) {
        return Some(base);
    }
    let erased = erasure(env, ty);
    let class = env.declaration(erased)?;
    BaseType::from_boxed_name(&class.binary_name)
}

fn subtype(env: &mut Environment, sub: TypeId, sup: TypeId, allow_raw: bool, depth: u32) -> bool {
    let sub = nullness::unannotated(env, sub);
    let sup = nullness::unannotated(env, sup);
    if sub == sup {
        return true;
    }
    if depth > MAX_DEPTH {
        return false;
    }
    let sub_kind = env.kind(sub);
    let sup_kind = env.kind(sup);

    if let Some(base) = env.base_type(sub) {
        return match base {
            BaseType::Null => sup_kind != BindingKind::Base,
            _ => false,
        };
    }
    if matches!(sup_kind, BindingKind::Base | BindingKind::Problem)
        || sub_kind == BindingKind::Problem
    {
        return false;
    }
    if env.is_object(sup) {
        return true;
    }

    match sup_kind {
        BindingKind::Intersection => {
            let parts = intersection_parts(env, sup);
            return parts
                .into_iter()
                .all(|part| subtype(env, sub, part, allow_raw, depth + 1));
        }
        BindingKind::Capture => {
            if let Some(lower) = env.capture_bounds(sup).lower_bound {
                if subtype(env, sub, lower, allow_raw, depth + 1) {
                    return true;
                }
            }
        }
        BindingKind::Wildcard => return type_argument_contains_at(env, sup, sub, depth + 1),
        _ => {}
    }

    match sub_kind {
        BindingKind::TypeVariable
        | BindingKind::Capture
        | BindingKind::Intersection
        | BindingKind::InferenceVariable => direct_supertypes(env, sub)
            .into_iter()
            .any(|st| subtype(env, st, sup, allow_raw, depth + 1)),
        BindingKind::Wildcard => {
            let data = env.wildcard(sub).cloned();
            match data {
                Some(data) if data.kind == WildcardKind::Extends => data
                    .bound
                    .is_some_and(|bound| subtype(env, bound, sup, allow_raw, depth + 1)),
                _ => false,
            }
        }
        BindingKind::Array => array_subtype(env, sub, sup, allow_raw, depth),
        BindingKind::Class | BindingKind::Generic | BindingKind::Parameterized | BindingKind::Raw => {
            declared_subtype(env, sub, sup, sup_kind, allow_raw, depth)
        }
        BindingKind::Base | BindingKind::Problem => false,
    }
}

fn array_subtype(env: &mut Environment, sub: TypeId, sup: TypeId, allow_raw: bool, depth: u32) -> bool {
    let TypeKind::Array {
        leaf: sub_leaf,
        dimensions: sub_dims,
    } = *env.type_kind(sub)
    else {
        return false;
    };
    match *env.type_kind(sup) {
        TypeKind::Array {
            leaf: sup_leaf,
            dimensions: sup_dims,
        } => {
            if sub_dims == sup_dims {
                if env.kind(sub_leaf) == BindingKind::Base || env.kind(sup_leaf) == BindingKind::Base {
                    return sub_leaf == sup_leaf;
                }
                subtype(env, sub_leaf, sup_leaf, allow_raw, depth + 1)
            } else if sub_dims > sup_dims {
                let component = env.create_array(sub_leaf, sub_dims - sup_dims);
                subtype(env, component, sup_leaf, allow_raw, depth + 1)
            } else {
                false
            }
        }
        _ => {
            let cloneable = env.well_known(WellKnown::Cloneable);
            let serializable = env.well_known(WellKnown::Serializable);
            let target = env.generic_of(sup);
            target == Some(cloneable) || target == Some(serializable)
        }
    }
}

fn declared_subtype(
    env: &mut Environment,
    sub: TypeId,
    sup: TypeId,
    sup_kind: BindingKind,
    allow_raw: bool,
    depth: u32,
) -> bool {
    let Some(declaration) = env.generic_of(sup) else {
        // Type variables and captures are only supertypes of themselves.
        return false;
    };
    let Some(found) = find_super_type_originating_from(env, sub, declaration) else {
        return false;
    };
    match sup_kind {
        BindingKind::Class | BindingKind::Generic | BindingKind::Raw => true,
        BindingKind::Parameterized => match env.kind(found) {
            BindingKind::Parameterized => arguments_contained(env, found, sup, depth),
            // Unchecked conversion.
            BindingKind::Raw | BindingKind::Generic | BindingKind::Class => allow_raw,
            _ => false,
        },
        _ => false,
    }
}

/// Argument-wise containment of two parameterizations of one declaration,
/// enclosing types included.
fn arguments_contained(env: &mut Environment, sub: TypeId, sup: TypeId, depth: u32) -> bool {
    let (Some(sub_data), Some(sup_data)) = (env.parameterized(sub), env.parameterized(sup)) else {
        return false;
    };
    let sub_args = sub_data.arguments.clone();
    let sup_args = sup_data.arguments.clone();
    let enclosings = (sub_data.enclosing, sup_data.enclosing);
    if sub_args.len() != sup_args.len() {
        return false;
    }
    let contained = sup_args
        .iter()
        .zip(&sub_args)
        .all(|(&container, &arg)| type_argument_contains_at(env, container, arg, depth + 1));
    contained
        && match enclosings {
            (Some(a), Some(b)) if env.kind(b) == BindingKind::Parameterized => {
                subtype(env, a, b, false, depth + 1)
            }
            _ => true,
        }
}

/// JLS 4.5.1: whether type argument `container` contains `argument`.
pub fn type_argument_contains(env: &mut Environment, container: TypeId, argument: TypeId) -> bool {
    type_argument_contains_at(env, container, argument, 0)
}

fn type_argument_contains_at(env: &mut Environment, container: TypeId, argument: TypeId, depth: u32) -> bool {
    let container = nullness::unannotated(env, container);
    let argument = nullness::unannotated(env, argument);
    if container == argument {
        return true;
    }
    if depth > MAX_DEPTH {
        return false;
    }
    let Some(outer) = env.wildcard(container).cloned() else {
        return false;
    };
    let inner = env.wildcard(argument).cloned();
    match (outer.kind, outer.bound) {
        (WildcardKind::Unbound, _) | (_, None) => true,
        (WildcardKind::Extends, Some(bound)) => {
            let mut bounds = vec![bound];
            bounds.extend(outer.other_bounds.iter().copied());
            match inner {
                Some(inner) => match (inner.kind, inner.bound) {
                    (WildcardKind::Extends, Some(inner_bound)) => bounds
                        .into_iter()
                        .all(|b| subtype(env, inner_bound, b, false, depth + 1)),
                    _ => env.is_object(bound) && outer.other_bounds.is_empty(),
                },
                None => bounds
                    .into_iter()
                    .all(|b| subtype(env, argument, b, false, depth + 1)),
            }
        }
        (WildcardKind::Super, Some(bound)) => match inner {
            Some(inner) => match (inner.kind, inner.bound) {
                (WildcardKind::Super, Some(inner_bound)) => {
                    subtype(env, bound, inner_bound, false, depth + 1)
                }
                _ => false,
            },
            None => subtype(env, bound, argument, false, depth + 1),
        },
    }
}

/// Equivalence up to raw types and wildcard containment: a raw (or
/// generic) type is equivalent to every parameterization of its
/// declaration; parameterizations are equivalent when this one's
/// arguments contain the other's.
pub fn is_equivalent_to(env: &mut Environment, a: TypeId, b: TypeId) -> bool {
    let a = nullness::unannotated(env, a);
    let b = nullness::unannotated(env, b);
    if a == b {
        return true;
    }
    if env.kind(a) == BindingKind::Wildcard {
        return type_argument_contains(env, a, b);
    }
    let (Some(ga), Some(gb)) = (env.generic_of(a), env.generic_of(b)) else {
        return false;
    };
    if ga != gb {
        return false;
    }
    let (ka, kb) = (env.kind(a), env.kind(b));
    if matches!(ka, BindingKind::Raw | BindingKind::Generic)
        || matches!(kb, BindingKind::Raw | BindingKind::Generic)
    {
        return true;
    }
    if ka != BindingKind::Parameterized || kb != BindingKind::Parameterized {
        return false;
    }
    let (Some(da), Some(db)) = (env.parameterized(a), env.parameterized(b)) else {
        return false;
    };
    let pairs: Vec<_> = da
        .arguments
        .iter()
        .copied()
        .zip(db.arguments.iter().copied())
        .collect();
    let same_len = da.arguments.len() == db.arguments.len();
    let enclosings = (da.enclosing, db.enclosing);
    same_len
        && pairs
            .into_iter()
            .all(|(x, y)| type_argument_contains(env, x, y))
        && match enclosings {
            (Some(x), Some(y)) => is_equivalent_to(env, x, y),
            (None, None) => true,
            _ => false,
        }
}

/// A type mentioning no type variables, wildcards or captures, whose
/// erasure is itself modulo raw conversion.
pub fn is_reifiable(env: &mut Environment, ty: TypeId) -> bool {
    match env.kind(ty) {
        BindingKind::Base | BindingKind::Class | BindingKind::Raw | BindingKind::Generic => true,
        BindingKind::Array => match *env.type_kind(ty) {
            TypeKind::Array { leaf, .. } => is_reifiable(env, leaf),
            _ => false,
        },
        BindingKind::Parameterized => {
            let args = env
                .parameterized(ty)
                .map(|d| d.arguments.clone())
                .unwrap_or_default();
            args.iter().all(|&arg| {
                env.wildcard(arg)
                    .is_some_and(|w| w.kind == WildcardKind::Unbound)
            })
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::CompilerOptions;
    use nova_decl::MinimalJdk;

    fn env() -> Environment {
        Environment::new(CompilerOptions::default(), MinimalJdk::new()).unwrap()
    }

    #[test]
    fn erasure_is_idempotent() {
        let mut env = env();
        let list = env.get_type("java.util.List").unwrap();
        let string = env.well_known(WellKnown::String);
        let list_of_string = env.create_parameterized_type(list, vec![string], None);
        let array = env.create_array(list_of_string, 2);

        let erased = erasure(&mut env, array);
        assert_eq!(erased, env.create_array(list, 2));
        assert_eq!(erasure(&mut env, erased), erased);

        let e = env.class(list).unwrap().type_variables[0];
        let object = env.object();
        assert_eq!(erasure(&mut env, e), object);
    }

    #[test]
    fn enum_type_variable_erases_to_its_bound() {
        let mut env = env();
        let enum_ = env.well_known(WellKnown::Enum);
        let e = env.class(enum_).unwrap().type_variables[0];
        assert_eq!(erasure(&mut env, e), enum_);
    }

    #[test]
    fn finds_parameterized_supertype() {
        let mut env = env();
        let array_list = env.get_type("java.util.ArrayList").unwrap();
        let collection = env.get_type("java.util.Collection").unwrap();
        let string = env.well_known(WellKnown::String);
        let list_of_string = env.create_parameterized_type(array_list, vec![string], None);

        let found = find_super_type_originating_from(&mut env, list_of_string, collection).unwrap();
        assert_eq!(found, env.create_parameterized_type(collection, vec![string], None));
    }

    #[test]
    fn arrays_are_cloneable_and_serializable() {
        let mut env = env();
        let int = env.base(BaseType::Int);
        let ints = env.create_array(int, 1);
        let cloneable = env.well_known(WellKnown::Cloneable);
        let serializable = env.well_known(WellKnown::Serializable);
        let object = env.object();
        assert!(is_subtype_of(&mut env, ints, cloneable));
        assert!(is_subtype_of(&mut env, ints, serializable));
        assert!(is_subtype_of(&mut env, ints, object));

        let string = env.well_known(WellKnown::String);
        let strings = env.create_array(string, 1);
        let objects = env.create_array(object, 1);
        assert!(is_subtype_of(&mut env, strings, objects));
        assert!(!is_subtype_of(&mut env, ints, objects));
    }

    #[test]
    fn wildcard_containment() {
        let mut env = env();
        let list = env.get_type("java.util.List").unwrap();
        let integer = env.well_known(WellKnown::Integer);
        let number = env.get_type("java.lang.Number").unwrap();
        let extends_number =
            env.create_wildcard(Some(list), 0, WildcardKind::Extends, Some(number), vec![]);
        let list_of_integer = env.create_parameterized_type(list, vec![integer], None);
        let list_of_number = env.create_parameterized_type(list, vec![number], None);
        let list_extends_number = env.create_parameterized_type(list, vec![extends_number], None);

        assert!(is_subtype_of(&mut env, list_of_integer, list_extends_number));
        assert!(!is_subtype_of(&mut env, list_of_integer, list_of_number));

        let raw = env.create_raw_type(list, None);
        assert!(!is_subtype_of(&mut env, raw, list_of_number));
        assert!(is_compatible_with(&mut env, raw, list_of_number));
        assert!(is_subtype_of(&mut env, list_of_number, raw));
        assert!(is_equivalent_to(&mut env, raw, list_of_number));
        assert!(is_equivalent_to(&mut env, list_extends_number, list_of_integer));
        assert!(!is_equivalent_to(&mut env, list_of_integer, list_extends_number));
    }

    #[test]
    fn boxing_compatibility() {
        let mut env = env();
        let int = env.base(BaseType::Int);
        let long = env.base(BaseType::Long);
        let integer = env.well_known(WellKnown::Integer);
        let number = env.get_type("java.lang.Number").unwrap();

        assert!(is_compatible_with(&mut env, int, long));
        assert!(!is_compatible_with(&mut env, int, integer));
        assert!(is_boxing_compatible_with(&mut env, int, integer));
        assert!(is_boxing_compatible_with(&mut env, int, number));
        assert!(is_boxing_compatible_with(&mut env, integer, long));
        assert_eq!(unboxed(&mut env, integer), Some(BaseType::Int));
        assert_eq!(boxed(&mut env, int), integer);
    }
}
