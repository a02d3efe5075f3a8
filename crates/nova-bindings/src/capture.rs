//! Capture conversion (JLS 5.1.10).

use nova_decl::Span;

use crate::binding::{BindingKind, CaptureBounds, WildcardKind};
use crate::env::Environment;
use crate::flags::TagBits;
use crate::ids::TypeId;
use crate::lattice::greater_lower_bound;
use crate::subst::{substitute_all, MapSubstitution};

/// Captures the wildcard arguments of a parameterized type. Other types are
/// returned unchanged. Capturing the same type at the same position twice
/// yields the same captured type.
pub fn capture(env: &mut Environment, ty: TypeId, position: Span) -> TypeId {
    if env.kind(ty) != BindingKind::Parameterized
        || !env.tag_bits(ty).contains(TagBits::HAS_WILDCARD)
    {
        return ty;
    }
    let Some(data) = env.parameterized(ty) else {
        return ty;
    };
    let (generic, arguments, enclosing) = (data.generic, data.arguments.clone(), data.enclosing);
    let captured_enclosing = enclosing.map(|outer| capture(env, outer, position));

    let mut captured_arguments = arguments.clone();
    let mut captures = Vec::new();
    for (rank, &arg) in arguments.iter().enumerate() {
        if env.kind(arg) == BindingKind::Wildcard {
            let cap = env.create_capture(arg, ty, position, rank as u32);
            captured_arguments[rank] = cap;
            captures.push((rank, cap, arg));
        }
    }
    if captures.is_empty() && captured_enclosing == enclosing {
        return ty;
    }
    let captured = env.create_parameterized_type(generic, captured_arguments.clone(), captured_enclosing);

    let type_variables = env
        .class(generic)
        .map(|class| class.type_variables.clone())
        .unwrap_or_default();
    let substitution = MapSubstitution::new(&type_variables, &captured_arguments);
    for (rank, cap, wildcard) in captures {
        if env.capture_bounds_built(cap) {
            continue;
        }
        let formal = match type_variables.get(rank) {
            Some(&var) => env.type_variable_bounds(var),
            None => Default::default(),
        };
        let upper = substitute_all(env, &substitution, &formal.all());
        let bounds = capture_bounds(env, wildcard, upper);
        env.set_capture_bounds(cap, bounds);
    }
    tracing::trace!(target: "nova.bindings", ty = ?ty, captured = ?captured, "captured");
    captured
}

fn capture_bounds(env: &mut Environment, wildcard: TypeId, formal_upper: Vec<TypeId>) -> CaptureBounds {
    let Some(data) = env.wildcard(wildcard).cloned() else {
        return CaptureBounds::default();
    };
    let (upper, lower_bound) = match (data.kind, data.bound) {
        (WildcardKind::Extends, Some(bound)) => {
            let mut upper = vec![bound];
            upper.extend(data.other_bounds.iter().copied());
            for formal in formal_upper {
                if !upper.contains(&formal) && !env.is_object(formal) {
                    upper.push(formal);
                }
            }
            let upper = greater_lower_bound(env, &upper).unwrap_or_else(|| vec![bound]);
            (upper, None)
        }
        (WildcardKind::Super, Some(bound)) => (formal_upper, Some(bound)),
        _ => (formal_upper, None),
    };

    let first_bound = upper.first().copied();
    let mut superclass = None;
    let mut superinterfaces = Vec::new();
    for bound in upper {
        if env.is_interface(bound) {
            superinterfaces.push(bound);
        } else if superclass.is_none() && !env.is_object(bound) {
            superclass = Some(bound);
        }
    }
    CaptureBounds {
        superclass,
        superinterfaces,
        first_bound,
        lower_bound,
    }
}

/// Reverses capture: captured arguments go back to their wildcards.
pub fn uncapture(env: &mut Environment, ty: TypeId) -> TypeId {
    if let Some(wildcard) = env.capture(ty).map(|data| data.wildcard) {
        return wildcard;
    }
    if !env.tag_bits(ty).contains(TagBits::HAS_CAPTURE) {
        return ty;
    }
    let Some(data) = env.parameterized(ty) else {
        return ty;
    };
    let (generic, arguments, enclosing) = (data.generic, data.arguments.clone(), data.enclosing);
    let restored: Vec<TypeId> = arguments
        .iter()
        .map(|&arg| env.capture(arg).map_or(arg, |data| data.wildcard))
        .collect();
    let enclosing = enclosing.map(|outer| uncapture(env, outer));
    env.create_parameterized_type(generic, restored, enclosing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::WellKnown;
    use crate::hierarchy::{erasure, is_subtype_of};
    use crate::options::CompilerOptions;
    use nova_decl::MinimalJdk;

    #[test]
    fn captures_are_interned_per_position() {
        let mut env = Environment::new(CompilerOptions::default(), MinimalJdk::new()).unwrap();
        let list = env.get_type("java.util.List").unwrap();
        let number = env.get_type("java.lang.Number").unwrap();
        let wildcard = env.create_wildcard(Some(list), 0, WildcardKind::Extends, Some(number), vec![]);
        let list_of_wildcard = env.create_parameterized_type(list, vec![wildcard], None);

        let here = Span::new(10, 20);
        let there = Span::new(30, 40);
        let a = capture(&mut env, list_of_wildcard, here);
        assert_eq!(capture(&mut env, list_of_wildcard, here), a);
        let b = capture(&mut env, list_of_wildcard, there);
        assert_ne!(a, b);

        let cap = env.parameterized(a).unwrap().arguments[0];
        assert_eq!(env.kind(cap), BindingKind::Capture);
        assert_eq!(erasure(&mut env, cap), number);
        let integer = env.well_known(WellKnown::Integer);
        assert!(is_subtype_of(&mut env, cap, number));
        assert!(!is_subtype_of(&mut env, integer, cap));
        assert_eq!(uncapture(&mut env, a), list_of_wildcard);
    }

    #[test]
    fn super_wildcards_get_a_lower_bound() {
        let mut env = Environment::new(CompilerOptions::default(), MinimalJdk::new()).unwrap();
        let list = env.get_type("java.util.List").unwrap();
        let integer = env.well_known(WellKnown::Integer);
        let wildcard = env.create_wildcard(Some(list), 0, WildcardKind::Super, Some(integer), vec![]);
        let ty = env.create_parameterized_type(list, vec![wildcard], None);
        let captured = capture(&mut env, ty, Span::new(0, 1));
        let cap = env.parameterized(captured).unwrap().arguments[0];
        assert_eq!(env.capture_bounds(cap).lower_bound, Some(integer));
        assert!(is_subtype_of(&mut env, integer, cap));
    }

    #[test]
    fn types_without_wildcards_are_not_captured() {
        let mut env = Environment::new(CompilerOptions::default(), MinimalJdk::new()).unwrap();
        let list = env.get_type("java.util.List").unwrap();
        let string = env.well_known(WellKnown::String);
        let ty = env.create_parameterized_type(list, vec![string], None);
        assert_eq!(capture(&mut env, ty, Span::new(0, 1)), ty);
    }
}
