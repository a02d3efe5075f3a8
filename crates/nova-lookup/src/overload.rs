//! Overload resolution (JLS 15.12.2).
//!
//! Candidates are tested in three phases of increasing looseness. Only the
//! candidates applicable in the strictest phase that has any survive; among
//! those the most specific one is chosen.

use nova_bindings::{
    create_most_specific_exceptions_method, create_parameterized_generic_method, is_boxing_compatible_with,
    is_compatible_with, is_subtype_of, original_method, substitute, Environment, MapSubstitution,
    MethodId, ProblemReason, TagBits, TypeId, TypeKind,
};

use crate::infer::InferenceContext;
use crate::method_lookup::InvocationSite;
use crate::visibility::{can_method_be_seen_by, can_type_be_seen_by, AccessContext};

/// How much conversion an invocation needs. Ordered strictest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Applicability {
    /// Identity, widening and unchecked conversions only.
    Strict,
    /// Boxing and unboxing allowed.
    Loose,
    /// The trailing array parameter absorbs the remaining arguments.
    Varargs,
}

/// Outcome of choosing among the candidates of one selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Overload {
    Found(MethodId),
    Problem {
        reason: ProblemReason,
        closest_match: Option<MethodId>,
    },
}

fn element_type(env: &mut Environment, array: TypeId) -> Option<TypeId> {
    match env.type_kind(array) {
        TypeKind::Array { leaf, dimensions } => {
            let (leaf, dimensions) = (*leaf, *dimensions);
            Some(if dimensions > 1 {
                env.create_array(leaf, dimensions - 1)
            } else {
                leaf
            })
        }
        _ => None,
    }
}

fn compatible(env: &mut Environment, argument: TypeId, parameter: TypeId, phase: Applicability) -> bool {
    match phase {
        Applicability::Strict => is_compatible_with(env, argument, parameter),
        Applicability::Loose | Applicability::Varargs => is_boxing_compatible_with(env, argument, parameter),
    }
}

/// Parameter types of a varargs method expanded to `count` positions.
fn expanded_parameters(env: &mut Environment, method: MethodId, count: usize) -> Option<Vec<TypeId>> {
    let parameters = env.method(method).parameters.clone();
    expand(env, &parameters, count)
}

fn expand(env: &mut Environment, parameters: &[TypeId], count: usize) -> Option<Vec<TypeId>> {
    let (last, fixed) = parameters.split_last()?;
    if count < fixed.len() {
        return None;
    }
    let element = element_type(env, *last)?;
    let mut expanded = fixed.to_vec();
    expanded.resize(count, element);
    Some(expanded)
}

/// The strictest phase in which `method` accepts `arguments`.
pub fn applicability(env: &mut Environment, method: MethodId, arguments: &[TypeId]) -> Option<Applicability> {
    let level = env.options().source_level;
    let data = env.method(method);
    let parameters = data.parameters.clone();
    let is_varargs = data.is_varargs() && level.supports_varargs();
    let ignore_missing = data.tag_bits.contains(TagBits::HAS_MISSING_TYPE);

    if parameters.len() == arguments.len() {
        if ignore_missing {
            // Broken signature: accept and let the missing type be reported
            // once, where it is referenced.
            return Some(Applicability::Strict);
        }
        let strict = arguments
            .iter()
            .zip(&parameters)
            .all(|(&arg, &param)| compatible(env, arg, param, Applicability::Strict));
        if strict {
            return Some(Applicability::Strict);
        }
        if level.supports_boxing() {
            let loose = arguments
                .iter()
                .zip(&parameters)
                .all(|(&arg, &param)| compatible(env, arg, param, Applicability::Loose));
            if loose {
                return Some(Applicability::Loose);
            }
        }
    }
    if is_varargs {
        let expanded = expanded_parameters(env, method, arguments.len())?;
        let varargs = arguments
            .iter()
            .zip(&expanded)
            .all(|(&arg, &param)| compatible(env, arg, param, Applicability::Varargs));
        if varargs {
            return Some(Applicability::Varargs);
        }
    }
    None
}

/// Applies explicit type arguments or inferred ones to a generic method.
fn instantiate(env: &mut Environment, method: MethodId, site: &InvocationSite) -> Result<MethodId, ProblemReason> {
    let data = env.method(method).clone();
    if !data.is_generic() {
        // Type arguments to a non-generic method are ignored (JLS 15.12.2.1).
        return Ok(method);
    }

    if !site.type_arguments.is_empty() {
        if site.type_arguments.len() != data.type_variables.len() {
            return Err(ProblemReason::TypeParameterArityMismatch);
        }
        let substitution = MapSubstitution::new(&data.type_variables, &site.type_arguments);
        for (&var, &argument) in data.type_variables.iter().zip(&site.type_arguments) {
            for bound in env.type_variable_bounds(var).all() {
                let bound = substitute(env, &substitution, bound);
                if !env.is_object(bound) && !is_compatible_with(env, argument, bound) {
                    return Err(ProblemReason::ParameterizedMethodTypeMismatch);
                }
            }
        }
        return Ok(create_parameterized_generic_method(
            env,
            method,
            site.type_arguments.clone(),
            false,
            false,
        ));
    }

    let mut inference = InferenceContext::new(env, method);
    let formals = inference.instantiate(env, &data.parameters);
    let by_position = if data.is_varargs() && formals.len() != site.arguments.len() {
        expand(env, &formals, site.arguments.len())
    } else {
        Some(formals)
    };
    let Some(formals) = by_position else {
        return Err(ProblemReason::NotFound);
    };
    for (&argument, &formal) in site.arguments.iter().zip(&formals) {
        inference.add_argument(env, argument, formal);
    }
    if let Some(expected) = site.expected_type {
        let return_type = inference.instantiate(env, &[data.return_type]);
        if let Some(&return_type) = return_type.first() {
            inference.add_expected(env, return_type, expected);
        }
    }
    match inference.resolve(env) {
        Some(arguments) => Ok(create_parameterized_generic_method(env, method, arguments, false, true)),
        None => Err(ProblemReason::ParameterizedMethodTypeMismatch),
    }
}

/// `m1` is at least as specific as `m2` for `count` arguments.
fn more_specific(env: &mut Environment, m1: MethodId, m2: MethodId, phase: Applicability, count: usize) -> bool {
    let (p1, p2) = if phase == Applicability::Varargs {
        let width = count
            .max(env.method(m1).parameters.len())
            .max(env.method(m2).parameters.len());
        match (expanded_parameters(env, m1, width), expanded_parameters(env, m2, width)) {
            (Some(p1), Some(p2)) => (p1, p2),
            _ => return false,
        }
    } else {
        (env.method(m1).parameters.clone(), env.method(m2).parameters.clone())
    };
    p1.len() == p2.len() && p1.iter().zip(&p2).all(|(&a, &b)| is_compatible_with(env, a, b))
}

fn declaring(env: &Environment, method: MethodId) -> TypeId {
    env.method(method).declaring_class
}

/// Breaks a tie between methods with the same signature.
fn break_tie(env: &mut Environment, tied: Vec<MethodId>) -> Overload {
    let concrete: Vec<MethodId> = tied
        .iter()
        .copied()
        .filter(|&m| !env.method(m).is_abstract())
        .collect();
    if let [single] = concrete.as_slice() {
        return Overload::Found(*single);
    }

    let pool = if concrete.is_empty() { tied.clone() } else { concrete };
    // Overriding wins over overridden.
    let mut overriding = Vec::new();
    for &m in &pool {
        let owner = declaring(env, m);
        let overridden = pool.iter().any(|&other| {
            let other_owner = declaring(env, other);
            other != m
                && env.generic_of(other_owner) != env.generic_of(owner)
                && is_subtype_of(env, other_owner, owner)
        });
        if !overridden {
            overriding.push(m);
        }
    }
    let non_bridge: Vec<MethodId> = overriding
        .iter()
        .copied()
        .filter(|&m| !env.method(m).is_bridge())
        .collect();
    let pool = if non_bridge.is_empty() { overriding } else { non_bridge };
    match pool.as_slice() {
        [single] => return Overload::Found(*single),
        [] => {
            return Overload::Problem {
                reason: ProblemReason::Ambiguous,
                closest_match: tied.first().copied(),
            }
        }
        _ => {}
    }

    if pool.iter().all(|&m| env.method(m).is_abstract()) {
        return merge_abstract(env, &pool);
    }
    // Same method seen through several paths.
    let first = original_method(env, pool[0]);
    if pool.iter().all(|&m| original_method(env, m) == first) {
        return Overload::Found(pool[0]);
    }
    Overload::Problem {
        reason: ProblemReason::Ambiguous,
        closest_match: pool.first().copied(),
    }
}

/// Several inherited abstract methods with one signature act as one whose
/// return type is the most specific and whose throws clause allows only
/// what every one of them allows.
fn merge_abstract(env: &mut Environment, pool: &[MethodId]) -> Overload {
    let mut chosen = None;
    for &m in pool {
        let return_type = env.method(m).return_type;
        let substitutable = pool.iter().all(|&other| {
            let other_return = env.method(other).return_type;
            is_compatible_with(env, return_type, other_return)
        });
        if substitutable {
            chosen = Some(m);
            break;
        }
    }
    let Some(chosen) = chosen else {
        return Overload::Problem {
            reason: ProblemReason::Ambiguous,
            closest_match: pool.first().copied(),
        };
    };

    let mut thrown = Vec::new();
    for &m in pool {
        for exception in env.method(m).thrown.clone() {
            let allowed_everywhere = pool.iter().all(|&other| {
                let other_thrown = env.method(other).thrown.clone();
                other_thrown.iter().any(|&t| is_subtype_of(env, exception, t))
            });
            if allowed_everywhere && !thrown.contains(&exception) {
                thrown.push(exception);
            }
        }
    }
    if thrown == env.method(chosen).thrown {
        return Overload::Found(chosen);
    }
    Overload::Found(create_most_specific_exceptions_method(env, chosen, thrown))
}

/// The most specific of several applicable methods.
fn most_specific(env: &mut Environment, applicable: &[MethodId], phase: Applicability, count: usize) -> Overload {
    let mut maximal = Vec::new();
    for &m in applicable {
        let beats_all = applicable
            .iter()
            .all(|&other| other == m || more_specific(env, m, other, phase, count));
        if beats_all {
            maximal.push(m);
        }
    }
    match maximal.len() {
        0 => Overload::Problem {
            reason: ProblemReason::Ambiguous,
            closest_match: applicable.first().copied(),
        },
        1 => Overload::Found(maximal[0]),
        _ => break_tie(env, maximal),
    }
}

/// Chooses among `candidates` (all named alike) for an invocation on
/// `receiver` from `ctx`.
pub(crate) fn resolve_overload(
    env: &mut Environment,
    candidates: &[MethodId],
    receiver: TypeId,
    site: &InvocationSite,
    ctx: &AccessContext,
) -> Overload {
    let mut best_phase: Option<Applicability> = None;
    let mut applicable: Vec<MethodId> = Vec::new();
    let mut closest: Option<(MethodId, ProblemReason)> = None;

    for &candidate in candidates {
        let method = match instantiate(env, candidate, site) {
            Ok(method) => method,
            Err(reason) => {
                if closest.is_none() || reason != ProblemReason::NotFound {
                    closest = Some((candidate, reason));
                }
                continue;
            }
        };
        let Some(phase) = applicability(env, method, &site.arguments) else {
            closest.get_or_insert((candidate, ProblemReason::NotFound));
            continue;
        };
        tracing::trace!(target: "nova.lookup", method = ?method, phase = ?phase, "applicable candidate");
        match best_phase {
            Some(best) if phase > best => {}
            Some(best) if phase == best => applicable.push(method),
            _ => {
                best_phase = Some(phase);
                applicable = vec![method];
            }
        }
    }

    let Some(phase) = best_phase else {
        let (closest_match, reason) = match closest {
            Some((method, reason)) => (Some(method), reason),
            None => (None, ProblemReason::NotFound),
        };
        return Overload::Problem { reason, closest_match };
    };

    let mut visible = Vec::with_capacity(applicable.len());
    for &method in &applicable {
        if can_method_be_seen_by(env, method, receiver, ctx) {
            visible.push(method);
        }
    }
    if visible.is_empty() {
        return Overload::Problem {
            reason: ProblemReason::NotVisible,
            closest_match: applicable.first().copied(),
        };
    }

    let chosen = match visible.as_slice() {
        [single] => Overload::Found(*single),
        _ => most_specific(env, &visible, phase, site.arguments.len()),
    };
    if let Overload::Found(method) = chosen {
        if phase == Applicability::Varargs {
            let last = env.method(method).parameters.last().copied();
            if let Some(element) = last.and_then(|array| element_type(env, array)) {
                if env.base_type(element).is_none() && !can_type_be_seen_by(env, element, ctx) {
                    return Overload::Problem {
                        reason: ProblemReason::VarargsElementTypeNotVisible,
                        closest_match: Some(method),
                    };
                }
            }
        }
    }
    chosen
}

