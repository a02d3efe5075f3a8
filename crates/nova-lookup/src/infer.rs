//! Type argument inference for generic method invocations.
//!
//! Each type variable of the method gets an inference variable. Argument
//! types are reduced against the formals into equal, lower and upper
//! bounds; the expected type of the invocation contributes upper bounds on
//! the return type. Variables are then resolved from their equal bound,
//! else the lub of their lower bounds, else the glb of their upper bounds,
//! else their declared bound.

use nova_bindings::{
    boxed, convert_to_raw, erasure, find_super_type_originating_from, greater_lower_bound,
    is_boxing_compatible_with, is_compatible_with, lower_upper_bound, substitute, substitute_all,
    BaseType, BindingKind, Environment, MapSubstitution, MethodId, TagBits, TypeId, TypeKind, WildcardKind,
};

const MAX_DEPTH: u32 = 32;

#[derive(Debug, Clone, Default)]
struct VariableBounds {
    equal: Vec<TypeId>,
    lower: Vec<TypeId>,
    upper: Vec<TypeId>,
}

fn push_unique(list: &mut Vec<TypeId>, ty: TypeId) {
    if !list.contains(&ty) {
        list.push(ty);
    }
}

pub(crate) struct InferenceContext {
    site: u32,
    type_variables: Vec<TypeId>,
    variables: Vec<TypeId>,
    bounds: Vec<VariableBounds>,
}

impl InferenceContext {
    pub(crate) fn new(env: &mut Environment, method: MethodId) -> Self {
        let type_variables = env.method(method).type_variables.clone();
        let site = env.next_inference_site();
        let variables = type_variables
            .iter()
            .enumerate()
            .map(|(rank, &var)| env.create_inference_variable(var, rank as u32, site))
            .collect();
        Self {
            site,
            bounds: vec![VariableBounds::default(); type_variables.len()],
            type_variables,
            variables,
        }
    }

    /// Formal types with the method's type variables replaced by inference
    /// variables.
    pub(crate) fn instantiate(&self, env: &mut Environment, types: &[TypeId]) -> Vec<TypeId> {
        let substitution = MapSubstitution::new(&self.type_variables, &self.variables);
        substitute_all(env, &substitution, types)
    }

    fn variable(&self, env: &Environment, ty: TypeId) -> Option<usize> {
        match env.type_kind(ty) {
            TypeKind::InferenceVariable(data) if data.site == self.site => Some(data.rank as usize),
            _ => None,
        }
    }

    fn mentions_variables(env: &Environment, ty: TypeId) -> bool {
        env.tag_bits(ty).contains(TagBits::HAS_INFERENCE_VARIABLE)
    }

    /// `argument` is passed where `formal` (instantiated) is expected.
    pub(crate) fn add_argument(&mut self, env: &mut Environment, argument: TypeId, formal: TypeId) {
        self.reduce_subtype(env, argument, formal, 0);
    }

    /// The invocation's value is assigned to `expected`.
    pub(crate) fn add_expected(&mut self, env: &mut Environment, return_type: TypeId, expected: TypeId) {
        if env.base_type(expected).is_some() || env.base_type(return_type).is_some() {
            return;
        }
        self.reduce_subtype(env, return_type, expected, 0);
    }

    fn reduce_subtype(&mut self, env: &mut Environment, sub: TypeId, sup: TypeId, depth: u32) {
        if depth > MAX_DEPTH || sub == sup {
            return;
        }
        if let Some(index) = self.variable(env, sub) {
            if self.variable(env, sup).is_none() {
                push_unique(&mut self.bounds[index].upper, sup);
            }
            return;
        }
        if let Some(index) = self.variable(env, sup) {
            let sub = match env.base_type(sub) {
                Some(BaseType::Null) => return,
                Some(_) => boxed(env, sub),
                None => sub,
            };
            push_unique(&mut self.bounds[index].lower, sub);
            return;
        }
        if !Self::mentions_variables(env, sup) && !Self::mentions_variables(env, sub) {
            return;
        }
        let sub = if env.base_type(sub).is_some() { boxed(env, sub) } else { sub };

        match (env.type_kind(sub).clone(), env.type_kind(sup).clone()) {
            (
                TypeKind::Array { leaf: sub_leaf, dimensions: sub_dims },
                TypeKind::Array { leaf: sup_leaf, dimensions: sup_dims },
            ) => {
                let sub_element = element_type(env, sub_leaf, sub_dims);
                let sup_element = element_type(env, sup_leaf, sup_dims);
                if env.base_type(sub_element).is_none() {
                    self.reduce_subtype(env, sub_element, sup_element, depth + 1);
                }
            }
            (_, TypeKind::Parameterized(data)) => {
                let Some(supertype) = find_super_type_originating_from(env, sub, data.generic) else {
                    return;
                };
                let Some(found) = env.parameterized(supertype) else {
                    return;
                };
                if env.kind(supertype) == BindingKind::Raw {
                    return;
                }
                let arguments = found.arguments.clone();
                for (&argument, &formal) in arguments.iter().zip(&data.arguments) {
                    self.reduce_contained(env, argument, formal, depth + 1);
                }
            }
            _ => {}
        }
    }

    /// `argument` is contained by the type argument `formal`.
    fn reduce_contained(&mut self, env: &mut Environment, argument: TypeId, formal: TypeId, depth: u32) {
        let argument_wildcard = env.wildcard(argument).cloned();
        match env.wildcard(formal).cloned() {
            Some(wildcard) => match (wildcard.kind, wildcard.bound) {
                (WildcardKind::Extends, Some(bound)) => match argument_wildcard {
                    Some(inner) if inner.kind == WildcardKind::Extends => {
                        if let Some(inner_bound) = inner.bound {
                            self.reduce_subtype(env, inner_bound, bound, depth + 1);
                        }
                    }
                    Some(_) => {}
                    None => self.reduce_subtype(env, argument, bound, depth + 1),
                },
                (WildcardKind::Super, Some(bound)) => match argument_wildcard {
                    Some(inner) if inner.kind == WildcardKind::Super => {
                        if let Some(inner_bound) = inner.bound {
                            self.reduce_subtype(env, bound, inner_bound, depth + 1);
                        }
                    }
                    Some(_) => {}
                    None => self.reduce_subtype(env, bound, argument, depth + 1),
                },
                _ => {}
            },
            None => {
                if argument_wildcard.is_none() {
                    self.reduce_equal(env, argument, formal, depth + 1);
                }
            }
        }
    }

    fn reduce_equal(&mut self, env: &mut Environment, a: TypeId, b: TypeId, depth: u32) {
        if depth > MAX_DEPTH || a == b {
            return;
        }
        match (self.variable(env, a), self.variable(env, b)) {
            (Some(_), Some(_)) => return,
            (Some(index), None) => {
                push_unique(&mut self.bounds[index].equal, b);
                return;
            }
            (None, Some(index)) => {
                push_unique(&mut self.bounds[index].equal, a);
                return;
            }
            (None, None) => {}
        }
        match (env.type_kind(a).clone(), env.type_kind(b).clone()) {
            (TypeKind::Parameterized(left), TypeKind::Parameterized(right)) if left.generic == right.generic => {
                for (&x, &y) in left.arguments.iter().zip(&right.arguments) {
                    match (env.wildcard(x).cloned(), env.wildcard(y).cloned()) {
                        (Some(wx), Some(wy)) if wx.kind == wy.kind => {
                            if let (Some(bx), Some(by)) = (wx.bound, wy.bound) {
                                self.reduce_equal(env, bx, by, depth + 1);
                            }
                        }
                        (None, None) => self.reduce_equal(env, x, y, depth + 1),
                        _ => {}
                    }
                }
            }
            (
                TypeKind::Array { leaf: la, dimensions: da },
                TypeKind::Array { leaf: lb, dimensions: db },
            ) => {
                let ea = element_type(env, la, da);
                let eb = element_type(env, lb, db);
                self.reduce_equal(env, ea, eb, depth + 1);
            }
            _ => {}
        }
    }

    /// Resolves every variable. `None` when the bounds are contradictory or
    /// a declared bound is violated.
    pub(crate) fn resolve(&self, env: &mut Environment) -> Option<Vec<TypeId>> {
        let object = env.object();
        let mut resolved: Vec<Option<TypeId>> = vec![None; self.variables.len()];

        for (index, bounds) in self.bounds.iter().enumerate() {
            let equal = bounds
                .equal
                .iter()
                .copied()
                .find(|&ty| !Self::mentions_variables(env, ty));
            resolved[index] = if let Some(equal) = equal {
                Some(equal)
            } else if !bounds.lower.is_empty() {
                Some(lower_upper_bound(env, &bounds.lower).unwrap_or(object))
            } else if !bounds.upper.is_empty() {
                let upper: Vec<TypeId> = bounds
                    .upper
                    .iter()
                    .copied()
                    .filter(|&ty| !Self::mentions_variables(env, ty))
                    .collect();
                match greater_lower_bound(env, &upper) {
                    Some(parts) if !parts.is_empty() => Some(env.create_intersection(parts)),
                    Some(_) => None,
                    None => return None,
                }
            } else {
                None
            };
        }

        // Unconstrained variables take their declared bound, raw when it
        // refers back to the method's own variables.
        for index in 0..resolved.len() {
            if resolved[index].is_some() {
                continue;
            }
            let var = self.type_variables[index];
            let bound = env.type_variable_bounds(var).first_bound;
            resolved[index] = Some(match bound {
                None => object,
                Some(bound) if env.tag_bits(bound).contains(TagBits::HAS_TYPE_VARIABLE) => {
                    let erased = erasure(env, bound);
                    convert_to_raw(env, erased)
                }
                Some(bound) => bound,
            });
        }
        let mut results: Vec<TypeId> = resolved.into_iter().map(|ty| ty.unwrap_or(object)).collect();

        // Results may still mention other variables through equal bounds.
        let to_results = MapSubstitution::new(&self.variables, &results);
        results = substitute_all(env, &to_results, &results);

        let to_results = MapSubstitution::new(&self.variables, &results);
        let declared = MapSubstitution::new(&self.type_variables, &results);
        for (index, bounds) in self.bounds.iter().enumerate() {
            let result = results[index];
            for &lower in &bounds.lower {
                let lower = substitute(env, &to_results, lower);
                if !is_boxing_compatible_with(env, lower, result) {
                    tracing::trace!(target: "nova.lookup", index, "inferred argument below its lower bound");
                    return None;
                }
            }
            for &upper in &bounds.upper {
                let upper = substitute(env, &to_results, upper);
                if !is_compatible_with(env, result, upper) {
                    tracing::trace!(target: "nova.lookup", index, "inferred argument above its upper bound");
                    return None;
                }
            }
            for bound in env.type_variable_bounds(self.type_variables[index]).all() {
                let bound = substitute(env, &declared, bound);
                if !env.is_object(bound) && !is_compatible_with(env, result, bound) {
                    tracing::trace!(target: "nova.lookup", index, "inferred argument violates declared bound");
                    return None;
                }
            }
        }
        Some(results)
    }
}

fn element_type(env: &mut Environment, leaf: TypeId, dimensions: u32) -> TypeId {
    if dimensions > 1 {
        env.create_array(leaf, dimensions - 1)
    } else {
        leaf
    }
}
