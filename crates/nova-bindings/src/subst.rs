//! The substitution engine.
//!
//! [`substitute`] rebuilds a type with its type variables replaced. A result
//! that does not change is the *same id*: callers rely on `==` to detect
//! "nothing happened".

use rustc_hash::FxHashMap;

use crate::binding::{BindingKind, Declarer, TypeKind, WildcardData, WildcardKind};
use crate::env::Environment;
use crate::flags::TagBits;
use crate::hierarchy::{convert_to_raw, erasure};
use crate::ids::TypeId;
use crate::lattice::greater_lower_bound;
use crate::nullness::{self, NullAnnotation};

/// A mapping from type variables to types.
pub trait Substitution {
    /// Replacement for `var` (a type variable or inference variable). A
    /// variable the substitution does not know maps to itself.
    fn substitute_type_variable(&self, env: &mut Environment, var: TypeId) -> TypeId;

    /// Raw substitutions turn generic types into raw types instead of
    /// parameterizing them (JLS 4.8).
    fn is_raw_substitution(&self) -> bool {
        false
    }

    /// A generic declaration excluded from implicit parameterization, e.g.
    /// the declaring class of a static method.
    fn static_context(&self) -> Option<TypeId> {
        None
    }
}

/// The substitution performed by a parameterized or raw type: its generic
/// declaration's type variables map to its arguments, the enclosing
/// type's variables are delegated outward.
#[derive(Debug, Clone)]
pub struct TypeSubstitution {
    generic: TypeId,
    arguments: Vec<TypeId>,
    enclosing: Option<TypeId>,
    raw: bool,
    is_static_member: bool,
}

impl TypeSubstitution {
    pub fn new(env: &Environment, ty: TypeId) -> Option<Self> {
        let raw = env.kind(ty) == BindingKind::Raw;
        let data = env.parameterized(ty)?;
        let is_static_member = env.class(data.generic).map_or(true, |c| c.is_static());
        Some(Self {
            generic: data.generic,
            arguments: data.arguments.clone(),
            enclosing: data.enclosing,
            raw,
            is_static_member,
        })
    }
}

impl Substitution for TypeSubstitution {
    fn substitute_type_variable(&self, env: &mut Environment, var: TypeId) -> TypeId {
        let Some(data) = env.type_variable(var) else {
            return var;
        };
        if data.declarer == Declarer::Type(self.generic) {
            if self.raw {
                let erased = erasure(env, var);
                return convert_to_raw(env, erased);
            }
            return self
                .arguments
                .get(data.rank as usize)
                .copied()
                .unwrap_or(var);
        }
        if self.is_static_member {
            return var;
        }
        match self.enclosing.and_then(|outer| TypeSubstitution::new(env, outer)) {
            Some(outer) => outer.substitute_type_variable(env, var),
            None => var,
        }
    }

    fn is_raw_substitution(&self) -> bool {
        self.raw
    }
}

/// Explicit variable-to-type map, used for generic method invocations.
#[derive(Debug, Clone, Default)]
pub struct MapSubstitution {
    map: FxHashMap<TypeId, TypeId>,
    raw: bool,
    static_context: Option<TypeId>,
}

impl MapSubstitution {
    pub fn new(variables: &[TypeId], arguments: &[TypeId]) -> Self {
        Self {
            map: variables.iter().copied().zip(arguments.iter().copied()).collect(),
            raw: false,
            static_context: None,
        }
    }

    pub fn insert(&mut self, var: TypeId, replacement: TypeId) {
        self.map.insert(var, replacement);
    }

    pub fn with_static_context(mut self, context: Option<TypeId>) -> Self {
        self.static_context = context;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Substitution for MapSubstitution {
    fn substitute_type_variable(&self, _env: &mut Environment, var: TypeId) -> TypeId {
        self.map.get(&var).copied().unwrap_or(var)
    }

    fn is_raw_substitution(&self) -> bool {
        self.raw
    }

    fn static_context(&self) -> Option<TypeId> {
        self.static_context
    }
}

/// `map` first, then `fallback`.
pub struct ChainedSubstitution<'a> {
    pub map: MapSubstitution,
    pub fallback: &'a dyn Substitution,
}

impl Substitution for ChainedSubstitution<'_> {
    fn substitute_type_variable(&self, env: &mut Environment, var: TypeId) -> TypeId {
        match self.map.map.get(&var) {
            Some(&replacement) => replacement,
            None => self.fallback.substitute_type_variable(env, var),
        }
    }

    fn is_raw_substitution(&self) -> bool {
        self.fallback.is_raw_substitution()
    }

    fn static_context(&self) -> Option<TypeId> {
        self.map.static_context.or_else(|| self.fallback.static_context())
    }
}

/// The parts of a type substitution needs, copied out of the arena.
enum Shape {
    Variable,
    Annotated(TypeId, NullAnnotation),
    Parameterized {
        generic: TypeId,
        arguments: Vec<TypeId>,
        enclosing: Option<TypeId>,
    },
    Raw {
        generic: TypeId,
        enclosing: Option<TypeId>,
    },
    Array {
        leaf: TypeId,
        dimensions: u32,
    },
    Wildcard(WildcardData),
    Intersection(Vec<TypeId>),
    Declaration {
        type_variables: Vec<TypeId>,
        enclosing: Option<TypeId>,
        is_static: bool,
    },
    Opaque,
}

fn shape(env: &Environment, ty: TypeId) -> Shape {
    match &env.ty(ty).kind {
        TypeKind::TypeVariable(_) | TypeKind::InferenceVariable(_) => Shape::Variable,
        TypeKind::Annotated(data) => Shape::Annotated(data.unannotated, data.annotation),
        TypeKind::Parameterized(data) => Shape::Parameterized {
            generic: data.generic,
            arguments: data.arguments.clone(),
            enclosing: data.enclosing,
        },
        TypeKind::Raw(data) => Shape::Raw {
            generic: data.generic,
            enclosing: data.enclosing,
        },
        TypeKind::Array { leaf, dimensions } => Shape::Array {
            leaf: *leaf,
            dimensions: *dimensions,
        },
        TypeKind::Wildcard(data) => Shape::Wildcard(data.clone()),
        TypeKind::Intersection(parts) => Shape::Intersection(parts.clone()),
        TypeKind::Class(class) => Shape::Declaration {
            type_variables: class.type_variables.clone(),
            enclosing: class.enclosing,
            is_static: class.is_static(),
        },
        TypeKind::Base(_) | TypeKind::Capture(_) | TypeKind::Problem(_) => Shape::Opaque,
    }
}

fn is_static_type(env: &Environment, ty: TypeId) -> bool {
    env.class(ty).map_or(true, |class| class.is_static())
}

/// Applies `substitution` to `ty`.
pub fn substitute(env: &mut Environment, substitution: &dyn Substitution, ty: TypeId) -> TypeId {
    if !env
        .tag_bits(ty)
        .intersects(TagBits::HAS_TYPE_VARIABLE | TagBits::HAS_INFERENCE_VARIABLE)
    {
        return ty;
    }

    match shape(env, ty) {
        Shape::Variable => substitution.substitute_type_variable(env, ty),
        Shape::Annotated(inner, annotation) => {
            let substituted = substitute(env, substitution, inner);
            if substituted == inner {
                ty
            } else if env.kind(inner).is_type_variable_like() {
                nullness::transfer(env, annotation, substituted)
            } else {
                nullness::annotate(env, substituted, annotation)
            }
        }
        Shape::Parameterized {
            generic,
            arguments,
            enclosing,
        } => {
            let substituted_enclosing = enclosing.map(|outer| substitute(env, substitution, outer));
            let enclosing_became_raw = substituted_enclosing != enclosing
                && substituted_enclosing.is_some_and(|outer| env.kind(outer) == BindingKind::Raw);
            // A non-static member of a raw type is raw.
            if substitution.is_raw_substitution()
                || (enclosing_became_raw && !is_static_type(env, generic))
            {
                return env.create_raw_type(generic, substituted_enclosing);
            }
            let substituted_arguments = substitute_all(env, substitution, &arguments);
            if substituted_enclosing == enclosing && substituted_arguments == arguments {
                return ty;
            }
            env.create_parameterized_type(generic, substituted_arguments, substituted_enclosing)
        }
        Shape::Raw { generic, enclosing } => {
            let substituted_enclosing = enclosing.map(|outer| substitute(env, substitution, outer));
            if substituted_enclosing == enclosing {
                return ty;
            }
            env.create_raw_type(generic, substituted_enclosing)
        }
        Shape::Array { leaf, dimensions } => {
            let substituted = substitute(env, substitution, leaf);
            if substituted == leaf {
                return ty;
            }
            env.create_array(substituted, dimensions)
        }
        Shape::Wildcard(data) => substitute_wildcard(env, substitution, ty, data),
        Shape::Intersection(parts) => {
            let substituted = substitute_all(env, substitution, &parts);
            if substituted == parts {
                return ty;
            }
            // Bounds may now subsume one another.
            match greater_lower_bound(env, &substituted) {
                Some(reduced) => env.create_intersection(reduced),
                None => env.create_intersection(substituted),
            }
        }
        Shape::Declaration {
            type_variables,
            enclosing,
            is_static,
        } => substitute_declaration(env, substitution, ty, type_variables, enclosing, is_static),
        Shape::Opaque => ty,
    }
}

pub fn substitute_all(env: &mut Environment, substitution: &dyn Substitution, types: &[TypeId]) -> Vec<TypeId> {
    types
        .iter()
        .map(|&ty| substitute(env, substitution, ty))
        .collect()
}

fn substitute_wildcard(
    env: &mut Environment,
    substitution: &dyn Substitution,
    ty: TypeId,
    data: WildcardData,
) -> TypeId {
    let bound = data.bound.map(|b| substitute(env, substitution, b));
    let other_bounds = substitute_all(env, substitution, &data.other_bounds);
    if bound == data.bound && other_bounds == data.other_bounds {
        return ty;
    }
    let (bound, other_bounds) = match (data.kind, bound) {
        (WildcardKind::Extends, Some(first)) if !other_bounds.is_empty() => {
            let mut all = vec![first];
            all.extend(other_bounds.iter().copied());
            match greater_lower_bound(env, &all) {
                Some(reduced) if !reduced.is_empty() => (Some(reduced[0]), reduced[1..].to_vec()),
                _ => (bound, other_bounds),
            }
        }
        _ => (bound, other_bounds),
    };
    env.create_wildcard(data.generic, data.rank, data.kind, bound, other_bounds)
}

/// A generic declaration (or a non-static member of one) used as a type:
/// it is parameterized by its own, substituted, type variables.
fn substitute_declaration(
    env: &mut Environment,
    substitution: &dyn Substitution,
    ty: TypeId,
    type_variables: Vec<TypeId>,
    enclosing: Option<TypeId>,
    is_static: bool,
) -> TypeId {
    if substitution.static_context() == Some(ty) {
        return ty;
    }
    let substituted_enclosing = match enclosing {
        Some(outer) if !is_static => {
            let substituted = substitute(env, substitution, outer);
            (substituted != outer).then_some(substituted)
        }
        _ => None,
    };
    let enclosing_is_raw =
        substituted_enclosing.is_some_and(|outer| env.kind(outer) == BindingKind::Raw);

    if type_variables.is_empty() {
        return match substituted_enclosing {
            Some(outer) if enclosing_is_raw => env.create_raw_type(ty, Some(outer)),
            Some(outer) if env.kind(outer) == BindingKind::Parameterized => {
                env.create_parameterized_type(ty, Vec::new(), Some(outer))
            }
            _ => ty,
        };
    }
    if substitution.is_raw_substitution() || enclosing_is_raw {
        return env.create_raw_type(ty, substituted_enclosing);
    }
    let arguments = substitute_all(env, substitution, &type_variables);
    if arguments == type_variables && substituted_enclosing.is_none() {
        return ty;
    }
    let enclosing =
        substituted_enclosing.filter(|&outer| env.kind(outer) == BindingKind::Parameterized);
    env.create_parameterized_type(ty, arguments, enclosing)
}
