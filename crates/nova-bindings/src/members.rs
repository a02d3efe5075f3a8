//! Members and supertypes of parameterized and raw types.
//!
//! A parameterized type owns no declarations. Its members are the generic
//! declaration's members with the substitution applied, created on first
//! request and interned per `(original, owner)` so repeated lookups agree
//! on identity. Static members are shared with the declaration.

use crate::binding::{Declarer, FieldData, FieldKind, Hierarchy, MethodData, MethodKind, TypeVariableBounds};
use crate::env::Environment;
use crate::hierarchy::{convert_to_raw, erasure};
use crate::ids::{FieldId, MethodId, TypeId};
use crate::subst::{substitute, substitute_all, ChainedSubstitution, MapSubstitution, Substitution, TypeSubstitution};

pub(crate) fn parameterized_hierarchy(env: &mut Environment, ty: TypeId) -> Hierarchy {
    let Some(substitution) = TypeSubstitution::new(env, ty) else {
        return Hierarchy::default();
    };
    let Some(generic) = env.generic_of(ty) else {
        return Hierarchy::default();
    };
    let declared = env.hierarchy(generic);
    Hierarchy {
        superclass: declared
            .superclass
            .map(|sc| substitute(env, &substitution, sc)),
        superinterfaces: substitute_all(env, &substitution, &declared.superinterfaces),
    }
}

pub(crate) fn parameterized_fields(env: &mut Environment, ty: TypeId) -> Vec<FieldId> {
    if let Some(fields) = env.parameterized(ty).and_then(|data| data.fields.get()) {
        return fields.clone();
    }
    if !env
        .parameterized_mut(ty)
        .is_some_and(|data| data.fields.start())
    {
        return Vec::new();
    }
    let (Some(generic), Some(substitution)) = (env.generic_of(ty), TypeSubstitution::new(env, ty)) else {
        return Vec::new();
    };
    let originals = env.fields(generic);
    let fields: Vec<FieldId> = originals
        .into_iter()
        .map(|field| parameterized_field(env, field, ty, &substitution))
        .collect();
    env.finish_parameterized_fields(ty, fields.clone());
    fields
}

fn parameterized_field(
    env: &mut Environment,
    original: FieldId,
    owner: TypeId,
    substitution: &TypeSubstitution,
) -> FieldId {
    if env.field(original).is_static() {
        return original;
    }
    if let Some(id) = env.interned_parameterized_field(original, owner) {
        return id;
    }
    let data = env.field(original).clone();
    let ty = if substitution.is_raw_substitution() {
        raw_member_type(env, data.ty)
    } else {
        substitute(env, substitution, data.ty)
    };
    let id = env.create_field(FieldData {
        ty,
        declaring_class: Some(owner),
        kind: FieldKind::Parameterized { original },
        ..data
    });
    env.intern_parameterized_field(original, owner, id);
    id
}

pub(crate) fn parameterized_methods(env: &mut Environment, ty: TypeId) -> Vec<MethodId> {
    if let Some(methods) = env.parameterized(ty).and_then(|data| data.methods.get()) {
        return methods.clone();
    }
    if !env
        .parameterized_mut(ty)
        .is_some_and(|data| data.methods.start())
    {
        return Vec::new();
    }
    let (Some(generic), Some(substitution)) = (env.generic_of(ty), TypeSubstitution::new(env, ty)) else {
        return Vec::new();
    };
    let originals = env.methods(generic);
    let methods: Vec<MethodId> = originals
        .into_iter()
        .map(|method| parameterized_method(env, method, ty, &substitution))
        .collect();
    env.finish_parameterized_methods(ty, methods.clone());
    methods
}

/// JLS 4.8: the type of a member of a raw type is its erasure.
fn raw_member_type(env: &mut Environment, ty: TypeId) -> TypeId {
    let erased = erasure(env, ty);
    convert_to_raw(env, erased)
}

fn parameterized_method(
    env: &mut Environment,
    original: MethodId,
    owner: TypeId,
    substitution: &TypeSubstitution,
) -> MethodId {
    if env.method(original).is_static() {
        return original;
    }
    if let Some(id) = env.interned_parameterized_method(original, owner) {
        return id;
    }
    let data = env.method(original).clone();
    let id = env.create_method(MethodData {
        declaring_class: owner,
        kind: MethodKind::Parameterized { original },
        ..data.clone()
    });
    env.intern_parameterized_method(original, owner, id);

    let (type_variables, parameters, return_type, thrown) = if substitution.is_raw_substitution() {
        // Members of raw types lose their own type parameters too.
        let parameters = data
            .parameters
            .iter()
            .map(|&p| raw_member_type(env, p))
            .collect();
        let return_type = raw_member_type(env, data.return_type);
        let thrown = data.thrown.iter().map(|&t| raw_member_type(env, t)).collect();
        (Vec::new(), parameters, return_type, thrown)
    } else if data.is_generic() {
        // Bounds may mention the owner's variables, so the method's own
        // variables are renamed onto fresh ones declared by the copy.
        let fresh: Vec<TypeId> = data
            .type_variables
            .iter()
            .enumerate()
            .map(|(rank, &var)| {
                let name = env
                    .type_variable(var)
                    .map(|v| v.name.clone())
                    .unwrap_or_default();
                env.create_type_variable(&name, rank as u32, Declarer::Method(id))
            })
            .collect();
        let chained = ChainedSubstitution {
            map: MapSubstitution::new(&data.type_variables, &fresh),
            fallback: substitution,
        };
        for (&var, &copy) in data.type_variables.iter().zip(&fresh) {
            let bounds = env.type_variable_bounds(var);
            let substituted = TypeVariableBounds {
                superclass: bounds.superclass.map(|b| substitute(env, &chained, b)),
                superinterfaces: substitute_all(env, &chained, &bounds.superinterfaces),
                first_bound: bounds.first_bound.map(|b| substitute(env, &chained, b)),
            };
            env.set_type_variable_bounds(copy, substituted);
        }
        let parameters = substitute_all(env, &chained, &data.parameters);
        let return_type = substitute(env, &chained, data.return_type);
        let thrown = substitute_all(env, &chained, &data.thrown);
        (fresh, parameters, return_type, thrown)
    } else {
        let parameters = substitute_all(env, substitution, &data.parameters);
        let return_type = substitute(env, substitution, data.return_type);
        let thrown = substitute_all(env, substitution, &data.thrown);
        (Vec::new(), parameters, return_type, thrown)
    };

    let method = env.method_mut(id);
    method.type_variables = type_variables;
    method.parameters = parameters;
    method.return_type = return_type;
    method.thrown = thrown;
    id
}

/// A generic method applied to type arguments, or its raw invocation
/// (`raw`), which erases the signature. Equal requests share one id.
pub fn create_parameterized_generic_method(
    env: &mut Environment,
    method: MethodId,
    type_arguments: Vec<TypeId>,
    raw: bool,
    inferred: bool,
) -> MethodId {
    let key = (method, type_arguments, raw);
    if let Some(id) = env.interned_generic_method(&key) {
        return id;
    }
    let (method, type_arguments, raw) = key;
    let data = env.method(method).clone();

    let (parameters, return_type, thrown) = if raw {
        let parameters = data
            .parameters
            .iter()
            .map(|&p| raw_member_type(env, p))
            .collect();
        let return_type = raw_member_type(env, data.return_type);
        let thrown = data.thrown.iter().map(|&t| raw_member_type(env, t)).collect();
        (parameters, return_type, thrown)
    } else {
        let static_context = data
            .is_static()
            .then(|| env.generic_of(data.declaring_class))
            .flatten();
        let substitution = MapSubstitution::new(&data.type_variables, &type_arguments)
            .with_static_context(static_context);
        (
            substitute_all(env, &substitution, &data.parameters),
            substitute(env, &substitution, data.return_type),
            substitute_all(env, &substitution, &data.thrown),
        )
    };

    let id = env.create_method(MethodData {
        type_variables: Vec::new(),
        parameters,
        return_type,
        thrown,
        kind: MethodKind::ParameterizedGeneric {
            original: method,
            type_arguments: type_arguments.clone(),
            is_raw: raw,
            inferred,
        },
        ..data
    });
    env.intern_generic_method((method, type_arguments, raw), id);
    id
}

/// Copy of `method` throwing `thrown`, used when several inherited
/// abstract methods merge into one.
pub fn create_most_specific_exceptions_method(
    env: &mut Environment,
    method: MethodId,
    thrown: Vec<TypeId>,
) -> MethodId {
    let data = env.method(method).clone();
    env.create_method(MethodData {
        thrown,
        kind: MethodKind::MostSpecificExceptions { original: method },
        ..data
    })
}

/// The declared method a parameterized, generic-applied or merged method
/// was derived from. Declared methods return themselves.
pub fn original_method(env: &Environment, method: MethodId) -> MethodId {
    let mut current = method;
    loop {
        match &env.method(current).kind {
            MethodKind::Parameterized { original }
            | MethodKind::ParameterizedGeneric { original, .. }
            | MethodKind::MostSpecificExceptions { original } => current = *original,
            _ => return current,
        }
    }
}

pub fn original_field(env: &Environment, field: FieldId) -> FieldId {
    let mut current = field;
    while let FieldKind::Parameterized { original } = &env.field(current).kind {
        current = *original;
    }
    current
}

/// Whether `method` is a member of a raw type or a raw generic invocation.
pub fn is_raw_method(env: &Environment, method: MethodId) -> bool {
    let data = env.method(method);
    match &data.kind {
        MethodKind::ParameterizedGeneric { is_raw, .. } => *is_raw,
        MethodKind::Parameterized { .. } => {
            env.kind(data.declaring_class) == crate::binding::BindingKind::Raw
        }
        _ => false,
    }
}
