//! Access control (JLS 6.6).

use nova_bindings::{
    erasure, find_super_type_originating_from, BindingKind, Environment, FieldId, MethodId,
    TypeId, TypeKind,
};
use nova_decl::Modifiers;

use crate::scope::Scope;

/// Where a reference is made from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AccessContext {
    pub package: String,
    /// Innermost type containing the reference; `None` in imports.
    pub ty: Option<TypeId>,
}

impl AccessContext {
    pub fn from_scope(scope: &Scope<'_>) -> Self {
        Self {
            package: scope.package().to_string(),
            ty: scope.enclosing_type(),
        }
    }

    pub fn in_type(env: &Environment, ty: TypeId) -> Self {
        Self {
            package: env
                .declaration(ty)
                .map(|class| class.package.clone())
                .unwrap_or_default(),
            ty: Some(ty),
        }
    }

    pub fn in_package(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            ty: None,
        }
    }
}

fn leaf_type(env: &Environment, ty: TypeId) -> TypeId {
    match env.type_kind(ty) {
        TypeKind::Array { leaf, .. } => *leaf,
        _ => ty,
    }
}

pub fn can_type_be_seen_by(env: &mut Environment, ty: TypeId, ctx: &AccessContext) -> bool {
    let ty = leaf_type(env, ty);
    let Some(declaration) = env.generic_of(ty) else {
        return true;
    };
    let Some(class) = env.class(declaration) else {
        return true;
    };
    let modifiers = class.modifiers;
    let same_package = class.package == ctx.package;
    match class.enclosing {
        None => modifiers.contains(Modifiers::PUBLIC) || same_package,
        Some(enclosing) => can_member_be_seen_by(env, modifiers, enclosing, true, None, ctx),
    }
}

pub fn can_field_be_seen_by(
    env: &mut Environment,
    field: FieldId,
    receiver: TypeId,
    ctx: &AccessContext,
) -> bool {
    let data = env.field(field);
    let Some(declaring) = data.declaring_class else {
        // `length` of arrays.
        return true;
    };
    let (modifiers, is_static) = (data.modifiers, data.is_static());
    can_member_be_seen_by(env, modifiers, declaring, is_static, Some(receiver), ctx)
}

pub fn can_method_be_seen_by(
    env: &mut Environment,
    method: MethodId,
    receiver: TypeId,
    ctx: &AccessContext,
) -> bool {
    let data = env.method(method);
    let (modifiers, declaring) = (data.modifiers, data.declaring_class);
    // `clone()` of an array is public.
    if env.kind(receiver) == BindingKind::Array && data.selector == "clone" {
        return true;
    }
    let unrestricted = data.is_static() || data.is_constructor();
    can_member_be_seen_by(env, modifiers, declaring, unrestricted, Some(receiver), ctx)
}

fn can_member_be_seen_by(
    env: &mut Environment,
    modifiers: Modifiers,
    declaring: TypeId,
    is_static: bool,
    receiver: Option<TypeId>,
    ctx: &AccessContext,
) -> bool {
    if modifiers.contains(Modifiers::PUBLIC) {
        return true;
    }
    let Some(declaration) = env.generic_of(declaring) else {
        return true;
    };
    let package = env
        .class(declaration)
        .map(|class| class.package.clone())
        .unwrap_or_default();

    if modifiers.contains(Modifiers::PRIVATE) {
        return ctx
            .ty
            .is_some_and(|from| env.outermost_type(from) == env.outermost_type(declaration));
    }
    if package == ctx.package {
        return true;
    }
    if !modifiers.contains(Modifiers::PROTECTED) {
        return false;
    }

    // Protected from another package: some type enclosing the reference
    // must be a subclass, and an instance access must go through it.
    let mut current = ctx.ty.and_then(|ty| env.generic_of(ty));
    while let Some(from) = current {
        if find_super_type_originating_from(env, from, declaration).is_some() {
            match receiver {
                None => return true,
                Some(_) if is_static => return true,
                Some(receiver) => {
                    let erased = erasure(env, receiver);
                    if find_super_type_originating_from(env, erased, from).is_some() {
                        return true;
                    }
                }
            }
        }
        current = env.enclosing_type(from);
    }
    false
}
