//! Synthetic members of source types: captured outer locals, enclosing
//! instances, private access methods, enum switch tables, lambda bodies
//! and bridges.
//!
//! Each is created on first request and memoized by what it stands for.
//! Synthetic members stay out of the regular member lists; their names are
//! checked against the declared members and renamed on collision.

use nova_bindings::{
    erasure, original_method, BaseType, Environment, FieldData, FieldId, FieldKind, MethodData,
    MethodId, MethodKind, SyntheticKind, TagBits, TypeId, CONSTRUCTOR_NAME,
};
use nova_decl::{Modifiers, Span};
use rustc_hash::FxHashMap;

use crate::scope::LocalVariable;

/// The private member an access method stands in for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessTarget {
    FieldRead(FieldId),
    FieldWrite(FieldId),
    Method(MethodId),
}

#[derive(Debug, Default)]
struct TypeSynthetics {
    outer_locals: FxHashMap<(String, TypeId, Span), FieldId>,
    enclosing_instances: FxHashMap<TypeId, FieldId>,
    accessors: FxHashMap<AccessTarget, MethodId>,
    switch_tables: FxHashMap<TypeId, (FieldId, MethodId)>,
    bridges: FxHashMap<MethodId, MethodId>,
    lambdas: u32,
    /// Creation order.
    fields: Vec<FieldId>,
    methods: Vec<MethodId>,
}

#[derive(Debug, Default)]
pub struct SyntheticRegistry {
    types: FxHashMap<TypeId, TypeSynthetics>,
}

impl SyntheticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fields(&self, ty: TypeId) -> &[FieldId] {
        self.types.get(&ty).map_or(&[], |synthetics| synthetics.fields.as_slice())
    }

    pub fn methods(&self, ty: TypeId) -> &[MethodId] {
        self.types.get(&ty).map_or(&[], |synthetics| synthetics.methods.as_slice())
    }

    /// `val$name`: copy of an outer local captured by the local or
    /// anonymous type `ty`. Collisions get `$1`, `$2`, ...
    pub fn outer_local_field(&mut self, env: &mut Environment, ty: TypeId, local: &LocalVariable) -> FieldId {
        let key = (local.name.clone(), local.ty, local.span);
        if let Some(&field) = self.types.get(&ty).and_then(|s| s.outer_locals.get(&key)) {
            return field;
        }
        let base = format!("val${}", local.name);
        let mut name = base.clone();
        let mut index = 1;
        while self.field_name_taken(env, ty, &name) {
            name = format!("{base}${index}");
            index += 1;
        }
        let field = self.add_field(
            env,
            ty,
            name,
            local.ty,
            Modifiers::PRIVATE | Modifiers::FINAL,
            SyntheticKind::OuterLocalField,
        );
        self.entry(ty).outer_locals.insert(key, field);
        field
    }

    /// `this$N`, N being the nesting depth of `enclosing`. Collisions get a
    /// trailing `$`.
    pub fn enclosing_instance_field(&mut self, env: &mut Environment, ty: TypeId, enclosing: TypeId) -> FieldId {
        if let Some(&field) = self.types.get(&ty).and_then(|s| s.enclosing_instances.get(&enclosing)) {
            return field;
        }
        let mut depth = 0;
        let mut current = enclosing;
        while let Some(outer) = env.enclosing_type(current) {
            depth += 1;
            current = outer;
        }
        let mut name = format!("this${depth}");
        while self.field_name_taken(env, ty, &name) {
            name.push('$');
        }
        let field = self.add_field(
            env,
            ty,
            name,
            enclosing,
            Modifiers::FINAL,
            SyntheticKind::EnclosingInstanceField,
        );
        self.entry(ty).enclosing_instances.insert(enclosing, field);
        field
    }

    /// Static `access$N` method on the type declaring `target`, letting
    /// nested types reach a private member. Instance targets take the
    /// receiver as first parameter; a constructor target becomes a factory.
    /// `None` for members without a declaring class, like `length` of
    /// arrays.
    pub fn access_method(&mut self, env: &mut Environment, target: AccessTarget) -> Option<MethodId> {
        let owner = match target {
            AccessTarget::FieldRead(field) | AccessTarget::FieldWrite(field) => env.field(field).declaring_class,
            AccessTarget::Method(method) => Some(env.method(method).declaring_class),
        };
        let ty = owner.and_then(|owner| env.generic_of(owner))?;
        if let Some(&method) = self.types.get(&ty).and_then(|s| s.accessors.get(&target)) {
            return Some(method);
        }

        let receiver = erasure(env, ty);
        let (parameters, return_type, thrown) = match target {
            AccessTarget::FieldRead(field) => {
                let data = env.field(field);
                let parameters = if data.is_static() { Vec::new() } else { vec![receiver] };
                (parameters, data.ty, Vec::new())
            }
            AccessTarget::FieldWrite(field) => {
                let data = env.field(field);
                let mut parameters = if data.is_static() { Vec::new() } else { vec![receiver] };
                parameters.push(data.ty);
                (parameters, data.ty, Vec::new())
            }
            AccessTarget::Method(method) => {
                let data = env.method(method);
                if data.is_constructor() {
                    (data.parameters.clone(), receiver, data.thrown.clone())
                } else {
                    let mut parameters = if data.is_static() { Vec::new() } else { vec![receiver] };
                    parameters.extend(data.parameters.iter().copied());
                    (parameters, data.return_type, data.thrown.clone())
                }
            }
        };

        let mut index = self.types.get(&ty).map_or(0, |s| s.accessors.len());
        let mut selector = format!("access${index}");
        while self.method_name_taken(env, ty, &selector) {
            index += 1;
            selector = format!("access${index}");
        }
        let method = self.add_method(
            env,
            ty,
            MethodData {
                selector,
                modifiers: Modifiers::STATIC | Modifiers::SYNTHETIC,
                declaring_class: ty,
                type_variables: Vec::new(),
                parameter_names: (0..parameters.len()).map(|i| format!("arg{i}")).collect(),
                parameters,
                return_type,
                thrown,
                kind: MethodKind::Synthetic(SyntheticKind::PrivateAccess),
                tag_bits: TagBits::empty(),
                span: Span::default(),
            },
        );
        self.entry(ty).accessors.insert(target, method);
        Some(method)
    }

    /// The `$SWITCH_TABLE$<enum>` field and the method that fills it, used
    /// by `ty` to switch over constants of `enum_type`.
    pub fn switch_table(&mut self, env: &mut Environment, ty: TypeId, enum_type: TypeId) -> (FieldId, MethodId) {
        if let Some(&table) = self.types.get(&ty).and_then(|s| s.switch_tables.get(&enum_type)) {
            return table;
        }
        let enum_name = env
            .class(enum_type)
            .map(|class| class.binary_name.replace(['.', '/'], "$"))
            .unwrap_or_default();
        let mut name = format!("$SWITCH_TABLE${enum_name}");
        while self.field_name_taken(env, ty, &name) || self.method_name_taken(env, ty, &name) {
            name.push('$');
        }

        let int = env.base(BaseType::Int);
        let table_type = env.create_array(int, 1);
        let modifiers = Modifiers::PRIVATE | Modifiers::STATIC | Modifiers::SYNTHETIC;
        let field = self.add_field(
            env,
            ty,
            name.clone(),
            table_type,
            modifiers,
            SyntheticKind::SwitchTableField,
        );
        let method = self.add_method(
            env,
            ty,
            MethodData {
                selector: name,
                modifiers,
                declaring_class: ty,
                type_variables: Vec::new(),
                parameters: Vec::new(),
                parameter_names: Vec::new(),
                return_type: table_type,
                thrown: Vec::new(),
                kind: MethodKind::Synthetic(SyntheticKind::SwitchTableMethod),
                tag_bits: TagBits::empty(),
                span: Span::default(),
            },
        );
        self.entry(ty).switch_tables.insert(enum_type, (field, method));
        (field, method)
    }

    /// `lambda$<selector>$N`: body of a lambda written in method
    /// `selector` of `ty`. Every lambda gets its own method.
    pub fn lambda_method(
        &mut self,
        env: &mut Environment,
        ty: TypeId,
        selector: &str,
        parameters: Vec<TypeId>,
        return_type: TypeId,
        is_static: bool,
    ) -> MethodId {
        let selector = if selector == CONSTRUCTOR_NAME { "new" } else { selector };
        let mut ordinal = self.types.get(&ty).map_or(0, |s| s.lambdas);
        let mut name = format!("lambda${selector}${ordinal}");
        while self.method_name_taken(env, ty, &name) {
            ordinal += 1;
            name = format!("lambda${selector}${ordinal}");
        }
        self.entry(ty).lambdas = ordinal + 1;

        let mut modifiers = Modifiers::PRIVATE | Modifiers::SYNTHETIC;
        if is_static {
            modifiers |= Modifiers::STATIC;
        }
        self.add_method(
            env,
            ty,
            MethodData {
                selector: name,
                modifiers,
                declaring_class: ty,
                type_variables: Vec::new(),
                parameter_names: (0..parameters.len()).map(|i| format!("arg{i}")).collect(),
                parameters,
                return_type,
                thrown: Vec::new(),
                kind: MethodKind::Synthetic(SyntheticKind::LambdaMethod),
                tag_bits: TagBits::empty(),
                span: Span::default(),
            },
        )
    }

    /// Bridge in `ty` forwarding the erased signature of `overridden` to
    /// `target`. `None` when both erase alike or a declared method already
    /// has the bridge's signature.
    pub fn bridge_method(
        &mut self,
        env: &mut Environment,
        ty: TypeId,
        overridden: MethodId,
        target: MethodId,
    ) -> Option<MethodId> {
        let overridden = original_method(env, overridden);
        if let Some(&bridge) = self.types.get(&ty).and_then(|s| s.bridges.get(&overridden)) {
            return Some(bridge);
        }

        let original = env.method(overridden).clone();
        let implementation = env.method(target).clone();
        let parameters: Vec<TypeId> = original.parameters.iter().map(|&p| erasure(env, p)).collect();
        let return_type = erasure(env, original.return_type);
        let target_parameters: Vec<TypeId> = implementation.parameters.iter().map(|&p| erasure(env, p)).collect();
        let target_return = erasure(env, implementation.return_type);
        if parameters == target_parameters && return_type == target_return {
            return None;
        }
        let declared = env.get_methods(ty, &implementation.selector).into_iter().any(|m| {
            let data = env.method(m).clone();
            let erased: Vec<TypeId> = data.parameters.iter().map(|&p| erasure(env, p)).collect();
            erased == parameters
        });
        if declared {
            return None;
        }

        let bridge = self.add_method(
            env,
            ty,
            MethodData {
                selector: implementation.selector.clone(),
                modifiers: implementation.modifiers.access() | Modifiers::BRIDGE | Modifiers::SYNTHETIC,
                declaring_class: ty,
                type_variables: Vec::new(),
                parameter_names: implementation.parameter_names.clone(),
                parameters,
                return_type,
                thrown: implementation.thrown.clone(),
                kind: MethodKind::Synthetic(SyntheticKind::BridgeMethod),
                tag_bits: TagBits::empty(),
                span: implementation.span,
            },
        );
        self.entry(ty).bridges.insert(overridden, bridge);
        Some(bridge)
    }

    fn entry(&mut self, ty: TypeId) -> &mut TypeSynthetics {
        self.types.entry(ty).or_default()
    }

    fn field_name_taken(&self, env: &mut Environment, ty: TypeId, name: &str) -> bool {
        env.get_field(ty, name).is_some()
            || self
                .fields(ty)
                .iter()
                .any(|&field| env.field(field).name == name)
    }

    fn method_name_taken(&self, env: &mut Environment, ty: TypeId, selector: &str) -> bool {
        !env.get_methods(ty, selector).is_empty()
            || self
                .methods(ty)
                .iter()
                .any(|&method| env.method(method).selector == selector)
    }

    fn add_field(
        &mut self,
        env: &mut Environment,
        ty: TypeId,
        name: String,
        field_type: TypeId,
        modifiers: Modifiers,
        kind: SyntheticKind,
    ) -> FieldId {
        tracing::debug!(target: "nova.lookup", name = %name, kind = ?kind, "created synthetic field");
        let field = env.create_field(FieldData {
            name,
            ty: field_type,
            modifiers: modifiers | Modifiers::SYNTHETIC,
            declaring_class: Some(ty),
            kind: FieldKind::Synthetic(kind),
            tag_bits: TagBits::empty(),
            span: Span::default(),
        });
        self.entry(ty).fields.push(field);
        field
    }

    fn add_method(&mut self, env: &mut Environment, ty: TypeId, data: MethodData) -> MethodId {
        tracing::debug!(target: "nova.lookup", selector = %data.selector, kind = ?data.kind, "created synthetic method");
        let method = env.create_method(data);
        self.entry(ty).methods.push(method);
        method
    }
}
