//! Bindings for types served by the [`nova_decl::TypeProvider`].
//!
//! A binary type is created on first request with only its name, flags and
//! type variables. Supertypes and members are read from the stub's
//! descriptors and `Signature` attributes in their own lazy stages.

use nova_decl::signature::{
    parse_class_signature, parse_field_signature, parse_method_signature, ClassSignature,
    ClassTypeSignature, JavaTypeSignature, TypeArgument, TypeParameterSignature,
};
use nova_decl::{Modifiers, Span, TypeDefStub};

use crate::binding::{
    BaseType, BindingKind, ClassData, ClassSort, Declarer, FieldData, FieldKind, Hierarchy,
    MethodData, MethodKind, TypeOrigin, TypeVariableBounds, WildcardKind,
};
use crate::env::Environment;
use crate::flags::TagBits;
use crate::ids::TypeId;
use crate::problem::ProblemReason;

pub(crate) fn create_binary_type(env: &mut Environment, stub: TypeDefStub) -> TypeId {
    let enclosing = stub
        .enclosing_binary_name
        .as_deref()
        .and_then(|outer| env.get_type(outer));
    if let Some(id) = env.loaded_type(&stub.binary_name) {
        return id;
    }

    let modifiers = Modifiers::from_access_flags(stub.access_flags);
    let sort = if modifiers.contains(Modifiers::ANNOTATION) {
        ClassSort::Annotation
    } else if modifiers.contains(Modifiers::INTERFACE) {
        ClassSort::Interface
    } else if modifiers.contains(Modifiers::ENUM) {
        ClassSort::Enum
    } else if stub.super_binary_name.as_deref() == Some("java.lang.Record") {
        ClassSort::Record
    } else {
        ClassSort::Class
    };
    let type_parameters = class_signature(&stub)
        .map(|sig| sig.type_parameters)
        .unwrap_or_default();

    let mut data = ClassData::new(stub.binary_name.clone(), sort, TypeOrigin::Binary(Box::new(stub)));
    data.modifiers = modifiers;
    data.enclosing = enclosing;
    let id = env.create_class(data);

    let type_variables = type_parameters
        .iter()
        .enumerate()
        .map(|(rank, param)| env.create_type_variable(&param.name, rank as u32, Declarer::Type(id)))
        .collect();
    env.set_type_variables(id, type_variables);

    tracing::debug!(
        target: "nova.bindings",
        ty = %env.class(id).map(|c| c.binary_name.as_str()).unwrap_or_default(),
        "loaded binary type"
    );
    id
}

fn class_signature(stub: &TypeDefStub) -> Option<ClassSignature> {
    let text = stub.signature.as_deref()?;
    match parse_class_signature(text) {
        Ok(sig) => Some(sig),
        Err(err) => {
            tracing::warn!(target: "nova.bindings", ty = %stub.binary_name, error = %err, "ignoring malformed class signature");
            None
        }
    }
}

fn stub_of(env: &Environment, ty: TypeId) -> Option<TypeDefStub> {
    match &env.class(ty)?.origin {
        TypeOrigin::Binary(stub) => Some((**stub).clone()),
        TypeOrigin::Source(_) => None,
    }
}

pub(crate) fn connect_hierarchy(env: &mut Environment, ty: TypeId) {
    let Some(stub) = stub_of(env, ty) else {
        return;
    };
    let is_interface = env.is_interface(ty);
    let scope = SignatureScope::for_type(env, ty);

    let (superclass, superinterfaces) = match class_signature(&stub) {
        Some(sig) => {
            let type_variables = env
                .class(ty)
                .map(|c| c.type_variables.clone())
                .unwrap_or_default();
            for (&var, param) in type_variables.iter().zip(&sig.type_parameters) {
                connect_type_variable(env, var, param, &scope);
            }
            let superclass = resolve_class_signature(env, &sig.superclass, &scope);
            let interfaces = sig
                .interfaces
                .iter()
                .map(|iface| resolve_class_signature(env, iface, &scope))
                .collect::<Vec<_>>();
            (Some(superclass), interfaces)
        }
        None => {
            let superclass = stub
                .super_binary_name
                .as_deref()
                .map(|name| resolve_erased_name(env, name));
            let interfaces = stub
                .interfaces
                .iter()
                .map(|name| resolve_erased_name(env, name))
                .collect();
            (superclass, interfaces)
        }
    };

    let superclass = if is_interface { None } else { superclass };
    let has_problems = superclass
        .iter()
        .chain(&superinterfaces)
        .any(|&st| !env.is_valid(st));
    if has_problems {
        env.add_type_tag_bits(ty, TagBits::HIERARCHY_HAS_PROBLEMS | TagBits::HAS_MISSING_TYPE);
    }
    env.set_hierarchy(
        ty,
        Hierarchy {
            superclass,
            superinterfaces,
        },
    );
}

pub(crate) fn build_fields(env: &mut Environment, ty: TypeId) {
    let Some(stub) = stub_of(env, ty) else {
        return;
    };
    let scope = SignatureScope::for_type(env, ty);
    let mut fields = Vec::with_capacity(stub.fields.len());
    for field in &stub.fields {
        let modifiers = Modifiers::from_access_flags(field.access_flags);
        if modifiers.contains(Modifiers::SYNTHETIC) {
            continue;
        }
        let text = field.signature.as_deref().unwrap_or(&field.descriptor);
        let field_type = match parse_field_signature(text) {
            Ok(sig) => resolve_signature(env, &sig, &scope),
            Err(err) => {
                tracing::warn!(target: "nova.bindings", field = %field.name, error = %err, "malformed field signature");
                env.create_problem_type(text, ProblemReason::NotFound, None)
            }
        };
        let kind = if modifiers.contains(Modifiers::ENUM) {
            FieldKind::EnumConstant
        } else {
            FieldKind::Declared
        };
        let tag_bits = env.tag_bits(field_type) & TagBits::HAS_MISSING_TYPE;
        fields.push(env.create_field(FieldData {
            name: field.name.clone(),
            ty: field_type,
            modifiers,
            declaring_class: Some(ty),
            kind,
            tag_bits,
            span: Span::default(),
        }));
    }
    env.set_fields(ty, fields);
}

pub(crate) fn build_methods(env: &mut Environment, ty: TypeId) {
    let Some(stub) = stub_of(env, ty) else {
        return;
    };
    let is_interface = env.is_interface(ty);
    let class_scope = SignatureScope::for_type(env, ty);
    let void = env.base(BaseType::Void);
    let mut methods = Vec::with_capacity(stub.methods.len());

    for method in &stub.methods {
        let mut modifiers = Modifiers::from_access_flags(method.access_flags);
        if method.name == "<clinit>" || modifiers.contains(Modifiers::SYNTHETIC) {
            continue;
        }
        let text = method.signature.as_deref().unwrap_or(&method.descriptor);
        let sig = match parse_method_signature(text) {
            Ok(sig) => sig,
            Err(err) => {
                tracing::warn!(target: "nova.bindings", method = %method.name, error = %err, "skipping method with malformed signature");
                continue;
            }
        };
        if is_interface
            && !modifiers.intersects(Modifiers::ABSTRACT | Modifiers::STATIC | Modifiers::PRIVATE)
        {
            modifiers |= Modifiers::DEFAULT;
        }

        let id = env.create_method(MethodData {
            selector: method.name.clone(),
            modifiers,
            declaring_class: ty,
            type_variables: Vec::new(),
            parameters: Vec::new(),
            parameter_names: Vec::new(),
            return_type: void,
            thrown: Vec::new(),
            kind: MethodKind::Declared,
            tag_bits: TagBits::empty(),
            span: Span::default(),
        });
        let type_variables: Vec<TypeId> = sig
            .type_parameters
            .iter()
            .enumerate()
            .map(|(rank, param)| env.create_type_variable(&param.name, rank as u32, Declarer::Method(id)))
            .collect();
        let scope = class_scope.with_method(&type_variables);
        for (&var, param) in type_variables.iter().zip(&sig.type_parameters) {
            connect_type_variable(env, var, param, &scope);
        }

        let parameters: Vec<TypeId> = sig
            .parameters
            .iter()
            .map(|param| resolve_signature(env, param, &scope))
            .collect();
        let return_type = match &sig.return_type {
            Some(ret) => resolve_signature(env, ret, &scope),
            None => void,
        };
        let thrown: Vec<TypeId> = sig
            .throws
            .iter()
            .map(|ex| resolve_signature(env, ex, &scope))
            .collect();
        let missing = parameters
            .iter()
            .chain(&thrown)
            .chain(std::iter::once(&return_type))
            .any(|&t| env.tag_bits(t).contains(TagBits::HAS_MISSING_TYPE));

        let data = env.method_mut(id);
        data.parameter_names = (0..parameters.len()).map(|i| format!("arg{i}")).collect();
        data.type_variables = type_variables;
        data.parameters = parameters;
        data.return_type = return_type;
        data.thrown = thrown;
        if missing {
            data.tag_bits |= TagBits::HAS_MISSING_TYPE;
        }
        methods.push(id);
    }
    env.set_methods(ty, methods);
}

/// Type variables visible to a signature, innermost first.
#[derive(Debug, Clone, Default)]
struct SignatureScope {
    type_variables: Vec<TypeId>,
}

impl SignatureScope {
    fn for_type(env: &Environment, ty: TypeId) -> Self {
        let mut type_variables = Vec::new();
        let mut current = Some(ty);
        while let Some(class_id) = current {
            let Some(class) = env.class(class_id) else {
                break;
            };
            type_variables.extend(class.type_variables.iter().copied());
            current = if class.is_static() { None } else { class.enclosing };
        }
        Self { type_variables }
    }

    fn with_method(&self, method_variables: &[TypeId]) -> Self {
        let mut type_variables = method_variables.to_vec();
        type_variables.extend(self.type_variables.iter().copied());
        Self { type_variables }
    }

    fn find(&self, env: &Environment, name: &str) -> Option<TypeId> {
        self.type_variables
            .iter()
            .copied()
            .find(|&var| env.type_variable(var).is_some_and(|tv| tv.name == name))
    }
}

fn connect_type_variable(
    env: &mut Environment,
    var: TypeId,
    param: &TypeParameterSignature,
    scope: &SignatureScope,
) {
    let class_bound = param
        .class_bound
        .as_ref()
        .map(|bound| resolve_signature(env, bound, scope));
    let interface_bounds: Vec<TypeId> = param
        .interface_bounds
        .iter()
        .map(|bound| resolve_signature(env, bound, scope))
        .collect();

    let mut bounds = TypeVariableBounds {
        first_bound: class_bound.or_else(|| interface_bounds.first().copied()),
        ..TypeVariableBounds::default()
    };
    if let Some(bound) = class_bound {
        if env.is_interface(bound) {
            bounds.superinterfaces.push(bound);
        } else if env.kind(bound).is_declared_type() && !env.is_object(bound) {
            bounds.superclass = Some(bound);
        }
    }
    bounds.superinterfaces.extend(interface_bounds);

    if bounds.all().iter().any(|&b| !env.is_valid(b)) {
        env.add_type_tag_bits(var, TagBits::HIERARCHY_HAS_PROBLEMS);
    }
    env.set_type_variable_bounds(var, bounds);
}

/// A supertype named only by its binary name; generic declarations are
/// referenced raw.
fn resolve_erased_name(env: &mut Environment, binary_name: &str) -> TypeId {
    match env.get_type(binary_name) {
        Some(ty) => crate::hierarchy::convert_to_raw(env, ty),
        None => env.get_type_or_missing(binary_name),
    }
}

fn resolve_signature(
    env: &mut Environment,
    sig: &JavaTypeSignature,
    scope: &SignatureScope,
) -> TypeId {
    match sig {
        JavaTypeSignature::Base(base) => env.base(BaseType::from_signature(*base)),
        JavaTypeSignature::Array(component) => {
            let component = resolve_signature(env, component, scope);
            env.create_array(component, 1)
        }
        JavaTypeSignature::TypeVariable(name) => scope
            .find(env, name)
            .unwrap_or_else(|| env.create_problem_type(name, ProblemReason::NotFound, None)),
        JavaTypeSignature::Class(class) => resolve_class_signature(env, class, scope),
    }
}

fn resolve_class_signature(
    env: &mut Environment,
    sig: &ClassTypeSignature,
    scope: &SignatureScope,
) -> TypeId {
    let mut binary_name = sig.package.clone();
    let mut current: Option<TypeId> = None;

    for (idx, segment) in sig.segments.iter().enumerate() {
        if idx == 0 {
            if !binary_name.is_empty() {
                binary_name.push('.');
            }
        } else {
            binary_name.push('$');
        }
        binary_name.push_str(&segment.name);

        let Some(decl) = env.get_type(&binary_name) else {
            return env.get_type_or_missing(&binary_name);
        };
        let mut arguments = Vec::with_capacity(segment.arguments.len());
        for (rank, arg) in segment.arguments.iter().enumerate() {
            arguments.push(resolve_type_argument(env, decl, rank as u32, arg, scope));
        }

        let is_static = env.class(decl).map_or(true, |c| c.is_static());
        let is_generic = env.class(decl).is_some_and(|c| c.is_generic());
        let enclosing = current.filter(|&outer| {
            !is_static
                && matches!(env.kind(outer), BindingKind::Parameterized | BindingKind::Raw)
        });
        let enclosing_is_raw = enclosing.is_some_and(|outer| env.kind(outer) == BindingKind::Raw);

        current = Some(if !arguments.is_empty() && !enclosing_is_raw {
            env.create_parameterized_type(decl, arguments, enclosing)
        } else if is_generic || enclosing_is_raw {
            env.create_raw_type(decl, enclosing)
        } else {
            env.create_parameterized_type(decl, Vec::new(), enclosing)
        });
    }

    current.unwrap_or_else(|| env.create_problem_type(&binary_name, ProblemReason::NotFound, None))
}

fn resolve_type_argument(
    env: &mut Environment,
    generic: TypeId,
    rank: u32,
    arg: &TypeArgument,
    scope: &SignatureScope,
) -> TypeId {
    match arg {
        TypeArgument::Any => env.create_wildcard(Some(generic), rank, WildcardKind::Unbound, None, Vec::new()),
        TypeArgument::Extends(bound) => {
            let bound = resolve_signature(env, bound, scope);
            env.create_wildcard(Some(generic), rank, WildcardKind::Extends, Some(bound), Vec::new())
        }
        TypeArgument::Super(bound) => {
            let bound = resolve_signature(env, bound, scope);
            env.create_wildcard(Some(generic), rank, WildcardKind::Super, Some(bound), Vec::new())
        }
        TypeArgument::Exact(ty) => resolve_signature(env, ty, scope),
    }
}
