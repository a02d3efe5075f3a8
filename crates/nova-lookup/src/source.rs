//! Bindings for types declared in compilation units.
//!
//! Registering a unit creates each of its classes with only a name, flags
//! and type variables. The remaining stages run on demand through the
//! [`TypeCompleter`] seam: supertypes are connected and checked, then
//! record components, fields and methods are built. The implicit members of
//! classes, enums and records are synthesized with the declared ones.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use nova_bindings::{
    direct_supertypes, erasure, method_readable_name, readable_name, substitute_all, BaseType,
    ClassData, ClassSort, Declarer, Environment, FieldData, FieldKind, Hierarchy, MapSubstitution,
    MethodData, MethodId, MethodKind, Problem, ProblemId, SourceKey, SyntheticKind, TagBits,
    TypeCompleter, TypeId, TypeOrigin, TypeVariableBounds, WellKnown, CONSTRUCTOR_NAME,
};
use nova_decl::{CompilationUnit, DeclKind, MethodDecl, Modifiers, Span, TypeDecl, TypeParameterDecl};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::import_map::ImportMap;
use crate::scope::{enclosing_chain, with_class_scopes, with_unit_scope, MethodScope, Scope, UnitContext};
use crate::type_lookup::{
    check_type_arguments, find_qualified_type, resolve_type_ref, resolve_type_ref_with, ResolveOptions,
};

struct SourceType {
    ty: TypeId,
    decl: Rc<TypeDecl>,
    unit: Rc<UnitContext>,
}

/// Completes source types from their declarations.
#[derive(Default)]
pub struct SourceCompleter {
    types: RefCell<Vec<SourceType>>,
    units: RefCell<Vec<Rc<UnitContext>>>,
}

impl SourceCompleter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the classes declared in `unit`. A type whose binary name is
    /// already taken is reported and skipped with its member types.
    pub fn register_unit(&self, env: &mut Environment, unit: &CompilationUnit) -> Rc<UnitContext> {
        let package = unit.package_name().to_string();
        if !package.is_empty() {
            env.register_package(&package);
        }

        let previous = env.current_unit().map(str::to_string);
        env.set_current_unit(Some(unit.name.clone()));
        let base = self.types.borrow().len();
        let mut created = Vec::new();
        let top_level: Vec<TypeId> = unit
            .types
            .iter()
            .filter_map(|decl| create_type(env, decl, None, &package, base, &mut created))
            .collect();
        env.set_current_unit(previous);

        let context = Rc::new(UnitContext {
            name: unit.name.clone(),
            package,
            imports: ImportMap::from_imports(&unit.imports),
            module: unit.module.clone(),
            types: top_level,
        });
        self.types
            .borrow_mut()
            .extend(created.into_iter().map(|(ty, decl)| SourceType {
                ty,
                decl,
                unit: context.clone(),
            }));
        self.units.borrow_mut().push(context.clone());
        context
    }

    pub fn units(&self) -> Vec<Rc<UnitContext>> {
        self.units.borrow().clone()
    }

    /// Every registered source type, member types included.
    pub fn types(&self) -> Vec<TypeId> {
        self.types.borrow().iter().map(|entry| entry.ty).collect()
    }

    pub fn declaration(&self, env: &Environment, ty: TypeId) -> Option<(Rc<TypeDecl>, Rc<UnitContext>)> {
        let TypeOrigin::Source(SourceKey(key)) = &env.class(ty)?.origin else {
            return None;
        };
        let types = self.types.borrow();
        let entry = types.get(*key as usize)?;
        Some((entry.decl.clone(), entry.unit.clone()))
    }

    /// Same-unit types naming `ty` in their `extends` or `implements`
    /// clause: the permitted subtypes of a sealed type without `permits`.
    fn implicit_permits(&self, env: &Environment, ty: TypeId, unit: &Rc<UnitContext>) -> Vec<TypeId> {
        let Some(simple_name) = env.class(ty).map(|class| class.simple_name.clone()) else {
            return Vec::new();
        };
        self.types
            .borrow()
            .iter()
            .filter(|entry| entry.ty != ty && Rc::ptr_eq(&entry.unit, unit))
            .filter(|entry| {
                entry
                    .decl
                    .superclass
                    .iter()
                    .chain(&entry.decl.superinterfaces)
                    .any(|type_ref| type_ref.simple_name() == Some(simple_name.as_str()))
            })
            .map(|entry| entry.ty)
            .collect()
    }
}

fn create_type(
    env: &mut Environment,
    decl: &TypeDecl,
    enclosing: Option<TypeId>,
    package: &str,
    base: usize,
    created: &mut Vec<(TypeId, Rc<TypeDecl>)>,
) -> Option<TypeId> {
    let binary_name = match enclosing.and_then(|outer| env.class(outer)) {
        Some(outer) => format!("{}${}", outer.binary_name, decl.name),
        None if package.is_empty() => decl.name.clone(),
        None => format!("{package}.{}", decl.name),
    };
    if env.loaded_type(&binary_name).is_some() {
        env.report(Problem::error(
            ProblemId::DuplicateType,
            decl.span,
            vec![binary_name.replace('$', ".")],
        ));
        return None;
    }

    let (sort, implied) = match decl.kind {
        DeclKind::Class => (ClassSort::Class, Modifiers::empty()),
        DeclKind::Interface => (ClassSort::Interface, Modifiers::INTERFACE | Modifiers::ABSTRACT),
        DeclKind::Annotation => (
            ClassSort::Annotation,
            Modifiers::INTERFACE | Modifiers::ABSTRACT | Modifiers::ANNOTATION,
        ),
        DeclKind::Enum => (ClassSort::Enum, Modifiers::ENUM | Modifiers::FINAL),
        DeclKind::Record => (ClassSort::Record, Modifiers::RECORD | Modifiers::FINAL),
    };
    let mut modifiers = decl.modifiers | implied;
    if let Some(outer) = enclosing {
        if env.is_interface(outer) {
            modifiers |= Modifiers::PUBLIC | Modifiers::STATIC;
        }
        if sort != ClassSort::Class {
            modifiers |= Modifiers::STATIC;
        }
    }

    let key = SourceKey((base + created.len()) as u32);
    let mut data = ClassData::new(binary_name, sort, TypeOrigin::Source(key));
    data.modifiers = modifiers;
    data.enclosing = enclosing;
    data.span = decl.span;
    let id = env.create_class(data);
    created.push((id, Rc::new(decl.clone())));

    let type_variables = decl
        .type_parameters
        .iter()
        .enumerate()
        .map(|(rank, param)| env.create_type_variable(&param.name, rank as u32, Declarer::Type(id)))
        .collect();
    env.set_type_variables(id, type_variables);

    for member in &decl.member_types {
        create_type(env, member, Some(id), package, base, created);
    }
    tracing::debug!(target: "nova.lookup", ty = %decl.name, "registered source type");
    Some(id)
}

/// Reports imports naming neither a type nor (for on-demand imports) a
/// package.
pub(crate) fn check_imports(env: &mut Environment, unit: &UnitContext) {
    let mut missing: Vec<(String, Span)> = Vec::new();
    for import in &unit.imports.type_single {
        if find_qualified_type(env, &import.path).is_none() {
            missing.push((import.path.clone(), import.span));
        }
    }
    for import in &unit.imports.type_star {
        if !env.package_exists(&import.path) && find_qualified_type(env, &import.path).is_none() {
            missing.push((format!("{}.*", import.path), import.span));
        }
    }
    for import in &unit.imports.static_single {
        if find_qualified_type(env, &import.ty).is_none() {
            missing.push((format!("{}.{}", import.ty, import.member), import.span));
        }
    }
    for import in &unit.imports.static_star {
        if find_qualified_type(env, &import.ty).is_none() {
            missing.push((format!("{}.*", import.ty), import.span));
        }
    }
    for (name, span) in missing {
        env.report(Problem::error(ProblemId::ImportNotFound, span, vec![name]).in_unit(&unit.name));
    }
}

fn in_unit<R>(env: &mut Environment, unit: &UnitContext, f: impl FnOnce(&mut Environment) -> R) -> R {
    let previous = env.current_unit().map(str::to_string);
    env.set_current_unit(Some(unit.name.clone()));
    let result = f(env);
    env.set_current_unit(previous);
    result
}

/// Runs `f` in the class scope of `ty` inside its unit, with problems
/// attributed to that unit.
pub(crate) fn with_type_scope<R>(
    env: &mut Environment,
    unit: &Rc<UnitContext>,
    ty: TypeId,
    f: impl FnOnce(&mut Environment, &Scope<'_>) -> R,
) -> R {
    let chain = enclosing_chain(env, ty);
    in_unit(env, unit, |env| {
        with_unit_scope(unit, |cu| with_class_scopes(cu, &chain, |scope| f(env, scope)))
    })
}

impl TypeCompleter for SourceCompleter {
    fn connect_hierarchy(&self, env: &mut Environment, ty: TypeId) {
        let Some((decl, unit)) = self.declaration(env, ty) else {
            return;
        };
        with_type_scope(env, &unit, ty, |env, scope| self.connect(env, scope, ty, &decl, &unit));
    }

    fn build_fields(&self, env: &mut Environment, ty: TypeId) {
        let Some((decl, unit)) = self.declaration(env, ty) else {
            return;
        };
        with_type_scope(env, &unit, ty, |env, scope| build_fields(env, scope, ty, &decl));
    }

    fn build_methods(&self, env: &mut Environment, ty: TypeId) {
        let Some((decl, unit)) = self.declaration(env, ty) else {
            return;
        };
        with_type_scope(env, &unit, ty, |env, scope| {
            let mut methods: Vec<MethodId> = decl
                .methods
                .iter()
                .filter_map(|method| declare_method(env, scope, ty, &decl, method))
                .collect();
            synthesize_methods(env, ty, &decl, &mut methods);
            remove_duplicate_methods(env, ty, &mut methods);
            env.set_methods(ty, methods);
        });
    }

    fn build_components(&self, env: &mut Environment, ty: TypeId) {
        let Some((decl, unit)) = self.declaration(env, ty) else {
            return;
        };
        if decl.kind != DeclKind::Record {
            return;
        }
        with_type_scope(env, &unit, ty, |env, scope| {
            let mut components = Vec::with_capacity(decl.components.len());
            for component in &decl.components {
                let component_type = resolve_type_ref(env, scope, &component.ty);
                if !env.is_valid(component_type) {
                    excise(env, &component.name, component.span);
                    continue;
                }
                components.push(env.create_field(FieldData {
                    name: component.name.clone(),
                    ty: component_type,
                    modifiers: Modifiers::PRIVATE | Modifiers::FINAL,
                    declaring_class: Some(ty),
                    kind: FieldKind::RecordComponent,
                    tag_bits: TagBits::empty(),
                    span: component.span,
                }));
            }
            env.set_components(ty, components);
        });
    }
}

impl SourceCompleter {
    fn connect(&self, env: &mut Environment, scope: &Scope<'_>, ty: TypeId, decl: &TypeDecl, unit: &Rc<UnitContext>) {
        let mut deferred = Vec::new();
        let type_variables = env
            .class(ty)
            .map(|class| class.type_variables.clone())
            .unwrap_or_default();
        for (&var, param) in type_variables.iter().zip(&decl.type_parameters) {
            connect_type_variable(env, scope, var, param, &mut deferred);
        }

        let mut has_problems = false;
        let mut superclass = match decl.kind {
            DeclKind::Interface | DeclKind::Annotation => None,
            DeclKind::Enum => {
                let enum_type = env.well_known(WellKnown::Enum);
                Some(env.create_parameterized_type(enum_type, vec![ty], None))
            }
            DeclKind::Record => Some(env.well_known(WellKnown::Record)),
            DeclKind::Class => Some(match &decl.superclass {
                Some(type_ref) => {
                    let resolved = resolve_type_ref_with(env, scope, type_ref, ResolveOptions::HEADER);
                    match check_superclass(env, resolved, type_ref.span()) {
                        Some(superclass) => {
                            deferred.push((superclass, type_ref.span()));
                            superclass
                        }
                        None => {
                            has_problems = true;
                            env.object()
                        }
                    }
                }
                None => env.object(),
            }),
        };

        let mut superinterfaces: Vec<TypeId> = Vec::new();
        for type_ref in &decl.superinterfaces {
            let resolved = resolve_type_ref_with(env, scope, type_ref, ResolveOptions::HEADER);
            if !env.is_valid(resolved) {
                has_problems = true;
                continue;
            }
            let generic = env.generic_of(resolved);
            if !generic.is_some_and(|g| env.is_interface(g)) {
                let name = readable_name(env, resolved);
                env.report(Problem::error(
                    ProblemId::SuperInterfaceMustBeAnInterface,
                    type_ref.span(),
                    vec![name],
                ));
                has_problems = true;
                continue;
            }
            if superinterfaces.iter().any(|&other| env.generic_of(other) == generic) {
                continue;
            }
            deferred.push((resolved, type_ref.span()));
            superinterfaces.push(resolved);
        }

        let supertypes: Vec<TypeId> = superclass.iter().chain(&superinterfaces).copied().collect();
        if supertypes.iter().any(|&st| reaches(env, st, ty)) {
            let name = readable_name(env, ty);
            env.report(Problem::error(ProblemId::HierarchyCircularity, decl.span, vec![name]));
            has_problems = true;
            superclass = superclass.map(|_| env.object());
            superinterfaces.clear();
            deferred.clear();
        }
        if has_problems {
            env.add_type_tag_bits(ty, TagBits::HIERARCHY_HAS_PROBLEMS);
        }
        env.set_hierarchy(
            ty,
            Hierarchy {
                superclass,
                superinterfaces: superinterfaces.clone(),
            },
        );

        check_deferred_bounds(env, deferred);
        check_inherited_interfaces(env, ty, decl.span);
        if env.options().source_level.supports_sealed() {
            self.connect_permitted(env, scope, ty, decl, unit);
            for st in superclass.into_iter().chain(superinterfaces) {
                check_sealed_supertype(env, ty, st, decl.span);
            }
        }
        env.add_type_tag_bits(ty, TagBits::HIERARCHY_CHECKED);
    }

    fn connect_permitted(
        &self,
        env: &mut Environment,
        scope: &Scope<'_>,
        ty: TypeId,
        decl: &TypeDecl,
        unit: &Rc<UnitContext>,
    ) {
        if !decl.modifiers.contains(Modifiers::SEALED) {
            return;
        }
        let permitted = if decl.permits.is_empty() {
            self.implicit_permits(env, ty, unit)
        } else {
            decl.permits
                .iter()
                .filter_map(|type_ref| {
                    let resolved = resolve_type_ref_with(env, scope, type_ref, ResolveOptions::HEADER);
                    env.generic_of(resolved)
                })
                .collect()
        };
        env.set_permitted_subtypes(ty, permitted);
    }
}

/// `Some(superclass)` when `resolved` may be extended, otherwise reports
/// why not.
fn check_superclass(env: &mut Environment, resolved: TypeId, span: Span) -> Option<TypeId> {
    if !env.is_valid(resolved) {
        return None;
    }
    let declaration = env.generic_of(resolved).and_then(|generic| env.class(generic));
    let problem = match declaration {
        None => ProblemId::SuperclassMustBeAClass,
        Some(class) if class.is_interface() => ProblemId::SuperclassMustBeAClass,
        Some(class) if class.modifiers.contains(Modifiers::FINAL) => ProblemId::CannotExtendFinalClass,
        Some(_) => return Some(resolved),
    };
    let name = readable_name(env, resolved);
    env.report(Problem::error(problem, span, vec![name]));
    None
}

fn connect_type_variable(
    env: &mut Environment,
    scope: &Scope<'_>,
    var: TypeId,
    param: &TypeParameterDecl,
    deferred: &mut Vec<(TypeId, Span)>,
) {
    let mut bounds = TypeVariableBounds::default();
    for (idx, type_ref) in param.bounds.iter().enumerate() {
        let bound = resolve_type_ref_with(env, scope, type_ref, ResolveOptions::HEADER);
        if !env.is_valid(bound) {
            env.add_type_tag_bits(var, TagBits::HIERARCHY_HAS_PROBLEMS);
            continue;
        }
        let is_interface = env.generic_of(bound).is_some_and(|g| env.is_interface(g));
        if idx == 0 {
            bounds.first_bound = Some(bound);
            if is_interface {
                bounds.superinterfaces.push(bound);
            } else if !env.is_object(bound) {
                bounds.superclass = Some(bound);
            }
        } else if is_interface {
            bounds.superinterfaces.push(bound);
        } else {
            let name = readable_name(env, bound);
            env.report(Problem::error(ProblemId::BoundMustBeAnInterface, type_ref.span(), vec![name]));
            env.add_type_tag_bits(var, TagBits::HIERARCHY_HAS_PROBLEMS);
            continue;
        }
        deferred.push((bound, type_ref.span()));
    }
    env.set_type_variable_bounds(var, bounds);
}

/// Bound checks of type arguments in headers wait until the hierarchy is
/// connected.
fn check_deferred_bounds(env: &mut Environment, deferred: Vec<(TypeId, Span)>) {
    for (ty, span) in deferred {
        if let Err(rank) = check_type_arguments(env, ty) {
            let argument = env
                .parameterized(ty)
                .and_then(|data| data.arguments.get(rank).copied())
                .map(|argument| readable_name(env, argument))
                .unwrap_or_default();
            let name = readable_name(env, ty);
            env.report(Problem::error(ProblemId::TypeArgumentMismatch, span, vec![argument, name]));
        }
    }
}

/// Whether `target` is a supertype of `from`, following connected
/// hierarchies only.
fn reaches(env: &mut Environment, from: TypeId, target: TypeId) -> bool {
    let mut queue = VecDeque::from([from]);
    let mut seen = FxHashSet::default();
    while let Some(ty) = queue.pop_front() {
        let Some(generic) = env.generic_of(ty) else {
            continue;
        };
        if generic == target {
            return true;
        }
        if !seen.insert(generic) {
            continue;
        }
        let hierarchy = env.hierarchy(generic);
        queue.extend(hierarchy.superclass);
        queue.extend(hierarchy.superinterfaces);
    }
    false
}

/// An interface may be inherited along several paths, but always with the
/// same arguments.
fn check_inherited_interfaces(env: &mut Environment, ty: TypeId, span: Span) {
    let mut first_seen: FxHashMap<TypeId, TypeId> = FxHashMap::default();
    let mut visited = FxHashSet::default();
    let mut queue: VecDeque<TypeId> = direct_supertypes(env, ty).into();
    while let Some(st) = queue.pop_front() {
        if !visited.insert(st) {
            continue;
        }
        let Some(generic) = env.generic_of(st) else {
            continue;
        };
        if env.is_interface(generic) {
            match first_seen.get(&generic).copied() {
                Some(previous) if previous != st => {
                    let arguments = vec![readable_name(env, previous), readable_name(env, st)];
                    env.report(Problem::error(
                        ProblemId::InterfaceInheritedWithDifferentArguments,
                        span,
                        arguments,
                    ));
                    return;
                }
                Some(_) => {}
                None => {
                    first_seen.insert(generic, st);
                }
            }
        }
        queue.extend(direct_supertypes(env, st));
    }
}

fn check_sealed_supertype(env: &mut Environment, ty: TypeId, supertype: TypeId, span: Span) {
    let Some(generic) = env.generic_of(supertype) else {
        return;
    };
    let sealed_source = env
        .class(generic)
        .is_some_and(|class| class.is_source() && class.modifiers.contains(Modifiers::SEALED));
    if !sealed_source {
        return;
    }
    env.ensure_hierarchy(generic);
    let permitted = env
        .class(generic)
        .filter(|class| class.is_hierarchy_connected())
        .map(|class| class.permitted_subtypes().contains(&ty));
    if permitted == Some(false) {
        let arguments = vec![readable_name(env, ty), readable_name(env, generic)];
        env.report(Problem::error(ProblemId::SealedTypeNotPermitted, span, arguments));
    }
}

/// Drops a member whose signature failed to resolve. The unresolved type
/// itself was reported where it was resolved.
fn excise(env: &mut Environment, member: &str, span: Span) {
    tracing::debug!(target: "nova.lookup", member = %member, "excising member with unresolved type");
    env.report(Problem::warning(ProblemId::ExcisedMember, span, vec![member.to_string()]));
}

fn build_fields(env: &mut Environment, scope: &Scope<'_>, ty: TypeId, decl: &TypeDecl) {
    let is_interface = decl.is_interface();
    let mut names: FxHashSet<String> = FxHashSet::default();
    let mut fields = Vec::with_capacity(decl.fields.len());

    for field in &decl.fields {
        if names.contains(&field.name) {
            env.report(Problem::error(ProblemId::DuplicateField, field.span, vec![field.name.clone()]));
            continue;
        }
        let (field_type, kind, mut modifiers) = if field.is_enum_constant {
            (
                ty,
                FieldKind::EnumConstant,
                field.modifiers | Modifiers::PUBLIC | Modifiers::STATIC | Modifiers::FINAL | Modifiers::ENUM,
            )
        } else {
            (resolve_type_ref(env, scope, &field.ty), FieldKind::Declared, field.modifiers)
        };
        if is_interface {
            modifiers |= Modifiers::PUBLIC | Modifiers::STATIC | Modifiers::FINAL;
        }
        if !env.is_valid(field_type) {
            excise(env, &field.name, field.span);
            continue;
        }
        names.insert(field.name.clone());
        fields.push(env.create_field(FieldData {
            name: field.name.clone(),
            ty: field_type,
            modifiers,
            declaring_class: Some(ty),
            kind,
            tag_bits: TagBits::empty(),
            span: field.span,
        }));
    }

    for component in env.components(ty) {
        let data = env.field(component);
        if names.insert(data.name.clone()) {
            fields.push(component);
        } else {
            let problem = Problem::error(ProblemId::DuplicateField, data.span, vec![data.name.clone()]);
            env.report(problem);
        }
    }
    env.set_fields(ty, fields);
}

fn declare_method(
    env: &mut Environment,
    scope: &Scope<'_>,
    ty: TypeId,
    decl: &TypeDecl,
    method: &MethodDecl,
) -> Option<MethodId> {
    let mut modifiers = method.modifiers;
    if decl.is_interface() {
        if !modifiers.contains(Modifiers::PRIVATE) {
            modifiers |= Modifiers::PUBLIC;
        }
        if !modifiers.intersects(Modifiers::DEFAULT | Modifiers::STATIC | Modifiers::PRIVATE) {
            modifiers |= Modifiers::ABSTRACT;
        }
    }
    if method.is_varargs {
        modifiers |= Modifiers::VARARGS;
    }
    if decl.kind == DeclKind::Enum && method.is_constructor {
        modifiers = (modifiers - Modifiers::ACCESS_MASK) | Modifiers::PRIVATE;
    }

    let void = env.base(BaseType::Void);
    let selector = if method.is_constructor { CONSTRUCTOR_NAME } else { method.name.as_str() };
    let id = env.create_method(MethodData {
        selector: selector.to_string(),
        modifiers,
        declaring_class: ty,
        type_variables: Vec::new(),
        parameters: Vec::new(),
        parameter_names: Vec::new(),
        return_type: void,
        thrown: Vec::new(),
        kind: MethodKind::Declared,
        tag_bits: TagBits::empty(),
        span: method.span,
    });
    let type_variables: Vec<TypeId> = method
        .type_parameters
        .iter()
        .enumerate()
        .map(|(rank, param)| env.create_type_variable(&param.name, rank as u32, Declarer::Method(id)))
        .collect();
    env.method_mut(id).type_variables = type_variables.clone();

    let method_scope = Scope::method(
        scope,
        MethodScope {
            method: Some(id),
            type_variables: type_variables.clone(),
            parameters: Vec::new(),
            is_static: modifiers.contains(Modifiers::STATIC),
            is_constructor: method.is_constructor,
        },
    );
    let mut deferred = Vec::new();
    for (&var, param) in type_variables.iter().zip(&method.type_parameters) {
        connect_type_variable(env, &method_scope, var, param, &mut deferred);
    }

    let (parameters, parameter_names): (Vec<TypeId>, Vec<String>) = if method.is_compact_constructor {
        env.components(ty)
            .into_iter()
            .map(|component| {
                let data = env.field(component);
                (data.ty, data.name.clone())
            })
            .unzip()
    } else {
        method
            .params
            .iter()
            .map(|param| (resolve_type_ref(env, &method_scope, &param.ty), param.name.clone()))
            .unzip()
    };
    let return_type = match &method.return_type {
        Some(type_ref) => resolve_type_ref(env, &method_scope, type_ref),
        None => void,
    };
    let thrown: Vec<TypeId> = method
        .thrown
        .iter()
        .map(|type_ref| resolve_type_ref(env, &method_scope, type_ref))
        .collect();
    check_deferred_bounds(env, deferred);

    let invalid = parameters
        .iter()
        .chain(&thrown)
        .chain(std::iter::once(&return_type))
        .any(|&t| !env.is_valid(t));
    if invalid {
        excise(env, selector, method.span);
        return None;
    }

    let data = env.method_mut(id);
    data.parameters = parameters;
    data.parameter_names = parameter_names;
    data.return_type = return_type;
    data.thrown = thrown;
    Some(id)
}

fn synthetic_method(
    env: &mut Environment,
    ty: TypeId,
    selector: &str,
    modifiers: Modifiers,
    parameters: Vec<(String, TypeId)>,
    return_type: TypeId,
    kind: SyntheticKind,
) -> MethodId {
    let (parameter_names, parameters) = parameters.into_iter().unzip();
    let span = env.class(ty).map(|class| class.span).unwrap_or_default();
    env.create_method(MethodData {
        selector: selector.to_string(),
        modifiers,
        declaring_class: ty,
        type_variables: Vec::new(),
        parameters,
        parameter_names,
        return_type,
        thrown: Vec::new(),
        kind: MethodKind::Synthetic(kind),
        tag_bits: TagBits::empty(),
        span,
    })
}

fn has_method(env: &Environment, methods: &[MethodId], selector: &str, parameters: &[TypeId]) -> bool {
    methods.iter().any(|&m| {
        let data = env.method(m);
        data.selector == selector && data.parameters == parameters
    })
}

/// Default constructors, the members every enum gets and the members a
/// record gets unless it declares them.
fn synthesize_methods(env: &mut Environment, ty: TypeId, decl: &TypeDecl, methods: &mut Vec<MethodId>) {
    let void = env.base(BaseType::Void);
    let class_access = env
        .class(ty)
        .map(|class| class.modifiers.access())
        .unwrap_or_default();

    match decl.kind {
        DeclKind::Interface | DeclKind::Annotation => {}
        DeclKind::Record => synthesize_record_members(env, ty, class_access, methods),
        DeclKind::Class | DeclKind::Enum => {
            let has_constructor = methods.iter().any(|&m| env.method(m).is_constructor());
            if !has_constructor {
                let access = if decl.kind == DeclKind::Enum { Modifiers::PRIVATE } else { class_access };
                methods.push(synthetic_method(
                    env,
                    ty,
                    CONSTRUCTOR_NAME,
                    access,
                    Vec::new(),
                    void,
                    SyntheticKind::DefaultConstructor,
                ));
            }
        }
    }

    if decl.kind == DeclKind::Enum {
        let string = env.well_known(WellKnown::String);
        let clashing: Vec<MethodId> = methods
            .iter()
            .copied()
            .filter(|&m| {
                let data = env.method(m);
                (data.selector == "values" && data.parameters.is_empty())
                    || (data.selector == "valueOf" && data.parameters == [string])
            })
            .collect();
        for &method in &clashing {
            let data = env.method(method);
            let problem = Problem::error(
                ProblemId::CannotDeclareEnumSpecialMethod,
                data.span,
                vec![data.selector.clone()],
            );
            env.report(problem);
        }
        methods.retain(|m| !clashing.contains(m));

        let array = env.create_array(ty, 1);
        let public_static = Modifiers::PUBLIC | Modifiers::STATIC;
        methods.push(synthetic_method(
            env,
            ty,
            "values",
            public_static,
            Vec::new(),
            array,
            SyntheticKind::EnumValues,
        ));
        methods.push(synthetic_method(
            env,
            ty,
            "valueOf",
            public_static,
            vec![("name".to_string(), string)],
            ty,
            SyntheticKind::EnumValueOf,
        ));
    }
}

fn synthesize_record_members(env: &mut Environment, ty: TypeId, access: Modifiers, methods: &mut Vec<MethodId>) {
    let components: Vec<(String, TypeId, Span)> = env
        .components(ty)
        .into_iter()
        .map(|component| {
            let data = env.field(component);
            (data.name.clone(), data.ty, data.span)
        })
        .collect();
    let erased: Vec<TypeId> = components.iter().map(|(_, t, _)| erasure(env, *t)).collect();

    let has_canonical = methods.iter().any(|&m| {
        let data = env.method(m).clone();
        data.is_constructor()
            && data.parameters.len() == erased.len()
            && data
                .parameters
                .iter()
                .zip(&erased)
                .all(|(&param, &component)| erasure(env, param) == component)
    });
    if !has_canonical {
        let void = env.base(BaseType::Void);
        let parameters = components.iter().map(|(name, t, _)| (name.clone(), *t)).collect();
        methods.push(synthetic_method(
            env,
            ty,
            CONSTRUCTOR_NAME,
            access,
            parameters,
            void,
            SyntheticKind::RecordCanonicalConstructor,
        ));
    }

    for (name, component_type, span) in &components {
        let declared = methods.iter().copied().find(|&m| {
            let data = env.method(m);
            data.selector == *name && data.parameters.is_empty()
        });
        match declared {
            Some(accessor) => {
                let data = env.method(accessor);
                let valid = data.modifiers.contains(Modifiers::PUBLIC)
                    && !data.is_static()
                    && data.return_type == *component_type;
                if !valid {
                    let span = data.span;
                    env.report(Problem::error(ProblemId::InvalidRecordAccessor, span, vec![name.clone()]));
                }
            }
            None => {
                let accessor = synthetic_method(
                    env,
                    ty,
                    name,
                    Modifiers::PUBLIC,
                    Vec::new(),
                    *component_type,
                    SyntheticKind::RecordAccessor,
                );
                env.method_mut(accessor).span = *span;
                methods.push(accessor);
            }
        }
    }

    let public_final = Modifiers::PUBLIC | Modifiers::FINAL;
    let string = env.well_known(WellKnown::String);
    let int = env.base(BaseType::Int);
    let boolean = env.base(BaseType::Boolean);
    let object = env.object();
    let implicit = [
        ("toString", Vec::new(), string, SyntheticKind::RecordToString),
        ("hashCode", Vec::new(), int, SyntheticKind::RecordHashCode),
        ("equals", vec![("other".to_string(), object)], boolean, SyntheticKind::RecordEquals),
    ];
    for (selector, parameters, return_type, kind) in implicit {
        let types: Vec<TypeId> = parameters.iter().map(|(_, t)| *t).collect();
        if !has_method(env, methods, selector, &types) {
            methods.push(synthetic_method(env, ty, selector, public_final, parameters, return_type, kind));
        }
    }
}

/// Why `later` cannot be declared next to `earlier`, if it cannot.
fn method_clash(env: &mut Environment, earlier: MethodId, later: MethodId) -> Option<ProblemId> {
    let first = env.method(earlier).clone();
    let second = env.method(later).clone();
    if first.selector != second.selector || first.parameters.len() != second.parameters.len() {
        return None;
    }

    if first.type_variables.len() == second.type_variables.len() {
        let rename = MapSubstitution::new(&second.type_variables, &first.type_variables);
        if substitute_all(env, &rename, &second.parameters) == first.parameters {
            return Some(ProblemId::DuplicateMethod);
        }
    }

    let same_erasure = first
        .parameters
        .iter()
        .zip(&second.parameters)
        .all(|(&a, &b)| erasure(env, a) == erasure(env, b));
    if !same_erasure {
        return None;
    }
    if env.options().source_level.tolerates_erasure_clash_with_distinct_returns()
        && erasure(env, first.return_type) != erasure(env, second.return_type)
    {
        return None;
    }
    Some(ProblemId::DuplicateMethodErasure)
}

/// Reports and drops every method clashing with one declared before it.
fn remove_duplicate_methods(env: &mut Environment, ty: TypeId, methods: &mut Vec<MethodId>) {
    let mut kept: Vec<MethodId> = Vec::with_capacity(methods.len());
    let mut found = false;
    'methods: for &method in methods.iter() {
        for &previous in &kept {
            if let Some(problem) = method_clash(env, previous, method) {
                let name = method_readable_name(env, method, true);
                let span = env.method(method).span;
                env.report(Problem::error(problem, span, vec![name]));
                found = true;
                continue 'methods;
            }
        }
        kept.push(method);
    }
    if found {
        env.add_type_tag_bits(ty, TagBits::HAS_DUPLICATES);
    }
    *methods = kept;
}

#[cfg(test)]
mod tests {
    use super::*;
    use nova_bindings::CompilerOptions;
    use nova_decl::{MinimalJdk, TypeRef};

    #[test]
    fn member_types_get_nested_binary_names() {
        let mut env = Environment::new(CompilerOptions::default(), MinimalJdk::new()).unwrap();
        let completer = SourceCompleter::new();
        let unit = CompilationUnit::new("Outer.java", Some("p")).with_type(
            TypeDecl::class("Outer")
                .member(TypeDecl::interface("Inner"))
                .method(MethodDecl::new("run", TypeRef::parse("void").unwrap())),
        );
        let context = completer.register_unit(&mut env, &unit);

        assert_eq!(context.types.len(), 1);
        let inner = env.loaded_type("p.Outer$Inner").unwrap();
        let class = env.class(inner).unwrap();
        assert!(class.is_static());
        assert!(class.modifiers.contains(Modifiers::INTERFACE));
        assert_eq!(completer.types().len(), 2);
    }
}
