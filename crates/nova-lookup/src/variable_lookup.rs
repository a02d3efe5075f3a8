//! Variable and field resolution.

use std::collections::VecDeque;

use nova_bindings::{
    original_field, superclass, superinterfaces, BindingKind, Environment, FieldData, FieldId,
    FieldKind, Problem, ProblemId, ProblemReason, TagBits, TypeId,
};
use nova_decl::{Modifiers, Span};
use rustc_hash::FxHashSet;

use crate::scope::{LocalVariable, Scope, ScopeKind, UnitContext};
use crate::type_lookup::find_qualified_type;
use crate::visibility::{can_field_be_seen_by, AccessContext};

/// What a simple name used as an expression refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariableBinding {
    /// `depth` counts the class boundaries between the use and the
    /// declaring method; non-zero means the local is captured.
    Local { local: LocalVariable, depth: u32 },
    /// `depth` counts the class boundaries between the use and the class
    /// the field was found in.
    Field { field: FieldId, depth: u32 },
    Problem {
        name: String,
        reason: ProblemReason,
        closest_match: Option<FieldId>,
    },
}

impl VariableBinding {
    pub fn is_valid(&self) -> bool {
        !matches!(self, VariableBinding::Problem { .. })
    }

    pub fn field(&self) -> Option<FieldId> {
        match self {
            VariableBinding::Field { field, .. } => Some(*field),
            _ => None,
        }
    }

    pub fn reason(&self) -> Option<ProblemReason> {
        match self {
            VariableBinding::Problem { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    fn problem(name: &str, reason: ProblemReason, closest_match: Option<FieldId>) -> Self {
        VariableBinding::Problem {
            name: name.to_string(),
            reason,
            closest_match,
        }
    }
}

/// A problem field standing in for `name`, modelled on `closest_match`
/// when there is one.
pub fn create_problem_field(
    env: &mut Environment,
    name: &str,
    reason: ProblemReason,
    closest_match: Option<FieldId>,
) -> FieldId {
    let (ty, declaring_class, modifiers) = match closest_match {
        Some(closest) => {
            let data = env.field(closest);
            (data.ty, data.declaring_class, data.modifiers)
        }
        None => (
            env.create_problem_type(name, ProblemReason::NotFound, None),
            None,
            Modifiers::empty(),
        ),
    };
    env.create_field(FieldData {
        name: name.to_string(),
        ty,
        modifiers,
        declaring_class,
        kind: FieldKind::Problem {
            reason,
            closest_match,
        },
        tag_bits: TagBits::empty(),
        span: Span::default(),
    })
}

enum FieldLookup {
    Found(FieldId),
    NotVisible(FieldId),
    Ambiguous(FieldId),
    NotFound,
}

/// Fields of `receiver` and its supertypes named `name`: the superclass
/// chain first, then the superinterfaces of the classes passed on the way.
/// A field inherited along two paths from distinct declarations is
/// ambiguous.
fn lookup_field(env: &mut Environment, receiver: TypeId, name: &str, ctx: &AccessContext) -> FieldLookup {
    match env.kind(receiver) {
        BindingKind::Base | BindingKind::Problem | BindingKind::Wildcard => return FieldLookup::NotFound,
        BindingKind::Array => {
            return if name == "length" {
                FieldLookup::Found(env.array_length_field())
            } else {
                FieldLookup::NotFound
            };
        }
        _ => {}
    }

    let mut visible: Option<FieldId> = None;
    let mut not_visible: Option<FieldId> = None;
    let mut interfaces: VecDeque<TypeId> = VecDeque::new();
    let mut seen = FxHashSet::default();

    let mut current = Some(receiver);
    while let Some(ty) = current {
        if let Some(generic) = env.generic_of(ty) {
            if !seen.insert(generic) {
                break;
            }
        }
        if env.kind(ty).is_declared_type() {
            if let Some(field) = env.get_field(ty, name) {
                if can_field_be_seen_by(env, field, receiver, ctx) {
                    // Hides every field of the same name in `ty`'s supertypes.
                    visible = Some(field);
                    break;
                }
                if ty == receiver {
                    return FieldLookup::NotVisible(field);
                }
                not_visible.get_or_insert(field);
            }
        }
        interfaces.extend(superinterfaces(env, ty));
        current = superclass(env, ty);
    }

    while let Some(ty) = interfaces.pop_front() {
        let Some(generic) = env.generic_of(ty) else {
            continue;
        };
        if !seen.insert(generic) {
            continue;
        }
        match env.get_field(ty, name) {
            Some(field) if can_field_be_seen_by(env, field, receiver, ctx) => match visible {
                None => visible = Some(field),
                Some(previous) if original_field(env, previous) == original_field(env, field) => {}
                Some(previous) => return FieldLookup::Ambiguous(previous),
            },
            Some(field) => {
                not_visible.get_or_insert(field);
            }
            None => interfaces.extend(superinterfaces(env, ty)),
        }
    }

    match (visible, not_visible) {
        (Some(field), _) => FieldLookup::Found(field),
        (None, Some(field)) => FieldLookup::NotVisible(field),
        (None, None) => FieldLookup::NotFound,
    }
}

/// The field `name` of `receiver`, declared or inherited. Problem fields
/// are answered for ambiguous or invisible matches; `None` when nothing
/// matches, including for primitive receivers.
pub fn find_field(env: &mut Environment, receiver: TypeId, name: &str, ctx: &AccessContext) -> Option<FieldId> {
    match lookup_field(env, receiver, name, ctx) {
        FieldLookup::Found(field) => Some(field),
        FieldLookup::NotVisible(field) => Some(create_problem_field(
            env,
            name,
            ProblemReason::NotVisible,
            Some(field),
        )),
        FieldLookup::Ambiguous(field) => Some(create_problem_field(
            env,
            name,
            ProblemReason::Ambiguous,
            Some(field),
        )),
        FieldLookup::NotFound => None,
    }
}

fn is_declared_in(env: &Environment, field: FieldId, ty: TypeId) -> bool {
    let declaring = env.field(field).declaring_class;
    declaring.and_then(|d| env.generic_of(d)) == env.generic_of(ty)
}

/// Resolves the simple name `name` used as a variable in `scope`.
pub fn get_variable(env: &mut Environment, scope: &Scope<'_>, name: &str) -> VariableBinding {
    let ctx = AccessContext::from_scope(scope);
    let shadows = env.options().source_level.inherited_shadows_enclosing();
    let mut depth = 0u32;
    let mut in_static = false;
    let mut in_constructor_call = false;
    let mut not_visible: Option<FieldId> = None;
    // An inherited field found below 1.4, waiting to see whether an
    // enclosing class declares the same name.
    let mut inherited: Option<(FieldId, u32)> = None;

    for current in scope.ancestors() {
        match current.kind() {
            ScopeKind::Block {
                locals,
                in_constructor_call: prologue,
            } => {
                if inherited.is_none() {
                    if let Some(local) = locals.iter().rev().find(|local| local.name == name) {
                        return VariableBinding::Local {
                            local: local.clone(),
                            depth,
                        };
                    }
                }
                in_constructor_call |= *prologue;
            }
            ScopeKind::Method(method) => {
                if inherited.is_none() {
                    if let Some(local) = method.parameters.iter().find(|local| local.name == name) {
                        return VariableBinding::Local {
                            local: local.clone(),
                            depth,
                        };
                    }
                }
                in_static |= method.is_static;
            }
            ScopeKind::Class(ty) => {
                let ty = *ty;
                match lookup_field(env, ty, name, &ctx) {
                    FieldLookup::Found(field) => {
                        if let Some((hiding, hiding_depth)) = inherited {
                            if is_declared_in(env, field, ty) {
                                tracing::debug!(
                                    target: "nova.lookup",
                                    name = %name,
                                    "inherited field hides enclosing declaration"
                                );
                                env.report(Problem::error(
                                    ProblemId::InheritedFieldHidesEnclosingName,
                                    Span::default(),
                                    vec![name.to_string()],
                                ));
                                return VariableBinding::problem(
                                    name,
                                    ProblemReason::InheritedNameHidesEnclosingName,
                                    Some(hiding),
                                );
                            }
                            return VariableBinding::Field {
                                field: hiding,
                                depth: hiding_depth,
                            };
                        }

                        let is_static = env.field(field).is_static();
                        if !is_static && in_static {
                            return VariableBinding::problem(
                                name,
                                ProblemReason::NonStaticReferenceInStaticContext,
                                Some(field),
                            );
                        }
                        if !is_static && in_constructor_call {
                            return VariableBinding::problem(
                                name,
                                ProblemReason::NonStaticReferenceInConstructorInvocation,
                                Some(field),
                            );
                        }
                        if !shadows && !is_declared_in(env, field, ty) {
                            inherited = Some((field, depth));
                        } else {
                            return VariableBinding::Field { field, depth };
                        }
                    }
                    FieldLookup::Ambiguous(field) => {
                        if let Some((hiding, hiding_depth)) = inherited {
                            return VariableBinding::Field {
                                field: hiding,
                                depth: hiding_depth,
                            };
                        }
                        return VariableBinding::problem(name, ProblemReason::Ambiguous, Some(field));
                    }
                    FieldLookup::NotVisible(field) => {
                        not_visible.get_or_insert(field);
                    }
                    FieldLookup::NotFound => {}
                }
                in_static |= env.class(ty).is_some_and(|class| class.is_static());
                in_constructor_call = false;
                depth += 1;
            }
            ScopeKind::CompilationUnit(unit) => {
                if let Some((field, depth)) = inherited {
                    return VariableBinding::Field { field, depth };
                }
                if let Some(binding) = static_import_lookup(env, unit, name) {
                    return binding;
                }
            }
            ScopeKind::Module(_) => {}
        }
    }

    if let Some((field, depth)) = inherited {
        return VariableBinding::Field { field, depth };
    }
    match not_visible {
        Some(field) => VariableBinding::problem(name, ProblemReason::NotVisible, Some(field)),
        None => VariableBinding::problem(name, ProblemReason::NotFound, None),
    }
}

fn static_field(env: &mut Environment, container: &str, name: &str, ctx: &AccessContext) -> Option<FieldId> {
    let ty = find_qualified_type(env, container)?;
    match lookup_field(env, ty, name, ctx) {
        FieldLookup::Found(field) if env.field(field).is_static() => Some(field),
        _ => None,
    }
}

/// Single static imports, then on-demand ones. Two on-demand imports
/// bringing distinct fields make the name ambiguous.
fn static_import_lookup(env: &mut Environment, unit: &UnitContext, name: &str) -> Option<VariableBinding> {
    let ctx = AccessContext::in_package(unit.package.clone());
    for import in &unit.imports.static_single {
        if import.member != name {
            continue;
        }
        if let Some(field) = static_field(env, &import.ty, name, &ctx) {
            return Some(VariableBinding::Field { field, depth: 0 });
        }
    }

    let mut found: Option<FieldId> = None;
    for import in &unit.imports.static_star {
        let Some(field) = static_field(env, &import.ty, name, &ctx) else {
            continue;
        };
        match found {
            None => found = Some(field),
            Some(previous) if previous == field => {}
            Some(previous) => {
                env.report(Problem::error(
                    ProblemId::AmbiguousStaticImport,
                    import.span,
                    vec![name.to_string()],
                ));
                return Some(VariableBinding::problem(name, ProblemReason::Ambiguous, Some(previous)));
            }
        }
    }
    found.map(|field| VariableBinding::Field { field, depth: 0 })
}
