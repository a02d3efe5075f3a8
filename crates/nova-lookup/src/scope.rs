//! Lexical scopes.
//!
//! A scope chain is a stack of [`Scope`] values linked by borrowed parent
//! pointers: `Module? > CompilationUnit > Class > (Method > Block*)` with
//! further `Class` scopes for nested types. Lookups start at the innermost
//! scope and walk outward; see [`crate::type_lookup`],
//! [`crate::variable_lookup`] and [`crate::method_lookup`].

use std::rc::Rc;

use nova_bindings::{Environment, MethodId, TypeId};
use nova_decl::{ModuleDecl, Span};

use crate::import_map::ImportMap;

/// Everything lookups need to know about one compilation unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitContext {
    pub name: String,
    /// Empty for the default package.
    pub package: String,
    pub imports: ImportMap,
    pub module: Option<ModuleDecl>,
    /// Top-level types declared in the unit.
    pub types: Vec<TypeId>,
}

impl UnitContext {
    pub fn qualify(&self, simple_name: &str) -> String {
        if self.package.is_empty() {
            simple_name.to_string()
        } else {
            format!("{}.{simple_name}", self.package)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVariable {
    pub name: String,
    pub ty: TypeId,
    pub span: Span,
    pub is_parameter: bool,
}

impl LocalVariable {
    pub fn new(name: impl Into<String>, ty: TypeId) -> Self {
        Self {
            name: name.into(),
            ty,
            span: Span::default(),
            is_parameter: false,
        }
    }

    pub fn parameter(name: impl Into<String>, ty: TypeId) -> Self {
        Self {
            is_parameter: true,
            ..Self::new(name, ty)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodScope {
    pub method: Option<MethodId>,
    pub type_variables: Vec<TypeId>,
    pub parameters: Vec<LocalVariable>,
    pub is_static: bool,
    pub is_constructor: bool,
}

impl MethodScope {
    /// Scope of a method binding: its type variables, parameters (named
    /// after the binding's parameter names) and staticness.
    pub fn of(env: &Environment, method: MethodId) -> Self {
        let data = env.method(method);
        let parameters = data
            .parameters
            .iter()
            .enumerate()
            .map(|(idx, &ty)| {
                let name = data
                    .parameter_names
                    .get(idx)
                    .cloned()
                    .unwrap_or_else(|| format!("arg{idx}"));
                LocalVariable::parameter(name, ty)
            })
            .collect();
        Self {
            method: Some(method),
            type_variables: data.type_variables.clone(),
            parameters,
            is_static: data.is_static(),
            is_constructor: data.is_constructor(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeKind {
    /// Packages readable from the unit's module, searched last for types.
    Module(ModuleDecl),
    CompilationUnit(Rc<UnitContext>),
    Class(TypeId),
    Method(MethodScope),
    Block {
        locals: Vec<LocalVariable>,
        /// Inside the arguments of an explicit `this(...)`/`super(...)` call.
        in_constructor_call: bool,
    },
}

#[derive(Debug, Clone)]
pub struct Scope<'a> {
    parent: Option<&'a Scope<'a>>,
    kind: ScopeKind,
}

impl<'a> Scope<'a> {
    pub fn module(module: ModuleDecl) -> Self {
        Self {
            parent: None,
            kind: ScopeKind::Module(module),
        }
    }

    pub fn compilation_unit(parent: Option<&'a Scope<'a>>, unit: Rc<UnitContext>) -> Self {
        Self {
            parent,
            kind: ScopeKind::CompilationUnit(unit),
        }
    }

    pub fn class(parent: &'a Scope<'a>, ty: TypeId) -> Self {
        Self {
            parent: Some(parent),
            kind: ScopeKind::Class(ty),
        }
    }

    pub fn method(parent: &'a Scope<'a>, method: MethodScope) -> Self {
        Self {
            parent: Some(parent),
            kind: ScopeKind::Method(method),
        }
    }

    pub fn block(parent: &'a Scope<'a>) -> Self {
        Self {
            parent: Some(parent),
            kind: ScopeKind::Block {
                locals: Vec::new(),
                in_constructor_call: false,
            },
        }
    }

    /// Block holding the arguments of an explicit constructor call, where
    /// the instance under construction cannot be referenced.
    pub fn constructor_call(parent: &'a Scope<'a>) -> Self {
        Self {
            parent: Some(parent),
            kind: ScopeKind::Block {
                locals: Vec::new(),
                in_constructor_call: true,
            },
        }
    }

    /// Declares a local in a block or method scope. Ignored elsewhere.
    pub fn declare(&mut self, local: LocalVariable) {
        match &mut self.kind {
            ScopeKind::Block { locals, .. } => locals.push(local),
            ScopeKind::Method(method) => method.parameters.push(local),
            _ => {}
        }
    }

    pub fn with_local(mut self, local: LocalVariable) -> Self {
        self.declare(local);
        self
    }

    pub fn parent(&self) -> Option<&'a Scope<'a>> {
        self.parent
    }

    pub fn kind(&self) -> &ScopeKind {
        &self.kind
    }

    /// This scope, then its parents outward.
    pub fn ancestors(&self) -> impl Iterator<Item = &Scope<'a>> + '_ {
        std::iter::successors(Some(self), |scope| scope.parent)
    }

    /// Innermost enclosing type.
    pub fn enclosing_type(&self) -> Option<TypeId> {
        self.ancestors().find_map(|scope| match scope.kind {
            ScopeKind::Class(ty) => Some(ty),
            _ => None,
        })
    }

    pub fn enclosing_method(&self) -> Option<&MethodScope> {
        self.ancestors().find_map(|scope| match &scope.kind {
            ScopeKind::Method(method) => Some(method),
            _ => None,
        })
    }

    pub fn unit(&self) -> Option<&UnitContext> {
        self.ancestors().find_map(|scope| match &scope.kind {
            ScopeKind::CompilationUnit(unit) => Some(&**unit),
            _ => None,
        })
    }

    pub fn package(&self) -> &str {
        self.unit().map_or("", |unit| unit.package.as_str())
    }
}

/// Runs `f` in the scope of `unit`, with its module scope above it when
/// the unit belongs to a module.
pub(crate) fn with_unit_scope<R>(unit: &Rc<UnitContext>, f: impl FnOnce(&Scope<'_>) -> R) -> R {
    match &unit.module {
        Some(module) => {
            let module = Scope::module(module.clone());
            let scope = Scope::compilation_unit(Some(&module), unit.clone());
            f(&scope)
        }
        None => f(&Scope::compilation_unit(None, unit.clone())),
    }
}

/// Runs `f` in the class scopes of `chain` (outermost first) nested in
/// `parent`.
pub(crate) fn with_class_scopes<R>(
    parent: &Scope<'_>,
    chain: &[TypeId],
    f: impl FnOnce(&Scope<'_>) -> R,
) -> R {
    match chain.split_first() {
        None => f(parent),
        Some((&ty, rest)) => {
            let scope = Scope::class(parent, ty);
            with_class_scopes(&scope, rest, f)
        }
    }
}

/// The declaration of `ty` and its enclosing types, outermost first.
pub(crate) fn enclosing_chain(env: &Environment, ty: TypeId) -> Vec<TypeId> {
    let mut chain = vec![ty];
    let mut current = ty;
    while let Some(outer) = env.enclosing_type(current) {
        chain.push(outer);
        current = outer;
    }
    chain.reverse();
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use nova_bindings::{BaseType, CompilerOptions};
    use nova_decl::MinimalJdk;

    #[test]
    fn chains_walk_outward() {
        let env = Environment::new(CompilerOptions::default(), MinimalJdk::new()).unwrap();
        let int = env.base(BaseType::Int);
        let unit = Rc::new(UnitContext {
            name: "A.java".to_string(),
            package: "p".to_string(),
            imports: ImportMap::default(),
            module: None,
            types: Vec::new(),
        });
        let cu = Scope::compilation_unit(None, unit);
        let method = Scope::method(&cu, MethodScope::default());
        let block = Scope::block(&method).with_local(LocalVariable::new("x", int));

        assert_eq!(block.ancestors().count(), 3);
        assert_eq!(block.package(), "p");
        assert!(block.enclosing_method().is_some());
        assert!(block.enclosing_type().is_none());
        match block.kind() {
            ScopeKind::Block { locals, .. } => assert_eq!(locals[0].name, "x"),
            other => panic!("unexpected scope {other:?}"),
        }
    }
}
