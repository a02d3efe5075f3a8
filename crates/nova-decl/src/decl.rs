//! Source declarations consumed by the binding engine.
//!
//! A parser produces these; the engine never mutates them. The builders are
//! small conveniences for fixtures and embedders that assemble declarations
//! by hand.

use serde::{Deserialize, Serialize};

use crate::{Modifiers, Span, TypeRef};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilationUnit {
    /// File name, used in diagnostics only.
    pub name: String,
    pub package: Option<String>,
    pub module: Option<ModuleDecl>,
    pub imports: Vec<ImportDecl>,
    pub types: Vec<TypeDecl>,
}

impl CompilationUnit {
    pub fn new(name: impl Into<String>, package: Option<&str>) -> Self {
        Self {
            name: name.into(),
            package: package.map(str::to_string),
            module: None,
            imports: Vec::new(),
            types: Vec::new(),
        }
    }

    pub fn import(mut self, import: ImportDecl) -> Self {
        self.imports.push(import);
        self
    }

    pub fn with_type(mut self, decl: TypeDecl) -> Self {
        self.types.push(decl);
        self
    }

    pub fn in_module(mut self, module: ModuleDecl) -> Self {
        self.module = Some(module);
        self
    }

    pub fn package_name(&self) -> &str {
        self.package.as_deref().unwrap_or("")
    }
}

/// The module a compilation unit belongs to, with the packages it can read
/// from other modules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDecl {
    pub name: String,
    pub readable_packages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportDecl {
    /// `import a.b.C;`
    TypeSingle { name: String, span: Span },
    /// `import a.b.*;` (the prefix may also name a type)
    TypeStar { prefix: String, span: Span },
    /// `import static a.b.C.m;`
    StaticSingle {
        ty: String,
        member: String,
        span: Span,
    },
    /// `import static a.b.C.*;`
    StaticStar { ty: String, span: Span },
}

impl ImportDecl {
    pub fn single(name: &str) -> Self {
        ImportDecl::TypeSingle {
            name: name.to_string(),
            span: Span::default(),
        }
    }

    pub fn on_demand(prefix: &str) -> Self {
        ImportDecl::TypeStar {
            prefix: prefix.to_string(),
            span: Span::default(),
        }
    }

    pub fn static_single(ty: &str, member: &str) -> Self {
        ImportDecl::StaticSingle {
            ty: ty.to_string(),
            member: member.to_string(),
            span: Span::default(),
        }
    }

    pub fn static_on_demand(ty: &str) -> Self {
        ImportDecl::StaticStar {
            ty: ty.to_string(),
            span: Span::default(),
        }
    }

    pub fn span(&self) -> Span {
        match self {
            ImportDecl::TypeSingle { span, .. }
            | ImportDecl::TypeStar { span, .. }
            | ImportDecl::StaticSingle { span, .. }
            | ImportDecl::StaticStar { span, .. } => *span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeclKind {
    Class,
    Interface,
    Enum,
    Record,
    Annotation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    pub kind: DeclKind,
    pub modifiers: Modifiers,
    pub type_parameters: Vec<TypeParameterDecl>,
    pub superclass: Option<TypeRef>,
    pub superinterfaces: Vec<TypeRef>,
    pub permits: Vec<TypeRef>,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<MethodDecl>,
    pub components: Vec<RecordComponentDecl>,
    pub member_types: Vec<TypeDecl>,
    pub span: Span,
}

impl TypeDecl {
    pub fn new(kind: DeclKind, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            modifiers: Modifiers::empty(),
            type_parameters: Vec::new(),
            superclass: None,
            superinterfaces: Vec::new(),
            permits: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            components: Vec::new(),
            member_types: Vec::new(),
            span: Span::default(),
        }
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::new(DeclKind::Class, name)
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self::new(DeclKind::Interface, name)
    }

    pub fn enumeration(name: impl Into<String>) -> Self {
        Self::new(DeclKind::Enum, name)
    }

    pub fn record(name: impl Into<String>) -> Self {
        Self::new(DeclKind::Record, name)
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers |= modifiers;
        self
    }

    pub fn type_param(mut self, param: TypeParameterDecl) -> Self {
        self.type_parameters.push(param);
        self
    }

    pub fn extends(mut self, ty: TypeRef) -> Self {
        match self.kind {
            DeclKind::Interface | DeclKind::Annotation => self.superinterfaces.push(ty),
            _ => self.superclass = Some(ty),
        }
        self
    }

    pub fn implements(mut self, ty: TypeRef) -> Self {
        self.superinterfaces.push(ty);
        self
    }

    pub fn permits(mut self, ty: TypeRef) -> Self {
        self.permits.push(ty);
        self
    }

    pub fn field(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }

    pub fn method(mut self, method: MethodDecl) -> Self {
        self.methods.push(method);
        self
    }

    pub fn component(mut self, component: RecordComponentDecl) -> Self {
        self.components.push(component);
        self
    }

    pub fn member(mut self, decl: TypeDecl) -> Self {
        self.member_types.push(decl);
        self
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn is_interface(&self) -> bool {
        matches!(self.kind, DeclKind::Interface | DeclKind::Annotation)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeParameterDecl {
    pub name: String,
    pub bounds: Vec<TypeRef>,
    pub span: Span,
}

impl TypeParameterDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bounds: Vec::new(),
            span: Span::default(),
        }
    }

    pub fn bound(mut self, bound: TypeRef) -> Self {
        self.bounds.push(bound);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeRef,
    pub modifiers: Modifiers,
    pub is_enum_constant: bool,
    pub span: Span,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            modifiers: Modifiers::empty(),
            is_enum_constant: false,
            span: Span::default(),
        }
    }

    /// An enum constant; its type is filled in with the enclosing enum.
    pub fn enum_constant(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            ty: TypeRef::named(&name),
            name,
            modifiers: Modifiers::PUBLIC | Modifiers::STATIC | Modifiers::FINAL | Modifiers::ENUM,
            is_enum_constant: true,
            span: Span::default(),
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers |= modifiers;
        self
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamDecl {
    pub name: String,
    pub ty: TypeRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    pub modifiers: Modifiers,
    pub type_parameters: Vec<TypeParameterDecl>,
    pub params: Vec<ParamDecl>,
    /// `None` for constructors.
    pub return_type: Option<TypeRef>,
    pub thrown: Vec<TypeRef>,
    pub is_constructor: bool,
    /// Record compact canonical constructor (`Point { ... }`).
    pub is_compact_constructor: bool,
    pub is_varargs: bool,
    pub has_body: bool,
    pub span: Span,
}

impl MethodDecl {
    pub fn new(name: impl Into<String>, return_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            modifiers: Modifiers::empty(),
            type_parameters: Vec::new(),
            params: Vec::new(),
            return_type: Some(return_type),
            thrown: Vec::new(),
            is_constructor: false,
            is_compact_constructor: false,
            is_varargs: false,
            has_body: true,
            span: Span::default(),
        }
    }

    pub fn constructor() -> Self {
        Self {
            name: "<init>".to_string(),
            return_type: None,
            is_constructor: true,
            ..Self::new("<init>", TypeRef::Primitive(crate::PrimitiveKind::Void))
        }
    }

    pub fn compact_constructor() -> Self {
        Self {
            is_compact_constructor: true,
            ..Self::constructor()
        }
    }

    pub fn param(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.params.push(ParamDecl {
            name: name.into(),
            ty,
        });
        self
    }

    /// Marks the last parameter as variable arity; its type must already be
    /// an array.
    pub fn varargs(mut self) -> Self {
        self.is_varargs = true;
        self
    }

    pub fn type_param(mut self, param: TypeParameterDecl) -> Self {
        self.type_parameters.push(param);
        self
    }

    pub fn throws(mut self, ty: TypeRef) -> Self {
        self.thrown.push(ty);
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers |= modifiers;
        self
    }

    pub fn without_body(mut self) -> Self {
        self.has_body = false;
        self
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordComponentDecl {
    pub name: String,
    pub ty: TypeRef,
    pub is_varargs: bool,
    pub span: Span,
}

impl RecordComponentDecl {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            is_varargs: false,
            span: Span::default(),
        }
    }
}
