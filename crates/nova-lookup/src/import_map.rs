use nova_decl::{ImportDecl, Span};

/// The imports of one compilation unit, split by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportMap {
    pub type_single: Vec<TypeSingleImport>,
    pub type_star: Vec<TypeStarImport>,
    pub static_single: Vec<StaticSingleImport>,
    pub static_star: Vec<StaticStarImport>,
}

impl ImportMap {
    #[must_use]
    pub fn from_imports(imports: &[ImportDecl]) -> Self {
        let mut out = ImportMap::default();

        for import in imports {
            match import {
                ImportDecl::TypeSingle { name, span } => {
                    let name = name.trim();
                    if name.is_empty() {
                        continue;
                    }
                    let imported = name.rsplit('.').next().unwrap_or(name).to_string();
                    out.type_single.push(TypeSingleImport {
                        path: name.to_string(),
                        imported,
                        span: *span,
                    });
                }
                ImportDecl::TypeStar { prefix, span } => {
                    if prefix.trim().is_empty() {
                        continue;
                    }
                    out.type_star.push(TypeStarImport {
                        path: prefix.trim().to_string(),
                        span: *span,
                    });
                }
                ImportDecl::StaticSingle { ty, member, span } => {
                    if ty.trim().is_empty() || member.is_empty() {
                        continue;
                    }
                    out.static_single.push(StaticSingleImport {
                        ty: ty.trim().to_string(),
                        member: member.clone(),
                        span: *span,
                    });
                }
                ImportDecl::StaticStar { ty, span } => {
                    if ty.trim().is_empty() {
                        continue;
                    }
                    out.static_star.push(StaticStarImport {
                        ty: ty.trim().to_string(),
                        span: *span,
                    });
                }
            }
        }

        out
    }

    pub fn is_empty(&self) -> bool {
        self.type_single.is_empty()
            && self.type_star.is_empty()
            && self.static_single.is_empty()
            && self.static_star.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSingleImport {
    /// Dotted source name, e.g. `java.util.Map.Entry`.
    pub path: String,
    pub imported: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeStarImport {
    /// `import X.*;` where `X` names a package or a type (JLS 7.5.2). Lookup
    /// tries the type reading first.
    pub path: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticSingleImport {
    pub ty: String,
    pub member: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticStarImport {
    pub ty: String,
    pub span: Span,
}
