//! The binding model.
//!
//! Every type, method and field the engine knows about lives in an arena
//! owned by [`crate::Environment`] and is referred to by an opaque id. Kinds
//! are a closed sum ([`TypeKind`], [`MethodKind`], [`FieldKind`]); relational
//! queries (erasure, subtyping, substitution, ...) are free functions that
//! match on the kind.

use nova_decl::{Modifiers, PrimitiveKind, Span, TypeDefStub};

use crate::flags::TagBits;
use crate::ids::{FieldId, MethodId, TypeId};
use crate::lazy::Lazy;
use crate::nullness::NullAnnotation;
use crate::problem::ProblemReason;

/// Primitive types, `void` and the type of `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BaseType {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Void,
    Null,
}

impl BaseType {
    pub const ALL: [BaseType; 10] = [
        BaseType::Boolean,
        BaseType::Byte,
        BaseType::Char,
        BaseType::Short,
        BaseType::Int,
        BaseType::Long,
        BaseType::Float,
        BaseType::Double,
        BaseType::Void,
        BaseType::Null,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            BaseType::Boolean => "boolean",
            BaseType::Byte => "byte",
            BaseType::Char => "char",
            BaseType::Short => "short",
            BaseType::Int => "int",
            BaseType::Long => "long",
            BaseType::Float => "float",
            BaseType::Double => "double",
            BaseType::Void => "void",
            BaseType::Null => "null",
        }
    }

    /// Descriptor character. `null` has none in class files; `N` is used in
    /// keys only.
    pub fn descriptor(self) -> char {
        match self {
            BaseType::Boolean => 'Z',
            BaseType::Byte => 'B',
            BaseType::Char => 'C',
            BaseType::Short => 'S',
            BaseType::Int => 'I',
            BaseType::Long => 'J',
            BaseType::Float => 'F',
            BaseType::Double => 'D',
            BaseType::Void => 'V',
            BaseType::Null => 'N',
        }
    }

    pub fn boxed_name(self) -> Option<&'static str> {
        Some(match self {
            BaseType::Boolean => "java.lang.Boolean",
            BaseType::Byte => "java.lang.Byte",
            BaseType::Char => "java.lang.Character",
            BaseType::Short => "java.lang.Short",
            BaseType::Int => "java.lang.Integer",
            BaseType::Long => "java.lang.Long",
            BaseType::Float => "java.lang.Float",
            BaseType::Double => "java.lang.Double",
            BaseType::Void | BaseType::Null => return None,
        })
    }

    pub fn from_boxed_name(binary_name: &str) -> Option<BaseType> {
        BaseType::ALL
            .into_iter()
            .find(|base| base.boxed_name() == Some(binary_name))
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            BaseType::Byte
                | BaseType::Char
                | BaseType::Short
                | BaseType::Int
                | BaseType::Long
                | BaseType::Float
                | BaseType::Double
        )
    }

    /// Identity or widening primitive conversion (JLS 5.1.2).
    pub fn widens_to(self, target: BaseType) -> bool {
        if self == target {
            return !matches!(self, BaseType::Null);
        }
        use BaseType::*;
        match self {
            Byte => matches!(target, Short | Int | Long | Float | Double),
            Short | Char => matches!(target, Int | Long | Float | Double),
            Int => matches!(target, Long | Float | Double),
            Long => matches!(target, Float | Double),
            Float => matches!(target, Double),
            _ => false,
        }
    }

    pub fn from_primitive(kind: PrimitiveKind) -> BaseType {
        match kind {
            PrimitiveKind::Boolean => BaseType::Boolean,
            PrimitiveKind::Byte => BaseType::Byte,
            PrimitiveKind::Char => BaseType::Char,
            PrimitiveKind::Short => BaseType::Short,
            PrimitiveKind::Int => BaseType::Int,
            PrimitiveKind::Long => BaseType::Long,
            PrimitiveKind::Float => BaseType::Float,
            PrimitiveKind::Double => BaseType::Double,
            PrimitiveKind::Void => BaseType::Void,
        }
    }

    pub fn from_signature(base: nova_decl::signature::BaseType) -> BaseType {
        use nova_decl::signature::BaseType as Sig;
        match base {
            Sig::Byte => BaseType::Byte,
            Sig::Char => BaseType::Char,
            Sig::Double => BaseType::Double,
            Sig::Float => BaseType::Float,
            Sig::Int => BaseType::Int,
            Sig::Long => BaseType::Long,
            Sig::Short => BaseType::Short,
            Sig::Boolean => BaseType::Boolean,
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassSort {
    Class,
    Interface,
    Enum,
    Record,
    Annotation,
}

impl ClassSort {
    pub fn is_interface(self) -> bool {
        matches!(self, ClassSort::Interface | ClassSort::Annotation)
    }
}

/// Index of a source type in the completer's tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceKey(pub u32);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeOrigin {
    Source(SourceKey),
    Binary(Box<TypeDefStub>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hierarchy {
    /// `None` for `java.lang.Object` and for interfaces.
    pub superclass: Option<TypeId>,
    pub superinterfaces: Vec<TypeId>,
}

/// A class, interface, enum, record or annotation declaration. When it has
/// type variables it is a *generic declaration*.
#[derive(Debug, Clone)]
pub struct ClassData {
    /// Dotted binary name (`java.util.Map$Entry`).
    pub binary_name: String,
    /// Source name (`java.util.Map.Entry`).
    pub qualified_name: String,
    pub simple_name: String,
    pub package: String,
    pub sort: ClassSort,
    pub modifiers: Modifiers,
    pub enclosing: Option<TypeId>,
    pub origin: TypeOrigin,
    pub type_variables: Vec<TypeId>,
    pub member_types: Vec<TypeId>,
    pub span: Span,
    pub(crate) hierarchy: Lazy<Hierarchy>,
    pub(crate) permitted: Vec<TypeId>,
    pub(crate) fields: Lazy<Vec<FieldId>>,
    pub(crate) methods: Lazy<Vec<MethodId>>,
    pub(crate) components: Lazy<Vec<FieldId>>,
}

impl ClassData {
    pub fn new(binary_name: impl Into<String>, sort: ClassSort, origin: TypeOrigin) -> Self {
        let binary_name = binary_name.into();
        let (package, types) = nova_decl::split_binary_name(&binary_name);
        let simple_name = types.rsplit('$').next().unwrap_or(types).to_string();
        let qualified_name = if package.is_empty() {
            types.replace('$', ".")
        } else {
            format!("{package}.{}", types.replace('$', "."))
        };
        Self {
            package: package.to_string(),
            qualified_name,
            simple_name,
            binary_name,
            sort,
            modifiers: Modifiers::empty(),
            enclosing: None,
            origin,
            type_variables: Vec::new(),
            member_types: Vec::new(),
            span: Span::default(),
            hierarchy: Lazy::Unbuilt,
            permitted: Vec::new(),
            fields: Lazy::Unbuilt,
            methods: Lazy::Unbuilt,
            components: Lazy::Unbuilt,
        }
    }

    pub fn is_interface(&self) -> bool {
        self.sort.is_interface()
    }

    pub fn is_generic(&self) -> bool {
        !self.type_variables.is_empty()
    }

    pub fn is_static(&self) -> bool {
        // Nested interfaces, enums and records are implicitly static.
        self.enclosing.is_none()
            || self.modifiers.contains(Modifiers::STATIC)
            || !matches!(self.sort, ClassSort::Class)
    }

    pub fn is_member(&self) -> bool {
        self.enclosing.is_some()
    }

    pub fn is_source(&self) -> bool {
        matches!(self.origin, TypeOrigin::Source(_))
    }

    pub fn is_hierarchy_connected(&self) -> bool {
        self.hierarchy.is_built()
    }

    pub fn permitted_subtypes(&self) -> &[TypeId] {
        &self.permitted
    }
}

/// A generic declaration applied to arguments, or (with no arguments) a raw
/// reference to it.
#[derive(Debug, Clone)]
pub struct ParameterizedData {
    pub generic: TypeId,
    /// Empty for raw types and for non-generic members of a parameterized
    /// enclosing type.
    pub arguments: Vec<TypeId>,
    pub enclosing: Option<TypeId>,
    pub(crate) hierarchy: Lazy<Hierarchy>,
    pub(crate) fields: Lazy<Vec<FieldId>>,
    pub(crate) methods: Lazy<Vec<MethodId>>,
}

impl ParameterizedData {
    pub(crate) fn new(generic: TypeId, arguments: Vec<TypeId>, enclosing: Option<TypeId>) -> Self {
        Self {
            generic,
            arguments,
            enclosing,
            hierarchy: Lazy::Unbuilt,
            fields: Lazy::Unbuilt,
            methods: Lazy::Unbuilt,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Declarer {
    Type(TypeId),
    Method(MethodId),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeVariableBounds {
    /// `None` means `java.lang.Object`.
    pub superclass: Option<TypeId>,
    pub superinterfaces: Vec<TypeId>,
    /// The bound written first, class or interface.
    pub first_bound: Option<TypeId>,
}

impl TypeVariableBounds {
    pub fn all(&self) -> Vec<TypeId> {
        let mut all = Vec::new();
        all.extend(self.first_bound);
        if let Some(superclass) = self.superclass {
            if !all.contains(&superclass) {
                all.push(superclass);
            }
        }
        for &iface in &self.superinterfaces {
            if !all.contains(&iface) {
                all.push(iface);
            }
        }
        all
    }
}

#[derive(Debug, Clone)]
pub struct TypeVariableData {
    pub name: String,
    pub rank: u32,
    pub declarer: Declarer,
    pub(crate) bounds: Lazy<TypeVariableBounds>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WildcardKind {
    Unbound,
    Extends,
    Super,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WildcardData {
    /// The generic type whose argument this wildcard is, with its position.
    pub generic: Option<TypeId>,
    pub rank: u32,
    pub kind: WildcardKind,
    pub bound: Option<TypeId>,
    /// Additional bounds of an intersection wildcard (`? extends A & B`).
    pub other_bounds: Vec<TypeId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureBounds {
    pub superclass: Option<TypeId>,
    pub superinterfaces: Vec<TypeId>,
    pub first_bound: Option<TypeId>,
    pub lower_bound: Option<TypeId>,
}

/// Fresh type variable standing for one wildcard at one source position.
#[derive(Debug, Clone)]
pub struct CaptureData {
    pub wildcard: TypeId,
    /// Generic declaration of the captured parameterized type.
    pub source_type: TypeId,
    pub position: Span,
    pub rank: u32,
    /// Ordinal used in readable names (`capture#3-of ?`).
    pub id: u32,
    pub(crate) bounds: Lazy<CaptureBounds>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceVariableData {
    pub type_parameter: TypeId,
    pub rank: u32,
    /// Invocation the variable belongs to.
    pub site: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemTypeData {
    pub name: String,
    pub reason: ProblemReason,
    pub closest_match: Option<TypeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedData {
    pub unannotated: TypeId,
    pub annotation: NullAnnotation,
}

#[derive(Debug, Clone)]
pub enum TypeKind {
    Base(BaseType),
    Array { leaf: TypeId, dimensions: u32 },
    Class(Box<ClassData>),
    Parameterized(ParameterizedData),
    Raw(ParameterizedData),
    TypeVariable(TypeVariableData),
    Wildcard(WildcardData),
    Intersection(Vec<TypeId>),
    Capture(CaptureData),
    InferenceVariable(InferenceVariableData),
    Problem(ProblemTypeData),
    Annotated(AnnotatedData),
}

/// Integer-like tag for O(1) dispatch. Annotated types report the kind of
/// the type they annotate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    Base,
    Array,
    Class,
    Generic,
    Parameterized,
    Raw,
    TypeVariable,
    Wildcard,
    Intersection,
    Capture,
    InferenceVariable,
    Problem,
}

impl BindingKind {
    /// Class, interface, generic declaration, parameterized or raw type.
    pub fn is_declared_type(self) -> bool {
        matches!(
            self,
            BindingKind::Class | BindingKind::Generic | BindingKind::Parameterized | BindingKind::Raw
        )
    }

    pub fn is_type_variable_like(self) -> bool {
        matches!(
            self,
            BindingKind::TypeVariable | BindingKind::Capture | BindingKind::InferenceVariable
        )
    }
}

#[derive(Debug, Clone)]
pub struct TypeData {
    pub kind: TypeKind,
    pub tag_bits: TagBits,
    pub(crate) erasure: Option<TypeId>,
}

impl TypeData {
    pub(crate) fn new(kind: TypeKind, tag_bits: TagBits) -> Self {
        Self {
            kind,
            tag_bits,
            erasure: None,
        }
    }

    pub fn binding_kind(&self) -> BindingKind {
        match &self.kind {
            TypeKind::Base(_) => BindingKind::Base,
            TypeKind::Array { .. } => BindingKind::Array,
            TypeKind::Class(class) if class.is_generic() => BindingKind::Generic,
            TypeKind::Class(_) => BindingKind::Class,
            TypeKind::Parameterized(_) => BindingKind::Parameterized,
            TypeKind::Raw(_) => BindingKind::Raw,
            TypeKind::TypeVariable(_) => BindingKind::TypeVariable,
            TypeKind::Wildcard(_) => BindingKind::Wildcard,
            TypeKind::Intersection(_) => BindingKind::Intersection,
            TypeKind::Capture(_) => BindingKind::Capture,
            TypeKind::InferenceVariable(_) => BindingKind::InferenceVariable,
            TypeKind::Problem(_) => BindingKind::Problem,
            // Resolved through the environment; never stored nested.
            TypeKind::Annotated(_) => BindingKind::Class,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntheticKind {
    DefaultConstructor,
    EnumValues,
    EnumValueOf,
    RecordCanonicalConstructor,
    RecordAccessor,
    RecordToString,
    RecordHashCode,
    RecordEquals,
    OuterLocalField,
    EnclosingInstanceField,
    PrivateAccess,
    SwitchTableField,
    SwitchTableMethod,
    LambdaMethod,
    BridgeMethod,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodKind {
    Declared,
    /// Member of a parameterized or raw type.
    Parameterized { original: MethodId },
    /// Generic method applied to (explicit or inferred) type arguments.
    ParameterizedGeneric {
        original: MethodId,
        type_arguments: Vec<TypeId>,
        is_raw: bool,
        inferred: bool,
    },
    /// Copy whose thrown types are the intersection of several inherited
    /// abstract methods' throws clauses.
    MostSpecificExceptions { original: MethodId },
    Synthetic(SyntheticKind),
    Problem {
        reason: ProblemReason,
        closest_match: Option<MethodId>,
    },
}

#[derive(Debug, Clone)]
pub struct MethodData {
    pub selector: String,
    pub modifiers: Modifiers,
    pub declaring_class: TypeId,
    pub type_variables: Vec<TypeId>,
    pub parameters: Vec<TypeId>,
    pub parameter_names: Vec<String>,
    /// `void` for constructors.
    pub return_type: TypeId,
    pub thrown: Vec<TypeId>,
    pub kind: MethodKind,
    pub tag_bits: TagBits,
    pub span: Span,
}

pub const CONSTRUCTOR_NAME: &str = "<init>";

impl MethodData {
    pub fn is_constructor(&self) -> bool {
        self.selector == CONSTRUCTOR_NAME
    }

    pub fn is_static(&self) -> bool {
        self.modifiers.contains(Modifiers::STATIC)
    }

    pub fn is_private(&self) -> bool {
        self.modifiers.contains(Modifiers::PRIVATE)
    }

    pub fn is_abstract(&self) -> bool {
        self.modifiers.contains(Modifiers::ABSTRACT)
    }

    pub fn is_default(&self) -> bool {
        self.modifiers.contains(Modifiers::DEFAULT)
    }

    pub fn is_varargs(&self) -> bool {
        self.modifiers.contains(Modifiers::VARARGS)
    }

    pub fn is_bridge(&self) -> bool {
        self.modifiers.contains(Modifiers::BRIDGE)
    }

    pub fn is_synthetic(&self) -> bool {
        self.modifiers.contains(Modifiers::SYNTHETIC) || matches!(self.kind, MethodKind::Synthetic(_))
    }

    pub fn is_generic(&self) -> bool {
        !self.type_variables.is_empty()
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self.kind, MethodKind::Problem { .. })
    }

    pub fn problem_reason(&self) -> Option<ProblemReason> {
        match self.kind {
            MethodKind::Problem { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Declared,
    EnumConstant,
    /// The implicit private field backing a record component.
    RecordComponent,
    Parameterized { original: FieldId },
    Synthetic(SyntheticKind),
    Problem {
        reason: ProblemReason,
        closest_match: Option<FieldId>,
    },
}

#[derive(Debug, Clone)]
pub struct FieldData {
    pub name: String,
    pub ty: TypeId,
    pub modifiers: Modifiers,
    pub declaring_class: Option<TypeId>,
    pub kind: FieldKind,
    pub tag_bits: TagBits,
    pub span: Span,
}

impl FieldData {
    pub fn is_static(&self) -> bool {
        self.modifiers.contains(Modifiers::STATIC)
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self.kind, FieldKind::Problem { .. })
    }

    pub fn problem_reason(&self) -> Option<ProblemReason> {
        match self.kind {
            FieldKind::Problem { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widening_follows_jls_table() {
        assert!(BaseType::Byte.widens_to(BaseType::Int));
        assert!(BaseType::Char.widens_to(BaseType::Long));
        assert!(BaseType::Long.widens_to(BaseType::Float));
        assert!(!BaseType::Char.widens_to(BaseType::Short));
        assert!(!BaseType::Int.widens_to(BaseType::Char));
        assert!(!BaseType::Boolean.widens_to(BaseType::Int));
        assert!(!BaseType::Null.widens_to(BaseType::Null));
    }

    #[test]
    fn class_names_are_derived_from_binary_name() {
        let class = ClassData::new(
            "java.util.Map$Entry",
            ClassSort::Interface,
            TypeOrigin::Source(SourceKey(0)),
        );
        assert_eq!(class.package, "java.util");
        assert_eq!(class.simple_name, "Entry");
        assert_eq!(class.qualified_name, "java.util.Map.Entry");
    }

    #[test]
    fn boxes_round_trip() {
        for base in BaseType::ALL {
            if let Some(name) = base.boxed_name() {
                assert_eq!(BaseType::from_boxed_name(name), Some(base));
            }
        }
    }
}
