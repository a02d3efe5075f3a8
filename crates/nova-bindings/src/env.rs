//! The environment: arena, interner and lazy-stage dispatcher for bindings.
//!
//! `Environment` is the single owner of every binding. All
//! create-or-fetch operations go through it so that structurally equal
//! parameterizations, arrays, wildcards and captures share one [`TypeId`],
//! which makes `==` on ids the identity test.

use std::fmt;
use std::rc::Rc;

use nova_decl::{Modifiers, Span, TypeProvider};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::binary;
use crate::binding::{
    AnnotatedData, BaseType, BindingKind, CaptureBounds, CaptureData, ClassData, Declarer,
    FieldData, FieldKind, Hierarchy, InferenceVariableData, MethodData, ParameterizedData, ProblemTypeData,
    TypeData, TypeKind, TypeVariableBounds, TypeVariableData, WildcardData, WildcardKind,
};
use crate::flags::TagBits;
use crate::ids::{FieldId, MethodId, TypeId};
use crate::lazy::Lazy;
use crate::members;
use crate::nullness::{self, NullAnnotation};
use crate::options::CompilerOptions;
use crate::problem::{AbortCompilation, Problem, ProblemCollector, ProblemReason, ProblemReporter};

/// Builds the lazy stages of source types.
///
/// Each method must finish its stage through the matching `Environment`
/// setter ([`Environment::set_hierarchy`], [`Environment::set_fields`], ...).
/// A stage left unfinished is completed with an empty value.
pub trait TypeCompleter {
    fn connect_hierarchy(&self, env: &mut Environment, ty: TypeId);
    fn build_fields(&self, env: &mut Environment, ty: TypeId);
    fn build_methods(&self, env: &mut Environment, ty: TypeId);
    fn build_components(&self, env: &mut Environment, ty: TypeId);
}

/// System types the engine needs by name. A missing one aborts compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WellKnown {
    Object,
    String,
    Class,
    Cloneable,
    Serializable,
    Enum,
    Record,
    Iterable,
    Throwable,
    Boolean,
    Byte,
    Character,
    Short,
    Integer,
    Long,
    Float,
    Double,
}

impl WellKnown {
    pub fn binary_name(self) -> &'static str {
        match self {
            WellKnown::Object => "java.lang.Object",
            WellKnown::String => "java.lang.String",
            WellKnown::Class => "java.lang.Class",
            WellKnown::Cloneable => "java.lang.Cloneable",
            WellKnown::Serializable => "java.io.Serializable",
            WellKnown::Enum => "java.lang.Enum",
            WellKnown::Record => "java.lang.Record",
            WellKnown::Iterable => "java.lang.Iterable",
            WellKnown::Throwable => "java.lang.Throwable",
            WellKnown::Boolean => "java.lang.Boolean",
            WellKnown::Byte => "java.lang.Byte",
            WellKnown::Character => "java.lang.Character",
            WellKnown::Short => "java.lang.Short",
            WellKnown::Integer => "java.lang.Integer",
            WellKnown::Long => "java.lang.Long",
            WellKnown::Float => "java.lang.Float",
            WellKnown::Double => "java.lang.Double",
        }
    }

    pub fn boxing(base: BaseType) -> Option<WellKnown> {
        Some(match base {
            BaseType::Boolean => WellKnown::Boolean,
            BaseType::Byte => WellKnown::Byte,
            BaseType::Char => WellKnown::Character,
            BaseType::Short => WellKnown::Short,
            BaseType::Int => WellKnown::Integer,
            BaseType::Long => WellKnown::Long,
            BaseType::Float => WellKnown::Float,
            BaseType::Double => WellKnown::Double,
            BaseType::Void | BaseType::Null => return None,
        })
    }
}

type WildcardKey = (Option<TypeId>, u32, WildcardKind, Option<TypeId>, Vec<TypeId>);

#[derive(Default)]
struct Interner {
    arrays: FxHashMap<(TypeId, u32), TypeId>,
    parameterized: FxHashMap<(TypeId, Vec<TypeId>, Option<TypeId>), TypeId>,
    raw: FxHashMap<(TypeId, Option<TypeId>), TypeId>,
    wildcards: FxHashMap<WildcardKey, TypeId>,
    intersections: FxHashMap<Vec<TypeId>, TypeId>,
    captures: FxHashMap<(TypeId, TypeId, Span, u32), TypeId>,
    annotated: FxHashMap<(TypeId, NullAnnotation), TypeId>,
    problems: FxHashMap<(String, ProblemReason, Option<TypeId>), TypeId>,
    parameterized_methods: FxHashMap<(MethodId, TypeId), MethodId>,
    parameterized_fields: FxHashMap<(FieldId, TypeId), FieldId>,
    generic_methods: FxHashMap<(MethodId, Vec<TypeId>, bool), MethodId>,
}

pub struct Environment {
    types: Vec<TypeData>,
    methods: Vec<MethodData>,
    fields: Vec<FieldData>,
    interner: Interner,
    by_binary_name: FxHashMap<String, TypeId>,
    not_found: FxHashSet<String>,
    known_packages: FxHashSet<String>,
    well_known: FxHashMap<WellKnown, TypeId>,
    provider: Box<dyn TypeProvider>,
    options: CompilerOptions,
    reporter: Box<dyn ProblemReporter>,
    completer: Option<Rc<dyn TypeCompleter>>,
    current_unit: Option<String>,
    next_capture_id: u32,
    next_inference_site: u32,
    array_length: Option<FieldId>,
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("types", &self.types.len())
            .field("methods", &self.methods.len())
            .field("fields", &self.fields.len())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Environment {
    /// Creates an environment over `provider`. Fails when `java.lang.Object`
    /// cannot be loaded.
    pub fn new(
        options: CompilerOptions,
        provider: impl TypeProvider + 'static,
    ) -> Result<Self, AbortCompilation> {
        let mut env = Self {
            types: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
            interner: Interner::default(),
            by_binary_name: FxHashMap::default(),
            not_found: FxHashSet::default(),
            known_packages: FxHashSet::default(),
            well_known: FxHashMap::default(),
            provider: Box::new(provider),
            options,
            reporter: Box::new(ProblemCollector::new()),
            completer: None,
            current_unit: None,
            next_capture_id: 0,
            next_inference_site: 0,
            array_length: None,
        };
        for base in BaseType::ALL {
            let id = env.push_type(TypeData::new(TypeKind::Base(base), TagBits::empty()));
            debug_assert_eq!(id.idx(), base.index());
        }

        let object = WellKnown::Object.binary_name();
        match env.get_type(object) {
            Some(id) => {
                env.well_known.insert(WellKnown::Object, id);
                Ok(env)
            }
            None => Err(AbortCompilation::missing_type(object)),
        }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn set_reporter(&mut self, reporter: Box<dyn ProblemReporter>) {
        self.reporter = reporter;
    }

    pub fn set_completer(&mut self, completer: Rc<dyn TypeCompleter>) {
        self.completer = Some(completer);
    }

    /// Unit name attached to subsequently reported problems.
    pub fn set_current_unit(&mut self, unit: Option<String>) {
        self.current_unit = unit;
    }

    pub fn current_unit(&self) -> Option<&str> {
        self.current_unit.as_deref()
    }

    pub fn report(&mut self, problem: Problem) {
        let problem = match (&problem.unit, &self.current_unit) {
            (None, Some(unit)) => problem.in_unit(unit.clone()),
            _ => problem,
        };
        self.reporter.report(problem);
    }

    // ----- arena access -------------------------------------------------

    pub fn ty(&self, ty: TypeId) -> &TypeData {
        &self.types[ty.idx()]
    }

    pub(crate) fn ty_mut(&mut self, ty: TypeId) -> &mut TypeData {
        &mut self.types[ty.idx()]
    }

    pub fn method(&self, method: MethodId) -> &MethodData {
        &self.methods[method.idx()]
    }

    pub fn method_mut(&mut self, method: MethodId) -> &mut MethodData {
        &mut self.methods[method.idx()]
    }

    pub fn field(&self, field: FieldId) -> &FieldData {
        &self.fields[field.idx()]
    }

    pub fn field_mut(&mut self, field: FieldId) -> &mut FieldData {
        &mut self.fields[field.idx()]
    }

    /// Kind of `ty`, looking through the null-annotation overlay.
    pub fn kind(&self, ty: TypeId) -> BindingKind {
        self.ty(nullness::unannotated(self, ty)).binding_kind()
    }

    /// Kind data of `ty`, looking through the null-annotation overlay.
    pub fn type_kind(&self, ty: TypeId) -> &TypeKind {
        &self.ty(nullness::unannotated(self, ty)).kind
    }

    pub fn tag_bits(&self, ty: TypeId) -> TagBits {
        self.ty(ty).tag_bits
    }

    /// Tag bits only accumulate.
    pub fn add_type_tag_bits(&mut self, ty: TypeId, bits: TagBits) {
        self.ty_mut(ty).tag_bits |= bits;
    }

    pub fn add_method_tag_bits(&mut self, method: MethodId, bits: TagBits) {
        self.method_mut(method).tag_bits |= bits;
    }

    pub fn class(&self, ty: TypeId) -> Option<&ClassData> {
        match self.type_kind(ty) {
            TypeKind::Class(class) => Some(class),
            _ => None,
        }
    }

    pub(crate) fn class_mut(&mut self, ty: TypeId) -> Option<&mut ClassData> {
        let ty = nullness::unannotated(self, ty);
        match &mut self.ty_mut(ty).kind {
            TypeKind::Class(class) => Some(class),
            _ => None,
        }
    }

    /// Parameterized or raw type data.
    pub fn parameterized(&self, ty: TypeId) -> Option<&ParameterizedData> {
        match self.type_kind(ty) {
            TypeKind::Parameterized(data) | TypeKind::Raw(data) => Some(data),
            _ => None,
        }
    }

    pub(crate) fn parameterized_mut(&mut self, ty: TypeId) -> Option<&mut ParameterizedData> {
        let ty = nullness::unannotated(self, ty);
        match &mut self.ty_mut(ty).kind {
            TypeKind::Parameterized(data) | TypeKind::Raw(data) => Some(data),
            _ => None,
        }
    }

    pub fn type_variable(&self, ty: TypeId) -> Option<&TypeVariableData> {
        match self.type_kind(ty) {
            TypeKind::TypeVariable(data) => Some(data),
            _ => None,
        }
    }

    pub fn wildcard(&self, ty: TypeId) -> Option<&WildcardData> {
        match self.type_kind(ty) {
            TypeKind::Wildcard(data) => Some(data),
            _ => None,
        }
    }

    pub fn capture(&self, ty: TypeId) -> Option<&CaptureData> {
        match self.type_kind(ty) {
            TypeKind::Capture(data) => Some(data),
            _ => None,
        }
    }

    pub fn base_type(&self, ty: TypeId) -> Option<BaseType> {
        match self.type_kind(ty) {
            TypeKind::Base(base) => Some(*base),
            _ => None,
        }
    }

    pub fn problem(&self, ty: TypeId) -> Option<&ProblemTypeData> {
        match self.type_kind(ty) {
            TypeKind::Problem(data) => Some(data),
            _ => None,
        }
    }

    /// The class declaration behind a class, generic, parameterized or raw
    /// type.
    pub fn generic_of(&self, ty: TypeId) -> Option<TypeId> {
        let ty = nullness::unannotated(self, ty);
        match &self.ty(ty).kind {
            TypeKind::Class(_) => Some(ty),
            TypeKind::Parameterized(data) | TypeKind::Raw(data) => Some(data.generic),
            _ => None,
        }
    }

    pub fn declaration(&self, ty: TypeId) -> Option<&ClassData> {
        self.generic_of(ty).and_then(|generic| self.class(generic))
    }

    pub fn is_interface(&self, ty: TypeId) -> bool {
        self.declaration(ty).is_some_and(ClassData::is_interface)
    }

    /// Primitive or `void` type.
    pub fn base(&self, base: BaseType) -> TypeId {
        TypeId::from_raw(base.index())
    }

    pub fn is_valid(&self, ty: TypeId) -> bool {
        !matches!(self.type_kind(ty), TypeKind::Problem(_))
    }

    // ----- well-known and binary types -----------------------------------

    /// Resolves a required system type, aborting compilation when it is
    /// missing.
    pub fn well_known(&mut self, which: WellKnown) -> TypeId {
        if let Some(&id) = self.well_known.get(&which) {
            return id;
        }
        match self.get_type(which.binary_name()) {
            Some(id) => {
                self.well_known.insert(which, id);
                id
            }
            None => AbortCompilation::missing_type(which.binary_name()).raise(),
        }
    }

    pub fn object(&mut self) -> TypeId {
        self.well_known(WellKnown::Object)
    }

    pub fn is_object(&mut self, ty: TypeId) -> bool {
        let object = self.object();
        nullness::unannotated(self, ty) == object
    }

    /// A type already created under `binary_name`, without consulting the
    /// provider.
    pub fn loaded_type(&self, binary_name: &str) -> Option<TypeId> {
        self.by_binary_name.get(binary_name).copied()
    }

    /// Returns the type named `binary_name`, loading it from the provider on
    /// first request.
    pub fn get_type(&mut self, binary_name: &str) -> Option<TypeId> {
        if let Some(id) = self.loaded_type(binary_name) {
            return Some(id);
        }
        if self.not_found.contains(binary_name) {
            return None;
        }
        let Some(stub) = self.provider.lookup_type(binary_name) else {
            self.not_found.insert(binary_name.to_string());
            return None;
        };
        Some(binary::create_binary_type(self, stub))
    }

    /// Like [`Environment::get_type`] but answers a `NotFound` problem type
    /// instead of `None`.
    pub fn get_type_or_missing(&mut self, binary_name: &str) -> TypeId {
        match self.get_type(binary_name) {
            Some(id) => id,
            None => {
                tracing::warn!(target: "nova.bindings", ty = %binary_name, "missing binary type");
                self.create_problem_type(binary_name, ProblemReason::NotFound, None)
            }
        }
    }

    pub fn package_exists(&self, package: &str) -> bool {
        self.known_packages.contains(package) || self.provider.package_exists(package)
    }

    /// Records a package declared in source, with its parent packages.
    pub fn register_package(&mut self, package: &str) {
        let mut package = package.to_string();
        while !package.is_empty() {
            self.known_packages.insert(package.clone());
            match package.rfind('.') {
                Some(idx) => package.truncate(idx),
                None => break,
            }
        }
    }

    /// The declared member type `name` of the declaration behind `ty`.
    pub fn member_type(&mut self, ty: TypeId, name: &str) -> Option<TypeId> {
        let generic = self.generic_of(ty)?;
        let class = self.class(generic)?;
        let found = class
            .member_types
            .iter()
            .copied()
            .find(|&member| self.class(member).is_some_and(|m| m.simple_name == name));
        if found.is_some() {
            return found;
        }
        if class.is_source() {
            return None;
        }
        let binary_name = format!("{}${}", class.binary_name, name);
        let member = self.get_type(&binary_name)?;
        (self.class(member)?.enclosing == Some(generic)).then_some(member)
    }

    // ----- creation -------------------------------------------------------

    fn push_type(&mut self, data: TypeData) -> TypeId {
        let id = TypeId::from_raw(self.types.len());
        self.types.push(data);
        id
    }

    fn contained_bits(&self, ids: impl IntoIterator<Item = TypeId>) -> TagBits {
        ids.into_iter().fold(TagBits::empty(), |acc, id| {
            acc | (self.tag_bits(id) & TagBits::CONTAINMENT_MASK)
        })
    }

    /// Adds a class declaration and registers it under its binary name and
    /// in its enclosing type's member list.
    pub fn create_class(&mut self, data: ClassData) -> TypeId {
        let mut bits = TagBits::empty();
        if let Some(enclosing) = data.enclosing {
            bits |= TagBits::IS_MEMBER_TYPE;
            if !data.is_static() {
                bits |= self.tag_bits(enclosing) & TagBits::HAS_TYPE_VARIABLE;
            }
        }
        let binary_name = data.binary_name.clone();
        let enclosing = data.enclosing;
        let id = self.push_type(TypeData::new(TypeKind::Class(Box::new(data)), bits));
        self.by_binary_name.insert(binary_name, id);
        if let Some(enclosing) = enclosing {
            if let Some(outer) = self.class_mut(enclosing) {
                outer.member_types.push(id);
            }
        }
        id
    }

    /// Installs the type variables of a class created without them.
    pub fn set_type_variables(&mut self, ty: TypeId, type_variables: Vec<TypeId>) {
        let generic = !type_variables.is_empty();
        let Some(class) = self.class_mut(ty) else {
            return;
        };
        class.type_variables = type_variables;
        if generic {
            self.mark_type_variable_users(ty);
        }
    }

    fn mark_type_variable_users(&mut self, ty: TypeId) {
        self.add_type_tag_bits(ty, TagBits::HAS_TYPE_VARIABLE);
        let members = self
            .class(ty)
            .map(|class| class.member_types.clone())
            .unwrap_or_default();
        for member in members {
            let non_static = self.class(member).is_some_and(|m| !m.is_static());
            if non_static && !self.tag_bits(member).contains(TagBits::HAS_TYPE_VARIABLE) {
                self.mark_type_variable_users(member);
            }
        }
    }

    pub fn create_type_variable(&mut self, name: &str, rank: u32, declarer: Declarer) -> TypeId {
        self.push_type(TypeData::new(
            TypeKind::TypeVariable(TypeVariableData {
                name: name.to_string(),
                rank,
                declarer,
                bounds: Lazy::Unbuilt,
            }),
            TagBits::HAS_TYPE_VARIABLE,
        ))
    }

    pub fn create_array(&mut self, leaf: TypeId, dimensions: u32) -> TypeId {
        if dimensions == 0 {
            return leaf;
        }
        let (leaf, dimensions) = match self.type_kind(leaf) {
            TypeKind::Array {
                leaf: inner,
                dimensions: inner_dims,
            } => (*inner, inner_dims + dimensions),
            _ => (leaf, dimensions),
        };
        if let Some(&id) = self.interner.arrays.get(&(leaf, dimensions)) {
            return id;
        }
        let bits = self.contained_bits([leaf]);
        let id = self.push_type(TypeData::new(TypeKind::Array { leaf, dimensions }, bits));
        self.interner.arrays.insert((leaf, dimensions), id);
        id
    }

    /// `generic<arguments>` as a member of `enclosing`. Equal requests return
    /// the same id.
    pub fn create_parameterized_type(
        &mut self,
        generic: TypeId,
        arguments: Vec<TypeId>,
        enclosing: Option<TypeId>,
    ) -> TypeId {
        if arguments.is_empty() && enclosing.is_none() {
            return generic;
        }
        let key = (generic, arguments, enclosing);
        if let Some(&id) = self.interner.parameterized.get(&key) {
            return id;
        }
        let (generic, arguments, enclosing) = key;
        let bits = self.contained_bits(arguments.iter().copied().chain(enclosing));
        let id = self.push_type(TypeData::new(
            TypeKind::Parameterized(ParameterizedData::new(generic, arguments.clone(), enclosing)),
            bits,
        ));
        self.interner
            .parameterized
            .insert((generic, arguments, enclosing), id);
        id
    }

    pub fn create_raw_type(&mut self, generic: TypeId, enclosing: Option<TypeId>) -> TypeId {
        if let Some(&id) = self.interner.raw.get(&(generic, enclosing)) {
            return id;
        }
        let bits = self.contained_bits(enclosing);
        let id = self.push_type(TypeData::new(
            TypeKind::Raw(ParameterizedData::new(generic, Vec::new(), enclosing)),
            bits,
        ));
        self.interner.raw.insert((generic, enclosing), id);
        id
    }

    pub fn create_wildcard(
        &mut self,
        generic: Option<TypeId>,
        rank: u32,
        kind: WildcardKind,
        bound: Option<TypeId>,
        other_bounds: Vec<TypeId>,
    ) -> TypeId {
        let (bound, other_bounds) = match kind {
            WildcardKind::Unbound => (None, Vec::new()),
            _ => (bound, other_bounds),
        };
        let key = (generic, rank, kind, bound, other_bounds);
        if let Some(&id) = self.interner.wildcards.get(&key) {
            return id;
        }
        let bits = TagBits::HAS_WILDCARD
            | self.contained_bits(key.3.into_iter().chain(key.4.iter().copied()));
        let data = WildcardData {
            generic: key.0,
            rank: key.1,
            kind: key.2,
            bound: key.3,
            other_bounds: key.4.clone(),
        };
        let id = self.push_type(TypeData::new(TypeKind::Wildcard(data), bits));
        self.interner.wildcards.insert(key, id);
        id
    }

    /// Intersection of `parts` in the given order; a single part is returned
    /// as is.
    pub fn create_intersection(&mut self, parts: Vec<TypeId>) -> TypeId {
        if let [single] = parts.as_slice() {
            return *single;
        }
        if let Some(&id) = self.interner.intersections.get(&parts) {
            return id;
        }
        let bits = self.contained_bits(parts.iter().copied());
        let id = self.push_type(TypeData::new(TypeKind::Intersection(parts.clone()), bits));
        self.interner.intersections.insert(parts, id);
        id
    }

    /// Capture of `wildcard` (argument `rank` of `source_type`) at
    /// `position`. Bounds are filled in by capture conversion.
    pub(crate) fn create_capture(
        &mut self,
        wildcard: TypeId,
        source_type: TypeId,
        position: Span,
        rank: u32,
    ) -> TypeId {
        let key = (wildcard, source_type, position, rank);
        if let Some(&id) = self.interner.captures.get(&key) {
            return id;
        }
        self.next_capture_id += 1;
        let id = self.push_type(TypeData::new(
            TypeKind::Capture(CaptureData {
                wildcard,
                source_type,
                position,
                rank,
                id: self.next_capture_id,
                bounds: Lazy::Unbuilt,
            }),
            TagBits::HAS_CAPTURE,
        ));
        self.interner.captures.insert(key, id);
        id
    }

    pub fn next_inference_site(&mut self) -> u32 {
        self.next_inference_site += 1;
        self.next_inference_site
    }

    pub fn create_inference_variable(&mut self, type_parameter: TypeId, rank: u32, site: u32) -> TypeId {
        self.push_type(TypeData::new(
            TypeKind::InferenceVariable(InferenceVariableData {
                type_parameter,
                rank,
                site,
            }),
            TagBits::HAS_INFERENCE_VARIABLE,
        ))
    }

    pub fn create_problem_type(
        &mut self,
        name: &str,
        reason: ProblemReason,
        closest_match: Option<TypeId>,
    ) -> TypeId {
        let key = (name.to_string(), reason, closest_match);
        if let Some(&id) = self.interner.problems.get(&key) {
            return id;
        }
        let bits = match reason {
            ProblemReason::NotFound => TagBits::HAS_MISSING_TYPE,
            _ => TagBits::empty(),
        };
        let id = self.push_type(TypeData::new(
            TypeKind::Problem(ProblemTypeData {
                name: name.to_string(),
                reason,
                closest_match,
            }),
            bits,
        ));
        self.interner.problems.insert(key, id);
        id
    }

    pub(crate) fn intern_annotated(&mut self, data: AnnotatedData) -> TypeId {
        let key = (data.unannotated, data.annotation);
        if let Some(&id) = self.interner.annotated.get(&key) {
            return id;
        }
        let bits = self.tag_bits(data.unannotated);
        let id = self.push_type(TypeData::new(TypeKind::Annotated(data), bits));
        self.interner.annotated.insert(key, id);
        id
    }

    pub fn create_method(&mut self, data: MethodData) -> MethodId {
        let id = MethodId::from_raw(self.methods.len());
        self.methods.push(data);
        id
    }

    pub fn create_field(&mut self, data: FieldData) -> FieldId {
        let id = FieldId::from_raw(self.fields.len());
        self.fields.push(data);
        id
    }

    /// The `length` field shared by every array type.
    pub fn array_length_field(&mut self) -> FieldId {
        if let Some(id) = self.array_length {
            return id;
        }
        let id = self.create_field(FieldData {
            name: "length".to_string(),
            ty: self.base(BaseType::Int),
            modifiers: Modifiers::PUBLIC | Modifiers::FINAL,
            declaring_class: None,
            kind: FieldKind::Declared,
            tag_bits: TagBits::empty(),
            span: Span::default(),
        });
        self.array_length = Some(id);
        id
    }

    pub(crate) fn interned_parameterized_method(&self, original: MethodId, owner: TypeId) -> Option<MethodId> {
        self.interner
            .parameterized_methods
            .get(&(original, owner))
            .copied()
    }

    pub(crate) fn intern_parameterized_method(&mut self, original: MethodId, owner: TypeId, method: MethodId) {
        self.interner
            .parameterized_methods
            .insert((original, owner), method);
    }

    pub(crate) fn interned_parameterized_field(&self, original: FieldId, owner: TypeId) -> Option<FieldId> {
        self.interner
            .parameterized_fields
            .get(&(original, owner))
            .copied()
    }

    pub(crate) fn intern_parameterized_field(&mut self, original: FieldId, owner: TypeId, field: FieldId) {
        self.interner.parameterized_fields.insert((original, owner), field);
    }

    pub(crate) fn interned_generic_method(&self, key: &(MethodId, Vec<TypeId>, bool)) -> Option<MethodId> {
        self.interner.generic_methods.get(key).copied()
    }

    pub(crate) fn intern_generic_method(&mut self, key: (MethodId, Vec<TypeId>, bool), method: MethodId) {
        self.interner.generic_methods.insert(key, method);
    }

    // ----- lazy stages ----------------------------------------------------

    fn completer(&self) -> Option<Rc<dyn TypeCompleter>> {
        self.completer.clone()
    }

    fn default_hierarchy(&mut self, ty: TypeId) -> Hierarchy {
        let object = self.object();
        let is_root = ty == object || self.is_interface(ty);
        Hierarchy {
            superclass: (!is_root).then_some(object),
            superinterfaces: Vec::new(),
        }
    }

    /// Connects the supertypes of `ty` unless already connected. While the
    /// connection is in progress the hierarchy reads as empty.
    pub fn ensure_hierarchy(&mut self, ty: TypeId) {
        let ty = nullness::unannotated(self, ty);
        match self.kind(ty) {
            BindingKind::Class | BindingKind::Generic => {
                let Some(source) = self
                    .class_mut(ty)
                    .and_then(|class| class.hierarchy.start().then(|| class.is_source()))
                else {
                    return;
                };
                if source {
                    if let Some(completer) = self.completer() {
                        completer.connect_hierarchy(self, ty);
                    }
                } else {
                    binary::connect_hierarchy(self, ty);
                }
                if self.class(ty).is_some_and(|class| !class.hierarchy.is_built()) {
                    let hierarchy = self.default_hierarchy(ty);
                    self.set_hierarchy(ty, hierarchy);
                }
            }
            BindingKind::Parameterized | BindingKind::Raw => {
                let started = self
                    .parameterized_mut(ty)
                    .is_some_and(|data| data.hierarchy.start());
                if started {
                    let hierarchy = members::parameterized_hierarchy(self, ty);
                    if let Some(data) = self.parameterized_mut(ty) {
                        data.hierarchy.finish(hierarchy);
                    }
                }
            }
            _ => {}
        }
    }

    pub fn set_hierarchy(&mut self, ty: TypeId, hierarchy: Hierarchy) {
        if let Some(class) = self.class_mut(ty) {
            class.hierarchy.finish(hierarchy);
        }
        tracing::debug!(target: "nova.bindings", ty = ?ty, "hierarchy connected");
    }

    pub fn set_permitted_subtypes(&mut self, ty: TypeId, permitted: Vec<TypeId>) {
        if let Some(class) = self.class_mut(ty) {
            class.permitted = permitted;
        }
    }

    /// Declared supertypes of a class, generic, parameterized or raw type.
    /// Empty while the connection is in progress.
    pub fn hierarchy(&mut self, ty: TypeId) -> Hierarchy {
        self.ensure_hierarchy(ty);
        let ty = nullness::unannotated(self, ty);
        match &self.ty(ty).kind {
            TypeKind::Class(class) => class.hierarchy.get().cloned().unwrap_or_default(),
            TypeKind::Parameterized(data) | TypeKind::Raw(data) => {
                data.hierarchy.get().cloned().unwrap_or_default()
            }
            _ => Hierarchy::default(),
        }
    }

    /// Bounds of a type variable, connecting its declarer first.
    pub fn type_variable_bounds(&mut self, ty: TypeId) -> TypeVariableBounds {
        let Some(data) = self.type_variable(ty) else {
            return TypeVariableBounds::default();
        };
        if let Some(bounds) = data.bounds.get() {
            return bounds.clone();
        }
        let declarer = data.declarer;
        let declarer_done = match declarer {
            Declarer::Type(owner) => {
                self.ensure_hierarchy(owner);
                self.class(owner).is_some_and(|c| c.hierarchy.is_built())
            }
            Declarer::Method(method) => {
                let owner = self.method(method).declaring_class;
                self.methods(owner);
                self.declaration(owner).is_some_and(|c| c.methods.is_built())
            }
        };
        let ty = nullness::unannotated(self, ty);
        if let TypeKind::TypeVariable(data) = &mut self.ty_mut(ty).kind {
            if let Some(bounds) = data.bounds.get() {
                return bounds.clone();
            }
            if declarer_done {
                data.bounds.finish(TypeVariableBounds::default());
            }
        }
        TypeVariableBounds::default()
    }

    pub fn set_type_variable_bounds(&mut self, ty: TypeId, bounds: TypeVariableBounds) {
        let ty = nullness::unannotated(self, ty);
        if let TypeKind::TypeVariable(data) = &mut self.ty_mut(ty).kind {
            data.bounds.finish(bounds);
        }
    }

    pub fn capture_bounds(&mut self, ty: TypeId) -> CaptureBounds {
        self.capture(ty)
            .and_then(|data| data.bounds.get().cloned())
            .unwrap_or_default()
    }

    pub(crate) fn set_capture_bounds(&mut self, ty: TypeId, bounds: CaptureBounds) {
        let ty = nullness::unannotated(self, ty);
        if let TypeKind::Capture(data) = &mut self.ty_mut(ty).kind {
            data.bounds.finish(bounds);
        }
    }

    pub(crate) fn capture_bounds_built(&self, ty: TypeId) -> bool {
        self.capture(ty).is_some_and(|data| data.bounds.is_built())
    }

    /// Fields of `ty`, sorted by name. Empty for non-declared types.
    pub fn fields(&mut self, ty: TypeId) -> Vec<FieldId> {
        let ty = nullness::unannotated(self, ty);
        match self.kind(ty) {
            BindingKind::Class | BindingKind::Generic => {
                let started = self
                    .class_mut(ty)
                    .and_then(|class| class.fields.start().then(|| class.is_source()));
                if let Some(source) = started {
                    if source {
                        if let Some(completer) = self.completer() {
                            completer.build_fields(self, ty);
                        }
                    } else {
                        binary::build_fields(self, ty);
                    }
                    self.set_fields(ty, Vec::new());
                }
                self.class(ty)
                    .and_then(|class| class.fields.get().cloned())
                    .unwrap_or_default()
            }
            BindingKind::Parameterized | BindingKind::Raw => members::parameterized_fields(self, ty),
            _ => Vec::new(),
        }
    }

    /// Methods (constructors included) of `ty`, sorted by selector.
    pub fn methods(&mut self, ty: TypeId) -> Vec<MethodId> {
        let ty = nullness::unannotated(self, ty);
        match self.kind(ty) {
            BindingKind::Class | BindingKind::Generic => {
                let started = self
                    .class_mut(ty)
                    .and_then(|class| class.methods.start().then(|| class.is_source()));
                if let Some(source) = started {
                    if source {
                        if let Some(completer) = self.completer() {
                            completer.build_methods(self, ty);
                        }
                    } else {
                        binary::build_methods(self, ty);
                    }
                    self.set_methods(ty, Vec::new());
                }
                self.class(ty)
                    .and_then(|class| class.methods.get().cloned())
                    .unwrap_or_default()
            }
            BindingKind::Parameterized | BindingKind::Raw => members::parameterized_methods(self, ty),
            _ => Vec::new(),
        }
    }

    /// Record components of `ty` in declaration order.
    pub fn components(&mut self, ty: TypeId) -> Vec<FieldId> {
        let Some(generic) = self.generic_of(ty) else {
            return Vec::new();
        };
        let started = self
            .class_mut(generic)
            .and_then(|class| class.components.start().then(|| class.is_source()));
        if let Some(source) = started {
            if source {
                if let Some(completer) = self.completer() {
                    completer.build_components(self, generic);
                }
            }
            self.set_components(generic, Vec::new());
        }
        self.class(generic)
            .and_then(|class| class.components.get().cloned())
            .unwrap_or_default()
    }

    /// Finishes the field stage. The list is sorted by name.
    pub fn set_fields(&mut self, ty: TypeId, mut fields: Vec<FieldId>) {
        fields.sort_by(|a, b| self.field(*a).name.cmp(&self.field(*b).name));
        if let Some(class) = self.class_mut(ty) {
            if !class.fields.is_built() {
                class.fields.finish(fields);
                tracing::debug!(target: "nova.bindings", ty = ?ty, "fields built");
            }
        }
    }

    /// Finishes the method stage. The list is sorted by selector.
    pub fn set_methods(&mut self, ty: TypeId, mut methods: Vec<MethodId>) {
        methods.sort_by(|a, b| self.method(*a).selector.cmp(&self.method(*b).selector));
        if let Some(class) = self.class_mut(ty) {
            if !class.methods.is_built() {
                class.methods.finish(methods);
                tracing::debug!(target: "nova.bindings", ty = ?ty, "methods built");
            }
        }
    }

    pub fn set_components(&mut self, ty: TypeId, components: Vec<FieldId>) {
        if let Some(class) = self.class_mut(ty) {
            class.components.finish(components);
        }
    }

    /// Replaces an already built member list, e.g. after excising members
    /// or adding synthetic ones. Keeps the list sorted.
    pub fn replace_methods(&mut self, ty: TypeId, mut methods: Vec<MethodId>) {
        methods.sort_by(|a, b| self.method(*a).selector.cmp(&self.method(*b).selector));
        if let Some(class) = self.class_mut(ty) {
            class.methods = Lazy::Built(methods);
        }
    }

    pub fn replace_fields(&mut self, ty: TypeId, mut fields: Vec<FieldId>) {
        fields.sort_by(|a, b| self.field(*a).name.cmp(&self.field(*b).name));
        if let Some(class) = self.class_mut(ty) {
            class.fields = Lazy::Built(fields);
        }
    }

    pub(crate) fn finish_parameterized_fields(&mut self, ty: TypeId, fields: Vec<FieldId>) {
        if let Some(data) = self.parameterized_mut(ty) {
            data.fields.finish(fields);
        }
    }

    pub(crate) fn finish_parameterized_methods(&mut self, ty: TypeId, methods: Vec<MethodId>) {
        if let Some(data) = self.parameterized_mut(ty) {
            data.methods.finish(methods);
        }
    }

    /// Methods of `ty` named `selector`.
    pub fn get_methods(&mut self, ty: TypeId, selector: &str) -> Vec<MethodId> {
        let methods = self.methods(ty);
        let start = methods.partition_point(|&m| self.method(m).selector.as_str() < selector);
        methods[start..]
            .iter()
            .copied()
            .take_while(|&m| self.method(m).selector == selector)
            .collect()
    }

    pub fn get_field(&mut self, ty: TypeId, name: &str) -> Option<FieldId> {
        let fields = self.fields(ty);
        let idx = fields.partition_point(|&f| self.field(f).name.as_str() < name);
        fields
            .get(idx)
            .copied()
            .filter(|&f| self.field(f).name == name)
    }

    /// Innermost enclosing class declaration of `ty`.
    pub fn enclosing_type(&self, ty: TypeId) -> Option<TypeId> {
        self.declaration(ty).and_then(|class| class.enclosing)
    }

    pub fn outermost_type(&self, ty: TypeId) -> TypeId {
        let mut current = self.generic_of(ty).unwrap_or(ty);
        while let Some(outer) = self.enclosing_type(current) {
            current = outer;
        }
        current
    }
}
