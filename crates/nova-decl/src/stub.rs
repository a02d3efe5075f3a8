//! Binary type metadata, as read from class files.
//!
//! The engine asks a [`TypeProvider`] for types it has not seen in source.
//! Stubs carry raw class-file data (access flags, descriptors, `Signature`
//! attributes); turning them into bindings happens lazily in `nova-bindings`.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::split_binary_name;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDefStub {
    /// Dotted binary name, e.g. `java.util.Map$Entry`.
    pub binary_name: String,
    pub access_flags: u16,
    pub super_binary_name: Option<String>,
    pub interfaces: Vec<String>,
    /// Generic `Signature` attribute, if present.
    pub signature: Option<String>,
    /// Outer class from the `InnerClasses` attribute, for member types.
    pub enclosing_binary_name: Option<String>,
    pub fields: Vec<FieldStub>,
    pub methods: Vec<MethodStub>,
}

impl TypeDefStub {
    pub fn new(binary_name: impl Into<String>, access_flags: u16) -> Self {
        Self {
            binary_name: binary_name.into(),
            access_flags,
            super_binary_name: Some("java.lang.Object".to_string()),
            interfaces: Vec::new(),
            signature: None,
            enclosing_binary_name: None,
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn package(&self) -> &str {
        split_binary_name(&self.binary_name).0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldStub {
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub access_flags: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodStub {
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub access_flags: u16,
}

/// Lookup of binary types by dotted binary name.
pub trait TypeProvider {
    fn lookup_type(&self, binary_name: &str) -> Option<TypeDefStub>;

    /// Whether `package` (dotted) contains at least one type.
    fn package_exists(&self, _package: &str) -> bool {
        false
    }
}

impl<T: TypeProvider + ?Sized> TypeProvider for Arc<T> {
    fn lookup_type(&self, binary_name: &str) -> Option<TypeDefStub> {
        (**self).lookup_type(binary_name)
    }

    fn package_exists(&self, package: &str) -> bool {
        (**self).package_exists(package)
    }
}

impl<T: TypeProvider + ?Sized> TypeProvider for Box<T> {
    fn lookup_type(&self, binary_name: &str) -> Option<TypeDefStub> {
        (**self).lookup_type(binary_name)
    }

    fn package_exists(&self, package: &str) -> bool {
        (**self).package_exists(package)
    }
}

/// In-memory provider keyed by binary name.
#[derive(Debug, Clone, Default)]
pub struct MapTypeProvider {
    stubs: BTreeMap<String, TypeDefStub>,
    packages: BTreeSet<String>,
}

impl MapTypeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, stub: TypeDefStub) {
        let mut package = stub.package().to_string();
        loop {
            self.packages.insert(package.clone());
            match package.rfind('.') {
                Some(idx) => package.truncate(idx),
                None => break,
            }
        }
        self.stubs.insert(stub.binary_name.clone(), stub);
    }

    pub fn with(mut self, stub: TypeDefStub) -> Self {
        self.insert(stub);
        self
    }

    pub fn len(&self) -> usize {
        self.stubs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stubs.is_empty()
    }
}

impl TypeProvider for MapTypeProvider {
    fn lookup_type(&self, binary_name: &str) -> Option<TypeDefStub> {
        self.stubs.get(binary_name).cloned()
    }

    fn package_exists(&self, package: &str) -> bool {
        self.packages.contains(package)
    }
}

/// Consults providers in order; the first one that knows a type wins.
pub struct ChainTypeProvider<'a> {
    providers: Vec<&'a dyn TypeProvider>,
}

impl<'a> ChainTypeProvider<'a> {
    pub fn new(providers: Vec<&'a dyn TypeProvider>) -> Self {
        Self { providers }
    }
}

impl TypeProvider for ChainTypeProvider<'_> {
    fn lookup_type(&self, binary_name: &str) -> Option<TypeDefStub> {
        self.providers
            .iter()
            .find_map(|provider| provider.lookup_type(binary_name))
    }

    fn package_exists(&self, package: &str) -> bool {
        self.providers.iter().any(|p| p.package_exists(package))
    }
}
