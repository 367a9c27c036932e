//! Cross-module function registry and the namespace-scoped view over it
//!
//! The registry is shared by every module of a compilation: lookups are
//! concurrent, registrations are serialized, and an entry becomes visible
//! only as a whole (signature and body together). Each importing module
//! holds a [`FunctionView`], a thin filter that exposes only the namespaces
//! the module imported and enforces the import boundary on signatures.

use crate::error::BindError;
use crate::expr::Expr;
use parking_lot::RwLock;
use quill_types::{ItemType, QName, SequenceType, XS_NAMESPACE};
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;

/// Registry key: namespace, local name, arity
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FunctionKey {
    ns: String,
    local: String,
    arity: usize,
}

impl FunctionKey {
    fn new(name: &QName, arity: usize) -> Self {
        FunctionKey {
            ns: name.ns.clone(),
            local: name.local.clone(),
            arity,
        }
    }
}

/// Declared signature of a registered function
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSignature {
    /// Declared argument types, one per parameter
    pub arg_types: Vec<SequenceType>,
    /// Declared result type
    pub result_type: SequenceType,
}

impl FunctionSignature {
    /// Number of parameters
    pub fn arity(&self) -> usize {
        self.arg_types.len()
    }

    /// Every type mentioned in the signature, result last
    fn types(&self) -> impl Iterator<Item = &SequenceType> {
        self.arg_types.iter().chain(std::iter::once(&self.result_type))
    }
}

/// A registered function: signature plus body
#[derive(Debug)]
pub struct FunctionEntry {
    /// The function's qualified name
    pub name: QName,
    /// Its declared signature
    pub signature: FunctionSignature,
    /// Its body expression
    pub body: Expr,
}

/// Shared, compilation-wide function registry
///
/// Cheap to clone (the map lives behind an `Arc`). Readers never block each
/// other; writers take the lock exclusively, so a reader can never observe a
/// half-registered function.
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    inner: Arc<RwLock<FxHashMap<FunctionKey, Arc<FunctionEntry>>>>,
}

impl FunctionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        FunctionRegistry::default()
    }

    /// Register a function declaration
    ///
    /// A second function with the same name and arity is `XQST0034`.
    pub fn register(&self, entry: FunctionEntry) -> Result<(), BindError> {
        let key = FunctionKey::new(&entry.name, entry.signature.arity());
        let mut map = self.inner.write();
        if map.contains_key(&key) {
            return Err(BindError::DuplicateFunction {
                name: entry.name.clone(),
                arity: entry.signature.arity(),
            });
        }
        map.insert(key, Arc::new(entry));
        Ok(())
    }

    /// Look up a function by name and arity
    pub fn lookup(&self, name: &QName, arity: usize) -> Option<Arc<FunctionEntry>> {
        self.inner
            .read()
            .get(&FunctionKey::new(name, arity))
            .cloned()
    }
}

/// One importing module's window onto the shared registry
///
/// Visibility is a pure filter over namespaces; the view never mutates the
/// registry. The view also carries the importer's type vocabulary (the
/// schema namespaces it can name), which the import boundary check consults.
#[derive(Debug, Clone)]
pub struct FunctionView {
    registry: FunctionRegistry,
    imported_namespaces: FxHashSet<String>,
    type_namespaces: FxHashSet<String>,
}

impl FunctionView {
    /// Create a view with nothing imported yet
    pub fn new(registry: FunctionRegistry) -> Self {
        FunctionView {
            registry,
            imported_namespaces: FxHashSet::default(),
            type_namespaces: FxHashSet::default(),
        }
    }

    /// Make a function namespace visible to this module
    pub fn import_namespace(&mut self, ns: impl Into<String>) {
        self.imported_namespaces.insert(ns.into());
    }

    /// Make a schema type namespace nameable in this module
    pub fn import_type_namespace(&mut self, ns: impl Into<String>) {
        self.type_namespaces.insert(ns.into());
    }

    /// Resolve a call through this view
    ///
    /// Returns `Ok(None)` when the callee's namespace is not imported or no
    /// function matches, so callers can chain further resolution strategies.
    /// A match whose signature mentions a type the importer cannot name is a
    /// static error (`XQST0036`), deliberately distinct from "not found".
    ///
    /// The argument expressions are informational: arity comes from their
    /// count, and their static types may enable specialization inside the
    /// registry later.
    pub fn bind(
        &self,
        name: &QName,
        args: &[Expr],
    ) -> Result<Option<Arc<FunctionEntry>>, BindError> {
        if !self.imported_namespaces.contains(&name.ns) {
            return Ok(None);
        }
        let entry = match self.registry.lookup(name, args.len()) {
            Some(entry) => entry,
            None => return Ok(None),
        };

        for ty in entry.signature.types() {
            if !self.can_name(ty) {
                return Err(BindError::ImportBoundary {
                    function: name.clone(),
                    arity: args.len(),
                    ty: ty.to_string(),
                });
            }
        }
        Ok(Some(entry))
    }

    /// Pure visibility probe: would a call to `name#arity` find a function?
    ///
    /// Applies the namespace filter but never the boundary check, since no
    /// binding occurs.
    pub fn is_available(&self, name: &QName, arity: usize) -> bool {
        self.imported_namespaces.contains(&name.ns)
            && self.registry.lookup(name, arity).is_some()
    }

    /// An independent view over the same registry
    ///
    /// The copy's namespace sets are its own; growing them never widens the
    /// original's visibility.
    pub fn copy(&self) -> FunctionView {
        self.clone()
    }

    /// Is every name in this type nameable in the importing module?
    ///
    /// Built-in `xs` types are always nameable; schema-defined types require
    /// their namespace to have been imported.
    fn can_name(&self, ty: &SequenceType) -> bool {
        match &ty.item {
            ItemType::Named(q) => q.ns == XS_NAMESPACE || self.type_namespaces.contains(&q.ns),
            _ => true,
        }
    }
}
