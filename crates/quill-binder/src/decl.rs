//! Global variable and parameter declarations
//!
//! A [`Declaration`] is the compile-time record of one `declare variable` or
//! `declare parameter` clause. It is created as a stub during the parser's
//! pre-pass (so forward and mutual references are always representable),
//! accumulates pending reference slots while initializers are parsed, and is
//! compiled exactly once into a shared, read-only [`CompiledVariable`]
//! runtime handle.

use crate::expr::Expr;
use crate::reference::RefId;
use quill_types::{QName, SequenceType};
use std::fmt;

/// Key of a declaration in its module's table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeclId(pub u32);

/// Source position of a declaration or reference
///
/// Module identity plus line. Column is not tracked at this layer; consumers
/// must report it as unavailable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    /// Identity of the declaring module (its system id or logical URI)
    pub module: String,
    /// Line number, 1-based
    pub line: u32,
}

impl SourceLocation {
    /// Create a location
    pub fn new(module: impl Into<String>, line: u32) -> Self {
        SourceLocation {
            module: module.into(),
            line,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.line)
    }
}

/// Kind of global declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    /// A plain global variable; must have an initializer
    Variable,
    /// An external parameter, supplied by the host at run time
    Parameter {
        /// Must the host supply a value? False when a default initializer
        /// exists.
        required: bool,
    },
}

impl DeclKind {
    /// Is this an external parameter?
    pub fn is_parameter(self) -> bool {
        matches!(self, DeclKind::Parameter { .. })
    }
}

/// Compile-time record of a global variable or parameter
#[derive(Debug, Clone)]
pub struct Declaration {
    /// Declared name, unique in the module's variable namespace
    pub name: QName,
    /// Declared static type; `None` means "infer from the initializer"
    pub declared_type: Option<SequenceType>,
    /// Initializing expression; absent only for required external parameters
    pub initializer: Option<Expr>,
    /// Variable or parameter
    pub kind: DeclKind,
    /// Where the declaration appears
    pub location: SourceLocation,
    /// Local evaluation slots the initializer needs, counted on the
    /// optimized expression during type checking
    pub local_slots: usize,
    /// Reference slots registered before compilation, in registration order
    ///
    /// Order carries no semantics but is kept stable for diagnostics.
    pub(crate) pending: Vec<RefId>,
    /// Set once compilation succeeds; compilation is one-shot
    pub(crate) compiled: Option<std::sync::Arc<CompiledVariable>>,
}

impl Declaration {
    /// Create a declaration stub (parser pre-pass)
    pub fn new(
        name: QName,
        declared_type: Option<SequenceType>,
        kind: DeclKind,
        location: SourceLocation,
    ) -> Self {
        Declaration {
            name,
            declared_type,
            initializer: None,
            kind,
            location,
            local_slots: 0,
            pending: Vec::new(),
            compiled: None,
        }
    }

    /// Has this declaration been compiled?
    pub fn is_compiled(&self) -> bool {
        self.compiled.is_some()
    }

    /// The compiled runtime handle, if compilation has run
    pub fn compiled(&self) -> Option<&std::sync::Arc<CompiledVariable>> {
        self.compiled.as_ref()
    }

    /// The declared type, falling back to the universal type
    pub fn effective_type(&self) -> SequenceType {
        self.declared_type.clone().unwrap_or_else(SequenceType::any)
    }
}

/// Floor for the estimated reference count of a compiled variable
///
/// The estimate gates later inlining/caching decisions; it may overcount but
/// must never undercount actual use sites.
pub const REF_ESTIMATE_FLOOR: usize = 10;

/// Read-only runtime handle for a compiled global variable
///
/// Shared between the module's executable symbol table and every resolved
/// reference slot. Built once, never mutated; retroactive type refinement
/// flows through the slots, not the handle.
#[derive(Debug)]
pub struct CompiledVariable {
    /// The declaration this handle was compiled from
    pub decl: DeclId,
    /// Variable name
    pub name: QName,
    /// Storage slot assigned by the external allocator
    pub slot: usize,
    /// Variable or parameter
    pub kind: DeclKind,
    /// Static type at compile time (declared type, or universal)
    pub static_type: SequenceType,
    /// Conservative estimate of the number of use sites
    pub ref_estimate: usize,
}
