//! Quill Declaration Binder
//!
//! Static binding and type resolution for a module's global variables and
//! parameters. Declarations may reference each other in any order, including
//! mutually and before definition; this crate guarantees every reference
//! ends up pointing at a fully compiled, slot-allocated declaration with a
//! precisely known static type.
//!
//! This crate provides:
//! - Declaration records with a two-phase bind/type-check protocol
//! - Reference slots with forward-reference fixup and monotonic refinement
//! - A per-module declaration table owning both arenas
//! - A namespace-scoped view over the shared cross-module function registry
//! - Structured diagnostics with stable query-language error codes
//!
//! # Usage
//!
//! ```ignore
//! use quill_binder::{DeclarationTable, DeclKind, RefKind, SequentialSlots};
//!
//! let mut table = DeclarationTable::new("main.xq");
//! let decl = table.declare(name, declared_type, DeclKind::Variable, location)?;
//! let slot = table.new_reference(used_name, RefKind::Value, use_site)?;
//! table.set_initializer(decl, initializer);
//! table.compile_all(&mut checker, &mut SequentialSlots::new())?;
//! ```

#![warn(missing_docs)]

pub mod decl;
pub mod diagnostic;
pub mod error;
pub mod expr;
pub mod reference;
pub mod registry;
pub mod table;

pub use decl::{CompiledVariable, DeclId, DeclKind, Declaration, SourceLocation};
pub use diagnostic::{Diagnostic, JsonDiagnostic, Severity};
pub use error::BindError;
pub use expr::{ArithOp, Expr, ExprCompiler, SequentialSlots, SlotAllocator, UpdateKind, Value};
pub use reference::{Properties, RefId, RefKind, ReferenceSlot};
pub use registry::{FunctionEntry, FunctionRegistry, FunctionSignature, FunctionView};
pub use table::DeclarationTable;
