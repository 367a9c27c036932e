//! The declaration table: binding, fixup, and type refinement
//!
//! One table per module compile. The parser creates declaration stubs in a
//! pre-pass (so every declared name exists before any initializer is
//! parsed), registers reference slots as it encounters name usages, and the
//! binder then compiles each declaration: assigns its storage slot, fixes up
//! every pending reference, and finally type-checks initializers, feeding
//! inferred types back into already-bound references.
//!
//! Binding and type checking are deliberately separate passes. Every
//! declaration can be *bound* (get a slot, accept references) before any
//! declaration's *type* is known, which is what makes mutual recursion
//! between global variables work without iteration to a fixed point.

use crate::decl::{
    CompiledVariable, DeclId, DeclKind, Declaration, SourceLocation, REF_ESTIMATE_FLOOR,
};
use crate::error::BindError;
use crate::expr::{Expr, ExprCompiler, SlotAllocator, Value};
use crate::reference::{Properties, RefId, RefKind, ReferenceSlot};
use quill_types::{Cardinality, QName, SequenceType, TypeLattice, TypeRelation};
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Registry of one module's global variable and parameter declarations
///
/// Owns both the declaration arena and the reference-slot arena; everything
/// else holds `DeclId`/`RefId` keys into them. Compiled handles are shared
/// out behind `Arc` and never mutated.
pub struct DeclarationTable {
    /// Identity of the module being compiled
    module: String,
    lattice: TypeLattice,
    decls: Vec<Declaration>,
    by_name: FxHashMap<QName, DeclId>,
    refs: Vec<ReferenceSlot>,
    /// Executable symbol table: name to compiled runtime handle
    symbols: FxHashMap<QName, Arc<CompiledVariable>>,
}

impl DeclarationTable {
    /// Create an empty table for one module compile
    pub fn new(module: impl Into<String>) -> Self {
        DeclarationTable {
            module: module.into(),
            lattice: TypeLattice::new(),
            decls: Vec::new(),
            by_name: FxHashMap::default(),
            refs: Vec::new(),
            symbols: FxHashMap::default(),
        }
    }

    /// Identity of the module this table belongs to
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Create a declaration stub (parser pre-pass)
    ///
    /// Variables and parameters share one namespace; a second declaration of
    /// the same name is `XQST0049`.
    pub fn declare(
        &mut self,
        name: QName,
        declared_type: Option<SequenceType>,
        kind: DeclKind,
        location: SourceLocation,
    ) -> Result<DeclId, BindError> {
        if self.by_name.contains_key(&name) {
            return Err(BindError::DuplicateVariable { name, location });
        }
        let id = DeclId(self.decls.len() as u32);
        self.by_name.insert(name.clone(), id);
        self.decls
            .push(Declaration::new(name, declared_type, kind, location));
        Ok(id)
    }

    /// Attach the initializer once its expression has been parsed
    pub fn set_initializer(&mut self, decl: DeclId, initializer: Expr) {
        self.decls[decl.0 as usize].initializer = Some(initializer);
    }

    /// Look up a declaration by name
    pub fn lookup(&self, name: &QName) -> Option<DeclId> {
        self.by_name.get(name).copied()
    }

    /// Read access to a declaration
    pub fn declaration(&self, id: DeclId) -> &Declaration {
        &self.decls[id.0 as usize]
    }

    /// Read access to a reference slot
    pub fn reference(&self, id: RefId) -> &ReferenceSlot {
        &self.refs[id.0 as usize]
    }

    /// The compiled runtime handle for a name, once compilation has run
    pub fn compiled(&self, name: &QName) -> Option<&Arc<CompiledVariable>> {
        self.symbols.get(name)
    }

    /// Number of declarations in the table
    pub fn len(&self) -> usize {
        self.decls.len()
    }

    /// Is the table empty?
    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    /// Register a use-site reference to a named declaration
    ///
    /// Callable at any time, including while parsing an expression that
    /// lexically precedes the declaration it names. If the declaration is
    /// not yet compiled the slot joins its pending list; if it is already
    /// compiled (late registration) the slot is fixed up immediately. A name
    /// with no declaration at all leaves the slot dangling, to be reported
    /// as unresolved at the end of module compilation.
    pub fn new_reference(
        &mut self,
        name: QName,
        kind: RefKind,
        location: SourceLocation,
    ) -> Result<RefId, BindError> {
        let rid = RefId(self.refs.len() as u32);
        self.refs
            .push(ReferenceSlot::new(name.clone(), kind, location));

        if let Some(decl_id) = self.lookup(&name) {
            if self.decls[decl_id.0 as usize].is_compiled() {
                self.fixup_reference(rid, decl_id)?;
            } else {
                self.decls[decl_id.0 as usize].pending.push(rid);
            }
        }
        Ok(rid)
    }

    /// Compile one declaration: build its runtime handle and fix up every
    /// pending reference
    ///
    /// `slot_number` comes from the external slot allocator and is opaque
    /// here. Compilation is one-shot; a second call on the same declaration
    /// is a caller contract violation and fails with `DoubleCompilation`.
    ///
    /// Type checking of the initializer happens separately in
    /// [`DeclarationTable::type_check`]; at this point references are fixed
    /// up with the declared type, falling back to the universal type.
    pub fn compile(&mut self, id: DeclId, slot_number: usize) -> Result<(), BindError> {
        let idx = id.0 as usize;
        if self.decls[idx].is_compiled() {
            return Err(BindError::DoubleCompilation {
                name: self.decls[idx].name.clone(),
            });
        }

        let handle = Arc::new(CompiledVariable {
            decl: id,
            name: self.decls[idx].name.clone(),
            slot: slot_number,
            kind: self.decls[idx].kind,
            static_type: self.decls[idx].effective_type(),
            ref_estimate: self.decls[idx].pending.len().max(REF_ESTIMATE_FLOOR),
        });
        self.decls[idx].compiled = Some(Arc::clone(&handle));

        let pending = self.decls[idx].pending.clone();
        for rid in pending {
            self.fixup_reference(rid, id)?;
        }

        self.symbols.insert(handle.name.clone(), handle);
        Ok(())
    }

    /// Resolve one slot to a compiled declaration and install static-type
    /// information there
    fn fixup_reference(&mut self, rid: RefId, decl_id: DeclId) -> Result<(), BindError> {
        let decl = &self.decls[decl_id.0 as usize];
        let handle = match decl.compiled() {
            Some(handle) => Arc::clone(handle),
            None => {
                // Fixup before compile is a caller sequencing bug.
                return Err(BindError::ConflictingResolution {
                    name: decl.name.clone(),
                });
            }
        };
        let (static_type, constant, properties) = bind_time_payload(&self.lattice, decl);
        let lattice = self.lattice;
        self.refs[rid.0 as usize].resolve(
            decl_id,
            handle,
            static_type,
            constant,
            properties,
            &lattice,
        )
    }

    /// Type-check a compiled declaration's initializer and propagate the
    /// result
    ///
    /// Rejects updating initializers on plain variables, runs the external
    /// checker and optimizer (the rewritten expression replaces the
    /// initializer), and, for variables declared without a type, infers one
    /// from the original initializer. The inferred type is pushed to every
    /// value reference already resolved to this declaration.
    ///
    /// Inference is best-effort and attempted once: if it declines (for
    /// instance because the initializer references a variable whose own type
    /// is still universal, the expected state under mutual recursion), the
    /// declaration keeps the universal type and refinement is skipped. That
    /// is not an error; downstream consumers tolerate "no narrower type
    /// available".
    pub fn type_check(
        &mut self,
        id: DeclId,
        checker: &mut dyn ExprCompiler,
    ) -> Result<(), BindError> {
        let idx = id.0 as usize;
        let init = match self.decls[idx].initializer.clone() {
            Some(init) => init,
            // External parameter with no default: nothing to check.
            None => return Ok(()),
        };

        if init.is_updating() && self.decls[idx].kind == DeclKind::Variable {
            return Err(BindError::UpdatingInitializer {
                name: self.decls[idx].name.clone(),
                location: self.decls[idx].location.clone(),
            });
        }

        // Inference reads the original expression, before the checker
        // rewrites it.
        let inferred = if self.decls[idx].declared_type.is_none()
            && !self.decls[idx].kind.is_parameter()
        {
            self.infer_static_type(&init).filter(|t| !t.is_any())
        } else {
            None
        };

        let required = self.decls[idx].effective_type();
        let checked = checker.type_check(init, &required, "variable initializer")?;
        let optimized = checker.optimize(checked)?;
        let rewritten_constant = optimized.as_literal().cloned();
        self.decls[idx].local_slots = checker.allocate_slots(&optimized);
        self.decls[idx].initializer = Some(optimized);

        if let Some(ty) = inferred {
            self.decls[idx].declared_type = Some(ty.clone());
            self.refine_references(id, ty, rewritten_constant);
        }
        Ok(())
    }

    /// Push a newly inferred type to every value reference already resolved
    /// to `id`
    fn refine_references(&mut self, id: DeclId, ty: SequenceType, constant: Option<Value>) {
        let lattice = self.lattice;
        let mut properties = Properties::empty();
        if ty.cardinality == Cardinality::ExactlyOne {
            properties = properties.with(Properties::SINGLETON);
        }
        if constant.is_some() {
            properties = properties
                .with(Properties::SIDE_EFFECT_FREE)
                .with(Properties::CONTEXT_INDEPENDENT);
        }
        for slot in &mut self.refs {
            if slot.resolved_decl() == Some(id) && slot.kind == RefKind::Value {
                slot.refine(ty.clone(), constant.clone(), properties, &lattice);
            }
        }
    }

    /// Best-effort static type of an expression, as far as binding data goes
    ///
    /// Literals know their natural type; a value reference reports the type
    /// installed on its slot, if narrower than universal. Anything else, and
    /// any reference that is still dangling or still universal, declines.
    pub fn infer_static_type(&self, expr: &Expr) -> Option<SequenceType> {
        match expr {
            Expr::Literal(v) => Some(v.natural_type()),
            Expr::VarRef(rid) => {
                let slot = &self.refs[rid.0 as usize];
                if slot.is_resolved() && !slot.static_type().is_any() {
                    Some(slot.static_type().clone())
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Report every reference slot that never resolved
    ///
    /// Called at the end of module compilation; each dangling slot becomes
    /// one `XPST0008` error carrying its use-site location.
    pub fn check_unresolved(&self) -> Vec<BindError> {
        self.refs
            .iter()
            .filter(|slot| !slot.is_resolved())
            .map(|slot| BindError::UnresolvedName {
                name: slot.target_name.clone(),
                location: slot.location.clone(),
            })
            .collect()
    }

    /// Drive a whole module compile: bind every declaration, then type-check
    /// each, then report unresolved names
    ///
    /// The first compile or type-check error aborts the module; no partial
    /// runtime state is handed out. Unresolved names are collected and
    /// reported together, one error per slot.
    pub fn compile_all(
        &mut self,
        checker: &mut dyn ExprCompiler,
        slots: &mut dyn SlotAllocator,
    ) -> Result<(), Vec<BindError>> {
        let ids: Vec<DeclId> = (0..self.decls.len() as u32).map(DeclId).collect();

        for &id in &ids {
            let slot = slots.next_slot();
            self.compile(id, slot).map_err(|e| vec![e])?;
        }
        for &id in &ids {
            self.type_check(id, checker).map_err(|e| vec![e])?;
        }

        let unresolved = self.check_unresolved();
        if unresolved.is_empty() {
            Ok(())
        } else {
            Err(unresolved)
        }
    }
}

/// Static type, constant value, and properties installed on a slot at bind
/// time
///
/// The type is the declared type (or universal). The constant fast path is a
/// syntactic check, not a full type-check: only a literal initializer whose
/// natural type is the same as, or subsumed by, the declared type may be
/// treated as constant here. A merely overlapping relationship (say, integer
/// against double) goes through numeric promotion and must wait for the full
/// type-checker.
fn bind_time_payload(
    lattice: &TypeLattice,
    decl: &Declaration,
) -> (SequenceType, Option<Value>, Properties) {
    let static_type = decl.effective_type();

    let mut constant = None;
    if decl.kind == DeclKind::Variable {
        if let Some(value) = decl.initializer.as_ref().and_then(Expr::as_literal) {
            match lattice.relationship(&value.natural_type(), &static_type) {
                TypeRelation::Same | TypeRelation::SubsumedBy => constant = Some(value.clone()),
                _ => {}
            }
        }
    }

    let mut properties = Properties::empty();
    if constant.is_some() {
        properties = properties
            .with(Properties::SIDE_EFFECT_FREE)
            .with(Properties::CONTEXT_INDEPENDENT);
    }
    if static_type.cardinality == Cardinality::ExactlyOne {
        properties = properties.with(Properties::SINGLETON);
    }
    (static_type, constant, properties)
}
