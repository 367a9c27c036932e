//! Reference slots: use-site links to global declarations
//!
//! A slot starts "dangling", holding only the name written at the use site.
//! Fixup resolves it to a compiled declaration and installs a static type;
//! later refinement may narrow that type but never widen it. Slots are owned
//! by the [`DeclarationTable`](crate::table::DeclarationTable) arena and are
//! addressed by [`RefId`], never by pointer.

use crate::decl::{CompiledVariable, DeclId, SourceLocation};
use crate::error::BindError;
use crate::expr::Value;
use quill_types::{QName, SequenceType, TypeLattice, TypeRelation};
use std::fmt;
use std::sync::Arc;

/// Key of a reference slot in its module's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RefId(pub u32);

impl fmt::Display for RefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ref#{}", self.0)
    }
}

/// What a reference slot is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    /// A plain value reference: reads the variable's value. Receives
    /// retroactive type refinement.
    Value,
    /// A name-only reference (introspection, diagnostics). Identity only;
    /// refinement never touches it.
    Name,
}

/// Special properties of a bound reference, installed monotonically
///
/// Once a bit is set it stays set; fixup and refinement only ever add bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Properties(u8);

impl Properties {
    /// Evaluation has no side effects
    pub const SIDE_EFFECT_FREE: Properties = Properties(0b001);
    /// Value does not depend on the dynamic context item
    pub const CONTEXT_INDEPENDENT: Properties = Properties(0b010);
    /// Statically known to produce exactly one item
    pub const SINGLETON: Properties = Properties(0b100);

    /// No properties
    pub fn empty() -> Self {
        Properties(0)
    }

    /// Union of two property sets
    pub fn with(self, other: Properties) -> Self {
        Properties(self.0 | other.0)
    }

    /// Does this set contain every bit of `other`?
    pub fn contains(self, other: Properties) -> bool {
        self.0 & other.0 == other.0
    }
}

/// A use-site reference to a global variable or parameter
#[derive(Debug, Clone)]
pub struct ReferenceSlot {
    /// The name written at the use site
    pub target_name: QName,
    /// How the reference is used
    pub kind: RefKind,
    /// Use-site location, for unresolved-name reporting
    pub location: SourceLocation,
    /// The declaration this slot resolved to, if fixup has run
    resolved: Option<DeclId>,
    /// Shared handle to the compiled declaration
    target: Option<Arc<CompiledVariable>>,
    /// Static type assumed at this use site
    static_type: SequenceType,
    /// Compile-time constant value, when the fast path or refinement found one
    constant: Option<Value>,
    /// Special properties
    properties: Properties,
}

impl ReferenceSlot {
    /// Create a dangling slot
    pub fn new(target_name: QName, kind: RefKind, location: SourceLocation) -> Self {
        ReferenceSlot {
            target_name,
            kind,
            location,
            resolved: None,
            target: None,
            static_type: SequenceType::any(),
            constant: None,
            properties: Properties::empty(),
        }
    }

    /// Has fixup resolved this slot?
    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }

    /// The declaration this slot resolved to
    pub fn resolved_decl(&self) -> Option<DeclId> {
        self.resolved
    }

    /// Shared handle to the compiled declaration
    pub fn target(&self) -> Option<&Arc<CompiledVariable>> {
        self.target.as_ref()
    }

    /// The static type assumed at this use site
    pub fn static_type(&self) -> &SequenceType {
        &self.static_type
    }

    /// The compile-time constant value, if any
    pub fn constant(&self) -> Option<&Value> {
        self.constant.as_ref()
    }

    /// Special properties installed so far
    pub fn properties(&self) -> Properties {
        self.properties
    }

    /// Resolve this slot to a compiled declaration
    ///
    /// Re-resolving to the same declaration re-installs type information;
    /// re-resolving to a different declaration is a contract violation.
    pub(crate) fn resolve(
        &mut self,
        decl: DeclId,
        target: Arc<CompiledVariable>,
        static_type: SequenceType,
        constant: Option<Value>,
        properties: Properties,
        lattice: &TypeLattice,
    ) -> Result<(), BindError> {
        match self.resolved {
            Some(existing) if existing != decl => {
                return Err(BindError::ConflictingResolution {
                    name: self.target_name.clone(),
                });
            }
            _ => {}
        }
        self.resolved = Some(decl);
        self.target = Some(target);
        self.refine(static_type, constant, properties, lattice);
        Ok(())
    }

    /// Install narrower type information on an already-resolved slot
    ///
    /// Monotonic: the type moves only towards `Same` or narrower; a wider or
    /// contradictory type is ignored. Constants are kept once installed.
    /// Properties accumulate.
    pub(crate) fn refine(
        &mut self,
        static_type: SequenceType,
        constant: Option<Value>,
        properties: Properties,
        lattice: &TypeLattice,
    ) {
        let narrower = match lattice.relationship(&static_type, &self.static_type) {
            TypeRelation::Same | TypeRelation::SubsumedBy => true,
            TypeRelation::Subsumes | TypeRelation::Overlaps | TypeRelation::Disjoint => false,
        };
        if narrower {
            self.static_type = static_type;
        }
        if self.constant.is_none() {
            self.constant = constant;
        }
        self.properties = self.properties.with(properties);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::DeclKind;
    use quill_types::AtomicType;

    fn loc() -> SourceLocation {
        SourceLocation::new("test.xq", 1)
    }

    fn handle(decl: DeclId) -> Arc<CompiledVariable> {
        Arc::new(CompiledVariable {
            decl,
            name: QName::local("x"),
            slot: 0,
            kind: DeclKind::Variable,
            static_type: SequenceType::any(),
            ref_estimate: 10,
        })
    }

    #[test]
    fn test_properties_monotone_union() {
        let p = Properties::empty()
            .with(Properties::SIDE_EFFECT_FREE)
            .with(Properties::SINGLETON);
        assert!(p.contains(Properties::SIDE_EFFECT_FREE));
        assert!(p.contains(Properties::SINGLETON));
        assert!(!p.contains(Properties::CONTEXT_INDEPENDENT));
    }

    #[test]
    fn test_dangling_slot_sees_universal_type() {
        let slot = ReferenceSlot::new(QName::local("x"), RefKind::Value, loc());
        assert!(!slot.is_resolved());
        assert!(slot.static_type().is_any());
        assert!(slot.constant().is_none());
    }

    #[test]
    fn test_refine_narrows_but_never_widens() {
        let lattice = TypeLattice::new();
        let mut slot = ReferenceSlot::new(QName::local("x"), RefKind::Value, loc());
        let decl = DeclId(0);
        slot.resolve(
            decl,
            handle(decl),
            SequenceType::any(),
            None,
            Properties::empty(),
            &lattice,
        )
        .unwrap();

        let int = SequenceType::one(AtomicType::Integer);
        slot.refine(int.clone(), None, Properties::empty(), &lattice);
        assert_eq!(slot.static_type(), &int);

        // Re-running refinement with a broader type must not widen
        slot.refine(SequenceType::any(), None, Properties::empty(), &lattice);
        assert_eq!(slot.static_type(), &int);

        // A contradictory type is ignored too
        slot.refine(
            SequenceType::one(AtomicType::String),
            None,
            Properties::empty(),
            &lattice,
        );
        assert_eq!(slot.static_type(), &int);
    }

    #[test]
    fn test_resolve_to_different_declaration_fails() {
        let lattice = TypeLattice::new();
        let mut slot = ReferenceSlot::new(QName::local("x"), RefKind::Value, loc());
        slot.resolve(
            DeclId(0),
            handle(DeclId(0)),
            SequenceType::any(),
            None,
            Properties::empty(),
            &lattice,
        )
        .unwrap();

        let err = slot
            .resolve(
                DeclId(1),
                handle(DeclId(1)),
                SequenceType::any(),
                None,
                Properties::empty(),
                &lattice,
            )
            .unwrap_err();
        assert!(matches!(err, BindError::ConflictingResolution { .. }));
    }

    #[test]
    fn test_constant_kept_once_installed() {
        let lattice = TypeLattice::new();
        let mut slot = ReferenceSlot::new(QName::local("x"), RefKind::Value, loc());
        let decl = DeclId(0);
        slot.resolve(
            decl,
            handle(decl),
            SequenceType::one(AtomicType::Integer),
            Some(Value::Integer(42)),
            Properties::SIDE_EFFECT_FREE,
            &lattice,
        )
        .unwrap();

        slot.refine(
            SequenceType::one(AtomicType::Integer),
            None,
            Properties::empty(),
            &lattice,
        );
        assert_eq!(slot.constant(), Some(&Value::Integer(42)));
        assert!(slot.properties().contains(Properties::SIDE_EFFECT_FREE));
    }
}
