//! The type lattice: relationship queries between sequence types
//!
//! Answers "how does type A relate to type B" with one of five outcomes.
//! The binder uses `SubsumedBy`/`Same` answers to license constant folding
//! and monotonic refinement of bound references.

use crate::ty::{AtomicType, Cardinality, ItemType, SequenceType};

/// Relationship between two types in the lattice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeRelation {
    /// The types denote the same set of values
    Same,
    /// A is a proper supertype of B (every B is an A)
    Subsumes,
    /// A is a proper subtype of B (every A is a B)
    SubsumedBy,
    /// The types share some values but neither contains the other
    Overlaps,
    /// No value satisfies both types
    Disjoint,
}

/// The type lattice
///
/// Stateless today; a handle type so that callers hold a lattice rather than
/// reaching for free functions, and so schema-aware implementations can slot
/// in behind the same calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeLattice;

impl TypeLattice {
    /// Create a lattice over the built-in vocabulary
    pub fn new() -> Self {
        TypeLattice
    }

    /// Relationship between two sequence types
    ///
    /// Composes the item-type partial order with the occurrence-indicator
    /// set algebra. Two types with disjoint item types still overlap at the
    /// empty sequence when both cardinalities admit it.
    pub fn relationship(&self, a: &SequenceType, b: &SequenceType) -> TypeRelation {
        use TypeRelation::*;

        let item = item_relationship(&a.item, &b.item);
        let card = cardinality_relationship(a.cardinality, b.cardinality);

        if item == Same && card == Same {
            return Same;
        }
        if matches!(item, Same | SubsumedBy) && matches!(card, Same | SubsumedBy) {
            return SubsumedBy;
        }
        if matches!(item, Same | Subsumes) && matches!(card, Same | Subsumes) {
            return Subsumes;
        }
        if card == Disjoint {
            return Disjoint;
        }
        if item == Disjoint {
            if a.cardinality.allows_empty() && b.cardinality.allows_empty() {
                return Overlaps;
            }
            return Disjoint;
        }
        Overlaps
    }
}

/// Relationship between two occurrence indicators, as sets over {0, 1, many}
fn cardinality_relationship(a: Cardinality, b: Cardinality) -> TypeRelation {
    let (ma, mb) = (a.mask(), b.mask());
    if ma == mb {
        TypeRelation::Same
    } else if ma & mb == 0 {
        TypeRelation::Disjoint
    } else if ma & mb == ma {
        TypeRelation::SubsumedBy
    } else if ma & mb == mb {
        TypeRelation::Subsumes
    } else {
        TypeRelation::Overlaps
    }
}

/// Relationship between two item types
fn item_relationship(a: &ItemType, b: &ItemType) -> TypeRelation {
    use TypeRelation::*;

    match (a, b) {
        _ if a == b => Same,

        // item() is the top of the item hierarchy
        (ItemType::AnyItem, _) => Subsumes,
        (_, ItemType::AnyItem) => SubsumedBy,

        (ItemType::Atomic(x), ItemType::Atomic(y)) => atomic_relationship(*x, *y),

        (ItemType::Node(x), ItemType::Node(y)) => {
            use crate::ty::NodeKind::AnyNode;
            match (x, y) {
                (AnyNode, _) => Subsumes,
                (_, AnyNode) => SubsumedBy,
                _ => Disjoint,
            }
        }

        (ItemType::Atomic(_), ItemType::Node(_)) | (ItemType::Node(_), ItemType::Atomic(_)) => {
            Disjoint
        }

        // Schema knowledge lives outside this crate, so a named type's
        // relationship to anything but itself stays conservative.
        (ItemType::Named(_), _) | (_, ItemType::Named(_)) => Overlaps,
    }
}

/// Relationship between two built-in atomic types via the parent chain
fn atomic_relationship(a: AtomicType, b: AtomicType) -> TypeRelation {
    if a == b {
        return TypeRelation::Same;
    }
    if atomic_descends(a, b) {
        return TypeRelation::SubsumedBy;
    }
    if atomic_descends(b, a) {
        return TypeRelation::Subsumes;
    }
    TypeRelation::Disjoint
}

/// Is `sub` a strict descendant of `sup` in the atomic hierarchy?
fn atomic_descends(sub: AtomicType, sup: AtomicType) -> bool {
    let mut current = sub.parent();
    while let Some(ty) = current {
        if ty == sup {
            return true;
        }
        current = ty.parent();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::{NodeKind, QName};

    fn seq(item: ItemType, card: Cardinality) -> SequenceType {
        SequenceType::new(item, card)
    }

    #[test]
    fn test_reflexivity() {
        let lattice = TypeLattice::new();
        let t = SequenceType::one(AtomicType::Integer);
        assert_eq!(lattice.relationship(&t, &t), TypeRelation::Same);
    }

    #[test]
    fn test_universal_subsumes_everything() {
        let lattice = TypeLattice::new();
        let any = SequenceType::any();
        let int = SequenceType::one(AtomicType::Integer);
        let nodes = seq(ItemType::Node(NodeKind::Element), Cardinality::OneOrMore);

        assert_eq!(lattice.relationship(&any, &int), TypeRelation::Subsumes);
        assert_eq!(lattice.relationship(&int, &any), TypeRelation::SubsumedBy);
        assert_eq!(lattice.relationship(&any, &nodes), TypeRelation::Subsumes);
    }

    #[test]
    fn test_integer_subsumed_by_decimal() {
        let lattice = TypeLattice::new();
        let int = SequenceType::one(AtomicType::Integer);
        let dec = SequenceType::one(AtomicType::Decimal);

        assert_eq!(lattice.relationship(&int, &dec), TypeRelation::SubsumedBy);
        assert_eq!(lattice.relationship(&dec, &int), TypeRelation::Subsumes);
    }

    #[test]
    fn test_integer_disjoint_from_double() {
        // Promotion changes the value, so the lattice must not report
        // subsumption between integer and double.
        let lattice = TypeLattice::new();
        let int = SequenceType::one(AtomicType::Integer);
        let dbl = SequenceType::one(AtomicType::Double);

        assert_eq!(lattice.relationship(&int, &dbl), TypeRelation::Disjoint);
    }

    #[test]
    fn test_cardinality_narrowing() {
        let lattice = TypeLattice::new();
        let one = SequenceType::one(AtomicType::String);
        let many = seq(
            ItemType::Atomic(AtomicType::String),
            Cardinality::ZeroOrMore,
        );

        assert_eq!(lattice.relationship(&one, &many), TypeRelation::SubsumedBy);
        assert_eq!(lattice.relationship(&many, &one), TypeRelation::Subsumes);
    }

    #[test]
    fn test_disjoint_items_overlap_at_empty() {
        let lattice = TypeLattice::new();
        let opt_int = seq(
            ItemType::Atomic(AtomicType::Integer),
            Cardinality::ZeroOrOne,
        );
        let opt_str = seq(
            ItemType::Atomic(AtomicType::String),
            Cardinality::ZeroOrOne,
        );
        let one_str = SequenceType::one(AtomicType::String);

        // Both admit (), so they overlap there
        assert_eq!(
            lattice.relationship(&opt_int, &opt_str),
            TypeRelation::Overlaps
        );
        // One side cannot be empty, so the types share no value
        assert_eq!(
            lattice.relationship(&opt_int, &one_str),
            TypeRelation::Disjoint
        );
    }

    #[test]
    fn test_disjoint_cardinalities() {
        let lattice = TypeLattice::new();
        let empty = seq(ItemType::AnyItem, Cardinality::Empty);
        let one = SequenceType::one(AtomicType::Integer);

        assert_eq!(lattice.relationship(&empty, &one), TypeRelation::Disjoint);
    }

    #[test]
    fn test_mixed_item_and_cardinality() {
        let lattice = TypeLattice::new();
        // integer+ vs decimal? : item narrows one way, cardinality the other
        let ints = seq(
            ItemType::Atomic(AtomicType::Integer),
            Cardinality::OneOrMore,
        );
        let opt_dec = seq(
            ItemType::Atomic(AtomicType::Decimal),
            Cardinality::ZeroOrOne,
        );

        assert_eq!(lattice.relationship(&ints, &opt_dec), TypeRelation::Overlaps);
    }

    #[test]
    fn test_named_types_conservative() {
        let lattice = TypeLattice::new();
        let part = seq(
            ItemType::Named(QName::new("http://example.com/schema", "part")),
            Cardinality::ExactlyOne,
        );
        let int = SequenceType::one(AtomicType::Integer);

        assert_eq!(lattice.relationship(&part, &part), TypeRelation::Same);
        assert_eq!(lattice.relationship(&part, &int), TypeRelation::Overlaps);
    }

    #[test]
    fn test_node_kinds() {
        let lattice = TypeLattice::new();
        let any_node = SequenceType::new(ItemType::Node(NodeKind::AnyNode), Cardinality::ExactlyOne);
        let element = SequenceType::new(ItemType::Node(NodeKind::Element), Cardinality::ExactlyOne);
        let text = SequenceType::new(ItemType::Node(NodeKind::Text), Cardinality::ExactlyOne);

        assert_eq!(lattice.relationship(&element, &any_node), TypeRelation::SubsumedBy);
        assert_eq!(lattice.relationship(&element, &text), TypeRelation::Disjoint);
    }
}
