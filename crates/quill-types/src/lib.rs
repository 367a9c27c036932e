//! Quill Type Vocabulary
//!
//! Sequence types (item type + occurrence indicator) and the type lattice
//! used by the declaration binder to compare static types.

#![warn(missing_docs)]

pub mod error;
pub mod lattice;
pub mod ty;

pub use error::TypeError;
pub use lattice::{TypeLattice, TypeRelation};
pub use ty::{AtomicType, Cardinality, ItemType, NodeKind, QName, SequenceType, XS_NAMESPACE};
