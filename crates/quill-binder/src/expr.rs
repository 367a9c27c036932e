//! Expression surface consumed by the binder
//!
//! The full parser and type-checker live outside this crate. The binder only
//! needs to see enough expression structure to make binding decisions: is
//! the initializer a literal, is it an updating expression, which reference
//! slots does it contain. Everything else is opaque and flows through the
//! [`ExprCompiler`] collaborator.

use crate::error::BindError;
use crate::reference::RefId;
use quill_types::{AtomicType, QName, SequenceType};

/// A literal value appearing in query text
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// An integer literal
    Integer(i64),
    /// A double literal
    Double(f64),
    /// A string literal
    Str(String),
    /// A boolean literal
    Boolean(bool),
}

impl Value {
    /// The literal's natural static type: a singleton of its atomic type
    pub fn natural_type(&self) -> SequenceType {
        let atomic = match self {
            Value::Integer(_) => AtomicType::Integer,
            Value::Double(_) => AtomicType::Double,
            Value::Str(_) => AtomicType::String,
            Value::Boolean(_) => AtomicType::Boolean,
        };
        SequenceType::one(atomic)
    }
}

/// Arithmetic operators (representative subset)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    /// Addition
    Add,
    /// Subtraction
    Sub,
    /// Multiplication
    Mul,
    /// Division
    Div,
}

/// Kinds of updating expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    /// `insert node ...`
    Insert,
    /// `delete node ...`
    Delete,
    /// `replace node ...`
    Replace,
    /// `rename node ...`
    Rename,
}

/// Expression tree as seen by the binder
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal value
    Literal(Value),
    /// A reference to a global variable or parameter, by slot key
    VarRef(RefId),
    /// A function call
    Call {
        /// The callee's qualified name
        name: QName,
        /// Argument expressions
        args: Vec<Expr>,
    },
    /// A binary arithmetic expression
    Arith {
        /// The operator
        op: ArithOp,
        /// Left operand
        lhs: Box<Expr>,
        /// Right operand
        rhs: Box<Expr>,
    },
    /// An updating expression; illegal as a plain variable's initializer
    Updating {
        /// What kind of update
        kind: UpdateKind,
        /// The target expression
        target: Box<Expr>,
    },
}

impl Expr {
    /// Is this an update-only expression?
    pub fn is_updating(&self) -> bool {
        matches!(self, Expr::Updating { .. })
    }

    /// The literal value, if this expression is a bare literal
    pub fn as_literal(&self) -> Option<&Value> {
        match self {
            Expr::Literal(v) => Some(v),
            _ => None,
        }
    }
}

/// The external type-check/optimize collaborator
///
/// Implementations perform full static typing and rewriting of expressions.
/// The binder treats the result as opaque: a possibly-rewritten expression
/// that replaces the declaration's initializer.
pub trait ExprCompiler {
    /// Type-check an expression against a required type
    ///
    /// `role` names the syntactic role for diagnostics (the binder passes
    /// "variable initializer"). Returns the possibly-rewritten expression.
    fn type_check(
        &mut self,
        expr: Expr,
        required: &SequenceType,
        role: &str,
    ) -> Result<Expr, BindError>;

    /// Optimize a type-checked expression
    fn optimize(&mut self, expr: Expr) -> Result<Expr, BindError>;

    /// Allocate local evaluation slots for an expression, returning the count
    fn allocate_slots(&mut self, expr: &Expr) -> usize;
}

/// The external storage-slot numbering scheme
///
/// Produces a unique integer per global variable within a module. Opaque to
/// the binder, which only threads the numbers through to runtime handles.
pub trait SlotAllocator {
    /// Hand out the next free slot number
    fn next_slot(&mut self) -> usize;
}

/// Sequential slot numbering, the common case
#[derive(Debug, Default)]
pub struct SequentialSlots {
    next: usize,
}

impl SequentialSlots {
    /// Start numbering from zero
    pub fn new() -> Self {
        SequentialSlots::default()
    }
}

impl SlotAllocator for SequentialSlots {
    fn next_slot(&mut self) -> usize {
        let slot = self.next;
        self.next += 1;
        slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_types::Cardinality;

    #[test]
    fn test_literal_natural_types() {
        assert_eq!(
            Value::Integer(42).natural_type(),
            SequenceType::one(AtomicType::Integer)
        );
        assert_eq!(
            Value::Str("x".into()).natural_type(),
            SequenceType::one(AtomicType::String)
        );
        assert_eq!(
            Value::Boolean(true).natural_type().cardinality,
            Cardinality::ExactlyOne
        );
    }

    #[test]
    fn test_updating_detection() {
        let update = Expr::Updating {
            kind: UpdateKind::Delete,
            target: Box::new(Expr::Literal(Value::Integer(1))),
        };
        assert!(update.is_updating());
        assert!(!Expr::Literal(Value::Integer(1)).is_updating());
    }

    #[test]
    fn test_as_literal() {
        let lit = Expr::Literal(Value::Str("x".into()));
        assert_eq!(lit.as_literal(), Some(&Value::Str("x".into())));

        let sum = Expr::Arith {
            op: ArithOp::Add,
            lhs: Box::new(Expr::Literal(Value::Integer(1))),
            rhs: Box::new(Expr::Literal(Value::Integer(1))),
        };
        assert!(sum.as_literal().is_none());
    }

    #[test]
    fn test_sequential_slots() {
        let mut slots = SequentialSlots::new();
        assert_eq!(slots.next_slot(), 0);
        assert_eq!(slots.next_slot(), 1);
        assert_eq!(slots.next_slot(), 2);
    }
}
