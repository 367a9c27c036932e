//! Core type definitions for the Quill type vocabulary

use crate::error::TypeError;
use std::fmt;

/// Namespace URI of the built-in schema types (`xs:integer` and friends).
///
/// Types in this namespace are always nameable, regardless of which schema
/// namespaces a module has imported.
pub const XS_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// A qualified name: namespace URI plus local part.
///
/// The empty namespace means "no namespace". Displayed in EQName notation,
/// `Q{uri}local`, which keeps diagnostics unambiguous without prefix
/// bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    /// Namespace URI (empty for no namespace)
    pub ns: String,
    /// Local part
    pub local: String,
}

impl QName {
    /// Create a qualified name in a namespace
    pub fn new(ns: impl Into<String>, local: impl Into<String>) -> Self {
        QName {
            ns: ns.into(),
            local: local.into(),
        }
    }

    /// Create a name with no namespace
    pub fn local(local: impl Into<String>) -> Self {
        QName {
            ns: String::new(),
            local: local.into(),
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ns.is_empty() {
            write!(f, "{}", self.local)
        } else {
            write!(f, "Q{{{}}}{}", self.ns, self.local)
        }
    }
}

/// Occurrence indicator of a sequence type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    /// The empty sequence: `empty-sequence()`
    Empty,
    /// Exactly one item (no indicator)
    ExactlyOne,
    /// Zero or one items: `?`
    ZeroOrOne,
    /// One or more items: `+`
    OneOrMore,
    /// Zero or more items: `*`
    ZeroOrMore,
}

impl Cardinality {
    /// Bitmask over {empty, one, many}, used for set-algebra comparisons
    pub(crate) fn mask(self) -> u8 {
        match self {
            Cardinality::Empty => 0b001,
            Cardinality::ExactlyOne => 0b010,
            Cardinality::ZeroOrOne => 0b011,
            Cardinality::OneOrMore => 0b110,
            Cardinality::ZeroOrMore => 0b111,
        }
    }

    /// Does this cardinality admit the empty sequence?
    pub fn allows_empty(self) -> bool {
        self.mask() & 0b001 != 0
    }

    /// Does this cardinality admit more than one item?
    pub fn allows_many(self) -> bool {
        self.mask() & 0b100 != 0
    }

    /// The smallest cardinality admitting everything either side admits
    pub fn union(self, other: Cardinality) -> Cardinality {
        match self.mask() | other.mask() {
            0b001 => Cardinality::Empty,
            0b010 => Cardinality::ExactlyOne,
            0b011 => Cardinality::ZeroOrOne,
            0b110 => Cardinality::OneOrMore,
            _ => Cardinality::ZeroOrMore,
        }
    }

    /// Parse an occurrence indicator suffix
    pub fn from_indicator(indicator: &str) -> Result<Cardinality, TypeError> {
        match indicator {
            "" => Ok(Cardinality::ExactlyOne),
            "?" => Ok(Cardinality::ZeroOrOne),
            "+" => Ok(Cardinality::OneOrMore),
            "*" => Ok(Cardinality::ZeroOrMore),
            other => Err(TypeError::InvalidSequenceType {
                reason: format!("unknown occurrence indicator {other:?}"),
            }),
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cardinality::Empty => write!(f, "empty-sequence()"),
            Cardinality::ExactlyOne => Ok(()),
            Cardinality::ZeroOrOne => write!(f, "?"),
            Cardinality::OneOrMore => write!(f, "+"),
            Cardinality::ZeroOrMore => write!(f, "*"),
        }
    }
}

/// Built-in atomic types
///
/// `Integer` is subsumed by `Decimal`; everything atomic is subsumed by
/// `AnyAtomic`. `Double` is deliberately not related to `Integer`/`Decimal`:
/// conversion between them is a value-changing promotion, not subsumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AtomicType {
    /// `xs:anyAtomicType`
    AnyAtomic,
    /// `xs:integer`
    Integer,
    /// `xs:decimal`
    Decimal,
    /// `xs:double`
    Double,
    /// `xs:string`
    String,
    /// `xs:boolean`
    Boolean,
    /// `xs:anyURI`
    AnyUri,
    /// `xs:untypedAtomic`
    Untyped,
}

impl AtomicType {
    /// Parent type in the atomic hierarchy (None for the root)
    pub(crate) fn parent(self) -> Option<AtomicType> {
        match self {
            AtomicType::AnyAtomic => None,
            AtomicType::Integer => Some(AtomicType::Decimal),
            _ => Some(AtomicType::AnyAtomic),
        }
    }

    /// Resolve a built-in atomic type by qualified name
    ///
    /// Only names in the `xs` namespace resolve here; schema-defined types
    /// stay [`ItemType::Named`] and are the importing module's business.
    pub fn from_name(name: &QName) -> Result<AtomicType, TypeError> {
        if name.ns != XS_NAMESPACE {
            return Err(TypeError::UnknownType {
                name: name.to_string(),
            });
        }
        match name.local.as_str() {
            "anyAtomicType" => Ok(AtomicType::AnyAtomic),
            "integer" => Ok(AtomicType::Integer),
            "decimal" => Ok(AtomicType::Decimal),
            "double" => Ok(AtomicType::Double),
            "string" => Ok(AtomicType::String),
            "boolean" => Ok(AtomicType::Boolean),
            "anyURI" => Ok(AtomicType::AnyUri),
            "untypedAtomic" => Ok(AtomicType::Untyped),
            _ => Err(TypeError::UnknownType {
                name: name.to_string(),
            }),
        }
    }
}

impl fmt::Display for AtomicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AtomicType::AnyAtomic => "xs:anyAtomicType",
            AtomicType::Integer => "xs:integer",
            AtomicType::Decimal => "xs:decimal",
            AtomicType::Double => "xs:double",
            AtomicType::String => "xs:string",
            AtomicType::Boolean => "xs:boolean",
            AtomicType::AnyUri => "xs:anyURI",
            AtomicType::Untyped => "xs:untypedAtomic",
        };
        write!(f, "{}", name)
    }
}

/// Node kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// `node()`
    AnyNode,
    /// `document-node()`
    Document,
    /// `element()`
    Element,
    /// `attribute()`
    Attribute,
    /// `text()`
    Text,
    /// `comment()`
    Comment,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::AnyNode => "node()",
            NodeKind::Document => "document-node()",
            NodeKind::Element => "element()",
            NodeKind::Attribute => "attribute()",
            NodeKind::Text => "text()",
            NodeKind::Comment => "comment()",
        };
        write!(f, "{}", name)
    }
}

/// Item type of a sequence type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemType {
    /// `item()` - any item at all
    AnyItem,
    /// A built-in atomic type
    Atomic(AtomicType),
    /// A node test
    Node(NodeKind),
    /// A schema-defined type known only by name
    ///
    /// The lattice treats these conservatively: distinct named types overlap
    /// unless proven otherwise, since schema knowledge lives outside this
    /// crate. The name's namespace is what the import boundary check
    /// inspects.
    Named(QName),
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemType::AnyItem => write!(f, "item()"),
            ItemType::Atomic(a) => write!(f, "{}", a),
            ItemType::Node(n) => write!(f, "{}", n),
            ItemType::Named(q) => write!(f, "{}", q),
        }
    }
}

/// A static sequence type: item type plus occurrence indicator
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SequenceType {
    /// The item type
    pub item: ItemType,
    /// The occurrence indicator
    pub cardinality: Cardinality,
}

impl SequenceType {
    /// Create a sequence type
    pub fn new(item: ItemType, cardinality: Cardinality) -> Self {
        SequenceType { item, cardinality }
    }

    /// The universal type `item()*`, which every value satisfies
    pub fn any() -> Self {
        SequenceType {
            item: ItemType::AnyItem,
            cardinality: Cardinality::ZeroOrMore,
        }
    }

    /// Exactly one item of the given atomic type
    pub fn one(atomic: AtomicType) -> Self {
        SequenceType {
            item: ItemType::Atomic(atomic),
            cardinality: Cardinality::ExactlyOne,
        }
    }

    /// Is this the universal type?
    pub fn is_any(&self) -> bool {
        self.item == ItemType::AnyItem && self.cardinality == Cardinality::ZeroOrMore
    }
}

impl fmt::Display for SequenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.cardinality == Cardinality::Empty {
            write!(f, "empty-sequence()")
        } else {
            write!(f, "{}{}", self.item, self.cardinality)
        }
    }
}
