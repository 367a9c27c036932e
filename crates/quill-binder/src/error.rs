//! Binder errors
//!
//! Every user-facing variant carries a stable query-language error code,
//! surfaced through [`BindError::code`]. Locations are (module, line) pairs;
//! column information is not tracked at this layer and is always reported as
//! unavailable.

use crate::decl::SourceLocation;
use quill_types::QName;
use thiserror::Error;

/// Errors raised while binding and type-resolving a module's declarations
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BindError {
    /// A reference was never fixed up by the end of module compilation
    #[error("Undeclared variable: {name} ({location})")]
    UnresolvedName {
        /// The name written at the use site
        name: QName,
        /// Use-site location
        location: SourceLocation,
    },

    /// An initializer cannot satisfy the declared type
    #[error("Required type of {role} of {name} is {expected}, supplied value has type {actual} ({location})")]
    TypeMismatch {
        /// Declaration whose initializer failed
        name: QName,
        /// Role of the offending expression, e.g. "variable initializer"
        role: String,
        /// The declared type
        expected: String,
        /// The initializer's static type
        actual: String,
        /// Declaration location
        location: SourceLocation,
    },

    /// A plain variable's initializer is an updating expression
    #[error("Initializer of variable {name} is an updating expression ({location})")]
    UpdatingInitializer {
        /// The variable
        name: QName,
        /// Declaration location
        location: SourceLocation,
    },

    /// An imported function's signature uses a type the importer cannot name
    #[error("Function {function}#{arity} refers to type {ty}, which is not available in the importing module")]
    ImportBoundary {
        /// The function that matched the call
        function: QName,
        /// Its arity
        arity: usize,
        /// The offending type, rendered
        ty: String,
    },

    /// Two global variables or parameters share a name
    #[error("Duplicate declaration of variable {name} ({location})")]
    DuplicateVariable {
        /// The name declared twice
        name: QName,
        /// Location of the second declaration
        location: SourceLocation,
    },

    /// Two functions share a name and arity
    #[error("Duplicate declaration of function {name}#{arity}")]
    DuplicateFunction {
        /// The function name
        name: QName,
        /// Its arity
        arity: usize,
    },

    /// `compile` was invoked twice on one declaration
    ///
    /// A caller contract violation, not a user error: the whole module
    /// compile is abandoned.
    #[error("Internal error: variable {name} compiled twice")]
    DoubleCompilation {
        /// The declaration involved
        name: QName,
    },

    /// A reference slot was fixed up to two different declarations
    ///
    /// Like [`BindError::DoubleCompilation`], a contract violation.
    #[error("Internal error: reference to {name} re-bound to a different declaration")]
    ConflictingResolution {
        /// The name at the use site
        name: QName,
    },

    /// A diagnostic raised by the external expression compiler
    #[error("{code}: {message} ({location})")]
    Expression {
        /// Query-language error code reported by the collaborator
        code: String,
        /// Human-readable message
        message: String,
        /// Location of the offending expression
        location: SourceLocation,
    },
}

impl BindError {
    /// The stable query-language error code for this error
    pub fn code(&self) -> &str {
        match self {
            BindError::UnresolvedName { .. } => "XPST0008",
            BindError::TypeMismatch { .. } => "XPTY0004",
            BindError::UpdatingInitializer { .. } => "XUST0001",
            BindError::ImportBoundary { .. } => "XQST0036",
            BindError::DuplicateVariable { .. } => "XQST0049",
            BindError::DuplicateFunction { .. } => "XQST0034",
            BindError::DoubleCompilation { .. } => "XXIN0001",
            BindError::ConflictingResolution { .. } => "XXIN0001",
            BindError::Expression { code, .. } => code,
        }
    }

    /// Is this a programming-contract violation rather than a user error?
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            BindError::DoubleCompilation { .. } | BindError::ConflictingResolution { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = BindError::UnresolvedName {
            name: QName::local("x"),
            location: SourceLocation::new("main.xq", 3),
        };
        assert_eq!(err.code(), "XPST0008");
        assert!(!err.is_internal());

        let err = BindError::UpdatingInitializer {
            name: QName::local("v"),
            location: SourceLocation::new("main.xq", 7),
        };
        assert_eq!(err.code(), "XUST0001");

        let err = BindError::DoubleCompilation {
            name: QName::local("v"),
        };
        assert_eq!(err.code(), "XXIN0001");
        assert!(err.is_internal());
    }

    #[test]
    fn test_message_carries_location() {
        let err = BindError::UnresolvedName {
            name: QName::local("missing"),
            location: SourceLocation::new("lib.xq", 12),
        };
        let msg = err.to_string();
        assert!(msg.contains("missing"));
        assert!(msg.contains("lib.xq:12"));
    }
}
