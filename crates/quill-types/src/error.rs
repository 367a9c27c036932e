//! Type vocabulary errors

use thiserror::Error;

/// Errors raised by type vocabulary operations
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TypeError {
    /// A type name could not be resolved in the built-in vocabulary
    #[error("Unknown type: {name}")]
    UnknownType {
        /// The name that failed to resolve
        name: String,
    },

    /// A sequence type was syntactically malformed
    #[error("Invalid sequence type: {reason}")]
    InvalidSequenceType {
        /// Why the type is invalid
        reason: String,
    },
}
