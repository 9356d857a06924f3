use std::fmt;

use thiserror::Error;

use crate::domain::{
    relationship::{RelationshipKind, Role},
    ElementKind,
};

/// Errors raised by model operations.
///
/// Every operation checks its inputs before mutating anything, so a model
/// is left unchanged when one of these is returned.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    /// A value of the wrong kind was supplied (e.g. a requirement where a
    /// block was expected).
    #[error("'{value}' must be {expected}")]
    InvalidType {
        /// Rendering of the rejected value.
        value: String,
        /// What was expected instead.
        expected: &'static str,
    },

    /// A value of the right kind but outside the permitted range.
    #[error("invalid value '{value}': {reason}")]
    InvalidValue {
        /// Rendering of the rejected value.
        value: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// No element is bound under the given name or identity.
    #[error("'{0}' not found")]
    NotFound(String),

    /// The name is already bound in the target namespace.
    #[error("'{0}' is already defined in this namespace")]
    DuplicateKey(String),

    /// A relationship endpoint has the wrong kind for its role.
    #[error("the {role} of a {relationship} relationship must be a {expected}, not a {found}")]
    InvalidRelationship {
        /// The relationship being constructed.
        relationship: RelationshipKind,
        /// The offending endpoint.
        role: Role,
        /// The kind the role requires.
        expected: ElementKind,
        /// The kind that was supplied.
        found: ElementKind,
    },
}

impl Error {
    pub(crate) fn invalid_type(value: impl fmt::Display, expected: &'static str) -> Self {
        Self::InvalidType {
            value: value.to_string(),
            expected,
        }
    }

    pub(crate) fn invalid_value(value: impl fmt::Display, reason: &'static str) -> Self {
        Self::InvalidValue {
            value: value.to_string(),
            reason,
        }
    }
}

/// Result type used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
