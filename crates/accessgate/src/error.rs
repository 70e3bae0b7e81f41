//! Error types for access control operations
//!
//! This module defines every error the grants store, hierarchy resolver,
//! query engine and access builder can report. All of them are fatal to the
//! operation that raised them and leave the grants untouched.

use thiserror::Error;

/// Access control error types.
///
/// Each variant carries a human-readable message; [`error_code`](Self::error_code)
/// gives the stable kind tag for API responses and logs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessControlError {
    /// Empty or reserved role/resource name
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// Malformed or empty role specification
    #[error("Invalid role(s): {0}")]
    InvalidRole(String),

    /// Malformed or empty resource specification
    #[error("Invalid resource(s): {0}")]
    InvalidResource(String),

    /// Bulk grants input is neither an object nor a list of grant entries
    #[error("Invalid grants input: {0}")]
    InvalidGrantsInput(String),

    /// Action outside create/read/update/delete
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Possession outside own/any
    #[error("Invalid action possession: {0}")]
    InvalidPossession(String),

    /// Reference to a role that is not in the grants
    #[error("Role not found: \"{0}\"")]
    RoleNotFound(String),

    /// A role tried to extend itself
    #[error("Cannot extend role \"{0}\" by itself.")]
    SelfExtension(String),

    /// An extension would create an inheritance cycle
    #[error("Cross inheritance is not allowed. Role \"{extender}\" already extends \"{role}\".")]
    CrossInheritance {
        /// Role being extended
        role: String,
        /// Role that already inherits from `role`
        extender: String,
    },

    /// Mutation attempted after the grants were locked
    #[error("Cannot alter the underlying grants model. AccessControl instance is locked.")]
    Locked,

    /// Lock requested on empty grants
    #[error("Cannot lock empty or invalid grants model.")]
    EmptyGrants,
}

/// Result type for access control operations.
pub type AccessControlResult<T> = Result<T, AccessControlError>;

impl AccessControlError {
    /// Check if this error comes from rejected input rather than from the
    /// state of the grants.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            AccessControlError::InvalidName(_)
                | AccessControlError::InvalidRole(_)
                | AccessControlError::InvalidResource(_)
                | AccessControlError::InvalidGrantsInput(_)
                | AccessControlError::InvalidAction(_)
                | AccessControlError::InvalidPossession(_)
        )
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            AccessControlError::InvalidName(_) => "INVALID_NAME",
            AccessControlError::InvalidRole(_) => "INVALID_ROLE",
            AccessControlError::InvalidResource(_) => "INVALID_RESOURCE",
            AccessControlError::InvalidGrantsInput(_) => "INVALID_GRANTS_INPUT",
            AccessControlError::InvalidAction(_) => "INVALID_ACTION",
            AccessControlError::InvalidPossession(_) => "INVALID_POSSESSION",
            AccessControlError::RoleNotFound(_) => "ROLE_NOT_FOUND",
            AccessControlError::SelfExtension(_) => "SELF_EXTENSION",
            AccessControlError::CrossInheritance { .. } => "CROSS_INHERITANCE",
            AccessControlError::Locked => "LOCKED",
            AccessControlError::EmptyGrants => "EMPTY_GRANTS",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = AccessControlError::RoleNotFound("ghost".to_string());
        assert_eq!(err.to_string(), "Role not found: \"ghost\"");

        let err = AccessControlError::CrossInheritance {
            role: "user".to_string(),
            extender: "admin".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Cross inheritance is not allowed. Role \"admin\" already extends \"user\"."
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(AccessControlError::Locked.error_code(), "LOCKED");
        assert_eq!(AccessControlError::EmptyGrants.error_code(), "EMPTY_GRANTS");
        assert_eq!(
            AccessControlError::SelfExtension("x".into()).error_code(),
            "SELF_EXTENSION"
        );
    }

    #[test]
    fn test_is_validation_error() {
        assert!(AccessControlError::InvalidAction("put".into()).is_validation_error());
        assert!(!AccessControlError::Locked.is_validation_error());
        assert!(!AccessControlError::RoleNotFound("x".into()).is_validation_error());
    }
}
