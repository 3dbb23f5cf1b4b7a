//! Error types for mcp-warden
//!
//! This module defines the error hierarchy used throughout the engine.
//! We use `thiserror` for library-style errors that are part of the API.
//! Missing-record lookups are resolved deny-leaning at the engine boundary
//! (a denial with reason `principal_unresolved`) rather than escalated;
//! only a genuine store failure propagates to the caller.

use thiserror::Error;

/// Errors surfaced by a policy store adapter.
#[derive(Error, Debug)]
pub enum PolicyStoreError {
    #[error("unknown principal: {0}")]
    PrincipalNotFound(String),

    #[error("unknown role: {0}")]
    RoleNotFound(String),

    #[error("unknown team: {0}")]
    TeamNotFound(String),

    #[error("malformed policy record '{record}': {message}")]
    Malformed { record: String, message: String },

    #[error("policy store unavailable: {0}")]
    Unavailable(String),
}

impl PolicyStoreError {
    /// Whether this is a missing-record lookup rather than a store failure.
    ///
    /// NotFound lookups collapse to a denial; everything else is fatal for
    /// the request, because the engine refuses to fabricate a decision from
    /// missing data.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            PolicyStoreError::PrincipalNotFound(_)
                | PolicyStoreError::RoleNotFound(_)
                | PolicyStoreError::TeamNotFound(_)
        )
    }

    pub fn malformed(record: impl Into<String>, message: impl Into<String>) -> Self {
        PolicyStoreError::Malformed {
            record: record.into(),
            message: message.into(),
        }
    }
}

/// Top-level engine error.
#[derive(Error, Debug)]
pub enum AuthzError {
    #[error("policy store error: {0}")]
    Store(#[from] PolicyStoreError),
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, AuthzError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        assert!(PolicyStoreError::PrincipalNotFound("alice".into()).is_not_found());
        assert!(PolicyStoreError::RoleNotFound("analyst".into()).is_not_found());
        assert!(PolicyStoreError::TeamNotFound("qa".into()).is_not_found());
        assert!(!PolicyStoreError::Unavailable("connection reset".into()).is_not_found());
        assert!(!PolicyStoreError::malformed("role/analyst", "bad mode tag").is_not_found());
    }

    #[test]
    fn test_error_display() {
        let err = PolicyStoreError::malformed("role/analyst", "unknown mode tag");
        assert!(err.to_string().contains("role/analyst"));

        let err: AuthzError = PolicyStoreError::PrincipalNotFound("bob".into()).into();
        assert!(err.to_string().contains("bob"));
    }
}
