//! Error taxonomy for credential storage operations.
//!
//! Every backend reports lookup misses as exactly [`StoreError::UserNotFound`]
//! or [`StoreError::TokenNotFound`], so callers can branch on the kind alone.

use std::fmt;

/// Errors that can occur during credential storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No record matches the given key or token.
    #[error("User not found")]
    UserNotFound,

    /// The remember-me token does not exist or was already consumed.
    #[error("Token not found")]
    TokenNotFound,

    /// A record with the same key already exists.
    #[error("User already exists: {key}")]
    UserAlreadyExists {
        /// The key that is already taken.
        key: String,
    },

    /// The attribute bag could not populate the record.
    #[error("Validation error: {}", FieldErrors(failures))]
    Validation {
        /// Every offending field with the reason it was rejected.
        failures: Vec<FieldError>,
    },

    /// The underlying connectivity or query layer failed.
    #[error("Storage failure: {message}")]
    StorageFailure {
        /// Description of the failure.
        message: String,
    },
}

impl StoreError {
    /// Creates a new `UserAlreadyExists` error.
    #[must_use]
    pub fn already_exists(key: impl Into<String>) -> Self {
        Self::UserAlreadyExists { key: key.into() }
    }

    /// Creates a new `Validation` error from a list of field failures.
    #[must_use]
    pub fn validation(failures: Vec<FieldError>) -> Self {
        Self::Validation { failures }
    }

    /// Creates a new `StorageFailure` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::StorageFailure {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a user not found error.
    #[must_use]
    pub fn is_user_not_found(&self) -> bool {
        matches!(self, Self::UserNotFound)
    }

    /// Returns `true` if this is a token not found error.
    #[must_use]
    pub fn is_token_not_found(&self) -> bool {
        matches!(self, Self::TokenNotFound)
    }

    /// Returns `true` if this is an already exists error.
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::UserAlreadyExists { .. })
    }

    /// Returns `true` if this is a validation error.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Returns `true` if this is a storage failure.
    #[must_use]
    pub fn is_storage_failure(&self) -> bool {
        matches!(self, Self::StorageFailure { .. })
    }

    /// Returns the field failures of a validation error, or an empty slice.
    #[must_use]
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            Self::Validation { failures } => failures,
            _ => &[],
        }
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UserNotFound => ErrorCategory::NotFound,
            Self::TokenNotFound => ErrorCategory::TokenRejected,
            Self::UserAlreadyExists { .. } => ErrorCategory::Conflict,
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::StorageFailure { .. } => ErrorCategory::Infrastructure,
        }
    }
}

/// A single attribute that failed to bind onto the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Attribute name as supplied by the caller.
    pub field: String,
    /// Why the attribute was rejected.
    pub reason: String,
}

impl FieldError {
    /// Creates a new field error.
    #[must_use]
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

struct FieldErrors<'a>(&'a [FieldError]);

impl fmt::Display for FieldErrors<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}

/// Categories of storage errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// No matching record.
    NotFound,
    /// Unknown or already consumed remember-me token.
    TokenRejected,
    /// Key already taken.
    Conflict,
    /// Attribute binding failed.
    Validation,
    /// Connectivity or query failure.
    Infrastructure,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::TokenRejected => write!(f, "token_rejected"),
            Self::Conflict => write!(f, "conflict"),
            Self::Validation => write!(f, "validation"),
            Self::Infrastructure => write!(f, "infrastructure"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(StoreError::UserNotFound.to_string(), "User not found");
        assert_eq!(StoreError::TokenNotFound.to_string(), "Token not found");

        let err = StoreError::already_exists("a@b.com");
        assert_eq!(err.to_string(), "User already exists: a@b.com");

        let err = StoreError::storage("connection refused");
        assert_eq!(err.to_string(), "Storage failure: connection refused");
    }

    #[test]
    fn test_validation_display_lists_every_field() {
        let err = StoreError::validation(vec![
            FieldError::new("confirmed", "expected bool, got string"),
            FieldError::new("nickname", "unknown attribute"),
        ]);
        assert_eq!(
            err.to_string(),
            "Validation error: confirmed: expected bool, got string; nickname: unknown attribute"
        );
        assert_eq!(err.field_errors().len(), 2);
    }

    #[test]
    fn test_error_predicates() {
        assert!(StoreError::UserNotFound.is_user_not_found());
        assert!(!StoreError::UserNotFound.is_token_not_found());
        assert!(StoreError::TokenNotFound.is_token_not_found());
        assert!(StoreError::already_exists("k").is_already_exists());
        assert!(StoreError::validation(Vec::new()).is_validation());
        assert!(StoreError::storage("boom").is_storage_failure());
        assert!(StoreError::storage("boom").field_errors().is_empty());
    }

    #[test]
    fn test_error_category() {
        assert_eq!(StoreError::UserNotFound.category(), ErrorCategory::NotFound);
        assert_eq!(
            StoreError::TokenNotFound.category(),
            ErrorCategory::TokenRejected
        );
        assert_eq!(
            StoreError::already_exists("k").category(),
            ErrorCategory::Conflict
        );
        assert_eq!(
            StoreError::storage("boom").category(),
            ErrorCategory::Infrastructure
        );
        assert_eq!(ErrorCategory::TokenRejected.to_string(), "token_rejected");
    }
}
