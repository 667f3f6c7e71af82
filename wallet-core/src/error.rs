//! Error types for the coupon wallet
//!
//! All errors use thiserror for structured error handling.
//! These errors can be serialized to the presentation layer, which shows
//! them as a dismissable notice.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The identifier is absent from the partition the operation expected.
    #[error("Coupon not found: {0}")]
    NotFound(String),

    /// The operation is well-formed but not applicable to the record's partition.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// An identifier was found in both the active collection and the trash.
    #[error("Store invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Settings error: {0}")]
    Settings(String),
}

impl AppError {
    /// Errors the presentation layer may show to the user and carry on.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            AppError::NotFound(_) | AppError::InvalidState(_) | AppError::Validation(_)
        )
    }
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_display_string() {
        let err = AppError::NotFound("abc".to_string());
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, "\"Coupon not found: abc\"");
    }

    #[test]
    fn test_user_facing_classification() {
        assert!(AppError::NotFound("x".into()).is_user_facing());
        assert!(AppError::InvalidState("x".into()).is_user_facing());
        assert!(!AppError::InvariantViolation("x".into()).is_user_facing());
    }
}
