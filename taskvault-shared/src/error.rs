/// Core error taxonomy
///
/// Four outcomes cover every fallible core operation:
///
/// - [`CoreError::Validation`]: malformed input or a disallowed update field,
///   reported with field-level detail.
/// - [`CoreError::Unauthenticated`]: any authentication failure. The variant
///   carries no detail on purpose; a missing header, a forged signature and a
///   revoked token must be indistinguishable to the caller.
/// - [`CoreError::NotFound`]: the resource is absent *or* owned by someone
///   else. The two cases are deliberately collapsed so that existence of a
///   foreign record never leaks.
/// - [`CoreError::Store`]: unexpected persistence failure.

use serde::{Deserialize, Serialize};

use crate::store::StoreError;

/// A single field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Unified core error type
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Input failed validation; carries field-level detail
    #[error("validation failed on {} field(s)", .0.len())]
    Validation(Vec<FieldError>),

    /// Authentication failed; deliberately undifferentiated
    #[error("authentication failed")]
    Unauthenticated,

    /// Resource absent or not owned by the caller
    #[error("resource not found")]
    NotFound,

    /// Unexpected storage failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CoreError {
    /// Shorthand for a single-field validation failure
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::Validation(vec![FieldError::new(field, message)])
    }
}

/// Core result type alias
pub type CoreResult<T> = Result<T, CoreError>;
