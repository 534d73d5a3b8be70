//! Error types for nixid.
//!
//! All errors are strongly typed using thiserror. Validation failures,
//! required-field violations, type mismatches and timestamp format failures
//! are distinct variants so callers can match on the exact condition.
//! Storage errors are carried through unchanged.

use thiserror::Error;

use crate::storage::StorageError;

/// Validation errors raised while checking persisted or caller-supplied
/// attribute values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Required attribute '{field}' is missing")]
    MissingAttribute {
        field: String,
    },

    #[error("Attribute '{field}' has type {found}, expected {expected}")]
    WrongAttributeType {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Invalid entity id '{value}': {reason}")]
    InvalidEntityId {
        value: String,
        reason: String,
    },

    #[error("Field '{field}' cannot be empty")]
    EmptyField {
        field: String,
    },

    #[error("Invalid name '{name}': {reason}")]
    InvalidName {
        name: String,
        reason: String,
    },

    #[error("Field '{field}' exceeds maximum length of {max_length}")]
    FieldTooLong {
        field: String,
        max_length: usize,
    },

    #[error("Timestamp {seconds} is outside the representable range")]
    TimestampOutOfRange {
        seconds: i64,
    },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        reason: String,
    },
}

impl ValidationError {
    /// Returns the attribute or field this error refers to, if any.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MissingAttribute { field }
            | Self::WrongAttributeType { field, .. }
            | Self::EmptyField { field }
            | Self::FieldTooLong { field, .. } => Some(field),
            Self::InvalidEntityId { .. } => Some(crate::entity::ATTR_ENTITY_ID),
            Self::InvalidName { .. } => Some(crate::entity::ATTR_NAME),
            Self::TimestampOutOfRange { .. } | Self::InvalidConfig { .. } => None,
        }
    }
}

/// Top-level error type for nixid.
#[derive(Debug, Error)]
pub enum NixError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// An attempt to clear a field that must always be present.
    #[error("Required field '{field}' cannot be cleared")]
    RequiredField {
        field: String,
    },

    /// A value of the wrong dynamic type was passed to a stamping call or
    /// found where a specific type is required.
    #[error("Type mismatch for '{field}': expected {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A stored timestamp string could not be parsed back.
    #[error("Malformed timestamp in '{field}' ({value:?}): {reason}")]
    Format {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl NixError {
    /// Creates a required-field error.
    #[must_use]
    pub fn required_field(field: impl Into<String>) -> Self {
        Self::RequiredField {
            field: field.into(),
        }
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a required-field error.
    #[must_use]
    pub const fn is_required_field(&self) -> bool {
        matches!(self, Self::RequiredField { .. })
    }

    /// Returns true if this is a type mismatch.
    #[must_use]
    pub const fn is_type_mismatch(&self) -> bool {
        matches!(self, Self::TypeMismatch { .. })
    }

    /// Returns true if this is a timestamp format error.
    #[must_use]
    pub const fn is_format(&self) -> bool {
        matches!(self, Self::Format { .. })
    }

    /// Returns true if this error came from the backing store.
    #[must_use]
    pub const fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Returns true if the backing store refused a name that is already taken.
    #[must_use]
    pub const fn is_duplicate_name(&self) -> bool {
        matches!(self, Self::Storage(StorageError::DuplicateName { .. }))
    }
}

/// Result type alias for nixid operations.
pub type NixResult<T> = Result<T, NixError>;
