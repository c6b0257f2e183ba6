//! # Error Types
//!
//! Structured error types for quiver_core. These errors carry enough
//! context for a caller to report the problem per field or to map it onto
//! a request-level status.
//!
//! The weight calculator itself only ever produces
//! [`BuildError::InvalidComponentWeight`], and only in strict mode. Every
//! other variant belongs to validation, storage, or catalog lookups.
//!
//! ## Example
//!
//! ```rust
//! use quiver_core::errors::{BuildError, BuildResult};
//!
//! fn validate_gpi(gpi: f64) -> BuildResult<()> {
//!     if !gpi.is_finite() || gpi < 0.0 {
//!         return Err(BuildError::InvalidInput {
//!             field: "gpi".to_string(),
//!             value: gpi.to_string(),
//!             reason: "GPI must be a non-negative number".to_string(),
//!         });
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for quiver_core operations
pub type BuildResult<T> = Result<T, BuildError>;

/// Structured error type for build operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum BuildError {
    /// A component's grain weight is not a non-negative number (strict totals only)
    #[error("Invalid grain value for component: {name}")]
    InvalidComponentWeight { name: String },

    /// An input value is invalid (out of range, wrong type, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A required field is missing
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// Component name is not one of knock, fletching, shaft, insert, tip
    #[error("Unknown component: {name}")]
    UnknownComponent { name: String },

    /// The same component name appears more than once in a build
    #[error("Duplicate component: {name}")]
    DuplicateComponent { name: String },

    /// No build with this id is visible to the caller
    #[error("Build not found: {id}")]
    BuildNotFound { id: String },

    /// Preset key not found in the preset catalog
    #[error("Preset not found: {key}")]
    PresetNotFound { key: String },

    /// Too many builds selected for a comparison
    #[error("Too many builds: {count} selected, at most {max} allowed")]
    TooManyBuilds { count: usize, max: usize },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// File is locked by another user/process
    #[error("File locked: '{path}' is locked by {locked_by} since {locked_at}")]
    FileLocked {
        path: String,
        locked_by: String,
        locked_at: String,
    },

    /// JSON/TOML serialization or deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },
}

impl BuildError {
    /// Create an InvalidComponentWeight error
    pub fn invalid_component_weight(name: impl Into<String>) -> Self {
        BuildError::InvalidComponentWeight { name: name.into() }
    }

    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        BuildError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(field: impl Into<String>) -> Self {
        BuildError::MissingField {
            field: field.into(),
        }
    }

    /// Create a BuildNotFound error
    pub fn build_not_found(id: impl ToString) -> Self {
        BuildError::BuildNotFound { id: id.to_string() }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        BuildError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileLocked error
    pub fn file_locked(path: impl Into<String>, locked_by: impl Into<String>, locked_at: impl Into<String>) -> Self {
        BuildError::FileLocked {
            path: path.into(),
            locked_by: locked_by.into(),
            locked_at: locked_at.into(),
        }
    }

    /// Create a SerializationError from any displayable cause
    pub fn serialization(reason: impl ToString) -> Self {
        BuildError::SerializationError {
            reason: reason.to_string(),
        }
    }

    /// Check if this is a recoverable error (e.g., can retry)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, BuildError::FileLocked { .. })
    }

    /// True for errors caused by the caller's payload.
    ///
    /// A request layer maps these to "bad request"; everything else is a
    /// lookup miss or a server-side failure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            BuildError::InvalidComponentWeight { .. }
                | BuildError::InvalidInput { .. }
                | BuildError::MissingField { .. }
                | BuildError::UnknownComponent { .. }
                | BuildError::DuplicateComponent { .. }
                | BuildError::TooManyBuilds { .. }
        )
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            BuildError::InvalidComponentWeight { .. } => "INVALID_COMPONENT_WEIGHT",
            BuildError::InvalidInput { .. } => "INVALID_INPUT",
            BuildError::MissingField { .. } => "MISSING_FIELD",
            BuildError::UnknownComponent { .. } => "UNKNOWN_COMPONENT",
            BuildError::DuplicateComponent { .. } => "DUPLICATE_COMPONENT",
            BuildError::BuildNotFound { .. } => "BUILD_NOT_FOUND",
            BuildError::PresetNotFound { .. } => "PRESET_NOT_FOUND",
            BuildError::TooManyBuilds { .. } => "TOO_MANY_BUILDS",
            BuildError::FileError { .. } => "FILE_ERROR",
            BuildError::FileLocked { .. } => "FILE_LOCKED",
            BuildError::SerializationError { .. } => "SERIALIZATION_ERROR",
            BuildError::VersionMismatch { .. } => "VERSION_MISMATCH",
        }
    }
}
