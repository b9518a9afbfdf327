//! Error types for the EKS tag reconciler.
//!
//! Every failure carries enough context to tell which operation failed and
//! on which resource: configuration, AWS API calls, and reconciliation.

use std::path::PathBuf;
use thiserror::Error;

use crate::tags::ResourceKind;

/// The main error type for the tag reconciler.
#[derive(Debug, Error)]
pub enum TagSyncError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// AWS API errors.
    #[error("AWS API error: {0}")]
    Aws(#[from] AwsError),

    /// Reconciliation errors.
    #[error("Reconciliation error: {0}")]
    Reconcile(#[from] ReconcileError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("Configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The configuration file could not be parsed.
    #[error("Failed to parse configuration: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Validation failed.
    #[error("Configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },
}

/// Errors returned by the AWS collaborator clients.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AwsError {
    /// An API request failed.
    #[error("{operation} failed for {resource}: {message}")]
    RequestFailed {
        /// API operation name (e.g. `CreateTags`).
        operation: String,
        /// Resource the request targeted.
        resource: String,
        /// Error message returned by the SDK.
        message: String,
    },

    /// A response was missing a field the reconciler depends on.
    #[error("{operation} response is missing field '{field}'")]
    MissingField {
        /// API operation name.
        operation: String,
        /// Name of the missing field.
        field: String,
    },
}

/// Reconciliation errors.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Reconciliation failed for a specific resource.
    #[error("Failed to reconcile tags on {kind} '{id}': {source}")]
    ResourceFailed {
        /// Kind of resource.
        kind: ResourceKind,
        /// Identifier of the resource.
        id: String,
        /// Underlying API failure.
        #[source]
        source: AwsError,
    },

    /// A resource the reconciler was asked to process does not exist.
    #[error("{kind} '{id}' not found")]
    NotFound {
        /// Kind of resource.
        kind: ResourceKind,
        /// Identifier of the resource.
        id: String,
    },
}

/// Result type alias for tag reconciler operations.
pub type Result<T> = std::result::Result<T, TagSyncError>;

impl ConfigError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }
}

impl AwsError {
    /// Creates a request failure for `operation` on `resource`.
    #[must_use]
    pub fn request(
        operation: impl Into<String>,
        resource: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::RequestFailed {
            operation: operation.into(),
            resource: resource.into(),
            message: message.into(),
        }
    }

    /// Creates a missing-field error.
    #[must_use]
    pub fn missing(operation: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingField {
            operation: operation.into(),
            field: field.into(),
        }
    }
}

impl ReconcileError {
    /// Wraps an AWS failure with the resource it happened on.
    #[must_use]
    pub fn resource(kind: ResourceKind, id: impl Into<String>, source: AwsError) -> Self {
        Self::ResourceFailed {
            kind,
            id: id.into(),
            source,
        }
    }
}
