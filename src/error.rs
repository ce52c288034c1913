//! Error types for the storage policy layer
//!
//! Separates caller mistakes (validation, existence) from store failures so
//! callers can tell terminal errors from ones worth retrying.

use std::time::Duration;
use thiserror::Error;

/// Unified error type for the policy layer
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // =========================================================================
    // Policy Errors
    // =========================================================================
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Native field {field} has unmapped value '{value}'")]
    UnmappedNativeField { field: String, value: String },

    // =========================================================================
    // Resource Store Errors
    // =========================================================================
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("Resource store error: {0}")]
    Store(String),

    #[error("Resource not found: {kind}/{name}")]
    ResourceNotFound { kind: String, name: String },

    #[error("Resource already exists: {kind}/{name}")]
    ResourceExists { kind: String, name: String },

    #[error("Conflicting write to {kind}/{name}")]
    Conflict { kind: String, name: String },

    // =========================================================================
    // Parse Errors
    // =========================================================================
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Action a caller should take after an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorAction {
    /// Requeue with exponential backoff
    RequeueWithBackoff,
    /// Requeue after specific duration
    RequeueAfter(Duration),
    /// Don't requeue, wait for changes
    NoRequeue,
}

impl Error {
    /// Build a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// Build a not-found error
    pub fn not_found(kind: &str, name: &str) -> Self {
        Error::ResourceNotFound {
            kind: kind.to_string(),
            name: name.to_string(),
        }
    }

    /// Build an already-exists error
    pub fn exists(kind: &str, name: &str) -> Self {
        Error::ResourceExists {
            kind: kind.to_string(),
            name: name.to_string(),
        }
    }

    /// Build a conflict error
    pub fn conflict(kind: &str, name: &str) -> Self {
        Error::Conflict {
            kind: kind.to_string(),
            name: name.to_string(),
        }
    }

    /// Determine what action to take for this error
    pub fn action(&self) -> ErrorAction {
        match self {
            // Lost an optimistic-concurrency race
            Error::Conflict { .. } => ErrorAction::RequeueWithBackoff,

            // Caller must change the request, or the native object holds a
            // value outside the policy tables
            Error::Validation(_)
            | Error::UnmappedNativeField { .. }
            | Error::Configuration(_)
            | Error::ResourceExists { .. }
            | Error::ResourceNotFound { .. } => ErrorAction::NoRequeue,

            // Store and transport failures
            _ => ErrorAction::RequeueWithBackoff,
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        !matches!(self.action(), ErrorAction::NoRequeue)
    }

    /// Check if this error signals a lost optimistic-concurrency race
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict { .. })
    }

    /// Check if this error means the resource is absent
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::ResourceNotFound { .. })
    }
}

/// Result type alias for the policy layer
pub type Result<T> = std::result::Result<T, Error>;
