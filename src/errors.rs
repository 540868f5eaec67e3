//! # Error Handling Module
//!
//! ## Purpose
//! Centralized error handling for the enrichment pipeline, providing structured
//! error types and conversion utilities for all system components.
//!
//! ## Input/Output Specification
//! - **Input**: Error conditions from pipeline components and collaborators
//! - **Output**: Structured error types with context and error chains
//! - **Error Categories**: Identity, Reference, Source, Storage, Configuration
//!
//! ## Key Features
//! - Fatality classification: per-document fatal vs. run fatal vs. recordable
//! - Automatic error conversion and chaining
//! - Category accessor for reporting and run summaries

use thiserror::Error;

/// Result type used throughout the application
pub type Result<T> = std::result::Result<T, EnrichError>;

/// Error types for the enrichment pipeline
#[derive(Debug, Error)]
pub enum EnrichError {
    /// Fingerprinting could not produce a stable identity
    #[error("Cannot derive identity for document '{document}': {reason}")]
    Identity { document: String, reason: String },

    /// Reference table failed to load or parse
    #[error("Reference table '{table}' unavailable: {details}")]
    ReferenceData { table: String, details: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Document source failures
    #[error("Document source '{origin}' failed: {details}")]
    Source { origin: String, details: String },

    /// Enriched record could not be handed off to storage
    #[error("Storage handoff failed for document '{document}': {details}")]
    StorageHandoff { document: String, details: String },

    /// Storage backend errors
    #[error("Storage error: {details}")]
    Storage { details: String },

    /// Serialization/deserialization errors
    #[error("Serialization failed: {message}")]
    SerializationFailed { message: String },

    /// Invalid pattern in a compiled pattern table
    #[error("Invalid pattern '{pattern}': {details}")]
    Pattern { pattern: String, details: String },

    /// Generic I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal invariant violations
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl EnrichError {
    /// Whether this error terminates the current document (the batch continues)
    pub fn is_fatal_for_document(&self) -> bool {
        matches!(
            self,
            EnrichError::Identity { .. } | EnrichError::StorageHandoff { .. }
        )
    }

    /// Whether this error must abort the whole run before any document is processed
    pub fn is_run_fatal(&self) -> bool {
        matches!(
            self,
            EnrichError::ReferenceData { .. } | EnrichError::Config { .. }
        )
    }

    /// Get error category for reporting and run summaries
    pub fn category(&self) -> &'static str {
        match self {
            EnrichError::Identity { .. } => "identity",
            EnrichError::ReferenceData { .. } => "reference",
            EnrichError::Config { .. } => "configuration",
            EnrichError::Source { .. } => "source",
            EnrichError::StorageHandoff { .. } | EnrichError::Storage { .. } => "storage",
            EnrichError::SerializationFailed { .. } => "serialization",
            EnrichError::Pattern { .. } | EnrichError::Internal { .. } => "internal",
            EnrichError::Io(_) => "io",
        }
    }
}

// Conversion from common error types
impl From<serde_json::Error> for EnrichError {
    fn from(err: serde_json::Error) -> Self {
        EnrichError::SerializationFailed {
            message: format!("JSON serialization error: {}", err),
        }
    }
}

impl From<sled::Error> for EnrichError {
    fn from(err: sled::Error) -> Self {
        EnrichError::Storage {
            details: err.to_string(),
        }
    }
}

impl From<bincode::Error> for EnrichError {
    fn from(err: bincode::Error) -> Self {
        EnrichError::SerializationFailed {
            message: format!("Binary serialization error: {}", err),
        }
    }
}

impl From<toml::de::Error> for EnrichError {
    fn from(err: toml::de::Error) -> Self {
        EnrichError::Config {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatality_classification() {
        let identity = EnrichError::Identity {
            document: "doc-1".to_string(),
            reason: "no identifying fields".to_string(),
        };
        assert!(identity.is_fatal_for_document());
        assert!(!identity.is_run_fatal());

        let reference = EnrichError::ReferenceData {
            table: "courts".to_string(),
            details: "file missing".to_string(),
        };
        assert!(reference.is_run_fatal());
        assert!(!reference.is_fatal_for_document());
    }

    #[test]
    fn categories() {
        let err = EnrichError::StorageHandoff {
            document: "doc-1".to_string(),
            details: "disk full".to_string(),
        };
        assert_eq!(err.category(), "storage");
    }
}
