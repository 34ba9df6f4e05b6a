//! Error types for the migration library.

use thiserror::Error;

/// Main error type for migration operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration error (invalid YAML, missing fields, unreachable sink, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// No configured source identity matches the item's URL or bucket hint.
    #[error("No matching source bucket configuration for {url}")]
    Resolution { url: String },

    /// Object absent at the source.
    #[error("Object not found at source: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    /// Fetch or publish failed for a specific object.
    #[error("Transfer failed for {key}: {message}")]
    Transfer { key: String, message: String },

    /// Manifest read/write failure.
    #[error("Manifest error: {0}")]
    Manifest(String),

    /// Storage backend request failure (source or sink).
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parse/serialize error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MigrateError {
    /// Create a Transfer error.
    pub fn transfer(key: impl Into<String>, message: impl Into<String>) -> Self {
        MigrateError::Transfer {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a Storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        MigrateError::Storage(message.into())
    }

    /// Whether this error aborts the whole run, as opposed to a per-item
    /// failure recorded on the manifest row.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MigrateError::Config(_)
                | MigrateError::Manifest(_)
                | MigrateError::Yaml(_)
                | MigrateError::Csv(_)
        )
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        1
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        // Add error chain for wrapped errors
        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
