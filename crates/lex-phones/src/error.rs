//! Custom error types for the split and normalization pipeline.
//!
//! Every failure the pipeline can surface is a precondition violation or a
//! missing resource; there is no partial success. Errors are serializable so
//! the `--json` CLI mode can emit them as `{code, message}`.

use serde::Serialize;
use serde::ser::SerializeStruct;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the phones pipeline.
#[derive(Error, Debug)]
pub enum PhonesError {
    /// The input table does not have exactly two usable columns.
    #[error("Expected exactly 2 columns (source, target), found {found}: {columns:?}")]
    ColumnShape { found: usize, columns: Vec<String> },

    /// A row is missing its source or target value.
    #[error("Row {row} has an empty '{column}' field")]
    MissingField { row: usize, column: String },

    /// A required resource file (schema, phone set, input) does not exist.
    #[error("Missing resource: {}", .0.display())]
    MissingResource(PathBuf),

    /// A variant is listed under more than one canonical phone.
    #[error("Variant '{variant}' maps to both '{first}' and '{second}'")]
    AmbiguousVariant {
        variant: String,
        first: String,
        second: String,
    },

    /// A canonical phone is also listed as a variant of another canonical phone.
    #[error("Canonical phone '{canonical}' is listed as a variant of '{other}'")]
    ConflictingCanonical { canonical: String, other: String },

    /// Fewer rows are available than the requested sample size.
    #[error("Cannot sample {requested} records from {available}")]
    InsufficientRecords { requested: usize, available: usize },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No directory named after the language was found under the data root.
    #[error("No directory for language '{language}' under {}", .root.display())]
    LanguageDirNotFound { language: String, root: PathBuf },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<PhonesError>,
    },
}

impl PhonesError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PhonesError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code, used by the JSON output.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ColumnShape { .. } => "COLUMN_SHAPE",
            Self::MissingField { .. } => "MISSING_FIELD",
            Self::MissingResource(_) => "MISSING_RESOURCE",
            Self::AmbiguousVariant { .. } => "AMBIGUOUS_VARIANT",
            Self::ConflictingCanonical { .. } => "CONFLICTING_CANONICAL",
            Self::InsufficientRecords { .. } => "INSUFFICIENT_RECORDS",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::LanguageDirNotFound { .. } => "LANGUAGE_DIR_NOT_FOUND",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error was caused by malformed input data rather than
    /// the environment (missing files, IO).
    pub fn is_input_error(&self) -> bool {
        match self {
            Self::ColumnShape { .. }
            | Self::MissingField { .. }
            | Self::InsufficientRecords { .. } => true,
            Self::WithContext { source, .. } => source.is_input_error(),
            _ => false,
        }
    }
}

impl Serialize for PhonesError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("PhonesError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PhonesError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| PhonesError::Polars(e).with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| PhonesError::Io(e).with_context(context))
    }
}
