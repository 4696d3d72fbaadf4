//! Error types for the evalboard core library.
//!
//! Uses `thiserror` for public API error types with structured variants
//! covering metadata, artifacts, slicing, session selection, explainability,
//! and configuration.

use std::path::PathBuf;

/// Top-level error type for the evalboard core library.
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("Slice error: {0}")]
    Slice(#[from] SliceError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Explainability error: {0}")]
    Explain(#[from] ExplainError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from reading `metadata.json`.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("Metadata file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Failed to read metadata {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed metadata {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors from decoding logged artifact files.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Embedding in {path} is {dims}-dimensional, expected 2 or 3")]
    EmbeddingDimension { path: PathBuf, dims: usize },

    #[error("Column '{column}' in {path} has {found} values, expected {expected}")]
    ColumnLength {
        path: PathBuf,
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("Missing column '{column}' in {path}")]
    MissingColumn { path: PathBuf, column: String },

    #[error("No plottable {prefix} column in {path}")]
    MissingAxis { path: PathBuf, prefix: String },
}

/// Errors from the slice engine.
#[derive(Debug, thiserror::Error)]
pub enum SliceError {
    #[error("View index {index} out of range for '{dimension}' ({len} values)")]
    ViewOutOfRange {
        dimension: String,
        index: usize,
        len: usize,
    },

    #[error("Column '{column}' is not present in the table")]
    MissingColumn { column: String },
}

/// Errors from configuring session selections.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Unknown {kind} dimension: {name}")]
    UnknownDimension { kind: String, name: String },

    #[error("Value '{value}' is not allowed for dimension '{name}'")]
    UnknownValue { name: String, value: String },

    #[error("Dimension '{name}' is the comparison axis and cannot be pinned")]
    AxisPinned { name: String },
}

/// Errors from the explainability adapter.
#[derive(Debug, thiserror::Error)]
pub enum ExplainError {
    #[error("Metadata does not configure '{field}'")]
    NotConfigured { field: String },

    #[error("Attribution model {path} is invalid: {message}")]
    InvalidModel { path: PathBuf, message: String },

    #[error("Feature '{feature}' is missing from the data file")]
    MissingFeature { feature: String },

    #[error("Non-numeric value '{value}' in feature '{feature}'")]
    NonNumeric { feature: String, value: String },

    #[error("Attribution matrix has {found} rows, data has {expected}")]
    RowMismatch { expected: usize, found: usize },
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Configuration parse error: {message}")]
    ParseError { message: String },
}

/// A type alias for results using the top-level `BoardError`.
pub type Result<T> = std::result::Result<T, BoardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_slice() {
        let err = BoardError::Slice(SliceError::ViewOutOfRange {
            dimension: "model_type".into(),
            index: 3,
            len: 2,
        });
        assert_eq!(
            err.to_string(),
            "Slice error: View index 3 out of range for 'model_type' (2 values)"
        );
    }

    #[test]
    fn test_error_display_metadata() {
        let err = BoardError::Metadata(MetadataError::NotFound {
            path: PathBuf::from("/logs/metadata.json"),
        });
        assert_eq!(
            err.to_string(),
            "Metadata error: Metadata file not found: /logs/metadata.json"
        );
    }

    #[test]
    fn test_error_display_session() {
        let err = BoardError::Session(SessionError::UnknownValue {
            name: "region".into(),
            value: "mars".into(),
        });
        assert_eq!(
            err.to_string(),
            "Session error: Value 'mars' is not allowed for dimension 'region'"
        );
    }

    #[test]
    fn test_error_display_embedding_dimension() {
        let err = ArtifactError::EmbeddingDimension {
            path: PathBuf::from("0_a_b.json"),
            dims: 4,
        };
        assert_eq!(
            err.to_string(),
            "Embedding in 0_a_b.json is 4-dimensional, expected 2 or 3"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: BoardError = io_err.into();
        assert!(matches!(err, BoardError::Io(_)));
    }
}
