use crate::mcp::errors;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single tool call. Nothing here is fatal to the server.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    MissingInput(String),

    #[error("{0}")]
    UnsupportedFormat(String),

    #[error("reference document not found: {}", .path.display())]
    MissingReferenceDoc { path: PathBuf },

    #[error("invalid defaults file {}: {reason}", .path.display())]
    InvalidDefaultsFile { path: PathBuf, reason: String },

    #[error(
        "filter not found: '{filter}' (searched: {})",
        .searched.iter().map(|path| path.display().to_string()).collect::<Vec<_>>().join(", ")
    )]
    FilterNotFound {
        filter: String,
        searched: Vec<PathBuf>,
    },

    #[error("filter '{filter}' at {} is not executable: {reason}", .path.display())]
    FilterNotExecutable {
        filter: String,
        path: PathBuf,
        reason: String,
    },

    #[error("{message}")]
    ConversionFailed {
        message: String,
        diagnostics: String,
    },

    #[error(
        "pandoc executable not found at {}: please ensure pandoc is installed and available in your PATH",
        .path.display()
    )]
    ConverterNotFound { path: PathBuf },

    #[error("cannot write output {}: {reason}", .path.display())]
    IoFailure { path: PathBuf, reason: String },
}

impl ConversionError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn missing_input(message: impl Into<String>) -> Self {
        Self::MissingInput(message.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ConversionError::InvalidInput(_) => errors::INVALID_INPUT,
            ConversionError::MissingInput(_) => errors::MISSING_INPUT,
            ConversionError::UnsupportedFormat(_) => errors::UNSUPPORTED_FORMAT,
            ConversionError::MissingReferenceDoc { .. } => errors::MISSING_REFERENCE_DOC,
            ConversionError::InvalidDefaultsFile { .. } => errors::INVALID_DEFAULTS_FILE,
            ConversionError::FilterNotFound { .. } => errors::FILTER_NOT_FOUND,
            ConversionError::FilterNotExecutable { .. } => errors::FILTER_NOT_EXECUTABLE,
            ConversionError::ConversionFailed { .. } | ConversionError::ConverterNotFound { .. } => {
                errors::CONVERSION_FAILED
            }
            ConversionError::IoFailure { .. } => errors::IO_FAILURE,
        }
    }

    /// Raw converter output attached to a failed conversion.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            ConversionError::ConversionFailed { diagnostics, .. } => Some(diagnostics),
            _ => None,
        }
    }

    pub fn is_converter_missing(&self) -> bool {
        matches!(self, ConversionError::ConverterNotFound { .. })
    }

    pub fn is_filter_error(&self) -> bool {
        matches!(
            self,
            ConversionError::FilterNotFound { .. } | ConversionError::FilterNotExecutable { .. }
        )
    }
}
