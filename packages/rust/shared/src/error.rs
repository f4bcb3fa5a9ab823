//! Error types for the keyness pipeline.
//!
//! Library crates use [`KeynessError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

use crate::types::DocumentId;

/// Top-level error type for all keyness operations.
#[derive(Debug, thiserror::Error)]
pub enum KeynessError {
    /// The raw markup for a document could not be found.
    #[error("missing input: no raw document for '{doc_id}'")]
    MissingInput { doc_id: DocumentId },

    /// The raw markup for a document exists but could not be read.
    #[error("unreadable input: raw document '{doc_id}' at {path:?}: {source}")]
    UnreadableInput {
        doc_id: DocumentId,
        path: PathBuf,
        source: std::io::Error,
    },

    /// Scoring was requested against a corpus with no terms.
    #[error("corpus frequency table is empty: keyness is undefined without at least one qualifying term")]
    EmptyCorpus,

    /// An artifact could not be written in full.
    #[error("storage write error at {path:?}: {source}")]
    StorageWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A document term is absent from the corpus table it was aggregated into.
    #[error("corpus frequency table does not cover term '{term}' of document '{doc_id}'")]
    Coverage { doc_id: DocumentId, term: String },

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Malformed artifact record encountered on read.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error on the read side.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (invalid document id, bad value, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, KeynessError>;

impl KeynessError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap a failed artifact write with the path that was being written.
    pub fn storage_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::StorageWrite {
            path: path.into(),
            source,
        }
    }

    /// Short, stable name of the error kind, used in run reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingInput { .. } => "missing-input",
            Self::UnreadableInput { .. } => "unreadable-input",
            Self::EmptyCorpus => "empty-corpus",
            Self::StorageWrite { .. } => "storage-write",
            Self::Coverage { .. } => "coverage",
            Self::Config { .. } => "config",
            Self::Parse { .. } => "parse",
            Self::Io { .. } => "io",
            Self::Validation { .. } => "validation",
        }
    }

    /// Whether the error concerns a single document's raw input and the run
    /// may continue without it.
    pub fn is_document_local(&self) -> bool {
        matches!(
            self,
            Self::MissingInput { .. } | Self::UnreadableInput { .. }
        )
    }
}
