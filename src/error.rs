use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::model::BackendKind;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid page spec: {0}")]
    InvalidPageSpec(String),

    #[error("{backend} back-end is unavailable: {reason}")]
    BackendUnavailable {
        backend: BackendKind,
        reason: String,
    },

    #[error("{backend} back-end failed: {message}")]
    BackendExtraction {
        backend: BackendKind,
        message: String,
    },

    #[error("malformed table from {backend} back-end on page {page}: {reason}")]
    MalformedRawTable {
        backend: BackendKind,
        page: u32,
        reason: String,
    },

    #[error("document not found: {}", .0.display())]
    DocumentNotFound(PathBuf),

    #[error("invalid option: {0}")]
    InvalidOption(String),
}

impl ExtractError {
    pub(crate) fn extraction(backend: BackendKind, message: impl Into<String>) -> Self {
        Self::BackendExtraction {
            backend,
            message: message.into(),
        }
    }

    /// Whether `auto` mode may move on to the next back-end after this error.
    #[must_use]
    pub fn is_fallback_eligible(&self) -> bool {
        matches!(
            self,
            Self::BackendUnavailable { .. } | Self::BackendExtraction { .. }
        )
    }
}
