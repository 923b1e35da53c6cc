use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum WaterlineError {
    #[error("unsupported document format: {path} (expected .pdf or .docx)")]
    UnsupportedFormat { path: PathBuf },

    #[error("unreadable document {path}: {reason}")]
    UnreadableDocument { path: PathBuf, reason: String },

    #[error("pdftotext not found. Install poppler: apt install poppler-utils (Linux) or brew install poppler (macOS)")]
    PdftotextNotFound,

    #[error("failed to load vocabulary from {path}: {reason}")]
    VocabularyLoad { path: PathBuf, reason: String },

    #[error("invalid vocabulary: {0}")]
    VocabularyInvalid(String),

    #[error("unknown failure kind '{0}' (expected unknown_parameter, incompatible_unit, invalid_value or conflicting_measurement)")]
    UnknownFailureKind(String),

    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WaterlineError {
    /// True for errors that condemn a single document but not the run.
    pub fn is_document_scoped(&self) -> bool {
        matches!(
            self,
            WaterlineError::UnsupportedFormat { .. } | WaterlineError::UnreadableDocument { .. }
        )
    }

    /// Machine-readable tag for per-document failures in the run summary.
    pub fn document_failure_kind(&self) -> Option<&'static str> {
        match self {
            WaterlineError::UnsupportedFormat { .. } => Some("unsupported_format"),
            WaterlineError::UnreadableDocument { .. } => Some("unreadable_document"),
            _ => None,
        }
    }
}
