use std::path::PathBuf;

use thiserror::Error;

/// Run-level error type.
/// Only conditions that make an evaluation impossible surface here; degraded extraction, an
/// unreachable model and unparseable model output are absorbed into the `EvaluationResult`.
#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("Document not found: {}", .0.display())]
    DocumentNotFound(PathBuf),
}

impl EvaluationError {
    /// Stable machine-readable code, used in the structured log line emitted on failure.
    pub fn code(&self) -> &'static str {
        match self {
            EvaluationError::DocumentNotFound(_) => "DOCUMENT_NOT_FOUND",
        }
    }
}
