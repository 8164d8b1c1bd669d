//! Domain-specific errors.

use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by the selection-and-naming pipeline.
///
/// Only [`PipelineError::EmitFailure`] and [`PipelineError::RootNotFound`] are
/// fatal to a run; the rest are recorded against a file or scenario and
/// skipped.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("no feature declared")]
    NoDocument,
    #[error("failed to parse {path}: {reason}")]
    ParseFailure { path: PathBuf, reason: String },
    #[error("failed to read {path}: {reason}")]
    ReadFailure { path: PathBuf, reason: String },
    #[error("{folder} is not beneath {root}")]
    InvalidPath { root: PathBuf, folder: PathBuf },
    #[error("failed to write playlist to {path}: {reason}")]
    EmitFailure { path: PathBuf, reason: String },
    #[error("feature folder {path} does not exist or is not a directory")]
    RootNotFound { path: PathBuf },
}

impl PipelineError {
    /// Whether the error must abort the run rather than skip one input.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PipelineError::EmitFailure { .. } | PipelineError::RootNotFound { .. }
        )
    }
}
