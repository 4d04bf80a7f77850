//! Pipeline error types

use cloudmirror_core::CoreError;
use thiserror::Error;

/// Errors that stop a run before any image is mirrored
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error(transparent)]
    Manifest(#[from] CoreError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
