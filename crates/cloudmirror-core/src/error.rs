//! Core error types

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Image list file not found: {0}")]
    ManifestNotFound(PathBuf),

    #[error("Failed to read image list {path}: {source}")]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unknown destination tag: {0}")]
    UnknownDestination(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
