//! Registry adapter error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("{0} not found. Please install it and make sure it is on PATH")]
    CommandNotFound(String),

    #[error("Failed to run {program}: {source}")]
    CommandSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} failed: {stderr}")]
    CommandFailed { program: String, stderr: String },

    #[error("Failed to provision {resource}: {message}")]
    Provisioning { resource: String, message: String },

    #[error("Failed to mirror to {target}: {message}")]
    CopyFailed { target: String, message: String },

    #[error("{0} not configured")]
    MissingSetting(String),

    #[error("{0}")]
    Authentication(String),
}

pub type Result<T> = std::result::Result<T, RegistryError>;
