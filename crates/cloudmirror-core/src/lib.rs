//! cloudmirror core
//!
//! Data model and manifest parsing shared by every cloudmirror crate.
//!
//! A manifest is a line-oriented text file. Each line names one or more
//! destination tags and a source image:
//!
//! ```text
//! # full-line comment
//! ECR docker.io/library/nginx:latest
//! GAR,ACR docker.io/library/redis:6
//! -- section separator --
//! ```
//!
//! [`parse_manifest`] turns that text into [`MirrorTask`]s, which the
//! pipeline crate fans out across the configured registry adapters.

pub mod error;
pub mod image;
pub mod manifest;
pub mod model;

pub use error::{CoreError, Result};
pub use image::ImageRef;
pub use manifest::{
    ManifestWarning, ParsedManifest, WarningKind, load_manifest_file, parse_manifest,
};
pub use model::{DestinationKind, FailedImage, MirrorResult, MirrorTask, ValidationResult};
