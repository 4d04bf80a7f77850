//! Data model for mirror runs

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of destination registry a manifest line can name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DestinationKind {
    /// AWS Elastic Container Registry
    Ecr,
    /// Google Artifact Registry
    Gar,
    /// Azure Container Registry
    Acr,
    /// JFrog Artifactory
    Jfrog,
    /// DigitalOcean Container Registry
    Docr,
}

impl DestinationKind {
    pub const ALL: [DestinationKind; 5] = [
        DestinationKind::Ecr,
        DestinationKind::Gar,
        DestinationKind::Acr,
        DestinationKind::Jfrog,
        DestinationKind::Docr,
    ];

    /// Manifest tag for this destination (case-sensitive)
    pub fn tag(&self) -> &'static str {
        match self {
            DestinationKind::Ecr => "ECR",
            DestinationKind::Gar => "GAR",
            DestinationKind::Acr => "ACR",
            DestinationKind::Jfrog => "JFROG",
            DestinationKind::Docr => "DOCR",
        }
    }

    /// Returns true if `tag` exactly matches one of the known destination tags
    pub fn is_known_tag(tag: &str) -> bool {
        tag.parse::<DestinationKind>().is_ok()
    }
}

impl fmt::Display for DestinationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for DestinationKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ECR" => Ok(DestinationKind::Ecr),
            "GAR" => Ok(DestinationKind::Gar),
            "ACR" => Ok(DestinationKind::Acr),
            "JFROG" => Ok(DestinationKind::Jfrog),
            "DOCR" => Ok(DestinationKind::Docr),
            other => Err(CoreError::UnknownDestination(other.to_string())),
        }
    }
}

/// One accepted manifest line
///
/// `destinations` keeps every tag from the line in manifest order, including
/// tags that are not themselves known. Those are rejected per destination when
/// the task is dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorTask {
    pub destinations: Vec<String>,
    pub source: String,
    pub line_number: usize,
}

impl MirrorTask {
    pub fn new(destinations: Vec<String>, source: impl Into<String>, line_number: usize) -> Self {
        Self {
            destinations,
            source: source.into(),
            line_number,
        }
    }
}

/// Outcome of a pre-flight check (authentication or registry access)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub success: bool,
    pub message: Option<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }

    /// Message for display, empty when none was recorded
    pub fn message_or_default(&self) -> &str {
        self.message.as_deref().unwrap_or("")
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::ok()
    }
}

/// Detail record for an image that could not be mirrored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedImage {
    pub source: String,
    pub line_number: usize,
    pub reason: String,
}

/// Aggregate outcome of a mirror run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorResult {
    pub total_images: usize,
    pub successful_images: usize,
    pub failed_images: usize,

    /// Failures ordered by manifest line
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_image_details: Vec<FailedImage>,
}

impl MirrorResult {
    pub fn is_success(&self) -> bool {
        self.failed_images == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_tags_round_trip() {
        for kind in DestinationKind::ALL {
            assert_eq!(kind.tag().parse::<DestinationKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_destination_tags_are_case_sensitive() {
        assert!(!DestinationKind::is_known_tag("ecr"));
        assert!(!DestinationKind::is_known_tag("Jfrog"));
        assert!(DestinationKind::is_known_tag("JFROG"));
    }

    #[test]
    fn test_unknown_destination_error() {
        let err = "QUAY".parse::<DestinationKind>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown destination tag: QUAY");
    }

    #[test]
    fn test_validation_result_constructors() {
        assert!(ValidationResult::ok().success);
        let failed = ValidationResult::failed("DOCR_TOKEN not configured");
        assert!(!failed.success);
        assert_eq!(failed.message_or_default(), "DOCR_TOKEN not configured");
    }

    #[test]
    fn test_mirror_result_serializes_without_empty_details() {
        let result = MirrorResult {
            total_images: 2,
            successful_images: 2,
            failed_images: 0,
            failed_image_details: Vec::new(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("failed_image_details").is_none());
        assert!(result.is_success());
    }
}
