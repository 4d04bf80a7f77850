//! JFrog Artifactory

use crate::adapter::{RegistryAdapter, report_target};
use crate::command::CommandRunner;
use crate::crane::Crane;
use crate::error::Result;
use async_trait::async_trait;
use cloudmirror_config::JfrogSettings;
use cloudmirror_core::{DestinationKind, ImageRef, ValidationResult};
use std::sync::Arc;

/// Artifactory has no regions; the instance URL is the only target
pub struct JfrogAdapter {
    settings: JfrogSettings,
    platform: String,
    crane: Crane,
}

impl JfrogAdapter {
    pub fn new(
        settings: JfrogSettings,
        platform: impl Into<String>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            settings,
            platform: platform.into(),
            crane: Crane::new(runner),
        }
    }

    pub fn target_reference(settings: &JfrogSettings, image: &ImageRef) -> String {
        format!(
            "{}/artifactory/{}/{}",
            settings.host_path(),
            settings.repository,
            image.path()
        )
    }

    async fn push_target(&self, source: &str, image: &ImageRef) -> Result<String> {
        let target = Self::target_reference(&self.settings, image);

        tracing::debug!("Mirroring {} to JFrog: {}", source, target);
        self.crane.copy(source, &target, &self.platform).await?;

        Ok(target)
    }
}

#[async_trait]
impl RegistryAdapter for JfrogAdapter {
    fn kind(&self) -> DestinationKind {
        DestinationKind::Jfrog
    }

    async fn push(&self, source: &str) -> bool {
        let image = ImageRef::parse(source);
        let result = self.push_target(source, &image).await;
        report_target(self.kind(), self.settings.host(), result)
    }

    async fn validate_access(&self) -> ValidationResult {
        let mut missing = Vec::new();
        if self.settings.url.trim().is_empty() {
            missing.push("JFROG_URL");
        }
        if self.settings.user.is_none() {
            missing.push("JFROG_USER");
        }
        if self.settings.token.is_none() {
            missing.push("JFROG_TOKEN");
        }

        if missing.is_empty() {
            ValidationResult::ok()
        } else {
            ValidationResult::failed(format!(
                "Missing JFrog configuration: {}",
                missing.join(", ")
            ))
        }
    }
}
