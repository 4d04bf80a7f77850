//! DigitalOcean Container Registry

use crate::adapter::{RegistryAdapter, report_target};
use crate::command::CommandRunner;
use crate::crane::Crane;
use crate::error::{RegistryError, Result};
use async_trait::async_trait;
use cloudmirror_config::DocrSettings;
use cloudmirror_core::{DestinationKind, ImageRef, ValidationResult};
use std::sync::Arc;

pub const DOCR_HOST: &str = "registry.digitalocean.com";

pub struct DocrAdapter {
    settings: DocrSettings,
    platform: String,
    crane: Crane,
}

impl DocrAdapter {
    pub fn new(
        settings: DocrSettings,
        platform: impl Into<String>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            settings,
            platform: platform.into(),
            crane: Crane::new(runner),
        }
    }

    pub fn target_reference(registry_name: &str, image: &ImageRef) -> String {
        format!("{}/{}/{}", DOCR_HOST, registry_name, image.path())
    }

    fn registry_name(&self) -> Result<&str> {
        self.settings
            .registry_name
            .as_deref()
            .ok_or_else(|| RegistryError::MissingSetting("DOCR_REGISTRY_NAME".to_string()))
    }

    async fn push_target(&self, source: &str, image: &ImageRef) -> Result<String> {
        let target = Self::target_reference(self.registry_name()?, image);

        tracing::debug!("Mirroring {} to DOCR: {}", source, target);
        self.crane.copy(source, &target, &self.platform).await?;

        Ok(target)
    }
}

#[async_trait]
impl RegistryAdapter for DocrAdapter {
    fn kind(&self) -> DestinationKind {
        DestinationKind::Docr
    }

    async fn push(&self, source: &str) -> bool {
        let image = ImageRef::parse(source);
        let result = self.push_target(source, &image).await;
        report_target(self.kind(), DOCR_HOST, result)
    }

    async fn validate_access(&self) -> ValidationResult {
        if self.settings.token.trim().is_empty() {
            return ValidationResult::failed("DOCR_TOKEN not configured");
        }
        match self.registry_name() {
            Ok(_) => ValidationResult::ok(),
            Err(e) => ValidationResult::failed(e.to_string()),
        }
    }
}
