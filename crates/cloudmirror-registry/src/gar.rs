//! Google Artifact Registry

use crate::adapter::{RegistryAdapter, report_target};
use crate::command::{CommandRunner, Invocation};
use crate::crane::Crane;
use crate::error::{RegistryError, Result};
use async_trait::async_trait;
use cloudmirror_config::GarSettings;
use cloudmirror_core::{DestinationKind, ImageRef, ValidationResult};
use std::sync::Arc;

/// Docker host of a regional Artifact Registry
pub fn gar_host(region: &str) -> String {
    format!("{}-docker.pkg.dev", region)
}

pub struct GarAdapter {
    settings: GarSettings,
    platform: String,
    runner: Arc<dyn CommandRunner>,
    crane: Crane,
}

impl GarAdapter {
    pub fn new(
        settings: GarSettings,
        platform: impl Into<String>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            settings,
            platform: platform.into(),
            crane: Crane::new(runner.clone()),
            runner,
        }
    }

    pub fn target_reference(
        project_id: &str,
        region: &str,
        repository: &str,
        image: &ImageRef,
    ) -> String {
        format!(
            "{}/{}/{}/{}",
            gar_host(region),
            project_id,
            repository,
            image.path()
        )
    }

    fn project_id(&self) -> Result<&str> {
        self.settings
            .project_id
            .as_deref()
            .ok_or_else(|| RegistryError::MissingSetting("GCP_PROJECT_ID".to_string()))
    }

    async fn ensure_repository(&self, project_id: &str, region: &str) -> Result<()> {
        let repository = self.settings.repository.as_str();
        let location = format!("--location={}", region);
        let project = format!("--project={}", project_id);

        let describe = Invocation::new("gcloud").args([
            "artifacts",
            "repositories",
            "describe",
            repository,
            location.as_str(),
            project.as_str(),
        ]);
        if self.runner.succeeds(&describe).await {
            return Ok(());
        }

        tracing::debug!("Creating GAR repository: {} in {}", repository, region);
        let create = Invocation::new("gcloud").args([
            "artifacts",
            "repositories",
            "create",
            repository,
            "--repository-format=docker",
            location.as_str(),
            project.as_str(),
        ]);
        self.runner
            .run_checked(&create)
            .await
            .map(|_| ())
            .map_err(|e| RegistryError::Provisioning {
                resource: format!("GAR repository {} in {}", repository, region),
                message: e.to_string(),
            })
    }

    async fn push_region(&self, source: &str, image: &ImageRef, region: &str) -> Result<String> {
        let project_id = self.project_id()?;
        let target =
            Self::target_reference(project_id, region, &self.settings.repository, image);

        tracing::debug!("Mirroring {} to GAR: {}", source, target);

        self.ensure_repository(project_id, region).await?;
        self.crane.copy(source, &target, &self.platform).await?;

        Ok(target)
    }
}

#[async_trait]
impl RegistryAdapter for GarAdapter {
    fn kind(&self) -> DestinationKind {
        DestinationKind::Gar
    }

    async fn push(&self, source: &str) -> bool {
        let image = ImageRef::parse(source);
        let mut all_ok = true;

        for region in &self.settings.regions {
            let result = self.push_region(source, &image, region).await;
            all_ok &= report_target(self.kind(), region, result);
        }

        all_ok
    }

    async fn validate_access(&self) -> ValidationResult {
        let project_id = match self.project_id() {
            Ok(id) => id,
            Err(e) => return ValidationResult::failed(e.to_string()),
        };

        let project = format!("--project={}", project_id);
        for region in &self.settings.regions {
            let inv = Invocation::new("gcloud").args([
                "artifacts",
                "locations",
                "describe",
                region.as_str(),
                project.as_str(),
            ]);

            if let Err(e) = self.runner.run_checked(&inv).await {
                return ValidationResult::failed(format!(
                    "GAR access failed in {}: {}",
                    region, e
                ));
            }
        }

        ValidationResult::ok()
    }
}
