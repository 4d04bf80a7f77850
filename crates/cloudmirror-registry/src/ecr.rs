//! AWS Elastic Container Registry

use crate::adapter::{RegistryAdapter, report_target};
use crate::command::{CommandRunner, Invocation};
use crate::crane::Crane;
use crate::error::{RegistryError, Result};
use async_trait::async_trait;
use cloudmirror_config::EcrSettings;
use cloudmirror_core::{DestinationKind, ImageRef, ValidationResult};
use std::sync::Arc;

/// ECR registry host for an account and region
pub fn ecr_host(account_id: &str, region: &str) -> String {
    format!("{}.dkr.ecr.{}.amazonaws.com", account_id, region)
}

/// Mirrors images into one ECR repository per region
pub struct EcrAdapter {
    settings: EcrSettings,
    platform: String,
    runner: Arc<dyn CommandRunner>,
    crane: Crane,
}

impl EcrAdapter {
    pub fn new(
        settings: EcrSettings,
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

    /// Target reference for `image` in `region`
    pub fn target_reference(account_id: &str, region: &str, image: &ImageRef) -> String {
        format!("{}/{}", ecr_host(account_id, region), image.path())
    }

    /// Configured account ID, or the caller identity's account
    async fn account_id(&self) -> Result<String> {
        if let Some(account_id) = &self.settings.account_id {
            return Ok(account_id.clone());
        }

        caller_account_id(self.runner.as_ref()).await
    }

    async fn ensure_repository(&self, repository: &str, region: &str) -> Result<()> {
        let describe = Invocation::new("aws").args([
            "ecr",
            "describe-repositories",
            "--repository-names",
            repository,
            "--region",
            region,
        ]);
        if self.runner.succeeds(&describe).await {
            return Ok(());
        }

        tracing::debug!("Creating ECR repository: {} in {}", repository, region);
        let create = Invocation::new("aws").args([
            "ecr",
            "create-repository",
            "--repository-name",
            repository,
            "--image-scanning-configuration",
            "scanOnPush=true",
            "--region",
            region,
        ]);
        self.runner
            .run_checked(&create)
            .await
            .map(|_| ())
            .map_err(|e| RegistryError::Provisioning {
                resource: format!("ECR repository {} in {}", repository, region),
                message: e.to_string(),
            })
    }

    async fn push_region(&self, source: &str, image: &ImageRef, region: &str) -> Result<String> {
        let account_id = self.account_id().await?;
        let target = Self::target_reference(&account_id, region, image);

        tracing::debug!("Mirroring {} to ECR: {}", source, target);

        self.ensure_repository(&image.repository, region).await?;
        self.crane.copy(source, &target, &self.platform).await?;

        Ok(target)
    }
}

/// Account ID of the active AWS credentials
pub(crate) async fn caller_account_id(runner: &dyn CommandRunner) -> Result<String> {
    let inv = Invocation::new("aws").args([
        "sts",
        "get-caller-identity",
        "--query",
        "Account",
        "--output",
        "text",
    ]);
    runner.run_checked(&inv).await
}

#[async_trait]
impl RegistryAdapter for EcrAdapter {
    fn kind(&self) -> DestinationKind {
        DestinationKind::Ecr
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
        for region in &self.settings.regions {
            let inv = Invocation::new("aws").args([
                "ecr",
                "describe-repositories",
                "--region",
                region.as_str(),
                "--max-items",
                "1",
            ]);

            if let Err(e) = self.runner.run_checked(&inv).await {
                return ValidationResult::failed(format!("ECR access failed in {}: {}", region, e));
            }
        }

        ValidationResult::ok()
    }
}
