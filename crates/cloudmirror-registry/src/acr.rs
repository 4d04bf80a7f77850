//! Azure Container Registry

use crate::adapter::{RegistryAdapter, report_target};
use crate::command::{CommandRunner, Invocation};
use crate::crane::Crane;
use crate::error::{RegistryError, Result};
use async_trait::async_trait;
use cloudmirror_config::AcrSettings;
use cloudmirror_core::{DestinationKind, ImageRef, ValidationResult};
use std::sync::Arc;

/// Registry name used in `region`
///
/// An explicit `AZURE_ACR_NAME` is shared by every region; otherwise one
/// registry per region is derived from the prefix.
pub fn registry_name(settings: &AcrSettings, region: &str) -> String {
    match &settings.acr_name {
        Some(name) => name.clone(),
        None => format!("{}acr{}", settings.acr_name_prefix, region),
    }
}

pub struct AcrAdapter {
    settings: AcrSettings,
    platform: String,
    runner: Arc<dyn CommandRunner>,
    crane: Crane,
}

impl AcrAdapter {
    pub fn new(
        settings: AcrSettings,
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

    pub fn target_reference(registry: &str, image: &ImageRef) -> String {
        format!("{}.azurecr.io/{}", registry, image.path())
    }

    fn resource_group(&self) -> Result<&str> {
        self.settings
            .resource_group
            .as_deref()
            .ok_or_else(|| RegistryError::MissingSetting("AZURE_RESOURCE_GROUP".to_string()))
    }

    async fn ensure_registry(&self, registry: &str, region: &str) -> Result<()> {
        let resource_group = self.resource_group()?;

        let show = Invocation::new("az").args([
            "acr",
            "show",
            "--name",
            registry,
            "--resource-group",
            resource_group,
        ]);
        if self.runner.succeeds(&show).await {
            return Ok(());
        }

        tracing::debug!("Creating ACR registry: {} in {}", registry, region);
        let create = Invocation::new("az").args([
            "acr",
            "create",
            "--name",
            registry,
            "--resource-group",
            resource_group,
            "--location",
            region,
            "--sku",
            "Standard",
            "--admin-enabled",
            "false",
        ]);
        self.runner
            .run_checked(&create)
            .await
            .map(|_| ())
            .map_err(|e| RegistryError::Provisioning {
                resource: format!("ACR registry {} in {}", registry, region),
                message: e.to_string(),
            })
    }

    async fn push_region(&self, source: &str, image: &ImageRef, region: &str) -> Result<String> {
        let registry = registry_name(&self.settings, region);
        let target = Self::target_reference(&registry, image);

        tracing::debug!("Mirroring {} to ACR: {}", source, target);

        self.ensure_registry(&registry, region).await?;

        // refreshes the docker credential for a registry that may have just been created
        let login = Invocation::new("az").args(["acr", "login", "--name", registry.as_str()]);
        self.runner.run_checked(&login).await?;

        self.crane.copy(source, &target, &self.platform).await?;

        Ok(target)
    }
}

#[async_trait]
impl RegistryAdapter for AcrAdapter {
    fn kind(&self) -> DestinationKind {
        DestinationKind::Acr
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
        let resource_group = match self.resource_group() {
            Ok(rg) => rg,
            Err(e) => return ValidationResult::failed(e.to_string()),
        };

        let inv = Invocation::new("az").args(["group", "show", "--name", resource_group]);
        match self.runner.run_checked(&inv).await {
            Ok(_) => ValidationResult::ok(),
            Err(e) => ValidationResult::failed(format!(
                "Resource group {} not accessible: {}",
                resource_group, e
            )),
        }
    }
}
