//! Destination registry login
//!
//! Each enabled destination has one login routine. Registry tokens are handed
//! to crane over stdin and are never logged.

use crate::command::{CommandRunner, Invocation};
use crate::crane::Crane;
use crate::docr::DOCR_HOST;
use crate::ecr::{caller_account_id, ecr_host};
use crate::error::{RegistryError, Result};
use crate::gar::gar_host;
use async_trait::async_trait;
use cloudmirror_config::{AcrSettings, Config, DocrSettings, EcrSettings, GarSettings, JfrogSettings};
use cloudmirror_core::{DestinationKind, ValidationResult};
use futures_util::future::{BoxFuture, join_all};
use std::sync::Arc;

/// Authenticates against every configured destination
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Run all login routines; fails if any routine fails
    async fn authenticate_all(&self) -> ValidationResult;
}

/// Logs in to the destinations of a [`Config`] through their vendor CLIs
pub struct RegistryAuthenticator {
    ecr: Option<EcrSettings>,
    gar: Option<GarSettings>,
    acr: Option<AcrSettings>,
    jfrog: Option<JfrogSettings>,
    docr: Option<DocrSettings>,
    runner: Arc<dyn CommandRunner>,
    crane: Crane,
}

impl RegistryAuthenticator {
    pub fn from_config(config: &Config, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            ecr: config.ecr.clone(),
            gar: config.gar.clone(),
            acr: config.acr.clone(),
            jfrog: config.jfrog.clone(),
            docr: config.docr.clone(),
            crane: Crane::new(runner.clone()),
            runner,
        }
    }

    async fn login_ecr(&self, settings: &EcrSettings) -> Result<()> {
        let account_id = match &settings.account_id {
            Some(id) => id.clone(),
            None => caller_account_id(self.runner.as_ref()).await?,
        };

        for region in &settings.regions {
            let token = Invocation::new("aws").args([
                "ecr",
                "get-login-password",
                "--region",
                region.as_str(),
            ]);

            let password = match self.runner.run_checked(&token).await {
                Ok(password) => password,
                Err(e) => {
                    tracing::warn!("Skipping ECR login for {}: {}", region, e);
                    continue;
                }
            };

            let registry = ecr_host(&account_id, region);
            match self.crane.auth_login(&registry, "AWS", &password).await {
                Ok(()) => tracing::debug!("Logged in to {}", registry),
                Err(e) => tracing::warn!("crane login to {} failed: {}", registry, e),
            }
        }

        Ok(())
    }

    async fn login_gar(&self, settings: &GarSettings) -> Result<()> {
        if let Some(service_account) = &settings.service_account {
            let impersonate = Invocation::new("gcloud").args([
                "config",
                "set",
                "auth/impersonate_service_account",
                service_account.as_str(),
            ]);
            self.runner.run_checked(&impersonate).await?;
        }

        for region in &settings.regions {
            let host = gar_host(region);
            let configure = Invocation::new("gcloud").args([
                "auth",
                "configure-docker",
                host.as_str(),
                "--quiet",
            ]);
            match self.runner.run_checked(&configure).await {
                Ok(_) => tracing::debug!("Configured docker credentials for {}", host),
                Err(e) => tracing::warn!("Docker credential setup for {} failed: {}", host, e),
            }
        }

        Ok(())
    }

    async fn login_acr(&self, settings: &AcrSettings) -> Result<()> {
        let Some((client_id, client_secret, tenant_id)) = settings.service_principal() else {
            tracing::debug!("No Azure service principal configured, using the current az session");
            return Ok(());
        };

        let login = Invocation::new("az")
            .args(["login", "--service-principal", "-u", client_id, "-p"])
            .secret_arg(client_secret)
            .args(["--tenant", tenant_id]);

        if self.runner.succeeds(&login).await {
            Ok(())
        } else {
            Err(RegistryError::Authentication(
                "Azure service principal login failed".to_string(),
            ))
        }
    }

    async fn login_jfrog(&self, settings: &JfrogSettings) -> Result<()> {
        let (Some(user), Some(token)) = (&settings.user, &settings.token) else {
            return Err(RegistryError::Authentication(
                "Missing JFrog credentials".to_string(),
            ));
        };
        if settings.host().is_empty() {
            return Err(RegistryError::Authentication(
                "Missing JFrog credentials".to_string(),
            ));
        }

        self.crane.auth_login(settings.host(), user, token).await
    }

    async fn login_docr(&self, settings: &DocrSettings) -> Result<()> {
        self.crane
            .auth_login(DOCR_HOST, "unused", &settings.token)
            .await
    }
}

#[async_trait]
impl Authenticator for RegistryAuthenticator {
    async fn authenticate_all(&self) -> ValidationResult {
        let mut logins: Vec<(DestinationKind, BoxFuture<'_, Result<()>>)> = Vec::new();

        if let Some(s) = &self.ecr {
            logins.push((DestinationKind::Ecr, Box::pin(self.login_ecr(s))));
        }
        if let Some(s) = &self.gar {
            logins.push((DestinationKind::Gar, Box::pin(self.login_gar(s))));
        }
        if let Some(s) = &self.acr {
            logins.push((DestinationKind::Acr, Box::pin(self.login_acr(s))));
        }
        if let Some(s) = &self.jfrog {
            logins.push((DestinationKind::Jfrog, Box::pin(self.login_jfrog(s))));
        }
        if let Some(s) = &self.docr {
            logins.push((DestinationKind::Docr, Box::pin(self.login_docr(s))));
        }

        let (kinds, futures): (Vec<_>, Vec<_>) = logins.into_iter().unzip();
        let results = join_all(futures).await;

        let mut failed = 0;
        for (kind, result) in kinds.into_iter().zip(results) {
            match result {
                Ok(()) => tracing::info!("{} authentication successful", kind),
                Err(e) => {
                    tracing::error!("{} authentication failed: {}", kind, e);
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            ValidationResult::failed(format!("Authentication failed for {} registries", failed))
        } else {
            ValidationResult::ok()
        }
    }
}
