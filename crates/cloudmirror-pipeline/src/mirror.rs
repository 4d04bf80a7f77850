//! Mirror orchestrator

use crate::aggregate::aggregate;
use crate::error::{PipelineError, Result};
use crate::retry::RetryPolicy;
use crate::scheduler::Scheduler;
use chrono::{DateTime, Utc};
use cloudmirror_config::Config;
use cloudmirror_core::{MirrorResult, ValidationResult, load_manifest_file};
use cloudmirror_registry::{
    Authenticator, CommandRunner, Crane, RegistryAuthenticator, RegistrySet,
};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Summary of one run, serialized for `--report`
#[derive(Debug, Clone, Serialize)]
pub struct MirrorReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub cancelled: bool,

    /// Rejected manifest lines
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,

    #[serde(flatten)]
    pub result: MirrorResult,
}

/// Binds configuration, authentication and adapters into a runnable pipeline
pub struct Mirror {
    config: Config,
    registries: Arc<RegistrySet>,
    authenticator: Arc<dyn Authenticator>,
    crane: Crane,
}

impl Mirror {
    /// Production wiring: every collaborator drives the CLIs through `runner`
    pub fn new(config: Config, runner: Arc<dyn CommandRunner>) -> Self {
        let registries = RegistrySet::from_config(&config, runner.clone());
        let authenticator = Arc::new(RegistryAuthenticator::from_config(&config, runner.clone()));
        Self::from_parts(config, registries, authenticator, Crane::new(runner))
    }

    pub fn from_parts(
        config: Config,
        registries: RegistrySet,
        authenticator: Arc<dyn Authenticator>,
        crane: Crane,
    ) -> Self {
        Self {
            config,
            registries: Arc::new(registries),
            authenticator,
            crane,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Pre-flight checks only; nothing is mirrored
    pub async fn validate_setup(&self) -> ValidationResult {
        tracing::info!("Validating setup...");

        match self.crane.version().await {
            Ok(version) => tracing::debug!("crane {}", version),
            Err(e) => return ValidationResult::failed(format!("crane is not available: {}", e)),
        }

        let manifest = &self.config.image_list_file;
        if !manifest.is_file() {
            return ValidationResult::failed(format!(
                "Image list file not found: {}",
                manifest.display()
            ));
        }

        let auth = self.authenticator.authenticate_all().await;
        if !auth.success {
            return auth;
        }

        for (kind, adapter) in self.registries.iter() {
            let access = adapter.validate_access().await;
            if !access.success {
                return ValidationResult::failed(format!(
                    "{} validation failed: {}",
                    kind,
                    access.message_or_default()
                ));
            }
            tracing::info!("{} access validated", kind);
        }

        ValidationResult::ok()
    }

    /// Load the manifest, authenticate and mirror every task
    ///
    /// Only a missing manifest or failed authentication is an error; image
    /// failures are reported in the returned [`MirrorReport`].
    pub async fn run(&self, cancel: CancellationToken) -> Result<MirrorReport> {
        let started_at = Utc::now();

        let manifest = load_manifest_file(&self.config.image_list_file)?;
        let warnings: Vec<String> = manifest.warnings.iter().map(ToString::to_string).collect();

        if manifest.tasks.is_empty() {
            tracing::warn!(
                "No valid images found in {}",
                self.config.image_list_file.display()
            );
            return Ok(MirrorReport {
                started_at,
                finished_at: Utc::now(),
                cancelled: false,
                warnings,
                result: MirrorResult::default(),
            });
        }
        tracing::info!("Found {} images to mirror", manifest.tasks.len());

        let auth = self.authenticator.authenticate_all().await;
        if !auth.success {
            return Err(PipelineError::Authentication(
                auth.message_or_default().to_string(),
            ));
        }

        let scheduler = Scheduler::new(
            self.registries.clone(),
            RetryPolicy::new(self.config.max_retries, self.config.retry_delay),
            self.config.max_parallel_jobs,
        );
        tracing::info!(
            "Starting mirror with {} parallel jobs",
            self.config.max_parallel_jobs
        );

        let reports = scheduler.run(manifest.tasks, cancel.clone()).await;

        Ok(MirrorReport {
            started_at,
            finished_at: Utc::now(),
            cancelled: cancel.is_cancelled(),
            warnings,
            result: aggregate(&reports),
        })
    }
}
