//! Run settings and per-destination configuration sections

use crate::error::{ConfigError, Result};
use crate::sources::ConfigSources;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_IMAGE_LIST: &str = "config/example-list.txt";
pub const DEFAULT_PARALLEL_JOBS: usize = 3;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 5;
pub const DEFAULT_PLATFORM: &str = "linux/amd64";
pub const DEFAULT_GAR_REPOSITORY: &str = "k8s-assets";
pub const DEFAULT_ACR_NAME_PREFIX: &str = "org";
pub const DEFAULT_JFROG_REPOSITORY: &str = "docker-local";

/// Settings that come from the command line
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub image_list_file: PathBuf,
    pub max_parallel_jobs: usize,
    pub max_retries: u32,
    pub target_platform: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            image_list_file: PathBuf::from(DEFAULT_IMAGE_LIST),
            max_parallel_jobs: DEFAULT_PARALLEL_JOBS,
            max_retries: DEFAULT_MAX_RETRIES,
            target_platform: DEFAULT_PLATFORM.to_string(),
        }
    }
}

/// AWS Elastic Container Registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcrSettings {
    pub regions: Vec<String>,
    pub account_id: Option<String>,
}

/// Google Artifact Registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GarSettings {
    pub regions: Vec<String>,
    pub project_id: Option<String>,
    pub service_account: Option<String>,
    pub repository: String,
}

/// Azure Container Registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcrSettings {
    pub regions: Vec<String>,
    pub resource_group: Option<String>,
    pub acr_name: Option<String>,
    pub acr_name_prefix: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub tenant_id: Option<String>,
}

impl AcrSettings {
    /// Service principal credentials, if all three are configured
    pub fn service_principal(&self) -> Option<(&str, &str, &str)> {
        match (
            self.client_id.as_deref(),
            self.client_secret.as_deref(),
            self.tenant_id.as_deref(),
        ) {
            (Some(id), Some(secret), Some(tenant)) => Some((id, secret, tenant)),
            _ => None,
        }
    }
}

/// JFrog Artifactory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JfrogSettings {
    pub url: String,
    pub user: Option<String>,
    pub token: Option<String>,
    pub repository: String,
}

impl JfrogSettings {
    /// Host (and any path prefix) of the Artifactory URL, without scheme
    pub fn host_path(&self) -> &str {
        let url = self
            .url
            .strip_prefix("https://")
            .or_else(|| self.url.strip_prefix("http://"))
            .unwrap_or(&self.url);
        url.trim_end_matches('/')
    }

    /// Host name only
    pub fn host(&self) -> &str {
        self.host_path().split('/').next().unwrap_or_default()
    }
}

/// DigitalOcean Container Registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocrSettings {
    pub token: String,
    pub registry_name: Option<String>,
}

/// Complete configuration for a run
///
/// A destination section is `Some` only when its trigger key is set:
/// `ECR_MIRROR_AWS_REGIONS`, `GCR_GCP_REGIONS`, `ACR_AZURE_REGIONS`,
/// `JFROG_URL`, `DOCR_TOKEN`.
#[derive(Debug, Clone)]
pub struct Config {
    pub image_list_file: PathBuf,
    pub max_parallel_jobs: usize,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub target_platform: String,

    pub ecr: Option<EcrSettings>,
    pub gar: Option<GarSettings>,
    pub acr: Option<AcrSettings>,
    pub jfrog: Option<JfrogSettings>,
    pub docr: Option<DocrSettings>,
}

impl Config {
    /// Build the configuration from CLI options and layered key/value sources
    pub fn load(options: RunOptions, sources: &ConfigSources) -> Result<Self> {
        let retry_delay = match sources.get("RETRY_DELAY") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidValue {
                    key: "RETRY_DELAY".to_string(),
                    value: raw.clone(),
                })?,
            None => DEFAULT_RETRY_DELAY_SECS,
        };

        let ecr = sources
            .get_list("ECR_MIRROR_AWS_REGIONS")
            .map(|regions| EcrSettings {
                regions,
                account_id: sources.get("AWS_ACCOUNT_ID"),
            });

        let gar = sources.get_list("GCR_GCP_REGIONS").map(|regions| GarSettings {
            regions,
            project_id: sources.get("GCP_PROJECT_ID"),
            service_account: sources.get("GCP_SERVICE_ACCOUNT"),
            repository: sources
                .get("GAR_REPOSITORY")
                .unwrap_or_else(|| DEFAULT_GAR_REPOSITORY.to_string()),
        });

        let acr = sources.get_list("ACR_AZURE_REGIONS").map(|regions| AcrSettings {
            regions,
            resource_group: sources.get("AZURE_RESOURCE_GROUP"),
            acr_name: sources.get("AZURE_ACR_NAME"),
            acr_name_prefix: sources
                .get("AZURE_ACR_NAME_PREFIX")
                .unwrap_or_else(|| DEFAULT_ACR_NAME_PREFIX.to_string()),
            client_id: sources.get("AZURE_CLIENT_ID"),
            client_secret: sources.get("AZURE_CLIENT_SECRET"),
            tenant_id: sources.get("AZURE_TENANT_ID"),
        });

        let jfrog = sources.get("JFROG_URL").map(|url| JfrogSettings {
            url,
            user: sources.get("JFROG_USER"),
            token: sources.get("JFROG_TOKEN"),
            repository: sources
                .get("JFROG_REPOSITORY")
                .unwrap_or_else(|| DEFAULT_JFROG_REPOSITORY.to_string()),
        });

        let docr = sources.get("DOCR_TOKEN").map(|token| DocrSettings {
            token,
            registry_name: sources.get("DOCR_REGISTRY_NAME"),
        });

        Ok(Self {
            image_list_file: options.image_list_file,
            max_parallel_jobs: options.max_parallel_jobs.max(1),
            max_retries: options.max_retries.max(1),
            retry_delay: Duration::from_secs(retry_delay),
            target_platform: options.target_platform,
            ecr,
            gar,
            acr,
            jfrog,
            docr,
        })
    }

    /// Tags of every destination that has configuration
    pub fn enabled_destinations(&self) -> Vec<&'static str> {
        let mut enabled = Vec::new();
        if self.ecr.is_some() {
            enabled.push("ECR");
        }
        if self.gar.is_some() {
            enabled.push("GAR");
        }
        if self.acr.is_some() {
            enabled.push("ACR");
        }
        if self.jfrog.is_some() {
            enabled.push("JFROG");
        }
        if self.docr.is_some() {
            enabled.push("DOCR");
        }
        enabled
    }
}
