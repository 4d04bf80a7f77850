//! Registry adapter trait and the tag -> adapter mapping

use crate::command::CommandRunner;
use crate::error::Result;
use crate::{AcrAdapter, DocrAdapter, EcrAdapter, GarAdapter, JfrogAdapter};
use async_trait::async_trait;
use cloudmirror_config::Config;
use cloudmirror_core::{DestinationKind, ValidationResult};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Destination registry abstraction
///
/// One implementation per destination kind. Adapters are built once from
/// configuration and shared read-only by every task that targets them.
#[async_trait]
pub trait RegistryAdapter: Send + Sync {
    /// Destination kind served by this adapter
    fn kind(&self) -> DestinationKind;

    /// Mirror `source` into every configured region/target of this destination
    ///
    /// Provisions the target repository or registry when missing, then copies
    /// the image. Returns true only if every region succeeded. Regions that
    /// did succeed are left in place.
    async fn push(&self, source: &str) -> bool;

    /// Pre-flight check of configuration and access; no images are copied
    async fn validate_access(&self) -> ValidationResult {
        ValidationResult::ok()
    }
}

/// Log the outcome of one region/target and return whether it succeeded
pub(crate) fn report_target(kind: DestinationKind, region: &str, result: Result<String>) -> bool {
    match result {
        Ok(target) => {
            tracing::debug!(destination = %kind, region, "Successfully mirrored to {}: {}", kind, target);
            true
        }
        Err(e) => {
            tracing::error!(destination = %kind, region, "{}", e);
            false
        }
    }
}

/// Initialized adapters indexed by destination kind
#[derive(Clone, Default)]
pub struct RegistrySet {
    adapters: BTreeMap<DestinationKind, Arc<dyn RegistryAdapter>>,
}

impl RegistrySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build one adapter for every destination with configuration
    pub fn from_config(config: &Config, runner: Arc<dyn CommandRunner>) -> Self {
        let mut set = Self::new();
        let platform = config.target_platform.as_str();

        if let Some(ecr) = &config.ecr {
            set.insert(Arc::new(EcrAdapter::new(ecr.clone(), platform, runner.clone())));
        }
        if let Some(gar) = &config.gar {
            set.insert(Arc::new(GarAdapter::new(gar.clone(), platform, runner.clone())));
        }
        if let Some(acr) = &config.acr {
            set.insert(Arc::new(AcrAdapter::new(acr.clone(), platform, runner.clone())));
        }
        if let Some(jfrog) = &config.jfrog {
            set.insert(Arc::new(JfrogAdapter::new(jfrog.clone(), platform, runner.clone())));
        }
        if let Some(docr) = &config.docr {
            set.insert(Arc::new(DocrAdapter::new(docr.clone(), platform, runner)));
        }

        set
    }

    /// Add an adapter, replacing any existing adapter of the same kind
    pub fn insert(&mut self, adapter: Arc<dyn RegistryAdapter>) {
        self.adapters.insert(adapter.kind(), adapter);
    }

    /// Look up by manifest tag; `None` for unknown or unconfigured tags
    pub fn get_by_tag(&self, tag: &str) -> Option<&Arc<dyn RegistryAdapter>> {
        let kind = tag.trim().parse::<DestinationKind>().ok()?;
        self.adapters.get(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DestinationKind, &Arc<dyn RegistryAdapter>)> {
        self.adapters.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}
