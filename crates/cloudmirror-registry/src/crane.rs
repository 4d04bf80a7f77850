//! crane CLI wrapper
//!
//! crane performs the actual blob and manifest transfer between registries.

use crate::command::{CommandRunner, Invocation};
use crate::error::{RegistryError, Result};
use std::sync::Arc;

const CRANE: &str = "crane";

/// crane CLI wrapper
#[derive(Clone)]
pub struct Crane {
    runner: Arc<dyn CommandRunner>,
}

impl Crane {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Copy `source` to `target` for a single platform
    pub async fn copy(&self, source: &str, target: &str, platform: &str) -> Result<()> {
        let inv = Invocation::new(CRANE).args(["copy", source, target, "--platform", platform]);

        self.runner
            .run_checked(&inv)
            .await
            .map(|_| ())
            .map_err(|e| RegistryError::CopyFailed {
                target: target.to_string(),
                message: match e {
                    RegistryError::CommandFailed { stderr, .. } => stderr,
                    other => other.to_string(),
                },
            })
    }

    /// Store credentials for `registry` in the local docker config
    pub async fn auth_login(&self, registry: &str, username: &str, password: &str) -> Result<()> {
        let inv = Invocation::new(CRANE)
            .args(["auth", "login", registry, "-u", username, "--password-stdin"])
            .stdin(password);

        self.runner.run_checked(&inv).await.map(|_| ())
    }

    /// Installed crane version
    pub async fn version(&self) -> Result<String> {
        self.runner
            .run_checked(&Invocation::new(CRANE).arg("version"))
            .await
    }
}
