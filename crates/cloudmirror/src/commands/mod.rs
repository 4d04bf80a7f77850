pub mod mirror;
pub mod validate;

use crate::Cli;
use crate::output;
use anyhow::Context;
use cloudmirror_config::{Config, ConfigSources, RunOptions, discover_config_dir};
use cloudmirror_pipeline::Mirror;
use cloudmirror_registry::ProcessRunner;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Dispatch on the parsed command line, returning the process exit code
pub async fn run(cli: &Cli) -> anyhow::Result<i32> {
    let mirror = build_mirror(cli)?;

    if cli.validate {
        validate::handle(&mirror).await
    } else {
        mirror::handle(&mirror, cli.report.as_deref()).await
    }
}

fn build_mirror(cli: &Cli) -> anyhow::Result<Mirror> {
    let config_dir = discover_config_dir(cli.config_dir.as_deref());
    tracing::debug!("Using config directory {}", config_dir.display());

    let sources = ConfigSources::load(&config_dir)
        .with_context(|| format!("Failed to load configuration from {}", config_dir.display()))?;

    let options = RunOptions {
        image_list_file: resolve_manifest(&cli.file, &config_dir),
        max_parallel_jobs: cli.jobs,
        max_retries: cli.retries,
        target_platform: cli.platform.clone(),
    };
    let config = Config::load(options, &sources)?;

    let enabled = config.enabled_destinations();
    if enabled.is_empty() {
        output::warning("No destination registries configured");
    } else {
        output::info(&format!("Enabled destinations: {}", enabled.join(", ")));
    }

    Ok(Mirror::new(config, Arc::new(ProcessRunner::new())))
}

/// Relative manifest paths are looked up in the working directory first,
/// then in the config directory
fn resolve_manifest(file: &Path, config_dir: &Path) -> PathBuf {
    if file.is_absolute() || file.exists() {
        return file.to_path_buf();
    }

    let candidate = config_dir.join(file);
    if candidate.exists() {
        candidate
    } else {
        file.to_path_buf()
    }
}
