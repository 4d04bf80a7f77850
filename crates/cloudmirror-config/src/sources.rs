//! Layered key/value sources
//!
//! Lookup order, highest precedence first:
//! 1. `<config-dir>/config/regions.conf`
//! 2. process environment
//! 3. `<config-dir>/.env`
//!
//! Neither file is ever written back into the process environment.

use crate::error::{ConfigError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const DOTENV_FILE: &str = ".env";
pub const REGIONS_CONF: &str = "config/regions.conf";

/// Key/value lookup over regions.conf, the process environment and .env
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    regions_conf: HashMap<String, String>,
    dotenv: HashMap<String, String>,
    process_env: bool,
}

impl ConfigSources {
    /// Load both files from `config_dir` (each is optional)
    pub fn load(config_dir: &Path) -> Result<Self> {
        let dotenv_path = config_dir.join(DOTENV_FILE);
        let dotenv = if dotenv_path.is_file() {
            tracing::debug!("Loading {}", dotenv_path.display());
            dotenvy::from_path_iter(&dotenv_path)
                .and_then(|iter| iter.collect::<std::result::Result<HashMap<_, _>, _>>())
                .map_err(|source| ConfigError::Load {
                    path: dotenv_path.clone(),
                    source,
                })?
        } else {
            HashMap::new()
        };

        let regions_path = config_dir.join(REGIONS_CONF);
        let regions_conf = if regions_path.is_file() {
            tracing::debug!("Loading {}", regions_path.display());
            load_regions_conf(&regions_path)?
        } else {
            HashMap::new()
        };

        Ok(Self {
            regions_conf,
            dotenv,
            process_env: true,
        })
    }

    /// In-memory sources, ignoring the process environment
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            regions_conf: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            dotenv: HashMap::new(),
            process_env: false,
        }
    }

    /// Look up a key; empty values count as unset
    pub fn get(&self, key: &str) -> Option<String> {
        let value = self
            .regions_conf
            .get(key)
            .cloned()
            .or_else(|| {
                if self.process_env {
                    std::env::var(key).ok()
                } else {
                    None
                }
            })
            .or_else(|| self.dotenv.get(key).cloned())?;

        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    }

    /// Comma-separated list; segments are trimmed and empty ones dropped
    pub fn get_list(&self, key: &str) -> Option<Vec<String>> {
        let value = self.get(key)?;
        let items: Vec<String> = value
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if items.is_empty() { None } else { Some(items) }
    }
}

/// Read regions.conf in dotenv syntax; malformed lines are skipped
fn load_regions_conf(path: &Path) -> Result<HashMap<String, String>> {
    let iter = dotenvy::from_path_iter(path).map_err(|source| ConfigError::Load {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(iter
        .filter_map(|item| match item {
            Ok(pair) => Some(pair),
            Err(e) => {
                tracing::warn!("Skipping line in {}: {}", path.display(), e);
                None
            }
        })
        .collect())
}

/// Resolve the directory holding `.env` and `config/regions.conf`
///
/// Priority:
/// 1. explicit directory (`--config-dir` / `CLOUDMIRROR_CONFIG_DIR`)
/// 2. current directory, if it contains either file
/// 3. `~/.config/cloudmirror`, if it exists
/// 4. current directory
pub fn discover_config_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir.to_path_buf();
    }

    let current_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    if has_config_files(&current_dir) {
        return current_dir;
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global = config_dir.join("cloudmirror");
        if global.is_dir() {
            return global;
        }
    }

    current_dir
}

fn has_config_files(dir: &Path) -> bool {
    dir.join(DOTENV_FILE).is_file() || dir.join(REGIONS_CONF).is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_regions_conf_skips_malformed_lines() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::create_dir(temp_dir.path().join("config")).unwrap();
        fs::write(
            temp_dir.path().join(REGIONS_CONF),
            "# regions\nECR_MIRROR_AWS_REGIONS=\"us-east-1, eu-west-1\"\n\nBROKEN LINE\nGCP_PROJECT_ID='demo'\n",
        )
        .unwrap();

        let conf = load_regions_conf(&temp_dir.path().join(REGIONS_CONF)).unwrap();

        assert_eq!(conf.len(), 2);
        assert_eq!(conf["ECR_MIRROR_AWS_REGIONS"], "us-east-1, eu-west-1");
        assert_eq!(conf["GCP_PROJECT_ID"], "demo");
    }

    #[test]
    fn test_malformed_dotenv_is_an_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join(".env"), "BROKEN LINE\n").unwrap();

        let err = ConfigSources::load(temp_dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Load { .. }));
    }

    #[test]
    fn test_get_list_trims_and_drops_empty() {
        let sources = ConfigSources::from_pairs([("REGIONS", " us-east-1 ,, eu-west-1 ,")]);
        assert_eq!(
            sources.get_list("REGIONS"),
            Some(vec!["us-east-1".to_string(), "eu-west-1".to_string()])
        );
    }

    #[test]
    fn test_empty_value_is_unset() {
        let sources = ConfigSources::from_pairs([("DOCR_TOKEN", "  "), ("LIST", ",")]);
        assert_eq!(sources.get("DOCR_TOKEN"), None);
        assert_eq!(sources.get_list("LIST"), None);
    }

    #[test]
    fn test_load_layer_precedence() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(
            temp_dir.path().join(".env"),
            "CLOUDMIRROR_TEST_A=from-dotenv\nCLOUDMIRROR_TEST_B=from-dotenv\nCLOUDMIRROR_TEST_C=from-dotenv\n",
        )
        .unwrap();
        fs::create_dir(temp_dir.path().join("config")).unwrap();
        fs::write(
            temp_dir.path().join(REGIONS_CONF),
            "CLOUDMIRROR_TEST_A=from-regions\n",
        )
        .unwrap();

        temp_env::with_vars(
            [
                ("CLOUDMIRROR_TEST_A", Some("from-env")),
                ("CLOUDMIRROR_TEST_B", Some("from-env")),
                ("CLOUDMIRROR_TEST_C", None),
            ],
            || {
                let sources = ConfigSources::load(temp_dir.path()).unwrap();
                assert_eq!(sources.get("CLOUDMIRROR_TEST_A").unwrap(), "from-regions");
                assert_eq!(sources.get("CLOUDMIRROR_TEST_B").unwrap(), "from-env");
                assert_eq!(sources.get("CLOUDMIRROR_TEST_C").unwrap(), "from-dotenv");
            },
        );

        // .env must not leak into the process environment
        assert!(std::env::var("CLOUDMIRROR_TEST_C").is_err());
    }

    #[test]
    fn test_load_without_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        temp_env::with_var("CLOUDMIRROR_TEST_ONLY_ENV", Some("yes"), || {
            let sources = ConfigSources::load(temp_dir.path()).unwrap();
            assert_eq!(sources.get("CLOUDMIRROR_TEST_ONLY_ENV").unwrap(), "yes");
        });
    }

    #[test]
    fn test_discover_explicit_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert_eq!(
            discover_config_dir(Some(temp_dir.path())),
            temp_dir.path().to_path_buf()
        );
    }
}
