//! cloudmirror configuration
//!
//! Destination credentials and regions are read from the process
//! environment, an optional `.env` file and an optional
//! `config/regions.conf` file. Run-level knobs (parallelism, retries,
//! platform) come from the command line.

pub mod error;
pub mod settings;
pub mod sources;

pub use error::{ConfigError, Result};
pub use settings::{
    AcrSettings, Config, DocrSettings, EcrSettings, GarSettings, JfrogSettings, RunOptions,
};
pub use sources::{ConfigSources, discover_config_dir};
