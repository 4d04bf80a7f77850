mod commands;
mod output;

use clap::Parser;
use cloudmirror_config::settings::{
    DEFAULT_IMAGE_LIST, DEFAULT_MAX_RETRIES, DEFAULT_PARALLEL_JOBS, DEFAULT_PLATFORM,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Exit status when interrupted by Ctrl-C
pub const EXIT_INTERRUPTED: i32 = 130;

#[derive(Parser)]
#[command(name = "cloudmirror", version)]
#[command(about = "Multi-cloud container image mirroring tool", long_about = None)]
pub struct Cli {
    /// Image list file
    #[arg(
        short = 'f',
        long = "file",
        env = "CLOUDMIRROR_IMAGE_LIST",
        default_value = DEFAULT_IMAGE_LIST
    )]
    pub file: PathBuf,

    /// Max parallel jobs
    #[arg(short = 'j', long, env = "CLOUDMIRROR_JOBS", default_value_t = DEFAULT_PARALLEL_JOBS)]
    pub jobs: usize,

    /// Max attempts per image
    #[arg(short = 'r', long, env = "CLOUDMIRROR_RETRIES", default_value_t = DEFAULT_MAX_RETRIES)]
    pub retries: u32,

    /// Target platform
    #[arg(short = 'p', long, env = "CLOUDMIRROR_PLATFORM", default_value = DEFAULT_PLATFORM)]
    pub platform: String,

    /// Enable debug output
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Run validation only
    #[arg(short = 'v', long)]
    pub validate: bool,

    /// Write a JSON report of the run to this file
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Directory holding .env and config/regions.conf
    #[arg(long, env = "CLOUDMIRROR_CONFIG_DIR", value_name = "DIR")]
    pub config_dir: Option<PathBuf>,
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    output::banner();

    let code = match commands::run(&cli).await {
        Ok(code) => code,
        Err(e) => {
            output::error(&format!("Fatal error: {:#}", e));
            1
        }
    };

    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
