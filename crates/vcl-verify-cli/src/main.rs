mod commands;
mod config;
mod logging;

use std::num::NonZeroUsize;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::config::{Overrides, Settings, WalkErrors};

#[derive(Parser, Debug)]
#[command(name = "vcl-verify", version)]
#[command(about = "Verify local VCL files against the version published to a Fastly service")]
struct Cli {
    /// Show the diff for files that differ, and debug logs
    #[arg(long, env = "VCL_DEBUG")]
    debug: bool,

    /// Service version to verify against (defaults to the latest)
    #[arg(long = "vcl-version", env = "VCL_VERSION")]
    vcl_version: Option<String>,

    /// Fastly service id
    #[arg(long, env = "FASTLY_SERVICE_ID")]
    service: Option<String>,

    /// Fastly API token
    #[arg(long, env = "FASTLY_API_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Directory of VCL files to compare
    #[arg(long, env = "VCL_DIRECTORY")]
    dir: Option<PathBuf>,

    /// Regex of paths to skip [default: ^____]
    #[arg(long, env = "VCL_SKIP_DIRECTORY")]
    skip: Option<String>,

    /// Regex a path must match to be compared [default: matches all]
    #[arg(long = "match", env = "VCL_MATCH_DIRECTORY")]
    match_pattern: Option<String>,

    /// Marker a path must contain to be compared [default: .vcl]
    #[arg(long)]
    extension: Option<String>,

    /// Maximum number of concurrent fetches [default: unbounded]
    #[arg(long)]
    max_concurrency: Option<NonZeroUsize>,

    /// Per-request timeout in seconds, 0 for none
    #[arg(long = "timeout")]
    timeout_secs: Option<u64>,

    /// What to do when part of the directory cannot be read
    #[arg(long, value_enum)]
    walk_errors: Option<WalkErrors>,

    /// Config file [default: <config dir>/vcl-verify/config.toml]
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Cli {
    fn overrides(self) -> Overrides {
        Overrides {
            service: self.service,
            token: self.token,
            dir: self.dir,
            skip: self.skip,
            match_pattern: self.match_pattern,
            extension: self.extension,
            vcl_version: self.vcl_version,
            max_concurrency: self.max_concurrency,
            timeout_secs: self.timeout_secs,
            walk_errors: self.walk_errors,
            debug: self.debug,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Help, version and usage errors all exit with status 1.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            std::process::exit(1);
        }
    };

    logging::init(cli.debug);

    let file_config = config::load_config(cli.config.as_deref());
    let settings = Settings::resolve(cli.overrides(), file_config)?;

    tracing::debug!(
        service = %settings.service,
        dir = %settings.dir.display(),
        "starting verification"
    );

    commands::verify::run(&settings).await
}
