use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use vcl_verify::path::{DEFAULT_EXTENSION, DEFAULT_SKIP_PATTERN};
use vcl_verify::{DispatchOptions, FilterOptions, VerifyOptions, WalkErrorPolicy};
use vcl_verify_fastly::FastlyClientConfig;

/// How walk errors are handled, as written in config files and flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WalkErrors {
    /// Warn and keep walking.
    #[default]
    Continue,
    /// Abort on the first walk error.
    Fail,
}

impl From<WalkErrors> for WalkErrorPolicy {
    fn from(value: WalkErrors) -> Self {
        match value {
            WalkErrors::Continue => WalkErrorPolicy::Continue,
            WalkErrors::Fail => WalkErrorPolicy::Fail,
        }
    }
}

/// Optional defaults read from `config.toml`. The API token is never read
/// from here.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub service: Option<String>,
    pub dir: Option<PathBuf>,
    pub skip: Option<String>,
    #[serde(rename = "match")]
    pub match_pattern: Option<String>,
    pub extension: Option<String>,
    pub max_concurrency: Option<NonZeroUsize>,
    pub timeout_secs: Option<u64>,
    pub walk_errors: Option<WalkErrors>,
    pub api_base_url: Option<String>,
}

/// Config file path: `~/.config/vcl-verify/config.toml`
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("vcl-verify").join("config.toml"))
}

/// Load the config file, falling back to empty defaults if it is missing
/// or malformed.
pub fn load_config(path: Option<&Path>) -> FileConfig {
    let Some(path) = path.map(Path::to_path_buf).or_else(config_path) else {
        return FileConfig::default();
    };

    let Ok(contents) = std::fs::read_to_string(&path) else {
        return FileConfig::default();
    };

    match toml::from_str::<FileConfig>(&contents) {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "warning: failed to parse config at {}, using defaults: {e}",
                path.display()
            );
            FileConfig::default()
        }
    }
}

/// Values supplied on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub service: Option<String>,
    pub token: Option<String>,
    pub dir: Option<PathBuf>,
    pub skip: Option<String>,
    pub match_pattern: Option<String>,
    pub extension: Option<String>,
    pub vcl_version: Option<String>,
    pub max_concurrency: Option<NonZeroUsize>,
    pub timeout_secs: Option<u64>,
    pub walk_errors: Option<WalkErrors>,
    pub debug: bool,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub service: String,
    pub token: String,
    pub dir: PathBuf,
    pub version_override: Option<String>,
    pub filter: FilterOptions,
    pub walk_errors: WalkErrorPolicy,
    pub max_concurrency: Option<NonZeroUsize>,
    pub timeout: Option<Duration>,
    pub api_base_url: Option<String>,
    pub debug: bool,
}

impl Settings {
    /// Merge flags/env over the config file over built-in defaults.
    pub fn resolve(overrides: Overrides, file: FileConfig) -> Result<Self> {
        let Some(service) = overrides.service.or(file.service).filter(|s| !s.is_empty()) else {
            bail!("missing service id (use --service or FASTLY_SERVICE_ID)");
        };

        let Some(token) = overrides.token.filter(|t| !t.is_empty()) else {
            bail!("missing API token (use --token or FASTLY_API_TOKEN)");
        };

        let filter = FilterOptions {
            extension: Some(
                overrides
                    .extension
                    .or(file.extension)
                    .unwrap_or_else(|| DEFAULT_EXTENSION.to_owned()),
            ),
            match_pattern: overrides.match_pattern.or(file.match_pattern),
            skip_pattern: Some(
                overrides
                    .skip
                    .or(file.skip)
                    .unwrap_or_else(|| DEFAULT_SKIP_PATTERN.to_owned()),
            ),
            exclude_vcs: true,
        };

        Ok(Self {
            service,
            token,
            dir: overrides
                .dir
                .or(file.dir)
                .unwrap_or_else(|| PathBuf::from(".")),
            version_override: overrides.vcl_version.filter(|v| !v.is_empty()),
            filter,
            walk_errors: overrides
                .walk_errors
                .or(file.walk_errors)
                .unwrap_or_default()
                .into(),
            max_concurrency: overrides.max_concurrency.or(file.max_concurrency),
            timeout: overrides
                .timeout_secs
                .or(file.timeout_secs)
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            api_base_url: file.api_base_url,
            debug: overrides.debug,
        })
    }

    pub fn client_config(&self) -> FastlyClientConfig {
        FastlyClientConfig {
            token: self.token.clone(),
            api_base_url: self.api_base_url.clone(),
            timeout: self.timeout,
        }
    }

    pub fn verify_options(&self) -> VerifyOptions {
        VerifyOptions {
            service: self.service.clone(),
            version_override: self.version_override.clone(),
            root: self.dir.clone(),
            filter: self.filter.clone(),
            walk_errors: self.walk_errors,
            dispatch: DispatchOptions {
                max_concurrency: self.max_concurrency,
            },
            debug: self.debug,
        }
    }
}
