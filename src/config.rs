//! Runtime settings: command-line flags layered over an optional TOML file
//! layered over built-in defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::catalog::CatalogSource;
use crate::debounce::DEFAULT_QUIET_PERIOD;
use crate::route::Route;
use crate::search::SearchOptions;

/// Catalog location used when neither the CLI nor the config file name one.
pub const DEFAULT_CATALOG: &str = "data/hymns.json";
const CONFIG_FILE_NAME: &str = "config.toml";
/// Data directory used when the platform offers none.
const FALLBACK_DATA_DIR: &str = ".hymnal";

#[derive(Debug, Default, Parser)]
#[command(name = "hymnal", version, about = "Search and present hymn lyrics in the terminal")]
pub struct Cli {
    /// Song to open at startup, e.g. `/songs/101` or `101`.
    pub route: Option<String>,

    /// Catalog JSON: a file path or an http(s) URL.
    #[arg(short, long)]
    pub catalog: Option<String>,

    /// Search permissiveness between 0 (exact) and 1 (anything goes).
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Maximum number of search results.
    #[arg(long)]
    pub limit: Option<usize>,

    /// Quiet period before a typed query is searched, in milliseconds.
    #[arg(long = "debounce-ms")]
    pub debounce_ms: Option<u64>,

    /// Characters of context around highlighted lyrics.
    #[arg(long)]
    pub context: Option<usize>,

    /// Alternate config file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Where preferences and logs are kept.
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub catalog: Option<String>,
    pub threshold: Option<f64>,
    pub limit: Option<usize>,
    pub debounce_ms: Option<u64>,
    pub context_chars: Option<usize>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("threshold must be between 0 and 1, got {0}")]
    Threshold(f64),
    #[error("result limit must be at least 1")]
    Limit,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub catalog: CatalogSource,
    pub search: SearchOptions,
    pub debounce: Duration,
    pub route: Route,
    pub data_dir: PathBuf,
}

impl FileConfig {
    /// Read `path`. A missing file is only an error when `required`.
    pub fn load(path: &Path, required: bool) -> Result<Self, ConfigError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if !required && err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Settings {
    /// Resolve settings for this run from the parsed command line.
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let dirs = ProjectDirs::from("org", "hymnal", "hymnal");
        let file = match &cli.config {
            Some(path) => FileConfig::load(path, true)?,
            None => match &dirs {
                Some(dirs) => FileConfig::load(&dirs.config_dir().join(CONFIG_FILE_NAME), false)?,
                None => FileConfig::default(),
            },
        };
        let data_dir = dirs
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(FALLBACK_DATA_DIR));

        Self::merge(cli, file, data_dir)
    }

    /// Layer `cli` over `file` over defaults and validate the result.
    pub fn merge(
        cli: Cli,
        file: FileConfig,
        default_data_dir: PathBuf,
    ) -> Result<Self, ConfigError> {
        let defaults = SearchOptions::default();

        let threshold = cli.threshold.or(file.threshold).unwrap_or(defaults.threshold);
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::Threshold(threshold));
        }
        let limit = cli.limit.or(file.limit).unwrap_or(defaults.limit);
        if limit == 0 {
            return Err(ConfigError::Limit);
        }

        let catalog = cli
            .catalog
            .or(file.catalog)
            .unwrap_or_else(|| DEFAULT_CATALOG.to_string());
        let debounce = cli
            .debounce_ms
            .or(file.debounce_ms)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_QUIET_PERIOD);

        Ok(Self {
            catalog: CatalogSource::parse(&catalog),
            search: SearchOptions {
                threshold,
                limit,
                context_chars: cli
                    .context
                    .or(file.context_chars)
                    .unwrap_or(defaults.context_chars),
            },
            debounce,
            route: cli.route.as_deref().map(Route::parse).unwrap_or_default(),
            data_dir: cli.data_dir.unwrap_or(default_data_dir),
        })
    }
}
