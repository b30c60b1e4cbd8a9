//! Application configuration loading for CLI defaults.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use bookswipe_core::catalog::{
    DEFAULT_CATALOG_BASE_URL, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_READ_TIMEOUT_SECS,
};
use bookswipe_core::enrich::DEFAULT_COVER_TIMEOUT;
use bookswipe_core::sourcing::DEFAULT_SUBJECT_PAGE_SIZE;
use bookswipe_core::suggest::{DEFAULT_SUGGESTION_BASE_URL, DEFAULT_SUGGESTION_MODEL};
use bookswipe_core::{DEFAULT_REFILL_THRESHOLD, DatabaseOptions, HttpSettings};
use serde::Deserialize;

use crate::cli::Args;

/// Database file used when neither the CLI nor the config file names one.
pub const DEFAULT_DATABASE_FILE: &str = "bookswipe.db";

/// TOML-backed file configuration for bookswipe defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// `SQLite` database holding profiles and books.
    pub database_path: Option<PathBuf>,
    /// Open Library base URL.
    pub catalog_base_url: Option<String>,
    /// Cover lookup service base URL; cover lookups are off when unset.
    pub cover_service_url: Option<String>,
    /// Per-candidate cover lookup budget in milliseconds.
    pub cover_timeout_ms: Option<u64>,
    pub suggestion_model: Option<String>,
    pub suggestion_base_url: Option<String>,
    /// Works requested per subject page.
    pub subject_page_size: Option<u32>,
    /// Queue size below which a swipe refills the queue.
    pub refill_threshold: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
    pub read_timeout_secs: Option<u64>,
    /// Optional database pool max connections (1..=20).
    pub db_max_connections: Option<u32>,
    /// Optional database busy timeout in milliseconds.
    pub db_busy_timeout_ms: Option<u32>,
}

impl FileConfig {
    /// Validates config values against runtime constraints.
    pub fn validate(&self) -> Result<()> {
        validate_url("catalog_base_url", self.catalog_base_url.as_deref())?;
        validate_url("cover_service_url", self.cover_service_url.as_deref())?;
        validate_url("suggestion_base_url", self.suggestion_base_url.as_deref())?;

        if let Some(ms) = self.cover_timeout_ms
            && !(1..=60_000).contains(&ms)
        {
            bail!("Invalid config value for `cover_timeout_ms`: {ms}. Expected range: 1..=60000");
        }
        if let Some(size) = self.subject_page_size
            && !(1..=100).contains(&size)
        {
            bail!("Invalid config value for `subject_page_size`: {size}. Expected range: 1..=100");
        }
        if let Some(threshold) = self.refill_threshold
            && threshold > 100
        {
            bail!(
                "Invalid config value for `refill_threshold`: {threshold}. Expected range: 0..=100"
            );
        }
        if let Some(model) = &self.suggestion_model
            && model.trim().is_empty()
        {
            bail!("Invalid config value for `suggestion_model`: must not be empty");
        }
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;
        validate_db_max_connections(self.db_max_connections)?;
        validate_db_busy_timeout_ms(self.db_busy_timeout_ms)?;

        Ok(())
    }
}

fn validate_url(field: &str, value: Option<&str>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    let parsed = url::Url::parse(value)
        .with_context(|| format!("Invalid config value for `{field}`: '{value}' is not a URL"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        bail!("Invalid config value for `{field}`: '{value}'. Expected an http(s) URL");
    }
    Ok(())
}

fn validate_db_max_connections(value: Option<u32>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=20).contains(&value) {
        bail!("Invalid config value for `db_max_connections`: {value}. Expected range: 1..=20");
    }
    Ok(())
}

fn validate_db_busy_timeout_ms(value: Option<u32>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if value > 120_000 {
        bail!("Invalid config value for `db_busy_timeout_ms`: {value}. Expected range: 0..=120000");
    }
    Ok(())
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/bookswipe/config.toml`
/// 2. `$HOME/.config/bookswipe/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    config_path_from(env_var_non_empty_os("XDG_CONFIG_HOME"), env_var_non_empty_os("HOME"))
}

fn config_path_from(xdg_config_home: Option<OsString>, home: Option<OsString>) -> Option<PathBuf> {
    if let Some(xdg_config_home) = xdg_config_home {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("bookswipe")
                .join("config.toml"),
        );
    }
    Some(
        PathBuf::from(home?)
            .join(".config")
            .join("bookswipe")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from `explicit` when given (it must exist), else from the
/// default path if present.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        let config = load_file_config(path)?;
        return Ok(LoadedConfig {
            path: Some(path.to_path_buf()),
            config: Some(config),
        });
    }

    let path = resolve_default_config_path();
    let config = match path.as_deref() {
        Some(path_ref) if path_ref.exists() => Some(load_file_config(path_ref)?),
        _ => None,
    };
    Ok(LoadedConfig { path, config })
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let config: FileConfig = toml::from_str(raw)?;
    config.validate()?;
    Ok(config)
}

/// Effective settings after applying CLI > config file > built-in defaults.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub database_path: PathBuf,
    pub database: DatabaseOptions,
    pub http: HttpSettings,
    pub catalog_base_url: String,
    pub cover_service_url: Option<String>,
    pub cover_timeout: Duration,
    pub suggestion_model: String,
    pub suggestion_base_url: String,
    pub suggest_api_key: Option<String>,
    pub subject_page_size: u32,
    pub refill_threshold: u64,
}

impl RuntimeConfig {
    /// Merges CLI arguments over an optional file config.
    #[must_use]
    pub fn resolve(args: &Args, file: Option<&FileConfig>) -> Self {
        let file = file.cloned().unwrap_or_default();
        let defaults = DatabaseOptions::default();
        Self {
            database_path: args
                .db
                .clone()
                .or(file.database_path)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_FILE)),
            database: DatabaseOptions {
                max_connections: file.db_max_connections.unwrap_or(defaults.max_connections),
                busy_timeout_ms: file.db_busy_timeout_ms.unwrap_or(defaults.busy_timeout_ms),
            },
            http: HttpSettings::with_timeouts(
                file.connect_timeout_secs.unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
                file.read_timeout_secs.unwrap_or(DEFAULT_READ_TIMEOUT_SECS),
            ),
            catalog_base_url: args
                .catalog_url
                .clone()
                .or(file.catalog_base_url)
                .unwrap_or_else(|| DEFAULT_CATALOG_BASE_URL.to_string()),
            cover_service_url: args.cover_url.clone().or(file.cover_service_url),
            cover_timeout: file
                .cover_timeout_ms
                .map_or(DEFAULT_COVER_TIMEOUT, Duration::from_millis),
            suggestion_model: file
                .suggestion_model
                .unwrap_or_else(|| DEFAULT_SUGGESTION_MODEL.to_string()),
            suggestion_base_url: file
                .suggestion_base_url
                .unwrap_or_else(|| DEFAULT_SUGGESTION_BASE_URL.to_string()),
            suggest_api_key: args
                .suggest_api_key
                .clone()
                .filter(|key| !key.trim().is_empty()),
            subject_page_size: file.subject_page_size.unwrap_or(DEFAULT_SUBJECT_PAGE_SIZE),
            refill_threshold: file.refill_threshold.unwrap_or(DEFAULT_REFILL_THRESHOLD),
        }
    }
}
