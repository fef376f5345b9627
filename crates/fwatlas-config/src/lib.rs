//! Layered configuration for fwatlas.
//!
//! TOML file + `FWATLAS_*` environment variables over built-in defaults,
//! validated and translated to `fwatlas_core::EngineSettings`. Embedders
//! load once at startup and hand the settings to the service.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use fwatlas_core::EngineSettings;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub paging: PageDefaults,
}

#[derive(Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct CacheSettings {
    /// Seconds a built graph stays fresh before the next read rebuilds.
    #[serde(default = "default_max_age_secs")]
    pub max_age_secs: u64,

    /// Milliseconds the health probe waits on the cache before
    /// reporting unhealthy.
    #[serde(default = "default_health_timeout_ms")]
    pub health_timeout_ms: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_age_secs: default_max_age_secs(),
            health_timeout_ms: default_health_timeout_ms(),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct PageDefaults {
    /// Page size used when a query paginates without naming one.
    #[serde(default = "default_page_size")]
    pub default_page_size: i64,

    /// Hard ceiling on caller-supplied page sizes.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: i64,
}

impl Default for PageDefaults {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

fn default_max_age_secs() -> u64 {
    30
}
fn default_health_timeout_ms() -> u64 {
    2000
}
fn default_page_size() -> i64 {
    50
}
fn default_max_page_size() -> i64 {
    500
}

impl Config {
    /// Check cross-field constraints the type system cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.max_age_secs == 0 {
            return Err(ConfigError::Validation {
                field: "cache.max_age_secs".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.cache.health_timeout_ms == 0 {
            return Err(ConfigError::Validation {
                field: "cache.health_timeout_ms".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.paging.default_page_size <= 0 {
            return Err(ConfigError::Validation {
                field: "paging.default_page_size".into(),
                reason: "must be positive".into(),
            });
        }
        if self.paging.max_page_size < self.paging.default_page_size {
            return Err(ConfigError::Validation {
                field: "paging.max_page_size".into(),
                reason: "must be at least default_page_size".into(),
            });
        }
        Ok(())
    }

    /// Translate to the engine's runtime settings.
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            max_age: Duration::from_secs(self.cache.max_age_secs),
            health_timeout: Duration::from_millis(self.cache.health_timeout_ms),
            default_page_size: self.paging.default_page_size,
            max_page_size: self.paging.max_page_size,
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "fwatlas", "fwatlas").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("fwatlas");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load and validate config from the canonical path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load and validate config from an explicit file path + environment.
///
/// Env vars use a double underscore between section and key:
/// `FWATLAS_CACHE__MAX_AGE_SECS=10`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("FWATLAS_").split("__"));

    let config: Config = figment.extract()?;
    config.validate()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(())
}

// ── Tests ───────────────────────────────────────────────────────────
