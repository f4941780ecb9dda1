//! Application configuration.
//!
//! Sources, later ones winning:
//! 1. built-in defaults
//! 2. TOML file (`--config`, else `TARCHIVE_CONFIG`, else `config/default.toml`)
//! 3. `TARCHIVE__<SECTION>__<KEY>` environment variables

use crate::error::{AppError, AppResult};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tarchive_export::ExportConfig;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
pub const CONFIG_PATH_ENV: &str = "TARCHIVE_CONFIG";
const ENV_PREFIX: &str = "TARCHIVE";

/// Archive storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Root of the date-partitioned archive tree.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_data_dir() -> String {
    "./data/tokens".to_string()
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Telemetry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info,tarchive=debug".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Archive storage.
    #[serde(default)]
    pub archive: ArchiveConfig,
    /// Export HTTP server.
    #[serde(default)]
    pub export: ExportConfig,
    /// Logging.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration.
    ///
    /// An explicit path (argument or `TARCHIVE_CONFIG`) must exist; the
    /// default path is optional.
    pub fn load(explicit_path: Option<&str>) -> AppResult<Self> {
        let explicit = explicit_path
            .map(str::to_string)
            .or_else(|| std::env::var(CONFIG_PATH_ENV).ok());

        let (path, required) = match explicit {
            Some(path) => (path, true),
            None => (DEFAULT_CONFIG_PATH.to_string(), false),
        };

        Self::from_sources(&path, required, Environment::with_prefix(ENV_PREFIX))
    }

    /// Load from a specific file, without environment overrides.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let config = Config::builder()
            .add_source(File::new(path, FileFormat::Toml))
            .build()?;
        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn from_sources(path: &str, required: bool, env: Environment) -> AppResult<Self> {
        let config = Config::builder()
            .add_source(File::new(path, FileFormat::Toml).required(required))
            .add_source(env.separator("__").try_parsing(true))
            .build()?;
        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that deserialize but cannot be used.
    pub fn validate(&self) -> AppResult<()> {
        self.export.validate().map_err(AppError::Config)
    }
}
