use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

pub mod defaults;

use defaults::*;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub ingestion: IngestionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    pub max_connections: Option<u32>,
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Delimited sales file reloaded by every refresh
    #[serde(default = "default_csv_path")]
    pub csv_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Log loader progress every N rows
    #[serde(default = "default_progress_update_interval")]
    pub progress_update_interval: usize,
    /// Upper bound on one row's unit of work
    #[serde(default = "default_row_timeout")]
    pub row_timeout: String,
    /// Upper bound on a whole truncate-and-reload cycle
    #[serde(default = "default_refresh_timeout")]
    pub refresh_timeout: String,
    #[serde(default = "default_refresh_on_startup")]
    pub refresh_on_startup: bool,
}

fn default_database_url() -> String {
    DEFAULT_DATABASE_URL.to_string()
}

fn default_busy_timeout() -> String {
    humantime::format_duration(DEFAULT_BUSY_TIMEOUT).to_string()
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_csv_path() -> PathBuf {
    PathBuf::from(DEFAULT_CSV_PATH)
}

fn default_progress_update_interval() -> usize {
    DEFAULT_PROGRESS_UPDATE_INTERVAL
}

fn default_row_timeout() -> String {
    humantime::format_duration(DEFAULT_ROW_TIMEOUT).to_string()
}

fn default_refresh_timeout() -> String {
    humantime::format_duration(DEFAULT_REFRESH_TIMEOUT).to_string()
}

fn default_refresh_on_startup() -> bool {
    DEFAULT_REFRESH_ON_STARTUP
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: Some(DEFAULT_MAX_CONNECTIONS),
            busy_timeout: default_busy_timeout(),
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            csv_path: default_csv_path(),
        }
    }
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            progress_update_interval: default_progress_update_interval(),
            row_timeout: default_row_timeout(),
            refresh_timeout: default_refresh_timeout(),
            refresh_on_startup: default_refresh_on_startup(),
        }
    }
}

fn parse_duration(field: &str, value: &str) -> Result<Duration> {
    humantime::parse_duration(value)
        .with_context(|| format!("Invalid duration for {}: '{}'", field, value))
}

impl DatabaseConfig {
    pub fn busy_timeout(&self) -> Result<Duration> {
        parse_duration("database.busy_timeout", &self.busy_timeout)
    }

    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }
}

impl IngestionConfig {
    pub fn row_timeout(&self) -> Result<Duration> {
        parse_duration("ingestion.row_timeout", &self.row_timeout)
    }

    pub fn refresh_timeout(&self) -> Result<Duration> {
        parse_duration("ingestion.refresh_timeout", &self.refresh_timeout)
    }
}

impl Config {
    /// Load configuration from `path`, then apply `SALES_LOADER__*`
    /// environment overrides.
    ///
    /// A missing file is created with the defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            let contents = toml::to_string_pretty(&Self::default())?;
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, contents)
                .with_context(|| format!("Failed to write default config to {}", path.display()))?;
            info!("Wrote default configuration to {}", path.display());
        }

        let config: Self = ::config::Config::builder()
            .add_source(::config::File::from(path).format(::config::FileFormat::Toml))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path.display()))?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.database.busy_timeout()?;
        self.ingestion.row_timeout()?;
        self.ingestion.refresh_timeout()?;

        if self.ingestion.progress_update_interval == 0 {
            anyhow::bail!("ingestion.progress_update_interval must be greater than zero");
        }
        if self.database.max_connections == Some(0) {
            anyhow::bail!("database.max_connections must be greater than zero");
        }

        Ok(())
    }
}
