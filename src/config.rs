//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.sprintboard.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = ".sprintboard.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// ClickUp API settings.
    #[serde(default)]
    pub clickup: ClickUpConfig,

    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Periodic refresh settings.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Where refresh results are written.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// ClickUp API settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct ClickUpConfig {
    /// API base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Team (workspace) id whose spaces are scanned.
    #[serde(default)]
    pub team_id: Option<String>,

    /// Personal API token. Prefer the API_TOKEN environment variable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Number of lists whose tasks are fetched at the same time.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Include closed tasks.
    #[serde(default = "default_true")]
    pub include_closed: bool,
}

impl Default for ClickUpConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            team_id: None,
            api_token: None,
            timeout_seconds: default_timeout(),
            concurrency: default_concurrency(),
            include_closed: true,
        }
    }
}

impl std::fmt::Debug for ClickUpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClickUpConfig")
            .field("api_url", &self.api_url)
            .field("team_id", &self.team_id)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("timeout_seconds", &self.timeout_seconds)
            .field("concurrency", &self.concurrency)
            .field("include_closed", &self.include_closed)
            .finish()
    }
}

fn default_api_url() -> String {
    "https://api.clickup.com/api/v2".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_concurrency() -> usize {
    4
}

fn default_true() -> bool {
    true
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Static HTML page served at "/" instead of the rendered report.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_page: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            report_page: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8081
}

/// Periodic refresh settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Run the periodic refresh at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Minutes between refreshes.
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,

    /// Refresh immediately at startup instead of after the first interval.
    #[serde(default = "default_true")]
    pub refresh_on_startup: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_minutes: default_interval_minutes(),
            refresh_on_startup: true,
        }
    }
}

fn default_interval_minutes() -> u64 {
    60
}

/// Longest accepted refresh interval: one year.
const MAX_INTERVAL_MINUTES: u64 = 60 * 24 * 365;

impl SchedulerConfig {
    /// Time between refreshes, kept within one minute and one year.
    pub fn refresh_period(&self) -> Duration {
        let minutes = self.interval_minutes.clamp(1, MAX_INTERVAL_MINUTES);
        Duration::from_secs(minutes.saturating_mul(60))
    }
}

/// Output location settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for the JSON and CSV artifacts.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("fetched_sprints_data")
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments (and their environment variables) take precedence,
    /// but only when they were actually provided.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref token) = args.api_token {
            self.clickup.api_token = Some(token.clone());
        }
        if let Some(ref team_id) = args.team_id {
            self.clickup.team_id = Some(team_id.clone());
        }
        if let Some(ref api_url) = args.api_url {
            self.clickup.api_url = api_url.clone();
        }

        if let Some(ref host) = args.host {
            self.server.host = host.clone();
        }
        if let Some(port) = args.port {
            self.server.port = port;
        }
        if let Some(ref page) = args.report_page {
            self.server.report_page = Some(page.clone());
        }

        if let Some(minutes) = args.interval_minutes {
            self.scheduler.interval_minutes = minutes;
        }
        if args.no_scheduler {
            self.scheduler.enabled = false;
        }

        if let Some(ref dir) = args.data_dir {
            self.storage.data_dir = dir.clone();
        }
    }

    /// Runtime settings for the ClickUp collector.
    pub fn collector_config(&self) -> crate::collector::CollectorConfig {
        crate::collector::CollectorConfig {
            api_url: self.clickup.api_url.clone(),
            team_id: self.clickup.team_id.clone().unwrap_or_default(),
            api_token: self.clickup.api_token.clone().unwrap_or_default(),
            timeout_seconds: self.clickup.timeout_seconds,
            concurrency: self.clickup.concurrency,
            include_closed: self.clickup.include_closed,
        }
    }

    /// Socket address string for the HTTP server.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
