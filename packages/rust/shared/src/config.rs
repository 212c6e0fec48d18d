//! Application configuration for ordertrack.
//!
//! User config lives at `~/.ordertrack/ordertrack.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{OrderTrackError, Result};
use crate::types::DEFAULT_SOURCE_TAG;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "ordertrack.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".ordertrack";

/// Desktop browser identification; the origin rejects non-browser clients.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

// ---------------------------------------------------------------------------
// Config structs (matching ordertrack.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where and how to fetch orders.
    #[serde(default)]
    pub source: SourceConfig,

    /// Ingestion behaviour.
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Order store location.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Daily trigger for scheduled mode.
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

/// `[source]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Listing page address.
    #[serde(default = "default_listing_url")]
    pub listing_url: String,

    /// Provenance tag stored on every record.
    #[serde(default = "default_source_tag")]
    pub source_tag: String,

    /// `User-Agent` header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// CSS selector for the listing's post-title headings.
    #[serde(default = "default_title_selector")]
    pub title_selector: String,

    /// CSS selector for the detail page's time marker.
    #[serde(default = "default_time_selector")]
    pub time_selector: String,

    /// CSS selector for the detail page's primary content container.
    #[serde(default = "default_content_selector")]
    pub content_selector: String,

    /// Per-request timeout. Unset means the HTTP client's defaults apply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            listing_url: default_listing_url(),
            source_tag: default_source_tag(),
            user_agent: default_user_agent(),
            title_selector: default_title_selector(),
            time_selector: default_time_selector(),
            content_selector: default_content_selector(),
            request_timeout_secs: None,
        }
    }
}

fn default_listing_url() -> String {
    "https://www.whitehouse.gov/presidential-actions".into()
}
fn default_source_tag() -> String {
    DEFAULT_SOURCE_TAG.into()
}
fn default_user_agent() -> String {
    BROWSER_USER_AGENT.into()
}
fn default_title_selector() -> String {
    "h2.wp-block-post-title".into()
}
fn default_time_selector() -> String {
    "time".into()
}
fn default_content_selector() -> String {
    "main".into()
}

/// What to do on reaching a title that is already stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnKnown {
    /// Stop iterating; everything older is assumed stored.
    #[default]
    Stop,
    /// Skip the known candidate and keep checking the rest.
    Skip,
}

/// `[ingest]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Politeness pause after the candidate loop, in milliseconds.
    #[serde(default = "default_request_delay")]
    pub request_delay_ms: u64,

    /// Known-title policy.
    #[serde(default)]
    pub on_known: OnKnown,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            request_delay_ms: default_request_delay(),
            on_known: OnKnown::default(),
        }
    }
}

fn default_request_delay() -> u64 {
    1000
}

/// `[storage]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Database file path. A leading `~/` expands to the home directory.
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

fn default_db_path() -> String {
    format!("~/{CONFIG_DIR_NAME}/orders.db")
}

impl StorageConfig {
    /// The database path with `~/` expanded.
    pub fn resolved_db_path(&self) -> Result<PathBuf> {
        match self.db_path.strip_prefix("~/") {
            Some(rest) => {
                let home = dirs::home_dir().ok_or_else(|| {
                    OrderTrackError::config("could not determine home directory")
                })?;
                Ok(home.join(rest))
            }
            None => Ok(PathBuf::from(&self.db_path)),
        }
    }
}

/// `[schedule]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Local wall-clock time of the daily run, `HH:MM`.
    #[serde(default = "default_run_at")]
    pub run_at: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            run_at: default_run_at(),
        }
    }
}

fn default_run_at() -> String {
    "00:00".into()
}

impl AppConfig {
    /// Check values that serde cannot check on its own.
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.source.listing_url).map_err(|e| {
            OrderTrackError::config(format!(
                "invalid listing_url '{}': {e}",
                self.source.listing_url
            ))
        })?;

        for (name, value) in [
            ("title_selector", &self.source.title_selector),
            ("time_selector", &self.source.time_selector),
            ("content_selector", &self.source.content_selector),
        ] {
            if value.trim().is_empty() {
                return Err(OrderTrackError::config(format!("{name} must not be empty")));
            }
        }

        NaiveTime::parse_from_str(&self.schedule.run_at, "%H:%M").map_err(|e| {
            OrderTrackError::config(format!(
                "invalid schedule.run_at '{}' (expected HH:MM): {e}",
                self.schedule.run_at
            ))
        })?;

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.ordertrack/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| OrderTrackError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.ordertrack/ordertrack.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| OrderTrackError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        OrderTrackError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    config.validate()?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let path = config_file_path()?;
    init_config_at(&path)?;
    Ok(path)
}

/// Write a default config file at `path`, creating parent directories.
pub fn init_config_at(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| OrderTrackError::io(dir, e))?;
    }

    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| OrderTrackError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| OrderTrackError::io(path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(())
}
