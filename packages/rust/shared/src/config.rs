//! Application configuration for cardtrack.
//!
//! User config lives at `~/.cardtrack/cardtrack.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::batch::DEFAULT_BATCH_SIZE;
use crate::error::{CardtrackError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "cardtrack.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".cardtrack";

// ---------------------------------------------------------------------------
// Config structs (matching cardtrack.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Dataset file locations.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Catalog site settings.
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Tournament statistics site settings.
    #[serde(default)]
    pub tournaments: TournamentsConfig,

    /// Delays enforced between external fetches.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Enrichment batching.
    #[serde(default)]
    pub batch: BatchConfig,

    /// HTTP client settings.
    #[serde(default)]
    pub http: HttpConfig,
}

/// `[paths]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// The persisted, append-only dataset.
    #[serde(default = "default_dataset")]
    pub dataset: String,

    /// The working subset carrying enrichment lookup keys.
    #[serde(default = "default_working_subset")]
    pub working_subset: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            dataset: default_dataset(),
            working_subset: default_working_subset(),
        }
    }
}

fn default_dataset() -> String {
    "original_data.csv".into()
}
fn default_working_subset() -> String {
    "working_data.csv".into()
}

/// `[catalog]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Root of the catalog; `Expansions/` and `Products/Singles/` hang off it.
    #[serde(default = "default_catalog_base")]
    pub base_url: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_catalog_base(),
        }
    }
}

fn default_catalog_base() -> String {
    "https://www.cardmarket.com/en/Pokemon/".into()
}

/// `[tournaments]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TournamentsConfig {
    /// Root of the per-card pages.
    #[serde(default = "default_tournaments_base")]
    pub base_url: String,

    /// Query string selecting the time window and formats.
    #[serde(default = "default_tournaments_query")]
    pub query: String,
}

impl Default for TournamentsConfig {
    fn default() -> Self {
        Self {
            base_url: default_tournaments_base(),
            query: default_tournaments_query(),
        }
    }
}

fn default_tournaments_base() -> String {
    "https://limitlesstcg.com/cards/".into()
}
fn default_tournaments_query() -> String {
    "time=1months&type=all&format=all&region=all&division=all".into()
}

/// `[rate_limit]` section. All values in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_crawl_min")]
    pub crawl_min_ms: u64,
    #[serde(default = "default_crawl_max")]
    pub crawl_max_ms: u64,
    #[serde(default = "default_enrich_min")]
    pub enrich_min_ms: u64,
    #[serde(default = "default_enrich_max")]
    pub enrich_max_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            crawl_min_ms: default_crawl_min(),
            crawl_max_ms: default_crawl_max(),
            enrich_min_ms: default_enrich_min(),
            enrich_max_ms: default_enrich_max(),
        }
    }
}

fn default_crawl_min() -> u64 {
    2_000
}
fn default_crawl_max() -> u64 {
    5_000
}
fn default_enrich_min() -> u64 {
    3_000
}
fn default_enrich_max() -> u64 {
    6_000
}

/// `[batch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    #[serde(default = "default_batch_size")]
    pub size: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            size: default_batch_size(),
        }
    }
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

/// `[http]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

// ---------------------------------------------------------------------------
// Runtime configs (resolved from AppConfig)
// ---------------------------------------------------------------------------

/// Inclusive bounds of the randomized delay before each fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    pub min: Duration,
    pub max: Duration,
}

impl DelayRange {
    /// Build a range from millisecond bounds; `min_ms > max_ms` is rejected.
    pub fn from_millis(min_ms: u64, max_ms: u64) -> Result<Self> {
        if min_ms > max_ms {
            return Err(CardtrackError::config(format!(
                "delay lower bound {min_ms}ms exceeds upper bound {max_ms}ms"
            )));
        }
        Ok(Self {
            min: Duration::from_millis(min_ms),
            max: Duration::from_millis(max_ms),
        })
    }

    /// No delay at all. Only meant for tests against local servers.
    pub fn none() -> Self {
        Self {
            min: Duration::ZERO,
            max: Duration::ZERO,
        }
    }
}

/// Runtime crawl configuration for catalog traversal.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Catalog root URL (always ends in `/`).
    pub catalog_base: Url,
    /// Delay before every catalog fetch.
    pub delay: DelayRange,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl TryFrom<&AppConfig> for CrawlConfig {
    type Error = CardtrackError;

    fn try_from(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            catalog_base: parse_base_url(&config.catalog.base_url)?,
            delay: DelayRange::from_millis(
                config.rate_limit.crawl_min_ms,
                config.rate_limit.crawl_max_ms,
            )?,
            timeout: Duration::from_secs(config.http.timeout_secs),
        })
    }
}

/// Runtime configuration shared by both enrichment passes.
#[derive(Debug, Clone)]
pub struct EnrichConfig {
    /// Tournament site root URL (always ends in `/`).
    pub tournaments_base: Url,
    /// Query string appended to every tournament page URL.
    pub tournaments_query: String,
    /// Delay before every secondary-page fetch.
    pub delay: DelayRange,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Number of indices per batch.
    pub batch_size: usize,
}

impl TryFrom<&AppConfig> for EnrichConfig {
    type Error = CardtrackError;

    fn try_from(config: &AppConfig) -> Result<Self> {
        if config.batch.size == 0 {
            return Err(CardtrackError::config("batch.size must be greater than zero"));
        }
        Ok(Self {
            tournaments_base: parse_base_url(&config.tournaments.base_url)?,
            tournaments_query: config.tournaments.query.clone(),
            delay: DelayRange::from_millis(
                config.rate_limit.enrich_min_ms,
                config.rate_limit.enrich_max_ms,
            )?,
            timeout: Duration::from_secs(config.http.timeout_secs),
            batch_size: config.batch.size,
        })
    }
}

/// Parse a base URL, forcing a trailing slash so `join` appends instead of replacing.
pub fn parse_base_url(raw: &str) -> Result<Url> {
    let with_slash = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    Url::parse(&with_slash).map_err(|e| CardtrackError::config(format!("invalid URL '{raw}': {e}")))
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.cardtrack/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| CardtrackError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.cardtrack/cardtrack.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| CardtrackError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| CardtrackError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| CardtrackError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| CardtrackError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| CardtrackError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
