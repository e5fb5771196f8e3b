//! Configuration management with TOML, environment variables, and CLI overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Default site root.
pub const DEFAULT_BASE_URL: &str = "https://www.gsmarena.com";

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Site root; overridden in tests to point at a mock server
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Page fetching strategy
    #[serde(default)]
    pub transport: TransportKind,

    /// Proxy URL (e.g., socks5://host:port)
    #[serde(default)]
    pub proxy: Option<String>,

    /// Minimum spacing between requests in milliseconds
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,

    /// Lower bound of random jitter added after spacing
    #[serde(default = "default_jitter_min_ms")]
    pub jitter_min_ms: u64,

    /// Upper bound (exclusive) of random jitter
    #[serde(default = "default_jitter_max_ms")]
    pub jitter_max_ms: u64,

    /// Attempts per request when throttled, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Ceiling for a single fetch
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// How long the browser transport waits for the page marker
    #[serde(default = "default_browser_wait_secs")]
    pub browser_wait_secs: u64,

    /// Maximum devices per search (capped at 5)
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Detail pages fetched concurrently
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Cache location; defaults to the platform cache dir
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    /// Cache entry lifetime in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Bypass the cache entirely
    #[serde(default)]
    pub no_cache: bool,

    /// Output format
    #[serde(default)]
    pub format: OutputFormat,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_min_interval_ms() -> u64 {
    5000
}

fn default_jitter_min_ms() -> u64 {
    1000
}

fn default_jitter_max_ms() -> u64 {
    3000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_browser_wait_secs() -> u64 {
    10
}

fn default_max_results() -> usize {
    5
}

fn default_concurrency() -> usize {
    2
}

fn default_cache_ttl_secs() -> u64 {
    24 * 60 * 60
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            transport: TransportKind::Http,
            proxy: None,
            min_interval_ms: default_min_interval_ms(),
            jitter_min_ms: default_jitter_min_ms(),
            jitter_max_ms: default_jitter_max_ms(),
            max_attempts: default_max_attempts(),
            timeout_secs: default_timeout_secs(),
            browser_wait_secs: default_browser_wait_secs(),
            max_results: default_max_results(),
            concurrency: default_concurrency(),
            cache_dir: None,
            cache_ttl_secs: default_cache_ttl_secs(),
            no_cache: false,
            format: OutputFormat::Table,
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        // 1. Explicit path takes precedence
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        // 2. Try current directory
        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        // 3. Try XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("gsm-crawler").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        // 4. Return default config
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(proxy) = std::env::var("GSM_PROXY") {
            self.proxy = Some(proxy);
        }

        if let Ok(delay) = std::env::var("GSM_DELAY") {
            if let Ok(d) = delay.parse() {
                self.min_interval_ms = d;
            }
        }

        if let Ok(transport) = std::env::var("GSM_TRANSPORT") {
            if let Ok(t) = transport.parse() {
                self.transport = t;
            }
        }

        if let Ok(dir) = std::env::var("GSM_CACHE_DIR") {
            self.cache_dir = Some(PathBuf::from(dir));
        }

        self
    }

    /// Removes all pacing, for tests and local fixtures.
    pub fn without_delays(mut self) -> Self {
        self.min_interval_ms = 0;
        self.jitter_min_ms = 0;
        self.jitter_max_ms = 0;
        self
    }

    /// Resolved cache directory.
    pub fn cache_path(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir().unwrap_or_else(std::env::temp_dir).join("gsm-crawler")
        })
    }

    /// Cache entry lifetime.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Fetch ceiling.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Page fetching strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Plain HTTP with browser TLS emulation
    #[default]
    Http,
    /// Headless Chromium (requires the `browser` feature)
    Browser,
}

impl std::str::FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "http" => Ok(TransportKind::Http),
            "browser" | "chrome" => Ok(TransportKind::Browser),
            _ => Err(format!("Unknown transport: {}. Use: http, browser", s)),
        }
    }
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportKind::Http => write!(f, "http"),
            TransportKind::Browser => write!(f, "browser"),
        }
    }
}

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Markdown,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use: table, json, markdown, csv", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}
