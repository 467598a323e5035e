use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::transcribe::CollectionPolicy;
use crate::ScribeError;

/// Environment variable that overrides the configured API key
pub const API_KEY_ENV: &str = "YOUTUBE_API_KEY";

/// Largest page the Data API will return
pub const MAX_PAGE_SIZE: u32 = 50;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote API settings
    pub youtube: YoutubeConfig,

    /// Channel resolution settings
    pub resolver: ResolverConfig,

    /// Video listing settings
    pub listing: ListingConfig,

    /// Transcript collection policy
    pub collection: CollectionConfig,

    /// HTTP server settings
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YoutubeConfig {
    /// YouTube Data API key
    pub api_key: String,

    /// Data API base URL
    pub api_base_url: String,

    /// Caption languages, most preferred first
    pub caption_languages: Vec<String>,

    /// Timeout applied to every outbound request
    pub request_timeout_secs: u64,

    /// User agent sent with outbound requests
    pub user_agent: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Fall back to scraping the channel's video page for unrecognized URLs
    pub scrape_fallback: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    /// Videos requested per listing page (1-50)
    pub page_size: u32,

    /// Retries per page after the first failed attempt
    pub max_retries: u32,

    /// Backoff before the first retry, doubled on each further retry
    pub retry_backoff_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    /// Upper bound on videos listed and fetched per request
    pub max_videos: usize,

    /// Pause between consecutive caption fetches
    pub request_delay_ms: u64,

    /// Abort after this many failures in a row (0 never aborts)
    pub max_consecutive_failures: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base_url: "https://www.googleapis.com/youtube/v3".to_string(),
            caption_languages: vec!["ko".to_string(), "en".to_string()],
            request_timeout_secs: 30,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_size: MAX_PAGE_SIZE,
            max_retries: 2,
            retry_backoff_ms: 500,
        }
    }
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            max_videos: 10,
            request_delay_ms: 1000,
            max_consecutive_failures: 3,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Config {
    /// Load configuration from file, falling back to defaults, then apply the environment
    pub async fn load(explicit: Option<&Path>) -> Result<Self> {
        let config_path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::config_path().ok().filter(|path| path.exists()),
        };

        let mut config = match config_path {
            Some(path) => {
                tracing::debug!("Loading configuration from {}", path.display());
                Self::from_file(&path)?
            }
            None => Self::default(),
        };

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                config.youtube.api_key = key.trim().to_string();
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration file without applying the environment
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs_err::read_to_string(path).context("Failed to read config file")?;

        let config: Config = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Save configuration to file
    pub async fn save(&self, path: Option<&Path>) -> Result<PathBuf> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::config_path()?,
        };

        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs_err::create_dir_all(parent)?;
            }
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;

        fs_err::write(&config_path, content).context("Failed to write config file")?;

        Ok(config_path)
    }

    /// Get configuration file path
    pub fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir().context("Could not determine config directory")?;

        Ok(config_dir.join("channel-scribe").join("config.yaml"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.listing.page_size == 0 || self.listing.page_size > MAX_PAGE_SIZE {
            return Err(ScribeError::Config(format!(
                "listing.page_size must be between 1 and {}",
                MAX_PAGE_SIZE
            ))
            .into());
        }

        if self.collection.max_videos == 0 {
            return Err(ScribeError::Config("collection.max_videos must be greater than zero".to_string()).into());
        }

        if self.youtube.caption_languages.is_empty() {
            return Err(ScribeError::Config("youtube.caption_languages must list at least one language".to_string()).into());
        }

        if self.youtube.request_timeout_secs == 0 {
            return Err(ScribeError::Config("youtube.request_timeout_secs must be greater than zero".to_string()).into());
        }

        Ok(())
    }

    /// Collection policy derived from the `collection` section
    pub fn collection_policy(&self) -> CollectionPolicy {
        CollectionPolicy {
            max_videos: self.collection.max_videos,
            request_delay: Duration::from_millis(self.collection.request_delay_ms),
            max_consecutive_failures: self.collection.max_consecutive_failures,
        }
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!(
            "  API Key: {}",
            if self.youtube.api_key.is_empty() { "(not set)" } else { "(set)" }
        );
        println!("  API Base URL: {}", self.youtube.api_base_url);
        println!("  Caption Languages: {}", self.youtube.caption_languages.join(", "));
        println!("  Request Timeout: {}s", self.youtube.request_timeout_secs);
        println!("  Scrape Fallback: {}", self.resolver.scrape_fallback);
        println!("  Listing Page Size: {}", self.listing.page_size);
        println!("  Max Videos: {}", self.collection.max_videos);
        println!("  Request Delay: {}ms", self.collection.request_delay_ms);
        println!("  Max Consecutive Failures: {}", self.collection.max_consecutive_failures);
        println!("  Server: {}:{}", self.server.host, self.server.port);
    }
}
