//! Configuration management for stayscan.
//!
//! Configuration is read from `~/.config/stayscan/config.toml` (or the path
//! given with `--config`). If the file doesn't exist, a default configuration
//! with comments is created.

pub mod crawl;
pub mod source;

pub use crawl::CrawlPolicy;
pub use source::SourceConfig;

use crate::session::SessionConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Main configuration struct.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub browser: SessionConfig,
    pub source: SourceConfig,
    pub crawl: CrawlPolicy,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file; defaults to `<data dir>/stayscan/stayscan.db`
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// If the config file exists but is invalid, returns an error.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, creating it when missing.
    pub fn load_from(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            Self::create_default_config(config_path)?;
            return Ok(Self::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::Io {
            path: config_path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: config_path.to_path_buf(),
            source: e,
        })?;

        Ok(config)
    }

    /// Get the default config file path: `~/.config/stayscan/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("stayscan").join("config.toml"))
    }

    /// Create a default config file with comments.
    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        r##"# stayscan configuration
#
# Every key is optional; missing keys fall back to the values shown here.

[browser]
# Run Chrome without a visible window
headless = true

# Chrome/Chromium binary (default: first one found in PATH)
# executable = "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"

# Navigation timeout in seconds
timeout_secs = 30

# Settle time after navigation before the page counts as idle (milliseconds)
wait_after_load_ms = 2000

window_width = 1280
window_height = 1024

[source]
base_url = "https://www.airbnb.co.kr"
zoom = 12

# Searched check-in is today + this many days; check-out is one day later
checkin_offset_days = 7

search_response_pattern = "StaysSearch"
next_page_selector = "[aria-label='다음']"
unavailable_marker = "예약 불가능합니다"
show_all_reviews_selector = "button[data-testid='pdp-show-all-reviews-button']"
review_container_selector = "[data-testid='pdp-reviews-modal-scrollable-panel']"
review_text_selector = "[data-review-id] span[class] > span"

[crawl]
# Pauses against anti-scraping defenses (milliseconds)
region_delay_ms = 3000
page_delay_ms = 3000

# Wait for the structured search response before treating a page as empty
capture_timeout_ms = 8000

# The source shows at most 15 pages of 18 results
max_pages = 15

# Split a region into quadrants once this many listings are found or reported
saturation_threshold = 250

# Stop splitting below this depth or below this span (degrees)
max_depth = 16
min_region_span = 0.0001

# Review list expansion
max_review_scrolls = 50
review_settle_ms = 1500

[database]
# path = "/var/lib/stayscan/stayscan.db"
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
