use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the browser session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Whether to run the browser in headless mode (default: true)
    pub headless: bool,

    /// Chrome/Chromium binary to launch instead of the one found in PATH
    pub executable: Option<PathBuf>,

    /// Page load timeout in seconds (default: 30)
    pub timeout_secs: u64,

    /// Settle time after navigation before the network is treated as idle,
    /// in milliseconds (default: 2000)
    pub wait_after_load_ms: u64,

    /// Browser window size in pixels (default: 1280x1024)
    pub window_width: u32,
    pub window_height: u32,

    /// User agent string to use
    pub user_agent: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            headless: true,
            executable: None,
            timeout_secs: 30,
            wait_after_load_ms: 2000,
            window_width: 1280,
            window_height: 1024,
            user_agent: Some(
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                    .to_string(),
            ),
        }
    }
}

impl SessionConfig {
    /// Get the page load timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get the wait time after load as a Duration
    pub fn wait_after_load(&self) -> Duration {
        Duration::from_millis(self.wait_after_load_ms)
    }

    /// Same settings with a visible browser window, useful when selectors
    /// need debugging
    pub fn headed(self) -> Self {
        Self {
            headless: false,
            ..self
        }
    }
}
