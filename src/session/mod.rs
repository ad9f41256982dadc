//! Browser page session.
//!
//! The crawl drives a single browser page through the [`PageSession`]
//! trait. [`ChromeSession`] is the chromiumoxide-backed implementation; the
//! fetchers only ever see the trait.
//!
//! # Usage
//!
//! ```rust,ignore
//! use stayscan::session::{ChromeSession, PageSession, SessionConfig};
//!
//! let mut session = ChromeSession::launch(SessionConfig::default()).await?;
//! session.navigate("https://www.airbnb.co.kr/rooms/42").await?;
//! session.wait_until_network_idle().await?;
//! let html = session.content().await?;
//! session.close().await?;
//! ```

mod chrome;
mod config;
mod script;

#[cfg(test)]
pub(crate) mod mock;

pub use chrome::ChromeSession;
pub use config::SessionConfig;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::app::Result;

/// Page action whose network traffic a capture listens to.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureTrigger {
    /// Load a URL in the page
    Navigate(String),
    /// Click the first element matching a CSS selector
    Click(String),
}

/// Whether a control can be activated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementState {
    Missing,
    Disabled,
    Enabled,
}

/// One browser page, used strictly sequentially.
#[async_trait]
pub trait PageSession: Send + Sync {
    /// Load `url` in the page
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Wait until the page has stopped issuing requests
    async fn wait_until_network_idle(&self) -> Result<()>;

    /// Serialized HTML of the current document
    async fn content(&self) -> Result<String>;

    /// Perform `trigger` and return the JSON body of the first response
    /// whose URL contains `url_pattern`.
    ///
    /// Returns `Ok(None)` when no such response arrives within `timeout`
    /// or its body is not JSON.
    async fn capture_response(
        &self,
        url_pattern: &str,
        timeout: Duration,
        trigger: CaptureTrigger,
    ) -> Result<Option<Value>>;

    async fn element_state(&self, selector: &str) -> Result<ElementState>;

    async fn click(&self, selector: &str) -> Result<()>;

    /// `scrollHeight` of the first element matching `selector`
    async fn scroll_height(&self, selector: &str) -> Result<Option<f64>>;

    /// Scroll the first element matching `selector` to its bottom.
    /// Returns false when no element matches.
    async fn scroll_to_bottom(&self, selector: &str) -> Result<bool>;

    /// Release the browser
    async fn close(&mut self) -> Result<()>;
}
