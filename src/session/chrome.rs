use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    EventLoadingFinished, EventResponseReceived, GetResponseBodyParams,
};
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::app::{Result, StayscanError};
use crate::session::config::SessionConfig;
use crate::session::script::PageScript;
use crate::session::{CaptureTrigger, ElementState, PageSession};

fn browser_error<E: std::fmt::Display>(context: &'static str) -> impl FnOnce(E) -> StayscanError {
    move |e| StayscanError::Browser(format!("{}: {}", context, e))
}

/// Chrome-backed page session using chromiumoxide
pub struct ChromeSession {
    browser: Browser,
    handler: JoinHandle<()>,
    page: Page,
    config: SessionConfig,
}

impl ChromeSession {
    /// Launch Chrome and open the single page the crawl works in
    pub async fn launch(config: SessionConfig) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-software-rasterizer")
            .window_size(config.window_width, config.window_height)
            .request_timeout(config.timeout());

        if !config.headless {
            builder = builder.with_head();
        }

        if let Some(ref executable) = config.executable {
            builder = builder.chrome_executable(executable);
        }

        let browser_config = builder
            .build()
            .map_err(|e| StayscanError::Browser(format!("Failed to build browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| StayscanError::Browser(format!(
                "Failed to launch browser: {}. Is Chrome or Chromium installed and in PATH?",
                e
            )))?;

        // Spawn the browser handler
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler event error: {}", e);
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(browser_error("Failed to create page"))?;

        if let Some(ref ua) = config.user_agent {
            page.set_user_agent(ua)
                .await
                .map_err(browser_error("Failed to set user agent"))?;
        }

        info!("Browser session started (headless: {})", config.headless);

        Ok(Self {
            browser,
            handler,
            page,
            config,
        })
    }

    async fn perform(&self, trigger: &CaptureTrigger) -> Result<()> {
        match trigger {
            CaptureTrigger::Navigate(url) => self.navigate(url).await?,
            CaptureTrigger::Click(selector) => self.click(selector).await?,
        }
        self.wait_until_network_idle().await
    }

    async fn evaluate<T: serde::de::DeserializeOwned>(&self, script: String) -> Result<T> {
        self.page
            .evaluate(script)
            .await
            .map_err(browser_error("Script execution failed"))?
            .into_value()
            .map_err(browser_error("Failed to parse script result"))
    }

    fn decode_body(body: String, base64_encoded: bool) -> Option<Value> {
        let text = if base64_encoded {
            let bytes = STANDARD
                .decode(body.as_bytes())
                .map_err(|e| warn!("Captured response is not valid base64: {}", e))
                .ok()?;
            String::from_utf8(bytes)
                .map_err(|e| warn!("Captured response is not UTF-8: {}", e))
                .ok()?
        } else {
            body
        };

        serde_json::from_str(&text)
            .map_err(|e| warn!("Captured response is not JSON: {}", e))
            .ok()
    }
}

#[async_trait]
impl PageSession for ChromeSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        debug!("Navigating to {}", url);
        self.page
            .goto(url)
            .await
            .map_err(browser_error("Navigation failed"))?;
        Ok(())
    }

    async fn wait_until_network_idle(&self) -> Result<()> {
        self.page
            .wait_for_navigation()
            .await
            .map_err(browser_error("Navigation failed"))?;

        // Additional wait for requests fired after load
        tokio::time::sleep(self.config.wait_after_load()).await;
        Ok(())
    }

    async fn content(&self) -> Result<String> {
        self.page
            .content()
            .await
            .map_err(browser_error("Failed to read page content"))
    }

    async fn capture_response(
        &self,
        url_pattern: &str,
        timeout: Duration,
        trigger: CaptureTrigger,
    ) -> Result<Option<Value>> {
        // Subscribe before acting so the response cannot slip past
        let mut responses = self
            .page
            .event_listener::<EventResponseReceived>()
            .await
            .map_err(browser_error("Failed to listen for responses"))?;
        let mut finished = self
            .page
            .event_listener::<EventLoadingFinished>()
            .await
            .map_err(browser_error("Failed to listen for finished loads"))?;

        self.perform(&trigger).await?;

        let matching_request = async {
            let request_id = loop {
                let event = responses.next().await?;
                if event.response.url.contains(url_pattern) {
                    break event.request_id.clone();
                }
            };

            // The body is only complete once loading has finished
            while let Some(event) = finished.next().await {
                if event.request_id == request_id {
                    return Some(request_id);
                }
            }
            None
        };

        let request_id = match tokio::time::timeout(timeout, matching_request).await {
            Ok(Some(request_id)) => request_id,
            Ok(None) => {
                warn!("Event stream closed before a {} response arrived", url_pattern);
                return Ok(None);
            }
            Err(_) => {
                warn!(
                    "Timeout: no {} response captured within {:?}",
                    url_pattern, timeout
                );
                return Ok(None);
            }
        };

        let body = self
            .page
            .execute(GetResponseBodyParams::new(request_id))
            .await
            .map_err(browser_error("Failed to read response body"))?;

        Ok(Self::decode_body(
            body.result.body.clone(),
            body.result.base64_encoded,
        ))
    }

    async fn element_state(&self, selector: &str) -> Result<ElementState> {
        let state: String = self.evaluate(PageScript::element_state(selector)).await?;
        Ok(PageScript::parse_element_state(&state))
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.page
            .find_element(selector)
            .await
            .map_err(browser_error("Element not found"))?
            .click()
            .await
            .map_err(browser_error("Click failed"))?;
        Ok(())
    }

    async fn scroll_height(&self, selector: &str) -> Result<Option<f64>> {
        let height: f64 = self.evaluate(PageScript::scroll_height(selector)).await?;
        Ok(PageScript::parse_scroll_height(height))
    }

    async fn scroll_to_bottom(&self, selector: &str) -> Result<bool> {
        self.evaluate(PageScript::scroll_to_bottom(selector)).await
    }

    async fn close(&mut self) -> Result<()> {
        let closed = self
            .browser
            .close()
            .await
            .map_err(browser_error("Failed to close browser"));

        if closed.is_ok() {
            if let Err(e) = self.browser.wait().await {
                warn!("Browser process did not exit cleanly: {}", e);
            }
        }
        self.handler.abort();
        info!("Browser session closed");

        closed.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_plain_body() {
        let value = ChromeSession::decode_body(r#"{"data": 1}"#.to_string(), false);
        assert_eq!(value, Some(json!({ "data": 1 })));
    }

    #[test]
    fn test_decode_base64_body() {
        let encoded = STANDARD.encode(r#"{"data": [1, 2]}"#);
        let value = ChromeSession::decode_body(encoded, true);
        assert_eq!(value, Some(json!({ "data": [1, 2] })));
    }

    #[test]
    fn test_decode_non_json_body() {
        assert_eq!(ChromeSession::decode_body("<html>".to_string(), false), None);
        assert_eq!(ChromeSession::decode_body("%%%".to_string(), true), None);
    }
}
