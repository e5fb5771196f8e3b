//! Headless Chromium transport for pages that only render with script.
//!
//! One browser process per transport. Each fetch opens a tab, checks the
//! document response status, waits for a known page marker, reads the
//! rendered document and closes the tab.
//! Callers must call [`Transport::close`]; dropping without it only aborts
//! the CDP handler task.

use crate::config::Config;
use crate::error::TransportError;
use crate::gsmarena::selectors::{detail, results, RESULTS_READY_MARKER};
use crate::gsmarena::transport::{build_url, Transport};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{EventResponseReceived, ResourceType};
use chromiumoxide::listeners::EventStream;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// How long to wait for the document response event after navigation.
const RESPONSE_WAIT: Duration = Duration::from_secs(2);

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

fn browser_err(err: impl std::fmt::Display) -> TransportError {
    TransportError::Browser(err.to_string())
}

/// Status of the main document response, if one arrives in time.
async fn document_status(responses: &mut EventStream<EventResponseReceived>) -> Option<i64> {
    tokio::time::timeout(RESPONSE_WAIT, async {
        while let Some(event) = responses.next().await {
            if event.r#type == ResourceType::Document {
                return Some(event.response.status);
            }
        }
        None
    })
    .await
    .ok()
    .flatten()
}

/// Maps a navigation status onto the same errors the HTTP transport raises.
fn check_status(status: i64, url: &str) -> Result<(), TransportError> {
    match u16::try_from(status) {
        Ok(code) if (200..300).contains(&code) => Ok(()),
        Ok(code) => {
            let err = TransportError::from_status(code, url);
            if err.is_throttled() {
                warn!("Throttled ({}). Consider using a proxy or increasing --delay.", code);
            }
            Err(err)
        }
        Err(_) => Err(TransportError::Browser(format!("invalid status {status} for {url}"))),
    }
}

/// Transport backed by a headless Chromium session.
pub struct BrowserTransport {
    browser: RwLock<Option<Browser>>,
    handler: JoinHandle<()>,
    marker: String,
    wait: Duration,
    timeout: Duration,
}

impl BrowserTransport {
    /// Launches Chromium and starts the CDP handler task.
    pub async fn launch(config: &Config) -> Result<Self> {
        info!("Launching headless browser");

        let mut args = vec![
            "--no-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--disable-blink-features=AutomationControlled".to_string(),
            "--no-first-run".to_string(),
            "--disable-extensions".to_string(),
            format!("--user-agent={}", USER_AGENT),
        ];
        if let Some(proxy) = &config.proxy {
            args.push(format!("--proxy-server={}", proxy));
        }

        let browser_config = BrowserConfig::builder()
            .window_size(1366, 768)
            .request_timeout(config.timeout())
            .args(args)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build browser config: {e}"))?;

        let (browser, mut handler) =
            Browser::launch(browser_config).await.context("Failed to launch Chromium")?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDP handler error (continuing): {}", e);
                }
            }
            debug!("CDP handler task completed");
        });

        Ok(Self {
            browser: RwLock::new(Some(browser)),
            handler,
            marker: format!(
                "{}, {}, {}",
                RESULTS_READY_MARKER,
                detail::READY_MARKER,
                results::POPULAR_READY_MARKER
            ),
            wait: Duration::from_secs(config.browser_wait_secs),
            timeout: config.timeout(),
        })
    }

    async fn render(&self, url: &str) -> Result<String, TransportError> {
        let guard = self.browser.read().await;
        let browser = guard
            .as_ref()
            .ok_or_else(|| TransportError::Browser("browser session already closed".to_string()))?;

        let page = browser.new_page("about:blank").await.map_err(browser_err)?;

        // The tab is closed on every outcome, including the timeout
        let html = tokio::time::timeout(self.timeout, self.load(&page, url))
            .await
            .unwrap_or_else(|_| Err(TransportError::Timeout { url: url.to_string() }));

        if let Err(e) = page.close().await {
            debug!("Tab close error (ignored): {}", e);
        }

        html
    }

    async fn load(&self, page: &Page, url: &str) -> Result<String, TransportError> {
        let mut responses =
            page.event_listener::<EventResponseReceived>().await.map_err(browser_err)?;

        debug!("Navigating to {}", url);
        page.goto(url).await.map_err(browser_err)?;

        match document_status(&mut responses).await {
            Some(status) => check_status(status, url)?,
            None => debug!("No document response seen for {}", url),
        }

        self.wait_for_marker(page).await;
        page.content().await.map_err(browser_err)
    }

    /// Polls for the ready marker; gives up quietly after the wait window.
    async fn wait_for_marker(&self, page: &Page) {
        let deadline = Instant::now() + self.wait;
        loop {
            if page.find_element(self.marker.as_str()).await.is_ok() {
                return;
            }
            if Instant::now() >= deadline {
                debug!("Page marker not found after {}s, reading as-is", self.wait.as_secs());
                return;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl Transport for BrowserTransport {
    async fn fetch(&self, url: &str, params: &[(&str, &str)]) -> Result<String, TransportError> {
        self.render(&build_url(url, params)).await
    }

    async fn close(&self) {
        if let Some(mut browser) = self.browser.write().await.take() {
            debug!("Closing browser session");
            if let Err(e) = browser.close().await {
                warn!("Browser close error: {}", e);
            }
            if let Err(e) = browser.wait().await {
                debug!("Browser wait error (ignored): {}", e);
            }
        }
        self.handler.abort();
    }

    fn name(&self) -> &'static str {
        "browser"
    }
}

impl Drop for BrowserTransport {
    fn drop(&mut self) {
        if self.browser.get_mut().is_some() {
            warn!("BrowserTransport dropped without close(), aborting CDP handler");
        }
        self.handler.abort();
    }
}
