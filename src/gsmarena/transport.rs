//! Page fetching strategies.
//!
//! [`HttpTransport`] issues plain GETs with browser TLS fingerprint emulation
//! via wreq. The headless browser strategy lives in `browser.rs` behind the
//! `browser` feature. Both return the raw HTML of the page.

use crate::config::{Config, TransportKind};
use crate::error::TransportError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};
use wreq::Client;
use wreq_util::Emulation;

/// Fetches a page and returns its HTML - enables mocking for tests.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetches `url` with `params` encoded as a query string.
    async fn fetch(&self, url: &str, params: &[(&str, &str)]) -> Result<String, TransportError>;

    /// Releases any held session. Safe to call more than once.
    async fn close(&self) {}

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Encodes `params` into `url`. Both transports and the cache key use this.
pub fn build_url(url: &str, params: &[(&str, &str)]) -> String {
    if params.is_empty() {
        return url.to_string();
    }

    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{query}")
}

/// Creates the transport selected by `config.transport`.
pub async fn from_config(config: &Config) -> Result<Box<dyn Transport>> {
    match config.transport {
        TransportKind::Http => Ok(Box::new(HttpTransport::new(config)?)),
        #[cfg(feature = "browser")]
        TransportKind::Browser => {
            let transport = crate::gsmarena::browser::BrowserTransport::launch(config).await?;
            Ok(Box::new(transport))
        }
        #[cfg(not(feature = "browser"))]
        TransportKind::Browser => Err(TransportError::Unsupported(
            "browser transport requires building with --features browser".to_string(),
        )
        .into()),
    }
}

/// HTTP transport with browser impersonation.
pub struct HttpTransport {
    client: Client,
    referer: String,
    timeout: Duration,
}

impl HttpTransport {
    /// Creates a transport with the given configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .timeout(config.timeout())
            .connect_timeout(Duration::from_secs(10));

        // Configure proxy if specified
        if let Some(proxy_url) = &config.proxy {
            debug!("Configuring proxy: {}", proxy_url);
            let proxy = wreq::Proxy::all(proxy_url).context("Failed to configure proxy")?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            referer: format!("{}/", config.base_url.trim_end_matches('/')),
            timeout: config.timeout(),
        })
    }

    async fn get(&self, url: &str) -> Result<String, TransportError> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .emulation(Emulation::Chrome131)
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8")
            .header("Accept-Language", "en-US,en;q=0.9")
            .header("Accept-Encoding", "gzip, deflate, br")
            .header("Referer", self.referer.as_str())
            .header("Sec-Ch-Ua", "\"Chromium\";v=\"131\", \"Not_A Brand\";v=\"24\"")
            .header("Sec-Ch-Ua-Mobile", "?0")
            .header("Sec-Ch-Ua-Platform", "\"macOS\"")
            .header("Sec-Fetch-Dest", "document")
            .header("Sec-Fetch-Mode", "navigate")
            .header("Sec-Fetch-Site", "same-origin")
            .header("Sec-Fetch-User", "?1")
            .header("Upgrade-Insecure-Requests", "1")
            .send()
            .await?;

        let status = response.status();
        debug!("Response status: {}", status);

        if !status.is_success() {
            let err = TransportError::from_status(status.as_u16(), url);
            if err.is_throttled() {
                warn!("Throttled ({}). Consider using a proxy or increasing --delay.", status);
            }
            return Err(err);
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, url: &str, params: &[(&str, &str)]) -> Result<String, TransportError> {
        let full_url = build_url(url, params);
        tokio::time::timeout(self.timeout, self.get(&full_url))
            .await
            .map_err(|_| TransportError::Timeout { url: full_url.clone() })?
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
