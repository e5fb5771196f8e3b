//! Device catalog client: search, detail fetch, normalization and caching.

use crate::cache::{cache_key, DiskCache};
use crate::config::Config;
use crate::error::TransportError;
use crate::gsmarena::models::{DeviceRecord, DeviceStub, SearchOutcome};
use crate::gsmarena::normalize::build_record;
use crate::gsmarena::parser::Parser;
use crate::gsmarena::rate_gate::RateGate;
use crate::gsmarena::transport::{self, build_url, Transport};
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// Source of normalized device records - enables mocking for tests.
#[async_trait]
pub trait DeviceCatalog: Send + Sync {
    /// Searches by name. An empty query returns the popular listing.
    ///
    /// Never fails: a failed search is reported through
    /// [`SearchOutcome::error`].
    async fn search_devices(&self, query: &str, category: Option<&str>) -> SearchOutcome;

    /// Fetches and normalizes a single device by page id.
    async fn get_device_details(&self, id: &str) -> Result<DeviceRecord>;

    /// Releases transport resources.
    async fn close(&self) {}
}

/// GSMArena scraper implementing [`DeviceCatalog`].
pub struct GsmArenaClient {
    transport: Box<dyn Transport>,
    gate: RateGate,
    cache: Option<DiskCache>,
    parser: Parser,
    base_url: String,
    concurrency: usize,
}

impl GsmArenaClient {
    /// Creates a client with the transport selected in `config`.
    pub async fn new(config: &Config) -> Result<Self> {
        let transport = transport::from_config(config).await?;
        Ok(Self::with_transport(config, transport))
    }

    /// Creates a client around an existing transport.
    pub fn with_transport(config: &Config, transport: Box<dyn Transport>) -> Self {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        let cache = (!config.no_cache)
            .then(|| DiskCache::new(config.cache_path(), config.cache_ttl()));

        debug!(
            transport = transport.name(),
            cache = cache.is_some(),
            "Created GSMArena client for {}",
            base_url
        );

        Self {
            transport,
            gate: RateGate::from_config(config),
            cache,
            parser: Parser::new(base_url.clone(), config.max_results),
            base_url,
            concurrency: config.concurrency.max(1),
        }
    }

    /// Search endpoint.
    pub fn search_url(&self) -> String {
        format!("{}/results.php3", self.base_url)
    }

    /// Detail page URL for a device id.
    pub fn device_url(&self, id: &str) -> String {
        format!("{}/{}.php", self.base_url, id)
    }

    /// Fetches through the rate gate with throttling retry.
    async fn fetch(&self, url: &str, params: &[(&str, &str)]) -> Result<String, TransportError> {
        self.gate.run(|| self.transport.fetch(url, params)).await
    }

    async fn search_stubs(&self, query: &str) -> Result<Vec<DeviceStub>, TransportError> {
        let (url, params) = if query.is_empty() {
            (format!("{}/", self.base_url), Vec::new())
        } else {
            (self.search_url(), vec![("sQuickSearch", "yes"), ("sName", query)])
        };

        // Listings are stored truncated, so the cap is part of the key
        let key = cache_key(
            "search",
            &format!("{}#max={}", build_url(&url, &params), self.parser.max_results()),
        );
        if let Some(cache) = &self.cache {
            if let Some(stubs) = cache.get::<Vec<DeviceStub>>(&key).await {
                debug!("Using cached results for '{}'", query);
                return Ok(stubs);
            }
        }

        let html = self.fetch(&url, &params).await?;
        let stubs = if query.is_empty() {
            self.parser.parse_popular(&html)
        } else {
            self.parser.parse_results(&html, query)
        };

        // Empty listings are often block pages; not worth remembering
        if let (Some(cache), false) = (&self.cache, stubs.is_empty()) {
            cache.put(&key, &stubs).await;
        }

        Ok(stubs)
    }

    async fn device_record(&self, id: &str, stub: Option<&DeviceStub>) -> Result<DeviceRecord> {
        let url = stub.map(|s| s.detail_url.clone()).unwrap_or_else(|| self.device_url(id));
        let key = cache_key("device", &url);

        if let Some(cache) = &self.cache {
            if let Some(record) = cache.get::<DeviceRecord>(&key).await {
                return Ok(record);
            }
        }

        info!("Fetching device: {}", id);
        let html = self
            .fetch(&url, &[])
            .await
            .with_context(|| format!("Failed to fetch device page for {}", id))?;

        let page = self.parser.parse_device_page(&html);
        let record = build_record(id, &url, &page, stub);

        match &self.cache {
            Some(_) if page.specs.is_empty() => {
                warn!("No specifications found for {}; not caching", id);
            }
            Some(cache) => cache.put(&key, &record).await,
            None => {}
        }

        Ok(record)
    }
}

#[async_trait]
impl DeviceCatalog for GsmArenaClient {
    async fn search_devices(&self, query: &str, category: Option<&str>) -> SearchOutcome {
        let query = query.trim();

        if let Some(category) = category {
            debug!("Category '{}' requested; the site has no category filter", category);
        }

        if query.is_empty() {
            info!("Fetching popular devices");
        } else {
            info!("Searching: {}", query);
        }

        let stubs = match self.search_stubs(query).await {
            Ok(stubs) => stubs,
            Err(e) => {
                warn!("Search failed for '{}': {}", query, e);
                return SearchOutcome::failed(query, e);
            }
        };

        let permits = Semaphore::new(self.concurrency);
        let fetches = stubs.iter().map(|stub| {
            let permits = &permits;
            async move {
                let _permit = permits.acquire().await.ok();
                (stub, self.device_record(&stub.id, Some(stub)).await)
            }
        });

        let devices = join_all(fetches)
            .await
            .into_iter()
            .filter_map(|(stub, result)| match result {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("Skipping {}: {:#}", stub.name, e);
                    None
                }
            })
            .collect::<Vec<_>>();

        info!("Found {} devices", devices.len());
        SearchOutcome::found(query, devices)
    }

    async fn get_device_details(&self, id: &str) -> Result<DeviceRecord> {
        let id = id.trim().trim_end_matches(".php");
        anyhow::ensure!(!id.is_empty(), "Device id must not be empty");
        self.device_record(id, None).await
    }

    async fn close(&self) {
        self.transport.close().await;
    }
}
