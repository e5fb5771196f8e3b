//! Cache maintenance commands.

use crate::cache::DiskCache;
use crate::config::Config;
use anyhow::Result;
use tracing::info;

/// Inspects or clears the response cache.
pub struct CacheCommand {
    config: Config,
}

impl CacheCommand {
    /// Creates a new cache command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    fn cache(&self) -> DiskCache {
        DiskCache::new(self.config.cache_path(), self.config.cache_ttl())
    }

    /// Removes every cached entry.
    pub async fn clear(&self) -> Result<String> {
        let cache = self.cache();
        let removed = cache.clear().await?;
        info!("Cleared {} entries from {}", removed, cache.dir().display());
        Ok(format!("Removed {} cached entries from {}", removed, cache.dir().display()))
    }

    /// Returns the resolved cache directory.
    pub fn path(&self) -> String {
        self.config.cache_path().display().to_string()
    }
}
