//! Search command implementation.

use crate::config::Config;
use crate::format::Formatter;
use crate::gsmarena::{DeviceCatalog, GsmArenaClient};
use anyhow::{Context, Result};
use tracing::info;

/// Executes a device search, or lists popular devices for an empty query.
pub struct SearchCommand {
    config: Config,
}

impl SearchCommand {
    /// Creates a new search command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Executes the search and returns formatted output.
    pub async fn execute(&self, query: &str, category: Option<&str>) -> Result<String> {
        let client =
            GsmArenaClient::new(&self.config).await.context("Failed to create client")?;

        let output = self.execute_with_client(&client, query, category).await;
        client.close().await;
        output
    }

    /// Executes the search with a provided catalog (for testing).
    pub async fn execute_with_client(
        &self,
        client: &impl DeviceCatalog,
        query: &str,
        category: Option<&str>,
    ) -> Result<String> {
        let outcome = client.search_devices(query, category).await;

        if let Some(error) = &outcome.error {
            eprintln!("Search failed: {}", error);
        }

        info!("Found {} devices for '{}'", outcome.count(), outcome.query);

        let formatter = Formatter::new(self.config.format);
        Ok(formatter.format_devices(&outcome.devices))
    }
}
