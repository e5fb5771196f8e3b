//! Device lookup command implementation.

use crate::config::Config;
use crate::format::Formatter;
use crate::gsmarena::{DeviceCatalog, DeviceRecord, GsmArenaClient};
use anyhow::{Context, Result};
use tracing::info;

/// Executes a device lookup by page id (e.g. `apple_iphone_15-12559`).
pub struct DeviceCommand {
    config: Config,
}

impl DeviceCommand {
    /// Creates a new device command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Fetches a device and returns formatted output.
    pub async fn execute(&self, id: &str) -> Result<String> {
        let client =
            GsmArenaClient::new(&self.config).await.context("Failed to create client")?;

        let output = self.execute_with_client(&client, id).await;
        client.close().await;
        output
    }

    /// Fetches a device with a provided catalog (for testing).
    pub async fn execute_with_client(&self, client: &impl DeviceCatalog, id: &str) -> Result<String> {
        info!("Looking up device: {}", id);

        let device = client
            .get_device_details(id)
            .await
            .with_context(|| format!("Failed to fetch device '{}'", id.trim()))?;

        let formatter = Formatter::new(self.config.format);
        Ok(formatter.format_device(&device))
    }

    /// Fetches multiple devices.
    pub async fn execute_batch(&self, ids: &[String]) -> Result<String> {
        let client =
            GsmArenaClient::new(&self.config).await.context("Failed to create client")?;

        let output = self.execute_batch_with_client(&client, ids).await;
        client.close().await;
        output
    }

    /// Fetches multiple devices with a provided catalog (for testing).
    pub async fn execute_batch_with_client(
        &self,
        client: &impl DeviceCatalog,
        ids: &[String],
    ) -> Result<String> {
        let mut devices: Vec<DeviceRecord> = Vec::new();

        for id in ids {
            info!("Looking up device: {}", id);

            match client.get_device_details(id).await {
                Ok(device) => devices.push(device),
                Err(e) => eprintln!("Failed to fetch {}: {:#}", id, e),
            }
        }

        let formatter = Formatter::new(self.config.format);
        Ok(formatter.format_devices(&devices))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::search::tests::{make_record, MockCatalog};
    use crate::config::OutputFormat;

    fn make_test_config(format: OutputFormat) -> Config {
        Config { format, ..Config::default() }
    }

    #[tokio::test]
    async fn test_device_command_success() {
        let client = MockCatalog::new(vec![make_record("apple_iphone_15-12559", "Apple iPhone 15")]);
        let cmd = DeviceCommand::new(make_test_config(OutputFormat::Table));

        let output = cmd.execute_with_client(&client, "apple_iphone_15-12559").await.unwrap();
        assert!(output.contains("Name:         Apple iPhone 15"));
        assert!(output.contains("Battery:      N/A"));
    }

    #[tokio::test]
    async fn test_device_command_not_found() {
        let client = MockCatalog::new(Vec::new());
        let cmd = DeviceCommand::new(make_test_config(OutputFormat::Table));

        let err = cmd.execute_with_client(&client, " missing-1 ").await.unwrap_err();
        assert!(err.to_string().contains("Failed to fetch device 'missing-1'"));
    }

    #[tokio::test]
    async fn test_device_command_json() {
        let client = MockCatalog::new(vec![make_record("nokia_3310-1", "Nokia 3310")]);
        let cmd = DeviceCommand::new(make_test_config(OutputFormat::Json));

        let output = cmd.execute_with_client(&client, "nokia_3310-1").await.unwrap();
        assert!(output.starts_with('{'));
        assert!(output.contains("\"brand\": \"Nokia\""));
    }

    #[tokio::test]
    async fn test_device_batch_skips_failures() {
        let client = MockCatalog::new(vec![
            make_record("apple_iphone_15-12559", "Apple iPhone 15"),
            make_record("google_pixel_8-12546", "Google Pixel 8"),
        ]);
        let cmd = DeviceCommand::new(make_test_config(OutputFormat::Csv));

        let ids = vec![
            "apple_iphone_15-12559".to_string(),
            "missing-1".to_string(),
            "google_pixel_8-12546".to_string(),
        ];
        let output = cmd.execute_batch_with_client(&client, &ids).await.unwrap();
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("apple_iphone_15-12559,"));
        assert!(lines[2].starts_with("google_pixel_8-12546,"));
    }

    #[tokio::test]
    async fn test_device_batch_all_failed() {
        let client = MockCatalog::new(Vec::new());
        let cmd = DeviceCommand::new(make_test_config(OutputFormat::Table));

        let output =
            cmd.execute_batch_with_client(&client, &["x-1".to_string()]).await.unwrap();
        assert_eq!(output, "No devices found.");
    }
}
