//! Output formatting for device records (table, JSON, markdown, CSV).

use crate::config::OutputFormat;
use crate::gsmarena::models::{DeviceRecord, NOT_AVAILABLE};

/// Human label for each canonical specification field.
fn field_label(field: &str) -> &'static str {
    match field {
        "display" => "Display",
        "resolution" => "Resolution",
        "display_type" => "Display type",
        "cpu" => "CPU",
        "ram" => "RAM",
        "storage" => "Storage",
        "gpu" => "GPU",
        "camera" => "Camera",
        "front_camera" => "Front camera",
        "video" => "Video",
        "battery" => "Battery",
        "charging" => "Charging",
        _ => "Other",
    }
}

/// Truncates on a character boundary, appending "..." when shortened.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let head: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

/// Multi-line values collapsed to one line for tabular output.
fn one_line(text: &str) -> String {
    text.lines().map(str::trim).filter(|l| !l.is_empty()).collect::<Vec<_>>().join("; ")
}

fn price_str(device: &DeviceRecord) -> String {
    match &device.price {
        Some(p) => format!("{} {:.2}", p.currency, p.amount),
        None => NOT_AVAILABLE.to_string(),
    }
}

fn release_str(device: &DeviceRecord) -> String {
    device.release_date.map(|d| d.to_string()).unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Formats devices for output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a single device with its full specification sheet.
    pub fn format_device(&self, device: &DeviceRecord) -> String {
        match self.format {
            OutputFormat::Json => self.json_single(device),
            OutputFormat::Table => self.table_single(device),
            OutputFormat::Markdown => self.markdown_single(device),
            OutputFormat::Csv => self.csv_devices(std::slice::from_ref(device)),
        }
    }

    /// Formats a list of devices.
    pub fn format_devices(&self, devices: &[DeviceRecord]) -> String {
        if devices.is_empty() {
            return match self.format {
                OutputFormat::Json => "[]".to_string(),
                OutputFormat::Csv => self.csv_header(),
                _ => "No devices found.".to_string(),
            };
        }

        match self.format {
            OutputFormat::Json => self.json_devices(devices),
            OutputFormat::Table => self.table_devices(devices),
            OutputFormat::Markdown => self.markdown_devices(devices),
            OutputFormat::Csv => self.csv_devices(devices),
        }
    }

    // JSON formatting

    fn json_single(&self, device: &DeviceRecord) -> String {
        serde_json::to_string_pretty(device).unwrap_or_else(|_| "{}".to_string())
    }

    fn json_devices(&self, devices: &[DeviceRecord]) -> String {
        serde_json::to_string_pretty(devices).unwrap_or_else(|_| "[]".to_string())
    }

    // Table formatting

    fn table_single(&self, device: &DeviceRecord) -> String {
        let mut lines = Vec::new();

        lines.push(format!("{:<14}{}", "Name:", device.name));
        lines.push(format!("{:<14}{}", "Brand:", device.brand));
        lines.push(format!("{:<14}{}", "ID:", device.id));
        lines.push(format!("{:<14}{}", "Released:", release_str(device)));
        lines.push(format!("{:<14}{}", "Price:", price_str(device)));
        lines.push(format!("{:<14}{}", "URL:", device.source_url));
        lines.push(String::new());

        for (field, value) in device.specifications.fields() {
            lines.push(format!("{:<14}{}", format!("{}:", field_label(field)), one_line(value)));
        }

        lines.join("\n")
    }

    fn table_devices(&self, devices: &[DeviceRecord]) -> String {
        let brand_width = 10;
        let price_width = 12;
        let date_width = 10;
        let ram_width = 16;
        let name_width = 40;

        let mut lines = Vec::new();

        // Header
        lines.push(format!(
            "{:<brand_width$}  {:<price_width$}  {:<date_width$}  {:<ram_width$}  {}",
            "Brand", "Price", "Released", "RAM", "Name"
        ));
        lines.push(format!(
            "{:-<brand_width$}  {:-<price_width$}  {:-<date_width$}  {:-<ram_width$}  {:-<name_width$}",
            "", "", "", "", ""
        ));

        // Rows
        for device in devices {
            lines.push(format!(
                "{:<brand_width$}  {:>price_width$}  {:<date_width$}  {:<ram_width$}  {}",
                truncate(&device.brand, brand_width),
                price_str(device),
                release_str(device),
                truncate(&one_line(&device.specifications.ram), ram_width),
                truncate(&device.name, name_width)
            ));
        }

        lines.push(String::new());
        lines.push(format!("Total: {} devices", devices.len()));

        lines.join("\n")
    }

    // Markdown formatting

    fn markdown_single(&self, device: &DeviceRecord) -> String {
        let mut lines = Vec::new();

        lines.push(format!("## {}", device.name));
        lines.push(String::new());

        lines.push(format!("- **Brand:** {}", device.brand));
        lines.push(format!("- **URL:** [View on GSMArena]({})", device.source_url));

        if let Some(date) = device.release_date {
            lines.push(format!("- **Released:** {}", date));
        }

        if let Some(price) = &device.price {
            lines.push(format!("- **Price:** {} {:.2}", price.currency, price.amount));
        }

        lines.push(String::new());
        lines.push("| Spec | Value |".to_string());
        lines.push("|------|-------|".to_string());
        for (field, value) in device.specifications.fields() {
            lines.push(format!("| {} | {} |", field_label(field), one_line(value).replace('|', "\\|")));
        }

        lines.join("\n")
    }

    fn markdown_devices(&self, devices: &[DeviceRecord]) -> String {
        let mut lines = Vec::new();

        lines.push("| Name | Price | Released | Display | CPU | RAM | Battery |".to_string());
        lines.push("|------|-------|----------|---------|-----|-----|---------|".to_string());

        for device in devices {
            let specs = &device.specifications;
            let cell = |v: &str| truncate(&one_line(v), 40).replace('|', "\\|");

            lines.push(format!(
                "| [{}]({}) | {} | {} | {} | {} | {} | {} |",
                device.name,
                device.source_url,
                price_str(device),
                release_str(device),
                cell(&specs.display),
                cell(&specs.cpu),
                cell(&specs.ram),
                cell(&specs.battery)
            ));
        }

        lines.push(String::new());
        lines.push(format!("*{} devices found*", devices.len()));

        lines.join("\n")
    }

    // CSV formatting

    fn csv_header(&self) -> String {
        "id,name,brand,release_date,price,currency,display,resolution,display_type,cpu,ram,storage,gpu,camera,front_camera,video,battery,charging,url"
            .to_string()
    }

    fn csv_devices(&self, devices: &[DeviceRecord]) -> String {
        let mut lines = Vec::new();
        lines.push(self.csv_header());

        for device in devices {
            let release = device.release_date.map(|d| d.to_string()).unwrap_or_default();
            let price = device.price.as_ref().map(|p| p.amount.to_string()).unwrap_or_default();
            let currency = device.price.as_ref().map(|p| p.currency.clone()).unwrap_or_default();

            let mut row = vec![
                Self::csv_escape(&device.id),
                Self::csv_escape(&device.name),
                Self::csv_escape(&device.brand),
                release,
                price,
                currency,
            ];
            row.extend(device.specifications.fields().iter().map(|(_, v)| Self::csv_escape(v)));
            row.push(device.source_url.clone());

            lines.push(row.join(","));
        }

        lines.join("\n")
    }

    fn csv_escape(s: &str) -> String {
        if s.contains(',') || s.contains('"') || s.contains('\n') {
            format!("\"{}\"", s.replace('"', "\"\""))
        } else {
            s.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gsmarena::models::{Price, Specifications, SOURCE};
    use chrono::{NaiveDate, Utc};

    fn make_device() -> DeviceRecord {
        DeviceRecord {
            id: "apple_iphone_15-12559".to_string(),
            name: "Apple iPhone 15".to_string(),
            brand: "Apple".to_string(),
            image_url: None,
            release_date: NaiveDate::from_ymd_opt(2023, 9, 12),
            price: Some(Price::new(799.0, "USD")),
            specifications: Specifications {
                display: "6.1 inches, 91.7 cm2".to_string(),
                cpu: "Apple A16 Bionic (4 nm)".to_string(),
                ram: "6GB RAM".to_string(),
                battery: "Li-Ion 3349 mAh".to_string(),
                ..Specifications::default()
            },
            source_url: "https://www.gsmarena.com/apple_iphone_15-12559.php".to_string(),
            source: SOURCE.to_string(),
            last_updated: Utc::now(),
        }
    }

    fn make_minimal_device() -> DeviceRecord {
        DeviceRecord {
            id: "nokia_3310-1".to_string(),
            name: "Nokia 3310".to_string(),
            brand: "Nokia".to_string(),
            image_url: None,
            release_date: None,
            price: None,
            specifications: Specifications::default(),
            source_url: "https://www.gsmarena.com/nokia_3310-1.php".to_string(),
            source: SOURCE.to_string(),
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly10!", 10), "exactly10!");
        assert_eq!(truncate("much longer than ten", 10), "much lo...");
        assert_eq!(truncate("Xiaomi 14 Ultra – Édition", 12), "Xiaomi 14...");
    }

    #[test]
    fn test_one_line() {
        assert_eq!(one_line("GSM 850\nCDMA 800\n"), "GSM 850; CDMA 800");
    }

    // JSON format tests

    #[test]
    fn test_json_single_device() {
        let output = Formatter::new(OutputFormat::Json).format_device(&make_device());
        assert!(output.contains("\"name\": \"Apple iPhone 15\""));
        assert!(output.contains("\"release_date\": \"2023-09-12\""));
        assert!(output.contains("\"front_camera\": \"N/A\""));
    }

    #[test]
    fn test_json_empty() {
        assert_eq!(Formatter::new(OutputFormat::Json).format_devices(&[]), "[]");
    }

    // Table format tests

    #[test]
    fn test_table_single_device() {
        let output = Formatter::new(OutputFormat::Table).format_device(&make_device());
        assert!(output.contains("Name:         Apple iPhone 15"));
        assert!(output.contains("Released:     2023-09-12"));
        assert!(output.contains("Price:        USD 799.00"));
        assert!(output.contains("CPU:          Apple A16 Bionic (4 nm)"));
        assert!(output.contains("Front camera: N/A"));
    }

    #[test]
    fn test_table_multiple_devices() {
        let output = Formatter::new(OutputFormat::Table)
            .format_devices(&[make_device(), make_minimal_device()]);

        assert!(output.contains("Brand"));
        assert!(output.contains("----------"));
        assert!(output.contains("Apple iPhone 15"));
        assert!(output.contains("Nokia 3310"));
        assert!(output.contains("USD 799.00"));
        assert!(output.contains("N/A"));
        assert!(output.contains("Total: 2 devices"));
    }

    #[test]
    fn test_table_empty() {
        assert_eq!(Formatter::new(OutputFormat::Table).format_devices(&[]), "No devices found.");
    }

    // Markdown format tests

    #[test]
    fn test_markdown_single_device() {
        let output = Formatter::new(OutputFormat::Markdown).format_device(&make_device());
        assert!(output.contains("## Apple iPhone 15"));
        assert!(output.contains("- **Price:** USD 799.00"));
        assert!(output.contains("| Battery | Li-Ion 3349 mAh |"));
    }

    #[test]
    fn test_markdown_single_minimal() {
        let output = Formatter::new(OutputFormat::Markdown).format_device(&make_minimal_device());
        assert!(!output.contains("- **Price:**"));
        assert!(!output.contains("- **Released:**"));
        assert!(output.contains("| RAM | N/A |"));
    }

    #[test]
    fn test_markdown_multiple_devices() {
        let output = Formatter::new(OutputFormat::Markdown)
            .format_devices(&[make_device(), make_minimal_device()]);
        assert!(output.contains("| Name | Price | Released | Display | CPU | RAM | Battery |"));
        assert!(output.contains("[Apple iPhone 15](https://www.gsmarena.com/apple_iphone_15-12559.php)"));
        assert!(output.contains("*2 devices found*"));
    }

    // CSV format tests

    #[test]
    fn test_csv_devices() {
        let output = Formatter::new(OutputFormat::Csv)
            .format_devices(&[make_device(), make_minimal_device()]);
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("id,name,brand,release_date,price,currency,display"));
        assert!(lines[1].starts_with("apple_iphone_15-12559,Apple iPhone 15,Apple,2023-09-12,799,USD,\"6.1 inches, 91.7 cm2\""));
        assert!(lines[2].starts_with("nokia_3310-1,Nokia 3310,Nokia,,,,N/A"));
        assert_eq!(lines[0].split(',').count(), 19);
    }

    #[test]
    fn test_csv_empty() {
        let output = Formatter::new(OutputFormat::Csv).format_devices(&[]);
        assert!(output.starts_with("id,name"));
        assert_eq!(output.lines().count(), 1);
    }

    #[test]
    fn test_csv_escape() {
        assert_eq!(Formatter::csv_escape("simple"), "simple");
        assert_eq!(Formatter::csv_escape("with,comma"), "\"with,comma\"");
        assert_eq!(Formatter::csv_escape("with\"quote"), "\"with\"\"quote\"");
        assert_eq!(Formatter::csv_escape("with\nnewline"), "\"with\nnewline\"");
    }
}
