//! Data models for device stubs, raw specification maps, and canonical records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sentinel stored in any canonical field that could not be resolved.
pub const NOT_AVAILABLE: &str = "N/A";

/// Source tag attached to every record produced by this crate.
pub const SOURCE: &str = "gsmarena";

/// Raw specification data as scraped: category -> (field label -> value).
///
/// Sorted maps keep serialized output stable; later writes overwrite
/// earlier ones on key collision.
pub type RawSpecMap = BTreeMap<String, BTreeMap<String, String>>;

/// Minimal device identity extracted from a results page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStub {
    /// Page slug, e.g. `apple_iphone_15-12559`
    pub id: String,
    /// Display name from the anchor text
    pub name: String,
    /// First token of the name, or "Unknown"
    pub brand: String,
    /// Absolute detail page URL (identity for dedup)
    pub detail_url: String,
    /// Thumbnail URL if the entry had one
    pub image_url: Option<String>,
}

/// Price extracted from a detail page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    /// Numeric amount with grouping separators removed
    pub amount: f64,
    /// ISO currency code
    pub currency: String,
}

impl Price {
    /// Creates a price.
    pub fn new(amount: f64, currency: impl Into<String>) -> Self {
        Self { amount, currency: currency.into() }
    }
}

/// Canonical specification fields. Every field is always populated,
/// with [`NOT_AVAILABLE`] standing in for anything unresolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Specifications {
    pub display: String,
    pub resolution: String,
    pub display_type: String,
    pub cpu: String,
    pub ram: String,
    pub storage: String,
    pub gpu: String,
    pub camera: String,
    pub front_camera: String,
    pub video: String,
    pub battery: String,
    pub charging: String,
}

impl Default for Specifications {
    fn default() -> Self {
        let na = || NOT_AVAILABLE.to_string();
        Self {
            display: na(),
            resolution: na(),
            display_type: na(),
            cpu: na(),
            ram: na(),
            storage: na(),
            gpu: na(),
            camera: na(),
            front_camera: na(),
            video: na(),
            battery: na(),
            charging: na(),
        }
    }
}

impl Specifications {
    /// Returns `(field name, value)` pairs in canonical order.
    pub fn fields(&self) -> [(&'static str, &str); 12] {
        [
            ("display", &self.display),
            ("resolution", &self.resolution),
            ("display_type", &self.display_type),
            ("cpu", &self.cpu),
            ("ram", &self.ram),
            ("storage", &self.storage),
            ("gpu", &self.gpu),
            ("camera", &self.camera),
            ("front_camera", &self.front_camera),
            ("video", &self.video),
            ("battery", &self.battery),
            ("charging", &self.charging),
        ]
    }

    /// Number of fields that resolved to a real value.
    pub fn resolved_count(&self) -> usize {
        self.fields().iter().filter(|(_, v)| *v != NOT_AVAILABLE).count()
    }
}

/// Canonical, normalized device record handed to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub id: String,
    pub name: String,
    pub brand: String,
    /// Main product photo
    pub image_url: Option<String>,
    /// Announcement date when the launch field could be parsed
    pub release_date: Option<NaiveDate>,
    pub price: Option<Price>,
    pub specifications: Specifications,
    pub source_url: String,
    pub source: String,
    pub last_updated: DateTime<Utc>,
}

/// Result of a search. A failure to reach the results page is reported
/// through `error` rather than as an `Err`, with `devices` left empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// Query as issued (empty for the popular listing)
    pub query: String,
    /// Normalized records in results-page order
    pub devices: Vec<DeviceRecord>,
    /// Set when the search as a whole failed
    pub error: Option<String>,
}

impl SearchOutcome {
    /// Creates a successful outcome.
    pub fn found(query: impl Into<String>, devices: Vec<DeviceRecord>) -> Self {
        Self { query: query.into(), devices, error: None }
    }

    /// Creates a failed outcome carrying the error message.
    pub fn failed(query: impl Into<String>, error: impl ToString) -> Self {
        Self { query: query.into(), devices: Vec::new(), error: Some(error.to_string()) }
    }

    /// Returns number of devices.
    pub fn count(&self) -> usize {
        self.devices.len()
    }

    /// Returns true if no devices were found.
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
