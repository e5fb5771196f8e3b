//! gsm-crawler - Polite GSMArena device specification scraper
//!
//! Searches the catalog, fetches device pages through a paced transport,
//! and normalizes the specification sheet into a fixed set of fields.

pub mod cache;
pub mod commands;
pub mod config;
pub mod error;
pub mod format;
pub mod gsmarena;

pub use cache::DiskCache;
pub use config::Config;
pub use error::TransportError;
pub use gsmarena::models::{DeviceRecord, Price, SearchOutcome, Specifications};
pub use gsmarena::{DeviceCatalog, GsmArenaClient};
