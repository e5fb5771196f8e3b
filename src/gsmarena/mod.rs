//! GSMArena modules for transport, parsing, normalization and the catalog client.

#[cfg(feature = "browser")]
pub mod browser;
pub mod client;
pub mod models;
pub mod normalize;
pub mod parser;
pub mod rate_gate;
pub mod selectors;
pub mod transport;

pub use client::{DeviceCatalog, GsmArenaClient};
pub use models::{DeviceRecord, DeviceStub, Price, SearchOutcome, Specifications};
pub use parser::Parser;
pub use rate_gate::RateGate;
pub use transport::{HttpTransport, Transport};
