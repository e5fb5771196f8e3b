//! CLI command implementations.

pub mod cache;
pub mod device;
pub mod search;

pub use cache::CacheCommand;
pub use device::DeviceCommand;
pub use search::SearchCommand;
