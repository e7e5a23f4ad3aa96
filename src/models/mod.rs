//! Data models and structures for tcping

pub mod config;
pub mod probe;
pub mod target;

// Re-export main model types
pub use config::Config;
pub use probe::ProbeResult;
pub use target::{Protocol, Target};
