//! tcping
//!
//! Probes a single endpoint over TCP or HTTP(S) on a fixed interval, prints
//! one line per attempt and finishes with latency statistics
//! (min/max/mean/p50/p95/p99).

pub mod cli;
pub mod config;
pub mod dns;
pub mod error;
pub mod logging;
pub mod models;
pub mod output;
pub mod probe;
pub mod registry;
pub mod scheduler;
pub mod stats;

// Re-export commonly used types
pub use error::{classify_error, AppError, ProbeError, Result};
pub use models::{Config, ProbeResult, Protocol, Target};
pub use output::ResultFormatter;
pub use probe::{Probe, ProbeOptions};
pub use registry::{default_registry, ProbeRegistry, ProtocolRegistry};
pub use scheduler::{Scheduler, SchedulerState, StopHandle};
pub use stats::{StatsAggregator, Summary};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const BUILD_TIME: &str = env!("BUILD_TIME");
pub const GIT_COMMIT: Option<&str> = option_env!("GIT_COMMIT");

/// `tcping 0.1.0 (abc1234, built 2024-01-02 15:04:05 UTC)`
pub fn build_info() -> String {
    match GIT_COMMIT {
        Some(commit) => format!("{} {} ({}, built {})", PKG_NAME, VERSION, commit, BUILD_TIME),
        None => format!("{} {} (built {})", PKG_NAME, VERSION, BUILD_TIME),
    }
}

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_COUNTER: i64 = 4;
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);
    pub const DEFAULT_RESOLVER_PORT: u16 = 53;

    pub fn default_user_agent() -> String {
        format!("{}/{}", super::PKG_NAME, super::VERSION)
    }
}
