//! Outcome of a single probe attempt

use crate::error::ProbeError;
use std::collections::HashMap;
use std::fmt::Display;
use std::time::Duration;

/// Result of one probe attempt.
///
/// Produced by a `Probe`, owned by the scheduler for one tick and then handed
/// to the statistics aggregator and the formatter.
#[derive(Debug, Default)]
pub struct ProbeResult {
    pub connected: bool,
    pub error: Option<ProbeError>,
    /// Time spent on the attempt after name resolution, up to success or failure
    pub duration: Duration,
    /// Zero when no lookup was needed
    pub dns_duration: Duration,
    pub address: String,
    /// Rendered metadata; keys are unique and carry no order
    pub meta: HashMap<String, String>,
    /// Multi-line payload printed after the probe line
    pub extra: Option<String>,
}

impl ProbeResult {
    pub fn success(duration: Duration) -> Self {
        Self {
            connected: true,
            duration,
            ..Default::default()
        }
    }

    pub fn failure(error: ProbeError, duration: Duration) -> Self {
        Self {
            connected: false,
            error: Some(error),
            duration,
            ..Default::default()
        }
    }

    pub fn with_dns_duration(mut self, dns_duration: Duration) -> Self {
        self.dns_duration = dns_duration;
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Display) -> Self {
        self.meta.insert(key.into(), value.to_string());
        self
    }

    pub fn with_extra(mut self, extra: impl Display) -> Self {
        self.extra = Some(extra.to_string());
        self
    }

    /// True when the attempt was aborted through its cancellation token
    pub fn is_cancelled(&self) -> bool {
        self.error.as_ref().is_some_and(ProbeError::is_cancelled)
    }

    /// Meta pairs as `k=v`, sorted by key and joined with spaces
    pub fn format_meta(&self) -> String {
        let mut keys: Vec<&String> = self.meta.keys().collect();
        keys.sort();
        keys.iter()
            .map(|key| format!("{}={}", key, self.meta[*key]))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn duration_ms(&self) -> f64 {
        self.duration.as_secs_f64() * 1000.0
    }
}
