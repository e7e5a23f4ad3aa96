//! Probe target and protocol identifiers

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Protocol used to probe a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Http,
    Https,
}

impl Protocol {
    /// Canonical lowercase identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }

    /// Port used when the target does not name one
    pub fn default_port(&self) -> u16 {
        match self {
            Protocol::Tcp | Protocol::Http => 80,
            Protocol::Https => 443,
        }
    }

    pub fn all() -> [Protocol; 3] {
        [Protocol::Tcp, Protocol::Http, Protocol::Https]
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "tcp" => Ok(Protocol::Tcp),
            "http" => Ok(Protocol::Http),
            "https" => Ok(Protocol::Https),
            _ => Err(AppError::unsupported_protocol(s)),
        }
    }
}

/// What to probe and how often.
///
/// Built once from the configuration and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub protocol: Protocol,
    pub host: String,
    /// Pre-resolved address, when the host was given as an IP literal
    pub ip: Option<String>,
    pub port: u16,
    pub proxy: Option<String>,

    /// Counted probes before stopping; zero or negative runs until stopped
    pub counter: i64,
    pub interval: Duration,
    pub timeout: Duration,
}

impl Target {
    pub fn new(protocol: Protocol, host: impl Into<String>, port: u16) -> Self {
        let host = host.into();
        let ip = host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<std::net::IpAddr>()
            .ok()
            .map(|ip| ip.to_string());
        Self {
            protocol,
            host,
            ip,
            port,
            proxy: None,
            counter: crate::defaults::DEFAULT_COUNTER,
            interval: crate::defaults::DEFAULT_INTERVAL,
            timeout: crate::defaults::DEFAULT_TIMEOUT,
        }
    }

    pub fn with_counter(mut self, counter: i64) -> Self {
        self.counter = counter;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    /// Whether the run stops by itself after `counter` counted probes
    pub fn is_bounded(&self) -> bool {
        self.counter > 0
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.protocol, self.host, self.port)
    }
}
