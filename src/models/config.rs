//! Configuration data model and validation

use crate::config::parser::parse_duration;
use crate::error::{AppError, Result};
use crate::logging::{LogFormat, LogLevel};
use crate::models::target::Protocol;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Host name, IP literal or full http(s) URL to probe
    #[serde(default)]
    pub host: String,

    /// Explicit port; falls back to the protocol default
    #[serde(default)]
    pub port: Option<u16>,

    /// Explicit protocol; inferred from the host when absent
    #[serde(default)]
    pub protocol: Option<Protocol>,

    /// Counted probes before stopping (zero or negative: until interrupted)
    #[serde(default = "default_counter")]
    pub counter: i64,

    /// Time between probes in milliseconds
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Per-probe deadline in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Proxy URL for HTTP(S) probes
    #[serde(default)]
    pub proxy: Option<String>,

    /// Name server (`ip` or `ip:port`) used instead of the system resolver
    #[serde(default)]
    pub resolver: Option<String>,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Forced color mode; `None` means detect from the terminal
    #[serde(default)]
    pub enable_color: Option<bool>,

    #[serde(default)]
    pub verbose: bool,

    #[serde(default)]
    pub debug: bool,

    /// Diagnostics level overriding `--verbose` / `--debug`
    #[serde(default)]
    pub log_level: Option<LogLevel>,

    /// Diagnostics line format; console under `--debug`, compact otherwise
    #[serde(default)]
    pub log_format: Option<LogFormat>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: None,
            protocol: None,
            counter: default_counter(),
            interval_ms: default_interval_ms(),
            timeout_ms: default_timeout_ms(),
            proxy: None,
            resolver: None,
            user_agent: default_user_agent(),
            enable_color: None,
            verbose: false,
            debug: false,
            log_level: None,
            log_format: None,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(AppError::config("Target host cannot be empty"));
        }

        if self.timeout_ms == 0 {
            return Err(AppError::config("Timeout must be greater than 0"));
        }

        if self.timeout_ms > 300_000 {
            return Err(AppError::config("Timeout cannot exceed 300 seconds"));
        }

        if self.port == Some(0) {
            return Err(AppError::config("Port must be between 1 and 65535"));
        }

        if let Some(ref proxy) = self.proxy {
            let parsed = url::Url::parse(proxy)
                .map_err(|e| AppError::config(format!("Invalid proxy URL '{}': {}", proxy, e)))?;
            match parsed.scheme() {
                "http" | "https" => {}
                other => {
                    return Err(AppError::config(format!("Unsupported proxy scheme '{}'", other)));
                }
            }
        }

        if let Some(ref resolver) = self.resolver {
            parse_resolver_addr(resolver)?;
        }

        if self.user_agent.trim().is_empty() {
            return Err(AppError::config("User agent cannot be empty"));
        }

        Ok(())
    }

    /// Merge `TCPING_*` environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        if let Ok(counter) = std::env::var("TCPING_COUNTER") {
            self.counter = counter
                .trim()
                .parse()
                .map_err(|e| AppError::config(format!("Invalid TCPING_COUNTER value '{}': {}", counter, e)))?;
        }

        if let Ok(interval) = std::env::var("TCPING_INTERVAL") {
            self.interval_ms = millis(parse_duration(&interval).map_err(|e| {
                AppError::config(format!("Invalid TCPING_INTERVAL value '{}': {}", interval, e))
            })?);
        }

        if let Ok(timeout) = std::env::var("TCPING_TIMEOUT") {
            self.timeout_ms = millis(parse_duration(&timeout).map_err(|e| {
                AppError::config(format!("Invalid TCPING_TIMEOUT value '{}': {}", timeout, e))
            })?);
        }

        if let Ok(proxy) = std::env::var("TCPING_PROXY") {
            self.proxy = non_empty(proxy);
        }

        if let Ok(resolver) = std::env::var("TCPING_RESOLVER") {
            self.resolver = non_empty(resolver);
        }

        if let Ok(user_agent) = std::env::var("TCPING_USER_AGENT") {
            if let Some(user_agent) = non_empty(user_agent) {
                self.user_agent = user_agent;
            }
        }

        if let Ok(color) = std::env::var("TCPING_COLOR") {
            self.enable_color = Some(color.trim().parse().map_err(|e| {
                AppError::config(format!("Invalid TCPING_COLOR value '{}': {}", color, e))
            })?);
        }

        if let Ok(level) = std::env::var("TCPING_LOG_LEVEL") {
            self.log_level = Some(level.trim().parse().map_err(|e: AppError| {
                AppError::config(format!("Invalid TCPING_LOG_LEVEL value '{}': {}", level, e))
            })?);
        }

        if let Ok(format) = std::env::var("TCPING_LOG_FORMAT") {
            self.log_format = Some(format.trim().parse().map_err(|e: AppError| {
                AppError::config(format!("Invalid TCPING_LOG_FORMAT value '{}': {}", format, e))
            })?);
        }

        Ok(())
    }
}

/// Parse a resolver given as `ip` or `ip:port` (port defaults to 53)
pub fn parse_resolver_addr(resolver: &str) -> Result<SocketAddr> {
    let resolver = resolver.trim();
    if let Ok(addr) = resolver.parse::<SocketAddr>() {
        return Ok(addr);
    }
    let ip = resolver
        .trim_start_matches('[')
        .trim_end_matches(']')
        .parse::<IpAddr>()
        .map_err(|e| AppError::config(format!("Invalid resolver address '{}': {}", resolver, e)))?;
    Ok(SocketAddr::new(ip, crate::defaults::DEFAULT_RESOLVER_PORT))
}

pub(crate) fn millis(duration: Duration) -> u64 {
    duration.as_millis().min(u64::MAX as u128) as u64
}

fn non_empty(value: String) -> Option<String> {
    let value = value.trim().to_string();
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

// Default value functions for serde
fn default_counter() -> i64 {
    crate::defaults::DEFAULT_COUNTER
}

fn default_interval_ms() -> u64 {
    millis(crate::defaults::DEFAULT_INTERVAL)
}

fn default_timeout_ms() -> u64 {
    millis(crate::defaults::DEFAULT_TIMEOUT)
}

fn default_user_agent() -> String {
    crate::defaults::default_user_agent()
}
