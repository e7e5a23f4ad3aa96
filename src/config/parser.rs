//! Configuration parsing from CLI arguments and environment variables

use crate::{
    cli::Cli,
    config::env::EnvManager,
    error::{AppError, Result},
    models::{config::millis, Config, Protocol, Target},
};
use std::time::Duration;
use url::Url;

/// Configuration parser that combines CLI arguments with environment variables
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    /// Create a new configuration parser with CLI arguments
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Parse and build the complete configuration
    pub fn parse(&self) -> Result<Config> {
        let mut config = Config::default();

        self.load_env_file()?;
        config.merge_from_env()?;
        self.apply_cli_overrides(&mut config);
        config.validate()?;

        Ok(config)
    }

    fn load_env_file(&self) -> Result<()> {
        EnvManager::load_env_file(self.cli.debug)
    }

    /// Apply CLI argument overrides to configuration.
    ///
    /// Only flags that were given on the command line replace values coming
    /// from the environment.
    fn apply_cli_overrides(&self, config: &mut Config) {
        let cli = &self.cli;

        config.host = cli.host.trim().to_string();

        if cli.port.is_some() {
            config.port = cli.port;
        }
        if cli.protocol.is_some() {
            config.protocol = cli.protocol;
        }
        if let Some(counter) = cli.counter {
            config.counter = counter;
        }
        if let Some(interval) = cli.interval {
            config.interval_ms = millis(interval);
        }
        if let Some(timeout) = cli.timeout {
            config.timeout_ms = millis(timeout);
        }
        if cli.proxy.is_some() {
            config.proxy = cli.proxy.clone();
        }
        if cli.resolver.is_some() {
            config.resolver = cli.resolver.clone();
        }
        if let Some(ref user_agent) = cli.user_agent {
            config.user_agent = user_agent.clone();
        }

        if cli.color {
            config.enable_color = Some(true);
        } else if cli.no_color {
            config.enable_color = Some(false);
        }

        // CLI-only flags
        config.verbose = cli.verbose;
        config.debug = cli.debug;
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<Config> {
    let parser = ConfigParser::new(cli);
    parser.parse()
}

/// Build the probe target and the URL handed to the probe constructor.
///
/// A host given as `scheme://...` selects the protocol from its scheme; a
/// bare host uses the configured protocol (TCP when none). An explicit port
/// always wins over the URL port and the protocol default.
pub fn build_target(config: &Config) -> Result<(Target, Url)> {
    let host = config.host.trim();

    let (protocol, mut url) = if host.contains("://") {
        let url = Url::parse(host)?;
        let protocol: Protocol = url.scheme().parse()?;
        if let Some(explicit) = config.protocol {
            if explicit != protocol {
                return Err(AppError::config(format!(
                    "Protocol '{}' conflicts with target URL scheme '{}'",
                    explicit, protocol
                )));
            }
        }
        (protocol, url)
    } else {
        let protocol = config.protocol.unwrap_or(Protocol::Tcp);
        let url = Url::parse(&format!("{}://{}", protocol, bracket_ipv6(host)))?;
        (protocol, url)
    };

    if let Some(port) = config.port {
        url.set_port(Some(port))
            .map_err(|_| AppError::config(format!("Cannot set port {} on '{}'", port, url)))?;
    }

    let target_host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| AppError::config(format!("Target '{}' has no host", host)))?
        .to_string();
    let port = url.port().unwrap_or_else(|| protocol.default_port());

    if url.port().is_none() && protocol == Protocol::Tcp {
        // non-special schemes have no implicit port
        url.set_port(Some(port))
            .map_err(|_| AppError::config(format!("Cannot set port {} on '{}'", port, url)))?;
    }

    let target = Target::new(protocol, target_host, port)
        .with_counter(config.counter)
        .with_interval(config.interval())
        .with_timeout(config.timeout())
        .with_proxy(config.proxy.clone());

    Ok((target, url))
}

fn bracket_ipv6(host: &str) -> String {
    match host.parse::<std::net::Ipv6Addr>() {
        Ok(ip) => format!("[{}]", ip),
        Err(_) => host.to_string(),
    }
}

/// Parse a duration such as `500ms`, `1.5s`, `2m` or a bare number of seconds
pub fn parse_duration(input: &str) -> Result<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AppError::parse("Duration cannot be empty"));
    }

    let split = input
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(input.len());
    let (number, unit) = input.split_at(split);

    let nanos_per_unit = match unit.trim() {
        "ms" => 1e6,
        "" | "s" => 1e9,
        "m" => 60e9,
        other => {
            return Err(AppError::parse(format!(
                "Unknown duration unit '{}' in '{}' (use ms, s or m)",
                other, input
            )))
        }
    };

    let value: f64 = number
        .parse()
        .map_err(|_| AppError::parse(format!("Invalid duration: {}", input)))?;

    let nanos = (value * nanos_per_unit).round();
    if !nanos.is_finite() || nanos >= u64::MAX as f64 {
        return Err(AppError::parse(format!("Duration out of range: {}", input)));
    }

    Ok(Duration::from_nanos(nanos as u64))
}

/// Display configuration summary for debug purposes
pub fn display_config_summary(config: &Config) -> String {
    let mut summary = Vec::new();

    summary.push(format!("Target: {}", config.host));
    if let Some(port) = config.port {
        summary.push(format!("Port: {}", port));
    }
    summary.push(format!(
        "Protocol: {}",
        config.protocol.map(|p| p.to_string()).unwrap_or_else(|| "auto".to_string())
    ));
    if config.counter > 0 {
        summary.push(format!("Counter: {}", config.counter));
    } else {
        summary.push("Counter: unlimited".to_string());
    }
    summary.push(format!("Interval: {:?}", config.interval()));
    summary.push(format!("Timeout: {:?}", config.timeout()));
    if let Some(ref proxy) = config.proxy {
        summary.push(format!("Proxy: {}", proxy));
    }
    summary.push(format!(
        "Resolver: {}",
        config.resolver.as_deref().unwrap_or("system")
    ));
    summary.push(format!("User Agent: {}", config.user_agent));
    summary.push(format!(
        "Color Output: {}",
        config.enable_color.map(|c| c.to_string()).unwrap_or_else(|| "auto".to_string())
    ));
    summary.push(format!("Verbose: {}", config.verbose));
    summary.push(format!("Debug: {}", config.debug));

    summary.join("\n")
}
