//! Command-line interface

use crate::models::Protocol;
use clap::Parser;
use std::io::IsTerminal;
use std::time::Duration;

/// tcping - measure connect and request latency to a single endpoint
#[derive(Parser, Debug, Clone)]
#[command(name = "tcping")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Host name, IP address or http(s):// URL to probe
    pub host: String,

    /// Port to probe (default: 80 for tcp/http, 443 for https)
    pub port: Option<u16>,

    /// Stop after this many counted probes (<= 0 runs until interrupted)
    #[arg(short, long, allow_negative_numbers = true)]
    pub counter: Option<i64>,

    /// Time between probes, e.g. 500ms, 1s, 2m
    #[arg(short, long, value_parser = parse_duration_arg)]
    pub interval: Option<Duration>,

    /// Per-probe timeout, e.g. 500ms, 2s
    #[arg(short, long, value_parser = parse_duration_arg)]
    pub timeout: Option<Duration>,

    /// Probe protocol for a bare host (tcp, http, https)
    #[arg(short, long, value_parser = parse_protocol_arg)]
    pub protocol: Option<Protocol>,

    /// Proxy URL for HTTP(S) probes
    #[arg(long)]
    pub proxy: Option<String>,

    /// Name server to resolve the host with (ip or ip:port)
    #[arg(long)]
    pub resolver: Option<String>,

    /// User agent sent by HTTP(S) probes
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Force colored output
    #[arg(long)]
    pub color: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Validate CLI arguments for conflicts and requirements
    pub fn validate(&self) -> Result<(), String> {
        if self.color && self.no_color {
            return Err("Cannot specify both --color and --no-color".to_string());
        }

        if self.host.trim().is_empty() {
            return Err("Target host cannot be empty".to_string());
        }

        if self.port == Some(0) {
            return Err("Port must be between 1 and 65535".to_string());
        }

        Ok(())
    }

    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        resolve_color(
            if self.color {
                Some(true)
            } else if self.no_color {
                Some(false)
            } else {
                None
            },
        )
    }
}

/// Forced setting wins; otherwise color only when stdout is a terminal
pub fn resolve_color(forced: Option<bool>) -> bool {
    match forced {
        Some(enabled) => enabled,
        None => std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal(),
    }
}

fn parse_duration_arg(s: &str) -> Result<Duration, String> {
    crate::config::parser::parse_duration(s).map_err(|e| e.to_string())
}

fn parse_protocol_arg(s: &str) -> Result<Protocol, String> {
    s.parse::<Protocol>().map_err(|e| e.to_string())
}
