//! Environment variable handling and .env file loading

use crate::config::parser::parse_duration;
use crate::error::{AppError, ErrorContext, Result};
use crate::logging::{LogFormat, LogLevel};
use crate::models::config::parse_resolver_addr;
use std::path::Path;

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load .env file if it exists
    pub fn load_env_file(debug: bool) -> Result<()> {
        Self::load_env_file_from(Path::new(".env"), debug)
    }

    pub fn load_env_file_from(path: &Path, debug: bool) -> Result<()> {
        if path.exists() {
            dotenv::from_path(path).with_context(|| format!("Failed to load {}", path.display()))?;

            if debug {
                eprintln!("Loaded configuration from {}", path.display());
            }
        } else if debug {
            eprintln!("No {} file found, using defaults and CLI arguments", path.display());
        }

        Ok(())
    }

    /// Validate environment variable format before parsing
    pub fn validate_env_var(key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "TCPING_COUNTER" => {
                value
                    .parse::<i64>()
                    .map_err(|e| AppError::config(format!("Invalid TCPING_COUNTER value '{}': {}", value, e)))?;
            }
            "TCPING_INTERVAL" | "TCPING_TIMEOUT" => {
                parse_duration(value)
                    .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))?;
            }
            "TCPING_PROXY" => {
                if !value.is_empty() {
                    url::Url::parse(value)
                        .map_err(|e| AppError::config(format!("Invalid TCPING_PROXY value '{}': {}", value, e)))?;
                }
            }
            "TCPING_RESOLVER" => {
                if !value.is_empty() {
                    parse_resolver_addr(value)?;
                }
            }
            "TCPING_COLOR" => {
                value
                    .parse::<bool>()
                    .map_err(|e| AppError::config(format!("Invalid TCPING_COLOR value '{}': {}", value, e)))?;
            }
            "TCPING_LOG_LEVEL" => {
                value
                    .parse::<LogLevel>()
                    .map_err(|e| AppError::config(format!("Invalid TCPING_LOG_LEVEL value '{}': {}", value, e)))?;
            }
            "TCPING_LOG_FORMAT" => {
                value
                    .parse::<LogFormat>()
                    .map_err(|e| AppError::config(format!("Invalid TCPING_LOG_FORMAT value '{}': {}", value, e)))?;
            }
            _ => {
                // Unknown environment variable, ignore
            }
        }

        Ok(())
    }

    /// Get list of all supported environment variables with descriptions
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("TCPING_COUNTER", "Counted probes before stopping (<= 0: until interrupted)", "4"),
            ("TCPING_INTERVAL", "Time between probes (ms, s or m suffix)", "1s"),
            ("TCPING_TIMEOUT", "Per-probe timeout (ms, s or m suffix)", "2s"),
            ("TCPING_PROXY", "Proxy URL for HTTP(S) probes", "http://127.0.0.1:3128"),
            ("TCPING_RESOLVER", "Name server used instead of the system resolver", "1.1.1.1:53"),
            ("TCPING_USER_AGENT", "User agent sent by HTTP(S) probes", "tcping/0.1.0"),
            ("TCPING_COLOR", "Force colored output on or off", "true"),
            ("TCPING_LOG_LEVEL", "Diagnostics level on stderr (trace to error)", "trace"),
            ("TCPING_LOG_FORMAT", "Diagnostics format (console, json, compact)", "json"),
        ]
    }

    /// Validate all currently set environment variables
    pub fn validate_current_env() -> Vec<String> {
        let mut warnings = Vec::new();

        for (var_name, _, _) in Self::get_supported_env_vars() {
            if let Ok(value) = std::env::var(var_name) {
                if let Err(e) = Self::validate_env_var(var_name, &value) {
                    warnings.push(format!("Warning: {}", e));
                }
            }
        }

        warnings
    }

    /// Display environment variable help
    pub fn display_env_help() -> String {
        let mut help = String::new();
        help.push_str("Environment Variables:\n");

        for (var, description, example) in Self::get_supported_env_vars() {
            help.push_str(&format!("  {:<18} {} (e.g. {})\n", var, description, example));
        }

        help.push_str("\nCommand-line arguments take precedence over environment variables and .env values.\n");
        help
    }
}
