//! Error handling for tcping
//!
//! Two families of errors live here:
//! - [`AppError`]: fatal errors (configuration, probe construction, I/O) that
//!   stop the process before or instead of probing.
//! - [`ProbeError`]: per-probe failures recorded in a `ProbeResult`. These never
//!   abort the scheduling loop and are rendered through [`classify_error`].

pub mod probe;

pub use probe::{classify_error, ProbeError};

use thiserror::Error;

/// Custom error types for tcping
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unknown protocol identifier
    #[error("protocol {0} not supported")]
    UnsupportedProtocol(String),

    /// A registered constructor failed to build a probe
    #[error("Probe construction error: {0}")]
    Construction(String),

    /// I/O errors (writing output, reading .env, etc.)
    #[error("I/O error: {0}")]
    Io(String),

    /// Parsing errors (URLs, numbers, durations)
    #[error("Parsing error: {0}")]
    Parse(String),

    /// Probe run finished but the outcome is unusable
    #[error("Test execution error: {0}")]
    TestExecution(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new unsupported protocol error
    pub fn unsupported_protocol<S: Into<String>>(protocol: S) -> Self {
        Self::UnsupportedProtocol(protocol.into())
    }

    /// Create a new probe construction error
    pub fn construction<S: Into<String>>(message: S) -> Self {
        Self::Construction(message.into())
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io(message.into())
    }

    /// Create a new parsing error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse(message.into())
    }

    /// Create a new test execution error
    pub fn test_execution<S: Into<String>>(message: S) -> Self {
        Self::TestExecution(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Get error category for logging and reporting
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG",
            Self::UnsupportedProtocol(_) => "PROTOCOL",
            Self::Construction(_) => "PROBE",
            Self::Io(_) => "IO",
            Self::Parse(_) => "PARSE",
            Self::TestExecution(_) => "TEST",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Fatal errors raised before the first probe is scheduled
    pub fn is_startup_error(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::UnsupportedProtocol(_) | Self::Construction(_) | Self::Parse(_)
        )
    }

    /// Get exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::UnsupportedProtocol(_) | Self::Parse(_) => 1,
            Self::Construction(_) => 1,
            Self::Io(_) => 5,
            Self::TestExecution(_) => 6,
            Self::Internal(_) => 99,
        }
    }

    /// Format error for console display with color coding
    pub fn format_for_console(&self, use_color: bool) -> String {
        let category = self.category();
        let message = self.to_string();

        if use_color {
            use colored::Colorize;
            match self {
                Self::Config(_) | Self::UnsupportedProtocol(_) | Self::Parse(_) | Self::Construction(_) => {
                    format!("[{}] {}", category.red().bold(), message.red())
                }
                Self::Io(_) | Self::TestExecution(_) => {
                    format!("[{}] {}", category.cyan().bold(), message.cyan())
                }
                Self::Internal(_) => {
                    format!("[{}] {}", category.bright_red().bold(), message.bright_red())
                }
            }
        } else {
            format!("[{}] {}", category, message)
        }
    }
}

// Standard library error conversions
impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(error: url::ParseError) -> Self {
        Self::parse(format!("URL parse error: {}", error))
    }
}

// Only client setup surfaces reqwest errors as fatal; request failures are
// probe outcomes and go through `ProbeError::Http`.
impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        Self::construction(error.to_string())
    }
}

impl From<dotenv::Error> for AppError {
    fn from(error: dotenv::Error) -> Self {
        Self::config(format!("Environment file error: {}", error))
    }
}

/// Custom Result type for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Error context trait for adding context to errors
pub trait ErrorContext<T> {
    /// Add context to an error, keeping its category
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;

    /// Add static context to an error
    fn context(self, message: &'static str) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<AppError>,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let original = e.into();
            let message = format!("{}: {}", f(), original);
            match original {
                AppError::Config(_) => AppError::Config(message),
                AppError::UnsupportedProtocol(p) => AppError::UnsupportedProtocol(p),
                AppError::Construction(_) => AppError::Construction(message),
                AppError::Io(_) => AppError::Io(message),
                AppError::Parse(_) => AppError::Parse(message),
                AppError::TestExecution(_) => AppError::TestExecution(message),
                AppError::Internal(_) => AppError::Internal(message),
            }
        })
    }

    fn context(self, message: &'static str) -> Result<T> {
        self.with_context(|| message.to_string())
    }
}
