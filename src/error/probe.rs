//! Per-probe errors and their operator-facing classification

use std::error::Error as StdError;
use std::io;
use std::time::Duration;
use thiserror::Error;
use trust_dns_resolver::error::{ResolveError, ResolveErrorKind};

/// Failure of a single probe attempt
#[derive(Error, Debug)]
pub enum ProbeError {
    /// The probe context was cancelled before the attempt finished
    #[error("probe cancelled")]
    Cancelled,

    /// The per-probe deadline passed
    #[error("deadline exceeded after {0:?}")]
    Timeout(Duration),

    /// Host name lookup failed
    #[error("lookup {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: Box<dyn StdError + Send + Sync + 'static>,
    },

    /// Lookup succeeded but returned nothing usable
    #[error("lookup {0}: no such host")]
    NoAddress(String),

    /// TCP connection could not be established
    #[error("dial tcp {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// HTTP request failed below the status line
    #[error("{0}")]
    Http(#[source] reqwest::Error),

    /// HTTP response received with an error status
    #[error("unexpected status code {0}")]
    Status(u16),

    #[error("{0}")]
    Other(String),
}

impl ProbeError {
    pub fn resolve<E>(host: &str, source: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync + 'static>>,
    {
        Self::Resolve {
            host: host.to_string(),
            source: source.into(),
        }
    }

    pub fn connect(addr: impl ToString, source: io::Error) -> Self {
        Self::Connect {
            addr: addr.to_string(),
            source,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Render an error as the short reason shown after `Failed(...)`.
///
/// Any timeout, deadline or cancellation anywhere in the chain becomes
/// `"timeout"`. An OS socket error is shown as its bare OS message. Other
/// errors are unwrapped through opaque wrappers until something with a
/// meaningful message is found.
pub fn classify_error(err: &(dyn StdError + 'static)) -> String {
    if chain(err).any(is_timeout) {
        return "timeout".to_string();
    }
    classify_inner(err)
}

fn classify_inner(err: &(dyn StdError + 'static)) -> String {
    if let Some(io_err) = err.downcast_ref::<io::Error>() {
        if io_err.raw_os_error().is_some() {
            return os_message(io_err);
        }
        return match io_err.get_ref() {
            Some(inner) => classify_inner(inner),
            None => io_err.to_string(),
        };
    }

    if let Some(probe_err) = err.downcast_ref::<ProbeError>() {
        match probe_err {
            ProbeError::Connect { .. } | ProbeError::Http(_) => {}
            _ => return probe_err.to_string(),
        }
    }

    match err.source() {
        Some(source) => classify_inner(source),
        None => err.to_string(),
    }
}

fn is_timeout(err: &(dyn StdError + 'static)) -> bool {
    if let Some(probe_err) = err.downcast_ref::<ProbeError>() {
        return matches!(probe_err, ProbeError::Cancelled | ProbeError::Timeout(_));
    }
    if err.is::<tokio::time::error::Elapsed>() {
        return true;
    }
    if let Some(io_err) = err.downcast_ref::<io::Error>() {
        return io_err.kind() == io::ErrorKind::TimedOut;
    }
    if let Some(http_err) = err.downcast_ref::<reqwest::Error>() {
        return http_err.is_timeout();
    }
    if let Some(resolve_err) = err.downcast_ref::<ResolveError>() {
        return matches!(resolve_err.kind(), ResolveErrorKind::Timeout);
    }
    false
}

/// Walk an error chain, looking through `io::Error` custom payloads too.
fn chain<'a>(err: &'a (dyn StdError + 'static)) -> impl Iterator<Item = &'a (dyn StdError + 'static)> {
    std::iter::successors(Some(err), |current| next_in_chain(*current))
}

fn next_in_chain<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a (dyn StdError + 'static)> {
    if let Some(io_err) = err.downcast_ref::<io::Error>() {
        if let Some(inner) = io_err.get_ref() {
            return Some(inner as &(dyn StdError + 'static));
        }
    }
    err.source()
}

// std appends " (os error N)" to OS errors
fn os_message(err: &io::Error) -> String {
    let text = err.to_string();
    match text.rfind(" (os error ") {
        Some(idx) => text[..idx].to_string(),
        None => text,
    }
}
