//! Probe capability and the built-in TCP and HTTP(S) probes

pub mod http;
pub mod tcp;

pub use http::HttpProbe;
pub use tcp::TcpProbe;

use crate::dns::DnsResolver;
use crate::error::{AppError, ProbeError, Result};
use crate::models::{Config, ProbeResult};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use url::Url;

/// One kind of reachability check against a fixed endpoint.
///
/// Implementations must return promptly once `ctx` is cancelled, reporting
/// [`ProbeError::Cancelled`].
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, ctx: &CancellationToken) -> ProbeResult;
}

/// Settings shared by every probe constructor
#[derive(Debug, Clone)]
pub struct ProbeOptions {
    /// Deadline for one attempt, lookup included
    pub timeout: Duration,
    pub resolver: Arc<DnsResolver>,
    pub proxy: Option<Url>,
    pub user_agent: String,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            timeout: crate::defaults::DEFAULT_TIMEOUT,
            resolver: Arc::new(DnsResolver::System),
            proxy: None,
            user_agent: crate::defaults::default_user_agent(),
        }
    }
}

impl ProbeOptions {
    pub fn from_config(config: &Config) -> Result<Self> {
        let proxy = config
            .proxy
            .as_deref()
            .map(Url::parse)
            .transpose()
            .map_err(|e| AppError::config(format!("Invalid proxy URL: {}", e)))?;

        Ok(Self {
            timeout: config.timeout(),
            resolver: Arc::new(DnsResolver::from_config(config.resolver.as_deref(), config.timeout())?),
            proxy,
            user_agent: config.user_agent.clone(),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_proxy(mut self, proxy: Option<Url>) -> Self {
        self.proxy = proxy;
        self
    }
}

/// Run one step of a probe until it finishes, the deadline passes or the
/// context is cancelled. Cancellation wins over a simultaneous completion.
pub(crate) async fn within<T, F>(
    ctx: &CancellationToken,
    deadline: Instant,
    timeout: Duration,
    step: F,
) -> std::result::Result<T, ProbeError>
where
    F: Future<Output = std::result::Result<T, ProbeError>>,
{
    tokio::select! {
        biased;
        _ = ctx.cancelled() => Err(ProbeError::Cancelled),
        outcome = tokio::time::timeout_at(deadline.into(), step) => {
            outcome.unwrap_or(Err(ProbeError::Timeout(timeout)))
        }
    }
}

/// Host and port a probe should contact, taken from its URL
pub(crate) fn endpoint(url: &Url) -> Result<(String, u16)> {
    let host = url
        .host_str()
        .filter(|host| !host.is_empty())
        .ok_or_else(|| AppError::construction(format!("URL '{}' has no host", url)))?;
    let port = url
        .port_or_known_default()
        .ok_or_else(|| AppError::construction(format!("URL '{}' has no port", url)))?;
    Ok((host.to_string(), port))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_within_passes_result_through() {
        let ctx = CancellationToken::new();
        let deadline = Instant::now() + Duration::from_secs(1);
        let value = within(&ctx, deadline, Duration::from_secs(1), async { Ok::<_, ProbeError>(7) }).await;
        assert_eq!(value.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_within_reports_timeout() {
        let ctx = CancellationToken::new();
        let timeout = Duration::from_millis(20);
        let result = within(&ctx, Instant::now() + timeout, timeout, async {
            std::future::pending::<std::result::Result<(), ProbeError>>().await
        })
        .await;
        assert!(matches!(result, Err(ProbeError::Timeout(t)) if t == timeout));
    }

    #[tokio::test]
    async fn test_within_reports_cancellation() {
        let ctx = CancellationToken::new();
        ctx.cancel();
        let result = within(&ctx, Instant::now() + Duration::from_secs(5), Duration::from_secs(5), async {
            Ok::<_, ProbeError>(())
        })
        .await;
        assert!(matches!(result, Err(ProbeError::Cancelled)));
    }

    #[test]
    fn test_endpoint_defaults() {
        let url = Url::parse("https://example.com/path").unwrap();
        assert_eq!(endpoint(&url).unwrap(), ("example.com".to_string(), 443));

        let url = Url::parse("tcp://example.com:25").unwrap();
        assert_eq!(endpoint(&url).unwrap(), ("example.com".to_string(), 25));

        // non-special scheme without a port
        let url = Url::parse("tcp://example.com").unwrap();
        assert!(endpoint(&url).is_err());
    }

    #[test]
    fn test_options_from_config() {
        let config = Config {
            host: "example.com".to_string(),
            timeout_ms: 1500,
            proxy: Some("http://proxy.local:3128".to_string()),
            ..Config::default()
        };
        let options = ProbeOptions::from_config(&config).unwrap();
        assert_eq!(options.timeout, Duration::from_millis(1500));
        assert_eq!(options.proxy.unwrap().host_str(), Some("proxy.local"));
        assert_eq!(options.resolver.describe(), "system");
    }
}
