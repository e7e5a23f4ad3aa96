//! TCP connect probe

use super::{endpoint, within, Probe, ProbeOptions};
use crate::dns::{ip_literal, DnsResolver};
use crate::error::{ProbeError, Result};
use crate::models::ProbeResult;
use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Measures how long a TCP handshake with the target takes
#[derive(Debug)]
pub struct TcpProbe {
    host: String,
    port: u16,
    timeout: Duration,
    resolver: Arc<DnsResolver>,
}

impl TcpProbe {
    pub fn new(host: impl Into<String>, port: u16, options: &ProbeOptions) -> Self {
        Self {
            host: host.into(),
            port,
            timeout: options.timeout,
            resolver: Arc::clone(&options.resolver),
        }
    }

    /// Registry constructor
    pub fn from_url(url: &Url, options: &ProbeOptions) -> Result<Box<dyn Probe>> {
        let (host, port) = endpoint(url)?;
        Ok(Box::new(Self::new(host, port, options)))
    }
}

#[async_trait]
impl Probe for TcpProbe {
    async fn probe(&self, ctx: &CancellationToken) -> ProbeResult {
        let lookup_start = Instant::now();
        let deadline = lookup_start + self.timeout;

        let ip = match within(ctx, deadline, self.timeout, self.resolver.resolve_one(&self.host)).await {
            Ok(ip) => ip,
            Err(err) => {
                let elapsed = lookup_start.elapsed();
                return ProbeResult::failure(err, elapsed)
                    .with_dns_duration(elapsed)
                    .with_address(format!("{}:{}", self.host, self.port));
            }
        };
        let dns_duration = if ip_literal(&self.host).is_some() {
            Duration::ZERO
        } else {
            lookup_start.elapsed()
        };

        let addr = SocketAddr::new(ip, self.port);

        let connect_start = Instant::now();
        let connect = async {
            TcpStream::connect(addr)
                .await
                .map_err(|e| ProbeError::connect(addr, e))
        };
        let result = match within(ctx, deadline, self.timeout, connect).await {
            // the stream is dropped right away; only the handshake is measured
            Ok(_stream) => ProbeResult::success(connect_start.elapsed()),
            Err(err) => ProbeResult::failure(err, connect_start.elapsed()),
        };

        result.with_dns_duration(dns_duration).with_address(addr.to_string())
    }
}
