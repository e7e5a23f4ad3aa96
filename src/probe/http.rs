//! HTTP and HTTPS probe

use super::{endpoint, within, Probe, ProbeOptions};
use crate::dns::{ip_literal, DnsResolver};
use crate::error::{AppError, ErrorContext, ProbeError, Result};
use crate::models::ProbeResult;
use async_trait::async_trait;
use reqwest::{redirect, Client, ClientBuilder, Proxy};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Issues a `GET` against the target URL and times the full exchange.
///
/// A fresh client is built for every attempt so each probe pays for its own
/// connection (and TLS handshake). Redirects are reported, not followed.
#[derive(Debug)]
pub struct HttpProbe {
    url: Url,
    host: String,
    port: u16,
    timeout: Duration,
    resolver: Arc<DnsResolver>,
    proxy: Option<(Proxy, String)>,
    user_agent: String,
}

impl HttpProbe {
    pub fn new(url: Url, options: &ProbeOptions) -> Result<Self> {
        match url.scheme() {
            "http" | "https" => {}
            other => return Err(AppError::unsupported_protocol(other)),
        }
        let (host, port) = endpoint(&url)?;

        let proxy = match &options.proxy {
            Some(proxy_url) => {
                let proxy = Proxy::all(proxy_url.as_str())
                    .map_err(|e| AppError::construction(format!("Invalid proxy '{}': {}", proxy_url, e)))?;
                let (proxy_host, proxy_port) = endpoint(proxy_url)?;
                Some((proxy, format!("{}:{}", proxy_host, proxy_port)))
            }
            None => None,
        };

        // fail at construction rather than on every probe
        base_client(&options.user_agent, options.timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            url,
            host,
            port,
            timeout: options.timeout,
            resolver: Arc::clone(&options.resolver),
            proxy,
            user_agent: options.user_agent.clone(),
        })
    }

    /// Registry constructor
    pub fn from_url(url: &Url, options: &ProbeOptions) -> Result<Box<dyn Probe>> {
        Ok(Box::new(Self::new(url.clone(), options)?))
    }

    async fn request(&self, client: Client) -> std::result::Result<(u16, usize), ProbeError> {
        let response = client.get(self.url.clone()).send().await.map_err(ProbeError::Http)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(ProbeError::Http)?;
        Ok((status, body.len()))
    }
}

fn base_client(user_agent: &str, timeout: Duration) -> ClientBuilder {
    Client::builder()
        .timeout(timeout)
        .user_agent(user_agent.to_string())
        .redirect(redirect::Policy::none())
        .pool_max_idle_per_host(0)
}

#[async_trait]
impl Probe for HttpProbe {
    async fn probe(&self, ctx: &CancellationToken) -> ProbeResult {
        let lookup_start = Instant::now();
        let deadline = lookup_start + self.timeout;
        let mut builder = base_client(&self.user_agent, self.timeout);
        let mut dns_duration = Duration::ZERO;
        let address;

        if let Some((proxy, authority)) = &self.proxy {
            // the proxy resolves the target
            builder = builder.proxy(proxy.clone());
            address = authority.clone();
        } else if let Some(ip) = ip_literal(&self.host) {
            builder = builder.no_proxy();
            address = SocketAddr::new(ip, self.port).to_string();
        } else {
            let ip = match within(ctx, deadline, self.timeout, self.resolver.resolve_one(&self.host)).await {
                Ok(ip) => ip,
                Err(err) => {
                    let elapsed = lookup_start.elapsed();
                    return ProbeResult::failure(err, elapsed)
                        .with_dns_duration(elapsed)
                        .with_address(format!("{}:{}", self.host, self.port));
                }
            };
            dns_duration = lookup_start.elapsed();

            let addr = SocketAddr::new(ip, self.port);
            builder = builder.no_proxy().resolve(&self.host, addr);
            address = addr.to_string();
        }

        // client setup is not part of the sample
        let client = match builder.build() {
            Ok(client) => client,
            Err(err) => {
                return ProbeResult::failure(ProbeError::Http(err), Duration::ZERO)
                    .with_dns_duration(dns_duration)
                    .with_address(address)
            }
        };

        let request_start = Instant::now();
        let result = match within(ctx, deadline, self.timeout, self.request(client)).await {
            Ok((status, bytes)) => {
                let elapsed = request_start.elapsed();
                let result = if status < 400 {
                    ProbeResult::success(elapsed)
                } else {
                    ProbeResult::failure(ProbeError::Status(status), elapsed)
                };
                result.with_meta("status", status).with_meta("bytes", bytes)
            }
            Err(err) => ProbeResult::failure(err, request_start.elapsed()),
        };

        result.with_dns_duration(dns_duration).with_address(address)
    }
}
