//! Host name resolution for probes
//!
//! Probes resolve through a [`DnsResolver`]: either the operating system's
//! resolver or a trust-dns resolver pinned to one user supplied name server.

use crate::error::{ProbeError, Result};
use crate::models::config::parse_resolver_addr;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use trust_dns_resolver::{
    config::{NameServerConfig, Protocol, ResolverConfig, ResolverOpts},
    TokioAsyncResolver,
};

/// Resolver used by the built-in probes
pub enum DnsResolver {
    /// Operating system resolver (getaddrinfo)
    System,
    /// Dedicated name server
    Custom {
        server: SocketAddr,
        resolver: TokioAsyncResolver,
    },
}

impl DnsResolver {
    /// Build a resolver that only queries `server`, over UDP with TCP fallback
    pub fn custom(server: SocketAddr, timeout: Duration) -> Self {
        let mut config = ResolverConfig::new();
        config.add_name_server(NameServerConfig::new(server, Protocol::Udp));
        config.add_name_server(NameServerConfig::new(server, Protocol::Tcp));

        let mut opts = ResolverOpts::default();
        opts.timeout = timeout;
        opts.attempts = 1;
        // every probe should measure a real lookup
        opts.cache_size = 0;

        Self::Custom {
            server,
            resolver: TokioAsyncResolver::tokio(config, opts),
        }
    }

    /// System resolver when `resolver` is `None`, a custom one otherwise
    pub fn from_config(resolver: Option<&str>, timeout: Duration) -> Result<Self> {
        match resolver {
            Some(addr) => Ok(Self::custom(parse_resolver_addr(addr)?, timeout)),
            None => Ok(Self::System),
        }
    }

    /// Resolve `host` to its addresses; IP literals are returned as-is
    pub async fn resolve(&self, host: &str) -> std::result::Result<Vec<IpAddr>, ProbeError> {
        if let Some(ip) = ip_literal(host) {
            return Ok(vec![ip]);
        }

        let ips: Vec<IpAddr> = match self {
            Self::System => tokio::net::lookup_host((host, 0))
                .await
                .map_err(|e| ProbeError::resolve(host, e))?
                .map(|addr| addr.ip())
                .collect(),
            Self::Custom { resolver, .. } => resolver
                .lookup_ip(host)
                .await
                .map_err(|e| ProbeError::resolve(host, e))?
                .iter()
                .collect(),
        };

        if ips.is_empty() {
            return Err(ProbeError::NoAddress(host.to_string()));
        }
        Ok(ips)
    }

    /// Resolve `host` and pick the address to dial
    pub async fn resolve_one(&self, host: &str) -> std::result::Result<IpAddr, ProbeError> {
        let ips = self.resolve(host).await?;
        pick_address(&ips).ok_or_else(|| ProbeError::NoAddress(host.to_string()))
    }

    pub fn describe(&self) -> String {
        match self {
            Self::System => "system".to_string(),
            Self::Custom { server, .. } => server.to_string(),
        }
    }
}

impl Default for DnsResolver {
    fn default() -> Self {
        Self::System
    }
}

impl fmt::Debug for DnsResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DnsResolver({})", self.describe())
    }
}

/// Parse `host` as an IP address, accepting bracketed IPv6
pub fn ip_literal(host: &str) -> Option<IpAddr> {
    host.trim_start_matches('[')
        .trim_end_matches(']')
        .parse()
        .ok()
}

/// Prefer IPv4 the way most dialers do, fall back to the first address
pub fn pick_address(ips: &[IpAddr]) -> Option<IpAddr> {
    ips.iter().copied().find(IpAddr::is_ipv4).or_else(|| ips.first().copied())
}
