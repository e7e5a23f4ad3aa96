//! Protocol registry: maps a protocol identifier to a probe constructor

use crate::error::{AppError, Result};
use crate::models::Protocol;
use crate::probe::{HttpProbe, Probe, ProbeOptions, TcpProbe};
use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::sync::Arc;
use url::Url;

/// Builds a probe for a target URL
pub type ProbeConstructor = Arc<dyn Fn(&Url, &ProbeOptions) -> Result<Box<dyn Probe>> + Send + Sync>;

/// Registry of constructors keyed by protocol identifier.
///
/// Registering an identifier twice replaces the earlier entry. Entries are
/// never removed.
pub struct ProtocolRegistry<K, C> {
    entries: HashMap<K, C>,
}

/// The registry used by the binary
pub type ProbeRegistry = ProtocolRegistry<Protocol, ProbeConstructor>;

impl<K: Eq + Hash, C> ProtocolRegistry<K, C> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Store `constructor` under `id`, returning the one it replaced
    pub fn register(&mut self, id: K, constructor: C) -> Option<C> {
        self.entries.insert(id, constructor)
    }

    pub fn load(&self, id: &K) -> Option<&C> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &K) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Eq + Hash, C> Default for ProtocolRegistry<K, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash + Display> ProtocolRegistry<K, ProbeConstructor> {
    /// Construct the probe registered for `protocol`
    pub fn build(&self, protocol: &K, url: &Url, options: &ProbeOptions) -> Result<Box<dyn Probe>> {
        let constructor = self
            .load(protocol)
            .ok_or_else(|| AppError::unsupported_protocol(protocol.to_string()))?;
        constructor(url, options)
    }
}

/// Registry with the built-in TCP, HTTP and HTTPS probes
pub fn default_registry() -> ProbeRegistry {
    let mut registry = ProbeRegistry::new();
    registry.register(Protocol::Tcp, Arc::new(TcpProbe::from_url));
    registry.register(Protocol::Http, Arc::new(HttpProbe::from_url));
    registry.register(Protocol::Https, Arc::new(HttpProbe::from_url));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProbeResult;
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    struct FixedProbe(Duration);

    #[async_trait]
    impl Probe for FixedProbe {
        async fn probe(&self, _ctx: &CancellationToken) -> ProbeResult {
            ProbeResult::success(self.0)
        }
    }

    fn fixed(ms: u64) -> ProbeConstructor {
        Arc::new(move |_url: &Url, _opts: &ProbeOptions| -> Result<Box<dyn Probe>> {
            Ok(Box::new(FixedProbe(Duration::from_millis(ms))))
        })
    }

    #[test]
    fn test_default_registry_has_builtins() {
        let registry = default_registry();
        assert_eq!(registry.len(), 3);
        for protocol in Protocol::all() {
            assert!(registry.contains(&protocol));
        }
    }

    #[test]
    fn test_load_missing_is_none() {
        let registry: ProtocolRegistry<&str, u32> = ProtocolRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.load(&"icmp").is_none());
    }

    #[test]
    fn test_register_last_write_wins() {
        let mut registry: ProtocolRegistry<&str, u32> = ProtocolRegistry::new();
        assert_eq!(registry.register("tcp", 1), None);
        assert_eq!(registry.register("tcp", 2), Some(1));
        assert_eq!(registry.load(&"tcp"), Some(&2));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_build_uses_latest_constructor() {
        let mut registry = ProbeRegistry::new();
        registry.register(Protocol::Tcp, fixed(1));
        registry.register(Protocol::Tcp, fixed(2));

        let url = Url::parse("tcp://example.com:80").unwrap();
        let probe = registry.build(&Protocol::Tcp, &url, &ProbeOptions::default()).unwrap();
        let result = probe.probe(&CancellationToken::new()).await;
        assert_eq!(result.duration, Duration::from_millis(2));
    }

    #[test]
    fn test_build_unknown_protocol() {
        let registry = ProbeRegistry::new();
        let url = Url::parse("http://example.com").unwrap();
        let err = registry
            .build(&Protocol::Http, &url, &ProbeOptions::default())
            .err()
            .unwrap();
        assert!(matches!(err, AppError::UnsupportedProtocol(_)));
        assert_eq!(err.to_string(), "protocol http not supported");
    }

    #[test]
    fn test_registry_with_string_keys() {
        let mut registry: ProtocolRegistry<String, ProbeConstructor> = ProtocolRegistry::new();
        registry.register("custom".to_string(), fixed(5));
        let url = Url::parse("custom://host:1").unwrap();
        assert!(registry.build(&"custom".to_string(), &url, &ProbeOptions::default()).is_ok());
        assert!(registry.build(&"other".to_string(), &url, &ProbeOptions::default()).is_err());
    }

    #[test]
    fn test_constructor_errors_propagate() {
        let registry = default_registry();
        let url = Url::parse("tcp://example.com").unwrap();
        assert!(matches!(
            registry.build(&Protocol::Tcp, &url, &ProbeOptions::default()),
            Err(AppError::Construction(_))
        ));
    }
}
