//! Domain name resolution.
//!
//! Classification only needs to know whether a name resolves; probes for a
//! domain keep using the name itself so virtual hosts answer correctly.

use async_trait::async_trait;
use std::collections::HashMap;
use std::net::IpAddr;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::TokioAsyncResolver;

/// Name lookup abstraction.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Resolve `name` to its addresses, or describe why it failed.
    async fn lookup(&self, name: &str) -> Result<Vec<IpAddr>, String>;
}

/// Resolver backed by the system DNS configuration.
pub struct DnsResolver {
    inner: TokioAsyncResolver,
}

impl DnsResolver {
    /// Build a resolver from `/etc/resolv.conf`, falling back to the
    /// library defaults when the system configuration is unreadable.
    pub fn new() -> Self {
        let inner = TokioAsyncResolver::tokio_from_system_conf().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "system resolver configuration unavailable, using defaults");
            TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
        });
        Self { inner }
    }
}

impl Default for DnsResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Resolver for DnsResolver {
    async fn lookup(&self, name: &str) -> Result<Vec<IpAddr>, String> {
        let response = self.inner.lookup_ip(name).await.map_err(|e| e.to_string())?;
        Ok(response.iter().collect())
    }
}

/// Resolver answering from a fixed table.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    hosts: HashMap<String, Vec<IpAddr>>,
}

impl StaticResolver {
    /// Create an empty table; every lookup fails.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an address for `name`.
    pub fn with_host(mut self, name: impl Into<String>, ip: IpAddr) -> Self {
        self.hosts.entry(name.into()).or_default().push(ip);
        self
    }
}

#[async_trait]
impl Resolver for StaticResolver {
    async fn lookup(&self, name: &str) -> Result<Vec<IpAddr>, String> {
        self.hosts
            .get(name)
            .cloned()
            .ok_or_else(|| format!("no record for {}", name))
    }
}
