//! Scan target classification.
//!
//! Every line of the target file is classified exactly once into one of:
//! - an explicit endpoint (`1.2.3.4:8080`, `[::1]:8080`)
//! - a single IP address (IPv4 and IPv6)
//! - CIDR notation (`192.168.1.0/24`)
//! - an address range (`10.0.0.1-10.0.0.9`)
//! - a resolvable domain name

use crate::resolve::Resolver;
use ipnetwork::IpNetwork;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// A classified scan target. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanTarget {
    /// A domain name that resolved at classification time.
    Domain(String),
    /// A single IP address.
    SingleHost(IpAddr),
    /// A CIDR network block.
    Cidr(IpNetwork),
    /// An inclusive address range of one family.
    IpRange(IpAddr, IpAddr),
    /// A host with a fixed port; skips address enumeration.
    Endpoint(SocketAddr),
}

/// Error type for target classification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetError {
    #[error("malformed target: {0}")]
    Malformed(String),
    #[error("failed to resolve domain '{0}': {1}")]
    Unresolvable(String, String),
    #[error("range endpoints must share an address family: {0} - {1}")]
    MixedFamilies(IpAddr, IpAddr),
    #[error("range start {0} is greater than end {1}")]
    InvertedRange(IpAddr, IpAddr),
}

impl ScanTarget {
    /// Classify a target line, resolving it through `resolver` when it looks
    /// like a domain name.
    ///
    /// The first matching rule wins: IP literal, CIDR block, address range,
    /// then domain. Domains are only accepted once they resolve, so a target
    /// that fails resolution never produces any probe.
    pub async fn classify(line: &str, resolver: &dyn Resolver) -> Result<Self, TargetError> {
        let line = line.trim();

        if let Some(target) = Self::classify_literal(line)? {
            return Ok(target);
        }

        if line.chars().any(char::is_alphabetic) {
            return match resolver.lookup(line).await {
                Ok(addrs) if !addrs.is_empty() => Ok(Self::Domain(line.to_string())),
                Ok(_) => Err(TargetError::Unresolvable(
                    line.to_string(),
                    "no addresses returned".to_string(),
                )),
                Err(e) => Err(TargetError::Unresolvable(line.to_string(), e)),
            };
        }

        Err(TargetError::Malformed(line.to_string()))
    }

    /// Classify the forms that need no name lookup.
    fn classify_literal(line: &str) -> Result<Option<Self>, TargetError> {
        if let Ok(addr) = line.parse::<SocketAddr>() {
            if addr.port() != 0 {
                return Ok(Some(Self::Endpoint(addr)));
            }
        }

        if let Ok(ip) = line.parse::<IpAddr>() {
            return Ok(Some(Self::SingleHost(ip)));
        }

        if line.contains('/') {
            if let Ok(network) = line.parse::<IpNetwork>() {
                return Ok(Some(Self::Cidr(network)));
            }
        }

        if let Some((start, end)) = split_range(line) {
            return match (start, end) {
                (IpAddr::V4(_), IpAddr::V4(_)) | (IpAddr::V6(_), IpAddr::V6(_)) => {
                    Ok(Some(Self::IpRange(start, end)))
                }
                _ => Err(TargetError::MixedFamilies(start, end)),
            };
        }

        Ok(None)
    }
}

impl fmt::Display for ScanTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Domain(name) => write!(f, "{}", name),
            Self::SingleHost(ip) => write!(f, "{}", ip),
            Self::Cidr(network) => write!(f, "{}", network),
            Self::IpRange(start, end) => write!(f, "{}-{}", start, end),
            Self::Endpoint(addr) => write!(f, "{}", addr),
        }
    }
}

/// Split `a-b` where both halves are IP addresses.
fn split_range(line: &str) -> Option<(IpAddr, IpAddr)> {
    let mut parts = line.split('-');
    let (start, end) = (parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    Some((start.trim().parse().ok()?, end.trim().parse().ok()?))
}
