//! Concrete probe descriptors.

use super::Port;
use std::fmt;
use std::net::IpAddr;

/// One `host:port/path` combination ready to be probed.
///
/// `host` is already in URL form: IPv6 addresses carry their brackets.
/// `path` has had its time macros substituted and never starts with `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProbeDescriptor {
    pub host: String,
    pub port: Port,
    pub path: String,
}

impl ProbeDescriptor {
    /// Create a descriptor for a host name or pre-formatted host.
    pub fn new(host: impl Into<String>, port: Port, path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            host: host.into(),
            port,
            path: path.trim_start_matches('/').to_string(),
        }
    }

    /// Create a descriptor for an IP address.
    pub fn for_ip(ip: IpAddr, port: Port, path: impl Into<String>) -> Self {
        Self::new(url_host(ip), port, path)
    }

    /// The plain-HTTP URL this descriptor points at.
    pub fn url(&self) -> String {
        format!("http://{}:{}/{}", self.host, self.port, self.path)
    }

    /// The same host and port with a different path.
    pub fn with_path(&self, path: impl Into<String>) -> Self {
        Self::new(self.host.clone(), self.port, path)
    }
}

impl fmt::Display for ProbeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url())
    }
}

/// Render an IP the way it appears in the authority part of a URL.
pub(crate) fn url_host(ip: IpAddr) -> String {
    match ip {
        IpAddr::V4(v4) => v4.to_string(),
        IpAddr::V6(v6) => format!("[{}]", v6),
    }
}
