//! Address-space enumeration.
//!
//! CIDR blocks and address ranges are walked in bounded batches so that a
//! `/0`-sized target never materialises more than one batch of hosts at a
//! time. IPv4 addresses ending in `.0` or `.255` are never produced.

mod batch;
mod range;

pub use batch::{Batch, EnumerationCursor};
pub use range::{ip_range_to_cidrs, ipv6_range_addresses};

use ipnetwork::IpNetwork;
use std::net::IpAddr;

/// Whether `ip` is an IPv4 network/broadcast style host (last octet 0 or 255).
///
/// IPv6 addresses are never excluded.
pub fn is_bad_host(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => matches!(v4.octets()[3], 0 | 255),
        IpAddr::V6(_) => false,
    }
}

/// Rewrite a single address as a one-host block (`/32` or `/128`).
pub fn single_host_network(ip: IpAddr) -> IpNetwork {
    IpNetwork::from(ip)
}

/// Parse a literal address into its one-host block.
pub fn cidr_from_single_ip(literal: &str) -> Option<IpNetwork> {
    literal.trim().parse::<IpAddr>().ok().map(single_host_network)
}
