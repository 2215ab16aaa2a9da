//! Batched walking of an address block.

use super::is_bad_host;
use ipnetwork::IpNetwork;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    V4,
    V6,
}

/// One batch of host addresses taken from a cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub hosts: Vec<IpAddr>,
    /// True when the cursor has nothing left after this batch.
    pub completed: bool,
}

/// Position inside one block or range, advanced one batch at a time.
///
/// Addresses are handled as integers so IPv4 and IPv6 blocks of any size,
/// including `/0`, share the same walk.
#[derive(Debug, Clone)]
pub struct EnumerationCursor {
    family: Family,
    next: Option<u128>,
    last: u128,
}

impl EnumerationCursor {
    /// Start at the network address of `network` (the address masked by its prefix).
    pub fn new(network: IpNetwork) -> Self {
        match network {
            IpNetwork::V4(net) => Self {
                family: Family::V4,
                next: Some(u32::from(net.network()) as u128),
                last: u32::from(net.broadcast()) as u128,
            },
            IpNetwork::V6(net) => {
                let first = u128::from(net.network());
                let host_bits = 128 - u32::from(net.prefix());
                let span = if host_bits == 128 {
                    u128::MAX
                } else {
                    (1u128 << host_bits) - 1
                };
                Self {
                    family: Family::V6,
                    next: Some(first),
                    last: first | span,
                }
            }
        }
    }

    /// Walk an inclusive IPv4 range. Returns `None` when `start > end`.
    pub fn for_ipv4_range(start: Ipv4Addr, end: Ipv4Addr) -> Option<Self> {
        let (first, last) = (u32::from(start), u32::from(end));
        (first <= last).then(|| Self {
            family: Family::V4,
            next: Some(first as u128),
            last: last as u128,
        })
    }

    /// Number of addresses not yet walked, bad hosts included.
    pub fn remaining(&self) -> u128 {
        self.next
            .map_or(0, |next| (self.last - next).saturating_add(1))
    }

    /// Whether the block has been fully walked.
    pub fn is_exhausted(&self) -> bool {
        self.next.is_none()
    }

    /// Collect up to `limit` usable hosts.
    ///
    /// Bad hosts are skipped without counting against the limit. Trailing bad
    /// hosts are consumed too, so the batch that takes the last usable host
    /// already reports completion.
    pub fn next_batch(&mut self, limit: usize) -> Batch {
        let limit = limit.max(1);
        let mut hosts = Vec::with_capacity(limit.min(self.remaining().min(4096) as usize));

        while hosts.len() < limit {
            let Some(ip) = self.take() else { break };
            if !is_bad_host(ip) {
                hosts.push(ip);
            }
        }

        while let Some(ip) = self.peek() {
            if !is_bad_host(ip) {
                break;
            }
            self.take();
        }

        Batch {
            hosts,
            completed: self.is_exhausted(),
        }
    }

    fn peek(&self) -> Option<IpAddr> {
        self.next.map(|n| self.to_addr(n))
    }

    fn take(&mut self) -> Option<IpAddr> {
        let current = self.next?;
        self.next = if current == self.last {
            None
        } else {
            Some(current + 1)
        };
        Some(self.to_addr(current))
    }

    fn to_addr(&self, value: u128) -> IpAddr {
        match self.family {
            Family::V4 => IpAddr::V4(Ipv4Addr::from(value as u32)),
            Family::V6 => IpAddr::V6(Ipv6Addr::from(value)),
        }
    }
}

impl Iterator for EnumerationCursor {
    type Item = IpAddr;

    /// Yield usable hosts one at a time.
    fn next(&mut self) -> Option<IpAddr> {
        loop {
            let ip = self.take()?;
            if !is_bad_host(ip) {
                return Some(ip);
            }
        }
    }
}
