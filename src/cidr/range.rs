//! Address range expansion.

use crate::types::TargetError;
use ipnetwork::IpNetwork;
use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Expand an inclusive address range into one-host blocks, in order.
///
/// IPv4 ranges are a plain linear walk. IPv6 ranges go through
/// [`ipv6_range_addresses`] and inherit its limitations.
pub fn ip_range_to_cidrs(start: IpAddr, end: IpAddr) -> Result<Vec<IpNetwork>, TargetError> {
    match (start, end) {
        (IpAddr::V4(s), IpAddr::V4(e)) => {
            if s > e {
                return Err(TargetError::InvertedRange(start, end));
            }
            Ok((u32::from(s)..=u32::from(e))
                .map(|n| IpNetwork::from(IpAddr::V4(Ipv4Addr::from(n))))
                .collect())
        }
        (IpAddr::V6(s), IpAddr::V6(e)) => Ok(ipv6_range_addresses(s, e)?
            .into_iter()
            .map(|ip| IpNetwork::from(IpAddr::V6(ip)))
            .collect()),
        _ => Err(TargetError::MixedFamilies(start, end)),
    }
}

/// Enumerate an IPv6 range hextet by hextet.
///
/// The leading hextets shared by `start` and `end` stay fixed. Every later
/// position contributes the values between its start and end hextet, each
/// placed in the first position after the shared prefix with the remaining
/// hextets zeroed. Positions are not combined with each other, so the result
/// is only the true range when the endpoints differ in their last hextet.
/// Duplicates are dropped, first occurrence wins.
pub fn ipv6_range_addresses(start: Ipv6Addr, end: Ipv6Addr) -> Result<Vec<Ipv6Addr>, TargetError> {
    if start > end {
        return Err(TargetError::InvertedRange(IpAddr::V6(start), IpAddr::V6(end)));
    }

    let (from, to) = (start.segments(), end.segments());
    let shared = from.iter().zip(to.iter()).take_while(|(a, b)| a == b).count();
    if shared == from.len() {
        return Ok(vec![start]);
    }

    let mut seen = HashSet::new();
    let mut addresses = Vec::new();
    for position in shared..from.len() {
        for value in from[position]..=to[position] {
            let mut segments = [0u16; 8];
            segments[..shared].copy_from_slice(&from[..shared]);
            segments[shared] = value;

            let ip = Ipv6Addr::from(segments);
            if seen.insert(ip) {
                addresses.push(ip);
            }
        }
    }
    Ok(addresses)
}
