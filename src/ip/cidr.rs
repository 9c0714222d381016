//! IPv4 helpers for segment ranges and the on-prem endpoint.

use crate::config::ValidationError;
use ipnet::Ipv4Net;
use std::net::Ipv4Addr;

/// Destination of the on-prem-facing default route
pub const DEFAULT_ROUTE: Ipv4Net = Ipv4Net::new_assert(Ipv4Addr::UNSPECIFIED, 0);

/// Parse an IPv4 network block, rejecting host bits outside the prefix
pub fn parse_ipv4_cidr(label: &str, value: &str) -> Result<Ipv4Net, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::InvalidCidr(format!(
            "CIDR for '{}' is missing",
            label
        )));
    }
    let net: Ipv4Net = value.parse().map_err(|e| {
        ValidationError::InvalidCidr(format!(
            "'{}' for '{}' is not an IPv4 CIDR: {}",
            value, label, e
        ))
    })?;
    if net.trunc() != net {
        return Err(ValidationError::InvalidCidr(format!(
            "'{}' for '{}' has host bits set (expected {})",
            value,
            label,
            net.trunc()
        )));
    }
    Ok(net)
}

/// Carve the first `count` subnets of length `mask` out of `cidr`
pub fn carve_subnets(
    label: &str,
    cidr: Ipv4Net,
    mask: u8,
    count: usize,
) -> Result<Vec<Ipv4Net>, ValidationError> {
    let subnets: Vec<Ipv4Net> = cidr
        .subnets(mask)
        .map_err(|_| {
            ValidationError::InvalidSubnets(format!(
                "mask /{} cannot split '{}' block {}",
                mask, label, cidr
            ))
        })?
        .take(count)
        .collect();

    if subnets.len() < count {
        return Err(ValidationError::InvalidSubnets(format!(
            "'{}' block {} holds only {} /{} subnets, {} requested",
            label,
            cidr,
            subnets.len(),
            mask,
            count
        )));
    }
    Ok(subnets)
}

/// Check whether two network blocks share any address
pub fn overlaps(a: &Ipv4Net, b: &Ipv4Net) -> bool {
    a.contains(&b.network()) || b.contains(&a.network())
}

/// Parse the on-prem endpoint address, which must be a routable IPv4 address
pub fn parse_public_ipv4(value: &str) -> Result<Ipv4Addr, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::InvalidAddress(
            "on-prem public IP is empty".to_string(),
        ));
    }
    let ip: Ipv4Addr = value.parse().map_err(|_| {
        ValidationError::InvalidAddress(format!("'{}' is not an IPv4 address", value))
    })?;

    if ip.is_private()
        || ip.is_loopback()
        || ip.is_unspecified()
        || ip.is_link_local()
        || ip.is_broadcast()
        || ip.is_multicast()
    {
        return Err(ValidationError::InvalidAddress(format!(
            "'{}' is not a publicly routable address",
            ip
        )));
    }
    Ok(ip)
}
