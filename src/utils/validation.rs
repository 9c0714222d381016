//! Topology validation utilities.
//!
//! This module checks a composed topology against the reachability rules of
//! the fabric: single association per attachment, propagation in both
//! directions between domains, symmetric peer routes and a single default
//! route per on-prem-facing subnet.

use crate::error::TopologyError;
use crate::ip::DEFAULT_ROUTE;
use crate::topology::{
    Attachment, AttachmentId, DomainKind, RoutingDomains, Segment, SubnetRoute,
};

/// Validate that propagation between domains is reciprocal
///
/// Checks, for every ordered pair of domains (X, Y): if any attachment
/// associated with X is propagated into Y, then every attachment associated
/// with Y is propagated into X. One-way propagation gives one-way
/// reachability across the hub.
///
/// # Arguments
/// * `domains` - The routing domains to check
///
/// # Returns
/// * `Ok(())` if all propagation is reciprocal
/// * `Err(TopologyError::AsymmetricPropagation)` naming the missing direction
pub fn validate_propagation_symmetry(domains: &RoutingDomains) -> Result<(), TopologyError> {
    for from in domains.iter() {
        for into in domains.iter().filter(|d| d.kind != from.kind) {
            let flows = from.associations.iter().any(|id| into.is_propagated(id));
            if !flows {
                continue;
            }
            if let Some(missing) = into.associations.iter().find(|id| !from.is_propagated(id)) {
                return Err(TopologyError::AsymmetricPropagation {
                    from: from.kind.to_string(),
                    into: into.kind.to_string(),
                    missing: missing.to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Validate that every attachment is associated with exactly one domain
///
/// # Arguments
/// * `attachments` - All attachments registered on the hub
/// * `domains` - The routing domains
///
/// # Returns
/// * `Ok(())` if each attachment has exactly one association
/// * `Err(TopologyError)` for the first unassociated or doubly associated attachment
pub fn validate_associations<'a, I>(
    attachments: I,
    domains: &RoutingDomains,
) -> Result<(), TopologyError>
where
    I: IntoIterator<Item = &'a Attachment>,
{
    for attachment in attachments {
        let members: Vec<DomainKind> = domains
            .iter()
            .filter(|d| d.is_associated(&attachment.id))
            .map(|d| d.kind)
            .collect();
        match members.as_slice() {
            [_] => {}
            [] => {
                return Err(TopologyError::Unassociated {
                    attachment: attachment.id.to_string(),
                })
            }
            [first, second, ..] => {
                return Err(TopologyError::ConflictingAssociation {
                    attachment: attachment.id.to_string(),
                    existing: first.to_string(),
                    requested: second.to_string(),
                })
            }
        }
    }
    Ok(())
}

/// Validate that the VPN attachment is kept out of the cloud domain
///
/// The VPN attachment must be associated only with the VPN domain and
/// reach the cloud domain through propagation.
pub fn validate_vpn_isolation(
    vpn: &AttachmentId,
    domains: &RoutingDomains,
) -> Result<(), TopologyError> {
    let cloud = domains.get(DomainKind::Cloud)?;
    if cloud.is_associated(vpn) {
        return Err(TopologyError::ConflictingAssociation {
            attachment: vpn.to_string(),
            existing: DomainKind::Cloud.to_string(),
            requested: DomainKind::Vpn.to_string(),
        });
    }
    if !cloud.is_propagated(vpn) {
        return Err(TopologyError::dangling(
            "cloud domain",
            format!("a propagation of {}", vpn),
        ));
    }
    Ok(())
}

/// Validate that two cloud segments route to each other through the hub
///
/// Every subnet of `a` needs a route to `b`'s block and every subnet of `b`
/// a route to `a`'s block, each targeting `hub_id`.
pub fn validate_peer_route_symmetry(
    routes: &[SubnetRoute],
    a: &Segment,
    b: &Segment,
    hub_id: &str,
) -> Result<(), TopologyError> {
    for (segment, peer) in [(a, b), (b, a)] {
        for subnet in &segment.subnets {
            let found = routes.iter().any(|route| {
                route.key.segment == segment.name
                    && route.key.subnet_index == subnet.index
                    && route.destination == peer.cidr
                    && route.target == hub_id
            });
            if !found {
                return Err(TopologyError::MissingRoute {
                    segment: segment.name.clone(),
                    destination: peer.cidr.to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Validate that each subnet of the on-prem-facing segment has exactly one
/// default route targeting the hub
pub fn validate_default_routes(
    routes: &[SubnetRoute],
    segment: &Segment,
    hub_id: &str,
) -> Result<(), TopologyError> {
    for subnet in &segment.subnets {
        let defaults: Vec<&SubnetRoute> = routes
            .iter()
            .filter(|route| {
                route.key.segment == segment.name
                    && route.key.subnet_index == subnet.index
                    && route.destination == DEFAULT_ROUTE
            })
            .collect();
        match defaults.as_slice() {
            [route] if route.target == hub_id => {}
            [_, second, ..] => {
                return Err(TopologyError::DuplicateRoute {
                    key: second.key.to_string(),
                })
            }
            _ => {
                return Err(TopologyError::MissingRoute {
                    segment: segment.name.clone(),
                    destination: DEFAULT_ROUTE.to_string(),
                })
            }
        }
    }
    Ok(())
}
