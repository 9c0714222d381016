//! Fabric topology.
//!
//! This module holds the pieces the composer wires together: segments and
//! the hub, the VPN link, the attachment registry, the routing domain
//! builder and the subnet route installer.

pub mod attachments;
pub mod domains;
pub mod routes;
pub mod types;
pub mod vpn;

// Re-export key types for easier access
pub use attachments::{Attachment, AttachmentRegistry};
pub use domains::{DomainKind, RoutingDomain, RoutingDomainBuilder, RoutingDomains, Spokes};
pub use routes::{RouteKey, SubnetRoute, SubnetRouteInstaller};
pub use types::{AttachmentId, AttachmentOwner, Hub, Segment, SegmentRole, Subnet};
pub use vpn::{VpnLink, VpnState};

#[cfg(test)]
pub(crate) fn net(cidr: &str) -> ipnet::Ipv4Net {
    cidr.parse().unwrap()
}
