//! Subnet route installation.
//!
//! Cloud segments get one route per subnet towards the peer segment's block;
//! the on-prem-facing segment gets a default route per subnet. Every route
//! targets the hub and is declared after the attachment it depends on, the
//! attachment's association, and the propagation that makes its destination
//! visible in the attachment's domain.

use super::attachments::AttachmentRegistry;
use super::domains::{RoutingDomain, RoutingDomains};
use super::types::{AttachmentId, Hub, Segment, Subnet};
use crate::error::TopologyError;
use crate::ip::DEFAULT_ROUTE;
use crate::plan::{BuildPlan, NodeId};
use ipnet::Ipv4Net;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Deterministic identity of a subnet route
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RouteKey {
    pub segment: String,
    pub subnet_index: usize,
    pub destination: Ipv4Net,
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.segment, self.subnet_index, self.destination)
    }
}

/// A static route in a segment subnet's route table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubnetRoute {
    pub key: RouteKey,
    pub route_table_id: String,
    pub destination: Ipv4Net,
    /// Hub the traffic is sent to
    pub target: String,
    pub depends_on: AttachmentId,
}

impl SubnetRoute {
    pub fn is_default(&self) -> bool {
        self.destination == DEFAULT_ROUTE
    }
}

/// Writes hub-bound routes into segment subnets
pub struct SubnetRouteInstaller<'a> {
    hub: &'a Hub,
    registry: &'a AttachmentRegistry,
    domains: &'a RoutingDomains,
    routes: BTreeMap<RouteKey, SubnetRoute>,
}

impl<'a> SubnetRouteInstaller<'a> {
    pub fn new(
        hub: &'a Hub,
        registry: &'a AttachmentRegistry,
        domains: &'a RoutingDomains,
    ) -> Self {
        SubnetRouteInstaller {
            hub,
            registry,
            domains,
            routes: BTreeMap::new(),
        }
    }

    fn domain_of(
        &self,
        segment: &Segment,
        attachment: &AttachmentId,
    ) -> Result<&'a RoutingDomain, TopologyError> {
        self.domains.domain_of(attachment).ok_or_else(|| {
            TopologyError::dangling(
                format!("routes of segment '{}'", segment.name),
                format!("an association of {}", attachment),
            )
        })
    }

    /// Route each subnet of `segment` towards `peer`'s block through the hub
    pub fn install_peer_routes(
        &mut self,
        segment: &Segment,
        peer: &Segment,
        plan: &mut BuildPlan,
    ) -> Result<usize, TopologyError> {
        let attachment = self.registry.get(&segment.owner())?.id.clone();
        let peer_attachment = self.registry.get(&peer.owner())?.id.clone();
        let domain = self.domain_of(segment, &attachment)?;
        if !domain.is_propagated(&peer_attachment) {
            return Err(TopologyError::dangling(
                format!("routes of segment '{}'", segment.name),
                NodeId::Propagation(domain.kind, peer_attachment.clone()),
            ));
        }

        let deps = vec![
            NodeId::Association(domain.kind, attachment.clone()),
            NodeId::Propagation(domain.kind, peer_attachment.clone()),
        ];
        self.install_all(segment, peer.cidr, &attachment, deps, plan)
    }

    /// Give each subnet of the on-prem-facing `segment` a default route.
    ///
    /// The routes wait on every propagation into the VPN attachment's domain,
    /// so on-prem only sends traffic once the cloud routes are visible to it.
    pub fn install_default_routes(
        &mut self,
        segment: &Segment,
        via: &AttachmentId,
        plan: &mut BuildPlan,
    ) -> Result<usize, TopologyError> {
        if !self.registry.contains_id(via) {
            return Err(TopologyError::dangling(
                format!("routes of segment '{}'", segment.name),
                NodeId::Attachment(via.clone()),
            ));
        }
        let domain = self.domain_of(segment, via)?;
        if domain.propagations.is_empty() {
            return Err(TopologyError::dangling(
                format!("routes of segment '{}'", segment.name),
                format!("a propagation into {} domain", domain.kind),
            ));
        }

        let mut deps = vec![NodeId::Association(domain.kind, via.clone())];
        deps.extend(
            domain
                .propagations
                .iter()
                .map(|id| NodeId::Propagation(domain.kind, id.clone())),
        );
        self.install_all(segment, DEFAULT_ROUTE, via, deps, plan)
    }

    fn install_all(
        &mut self,
        segment: &Segment,
        destination: Ipv4Net,
        attachment: &AttachmentId,
        deps: Vec<NodeId>,
        plan: &mut BuildPlan,
    ) -> Result<usize, TopologyError> {
        if segment.subnets.is_empty() {
            log::warn!(
                "Segment '{}' has no subnets, no route to {} installed",
                segment.name,
                destination
            );
            return Ok(0);
        }
        for subnet in &segment.subnets {
            self.install(segment, subnet, destination, attachment, &deps, plan)?;
        }
        Ok(segment.subnets.len())
    }

    fn install(
        &mut self,
        segment: &Segment,
        subnet: &Subnet,
        destination: Ipv4Net,
        attachment: &AttachmentId,
        deps: &[NodeId],
        plan: &mut BuildPlan,
    ) -> Result<(), TopologyError> {
        let key = RouteKey {
            segment: segment.name.clone(),
            subnet_index: subnet.index,
            destination,
        };
        if self.routes.contains_key(&key) {
            return Err(TopologyError::DuplicateRoute {
                key: key.to_string(),
            });
        }

        let mut route_deps = vec![
            NodeId::Segment(segment.name.clone()),
            NodeId::Attachment(attachment.clone()),
        ];
        route_deps.extend(deps.iter().cloned());
        plan.declare(NodeId::SubnetRoute(key.clone()), route_deps)?;

        log::info!(
            "Route {} -> {} in {} (after {})",
            destination,
            self.hub.id,
            subnet.route_table_id,
            attachment
        );
        self.routes.insert(
            key.clone(),
            SubnetRoute {
                key,
                route_table_id: subnet.route_table_id.clone(),
                destination,
                target: self.hub.id.clone(),
                depends_on: attachment.clone(),
            },
        );
        Ok(())
    }

    /// Installed routes ordered by key
    pub fn finish(self) -> Vec<SubnetRoute> {
        self.routes.into_values().collect()
    }
}
