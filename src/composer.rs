//! Fabric composer.
//!
//! This module coordinates the overall composition, managing the flow from
//! the resolved configuration through segment, hub and VPN creation,
//! attachments, routing domains and subnet routes to the final invariant
//! checks and build plan order. Composition runs in a single pass; the first
//! failure aborts it and nothing is returned.

use crate::config::{Config, ResolvedConfig};
use crate::error::{AtStep, ComposeError, ComposeStep, TopologyError};
use crate::plan::{BuildPlan, NodeId};
use crate::topology::{
    Attachment, AttachmentId, AttachmentRegistry, Hub, RoutingDomainBuilder, RoutingDomains,
    Segment, SegmentRole, Spokes, SubnetRoute, SubnetRouteInstaller, VpnLink,
};
use crate::utils::validation::{
    validate_associations, validate_default_routes, validate_peer_route_symmetry,
    validate_propagation_symmetry, validate_vpn_isolation,
};
use log::info;

/// A complete, validated fabric topology for one region
#[derive(Debug, Clone)]
pub struct Composition {
    region: String,
    hub: Hub,
    vpn: VpnLink,
    segments: Vec<Segment>,
    attachments: Vec<Attachment>,
    domains: RoutingDomains,
    routes: Vec<SubnetRoute>,
    plan: BuildPlan,
    order: Vec<NodeId>,
    execution_role: Option<String>,
}

impl Composition {
    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn hub(&self) -> &Hub {
        &self.hub
    }

    pub fn vpn(&self) -> &VpnLink {
        &self.vpn
    }

    /// Segments in creation order: development, production, on-prem
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn segment(&self, role: SegmentRole) -> Option<&Segment> {
        self.segments.iter().find(|segment| segment.role == role)
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn domains(&self) -> &RoutingDomains {
        &self.domains
    }

    /// Subnet routes ordered by route key
    pub fn routes(&self) -> &[SubnetRoute] {
        &self.routes
    }

    pub fn plan(&self) -> &BuildPlan {
        &self.plan
    }

    /// Build plan nodes in evaluation order
    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    pub fn execution_role(&self) -> Option<&str> {
        self.execution_role.as_deref()
    }
}

/// Compose the fabric of `region` from a configuration
pub fn compose(config: &Config, region: &str) -> Result<Composition, ComposeError> {
    info!("Composing fabric for region {}", region);
    let resolved = config.resolve(region).at(ComposeStep::ResolveConfig)?;
    compose_resolved(resolved)
}

/// Compose the fabric from an already resolved configuration
pub fn compose_resolved(resolved: ResolvedConfig) -> Result<Composition, ComposeError> {
    let mut plan = BuildPlan::new();

    let [development, production, on_prem] =
        resolved.segments().map(|segment| Segment::from_plan(segment));
    for segment in [&development, &production, &on_prem] {
        plan.declare_root(NodeId::Segment(segment.name.clone()))
            .at(ComposeStep::CreateSegments)?;
        info!(
            "Created segment {} ({}) with {} subnet(s)",
            segment.id,
            segment.cidr,
            segment.subnets.len()
        );
    }

    let hub = Hub::new(resolved.hub_asn);
    plan.declare_root(NodeId::Hub).at(ComposeStep::CreateHub)?;
    info!("Created hub {} (ASN {})", hub.id, hub.asn);

    let mut vpn = VpnLink::new(
        u64::from(resolved.customer_asn),
        hub.asn,
        resolved.on_prem_public_ip.to_string(),
    );
    vpn.create_customer_gateway(&mut plan)
        .at(ComposeStep::CustomerGateway)?;
    vpn.bind_transit_gateway(&hub, &plan)
        .at(ComposeStep::TransitGateway)?;
    vpn.establish_connection(&mut plan)
        .at(ComposeStep::VpnConnection)?;

    let mut registry = AttachmentRegistry::new();
    let dev_attachment = registry
        .attach(&development, &hub, &mut plan)
        .at(ComposeStep::Attach)?
        .id;
    let prod_attachment = registry
        .attach(&production, &hub, &mut plan)
        .at(ComposeStep::Attach)?
        .id;
    let vpn_attachment = registry
        .attach_vpn(&mut vpn, &hub, &mut plan)
        .at(ComposeStep::Attach)?
        .id;

    let spokes = Spokes {
        development: &dev_attachment,
        production: &prod_attachment,
        vpn: &vpn_attachment,
    };
    let domains = RoutingDomainBuilder::new(&registry)
        .build_hub_and_spoke(&hub, spokes, &mut plan)
        .at(ComposeStep::RoutingDomains)?;

    let mut installer = SubnetRouteInstaller::new(&hub, &registry, &domains);
    installer
        .install_peer_routes(&development, &production, &mut plan)
        .at(ComposeStep::SubnetRoutes)?;
    installer
        .install_peer_routes(&production, &development, &mut plan)
        .at(ComposeStep::SubnetRoutes)?;
    installer
        .install_default_routes(&on_prem, &vpn_attachment, &mut plan)
        .at(ComposeStep::SubnetRoutes)?;
    let routes = installer.finish();

    let segments = vec![development, production, on_prem];
    validate_composition(&hub, &segments, &registry, &domains, &vpn_attachment, &routes)
        .at(ComposeStep::Validate)?;

    let order = plan.evaluation_order().at(ComposeStep::Plan)?;
    info!(
        "Composed {} resources: {} attachments, {} routing domains, {} subnet routes",
        order.len(),
        registry.len(),
        domains.len(),
        routes.len()
    );

    Ok(Composition {
        region: resolved.region,
        hub,
        vpn,
        segments,
        attachments: registry.iter().cloned().collect(),
        domains,
        routes,
        plan,
        order,
        execution_role: resolved.execution_role,
    })
}

/// Check the reachability invariants of a wired topology
fn validate_composition(
    hub: &Hub,
    segments: &[Segment],
    registry: &AttachmentRegistry,
    domains: &RoutingDomains,
    vpn_attachment: &AttachmentId,
    routes: &[SubnetRoute],
) -> Result<(), TopologyError> {
    validate_associations(registry.iter(), domains)?;
    validate_vpn_isolation(vpn_attachment, domains)?;
    validate_propagation_symmetry(domains)?;

    let cloud: Vec<&Segment> = segments
        .iter()
        .filter(|segment| !segment.role.is_on_prem_facing())
        .collect();
    for (i, a) in cloud.iter().enumerate() {
        for b in &cloud[i + 1..] {
            validate_peer_route_symmetry(routes, a, b, &hub.id)?;
        }
    }
    for segment in segments.iter().filter(|segment| segment.role.is_on_prem_facing()) {
        validate_default_routes(routes, segment, &hub.id)?;
    }
    Ok(())
}
