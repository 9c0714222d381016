//! Routing domains on the hub.
//!
//! Association decides which route table an attachment's traffic is looked
//! up in; propagation decides whose routes show up in a route table. The
//! cloud segments share one domain, the VPN link has its own, and the two
//! are coupled only through propagation in both directions.

use super::attachments::AttachmentRegistry;
use super::types::{AttachmentId, Hub};
use crate::error::TopologyError;
use crate::plan::{BuildPlan, NodeId};
use crate::utils::validation::validate_propagation_symmetry;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Routing domains known to the fabric
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DomainKind {
    /// Shared by the development and production attachments
    Cloud,
    /// Holds only the VPN attachment
    Vpn,
}

impl DomainKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DomainKind::Cloud => "cloud",
            DomainKind::Vpn => "vpn",
        }
    }

    pub fn route_table_id(&self) -> String {
        format!("tgw-rtb-{}", self.as_str())
    }
}

impl fmt::Display for DomainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A route table on the hub
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutingDomain {
    pub kind: DomainKind,
    pub id: String,
    pub associations: BTreeSet<AttachmentId>,
    pub propagations: BTreeSet<AttachmentId>,
}

impl RoutingDomain {
    fn new(kind: DomainKind) -> Self {
        RoutingDomain {
            kind,
            id: kind.route_table_id(),
            associations: BTreeSet::new(),
            propagations: BTreeSet::new(),
        }
    }

    pub fn is_associated(&self, attachment: &AttachmentId) -> bool {
        self.associations.contains(attachment)
    }

    pub fn is_propagated(&self, attachment: &AttachmentId) -> bool {
        self.propagations.contains(attachment)
    }
}

/// The finished set of routing domains
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingDomains {
    domains: BTreeMap<DomainKind, RoutingDomain>,
}

impl RoutingDomains {
    pub fn from_domains(domains: impl IntoIterator<Item = RoutingDomain>) -> Self {
        RoutingDomains {
            domains: domains.into_iter().map(|d| (d.kind, d)).collect(),
        }
    }

    pub fn get(&self, kind: DomainKind) -> Result<&RoutingDomain, TopologyError> {
        self.domains
            .get(&kind)
            .ok_or_else(|| TopologyError::dangling("reference", NodeId::RoutingDomain(kind)))
    }

    /// Domain the attachment is associated with
    pub fn domain_of(&self, attachment: &AttachmentId) -> Option<&RoutingDomain> {
        self.domains.values().find(|d| d.is_associated(attachment))
    }

    /// Number of domains the attachment is associated with
    pub fn association_count(&self, attachment: &AttachmentId) -> usize {
        self.domains.values().filter(|d| d.is_associated(attachment)).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoutingDomain> {
        self.domains.values()
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}

/// Attachments wired by the hub-and-spoke layout
#[derive(Debug, Clone, Copy)]
pub struct Spokes<'a> {
    pub development: &'a AttachmentId,
    pub production: &'a AttachmentId,
    pub vpn: &'a AttachmentId,
}

/// Builds route tables and wires associations and propagations
pub struct RoutingDomainBuilder<'a> {
    registry: &'a AttachmentRegistry,
    domains: BTreeMap<DomainKind, RoutingDomain>,
    associated: BTreeMap<AttachmentId, DomainKind>,
}

impl<'a> RoutingDomainBuilder<'a> {
    pub fn new(registry: &'a AttachmentRegistry) -> Self {
        RoutingDomainBuilder {
            registry,
            domains: BTreeMap::new(),
            associated: BTreeMap::new(),
        }
    }

    /// Create a route table on the hub
    pub fn create_domain(
        &mut self,
        kind: DomainKind,
        hub: &Hub,
        plan: &mut BuildPlan,
    ) -> Result<(), TopologyError> {
        plan.declare(NodeId::RoutingDomain(kind), [NodeId::Hub])?;
        let domain = RoutingDomain::new(kind);
        log::info!("Created route table {} on hub {}", domain.id, hub.id);
        self.domains.insert(kind, domain);
        Ok(())
    }

    fn check_references(
        &self,
        node: &NodeId,
        kind: DomainKind,
        attachment: &AttachmentId,
    ) -> Result<(), TopologyError> {
        if !self.domains.contains_key(&kind) {
            return Err(TopologyError::dangling(node, NodeId::RoutingDomain(kind)));
        }
        if !self.registry.contains_id(attachment) {
            return Err(TopologyError::dangling(node, NodeId::Attachment(attachment.clone())));
        }
        Ok(())
    }

    /// Make an attachment a member of a domain
    pub fn associate(
        &mut self,
        kind: DomainKind,
        attachment: &AttachmentId,
        plan: &mut BuildPlan,
    ) -> Result<(), TopologyError> {
        let node = NodeId::Association(kind, attachment.clone());
        self.check_references(&node, kind, attachment)?;

        if let Some(existing) = self.associated.get(attachment) {
            return Err(TopologyError::ConflictingAssociation {
                attachment: attachment.to_string(),
                existing: existing.to_string(),
                requested: kind.to_string(),
            });
        }

        plan.declare(
            node,
            [NodeId::RoutingDomain(kind), NodeId::Attachment(attachment.clone())],
        )?;
        self.associated.insert(attachment.clone(), kind);
        if let Some(domain) = self.domains.get_mut(&kind) {
            domain.associations.insert(attachment.clone());
        }
        log::info!("Associated {} with {} domain", attachment, kind);
        Ok(())
    }

    /// Make an attachment's routes visible in a domain
    pub fn propagate(
        &mut self,
        kind: DomainKind,
        attachment: &AttachmentId,
        plan: &mut BuildPlan,
    ) -> Result<(), TopologyError> {
        let node = NodeId::Propagation(kind, attachment.clone());
        self.check_references(&node, kind, attachment)?;
        if plan.contains(&node) {
            log::debug!("{} already declared", node);
            return Ok(());
        }

        plan.declare(
            node,
            [NodeId::RoutingDomain(kind), NodeId::Attachment(attachment.clone())],
        )?;
        if let Some(domain) = self.domains.get_mut(&kind) {
            domain.propagations.insert(attachment.clone());
        }
        log::info!("Propagated {} into {} domain", attachment, kind);
        Ok(())
    }

    /// Wire the hub-and-spoke layout for the two cloud spokes and the VPN
    pub fn build_hub_and_spoke(
        mut self,
        hub: &Hub,
        spokes: Spokes<'_>,
        plan: &mut BuildPlan,
    ) -> Result<RoutingDomains, TopologyError> {
        let cloud = [spokes.development, spokes.production];

        // Both cloud spokes share one domain and see each other's routes
        self.create_domain(DomainKind::Cloud, hub, plan)?;
        for spoke in cloud {
            self.associate(DomainKind::Cloud, spoke, plan)?;
        }
        for spoke in cloud {
            self.propagate(DomainKind::Cloud, spoke, plan)?;
        }

        self.create_domain(DomainKind::Vpn, hub, plan)?;
        self.associate(DomainKind::Vpn, spokes.vpn, plan)?;

        // Reachability across the two domains needs propagation both ways
        self.propagate(DomainKind::Cloud, spokes.vpn, plan)?;
        for spoke in cloud {
            self.propagate(DomainKind::Vpn, spoke, plan)?;
        }

        self.finish()
    }

    /// Check propagation symmetry and hand out the domains
    pub fn finish(self) -> Result<RoutingDomains, TopologyError> {
        let domains = RoutingDomains {
            domains: self.domains,
        };
        validate_propagation_symmetry(&domains)?;
        Ok(domains)
    }
}
