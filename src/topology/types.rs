//! Topology type definitions.
//!
//! Segments, the hub and the handles that tie attachments to their owners.
//! Identifiers are derived from names so that two compositions of the same
//! configuration produce the same identifiers.

use crate::config::SegmentPlan;
use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role a segment plays in the fabric
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SegmentRole {
    Development,
    Production,
    /// Simulated on-prem network, reached through the VPN link only
    OnPrem,
}

impl SegmentRole {
    pub fn segment_name(&self) -> &'static str {
        match self {
            SegmentRole::Development => "development",
            SegmentRole::Production => "production",
            SegmentRole::OnPrem => "on-prem",
        }
    }

    /// On-prem-facing segments get a default route instead of peer routes
    pub fn is_on_prem_facing(&self) -> bool {
        matches!(self, SegmentRole::OnPrem)
    }
}

impl fmt::Display for SegmentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.segment_name())
    }
}

/// A private subnet and its route table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subnet {
    pub index: usize,
    pub cidr: Ipv4Net,
    pub route_table_id: String,
}

/// An isolated network range with its subnets
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub id: String,
    pub name: String,
    pub role: SegmentRole,
    pub cidr: Ipv4Net,
    pub subnets: Vec<Subnet>,
}

impl Segment {
    pub fn new(role: SegmentRole, cidr: Ipv4Net, subnet_cidrs: &[Ipv4Net]) -> Self {
        let name = role.segment_name().to_string();
        let subnets = subnet_cidrs
            .iter()
            .enumerate()
            .map(|(index, cidr)| Subnet {
                index,
                cidr: *cidr,
                route_table_id: format!("rtb-{}-{}", name, index),
            })
            .collect();

        Segment {
            id: format!("vpc-{}", name),
            name,
            role,
            cidr,
            subnets,
        }
    }

    pub fn from_plan(plan: &SegmentPlan) -> Self {
        Self::new(plan.role, plan.cidr, &plan.subnets)
    }

    /// Owner key under which this segment is attached to the hub
    pub fn owner(&self) -> AttachmentOwner {
        AttachmentOwner::Segment(self.name.clone())
    }
}

/// The transit gateway every segment attaches to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hub {
    pub id: String,
    pub asn: u32,
}

impl Hub {
    pub fn new(asn: u32) -> Self {
        Hub {
            id: "tgw-hub".to_string(),
            asn,
        }
    }
}

/// What an attachment binds to the hub
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttachmentOwner {
    Segment(String),
    Vpn,
}

impl AttachmentOwner {
    pub fn label(&self) -> &str {
        match self {
            AttachmentOwner::Segment(name) => name,
            AttachmentOwner::Vpn => "vpn",
        }
    }
}

impl fmt::Display for AttachmentOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttachmentOwner::Segment(name) => write!(f, "segment '{}'", name),
            AttachmentOwner::Vpn => f.write_str("VPN link"),
        }
    }
}

/// Opaque attachment handle
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct AttachmentId(String);

impl AttachmentId {
    pub fn for_owner(owner: &AttachmentOwner) -> Self {
        AttachmentId(format!("tgw-attach-{}", owner.label()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AttachmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
