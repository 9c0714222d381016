//! Attachment registry.
//!
//! Binds segments and the VPN link to the hub. The registry only records
//! that connectivity exists; which attachments see each other's routes is
//! decided by the routing domain builder.

use super::types::{AttachmentId, AttachmentOwner, Hub, Segment};
use super::vpn::VpnLink;
use crate::error::TopologyError;
use crate::plan::{BuildPlan, NodeId};
use serde::Serialize;
use std::collections::BTreeMap;

/// Binding of a segment or the VPN link to the hub
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    pub id: AttachmentId,
    pub owner: AttachmentOwner,
    pub hub_id: String,
}

/// Registry of hub attachments, one per owner
#[derive(Debug, Default)]
pub struct AttachmentRegistry {
    attachments: BTreeMap<AttachmentOwner, Attachment>,
}

impl AttachmentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a segment to the hub.
    ///
    /// Both endpoints must already be declared in the plan.
    pub fn attach(
        &mut self,
        segment: &Segment,
        hub: &Hub,
        plan: &mut BuildPlan,
    ) -> Result<Attachment, TopologyError> {
        self.register(
            segment.owner(),
            hub,
            NodeId::Segment(segment.name.clone()),
            plan,
        )
    }

    /// Attach the VPN link to the hub once its connection is established
    pub fn attach_vpn(
        &mut self,
        vpn: &mut VpnLink,
        hub: &Hub,
        plan: &mut BuildPlan,
    ) -> Result<Attachment, TopologyError> {
        if !vpn.is_established() {
            return Err(TopologyError::dangling(
                "VPN attachment",
                format!("an established VPN connection (link is {})", vpn.state()),
            ));
        }
        let attachment = self.register(AttachmentOwner::Vpn, hub, NodeId::VpnConnection, plan)?;
        vpn.set_attachment(attachment.id.clone());
        Ok(attachment)
    }

    fn register(
        &mut self,
        owner: AttachmentOwner,
        hub: &Hub,
        endpoint: NodeId,
        plan: &mut BuildPlan,
    ) -> Result<Attachment, TopologyError> {
        if let Some(existing) = self.attachments.get(&owner) {
            return Err(TopologyError::DuplicateAttachment {
                segment: owner.label().to_string(),
                attachment: existing.id.to_string(),
            });
        }

        let id = AttachmentId::for_owner(&owner);
        plan.declare(NodeId::Attachment(id.clone()), [endpoint, NodeId::Hub])?;

        let attachment = Attachment {
            id,
            owner: owner.clone(),
            hub_id: hub.id.clone(),
        };
        log::info!("Attached {} to hub {} as {}", owner, hub.id, attachment.id);
        self.attachments.insert(owner, attachment.clone());
        Ok(attachment)
    }

    /// Look up the attachment of an owner
    pub fn get(&self, owner: &AttachmentOwner) -> Result<&Attachment, TopologyError> {
        self.attachments.get(owner).ok_or_else(|| {
            TopologyError::dangling(format!("reference to {}", owner), "its hub attachment")
        })
    }

    pub fn contains_id(&self, id: &AttachmentId) -> bool {
        self.attachments.values().any(|attachment| &attachment.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attachment> {
        self.attachments.values()
    }

    pub fn len(&self) -> usize {
        self.attachments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attachments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{net, SegmentRole};

    fn fixture() -> (Segment, Hub, BuildPlan) {
        let segment = Segment::new(
            SegmentRole::Development,
            net("10.0.0.0/24"),
            &[net("10.0.0.0/26")],
        );
        let hub = Hub::new(64512);
        let mut plan = BuildPlan::new();
        plan.declare_root(NodeId::Segment(segment.name.clone())).unwrap();
        plan.declare_root(NodeId::Hub).unwrap();
        (segment, hub, plan)
    }

    #[test]
    fn test_attach_segment() {
        let (segment, hub, mut plan) = fixture();
        let mut registry = AttachmentRegistry::new();

        let attachment = registry.attach(&segment, &hub, &mut plan).unwrap();
        assert_eq!(attachment.id.as_str(), "tgw-attach-development");
        assert_eq!(attachment.hub_id, "tgw-hub");
        assert_eq!(registry.len(), 1);
        assert!(registry.contains_id(&attachment.id));
        assert!(plan.contains(&NodeId::Attachment(attachment.id.clone())));
        assert_eq!(registry.get(&segment.owner()).unwrap(), &attachment);
    }

    #[test]
    fn test_duplicate_attachment() {
        let (segment, hub, mut plan) = fixture();
        let mut registry = AttachmentRegistry::new();
        registry.attach(&segment, &hub, &mut plan).unwrap();

        let err = registry.attach(&segment, &hub, &mut plan).unwrap_err();
        assert_eq!(
            err,
            TopologyError::DuplicateAttachment {
                segment: "development".to_string(),
                attachment: "tgw-attach-development".to_string(),
            }
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_attach_requires_endpoints() {
        let (segment, hub, _) = fixture();
        let mut plan = BuildPlan::new();
        plan.declare_root(NodeId::Hub).unwrap();
        let mut registry = AttachmentRegistry::new();

        // Segment was never declared
        assert!(matches!(
            registry.attach(&segment, &hub, &mut plan),
            Err(TopologyError::DanglingReference { .. })
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_attach_vpn_requires_connection() {
        let (_, hub, mut plan) = fixture();
        let mut registry = AttachmentRegistry::new();
        let mut vpn = VpnLink::new(65000, 64512, "203.0.113.10");

        assert!(registry.attach_vpn(&mut vpn, &hub, &mut plan).is_err());

        vpn.create_customer_gateway(&mut plan).unwrap();
        vpn.bind_transit_gateway(&hub, &plan).unwrap();
        vpn.establish_connection(&mut plan).unwrap();
        let attachment = registry.attach_vpn(&mut vpn, &hub, &mut plan).unwrap();
        assert_eq!(attachment.owner, AttachmentOwner::Vpn);
        assert_eq!(vpn.attachment(), Some(&attachment.id));
    }

    #[test]
    fn test_missing_lookup() {
        let registry = AttachmentRegistry::new();
        assert!(matches!(
            registry.get(&AttachmentOwner::Vpn),
            Err(TopologyError::DanglingReference { .. })
        ));
    }
}
