//! VPN link lifecycle.
//!
//! The link is driven through a strictly sequential state machine:
//! `Unprovisioned -> CustomerGatewayCreated -> TransitGatewayCreated ->
//! VPNConnectionEstablished`. The on-prem address and customer ASN are checked
//! when the customer gateway is created; nothing is retried.

use super::types::{AttachmentId, Hub};
use crate::config::ValidationError;
use crate::error::TopologyError;
use crate::ip::asn::validate_customer_asn;
use crate::ip::cidr::parse_public_ipv4;
use crate::plan::{BuildPlan, NodeId};
use serde::Serialize;
use std::fmt;
use std::net::Ipv4Addr;

/// Provisioning state of the VPN link
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum VpnState {
    Unprovisioned,
    CustomerGatewayCreated,
    TransitGatewayCreated,
    #[serde(rename = "VPNConnectionEstablished")]
    VpnConnectionEstablished,
}

impl VpnState {
    /// The only state reachable from this one
    pub fn next(&self) -> Option<VpnState> {
        match self {
            VpnState::Unprovisioned => Some(VpnState::CustomerGatewayCreated),
            VpnState::CustomerGatewayCreated => Some(VpnState::TransitGatewayCreated),
            VpnState::TransitGatewayCreated => Some(VpnState::VpnConnectionEstablished),
            VpnState::VpnConnectionEstablished => None,
        }
    }
}

impl fmt::Display for VpnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VpnState::Unprovisioned => "Unprovisioned",
            VpnState::CustomerGatewayCreated => "CustomerGatewayCreated",
            VpnState::TransitGatewayCreated => "TransitGatewayCreated",
            VpnState::VpnConnectionEstablished => "VPNConnectionEstablished",
        };
        f.write_str(name)
    }
}

/// Customer gateway plus VPN connection bridging the hub to on-prem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VpnLink {
    state: VpnState,
    customer_asn: u64,
    hub_asn: u32,
    on_prem_ip: String,
    public_ip: Option<Ipv4Addr>,
    customer_gateway_id: Option<String>,
    transit_gateway_id: Option<String>,
    connection_id: Option<String>,
    attachment: Option<AttachmentId>,
}

impl VpnLink {
    /// A link for the on-prem endpoint, terminating on a hub with `hub_asn`
    pub fn new(customer_asn: u64, hub_asn: u32, on_prem_ip: impl Into<String>) -> Self {
        VpnLink {
            state: VpnState::Unprovisioned,
            customer_asn,
            hub_asn,
            on_prem_ip: on_prem_ip.into(),
            public_ip: None,
            customer_gateway_id: None,
            transit_gateway_id: None,
            connection_id: None,
            attachment: None,
        }
    }

    fn transition(&mut self, to: VpnState) -> Result<(), TopologyError> {
        if self.state.next() != Some(to) {
            return Err(TopologyError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        log::debug!("VPN link: {} -> {}", self.state, to);
        self.state = to;
        Ok(())
    }

    /// Create the customer gateway for the on-prem endpoint.
    ///
    /// A malformed address, or a customer ASN that is zero or equal to the
    /// hub ASN, fails here and leaves the link unprovisioned.
    pub fn create_customer_gateway(&mut self, plan: &mut BuildPlan) -> Result<&str, TopologyError> {
        if self.state != VpnState::Unprovisioned {
            return Err(TopologyError::InvalidTransition {
                from: self.state,
                to: VpnState::CustomerGatewayCreated,
            });
        }
        let public_ip = parse_public_ipv4(&self.on_prem_ip)?;
        validate_customer_asn(self.customer_asn, Some(self.hub_asn))?;

        plan.declare_root(NodeId::CustomerGateway)?;
        self.transition(VpnState::CustomerGatewayCreated)?;
        self.public_ip = Some(public_ip);
        let id = self.customer_gateway_id.insert("cgw-on-prem".to_string());
        log::info!(
            "Declared customer gateway {} for {} (ASN {})",
            id,
            public_ip,
            self.customer_asn
        );
        Ok(id.as_str())
    }

    /// Record the transit gateway the connection terminates on
    pub fn bind_transit_gateway(
        &mut self,
        hub: &Hub,
        plan: &BuildPlan,
    ) -> Result<(), TopologyError> {
        if !plan.contains(&NodeId::Hub) {
            return Err(TopologyError::dangling("VPN link", &NodeId::Hub));
        }
        if hub.asn != self.hub_asn {
            return Err(ValidationError::InvalidAsn(format!(
                "link was set up for hub ASN {}, but {} has ASN {}",
                self.hub_asn, hub.id, hub.asn
            ))
            .into());
        }
        self.transition(VpnState::TransitGatewayCreated)?;
        self.transit_gateway_id = Some(hub.id.clone());
        Ok(())
    }

    /// Establish the static-routed VPN connection
    pub fn establish_connection(&mut self, plan: &mut BuildPlan) -> Result<&str, TopologyError> {
        if self.state != VpnState::TransitGatewayCreated {
            return Err(TopologyError::InvalidTransition {
                from: self.state,
                to: VpnState::VpnConnectionEstablished,
            });
        }
        plan.declare(NodeId::VpnConnection, [NodeId::CustomerGateway, NodeId::Hub])?;
        self.transition(VpnState::VpnConnectionEstablished)?;
        let id = self.connection_id.insert("vpn-on-prem".to_string());
        log::info!("Declared VPN connection {}", id);
        Ok(id.as_str())
    }

    pub fn state(&self) -> VpnState {
        self.state
    }

    pub fn is_established(&self) -> bool {
        self.state == VpnState::VpnConnectionEstablished
    }

    pub fn customer_asn(&self) -> u64 {
        self.customer_asn
    }

    pub fn public_ip(&self) -> Option<Ipv4Addr> {
        self.public_ip
    }

    pub fn customer_gateway_id(&self) -> Option<&str> {
        self.customer_gateway_id.as_deref()
    }

    pub fn transit_gateway_id(&self) -> Option<&str> {
        self.transit_gateway_id.as_deref()
    }

    pub fn connection_id(&self) -> Option<&str> {
        self.connection_id.as_deref()
    }

    pub fn attachment(&self) -> Option<&AttachmentId> {
        self.attachment.as_ref()
    }

    pub(crate) fn set_attachment(&mut self, id: AttachmentId) {
        self.attachment = Some(id);
    }
}
