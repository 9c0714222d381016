//! Declaration and output type definitions.
//!
//! The declaration is the full desired routing state handed to a
//! provisioning backend and is written as YAML. The outputs are the few
//! values other subsystems consume and are written as JSON; route table,
//! association and propagation identifiers never appear in them.

use crate::composer::Composition;
use crate::topology::{DomainKind, SegmentRole, VpnState};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use ipnet::Ipv4Net;
use serde::Serialize;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

/// File name of the declaration inside the output directory
pub const DECLARATION_FILE: &str = "fabric.yaml";
/// File name of the outputs inside the output directory
pub const OUTPUTS_FILE: &str = "outputs.json";

// ============================================================================
// Declaration Types
// ============================================================================

/// Desired routing state of one region
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Declaration {
    pub region: String,
    pub hub: HubDeclaration,
    pub vpn: VpnDeclaration,
    pub segments: Vec<SegmentDeclaration>,
    pub attachments: Vec<AttachmentDeclaration>,
    pub routing_domains: Vec<RoutingDomainDeclaration>,
    pub subnet_routes: Vec<RouteDeclaration>,
    /// Resources in the order the backend has to realize them
    pub build_order: Vec<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct HubDeclaration {
    pub id: String,
    pub asn: u32,
}

/// The VPN link with both of its endpoints
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct VpnDeclaration {
    pub customer_gateway_id: String,
    pub transit_gateway_id: String,
    pub connection_id: String,
    pub customer_asn: u64,
    pub on_prem_ip: String,
    pub state: VpnState,
    pub attachment: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SegmentDeclaration {
    pub id: String,
    pub name: String,
    pub role: SegmentRole,
    pub cidr: Ipv4Net,
    pub subnets: Vec<SubnetDeclaration>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SubnetDeclaration {
    pub cidr: Ipv4Net,
    pub route_table_id: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AttachmentDeclaration {
    pub id: String,
    /// Segment name, or `vpn` for the VPN link
    pub owner: String,
    pub hub_id: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RoutingDomainDeclaration {
    pub id: String,
    pub kind: DomainKind,
    pub associations: Vec<String>,
    pub propagations: Vec<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RouteDeclaration {
    pub route_table_id: String,
    pub destination: Ipv4Net,
    pub target: String,
    pub depends_on: String,
}

// ============================================================================
// Output Types
// ============================================================================

/// Values exported to other subsystems
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Outputs {
    pub development_segment_id: String,
    pub production_segment_id: String,
    pub on_prem_segment_id: String,
    pub hub_id: String,
    pub vpn_connection_id: String,
    pub on_prem_public_address: Ipv4Addr,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_role: Option<String>,
}

impl Declaration {
    pub fn from_composition(composition: &Composition) -> Self {
        let vpn = composition.vpn();
        Declaration {
            region: composition.region().to_string(),
            hub: HubDeclaration {
                id: composition.hub().id.clone(),
                asn: composition.hub().asn,
            },
            vpn: VpnDeclaration {
                customer_gateway_id: vpn.customer_gateway_id().unwrap_or_default().to_string(),
                transit_gateway_id: vpn.transit_gateway_id().unwrap_or_default().to_string(),
                connection_id: vpn.connection_id().unwrap_or_default().to_string(),
                customer_asn: vpn.customer_asn(),
                on_prem_ip: vpn.public_ip().map(|ip| ip.to_string()).unwrap_or_default(),
                state: vpn.state(),
                attachment: vpn.attachment().map(|id| id.to_string()).unwrap_or_default(),
            },
            segments: composition
                .segments()
                .iter()
                .map(|segment| SegmentDeclaration {
                    id: segment.id.clone(),
                    name: segment.name.clone(),
                    role: segment.role,
                    cidr: segment.cidr,
                    subnets: segment
                        .subnets
                        .iter()
                        .map(|subnet| SubnetDeclaration {
                            cidr: subnet.cidr,
                            route_table_id: subnet.route_table_id.clone(),
                        })
                        .collect(),
                })
                .collect(),
            attachments: composition
                .attachments()
                .iter()
                .map(|attachment| AttachmentDeclaration {
                    id: attachment.id.to_string(),
                    owner: attachment.owner.label().to_string(),
                    hub_id: attachment.hub_id.clone(),
                })
                .collect(),
            routing_domains: composition
                .domains()
                .iter()
                .map(|domain| RoutingDomainDeclaration {
                    id: domain.id.clone(),
                    kind: domain.kind,
                    associations: domain.associations.iter().map(|id| id.to_string()).collect(),
                    propagations: domain.propagations.iter().map(|id| id.to_string()).collect(),
                })
                .collect(),
            subnet_routes: composition
                .routes()
                .iter()
                .map(|route| RouteDeclaration {
                    route_table_id: route.route_table_id.clone(),
                    destination: route.destination,
                    target: route.target.clone(),
                    depends_on: route.depends_on.to_string(),
                })
                .collect(),
            build_order: composition.order().iter().map(|node| node.to_string()).collect(),
        }
    }
}

impl Outputs {
    pub fn from_composition(composition: &Composition) -> Self {
        let segment_id = |role: SegmentRole| {
            composition
                .segment(role)
                .map(|segment| segment.id.clone())
                .unwrap_or_default()
        };
        let vpn = composition.vpn();
        Outputs {
            development_segment_id: segment_id(SegmentRole::Development),
            production_segment_id: segment_id(SegmentRole::Production),
            on_prem_segment_id: segment_id(SegmentRole::OnPrem),
            hub_id: composition.hub().id.clone(),
            vpn_connection_id: vpn.connection_id().unwrap_or_default().to_string(),
            on_prem_public_address: vpn.public_ip().unwrap_or(Ipv4Addr::UNSPECIFIED),
            execution_role: composition.execution_role().map(str::to_string),
        }
    }
}

/// Write the declaration and the outputs of a composition into `output_dir`.
///
/// Returns the paths of the declaration and outputs files.
pub fn write_composition(
    composition: &Composition,
    output_dir: &Path,
) -> Result<(PathBuf, PathBuf)> {
    std::fs::create_dir_all(output_dir)
        .wrap_err_with(|| format!("Failed to create output directory '{}'", output_dir.display()))?;

    let declaration_path = output_dir.join(DECLARATION_FILE);
    let declaration_yaml = serde_yaml::to_string(&Declaration::from_composition(composition))?;
    std::fs::write(&declaration_path, declaration_yaml)
        .wrap_err_with(|| format!("Failed to write declaration '{}'", declaration_path.display()))?;

    let outputs_path = output_dir.join(OUTPUTS_FILE);
    let outputs_json = serde_json::to_string_pretty(&Outputs::from_composition(composition))?;
    std::fs::write(&outputs_path, outputs_json)
        .wrap_err_with(|| format!("Failed to write outputs '{}'", outputs_path.display()))?;

    log::info!(
        "Wrote declaration to {:?} and outputs to {:?}",
        declaration_path,
        outputs_path
    );
    Ok((declaration_path, outputs_path))
}
