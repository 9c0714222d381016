#[cfg(test)]
mod composition_scenarios {
    use std::collections::{BTreeSet, HashMap};
    use std::io::Write;
    use tempfile::{Builder, TempDir};

    use hubfabric::config::Config;
    use hubfabric::declaration::{
        write_composition, Declaration, Outputs, DECLARATION_FILE, OUTPUTS_FILE,
    };
    use hubfabric::plan::NodeId;
    use hubfabric::topology::{AttachmentId, AttachmentOwner, DomainKind, SegmentRole, VpnState};
    use hubfabric::{compose, config_loader, ComposeStep, TopologyError};

    const SCENARIO: &str = r#"
region_cidrs:
  us-east-1:
    dev: 10.0.0.0/24
    prod: 10.0.1.0/24
    onprem: 172.16.0.0/24
    mask: 26
on_prem_public_ip: 203.0.113.10
asns:
  hub: 64512
  customer: 65000
compute:
  execution_role: ssm-core
"#;

    fn scenario() -> Config {
        serde_yaml::from_str(SCENARIO).unwrap()
    }

    fn attachment(owner: AttachmentOwner) -> AttachmentId {
        AttachmentId::for_owner(&owner)
    }

    /// The reference scenario: one hub, one VPN link, three attachments, four routes
    #[test]
    fn test_reference_scenario() {
        let composition = compose(&scenario(), "us-east-1").unwrap();

        assert_eq!(composition.hub().id, "tgw-hub");
        assert_eq!(composition.hub().asn, 64512);
        assert_eq!(composition.vpn().state(), VpnState::VpnConnectionEstablished);
        assert_eq!(composition.vpn().customer_asn(), 65000);

        let cloud = composition.domains().get(DomainKind::Cloud).unwrap();
        let vpn = composition.domains().get(DomainKind::Vpn).unwrap();
        assert_eq!(cloud.associations.len(), 2);
        assert_eq!(vpn.associations.len(), 1);
        assert!(vpn.is_associated(&attachment(AttachmentOwner::Vpn)));

        let routes = composition.routes();
        assert_eq!(routes.len(), 4);
        assert_eq!(routes.iter().filter(|r| r.is_default()).count(), 2);
        assert!(routes.iter().all(|r| r.target == "tgw-hub"));

        let outputs = Outputs::from_composition(&composition);
        assert!(!outputs.hub_id.is_empty());
        assert!(!outputs.vpn_connection_id.is_empty());
        assert_eq!(outputs.on_prem_public_address.to_string(), "203.0.113.10");
        assert_eq!(outputs.execution_role.as_deref(), Some("ssm-core"));
    }

    /// Every dev subnet routes prod's block to the hub and vice versa
    #[test]
    fn test_dev_prod_symmetry() {
        let composition = compose(&scenario(), "us-east-1").unwrap();
        let dev = composition.segment(SegmentRole::Development).unwrap();
        let prod = composition.segment(SegmentRole::Production).unwrap();

        for (segment, peer) in [(dev, prod), (prod, dev)] {
            for subnet in &segment.subnets {
                assert!(
                    composition.routes().iter().any(|r| {
                        r.route_table_id == subnet.route_table_id && r.destination == peer.cidr
                    }),
                    "{} has no route to {}",
                    subnet.route_table_id,
                    peer.cidr
                );
            }
        }
    }

    #[test]
    fn test_production_routes_depend_on_production_attachment() {
        let composition = compose(&scenario(), "us-east-1").unwrap();
        let prod_attachment = attachment(AttachmentOwner::Segment("production".to_string()));

        let prod_routes: Vec<_> = composition
            .routes()
            .iter()
            .filter(|r| r.key.segment == "production")
            .collect();
        assert!(!prod_routes.is_empty());
        for route in prod_routes {
            assert_eq!(route.depends_on, prod_attachment);
            let deps = composition
                .plan()
                .dependencies(&NodeId::SubnetRoute(route.key.clone()))
                .unwrap();
            assert!(deps.contains(&NodeId::Attachment(prod_attachment.clone())));
        }
    }

    #[test]
    fn test_on_prem_default_routes() {
        let composition = compose(&scenario(), "us-east-1").unwrap();
        let on_prem = composition.segment(SegmentRole::OnPrem).unwrap();

        for subnet in &on_prem.subnets {
            let defaults: Vec<_> = composition
                .routes()
                .iter()
                .filter(|r| r.route_table_id == subnet.route_table_id && r.is_default())
                .collect();
            assert_eq!(defaults.len(), 1);
            assert_eq!(defaults[0].target, composition.hub().id);
            assert_eq!(defaults[0].depends_on, attachment(AttachmentOwner::Vpn));
        }
    }

    #[test]
    fn test_every_attachment_has_one_domain() {
        let composition = compose(&scenario(), "us-east-1").unwrap();
        for attachment in composition.attachments() {
            assert_eq!(composition.domains().association_count(&attachment.id), 1);
        }
        let cloud = composition.domains().get(DomainKind::Cloud).unwrap();
        assert!(!cloud.is_associated(&attachment(AttachmentOwner::Vpn)));
        assert!(cloud.is_propagated(&attachment(AttachmentOwner::Vpn)));
    }

    #[test]
    fn test_plan_order_respects_dependencies() {
        let composition = compose(&scenario(), "us-east-1").unwrap();
        let position: HashMap<&NodeId, usize> = composition
            .order()
            .iter()
            .enumerate()
            .map(|(i, node)| (node, i))
            .collect();

        assert_eq!(position.len(), composition.plan().len());
        for node in composition.order() {
            for dep in composition.plan().dependencies(node).unwrap() {
                assert!(
                    position[dep] < position[node],
                    "{} is ordered before its dependency {}",
                    node,
                    dep
                );
            }
        }
    }

    #[test]
    fn test_identical_input_identical_declaration() {
        let first = Declaration::from_composition(&compose(&scenario(), "us-east-1").unwrap());
        let second = Declaration::from_composition(&compose(&scenario(), "us-east-1").unwrap());
        assert_eq!(first, second);
        assert_eq!(
            serde_yaml::to_string(&first).unwrap(),
            serde_yaml::to_string(&second).unwrap()
        );

        let keys: BTreeSet<_> = first
            .subnet_routes
            .iter()
            .map(|r| (r.route_table_id.clone(), r.destination))
            .collect();
        assert_eq!(keys.len(), first.subnet_routes.len());
    }

    /// Omitting the on-prem address fails before anything is attached or written
    #[test]
    fn test_missing_on_prem_address() {
        let mut config = scenario();
        config.on_prem_public_ip = None;
        let output = TempDir::new().unwrap();

        let result = compose(&config, "us-east-1");
        let err = result.as_ref().unwrap_err();
        assert_eq!(err.step, ComposeStep::ResolveConfig);
        assert!(matches!(err.source, TopologyError::Configuration(_)));

        assert!(!output.path().join(DECLARATION_FILE).exists());
        assert!(!output.path().join(OUTPUTS_FILE).exists());
    }

    #[test]
    fn test_colliding_asns_rejected() {
        let mut config = scenario();
        config.asns.customer = Some(64512);
        let err = compose(&config, "us-east-1").unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(err.step, ComposeStep::ResolveConfig);
    }

    #[test]
    fn test_load_compose_and_write() {
        let mut config_file = Builder::new().suffix(".yaml").tempfile().unwrap();
        write!(config_file, "{}", SCENARIO).unwrap();
        let output = TempDir::new().unwrap();

        let config = config_loader::load_config(config_file.path()).unwrap();
        let composition = compose(&config, "us-east-1").unwrap();
        let (declaration, outputs) = write_composition(&composition, output.path()).unwrap();

        let declaration = std::fs::read_to_string(declaration).unwrap();
        assert!(declaration.contains("tgw-attach-development"));
        assert!(declaration.contains("tgw-rtb-vpn"));

        let outputs: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(outputs).unwrap()).unwrap();
        assert_eq!(outputs["development_segment_id"], "vpc-development");
        assert_eq!(outputs["production_segment_id"], "vpc-production");
        assert_eq!(outputs["vpn_connection_id"], "vpn-on-prem");
        assert!(outputs.get("routing_domains").is_none());
    }
}
