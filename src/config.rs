//! Fabric configuration.
//!
//! The raw configuration mirrors the on-disk YAML/JSON document: per-region
//! CIDR blocks, the on-prem endpoint address and the ASNs. Values are kept as
//! written so that a malformed entry surfaces as a [`ValidationError`] rather
//! than a parse failure. [`Config::resolve`] turns one region of it into a
//! [`ResolvedConfig`] whose values are already checked and typed.

use crate::ip::asn::{validate_customer_asn, validate_hub_asn};
use crate::ip::cidr::{carve_subnets, parse_ipv4_cidr, parse_public_ipv4};
use crate::ip::CidrRegistry;
use crate::topology::SegmentRole;
use ipnet::Ipv4Net;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::sync::LazyLock;

/// Longest subnet prefix accepted for segment subnets.
pub const MAX_SUBNET_PREFIX: u8 = 28;

static REGION_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z]{2}(-[a-z]+)+-\d+$").expect("Invalid region name regex")
});

/// Top-level fabric configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// CIDR plan keyed by deployment region
    pub region_cidrs: BTreeMap<String, RegionCidrs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_prem_public_ip: Option<String>,
    #[serde(default)]
    pub asns: Asns,
    #[serde(default)]
    pub subnets: SubnetLayout,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compute: Option<ComputeConfig>,
}

/// CIDR blocks of the three segments in one region
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RegionCidrs {
    pub dev: String,
    pub prod: String,
    pub onprem: String,
    /// Prefix length of every subnet carved out of the segment blocks
    pub mask: u8,
}

/// Autonomous system numbers for the hub and the on-prem customer gateway
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Asns {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hub: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<u64>,
}

/// Number of private subnets per segment
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SubnetLayout {
    pub dev: usize,
    pub prod: usize,
    pub onprem: usize,
}

impl Default for SubnetLayout {
    fn default() -> Self {
        Self {
            dev: 1,
            prod: 1,
            // endpoint subnet plus one private subnet
            onprem: 2,
        }
    }
}

/// Pass-through settings for compute placed in the segments.
///
/// The role is provisioned elsewhere; the composer only forwards it to the
/// outputs so that compute placement can pick it up.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ComputeConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_role: Option<String>,
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid region configuration: {0}")]
    InvalidRegion(String),
    #[error("Invalid CIDR configuration: {0}")]
    InvalidCidr(String),
    #[error("Invalid subnet configuration: {0}")]
    InvalidSubnets(String),
    #[error("Invalid ASN configuration: {0}")]
    InvalidAsn(String),
    #[error("Invalid on-prem address: {0}")]
    InvalidAddress(String),
}

/// A segment's checked address plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentPlan {
    pub role: SegmentRole,
    pub cidr: Ipv4Net,
    pub subnets: Vec<Ipv4Net>,
}

/// Configuration of a single region after validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub region: String,
    pub development: SegmentPlan,
    pub production: SegmentPlan,
    pub on_prem: SegmentPlan,
    pub on_prem_public_ip: Ipv4Addr,
    pub hub_asn: u32,
    pub customer_asn: u32,
    pub execution_role: Option<String>,
}

impl ResolvedConfig {
    /// Segment plans in creation order
    pub fn segments(&self) -> [&SegmentPlan; 3] {
        [&self.development, &self.production, &self.on_prem]
    }
}

impl Config {
    /// Validate every region and the shared settings
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.region_cidrs.is_empty() {
            return Err(ValidationError::InvalidRegion(
                "region_cidrs must contain at least one region".to_string(),
            ));
        }
        for region in self.region_cidrs.keys() {
            self.resolve(region)?;
        }
        Ok(())
    }

    /// Resolve and check the configuration of one region.
    ///
    /// Nothing is declared until this succeeds, so every missing or malformed
    /// CIDR, ASN or address is reported here.
    pub fn resolve(&self, region: &str) -> Result<ResolvedConfig, ValidationError> {
        if !REGION_NAME.is_match(region) {
            return Err(ValidationError::InvalidRegion(format!(
                "'{}' is not a valid region name",
                region
            )));
        }
        let cidrs = self.region_cidrs.get(region).ok_or_else(|| {
            ValidationError::InvalidRegion(format!(
                "region '{}' not found in region_cidrs (known: {})",
                region,
                self.region_cidrs.keys().cloned().collect::<Vec<_>>().join(", ")
            ))
        })?;

        if cidrs.mask > MAX_SUBNET_PREFIX {
            return Err(ValidationError::InvalidSubnets(format!(
                "mask /{} is longer than /{}",
                cidrs.mask, MAX_SUBNET_PREFIX
            )));
        }

        let development = Self::resolve_segment(
            SegmentRole::Development,
            &cidrs.dev,
            cidrs.mask,
            self.subnets.dev,
        )?;
        let production = Self::resolve_segment(
            SegmentRole::Production,
            &cidrs.prod,
            cidrs.mask,
            self.subnets.prod,
        )?;
        let on_prem = Self::resolve_segment(
            SegmentRole::OnPrem,
            &cidrs.onprem,
            cidrs.mask,
            self.subnets.onprem,
        )?;

        let mut ranges = CidrRegistry::new();
        for plan in [&development, &production, &on_prem] {
            ranges.register(plan.role.segment_name(), plan.cidr)?;
        }

        let on_prem_public_ip = match &self.on_prem_public_ip {
            Some(ip) => parse_public_ipv4(ip)?,
            None => {
                return Err(ValidationError::InvalidAddress(
                    "on_prem_public_ip is required".to_string(),
                ))
            }
        };

        let hub_asn = match self.asns.hub {
            Some(asn) => validate_hub_asn(asn)?,
            None => return Err(ValidationError::InvalidAsn("asns.hub is required".to_string())),
        };
        let customer_asn = match self.asns.customer {
            Some(asn) => validate_customer_asn(asn, Some(hub_asn))?,
            None => {
                return Err(ValidationError::InvalidAsn(
                    "asns.customer is required".to_string(),
                ))
            }
        };

        Ok(ResolvedConfig {
            region: region.to_string(),
            development,
            production,
            on_prem,
            on_prem_public_ip,
            hub_asn,
            customer_asn,
            execution_role: self.compute.as_ref().and_then(|c| c.execution_role.clone()),
        })
    }

    fn resolve_segment(
        role: SegmentRole,
        cidr: &str,
        mask: u8,
        count: usize,
    ) -> Result<SegmentPlan, ValidationError> {
        let name = role.segment_name();
        let cidr = parse_ipv4_cidr(name, cidr)?;
        if count == 0 {
            return Err(ValidationError::InvalidSubnets(format!(
                "segment '{}' needs at least one subnet",
                name
            )));
        }
        let subnets = carve_subnets(name, cidr, mask, count)?;
        Ok(SegmentPlan { role, cidr, subnets })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
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
  execution_role: arn:aws:iam::123456789012:role/ssm-core
"#;

    fn sample() -> Config {
        serde_yaml::from_str(SAMPLE).unwrap()
    }

    #[test]
    fn test_resolve_sample() {
        let config = sample();
        assert!(config.validate().is_ok());

        let resolved = config.resolve("us-east-1").unwrap();
        assert_eq!(resolved.development.cidr, "10.0.0.0/24".parse().unwrap());
        assert_eq!(resolved.production.cidr, "10.0.1.0/24".parse().unwrap());
        assert_eq!(resolved.development.subnets, vec!["10.0.0.0/26".parse::<Ipv4Net>().unwrap()]);
        assert_eq!(resolved.on_prem.subnets.len(), 2);
        assert_eq!(resolved.on_prem.subnets[1], "172.16.0.64/26".parse().unwrap());
        assert_eq!(resolved.on_prem_public_ip, Ipv4Addr::new(203, 0, 113, 10));
        assert_eq!(resolved.hub_asn, 64512);
        assert_eq!(resolved.customer_asn, 65000);
        assert_eq!(
            resolved.execution_role.as_deref(),
            Some("arn:aws:iam::123456789012:role/ssm-core")
        );
    }

    #[test]
    fn test_default_subnet_layout() {
        let layout = SubnetLayout::default();
        assert_eq!(layout.dev, 1);
        assert_eq!(layout.prod, 1);
        assert_eq!(layout.onprem, 2);
    }

    #[test]
    fn test_missing_on_prem_ip() {
        let mut config = sample();
        config.on_prem_public_ip = None;
        assert!(matches!(
            config.resolve("us-east-1"),
            Err(ValidationError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_unknown_region() {
        let config = sample();
        assert!(matches!(
            config.resolve("eu-west-1"),
            Err(ValidationError::InvalidRegion(_))
        ));
        assert!(matches!(
            config.resolve("US_EAST"),
            Err(ValidationError::InvalidRegion(_))
        ));
    }

    #[test]
    fn test_overlapping_segments() {
        let mut config = sample();
        config.region_cidrs.get_mut("us-east-1").unwrap().prod = "10.0.0.0/16".to_string();
        assert!(matches!(
            config.resolve("us-east-1"),
            Err(ValidationError::InvalidCidr(_))
        ));
    }

    #[test]
    fn test_mask_validation() {
        let mut config = sample();
        config.region_cidrs.get_mut("us-east-1").unwrap().mask = 30;
        assert!(matches!(
            config.resolve("us-east-1"),
            Err(ValidationError::InvalidSubnets(_))
        ));

        // Shorter than the segment prefix cannot be carved
        config.region_cidrs.get_mut("us-east-1").unwrap().mask = 16;
        assert!(matches!(
            config.resolve("us-east-1"),
            Err(ValidationError::InvalidSubnets(_))
        ));
    }

    #[test]
    fn test_subnet_counts() {
        let mut config = sample();
        config.subnets.dev = 0;
        assert!(matches!(
            config.resolve("us-east-1"),
            Err(ValidationError::InvalidSubnets(_))
        ));

        // /24 split into /26 only holds four subnets
        config.subnets.dev = 5;
        assert!(matches!(
            config.resolve("us-east-1"),
            Err(ValidationError::InvalidSubnets(_))
        ));
    }

    #[test]
    fn test_asn_validation() {
        let mut config = sample();
        config.asns.hub = None;
        assert!(matches!(
            config.resolve("us-east-1"),
            Err(ValidationError::InvalidAsn(_))
        ));

        let mut config = sample();
        config.asns.customer = Some(64512);
        assert!(matches!(
            config.resolve("us-east-1"),
            Err(ValidationError::InvalidAsn(_))
        ));
    }

    #[test]
    fn test_malformed_cidr() {
        let mut config = sample();
        config.region_cidrs.get_mut("us-east-1").unwrap().dev = "10.0.0/24".to_string();
        let err = config.resolve("us-east-1").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidCidr(_)));
        assert!(err.to_string().contains("development"));
    }

    #[test]
    fn test_empty_regions() {
        let config = Config {
            region_cidrs: BTreeMap::new(),
            on_prem_public_ip: Some("203.0.113.10".to_string()),
            asns: Asns { hub: Some(64512), customer: Some(65000) },
            subnets: SubnetLayout::default(),
            compute: None,
        };
        assert!(config.validate().is_err());
    }
}
