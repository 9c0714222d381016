//! Segment range registry.
//!
//! Tracks which segment owns which network block so that overlapping
//! segment ranges are rejected before anything is declared.

use super::cidr::overlaps;
use crate::config::ValidationError;
use ipnet::Ipv4Net;
use std::collections::BTreeMap;

/// Registry of segment ranges, keyed by owning segment name
#[derive(Debug, Default)]
pub struct CidrRegistry {
    ranges: BTreeMap<String, Ipv4Net>,
}

impl CidrRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a segment's block, failing if it overlaps a registered one
    pub fn register(&mut self, owner: &str, cidr: Ipv4Net) -> Result<(), ValidationError> {
        if let Some(existing) = self.ranges.get(owner) {
            if *existing == cidr {
                return Ok(());
            }
            return Err(ValidationError::InvalidCidr(format!(
                "segment '{}' already registered with {}",
                owner, existing
            )));
        }

        if let Some((other, range)) = self.ranges.iter().find(|(_, range)| overlaps(range, &cidr)) {
            return Err(ValidationError::InvalidCidr(format!(
                "{} of segment '{}' overlaps {} of segment '{}'",
                cidr, owner, range, other
            )));
        }

        self.ranges.insert(owner.to_string(), cidr);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_disjoint() {
        let mut registry = CidrRegistry::new();
        registry.register("development", "10.0.0.0/24".parse().unwrap()).unwrap();
        registry.register("production", "10.0.1.0/24".parse().unwrap()).unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_register_overlap() {
        let mut registry = CidrRegistry::new();
        registry.register("development", "10.0.0.0/24".parse().unwrap()).unwrap();
        let err = registry
            .register("production", "10.0.0.128/25".parse().unwrap())
            .unwrap_err();
        assert!(err.to_string().contains("development"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_same_owner() {
        let mut registry = CidrRegistry::new();
        let cidr: Ipv4Net = "10.0.0.0/24".parse().unwrap();
        registry.register("development", cidr).unwrap();
        // Re-registering the same block is a no-op
        assert!(registry.register("development", cidr).is_ok());
        assert!(registry
            .register("development", "10.9.0.0/24".parse().unwrap())
            .is_err());
    }
}
