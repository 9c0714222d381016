//! Build plan.
//!
//! Every resource the composer decides on is declared here as a typed node
//! together with the nodes it depends on. A node can only be declared once all
//! of its dependencies are declared, which keeps the plan acyclic and turns a
//! reference to something never created into an immediate error instead of an
//! inert resource. [`BuildPlan::evaluation_order`] yields the order in which a
//! provisioning backend has to realize the nodes.

use crate::error::TopologyError;
use crate::topology::{AttachmentId, DomainKind, RouteKey};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A declared resource
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeId {
    Segment(String),
    Hub,
    CustomerGateway,
    VpnConnection,
    Attachment(AttachmentId),
    RoutingDomain(DomainKind),
    Association(DomainKind, AttachmentId),
    Propagation(DomainKind, AttachmentId),
    SubnetRoute(RouteKey),
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Segment(name) => write!(f, "segment {}", name),
            NodeId::Hub => f.write_str("hub"),
            NodeId::CustomerGateway => f.write_str("customer gateway"),
            NodeId::VpnConnection => f.write_str("VPN connection"),
            NodeId::Attachment(id) => write!(f, "attachment {}", id),
            NodeId::RoutingDomain(kind) => write!(f, "routing domain {}", kind),
            NodeId::Association(kind, id) => write!(f, "association {} -> {}", id, kind),
            NodeId::Propagation(kind, id) => write!(f, "propagation {} -> {}", id, kind),
            NodeId::SubnetRoute(key) => write!(f, "route {}", key),
        }
    }
}

/// Dependency graph of declared nodes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildPlan {
    nodes: BTreeMap<NodeId, BTreeSet<NodeId>>,
}

impl BuildPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a node that depends on already-declared nodes
    pub fn declare<I>(&mut self, node: NodeId, deps: I) -> Result<(), TopologyError>
    where
        I: IntoIterator<Item = NodeId>,
    {
        if self.nodes.contains_key(&node) {
            return Err(TopologyError::DuplicateNode {
                node: node.to_string(),
            });
        }

        let deps: BTreeSet<NodeId> = deps.into_iter().collect();
        if let Some(missing) = deps.iter().find(|dep| !self.nodes.contains_key(dep)) {
            return Err(TopologyError::dangling(&node, missing));
        }

        log::debug!("Declared {} ({} dependencies)", node, deps.len());
        self.nodes.insert(node, deps);
        Ok(())
    }

    /// Declare a node without dependencies
    pub fn declare_root(&mut self, node: NodeId) -> Result<(), TopologyError> {
        self.declare(node, std::iter::empty())
    }

    pub fn contains(&self, node: &NodeId) -> bool {
        self.nodes.contains_key(node)
    }

    pub fn dependencies(&self, node: &NodeId) -> Option<&BTreeSet<NodeId>> {
        self.nodes.get(node)
    }

    /// Number of declared nodes matching a predicate
    pub fn count<F>(&self, predicate: F) -> usize
    where
        F: Fn(&NodeId) -> bool,
    {
        self.nodes.keys().filter(|node| predicate(node)).count()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Topological order of the plan, ties broken by node order
    pub fn evaluation_order(&self) -> Result<Vec<NodeId>, TopologyError> {
        let mut pending: BTreeMap<&NodeId, usize> = BTreeMap::new();
        let mut dependents: BTreeMap<&NodeId, Vec<&NodeId>> = BTreeMap::new();
        for (node, deps) in &self.nodes {
            pending.insert(node, deps.len());
            for dep in deps {
                dependents.entry(dep).or_default().push(node);
            }
        }

        let mut ready: BTreeSet<&NodeId> = pending
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(node, _)| *node)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(node) = ready.pop_first() {
            order.push(node.clone());
            for dependent in dependents.get(node).into_iter().flatten() {
                if let Some(count) = pending.get_mut(dependent) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(*dependent);
                    }
                }
            }
        }

        if order.len() != self.nodes.len() {
            let stuck = pending
                .iter()
                .find(|(_, count)| **count > 0)
                .map(|(node, _)| node.to_string())
                .unwrap_or_default();
            return Err(TopologyError::PlanCycle { node: stuck });
        }
        Ok(order)
    }
}
