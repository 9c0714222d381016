//! Composition errors.
//!
//! Every failure is fatal to the whole composition. [`TopologyError`] says
//! what went wrong; [`ComposeError`] adds the step at which the build aborted.

use crate::config::ValidationError;
use crate::topology::VpnState;
use std::fmt;

/// Errors raised while declaring the fabric topology
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TopologyError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ValidationError),

    #[error("Segment '{segment}' is already attached to the hub as {attachment}")]
    DuplicateAttachment { segment: String, attachment: String },

    #[error("Dangling reference: {from} references {target}, which was never created")]
    DanglingReference { from: String, target: String },

    #[error(
        "Asymmetric propagation: routes of domain '{from}' propagate into '{into}', \
         but {missing} of '{into}' is not propagated back into '{from}'"
    )]
    AsymmetricPropagation {
        from: String,
        into: String,
        missing: String,
    },

    #[error(
        "Attachment {attachment} is already associated with domain '{existing}', \
         cannot associate it with '{requested}'"
    )]
    ConflictingAssociation {
        attachment: String,
        existing: String,
        requested: String,
    },

    #[error("Attachment {attachment} is not associated with any routing domain")]
    Unassociated { attachment: String },

    #[error("Segment '{segment}' is missing a route to {destination} through the hub")]
    MissingRoute { segment: String, destination: String },

    #[error("Route {key} is already installed")]
    DuplicateRoute { key: String },

    #[error("Node {node} is already declared in the build plan")]
    DuplicateNode { node: String },

    #[error("Invalid VPN link transition from {from} to {to}")]
    InvalidTransition { from: VpnState, to: VpnState },

    #[error("Build plan contains a dependency cycle through {node}")]
    PlanCycle { node: String },
}

impl TopologyError {
    pub(crate) fn dangling(from: impl fmt::Display, target: impl fmt::Display) -> Self {
        TopologyError::DanglingReference {
            from: from.to_string(),
            target: target.to_string(),
        }
    }
}

/// Step of the composition pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeStep {
    ResolveConfig,
    CreateSegments,
    CreateHub,
    CustomerGateway,
    TransitGateway,
    VpnConnection,
    Attach,
    RoutingDomains,
    SubnetRoutes,
    Validate,
    Plan,
}

impl ComposeStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComposeStep::ResolveConfig => "resolve-config",
            ComposeStep::CreateSegments => "create-segments",
            ComposeStep::CreateHub => "create-hub",
            ComposeStep::CustomerGateway => "customer-gateway",
            ComposeStep::TransitGateway => "transit-gateway",
            ComposeStep::VpnConnection => "vpn-connection",
            ComposeStep::Attach => "attach",
            ComposeStep::RoutingDomains => "routing-domains",
            ComposeStep::SubnetRoutes => "subnet-routes",
            ComposeStep::Validate => "validate",
            ComposeStep::Plan => "plan",
        }
    }
}

impl fmt::Display for ComposeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed composition and the step it failed at
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Composition failed at step '{step}': {source}")]
pub struct ComposeError {
    pub step: ComposeStep,
    #[source]
    pub source: TopologyError,
}

impl ComposeError {
    pub fn is_configuration(&self) -> bool {
        matches!(self.source, TopologyError::Configuration(_))
    }
}

/// Attach the failing step to a topology result
pub(crate) trait AtStep<T> {
    fn at(self, step: ComposeStep) -> Result<T, ComposeError>;
}

impl<T, E: Into<TopologyError>> AtStep<T> for Result<T, E> {
    fn at(self, step: ComposeStep) -> Result<T, ComposeError> {
        self.map_err(|e| ComposeError {
            step,
            source: e.into(),
        })
    }
}
