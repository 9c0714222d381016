//! Shared utilities: topology invariant validation.

pub mod validation;

pub use validation::{
    validate_associations, validate_default_routes, validate_peer_route_symmetry,
    validate_propagation_symmetry, validate_vpn_isolation,
};
