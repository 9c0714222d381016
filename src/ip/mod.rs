//! Address plan helpers.
//!
//! This module checks and carves the IPv4 ranges handed to the composer:
//! CIDR parsing, subnet carving, public-address checks, segment range
//! uniqueness and ASN ranges. Numeric assignment of the ranges themselves
//! happens elsewhere; these helpers only validate what they are given.

pub mod asn;
pub mod cidr;
pub mod registry;

// Re-export commonly used items
pub use cidr::{carve_subnets, overlaps, parse_ipv4_cidr, parse_public_ipv4, DEFAULT_ROUTE};
pub use registry::CidrRegistry;
