//! # HubFabric - Topology composer for hub-and-spoke hybrid network fabrics
//!
//! This library decides which hub attachments, route tables, associations,
//! propagations and static subnet routes a hybrid network fabric needs, and
//! emits them as a declaration for a provisioning backend.
//!
//! ## Overview
//!
//! A fabric consists of two isolated cloud segments (development and
//! production), a simulated on-prem segment reached over a site-to-site VPN,
//! and a central hub every segment attaches to. The composer guarantees that
//! every segment reaches every other segment and on-prem, that no segment
//! gains unintended transitive reachability, and that the VPN attachment is
//! merged into the cloud's reachability through propagation only.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - `config`: Configuration structures and per-region resolution
//! - `config_loader`: YAML/JSON configuration file loading
//! - `ip`: CIDR, public address and ASN checks
//! - `topology`: Segments, hub, VPN link, attachments, routing domains and routes
//! - `plan`: Dependency-ordered build plan of every declared resource
//! - `composer`: Single-pass composition of a region's fabric
//! - `declaration`: Declaration and outputs serialization
//! - `utils`: Reachability invariant validation
//! - `error`: Error types
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use hubfabric::{composer, config_loader, declaration};
//! use std::path::Path;
//!
//! // Load configuration from YAML file
//! let config = config_loader::load_config(Path::new("fabric.yaml"))?;
//!
//! // Compose the fabric of one region
//! let composition = composer::compose(&config, "us-east-1")?;
//!
//! // Writes fabric_output/fabric.yaml and fabric_output/outputs.json
//! declaration::write_composition(&composition, Path::new("fabric_output"))?;
//! # Ok::<(), color_eyre::eyre::Error>(())
//! ```
//!
//! ## Configuration Format
//!
//! ```yaml
//! region_cidrs:
//!   us-east-1:
//!     dev: 10.0.0.0/24
//!     prod: 10.0.1.0/24
//!     onprem: 172.16.0.0/24
//!     mask: 26
//! on_prem_public_ip: 203.0.113.10
//! asns:
//!   hub: 64512
//!   customer: 65000
//! ```
//!
//! ## Error Handling
//!
//! Composition failures are typed: [`error::ComposeError`] names the step at
//! which the composition aborted and wraps the [`error::TopologyError`] that
//! caused it. File loading and writing use `color_eyre` for context.

pub mod composer;
pub mod config;
pub mod config_loader;
pub mod declaration;
pub mod error;
pub mod ip;
pub mod plan;
pub mod topology;
pub mod utils;

pub use composer::{compose, Composition};
pub use config::Config;
pub use error::{ComposeError, ComposeStep, TopologyError};
