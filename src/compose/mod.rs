//! Docker Compose manifest model
//!
//! This module parses compose files and derives the facts the NixOS
//! generator needs: services, named volumes, networks and labels.

pub mod config;
pub mod extract;
pub mod labels;
pub mod parser;

pub use config::{ComposeConfig, ServiceConfig};
pub use extract::{attach_proxy_network, extract_networks, extract_volumes};
pub use labels::{parse_env_array, parse_labels_array};
pub use parser::ComposeParser;
