//! Traefik reverse-proxy routing
//!
//! Routing rules come from two places: rules passed in by the caller and
//! rules derived from `traefik.http.*` labels on compose services. Both end
//! up in a single `services.traefik.dynamicConfigOptions.http` block.

pub mod config;
pub mod labels;
pub mod rule;

pub use config::generate_config;
pub use labels::parse_labels;
pub use rule::{RoutingRule, DEFAULT_ENTRYPOINT};
