//! Compose to NixOS conversion pipeline

use crate::compose::{
    attach_proxy_network, extract_networks, extract_volumes, ComposeConfig, ComposeParser,
    ServiceConfig,
};
use crate::error::{ConvertError, Result};
use crate::nix::{self, lifecycle_unit, Backend, LifecycleKind, NixDocument};
use crate::ordered_map::OrderedMap;
use crate::traefik::{self, RoutingRule};

/// Project name used when the manifest has no `name`
pub const DEFAULT_PROJECT_NAME: &str = "myproject";

/// Convert Docker Compose YAML into a NixOS module
///
/// `routes` are emitted ahead of the routing rules derived from service
/// labels. Either the whole module is returned or an error; there is no
/// partial output.
pub fn convert(manifest: &str, backend: Backend, routes: &[RoutingRule]) -> Result<String> {
    let config = ComposeParser::parse_str(manifest)?;
    let project = config
        .name
        .clone()
        .unwrap_or_else(|| DEFAULT_PROJECT_NAME.to_string());
    let version = config.version.clone();
    let volumes = extract_volumes(&config);
    let networks = extract_networks(&config);
    let mut services = take_services(config)?;

    tracing::debug!(
        "Converting project {} ({} services, compose version {}, backend {})",
        project,
        services.len(),
        version.as_deref().unwrap_or("unspecified"),
        backend
    );

    let mut all_routes: Vec<RoutingRule> = routes.to_vec();
    let mut containers = Vec::new();
    let mut overrides = Vec::new();

    for (name, service) in services.iter_mut() {
        let derived = traefik::parse_labels(&service.label_map(), name);
        if !derived.is_empty() {
            tracing::debug!("Service {} exposes {} routing rule(s)", name, derived.len());
        }
        all_routes.extend(derived);

        if let Some(network) = attach_proxy_network(service) {
            tracing::debug!("Attached service {} to proxy network {}", name, network);
        }

        let (container, service_override) = nix::translate(name, service, &project, backend);
        containers.push(container.render());
        if let Some(service_override) = service_override {
            overrides.push(service_override.render());
        }
    }

    let volume_units: Vec<String> = volumes
        .iter()
        .map(|v| lifecycle_unit(LifecycleKind::Volume, v, backend))
        .collect();
    let network_units: Vec<String> = networks
        .iter()
        .map(|n| lifecycle_unit(LifecycleKind::Network, n, backend))
        .collect();

    let mut doc = NixDocument::new(backend);
    doc.section("Containers", containers)
        .section("Systemd service customizations", overrides)
        .section("Volume services", volume_units)
        .section("Network services", network_units)
        .section("Traefik configuration", vec![traefik::generate_config(&all_routes)]);

    tracing::info!(
        "Generated NixOS configuration for {} ({} volumes, {} networks, {} routes)",
        project,
        volumes.len(),
        networks.len(),
        all_routes.len()
    );

    Ok(doc.render())
}

/// Routing rules derived from the services' Traefik labels, in manifest order
pub fn routing_rules(manifest: &str) -> Result<Vec<RoutingRule>> {
    let services = take_services(ComposeParser::parse_str(manifest)?)?;
    Ok(services
        .iter()
        .flat_map(|(name, service)| traefik::parse_labels(&service.label_map(), name))
        .collect())
}

fn take_services(config: ComposeConfig) -> Result<OrderedMap<ServiceConfig>> {
    config.services.ok_or(ConvertError::NoServices)
}
