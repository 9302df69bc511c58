//! Derived facts about a compose project: named volumes, networks, and
//! proxy network attachments

use super::config::{ComposeConfig, NetworksConfig, ServiceConfig, ServiceNetworkConfig, VolumeMount};
use crate::ordered_map::OrderedMap;

/// Label naming the network Traefik uses to reach a service
pub const PROXY_NETWORK_LABEL: &str = "traefik.docker.network";

/// Named volumes, top-level declarations first, then service references
pub fn extract_volumes(config: &ComposeConfig) -> Vec<String> {
    let mut volumes: Vec<String> = Vec::new();
    let mut add = |name: &str| {
        if !name.is_empty() && !volumes.iter().any(|v| v == name) {
            volumes.push(name.to_string());
        }
    };

    for name in &config.volumes {
        add(name);
    }

    let services = config.services.iter().flat_map(|s| s.iter());
    for (_, service) in services {
        for mount in service.volumes.iter().flatten() {
            if let Some(name) = named_volume(mount) {
                add(name);
            }
        }
    }

    volumes
}

/// The volume name a mount refers to, `None` for bind mounts
fn named_volume(mount: &VolumeMount) -> Option<&str> {
    match mount {
        VolumeMount::Short(spec) => {
            if spec.contains('/') {
                return None;
            }
            Some(spec.split(':').next().unwrap_or(spec))
        }
        VolumeMount::Long(long) => {
            let is_volume = long.mount_type.as_deref().map_or(true, |t| t == "volume");
            let source = long.source.as_deref()?;
            (is_volume && !source.contains('/')).then_some(source)
        }
    }
}

/// Top-level network names
pub fn extract_networks(config: &ComposeConfig) -> Vec<String> {
    let mut networks: Vec<String> = Vec::new();
    for name in &config.networks {
        if !networks.contains(name) {
            networks.push(name.clone());
        }
    }
    networks
}

/// Attach the service to the network named by its `traefik.docker.network` label
///
/// Returns the attached network name, if any.
pub fn attach_proxy_network(service: &mut ServiceConfig) -> Option<String> {
    let network = service.label_map().get(PROXY_NETWORK_LABEL).cloned()?;
    if network.is_empty() {
        return None;
    }

    match service
        .networks
        .get_or_insert_with(|| NetworksConfig::Map(OrderedMap::new()))
    {
        NetworksConfig::Map(map) => {
            if !map.contains_key(&network) {
                map.insert(network.clone(), ServiceNetworkConfig::default());
            }
        }
        NetworksConfig::Array(names) => {
            if !names.contains(&network) {
                names.push(network.clone());
            }
        }
    }

    Some(network)
}
