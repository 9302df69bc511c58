//! Routing rules derived from `traefik.http.*` service labels

use super::rule::{RoutingRule, DEFAULT_ENTRYPOINT};
use crate::ordered_map::OrderedMap;
use regex::Regex;
use std::sync::LazyLock;

static HOST_RULE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Host\(`([^`]+)`\)").expect("host rule pattern is valid"));

/// Router/service fields collected before a rule is known to be complete
#[derive(Debug, Default)]
struct PartialRule {
    url: Option<String>,
    host: Option<String>,
    entrypoint: Option<String>,
    cert_resolver: Option<String>,
    enable_tls: bool,
}

/// Derive routing rules from a service's labels
///
/// Router and service labels are grouped by name. The load balancer port
/// always targets the compose service itself (`http://<service>:<port>`).
/// Only rules that end up with both a host and a URL are returned; the
/// rest are dropped silently.
pub fn parse_labels(labels: &OrderedMap, service_name: &str) -> Vec<RoutingRule> {
    let mut partials: OrderedMap<PartialRule> = OrderedMap::new();

    for (key, value) in labels.iter() {
        let Some(rest) = key.strip_prefix("traefik.http.") else {
            continue;
        };
        let mut parts = rest.splitn(3, '.');
        let (Some(kind), Some(name)) = (parts.next(), parts.next()) else {
            continue;
        };
        if name.is_empty() || !matches!(kind, "routers" | "services") {
            continue;
        }
        let suffix = parts.next().unwrap_or("");

        if !partials.contains_key(name) {
            partials.insert(name, PartialRule::default());
        }
        let Some(partial) = partials.get_mut(name) else {
            continue;
        };

        match (kind, suffix) {
            ("routers", "rule") => {
                if let Some(host) = HOST_RULE.captures(value).and_then(|c| c.get(1)) {
                    partial.host = Some(host.as_str().to_string());
                }
            }
            ("routers", "entrypoints") => partial.entrypoint = Some(value.clone()),
            ("routers", "tls.certresolver") => {
                partial.cert_resolver = Some(value.clone());
                partial.enable_tls = true;
            }
            ("services", "loadbalancer.server.port") => {
                partial.url = Some(format!("http://{}:{}", service_name, value));
            }
            _ => {}
        }
    }

    partials
        .into_iter()
        .filter_map(|(name, partial)| {
            Some(RoutingRule {
                url: partial.url?,
                host: partial.host?,
                entrypoint: partial
                    .entrypoint
                    .unwrap_or_else(|| DEFAULT_ENTRYPOINT.to_string()),
                cert_resolver: partial.cert_resolver,
                enable_tls: partial.enable_tls,
                name,
            })
        })
        .collect()
}
