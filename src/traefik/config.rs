//! `services.traefik.dynamicConfigOptions` generation

use super::rule::RoutingRule;
use crate::nix::writer::{attr_name, quote, NixWriter};

/// Render the Traefik HTTP dynamic configuration for the given rules
///
/// A rule gets a load balancer entry when it has a URL and a router entry
/// when it has a host, so incomplete rules show up partially. Returns an
/// empty string when nothing would be emitted.
pub fn generate_config(rules: &[RoutingRule]) -> String {
    let services: Vec<&RoutingRule> = rules
        .iter()
        .filter(|r| !r.name.is_empty() && !r.url.is_empty())
        .collect();
    let routers: Vec<&RoutingRule> = rules
        .iter()
        .filter(|r| !r.name.is_empty() && !r.host.is_empty())
        .collect();

    if services.is_empty() && routers.is_empty() {
        return String::new();
    }

    let mut w = NixWriter::new(1);
    w.open("services.traefik.dynamicConfigOptions.http");

    if !services.is_empty() {
        w.open("services");
        for (i, rule) in services.iter().enumerate() {
            if i > 0 {
                w.blank();
            }
            w.open_list(format!("{}.loadBalancer.servers", attr_name(&rule.name)));
            w.open_element();
            w.string("url", &rule.url);
            w.close_element();
            w.close_list();
        }
        w.close();
    }

    if !services.is_empty() && !routers.is_empty() {
        w.blank();
    }

    if !routers.is_empty() {
        w.open("routers");
        for (i, rule) in routers.iter().enumerate() {
            if i > 0 {
                w.blank();
            }
            w.open(attr_name(&rule.name));
            w.string("rule", &format!("Host(`{}`)", rule.host));
            if let Some(resolver) = rule.cert_resolver.as_deref().filter(|_| rule.enable_tls) {
                w.open("tls");
                w.string("certResolver", resolver);
                w.close();
            }
            w.string("service", &rule.name);
            let entrypoints: Vec<String> = rule
                .entrypoint
                .split(',')
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(quote)
                .collect();
            if !entrypoints.is_empty() {
                w.raw("entryPoints", &format!("[ {} ]", entrypoints.join(" ")));
            }
            w.close();
        }
        w.close();
    }

    w.close();
    w.finish()
}
