//! systemd service overrides and volume/network lifecycle units

use super::writer::{attr_name, quote, NixWriter};
use super::Backend;
use crate::compose::ServiceConfig;
use crate::ordered_map::OrderedMap;

/// Label prefix for `serviceConfig` overrides
pub const SERVICE_LABEL_PREFIX: &str = "pod2nix.systemd.service.";
/// Label prefix for `unitConfig` overrides
pub const UNIT_LABEL_PREFIX: &str = "pod2nix.systemd.unit.";

/// Priority used for every override, above the oci-containers defaults
const OVERRIDE_PRIORITY: u32 = 90;

/// Map a compose restart policy to a systemd `Restart=` value
///
/// `no` disables the override entirely; unknown policies fall back to
/// `on-failure`.
pub fn map_restart_policy(restart: &str) -> Option<&'static str> {
    match restart {
        "always" | "unless-stopped" => Some("always"),
        "on-failure" => Some("on-failure"),
        "no" => None,
        _ => Some("on-failure"),
    }
}

/// Customizations of the systemd unit oci-containers generates for a service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceOverride {
    /// Unit name, `<backend>-<service>`
    pub unit: String,
    pub service_config: OrderedMap,
    pub unit_config: OrderedMap,
}

impl ServiceOverride {
    /// Build the override, or `None` if the service needs no customization
    pub fn from_service(name: &str, service: &ServiceConfig, backend: Backend) -> Option<Self> {
        let mut service_config = OrderedMap::new();
        let mut unit_config = OrderedMap::new();

        if let Some(policy) = service.restart.as_deref().and_then(map_restart_policy) {
            service_config.insert("Restart", policy.to_string());
        }

        for (key, value) in service.label_map() {
            if let Some(field) = key.strip_prefix(SERVICE_LABEL_PREFIX) {
                service_config.insert(field, value);
            } else if let Some(field) = key.strip_prefix(UNIT_LABEL_PREFIX) {
                unit_config.insert(field, value);
            }
        }

        if service_config.is_empty() && unit_config.is_empty() {
            return None;
        }

        Some(Self {
            unit: format!("{}-{}", backend, name),
            service_config,
            unit_config,
        })
    }

    pub fn render(&self) -> String {
        let mut w = NixWriter::new(1);
        w.open(format!("systemd.services.{}", quote(&self.unit)));

        for (block, entries) in [
            ("serviceConfig", &self.service_config),
            ("unitConfig", &self.unit_config),
        ] {
            if entries.is_empty() {
                continue;
            }
            w.open(block);
            for (key, value) in entries.iter() {
                w.raw(
                    attr_name(key),
                    &format!("lib.mkOverride {} {}", OVERRIDE_PRIORITY, quote(value)),
                );
            }
            w.close();
        }

        w.close();
        w.finish()
    }
}

/// Kind of runtime resource a lifecycle unit manages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleKind {
    Volume,
    Network,
}

impl LifecycleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleKind::Volume => "volume",
            LifecycleKind::Network => "network",
        }
    }
}

/// Oneshot unit creating a volume or network at boot and removing it on stop
pub fn lifecycle_unit(kind: LifecycleKind, name: &str, backend: Backend) -> String {
    let kind = kind.as_str();
    let arg = shell_word(name);
    let mut w = NixWriter::new(1);

    w.open(format!(
        "systemd.services.{}",
        quote(&format!("{}-{}-{}", backend, kind, name))
    ));
    w.raw("path", &format!("[ pkgs.{} ]", backend));
    w.open("serviceConfig");
    w.string("Type", "oneshot");
    w.raw("RemainAfterExit", "true");
    w.string("ExecStop", &format!("{} {} rm -f {}", backend, kind, arg));
    w.close();
    w.indented_string(
        "script",
        &[format!(
            "{backend} {kind} inspect {arg} >/dev/null 2>&1 || {backend} {kind} create {arg}"
        )],
    );
    w.raw("wantedBy", "[ \"multi-user.target\" ]");
    w.close();

    w.finish()
}

/// Single-quote a shell word unless it only holds name-safe characters
fn shell_word(word: &str) -> String {
    let safe = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
    if safe {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', "'\\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::config::LabelsConfig;

    #[test]
    fn test_map_restart_policy() {
        assert_eq!(map_restart_policy("always"), Some("always"));
        assert_eq!(map_restart_policy("unless-stopped"), Some("always"));
        assert_eq!(map_restart_policy("on-failure"), Some("on-failure"));
        assert_eq!(map_restart_policy("no"), None);
        assert_eq!(map_restart_policy("unknown"), Some("on-failure"));
    }

    #[test]
    fn test_restart_override() {
        let service = ServiceConfig {
            restart: Some("always".into()),
            ..Default::default()
        };

        let out = ServiceOverride::from_service("web", &service, Backend::Docker)
            .unwrap()
            .render();
        assert!(out.contains("systemd.services.\"docker-web\" = {"));
        assert!(out.contains("Restart = lib.mkOverride 90 \"always\";"));
        assert!(!out.contains("unitConfig"));
    }

    #[test]
    fn test_systemd_labels() {
        let service = ServiceConfig {
            labels: Some(LabelsConfig::Array(vec![
                "pod2nix.systemd.service.RestartSec=5".into(),
                "pod2nix.systemd.unit.After=network.target".into(),
            ])),
            ..Default::default()
        };

        let out = ServiceOverride::from_service("web", &service, Backend::Podman)
            .unwrap()
            .render();
        assert!(out.contains("systemd.services.\"podman-web\""));
        assert!(out.contains("serviceConfig = {\n      RestartSec = lib.mkOverride 90 \"5\";\n    };"));
        assert!(out.contains("unitConfig = {\n      After = lib.mkOverride 90 \"network.target\";\n    };"));
    }

    #[test]
    fn test_restart_label_replaces_policy() {
        let service = ServiceConfig {
            restart: Some("always".into()),
            labels: Some(LabelsConfig::Array(vec![
                "pod2nix.systemd.service.Restart=on-abnormal".into(),
            ])),
            ..Default::default()
        };

        let decl = ServiceOverride::from_service("web", &service, Backend::Docker).unwrap();
        assert_eq!(decl.service_config.len(), 1);
        assert_eq!(
            decl.service_config.get("Restart").map(String::as_str),
            Some("on-abnormal")
        );
    }

    #[test]
    fn test_no_override_needed() {
        assert!(ServiceOverride::from_service("web", &ServiceConfig::default(), Backend::Docker).is_none());

        let service = ServiceConfig {
            restart: Some("no".into()),
            ..Default::default()
        };
        assert!(ServiceOverride::from_service("web", &service, Backend::Docker).is_none());
    }

    #[test]
    fn test_volume_unit() {
        let out = lifecycle_unit(LifecycleKind::Volume, "data", Backend::Docker);
        assert!(out.contains("systemd.services.\"docker-volume-data\""));
        assert!(out.contains("path = [ pkgs.docker ];"));
        assert!(out.contains("docker volume create data"));
        assert!(out.contains("ExecStop = \"docker volume rm -f data\";"));
        assert!(out.contains("wantedBy = [ \"multi-user.target\" ];"));
    }

    #[test]
    fn test_network_unit_podman() {
        let out = lifecycle_unit(LifecycleKind::Network, "frontend", Backend::Podman);
        assert!(out.contains("systemd.services.\"podman-network-frontend\""));
        assert!(out.contains("path = [ pkgs.podman ];"));
        assert!(out.contains(
            "podman network inspect frontend >/dev/null 2>&1 || podman network create frontend"
        ));
    }

    #[test]
    fn test_unit_quotes_unsafe_names() {
        let out = lifecycle_unit(LifecycleKind::Volume, "my data;rm", Backend::Docker);
        assert!(out.contains(
            "docker volume inspect 'my data;rm' >/dev/null 2>&1 || docker volume create 'my data;rm'"
        ));
        assert!(out.contains("ExecStop = \"docker volume rm -f 'my data;rm'\";"));
        assert_eq!(shell_word("it's"), "'it'\\''s'");
    }
}
