//! `virtualisation.oci-containers.containers` declarations

use super::writer::{quote, NixWriter};
use crate::compose::config::{CommandConfig, PortConfig, ServiceConfig, VolumeMount};
use crate::ordered_map::OrderedMap;

/// Compose's default log driver, which NixOS replaces with journald
const COMPOSE_DEFAULT_LOG_DRIVER: &str = "json-file";

/// One container declaration, ready to render
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerDecl {
    /// Service name, used as the container attribute name
    pub name: String,
    pub image: Option<String>,
    pub environment: Option<OrderedMap>,
    pub volumes: Vec<String>,
    pub ports: Vec<String>,
    pub cmd: Vec<String>,
    pub entrypoint: Option<String>,
    pub workdir: Option<String>,
    pub user: Option<String>,
    /// Labels without any `traefik.*` keys
    pub labels: OrderedMap,
    pub depends_on: Vec<String>,
    pub log_driver: Option<String>,
    pub extra_options: Vec<String>,
}

impl ContainerDecl {
    pub fn from_service(name: &str, service: &ServiceConfig, project: &str) -> Self {
        let mut cmd = service
            .command
            .as_ref()
            .map(|c| c.to_args())
            .unwrap_or_default();

        // A list entrypoint keeps its extra arguments ahead of an explicit command
        let entrypoint = match &service.entrypoint {
            Some(CommandConfig::Shell(program)) => Some(program.clone()),
            Some(CommandConfig::Exec(args)) => args.split_first().map(|(program, rest)| {
                if service.command.is_some() {
                    let mut prefixed = rest.to_vec();
                    prefixed.append(&mut cmd);
                    cmd = prefixed;
                } else if !rest.is_empty() {
                    tracing::warn!(
                        "Service {}: entrypoint arguments {:?} dropped, no command to prepend them to",
                        name,
                        rest
                    );
                }
                program.clone()
            }),
            None => None,
        };

        let mut labels = service.label_map();
        labels.retain(|key, _| !key.starts_with("traefik."));

        Self {
            name: name.to_string(),
            image: service.image.clone(),
            environment: service.environment.as_ref().map(|env| env.to_map()),
            volumes: service
                .volumes
                .iter()
                .flatten()
                .map(|mount| volume_spec(mount, project))
                .collect(),
            ports: service
                .ports
                .iter()
                .flatten()
                .map(PortConfig::to_short)
                .collect(),
            cmd,
            entrypoint,
            workdir: service.working_dir.clone(),
            user: service.user.clone(),
            labels,
            depends_on: service
                .depends_on
                .as_ref()
                .map(|deps| deps.service_names().to_vec())
                .unwrap_or_default(),
            log_driver: service
                .logging
                .as_ref()
                .and_then(|logging| logging.driver.as_deref())
                .map(|driver| match driver {
                    COMPOSE_DEFAULT_LOG_DRIVER => "journald".to_string(),
                    other => other.to_string(),
                }),
            extra_options: generate_extra_options(service),
        }
    }

    /// Render the declaration at module top level
    pub fn render(&self) -> String {
        let mut w = NixWriter::new(1);
        w.open(format!(
            "virtualisation.oci-containers.containers.{}",
            quote(&self.name)
        ));

        if let Some(image) = &self.image {
            w.string("image", image);
        }
        if let Some(environment) = self.environment.as_ref().filter(|env| !env.is_empty()) {
            w.string_attrs("environment", environment.iter());
        }
        if !self.volumes.is_empty() {
            w.string_list("volumes", &self.volumes);
        }
        if !self.ports.is_empty() {
            w.string_list("ports", &self.ports);
        }
        if !self.cmd.is_empty() {
            let args: Vec<String> = self.cmd.iter().map(|arg| quote(arg)).collect();
            w.raw("cmd", &format!("[ {} ]", args.join(" ")));
        }
        if let Some(entrypoint) = &self.entrypoint {
            w.string("entrypoint", entrypoint);
        }
        if let Some(workdir) = &self.workdir {
            w.string("workdir", workdir);
        }
        if let Some(user) = &self.user {
            w.string("user", user);
        }
        if !self.labels.is_empty() {
            w.string_attrs("labels", self.labels.iter());
        }
        if !self.depends_on.is_empty() {
            w.string_list("dependsOn", &self.depends_on);
        }
        if let Some(driver) = &self.log_driver {
            w.string("log-driver", driver);
        }
        if !self.extra_options.is_empty() {
            w.string_list("extraOptions", &self.extra_options);
        }

        w.close();
        w.finish()
    }
}

/// Volume entry as passed to the runtime
///
/// Anything with a colon is kept as written. A bare name becomes a
/// project-scoped read-write volume mounted at that name.
fn volume_spec(mount: &VolumeMount, project: &str) -> String {
    match mount {
        VolumeMount::Short(spec) if spec.contains(':') => spec.clone(),
        VolumeMount::Short(name) => format!("{}_{}:{}:rw", project, name, name),
        VolumeMount::Long(long) => {
            let mut spec = match &long.source {
                Some(source) => format!("{}:{}", source, long.target),
                None => long.target.clone(),
            };
            if long.read_only {
                spec.push_str(":ro");
            }
            spec
        }
    }
}

/// Extra `docker run`/`podman run` flags for settings oci-containers has no option for
pub fn generate_extra_options(service: &ServiceConfig) -> Vec<String> {
    let mut options = Vec::new();

    if service.privileged == Some(true) {
        options.push("--privileged".to_string());
    }

    let flag_lists = [
        ("--cap-add", &service.cap_add),
        ("--cap-drop", &service.cap_drop),
        ("--device", &service.devices),
        ("--dns", &service.dns),
    ];
    for (flag, values) in flag_lists {
        for value in values.iter().flatten() {
            options.push(format!("{}={}", flag, value));
        }
    }

    for (key, value) in service.sysctls.iter().flat_map(|s| s.iter()) {
        options.push(format!("--sysctl={}={}", key, value));
    }

    for host in service.extra_hosts.iter().flatten() {
        options.push(format!("--add-host={}", host));
    }

    let limits = service
        .deploy
        .as_ref()
        .and_then(|d| d.resources.as_ref())
        .and_then(|r| r.limits.as_ref());
    if let Some(limits) = limits {
        if let Some(cpus) = &limits.cpus {
            options.push(format!("--cpus={}", cpus));
        }
        if let Some(memory) = &limits.memory {
            options.push(format!("--memory={}", memory));
        }
    }

    if let Some(test) = service.healthcheck.as_ref().and_then(|h| h.test.as_ref()) {
        options.push(format!("--health-cmd={}", test.to_command()));
    }

    if let Some(hostname) = &service.hostname {
        options.push(format!("--hostname={}", hostname));
    }

    // A network mode excludes any other network attachment
    if let Some(mode) = &service.network_mode {
        options.push(format!("--network={}", mode));
    } else if let Some(networks) = &service.networks {
        for (network, aliases) in networks.attachments() {
            if network == "default" {
                continue;
            }
            options.push(format!("--network={}", network));
            for alias in aliases {
                options.push(format!("--network-alias={}", alias));
            }
        }
    }

    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::config::{
        CommandConfig, DeployConfig, EnvironmentConfig, HealthcheckConfig, HealthcheckTest,
        LabelsConfig, ResourceSpec, ResourcesConfig,
    };

    fn map(entries: &[(&str, &str)]) -> OrderedMap {
        entries.iter().map(|(k, v)| (*k, v.to_string())).collect()
    }

    #[test]
    fn test_basic_container() {
        let service = ServiceConfig {
            image: Some("nginx".to_string()),
            ports: Some(vec![PortConfig::Short("80:80".to_string())]),
            environment: Some(EnvironmentConfig::Map(map(&[("KEY", "value")]))),
            ..Default::default()
        };

        let out = ContainerDecl::from_service("web", &service, "test").render();
        assert!(out.contains("virtualisation.oci-containers.containers.\"web\" = {"));
        assert!(out.contains("image = \"nginx\""));
        assert!(out.contains("ports = [\n      \"80:80\"\n    ]"));
        assert!(out.contains("environment = {\n      \"KEY\" = \"value\";\n    }"));
    }

    #[test]
    fn test_volumes_named_and_bind() {
        let service = ServiceConfig {
            volumes: Some(vec![
                VolumeMount::Short("data:/app/data".to_string()),
                VolumeMount::Short("cache".to_string()),
            ]),
            ..Default::default()
        };

        let decl = ContainerDecl::from_service("app", &service, "proj");
        assert_eq!(decl.volumes, vec!["data:/app/data", "proj_cache:cache:rw"]);
        assert!(decl
            .render()
            .contains("volumes = [\n      \"data:/app/data\"\n      \"proj_cache:cache:rw\"\n    ]"));
    }

    #[test]
    fn test_command_forms() {
        let exec = ServiceConfig {
            command: Some(CommandConfig::Exec(vec![
                "nginx".into(),
                "-g".into(),
                "daemon off;".into(),
            ])),
            ..Default::default()
        };
        let out = ContainerDecl::from_service("web", &exec, "test").render();
        assert!(out.contains("cmd = [ \"nginx\" \"-g\" \"daemon off;\" ];"));

        let shell = ServiceConfig {
            command: Some(CommandConfig::Shell("npm  run start".into())),
            ..Default::default()
        };
        let decl = ContainerDecl::from_service("web", &shell, "test");
        assert_eq!(decl.cmd, vec!["npm", "run", "start"]);
    }

    #[test]
    fn test_entrypoint_list_prepends_arguments() {
        let service = ServiceConfig {
            entrypoint: Some(CommandConfig::Exec(vec!["/bin/sh".into(), "-c".into()])),
            command: Some(CommandConfig::Exec(vec!["echo hi".into()])),
            ..Default::default()
        };

        let decl = ContainerDecl::from_service("job", &service, "test");
        assert_eq!(decl.entrypoint.as_deref(), Some("/bin/sh"));
        assert_eq!(decl.cmd, vec!["-c", "echo hi"]);
    }

    #[test]
    fn test_entrypoint_string_is_kept_verbatim() {
        let service = ServiceConfig {
            entrypoint: Some(CommandConfig::Shell("/bin/sh -c".into())),
            ..Default::default()
        };

        let decl = ContainerDecl::from_service("job", &service, "test");
        assert_eq!(decl.entrypoint.as_deref(), Some("/bin/sh -c"));
        assert!(decl.cmd.is_empty());

        let out = decl.render();
        assert!(out.contains("entrypoint = \"/bin/sh -c\";"));
        assert!(!out.contains("cmd"));
    }

    #[test]
    fn test_entrypoint_list_without_command_emits_no_cmd() {
        let service = ServiceConfig {
            entrypoint: Some(CommandConfig::Exec(vec!["/bin/sh".into(), "-c".into()])),
            ..Default::default()
        };

        let decl = ContainerDecl::from_service("job", &service, "test");
        assert_eq!(decl.entrypoint.as_deref(), Some("/bin/sh"));
        assert!(decl.cmd.is_empty());
        assert!(!decl.render().contains("cmd"));
    }

    #[test]
    fn test_labels_exclude_traefik() {
        let service = ServiceConfig {
            labels: Some(LabelsConfig::Map(map(&[
                ("custom.label", "value"),
                ("traefik.enable", "true"),
            ]))),
            ..Default::default()
        };

        let out = ContainerDecl::from_service("web", &service, "test").render();
        assert!(out.contains("labels = {\n      \"custom.label\" = \"value\";\n    }"));
        assert!(!out.contains("traefik.enable"));
    }

    #[test]
    fn test_only_traefik_labels_emit_no_label_block() {
        let service = ServiceConfig {
            labels: Some(LabelsConfig::Array(vec!["traefik.enable=true".into()])),
            ..Default::default()
        };

        let out = ContainerDecl::from_service("web", &service, "test").render();
        assert!(!out.contains("labels"));
    }

    #[test]
    fn test_log_driver_mapping() {
        let mut service = ServiceConfig::default();
        service.logging = Some(crate::compose::config::LoggingConfig {
            driver: Some("json-file".into()),
        });
        let decl = ContainerDecl::from_service("a", &service, "p");
        assert_eq!(decl.log_driver.as_deref(), Some("journald"));

        service.logging = Some(crate::compose::config::LoggingConfig {
            driver: Some("syslog".into()),
        });
        let decl = ContainerDecl::from_service("a", &service, "p");
        assert_eq!(decl.log_driver.as_deref(), Some("syslog"));
    }

    #[test]
    fn test_privileged_option() {
        let service = ServiceConfig {
            privileged: Some(true),
            ..Default::default()
        };
        assert_eq!(generate_extra_options(&service), vec!["--privileged"]);
    }

    #[test]
    fn test_capability_options() {
        let service = ServiceConfig {
            cap_add: Some(vec!["NET_ADMIN".into()]),
            cap_drop: Some(vec!["ALL".into()]),
            ..Default::default()
        };
        assert_eq!(
            generate_extra_options(&service),
            vec!["--cap-add=NET_ADMIN", "--cap-drop=ALL"]
        );
    }

    #[test]
    fn test_resource_limits() {
        let service = ServiceConfig {
            deploy: Some(DeployConfig {
                resources: Some(ResourcesConfig {
                    limits: Some(ResourceSpec {
                        cpus: Some("1.5".into()),
                        memory: Some("512m".into()),
                    }),
                }),
            }),
            ..Default::default()
        };
        assert_eq!(
            generate_extra_options(&service),
            vec!["--cpus=1.5", "--memory=512m"]
        );
    }

    #[test]
    fn test_healthcheck() {
        let service = ServiceConfig {
            healthcheck: Some(HealthcheckConfig {
                test: Some(HealthcheckTest::Array(vec![
                    "CMD".into(),
                    "curl".into(),
                    "localhost".into(),
                ])),
            }),
            ..Default::default()
        };
        assert_eq!(
            generate_extra_options(&service),
            vec!["--health-cmd=CMD curl localhost"]
        );
    }

    #[test]
    fn test_option_order() {
        let service = ServiceConfig {
            healthcheck: Some(HealthcheckConfig {
                test: Some(HealthcheckTest::Command("true".into())),
            }),
            dns: Some(vec!["1.1.1.1".into()]),
            sysctls: Some(map(&[("net.ipv4.ip_forward", "1")])),
            devices: Some(vec!["/dev/fuse".into()]),
            extra_hosts: Some(vec!["db:10.0.0.2".into()]),
            privileged: Some(true),
            ..Default::default()
        };
        assert_eq!(
            generate_extra_options(&service),
            vec![
                "--privileged",
                "--device=/dev/fuse",
                "--dns=1.1.1.1",
                "--sysctl=net.ipv4.ip_forward=1",
                "--add-host=db:10.0.0.2",
                "--health-cmd=true",
            ]
        );
    }

    #[test]
    fn test_network_attachments() {
        use crate::compose::config::{NetworksConfig, ServiceNetworkConfig};

        let mut networks = OrderedMap::new();
        networks.insert("default", ServiceNetworkConfig::default());
        networks.insert(
            "proxy",
            ServiceNetworkConfig {
                aliases: vec!["web.internal".into()],
            },
        );
        let service = ServiceConfig {
            networks: Some(NetworksConfig::Map(networks)),
            ..Default::default()
        };
        assert_eq!(
            generate_extra_options(&service),
            vec!["--network=proxy", "--network-alias=web.internal"]
        );
    }

    #[test]
    fn test_network_mode_excludes_attachments() {
        use crate::compose::config::NetworksConfig;

        let service = ServiceConfig {
            network_mode: Some("host".into()),
            networks: Some(NetworksConfig::Array(vec!["proxy".into()])),
            ..Default::default()
        };
        assert_eq!(generate_extra_options(&service), vec!["--network=host"]);
    }
}
