//! Docker Compose configuration types
//!
//! The model is built from a generic YAML document instead of a strict
//! `Deserialize` derive: a field of an unexpected shape becomes `None` and
//! the rest of the manifest is still converted.

use super::labels::{parse_env_array, parse_labels_array};
use crate::ordered_map::OrderedMap;
use serde_yaml::{Mapping, Value};

/// Docker Compose file configuration
#[derive(Debug, Clone, Default)]
pub struct ComposeConfig {
    /// Compose file version
    pub version: Option<String>,
    /// Project name
    pub name: Option<String>,
    /// Services, `None` when the `services` key is missing
    pub services: Option<OrderedMap<ServiceConfig>>,
    /// Top-level network names
    pub networks: Vec<String>,
    /// Top-level volume names
    pub volumes: Vec<String>,
}

impl ComposeConfig {
    /// Build the model from a parsed YAML document
    pub fn from_value(doc: &Value) -> Self {
        let Some(root) = doc.as_mapping() else {
            return Self::default();
        };

        let services: Option<OrderedMap<ServiceConfig>> = field(root, "services").and_then(Value::as_mapping).map(|map| {
            map.iter()
                .filter_map(|(name, spec)| Some((scalar(name)?, ServiceConfig::from_value(spec))))
                .collect()
        });

        Self {
            version: field(root, "version").and_then(scalar),
            name: field(root, "name").and_then(scalar),
            services,
            networks: field(root, "networks").map(mapping_keys).unwrap_or_default(),
            volumes: field(root, "volumes").map(mapping_keys).unwrap_or_default(),
        }
    }
}

/// Service configuration
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    /// Image name
    pub image: Option<String>,
    /// Hostname
    pub hostname: Option<String>,
    /// Environment variables
    pub environment: Option<EnvironmentConfig>,
    /// Port mappings
    pub ports: Option<Vec<PortConfig>>,
    /// Volume mounts
    pub volumes: Option<Vec<VolumeMount>>,
    /// Networks to connect to
    pub networks: Option<NetworksConfig>,
    /// Network mode
    pub network_mode: Option<String>,
    /// Labels
    pub labels: Option<LabelsConfig>,
    /// Service dependencies
    pub depends_on: Option<DependsOnConfig>,
    /// Restart policy
    pub restart: Option<String>,
    /// Command to run
    pub command: Option<CommandConfig>,
    /// Entrypoint
    pub entrypoint: Option<CommandConfig>,
    /// Working directory
    pub working_dir: Option<String>,
    /// User
    pub user: Option<String>,
    /// Privileged mode
    pub privileged: Option<bool>,
    /// Capabilities to add
    pub cap_add: Option<Vec<String>>,
    /// Capabilities to drop
    pub cap_drop: Option<Vec<String>>,
    /// Devices
    pub devices: Option<Vec<String>>,
    /// DNS servers
    pub dns: Option<Vec<String>>,
    /// Sysctls
    pub sysctls: Option<OrderedMap>,
    /// Extra hosts
    pub extra_hosts: Option<Vec<String>>,
    /// Logging configuration
    pub logging: Option<LoggingConfig>,
    /// Healthcheck configuration
    pub healthcheck: Option<HealthcheckConfig>,
    /// Deploy configuration
    pub deploy: Option<DeployConfig>,
}

impl ServiceConfig {
    /// Build a service from its YAML node; anything but a mapping is an empty service
    pub fn from_value(value: &Value) -> Self {
        let Some(map) = value.as_mapping() else {
            return Self::default();
        };

        Self {
            image: field(map, "image").and_then(scalar),
            hostname: field(map, "hostname").and_then(scalar),
            environment: field(map, "environment").and_then(EnvironmentConfig::from_value),
            ports: field(map, "ports").and_then(|v| v.as_sequence()).map(|seq| {
                seq.iter().filter_map(PortConfig::from_value).collect()
            }),
            volumes: field(map, "volumes").and_then(|v| v.as_sequence()).map(|seq| {
                seq.iter().filter_map(VolumeMount::from_value).collect()
            }),
            networks: field(map, "networks").and_then(NetworksConfig::from_value),
            network_mode: field(map, "network_mode").and_then(scalar),
            labels: field(map, "labels").and_then(LabelsConfig::from_value),
            depends_on: field(map, "depends_on").and_then(DependsOnConfig::from_value),
            restart: field(map, "restart").and_then(scalar),
            command: field(map, "command").and_then(CommandConfig::from_value),
            entrypoint: field(map, "entrypoint").and_then(CommandConfig::from_value),
            working_dir: field(map, "working_dir").and_then(scalar),
            user: field(map, "user").and_then(scalar),
            privileged: field(map, "privileged").and_then(Value::as_bool),
            cap_add: field(map, "cap_add").and_then(string_list),
            cap_drop: field(map, "cap_drop").and_then(string_list),
            devices: field(map, "devices").and_then(string_list),
            dns: field(map, "dns").and_then(string_list),
            sysctls: field(map, "sysctls").and_then(|v| match v {
                Value::Sequence(_) => string_list(v).map(|items| parse_labels_array(&items)),
                Value::Mapping(m) => Some(string_map(m)),
                _ => None,
            }),
            extra_hosts: field(map, "extra_hosts").and_then(|v| match v {
                Value::Mapping(m) => Some(
                    string_map(m)
                        .iter()
                        .map(|(host, ip)| format!("{}:{}", host, ip))
                        .collect(),
                ),
                _ => string_list(v),
            }),
            logging: field(map, "logging").and_then(Value::as_mapping).map(|m| LoggingConfig {
                driver: field(m, "driver").and_then(scalar),
            }),
            healthcheck: field(map, "healthcheck").and_then(Value::as_mapping).map(|m| {
                HealthcheckConfig {
                    test: field(m, "test").and_then(HealthcheckTest::from_value),
                }
            }),
            deploy: field(map, "deploy").and_then(Value::as_mapping).map(DeployConfig::from_mapping),
        }
    }

    /// Labels normalized into one mapping, empty when the service has none
    pub fn label_map(&self) -> OrderedMap {
        self.labels.as_ref().map(LabelsConfig::to_map).unwrap_or_default()
    }
}

/// Command configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandConfig {
    /// Shell command string
    Shell(String),
    /// Exec form array
    Exec(Vec<String>),
}

impl CommandConfig {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Sequence(_) => string_list(value).map(Self::Exec),
            _ => scalar(value).map(Self::Shell),
        }
    }

    /// Argument vector; the shell form is split on whitespace
    pub fn to_args(&self) -> Vec<String> {
        match self {
            Self::Shell(cmd) => cmd.split_whitespace().map(str::to_string).collect(),
            Self::Exec(args) => args.clone(),
        }
    }
}

/// Environment configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvironmentConfig {
    /// Array of KEY=value strings
    Array(Vec<String>),
    /// Map of key to value
    Map(OrderedMap),
}

impl EnvironmentConfig {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Mapping(m) => Some(Self::Map(string_map(m))),
            _ => string_list(value).map(Self::Array),
        }
    }

    pub fn to_map(&self) -> OrderedMap {
        match self {
            Self::Array(entries) => parse_env_array(entries),
            Self::Map(map) => map.clone(),
        }
    }
}

/// Labels configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelsConfig {
    /// Array of "key=value" strings
    Array(Vec<String>),
    /// Map of key to value
    Map(OrderedMap),
}

impl LabelsConfig {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Mapping(m) => Some(Self::Map(string_map(m))),
            _ => string_list(value).map(Self::Array),
        }
    }

    pub fn to_map(&self) -> OrderedMap {
        match self {
            Self::Array(entries) => parse_labels_array(entries),
            Self::Map(map) => map.clone(),
        }
    }
}

/// Port configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortConfig {
    /// Short syntax: "8080:80"
    Short(String),
    /// Long syntax
    Long(PortConfigLong),
}

/// Long port configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortConfigLong {
    /// Target port in container
    pub target: String,
    /// Published port on host
    pub published: Option<String>,
    /// Host IP to bind to
    pub host_ip: Option<String>,
    /// Protocol (tcp/udp)
    pub protocol: Option<String>,
}

impl PortConfig {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Mapping(m) => Some(Self::Long(PortConfigLong {
                target: field(m, "target").and_then(scalar)?,
                published: field(m, "published").and_then(scalar),
                host_ip: field(m, "host_ip").and_then(scalar),
                protocol: field(m, "protocol").and_then(scalar),
            })),
            _ => scalar(value).map(Self::Short),
        }
    }

    /// Short-syntax rendering, as accepted by `--publish`
    pub fn to_short(&self) -> String {
        match self {
            Self::Short(port) => port.clone(),
            Self::Long(port) => {
                let mut spec = String::new();
                if let Some(ip) = &port.host_ip {
                    spec.push_str(ip);
                    spec.push(':');
                }
                if let Some(published) = &port.published {
                    spec.push_str(published);
                    spec.push(':');
                }
                spec.push_str(&port.target);
                if let Some(protocol) = &port.protocol {
                    spec.push('/');
                    spec.push_str(protocol);
                }
                spec
            }
        }
    }
}

/// Volume mount configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VolumeMount {
    /// Short syntax: "host:container:mode"
    Short(String),
    /// Long syntax
    Long(VolumeMountLong),
}

/// Long volume mount configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VolumeMountLong {
    /// Mount type (volume, bind, tmpfs)
    pub mount_type: Option<String>,
    /// Source path or volume name
    pub source: Option<String>,
    /// Target path in container
    pub target: String,
    /// Read only
    pub read_only: bool,
}

impl VolumeMount {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Mapping(m) => Some(Self::Long(VolumeMountLong {
                mount_type: field(m, "type").and_then(scalar),
                source: field(m, "source").and_then(scalar),
                target: field(m, "target").and_then(scalar)?,
                read_only: field(m, "read_only").and_then(Value::as_bool).unwrap_or(false),
            })),
            _ => scalar(value).map(Self::Short),
        }
    }
}

/// Networks configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworksConfig {
    /// Array of network names
    Array(Vec<String>),
    /// Map of network name to config
    Map(OrderedMap<ServiceNetworkConfig>),
}

/// Service network configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceNetworkConfig {
    /// Aliases
    pub aliases: Vec<String>,
}

impl NetworksConfig {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Mapping(m) => Some(Self::Map(
                m.iter()
                    .filter_map(|(name, config)| {
                        let aliases = config
                            .as_mapping()
                            .and_then(|c| field(c, "aliases"))
                            .and_then(string_list)
                            .unwrap_or_default();
                        Some((scalar(name)?, ServiceNetworkConfig { aliases }))
                    })
                    .collect(),
            )),
            _ => string_list(value).map(Self::Array),
        }
    }

    /// Attached networks with their aliases, in declaration order
    pub fn attachments(&self) -> Vec<(&str, &[String])> {
        match self {
            Self::Array(names) => names.iter().map(|n| (n.as_str(), &[] as &[String])).collect(),
            Self::Map(map) => map.iter().map(|(n, c)| (n, c.aliases.as_slice())).collect(),
        }
    }
}

/// Depends on configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependsOnConfig {
    /// Array of service names
    Array(Vec<String>),
    /// Map of service to condition; only the keys matter here
    Map(Vec<String>),
}

impl DependsOnConfig {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Mapping(m) => Some(Self::Map(m.keys().filter_map(scalar).collect())),
            _ => string_list(value).map(Self::Array),
        }
    }

    pub fn service_names(&self) -> &[String] {
        match self {
            Self::Array(names) | Self::Map(names) => names,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Driver
    pub driver: Option<String>,
}

/// Healthcheck configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthcheckConfig {
    /// Test command
    pub test: Option<HealthcheckTest>,
}

/// Healthcheck test
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthcheckTest {
    /// Command string
    Command(String),
    /// Command array
    Array(Vec<String>),
}

impl HealthcheckTest {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Sequence(_) => string_list(value).map(Self::Array),
            _ => scalar(value).map(Self::Command),
        }
    }

    /// Single command line; the array form is joined with spaces
    pub fn to_command(&self) -> String {
        match self {
            Self::Command(cmd) => cmd.clone(),
            Self::Array(parts) => parts.join(" "),
        }
    }
}

/// Deploy configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployConfig {
    /// Resource limits and reservations
    pub resources: Option<ResourcesConfig>,
}

/// Resources configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourcesConfig {
    /// Resource limits
    pub limits: Option<ResourceSpec>,
}

/// Resource specification
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceSpec {
    /// CPU limit
    pub cpus: Option<String>,
    /// Memory limit
    pub memory: Option<String>,
}

impl DeployConfig {
    fn from_mapping(map: &Mapping) -> Self {
        let limits = field(map, "resources")
            .and_then(Value::as_mapping)
            .and_then(|r| field(r, "limits"))
            .and_then(Value::as_mapping)
            .map(|l| ResourceSpec {
                cpus: field(l, "cpus").and_then(scalar),
                memory: field(l, "memory").and_then(scalar),
            });

        Self {
            resources: Some(ResourcesConfig { limits }),
        }
    }
}

fn field<'a>(map: &'a Mapping, key: &str) -> Option<&'a Value> {
    map.get(key)
}

/// Text form of a scalar; `None` for null, sequences and mappings
fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

/// A list of scalars; a lone scalar is a one-element list
fn string_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Sequence(seq) => Some(seq.iter().filter_map(scalar).collect()),
        _ => scalar(value).map(|s| vec![s]),
    }
}

/// Mapping of scalar keys to scalar values; null values become empty strings
fn string_map(map: &Mapping) -> OrderedMap {
    map.iter()
        .filter_map(|(key, value)| Some((scalar(key)?, scalar(value).unwrap_or_default())))
        .collect()
}

fn mapping_keys(value: &Value) -> Vec<String> {
    value
        .as_mapping()
        .map(|m| m.keys().filter_map(scalar).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> ComposeConfig {
        ComposeConfig::from_value(&serde_yaml::from_str(yaml).unwrap())
    }

    #[test]
    fn test_services_keep_manifest_order() {
        let config = parse(
            r#"
services:
  zeta:
    image: a
  alpha:
    image: b
  mid:
    image: c
"#,
        );

        let services = config.services.unwrap();
        let names: Vec<_> = services.keys().collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_missing_services_is_none() {
        let config = parse("version: '3.8'\n");
        assert!(config.services.is_none());
        assert_eq!(config.version.as_deref(), Some("3.8"));
    }

    #[test]
    fn test_wrong_shapes_are_dropped() {
        let config = parse(
            r#"
services:
  app:
    image: [not, a, string]
    privileged: "yes"
    ports: "80:80"
    healthcheck: true
"#,
        );

        let services = config.services.unwrap();
        let app = services.get("app").unwrap();
        assert!(app.image.is_none());
        assert!(app.privileged.is_none());
        assert!(app.ports.is_none());
        assert!(app.healthcheck.is_none());
    }

    #[test]
    fn test_environment_scalars_are_stringified() {
        let config = parse(
            r#"
services:
  db:
    environment:
      PORT: 5432
      DEBUG: true
      EMPTY:
"#,
        );

        let services = config.services.unwrap();
        let env = services.get("db").unwrap().environment.as_ref().unwrap().to_map();
        assert_eq!(env.get("PORT").map(String::as_str), Some("5432"));
        assert_eq!(env.get("DEBUG").map(String::as_str), Some("true"));
        assert_eq!(env.get("EMPTY").map(String::as_str), Some(""));
    }

    #[test]
    fn test_long_port_and_volume_syntax() {
        let config = parse(
            r#"
services:
  web:
    ports:
      - target: 80
        published: 8080
        protocol: tcp
      - 443
    volumes:
      - type: volume
        source: data
        target: /data
        read_only: true
"#,
        );

        let services = config.services.unwrap();
        let web = services.get("web").unwrap();
        let ports: Vec<_> = web.ports.as_ref().unwrap().iter().map(PortConfig::to_short).collect();
        assert_eq!(ports, vec!["8080:80/tcp", "443"]);

        match &web.volumes.as_ref().unwrap()[0] {
            VolumeMount::Long(v) => {
                assert_eq!(v.source.as_deref(), Some("data"));
                assert!(v.read_only);
            }
            other => panic!("expected long volume, got {:?}", other),
        }
    }

    #[test]
    fn test_depends_on_map_keeps_key_order() {
        let config = parse(
            r#"
services:
  app:
    depends_on:
      db:
        condition: service_healthy
      cache:
        condition: service_started
"#,
        );

        let services = config.services.unwrap();
        let deps = services.get("app").unwrap().depends_on.as_ref().unwrap();
        assert_eq!(deps.service_names(), ["db".to_string(), "cache".to_string()]);
    }

    #[test]
    fn test_extra_hosts_and_sysctls_forms() {
        let config = parse(
            r#"
services:
  app:
    extra_hosts:
      somehost: 162.242.195.82
    sysctls:
      - net.core.somaxconn=1024
"#,
        );

        let services = config.services.unwrap();
        let app = services.get("app").unwrap();
        assert_eq!(app.extra_hosts.as_deref(), Some(&["somehost:162.242.195.82".to_string()][..]));
        let sysctls = app.sysctls.as_ref().unwrap();
        assert_eq!(sysctls.get("net.core.somaxconn").map(String::as_str), Some("1024"));
    }
}
