//! Routing rule type shared by CLI input, rule files and label extraction

use crate::error::{ConvertError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Entrypoint used when none is given
pub const DEFAULT_ENTRYPOINT: &str = "web";

fn default_entrypoint() -> String {
    DEFAULT_ENTRYPOINT.to_string()
}

/// A Traefik router plus the load-balanced service behind it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingRule {
    /// Router and service name
    pub name: String,
    /// Backend URL, e.g. `http://web:8080`
    pub url: String,
    /// Host matched by the router
    pub host: String,
    /// Entrypoint(s), comma separated
    #[serde(default = "default_entrypoint")]
    pub entrypoint: String,
    /// ACME certificate resolver
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert_resolver: Option<String>,
    /// Whether the router terminates TLS
    #[serde(default, rename = "enableTLS")]
    pub enable_tls: bool,
}

impl RoutingRule {
    pub fn new(name: impl Into<String>, url: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            host: host.into(),
            entrypoint: default_entrypoint(),
            cert_resolver: None,
            enable_tls: false,
        }
    }

    /// Check the constraints a user-supplied rule must satisfy
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ConvertError::InvalidRoute("name is required".to_string()));
        }
        if self.host.trim().is_empty() {
            return Err(ConvertError::InvalidRoute(format!(
                "{}: host is required",
                self.name
            )));
        }
        if self.entrypoint.trim().is_empty() {
            return Err(ConvertError::InvalidRoute(format!(
                "{}: entrypoint is required",
                self.name
            )));
        }
        url::Url::parse(&self.url).map_err(|e| {
            ConvertError::InvalidRoute(format!("{}: invalid url '{}': {}", self.name, self.url, e))
        })?;
        Ok(())
    }

    /// Load rules from a JSON (`.json`) or YAML file holding a list of rules
    pub fn load_file(path: &Path) -> Result<Vec<RoutingRule>> {
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let rules: Vec<RoutingRule> = if is_json {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content).map_err(|e| {
                ConvertError::InvalidRoute(format!("{}: {}", path.display(), e))
            })?
        };

        for rule in &rules {
            rule.validate()?;
        }
        Ok(rules)
    }
}

impl FromStr for RoutingRule {
    type Err = ConvertError;

    /// Parse `name=web,url=http://web:80,host=example.com[,entrypoint=..][,cert-resolver=..][,tls]`
    fn from_str(s: &str) -> Result<Self> {
        let mut rule = RoutingRule::new("", "", "");

        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = part.split_once('=').unwrap_or((part, ""));
            match key {
                "name" => rule.name = value.to_string(),
                "url" => rule.url = value.to_string(),
                "host" => rule.host = value.to_string(),
                "entrypoint" | "entrypoints" => rule.entrypoint = value.to_string(),
                "cert-resolver" | "certresolver" | "certResolver" => {
                    rule.cert_resolver = Some(value.to_string());
                    rule.enable_tls = true;
                }
                "tls" => rule.enable_tls = value.is_empty() || value == "true",
                other => {
                    return Err(ConvertError::InvalidRoute(format!("unknown field '{}'", other)))
                }
            }
        }

        rule.validate()?;
        Ok(rule)
    }
}
