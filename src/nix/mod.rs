//! NixOS module generation
//!
//! Translates compose services into `virtualisation.oci-containers`
//! declarations, systemd overrides and lifecycle units, and assembles them
//! into a single module.

pub mod container;
pub mod document;
pub mod systemd;
pub mod writer;

pub use container::{generate_extra_options, ContainerDecl};
pub use document::{collapse_blank_lines, NixDocument};
pub use systemd::{lifecycle_unit, map_restart_policy, LifecycleKind, ServiceOverride};
pub use writer::NixWriter;

use crate::compose::ServiceConfig;
use crate::error::ConvertError;
use std::str::FromStr;

/// Container runtime backing `virtualisation.oci-containers`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Backend {
    /// Docker daemon
    #[default]
    Docker,
    /// Podman
    Podman,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Docker => "docker",
            Backend::Podman => "podman",
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "docker" => Ok(Backend::Docker),
            "podman" => Ok(Backend::Podman),
            _ => Err(ConvertError::InvalidBackend(s.to_string())),
        }
    }
}

/// Translate one service into its container declaration and optional systemd override
pub fn translate(
    name: &str,
    service: &ServiceConfig,
    project: &str,
    backend: Backend,
) -> (ContainerDecl, Option<ServiceOverride>) {
    (
        ContainerDecl::from_service(name, service, project),
        ServiceOverride::from_service(name, service, backend),
    )
}
