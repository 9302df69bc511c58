//! pod2nix - Convert Docker Compose files into NixOS modules
//!
//! pod2nix compiles a compose manifest into a NixOS module built on
//! `virtualisation.oci-containers`. It covers:
//!
//! - Container declarations for every service (Docker or Podman backend)
//! - systemd overrides for restart policies and `pod2nix.systemd.*` labels
//! - Oneshot units that create named volumes and networks at boot
//! - Traefik dynamic configuration from `traefik.http.*` labels
//!
//! ```no_run
//! use pod2nix::{convert, Backend};
//!
//! let module = convert("services:\n  web:\n    image: nginx\n", Backend::Docker, &[])?;
//! println!("{}", module);
//! # Ok::<(), pod2nix::ConvertError>(())
//! ```

pub mod compose;
pub mod converter;
pub mod error;
pub mod nix;
pub mod ordered_map;
pub mod traefik;

pub use converter::{convert, routing_rules};
pub use error::{ConvertError, Result};
pub use nix::Backend;
pub use ordered_map::OrderedMap;
pub use traefik::RoutingRule;
