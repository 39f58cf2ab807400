//! Render contexts: the typed data the templates are bound to.
//!
//! - [`ContainerdConfig`] feeds the containerd `config.toml` templates
//! - [`HostConfig`] feeds the per-registry `hosts.toml` template
//! - [`Registry`] and friends describe private registry settings
//!
//! All maps in these types are [`BTreeMap`](std::collections::BTreeMap)s.
//! Templates iterate them in sorted-key order, so rendering is deterministic.
//!
//! [`parse_context`] loads any of these types from a YAML, JSON, or TOML file.

mod containerd;
mod hosts;
mod node;
mod parser;
mod registry;

pub use containerd::{ContainerdConfig, ContainerdRuntimeConfig};
pub use hosts::{HostConfig, RegistryEndpoint};
pub use node::{AgentSettings, ContainerdPaths, Node};
pub use parser::{ContextFormat, parse_context, parse_context_str};
pub use registry::{AuthConfig, Mirror, Registry, RegistryConfig, TlsConfig};
