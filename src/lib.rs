//! containerd-templates
//!
//! Renders the configuration files a Kubernetes node agent hands to
//! containerd: `config.toml` (schema versions 2 and 3) and per-registry
//! `hosts.toml`.
//!
//! Each file is produced by executing a bundled base template against a typed
//! context. For `config.toml` an operator-supplied override template is
//! layered on top and may include or extend the base. The text is then
//! canonicalized so that the layout does not depend on which conditional
//! sections rendered.
//!
//! # Modules
//!
//! - [`config`] - context data model and context-file loading
//! - [`templates`] - bundled base templates and typed render entry points
//! - [`templating`] - compiler, helper filters, canonicalizer, checksums
//! - [`core`] - crate error types
//! - [`cli`] - command-line front-end
//! - [`constants`] - shared names and defaults
//!
//! # Example
//!
//! ```rust,no_run
//! use containerd_templates::config::ContainerdConfig;
//! use containerd_templates::templates::{SchemaVersion, render_containerd_config};
//!
//! let mut config = ContainerdConfig::default();
//! config.node_config.containerd.address = "unix:///run/k3s/containerd/containerd.sock".into();
//! config.node_config.containerd.opt = "/var/lib/rancher/k3s/agent/containerd".into();
//! config.node_config.containerd.registry = "/var/lib/rancher/k3s/agent/etc/containerd/certs.d".into();
//!
//! let toml = render_containerd_config(SchemaVersion::V3, None, &config)?;
//! println!("{toml}");
//! # Ok::<(), containerd_templates::templating::TemplateError>(())
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod templates;
pub mod templating;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
