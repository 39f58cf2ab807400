//! Data context for the containerd `config.toml` templates.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::node::Node;
use super::registry::Registry;
use crate::constants::DEFAULT_PROGRAM;

/// An additional OCI runtime handler registered with the CRI plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerdRuntimeConfig {
    /// Runtime type identifier, e.g. `io.containerd.runc.v2`.
    pub runtime_type: String,
    /// Path to the runtime binary. Empty means the shim's default.
    pub binary_name: String,
}

impl ContainerdRuntimeConfig {
    /// Create a runtime handler with an explicit binary path.
    pub fn new(runtime_type: impl Into<String>, binary_name: impl Into<String>) -> Self {
        Self {
            runtime_type: runtime_type.into(),
            binary_name: binary_name.into(),
        }
    }
}

/// Everything the containerd config templates can reference.
///
/// One instance is built by the caller per render and is only read while
/// rendering.
///
/// `extra_runtimes` is a [`BTreeMap`] so runtime tables are always emitted in
/// sorted-name order. Regenerating the file from the same settings therefore
/// yields identical bytes, which callers rely on to skip rewrites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerdConfig {
    pub node_config: Node,
    pub disable_cgroup: bool,
    pub systemd_cgroup: bool,
    pub is_running_in_user_ns: bool,
    pub enable_unprivileged: bool,
    pub no_default_endpoint: bool,
    pub nonroot_devices: bool,
    pub private_registry_config: Option<Registry>,
    pub extra_runtimes: BTreeMap<String, ContainerdRuntimeConfig>,
    /// Display name of the generating program, written into the header comment.
    pub program: String,
}

impl Default for ContainerdConfig {
    fn default() -> Self {
        Self {
            node_config: Node::default(),
            disable_cgroup: false,
            systemd_cgroup: false,
            is_running_in_user_ns: false,
            enable_unprivileged: false,
            no_default_endpoint: false,
            nonroot_devices: false,
            private_registry_config: None,
            extra_runtimes: BTreeMap::new(),
            program: DEFAULT_PROGRAM.to_string(),
        }
    }
}
