//! Node-level settings the containerd templates read.
//!
//! These mirror the subset of the agent's node configuration that ends up in
//! `config.toml`. Empty strings mean "unset": the templates test string fields
//! for emptiness the same way they test flags for `false`.

use serde::{Deserialize, Serialize};

/// Node configuration referenced by [`ContainerdConfig`](super::ContainerdConfig).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Node {
    /// Paths and sockets of the managed containerd instance.
    pub containerd: ContainerdPaths,
    /// Agent settings: sandbox image, snapshotter, CNI directories.
    pub agent_config: AgentSettings,
    /// Whether SELinux support is enabled in the CRI plugin.
    pub selinux: bool,
    /// Runtime handler used when a pod does not request one.
    pub default_runtime: String,
}

/// Filesystem locations and endpoints of the containerd instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerdPaths {
    /// gRPC listen address, stored with its scheme (e.g. `unix:///run/k3s/containerd/containerd.sock`).
    pub address: String,
    /// Directory for the `opt` plugin.
    pub opt: String,
    /// Directory holding per-registry `hosts.toml` files.
    pub registry: String,
    /// Persistent state root.
    pub root: String,
    /// Ephemeral state directory.
    pub state: String,
    /// Optional block-IO class configuration file.
    pub block_io_config: String,
    /// Optional RDT class configuration file.
    pub rdt_config: String,
}

/// Agent-side settings consumed by the CRI plugin sections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Pause (sandbox) image reference.
    pub pause_image: String,
    /// Snapshotter name (`overlayfs`, `native`, `stargz`, `nix`, ...).
    pub snapshotter: String,
    /// CRI image service socket used by the stargz keychain and the nix snapshotter.
    pub image_service_socket: String,
    /// CNI plugin binary directory.
    pub cni_bin_dir: String,
    /// CNI network configuration directory.
    pub cni_conf_dir: String,
}
