//! Test utilities for containerd-templates
//!
//! Logging setup and context builders shared by unit and integration tests.

use std::sync::Once;

use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::config::{
    AgentSettings, AuthConfig, ContainerdConfig, ContainerdPaths, Node, Registry, RegistryConfig,
};

static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests, once per process.
///
/// Uses `level` if given, otherwise `RUST_LOG`; does nothing when neither is set.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}

/// A k3s Linux agent with the stock paths and no optional features.
pub fn linux_node_config() -> ContainerdConfig {
    ContainerdConfig {
        node_config: Node {
            containerd: ContainerdPaths {
                address: "unix:///run/k3s/containerd/containerd.sock".to_string(),
                opt: "/var/lib/rancher/k3s/agent/containerd".to_string(),
                registry: "/var/lib/rancher/k3s/agent/etc/containerd/certs.d".to_string(),
                root: "/var/lib/rancher/k3s/agent/containerd".to_string(),
                state: "/run/k3s/containerd".to_string(),
                ..Default::default()
            },
            agent_config: AgentSettings {
                pause_image: "rancher/mirrored-pause:3.6".to_string(),
                snapshotter: "overlayfs".to_string(),
                ..Default::default()
            },
            ..Default::default()
        },
        ..Default::default()
    }
}

/// A private registry with username/password auth for `host`.
pub fn registry_with_auth(host: &str, username: &str, password: &str) -> Registry {
    let mut registry = Registry::default();
    registry.configs.insert(
        host.to_string(),
        RegistryConfig {
            auth: Some(AuthConfig {
                username: username.to_string(),
                password: password.to_string(),
                ..Default::default()
            }),
            tls: None,
        },
    );
    registry
}
