use containerd_templates::config::{ContainerdRuntimeConfig, RegistryConfig, TlsConfig};
use containerd_templates::templates::{SchemaVersion, render_containerd_config};

use crate::common::{assert_canonical, linux_node_config, lookup, parse_toml, registry_with_auth};

const CRI: &str = "io.containerd.grpc.v1.cri";

#[test]
fn test_default_linux_agent() {
    let rendered = render_containerd_config(SchemaVersion::V2, None, &linux_node_config()).unwrap();

    let expected = r#"# File generated by k3s. DO NOT EDIT. Use config.toml.tmpl instead.
version = 2

[grpc]
  address = "/run/k3s/containerd/containerd.sock"

[plugins."io.containerd.internal.v1.opt"]
  path = "/var/lib/rancher/k3s/agent/containerd"

[plugins."io.containerd.grpc.v1.cri"]
  stream_server_address = "127.0.0.1"
  stream_server_port = "10010"
  enable_selinux = false
  enable_unprivileged_ports = false
  enable_unprivileged_icmp = false
  device_ownership_from_security_context = false
  sandbox_image = "rancher/mirrored-pause:3.6"

[plugins."io.containerd.grpc.v1.cri".containerd]
  snapshotter = "overlayfs"
  disable_snapshot_annotations = true

[plugins."io.containerd.grpc.v1.cri".containerd.runtimes.runc]
  runtime_type = "io.containerd.runc.v2"

[plugins."io.containerd.grpc.v1.cri".containerd.runtimes.runc.options]
  SystemdCgroup = false

[plugins."io.containerd.grpc.v1.cri".registry]
  config_path = "/var/lib/rancher/k3s/agent/etc/containerd/certs.d"
"#;
    assert_eq!(rendered, expected);
}

#[test]
fn test_unprivileged_ports_without_cgroup_override() {
    let mut config = linux_node_config();
    config.enable_unprivileged = true;
    config.disable_cgroup = false;

    let rendered = render_containerd_config(SchemaVersion::V2, None, &config).unwrap();
    assert!(rendered.contains("enable_unprivileged_ports = true"));
    assert!(rendered.contains("enable_unprivileged_icmp = true"));
    assert!(!rendered.contains("disable_cgroup"));

    let table = parse_toml(&rendered);
    assert_eq!(
        lookup(&table, &["plugins", CRI, "enable_unprivileged_ports"]).and_then(|v| v.as_bool()),
        Some(true)
    );
}

#[test]
fn test_rootless_flags() {
    let mut config = linux_node_config();
    config.disable_cgroup = true;
    config.is_running_in_user_ns = true;
    config.systemd_cgroup = true;

    let table = parse_toml(&render_containerd_config(SchemaVersion::V2, None, &config).unwrap());
    for key in ["disable_cgroup", "disable_apparmor", "restrict_oom_score_adj"] {
        assert_eq!(lookup(&table, &["plugins", CRI, key]).and_then(|v| v.as_bool()), Some(true), "{key}");
    }
    assert_eq!(
        lookup(&table, &["plugins", CRI, "containerd", "runtimes", "runc", "options", "SystemdCgroup"])
            .and_then(|v| v.as_bool()),
        Some(true)
    );
}

#[test]
fn test_extra_runtime_options_table() {
    let mut config = linux_node_config();
    config.extra_runtimes.insert(
        "custom".to_string(),
        ContainerdRuntimeConfig::new("io.containerd.runc.v2", "/usr/bin/custom-runc"),
    );

    let rendered = render_containerd_config(SchemaVersion::V2, None, &config).unwrap();
    assert!(
        rendered.contains(
            "[plugins.\"io.containerd.grpc.v1.cri\".containerd.runtimes.\"custom\".options]\n  BinaryName = \"/usr/bin/custom-runc\"\n"
        ),
        "{rendered}"
    );

    let table = parse_toml(&rendered);
    let runtime = lookup(&table, &["plugins", CRI, "containerd", "runtimes", "custom"]).unwrap();
    assert_eq!(runtime["runtime_type"].as_str(), Some("io.containerd.runc.v2"));
    assert_eq!(runtime["options"]["BinaryName"].as_str(), Some("/usr/bin/custom-runc"));
}

#[test]
fn test_extra_runtimes_render_in_sorted_order() {
    let mut config = linux_node_config();
    for name in ["nvidia", "crun", "wasmtime"] {
        config
            .extra_runtimes
            .insert(name.to_string(), ContainerdRuntimeConfig::new("io.containerd.runc.v2", format!("/usr/bin/{name}")));
    }

    let rendered = render_containerd_config(SchemaVersion::V2, None, &config).unwrap();
    let position = |name: &str| rendered.find(&format!("runtimes.\"{name}\"]")).unwrap();
    assert!(position("crun") < position("nvidia"));
    assert!(position("nvidia") < position("wasmtime"));

    let again = render_containerd_config(SchemaVersion::V2, None, &config).unwrap();
    assert_eq!(rendered, again);
}

#[test]
fn test_private_registry_auth() {
    let mut config = linux_node_config();
    let mut registry = registry_with_auth("registry.example.com", "robot", "p@ss\"word");
    registry.configs.insert(
        "tls-only.example.com".to_string(),
        RegistryConfig {
            auth: None,
            tls: Some(TlsConfig {
                ca_file: "/etc/ssl/ca.pem".to_string(),
                ..Default::default()
            }),
        },
    );
    config.private_registry_config = Some(registry);

    let rendered = render_containerd_config(SchemaVersion::V2, None, &config).unwrap();
    assert!(!rendered.contains("tls-only.example.com"), "only auth entries are rendered");

    let table = parse_toml(&rendered);
    let auth = lookup(
        &table,
        &["plugins", CRI, "registry", "configs", "registry.example.com", "auth"],
    )
    .unwrap();
    assert_eq!(auth["username"].as_str(), Some("robot"));
    assert_eq!(auth["password"].as_str(), Some("p@ss\"word"));
    assert!(auth.get("identitytoken").is_none());
}

#[test]
fn test_stargz_snapshotter() {
    let mut config = linux_node_config();
    config.node_config.agent_config.snapshotter = "stargz".to_string();
    config.node_config.agent_config.image_service_socket = "/run/containerd-stargz-grpc/containerd-stargz-grpc.sock".to_string();
    config.private_registry_config = Some(registry_with_auth("registry.example.com", "robot", "secret"));

    let rendered = render_containerd_config(SchemaVersion::V2, None, &config).unwrap();
    assert_canonical(&rendered);

    let table = parse_toml(&rendered);
    assert_eq!(
        lookup(&table, &["plugins", CRI, "containerd", "disable_snapshot_annotations"])
            .and_then(|v| v.as_bool()),
        Some(false)
    );

    let stargz = lookup(&table, &["plugins", "io.containerd.snapshotter.v1.stargz"]).unwrap();
    assert_eq!(
        stargz["cri_keychain_image_service_path"].as_str(),
        Some("/run/containerd-stargz-grpc/containerd-stargz-grpc.sock")
    );
    assert_eq!(stargz["cri_keychain"]["enable_keychain"].as_bool(), Some(true));
    assert_eq!(
        stargz["registry"]["config_path"].as_str(),
        Some("/var/lib/rancher/k3s/agent/etc/containerd/certs.d")
    );
    assert_eq!(
        stargz["registry"]["configs"]["registry.example.com"]["auth"]["username"].as_str(),
        Some("robot")
    );
}

#[test]
fn test_optional_sections() {
    let mut config = linux_node_config();
    config.node_config.default_runtime = "nvidia".to_string();
    config.node_config.selinux = true;
    config.node_config.agent_config.cni_bin_dir = "/var/lib/rancher/k3s/data/cni".to_string();
    config.node_config.agent_config.cni_conf_dir = "/var/lib/rancher/k3s/agent/etc/cni/net.d".to_string();
    config.node_config.containerd.block_io_config = "/etc/containerd/blockio.yaml".to_string();
    config.nonroot_devices = true;

    let rendered = render_containerd_config(SchemaVersion::V2, None, &config).unwrap();
    assert_canonical(&rendered);
    let table = parse_toml(&rendered);

    let cri = lookup(&table, &["plugins", CRI]).unwrap();
    assert_eq!(cri["enable_selinux"].as_bool(), Some(true));
    assert_eq!(cri["device_ownership_from_security_context"].as_bool(), Some(true));
    assert_eq!(cri["containerd"]["default_runtime_name"].as_str(), Some("nvidia"));
    assert_eq!(cri["cni"]["bin_dir"].as_str(), Some("/var/lib/rancher/k3s/data/cni"));
    assert_eq!(cri["cni"]["conf_dir"].as_str(), Some("/var/lib/rancher/k3s/agent/etc/cni/net.d"));

    let tasks = lookup(&table, &["plugins", "io.containerd.service.v1.tasks-service"]).unwrap();
    assert_eq!(tasks["blockio_config_file"].as_str(), Some("/etc/containerd/blockio.yaml"));
    assert!(tasks.get("rdt_config_file").is_none());
}

#[test]
fn test_tcp_address_is_deschemified() {
    let mut config = linux_node_config();
    config.node_config.containerd.address = "tcp://127.0.0.1:1234".to_string();

    let table = parse_toml(&render_containerd_config(SchemaVersion::V2, None, &config).unwrap());
    assert_eq!(lookup(&table, &["grpc", "address"]).and_then(|v| v.as_str()), Some("127.0.0.1:1234"));
}
