use containerd_templates::config::ContainerdRuntimeConfig;
use containerd_templates::templates::{CONTAINERD_V3, SchemaVersion, render_containerd_config};

use crate::common::{assert_canonical, linux_node_config, lookup, parse_toml, registry_with_auth};

const RUNTIME: &str = "io.containerd.cri.v1.runtime";
const IMAGES: &str = "io.containerd.cri.v1.images";

#[test]
fn test_default_linux_agent() {
    let rendered = render_containerd_config(SchemaVersion::V3, None, &linux_node_config()).unwrap();
    assert!(rendered.starts_with(
        "# File generated by k3s. DO NOT EDIT. Use config.toml.tmpl instead.\nversion = 3\n"
    ));
    assert_canonical(&rendered);

    let table = parse_toml(&rendered);
    assert_eq!(table["version"].as_integer(), Some(3));
    assert_eq!(table["root"].as_str(), Some("/var/lib/rancher/k3s/agent/containerd"));
    assert_eq!(table["state"].as_str(), Some("/run/k3s/containerd"));
    assert_eq!(
        lookup(&table, &["grpc", "address"]).and_then(|v| v.as_str()),
        Some("/run/k3s/containerd/containerd.sock")
    );

    let images = lookup(&table, &["plugins", IMAGES]).unwrap();
    assert_eq!(images["snapshotter"].as_str(), Some("overlayfs"));
    assert_eq!(images["disable_snapshot_annotations"].as_bool(), Some(true));
    assert_eq!(images["pinned_images"]["sandbox"].as_str(), Some("rancher/mirrored-pause:3.6"));
    assert_eq!(
        images["registry"]["config_path"].as_str(),
        Some("/var/lib/rancher/k3s/agent/etc/containerd/certs.d")
    );

    let runtimes = lookup(&table, &["plugins", RUNTIME, "containerd", "runtimes"]).unwrap();
    assert_eq!(runtimes["runc"]["runtime_type"].as_str(), Some("io.containerd.runc.v2"));
    assert_eq!(runtimes["runc"]["options"]["SystemdCgroup"].as_bool(), Some(false));
    assert_eq!(runtimes["runhcs-wcow-process"]["runtime_type"].as_str(), Some("io.containerd.runhcs.v1"));

    assert!(lookup(&table, &["plugins", "io.containerd.snapshotter.v1.stargz"]).is_none());
    assert!(lookup(&table, &["plugins", RUNTIME, "cni"]).is_none());
}

#[test]
fn test_unprivileged_ports_without_cgroup_override() {
    let mut config = linux_node_config();
    config.enable_unprivileged = true;

    let rendered = render_containerd_config(SchemaVersion::V3, None, &config).unwrap();
    assert!(!rendered.contains("disable_cgroup"));

    let table = parse_toml(&rendered);
    let runtime = lookup(&table, &["plugins", RUNTIME]).unwrap();
    assert_eq!(runtime["enable_unprivileged_ports"].as_bool(), Some(true));
    assert_eq!(runtime["enable_unprivileged_icmp"].as_bool(), Some(true));
}

#[test]
fn test_extra_runtimes() {
    let mut config = linux_node_config();
    config.systemd_cgroup = true;
    config.extra_runtimes.insert(
        "custom".to_string(),
        ContainerdRuntimeConfig::new("io.containerd.runc.v2", "/usr/bin/custom-runc"),
    );
    config.extra_runtimes.insert(
        "spin".to_string(),
        ContainerdRuntimeConfig::new("io.containerd.spin.v2", ""),
    );

    let rendered = render_containerd_config(SchemaVersion::V3, None, &config).unwrap();
    let table = parse_toml(&rendered);
    let runtimes = lookup(&table, &["plugins", RUNTIME, "containerd", "runtimes"]).unwrap();

    assert_eq!(runtimes["custom"]["options"]["BinaryName"].as_str(), Some("/usr/bin/custom-runc"));
    assert_eq!(runtimes["custom"]["options"]["SystemdCgroup"].as_bool(), Some(true));
    assert_eq!(runtimes["spin"]["runtime_type"].as_str(), Some("io.containerd.spin.v2"));
    assert!(runtimes["spin"].get("options").is_none(), "no options without a binary");
}

#[test]
fn test_registry_auth_and_stargz() {
    let mut config = linux_node_config();
    config.node_config.agent_config.snapshotter = "stargz".to_string();
    config.node_config.agent_config.image_service_socket = "/run/stargz.sock".to_string();
    config.private_registry_config = Some(registry_with_auth("registry.example.com", "robot", "secret"));

    let rendered = render_containerd_config(SchemaVersion::V3, None, &config).unwrap();
    assert_canonical(&rendered);
    assert_eq!(
        rendered.matches("[plugins.'io.containerd.cri.v1.images'.registry]").count(),
        1,
        "image registry table is emitted once"
    );

    let table = parse_toml(&rendered);
    let images = lookup(&table, &["plugins", IMAGES]).unwrap();
    assert_eq!(images["disable_snapshot_annotations"].as_bool(), Some(false));
    assert_eq!(
        images["registry"]["configs"]["registry.example.com"]["auth"]["password"].as_str(),
        Some("secret")
    );

    let stargz = lookup(&table, &["plugins", "io.containerd.snapshotter.v1.stargz"]).unwrap();
    assert_eq!(stargz["cri_keychain_image_service_path"].as_str(), Some("/run/stargz.sock"));
    assert_eq!(
        stargz["registry"]["configs"]["registry.example.com"]["auth"]["username"].as_str(),
        Some("robot")
    );
}

#[test]
fn test_cni_and_task_service_sections() {
    let mut config = linux_node_config();
    config.node_config.agent_config.cni_bin_dir = "/opt/cni/bin".to_string();
    config.node_config.agent_config.cni_conf_dir = "/etc/cni/net.d".to_string();
    config.node_config.containerd.rdt_config = "/etc/containerd/rdt.yaml".to_string();
    config.node_config.default_runtime = "crun".to_string();

    let table = parse_toml(&render_containerd_config(SchemaVersion::V3, None, &config).unwrap());

    let runtime = lookup(&table, &["plugins", RUNTIME]).unwrap();
    assert_eq!(runtime["cni"]["bin_dir"].as_str(), Some("/opt/cni/bin"));
    assert_eq!(runtime["cni"]["conf_dir"].as_str(), Some("/etc/cni/net.d"));
    assert_eq!(runtime["containerd"]["default_runtime_name"].as_str(), Some("crun"));

    let tasks = lookup(&table, &["plugins", "io.containerd.service.v1.tasks-service"]).unwrap();
    assert_eq!(tasks["rdt_config_file"].as_str(), Some("/etc/containerd/rdt.yaml"));
    assert!(tasks.get("blockio_config_file").is_none());
}

#[test]
fn test_plain_render_matches_pass_through() {
    let config = linux_node_config();
    assert_eq!(
        CONTAINERD_V3.render(&config).unwrap(),
        render_containerd_config(SchemaVersion::V3, None, &config).unwrap()
    );
}
