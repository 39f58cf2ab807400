use containerd_templates::templates::{SchemaVersion, render_containerd_config};
use containerd_templates::templating::TemplateError;

use crate::common::{assert_canonical, linux_node_config, lookup, parse_toml};

#[test]
fn test_fixed_text_override_ignores_base() {
    let user = "version = 2\n\n\n[plugins]\n   \n";
    let rendered = render_containerd_config(SchemaVersion::V2, Some(user), &linux_node_config()).unwrap();
    assert_eq!(rendered, "version = 2\n\n[plugins]\n");
}

#[test]
fn test_include_base_and_append() {
    let user = r#"{% include "base" %}

[plugins."io.containerd.grpc.v1.cri".containerd.runtimes."gvisor"]
  runtime_type = "io.containerd.runsc.v1"
"#;
    let rendered = render_containerd_config(SchemaVersion::V2, Some(user), &linux_node_config()).unwrap();
    assert_canonical(&rendered);

    let table = parse_toml(&rendered);
    assert_eq!(
        lookup(
            &table,
            &["plugins", "io.containerd.grpc.v1.cri", "containerd", "runtimes", "gvisor", "runtime_type"]
        )
        .and_then(|v| v.as_str()),
        Some("io.containerd.runsc.v1")
    );
    assert_eq!(table["version"].as_integer(), Some(2));
}

#[test]
fn test_extend_runtimes_block() {
    let user = r#"{% extends "base" %}
{% block runtimes %}{{ super() }}
[plugins.'io.containerd.cri.v1.runtime'.containerd.runtimes.'crun']
  runtime_type = "io.containerd.runc.v2"
{% endblock runtimes %}"#;
    let rendered = render_containerd_config(SchemaVersion::V3, Some(user), &linux_node_config()).unwrap();

    let table = parse_toml(&rendered);
    let runtimes = lookup(&table, &["plugins", "io.containerd.cri.v1.runtime", "containerd", "runtimes"]).unwrap();
    assert!(runtimes.get("runc").is_some(), "base runtimes kept");
    assert_eq!(runtimes["crun"]["runtime_type"].as_str(), Some("io.containerd.runc.v2"));
    assert!(rendered.starts_with("# File generated by k3s."));
}

#[test]
fn test_replace_registry_block() {
    let user = r#"{% extends "base" %}
{% block registry %}
[plugins."io.containerd.grpc.v1.cri".registry]
  config_path = "/etc/containerd/certs.d"
{% endblock registry %}"#;
    let rendered = render_containerd_config(SchemaVersion::V2, Some(user), &linux_node_config()).unwrap();
    let table = parse_toml(&rendered);
    assert_eq!(
        lookup(&table, &["plugins", "io.containerd.grpc.v1.cri", "registry", "config_path"])
            .and_then(|v| v.as_str()),
        Some("/etc/containerd/certs.d")
    );
}

#[test]
fn test_override_uses_helpers_and_context() {
    let user = "{% include \"base\" %}\n[debug]\n  address = {{ node_config.containerd.address | deschemify | quote }}\n";
    let rendered = render_containerd_config(SchemaVersion::V3, Some(user), &linux_node_config()).unwrap();
    let table = parse_toml(&rendered);
    assert_eq!(
        lookup(&table, &["debug", "address"]).and_then(|v| v.as_str()),
        Some("/run/k3s/containerd/containerd.sock")
    );
}

#[test]
fn test_broken_override_is_definition_error() {
    let err = render_containerd_config(SchemaVersion::V2, Some("{% if %}"), &linux_node_config())
        .unwrap_err();
    assert!(err.is_definition_error(), "{err:?}");
    assert_eq!(err.template(), Some("compiled_template"));

    // Retrying without the override still works.
    assert!(render_containerd_config(SchemaVersion::V2, None, &linux_node_config()).is_ok());
}

#[test]
fn test_override_with_unknown_field() {
    let err = render_containerd_config(
        SchemaVersion::V2,
        Some("{{ node_config.containerd.adress }}"),
        &linux_node_config(),
    )
    .unwrap_err();
    match err {
        TemplateError::VariableNotFound {
            variable,
            suggestions,
            ..
        } => {
            assert_eq!(variable, "node_config.containerd.adress");
            assert!(suggestions.contains(&"node_config.containerd.address".to_string()));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_override_with_misspelled_guard() {
    let user = "{% include \"base\" %}\n{% if is_running_in_usr_ns %}\n[extra]\n{% endif %}\n";
    for version in [SchemaVersion::V2, SchemaVersion::V3] {
        let err = render_containerd_config(version, Some(user), &linux_node_config()).unwrap_err();
        match err {
            TemplateError::VariableNotFound {
                variable,
                suggestions,
                ..
            } => {
                assert_eq!(variable, "is_running_in_usr_ns");
                assert_eq!(suggestions.first().map(String::as_str), Some("is_running_in_user_ns"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
