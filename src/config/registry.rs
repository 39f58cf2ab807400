//! Private registry settings, shaped like the `registries.yaml` file.
//!
//! The renderer only consumes these values; loading and validating the
//! operator's registries file happens elsewhere.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Private registry configuration: mirrors and per-host settings.
///
/// Both maps are [`BTreeMap`]s so templates walk registry hosts in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Registry {
    /// Upstream registry name to the mirrors serving it.
    pub mirrors: BTreeMap<String, Mirror>,
    /// Registry host name to its TLS and credential settings.
    pub configs: BTreeMap<String, RegistryConfig>,
}

impl Registry {
    /// Settings for `host`, if any were configured.
    #[must_use]
    pub fn config_for(&self, host: &str) -> Option<&RegistryConfig> {
        self.configs.get(host)
    }

    /// Whether any configured host carries credentials.
    #[must_use]
    pub fn has_auth(&self) -> bool {
        self.configs.values().any(|config| config.auth.is_some())
    }
}

/// Mirror endpoints and path rewrites for one upstream registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Mirror {
    /// Mirror URLs in preference order.
    pub endpoints: Vec<String>,
    /// Regular expression to replacement applied to repository paths.
    pub rewrites: BTreeMap<String, String>,
}

/// TLS material and credentials for one registry host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub auth: Option<AuthConfig>,
    pub tls: Option<TlsConfig>,
}

/// Registry credentials. Empty fields are omitted from the rendered file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub username: String,
    pub password: String,
    /// Pre-encoded `base64(username:password)`.
    pub auth: String,
    pub identity_token: String,
}

/// Client TLS settings for a registry host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsConfig {
    pub ca_file: String,
    pub cert_file: String,
    pub key_file: String,
    pub insecure_skip_verify: bool,
}
