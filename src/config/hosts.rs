//! Data context for the per-registry `hosts.toml` template.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::registry::RegistryConfig;
use crate::constants::DEFAULT_PROGRAM;

/// A location that can serve content for an upstream registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryEndpoint {
    /// Base URL of the endpoint, rendered exactly as given.
    pub url: String,
    /// Use the URL path verbatim instead of appending `/v2`.
    pub override_path: bool,
    /// Repository path pattern to replacement.
    ///
    /// Rendered in sorted-pattern order.
    pub rewrites: BTreeMap<String, String>,
    /// TLS material and credentials for this endpoint.
    pub config: RegistryConfig,
}

impl RegistryEndpoint {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_override_path(mut self, override_path: bool) -> Self {
        self.override_path = override_path;
        self
    }

    #[must_use]
    pub fn with_rewrite(mut self, pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        self.rewrites.insert(pattern.into(), replacement.into());
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: RegistryConfig) -> Self {
        self.config = config;
        self
    }
}

/// Registry resolution record for one upstream registry host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// The upstream registry itself, written as the `server` entry.
    #[serde(alias = "default")]
    pub default_endpoint: Option<RegistryEndpoint>,
    /// Display name of the generating program.
    pub program: String,
    /// Mirrors in resolution-preference order.
    pub endpoints: Vec<RegistryEndpoint>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            default_endpoint: None,
            program: DEFAULT_PROGRAM.to_string(),
            endpoints: Vec::new(),
        }
    }
}
