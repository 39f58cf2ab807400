//! Bundled base templates and their typed render entry points.
//!
//! Each base template is bound to the context type it reads, so a containerd
//! template can only be rendered with a [`ContainerdConfig`] and the hosts
//! template only with a [`HostConfig`]:
//!
//! | template | context | layered |
//! |---|---|---|
//! | [`CONTAINERD_V2`] | [`ContainerdConfig`] | yes |
//! | [`CONTAINERD_V3`] | [`ContainerdConfig`] | yes |
//! | [`HOSTS_TOML`] | [`HostConfig`] | no |
//!
//! The containerd templates define blocks an override can replace with
//! `{% extends "base" %}`: `header`, `cri`, `runtimes`, and `registry` in
//! both versions, `extra_runtimes` in v2, and `snapshotters` in v3.

use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use serde::Serialize;

use crate::config::{ContainerdConfig, HostConfig};
use crate::core::TemplatesError;
use crate::templating::{TemplateCompiler, TemplateError, canonicalize};

/// Types the bundled templates are rendered against.
pub trait TemplateContext: Serialize {}

impl TemplateContext for ContainerdConfig {}
impl TemplateContext for HostConfig {}

/// A bundled base template bound to its context type.
pub struct BaseTemplate<C: TemplateContext> {
    name: &'static str,
    body: &'static str,
    context: PhantomData<fn(&C)>,
}

impl<C: TemplateContext> BaseTemplate<C> {
    const fn new(name: &'static str, body: &'static str) -> Self {
        Self {
            name,
            body,
            context: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Raw template body.
    pub fn body(&self) -> &'static str {
        self.body
    }

    /// Check that every variable this template reads exists in `context`'s
    /// serialized form, including variables only read by conditions.
    ///
    /// Validate against a context with every optional field set and every
    /// collection non-empty; unset options and empty loops are not descended.
    ///
    /// # Errors
    ///
    /// [`TemplateError::Definition`] if the body does not parse, or
    /// [`TemplateError::VariableNotFound`] naming the first field `C` lacks.
    pub fn validate(&self, context: &C) -> Result<(), TemplateError> {
        TemplateCompiler::standard().compile_unit(self.body)?.check(context)
    }

    /// Render this template on its own.
    ///
    /// # Errors
    ///
    /// Any [`TemplateError`] raised while compiling or executing.
    pub fn render(&self, context: &C) -> Result<String, TemplateError> {
        TemplateCompiler::standard()
            .compile_single(self.body, context)
            .map(|raw| canonicalize(&raw))
    }

    /// Render `user_template` layered over this template.
    ///
    /// # Errors
    ///
    /// Any [`TemplateError`] raised while compiling or executing.
    pub fn render_layered(&self, user_template: &str, context: &C) -> Result<String, TemplateError> {
        TemplateCompiler::standard()
            .compile_layered(user_template, self.body, context)
            .map(|raw| canonicalize(&raw))
    }
}

impl<C: TemplateContext> fmt::Debug for BaseTemplate<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseTemplate").field("name", &self.name).finish_non_exhaustive()
    }
}

/// containerd `config.toml`, schema version 2. Used by Linux and Windows nodes.
pub static CONTAINERD_V2: BaseTemplate<ContainerdConfig> =
    BaseTemplate::new("containerd-v2", include_str!("containerd_v2.toml.tera"));

/// containerd `config.toml`, schema version 3. Used by Linux and Windows nodes.
pub static CONTAINERD_V3: BaseTemplate<ContainerdConfig> =
    BaseTemplate::new("containerd-v3", include_str!("containerd_v3.toml.tera"));

/// Per-registry `hosts.toml`. Used by Linux and Windows nodes.
pub static HOSTS_TOML: BaseTemplate<HostConfig> =
    BaseTemplate::new("hosts", include_str!("hosts.toml.tera"));

/// Override used when the operator supplies none: renders the base unchanged.
pub const DEFAULT_USER_TEMPLATE: &str = "{% include \"base\" %}\n";

/// containerd config schema version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaVersion {
    V2,
    V3,
}

impl SchemaVersion {
    pub fn base_template(self) -> &'static BaseTemplate<ContainerdConfig> {
        match self {
            Self::V2 => &CONTAINERD_V2,
            Self::V3 => &CONTAINERD_V3,
        }
    }

    pub fn number(self) -> u8 {
        match self {
            Self::V2 => 2,
            Self::V3 => 3,
        }
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

impl FromStr for SchemaVersion {
    type Err = TemplatesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches(['v', 'V']) {
            "2" => Ok(Self::V2),
            "3" => Ok(Self::V3),
            _ => Err(TemplatesError::UnknownSchemaVersion {
                version: s.to_string(),
            }),
        }
    }
}

/// Render the containerd config for `version`, layering `user_template` if given.
///
/// # Errors
///
/// Any [`TemplateError`]. A broken override is reported as a definition error
/// on `compiled_template`; callers may retry with `None` to fall back to the
/// plain base.
pub fn render_containerd_config(
    version: SchemaVersion,
    user_template: Option<&str>,
    config: &ContainerdConfig,
) -> Result<String, TemplateError> {
    version.base_template().render_layered(user_template.unwrap_or(DEFAULT_USER_TEMPLATE), config)
}

/// Render a registry's `hosts.toml`.
///
/// # Errors
///
/// Any [`TemplateError`] raised while executing the hosts template.
pub fn render_hosts_toml(config: &HostConfig) -> Result<String, TemplateError> {
    HOSTS_TOML.render(config)
}

/// First line of every generated hosts file, for callers that write the file
/// without rendering the template.
pub fn hosts_toml_header(program: &str) -> String {
    format!("# File generated by {program}. DO NOT EDIT.\n")
}
