//! `containerd` command: render containerd `config.toml`.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;

use super::common::{OutputArgs, read_template};
use crate::config::{ContainerdConfig, parse_context};
use crate::constants::USER_TEMPLATE_FILE_NAME;
use crate::core::TemplatesError;
use crate::templates::{SchemaVersion, render_containerd_config};

/// Render containerd `config.toml` for a node.
///
/// The override template is taken from `--template`, or from a
/// `config.toml.tmpl` next to `--output` when that file exists.
#[derive(Args, Debug)]
pub struct ContainerdCommand {
    /// containerd config schema version (2 or 3)
    #[arg(long, default_value = "2")]
    pub schema: SchemaVersion,

    /// Context file (YAML, JSON, or TOML) describing the node
    #[arg(short, long, value_name = "FILE")]
    pub context: PathBuf,

    /// Override template layered over the base template
    #[arg(short, long, value_name = "FILE")]
    pub template: Option<PathBuf>,

    #[command(flatten)]
    pub output: OutputArgs,
}

impl ContainerdCommand {
    pub fn execute(self) -> Result<()> {
        let config: ContainerdConfig = parse_context(&self.context)?;
        tracing::debug!(
            "Loaded containerd context from {} (program {})",
            self.context.display(),
            config.program
        );

        let user_template = match self.override_template() {
            Some(path) => {
                tracing::info!("Using override template {}", path.display());
                Some(read_template(&path)?)
            }
            None => None,
        };

        let rendered = render_containerd_config(self.schema, user_template.as_deref(), &config)
            .map_err(TemplatesError::from)?;

        self.output.emit(&rendered)
    }

    fn override_template(&self) -> Option<PathBuf> {
        if let Some(path) = &self.template {
            return Some(path.clone());
        }
        self.output
            .output
            .as_deref()
            .and_then(Path::parent)
            .map(|dir| dir.join(USER_TEMPLATE_FILE_NAME))
            .filter(|candidate| candidate.is_file())
    }
}
