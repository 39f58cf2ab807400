//! `hosts` command: render a registry's `hosts.toml`.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use super::common::OutputArgs;
use crate::config::{HostConfig, parse_context};
use crate::core::TemplatesError;
use crate::templates::render_hosts_toml;

/// Render `hosts.toml` for one registry.
#[derive(Args, Debug)]
pub struct HostsCommand {
    /// Context file (YAML, JSON, or TOML) describing the registry endpoints
    #[arg(short, long, value_name = "FILE")]
    pub context: PathBuf,

    #[command(flatten)]
    pub output: OutputArgs,
}

impl HostsCommand {
    pub fn execute(self) -> Result<()> {
        let config: HostConfig = parse_context(&self.context)?;
        tracing::debug!(
            "Loaded hosts context from {} ({} endpoints)",
            self.context.display(),
            config.endpoints.len()
        );

        let rendered = render_hosts_toml(&config).map_err(TemplatesError::from)?;
        self.output.emit(&rendered)
    }
}
